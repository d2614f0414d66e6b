//! Ren'Py line classifier.
//!
//! Recognizes the few statement shapes that cost reading time. Everything
//! else (Python blocks, `$` lines, `with` clauses, ...) classifies to
//! nothing and is free.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use playtime_core::{Dialogue, LineClassifier, Record, Speaker};
use regex::Regex;

static DIALOGUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(?:(?P<who>[A-Za-z0-9_]+)\s+)?"(?P<text>(?:[^"\\]|\\.)*)"\s*(?:#.*)?$"#)
        .expect("valid regex")
});
static MARKUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[^{][^}]*\}|\[[^\[][^\]]*\]").expect("valid regex"));
static WAIT_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\{[wp]=(?P<secs>\d+(?:\.\d*)?|\.\d+)\}$").expect("valid regex"));
static PAUSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^pause\s+(?P<secs>\d+(?:\.\d*)?|\.\d+)\s*(?:#.*)?$").expect("valid regex")
});
static SCENE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^scene\s").expect("valid regex"));
static SHOW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:show|hide)\s").expect("valid regex"));

/// Classifier injected into the graph builder.
#[derive(Debug, Clone, Default)]
pub struct RenpyClassifier {
    aliases: BTreeMap<String, String>,
    pauses: bool,
}

impl RenpyClassifier {
    /// `aliases` renames speakers; names not listed are kept as written.
    #[must_use]
    pub const fn new(aliases: BTreeMap<String, String>, pauses: bool) -> Self {
        Self { aliases, pauses }
    }

    fn speaker(&self, who: Option<&str>) -> Speaker {
        who.map_or(Speaker::Narrator, |name| {
            let shown = self.aliases.get(name).map_or(name, String::as_str);
            Speaker::Named(shown.to_string())
        })
    }

    fn dialogue(&self, who: Option<&str>, raw: &str) -> Dialogue {
        let mut extra_seconds = 0.0;
        let stripped = MARKUP.replace_all(raw, |caps: &regex::Captures<'_>| {
            if let Some(wait) = WAIT_TAG.captures(&caps[0]) {
                extra_seconds += wait["secs"].parse::<f64>().unwrap_or(0.0);
            }
            ""
        });
        Dialogue {
            speaker: self.speaker(who),
            text: stripped.replace("\\\"", "\""),
            extra_seconds,
        }
    }
}

impl LineClassifier for RenpyClassifier {
    fn classify(&self, line: &str) -> Option<Record> {
        if let Some(caps) = DIALOGUE.captures(line) {
            let who = caps.name("who").map(|m| m.as_str());
            return Some(Record::Dialogue(self.dialogue(who, &caps["text"])));
        }
        if let Some(caps) = PAUSE.captures(line) {
            if !self.pauses {
                return None;
            }
            let seconds = caps["secs"].parse::<f64>().ok()?;
            return Some(Record::Pause { seconds });
        }
        if SCENE.is_match(line) {
            return Some(Record::Scene);
        }
        if SHOW.is_match(line) {
            return Some(Record::Show);
        }
        None
    }
}
