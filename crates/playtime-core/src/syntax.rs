//! Recognition of the structural line shapes the core owns.
//!
//! Headers (`...:`), jumps and `return` take precedence over the injected
//! classifier. Everything else is content.

use std::sync::LazyLock;

use regex::Regex;

static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^(?P<cmd>[a-z]+)\b\s*(?P<arg>\(.*\)|\S.*)?)?:\s*$").expect("valid regex")
});

static JUMP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^jump\s+(?P<target>\S+)\s*$").expect("valid regex"));

static RETURN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^return\b").expect("valid regex"));

/// A colon-terminated line that opens a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Header<'a> {
    /// `label NAME:`; parameters are already stripped from the name.
    Label(&'a str),
    Menu,
    If,
    Elif,
    Else,
    /// Any other header: menu choices, `python:`, `while x:`, ...
    Other,
}

impl Header<'_> {
    #[must_use]
    pub const fn keyword(&self) -> &'static str {
        match self {
            Self::Label(_) => "label",
            Self::Menu => "menu",
            Self::If => "if",
            Self::Elif => "elif",
            Self::Else => "else",
            Self::Other => "block",
        }
    }
}

/// What a dedent-stripped line means structurally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statement<'a> {
    Header(Header<'a>),
    /// `jump TARGET`; dotted targets are relative.
    Jump(&'a str),
    /// `return`; `dead` when its comment mentions "dead".
    Terminate { dead: bool },
    /// Handed to the classifier untouched.
    Content(&'a str),
}

/// Split `line` into its code part and its trailing `#` comment.
///
/// A `#` inside a single- or double-quoted string does not start a comment.
#[must_use]
pub fn split_comment(line: &str) -> (&str, Option<&str>) {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, c) {
            (Some(_), '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (None, '"' | '\'') => quote = Some(c),
            (None, '#') => return (&line[..i], Some(&line[i..])),
            _ => {}
        }
    }
    (line, None)
}

/// The leading run of whitespace characters.
#[must_use]
pub fn leading_whitespace(line: &str) -> &str {
    let end = line
        .char_indices()
        .find(|(_, c)| !c.is_whitespace())
        .map_or(line.len(), |(i, _)| i);
    &line[..end]
}

/// Classify an indentation-stripped, non-blank line.
#[must_use]
pub fn statement(line: &str) -> Statement<'_> {
    let (code, comment) = split_comment(line);

    if let Some(caps) = HEADER.captures(code) {
        let arg = caps.name("arg").map_or("", |m| m.as_str().trim());
        let header = match caps.name("cmd").map(|m| m.as_str()) {
            Some("label") => Header::Label(label_name(arg)),
            Some("menu") => Header::Menu,
            Some("if") => Header::If,
            Some("elif") => Header::Elif,
            Some("else") => Header::Else,
            _ => Header::Other,
        };
        return Statement::Header(header);
    }

    if let Some(caps) = JUMP.captures(code) {
        if let Some(target) = caps.name("target") {
            return Statement::Jump(target.as_str());
        }
    }

    if RETURN.is_match(code) {
        let dead = comment.is_some_and(|c| c.contains("dead"));
        return Statement::Terminate { dead };
    }

    Statement::Content(line)
}

/// `start(a, b=1)` → `start`.
fn label_name(arg: &str) -> &str {
    arg.split_once('(').map_or(arg, |(name, _)| name).trim()
}
