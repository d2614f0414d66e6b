//! Per-file results: the serialized shape shared by every output mode.

use playtime_core::{Label, OptimizedBlock, OptimizedGraph, PathResult, PathStep, Record, Speaker};
use serde::Serialize;

use crate::config::ReadingConfig;

/// What to attach to each bound besides its time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Detail {
    pub labels: bool,
    pub texts: bool,
    pub by_characters: bool,
}

impl Detail {
    const fn wants_path(self) -> bool {
        self.labels || self.texts
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileReport {
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<BoundReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<BoundReport>,
    pub config: ConfigReport,
}

/// One bound. `time` is `None` when no ending is reachable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundReport {
    pub time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by_characters: Option<Vec<Share>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<PathEntry>>,
}

/// Minutes attributed to one speaker or staging category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Share {
    pub name: String,
    /// Staging categories (`(scene)`, ...) rather than a speaker.
    pub builtin: bool,
    pub time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PathEntry {
    Block(BlockEntry),
    Loop(Vec<BlockEntry>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<Label>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub texts: Option<Vec<Line>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Line {
    pub speaker: Speaker,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigReport {
    pub speed: SpeedReport,
    pub extra: ExtraReport,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeedReport {
    pub ncjk: f64,
    pub cjk: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtraReport {
    pub pause: bool,
    pub scene: f64,
    pub show: f64,
    pub next: f64,
}

impl From<&ReadingConfig> for ConfigReport {
    fn from(cfg: &ReadingConfig) -> Self {
        Self {
            speed: SpeedReport {
                ncjk: cfg.speed,
                cjk: cfg.cjk_speed,
            },
            extra: ExtraReport {
                pause: cfg.pause,
                scene: cfg.scene,
                show: cfg.show,
                next: cfg.next,
            },
        }
    }
}

impl BoundReport {
    /// Describe `path` (or its absence) over `graph`.
    #[must_use]
    pub fn new(graph: &OptimizedGraph, path: Option<&PathResult>, detail: Detail) -> Self {
        let Some(path) = path else {
            return Self {
                time: None,
                by_characters: detail.by_characters.then(Vec::new),
                path: detail.wants_path().then(Vec::new),
            };
        };

        let by_characters = detail.by_characters.then(|| shares(graph, path));
        let entries = detail.wants_path().then(|| {
            path.steps
                .iter()
                .map(|step| match step {
                    PathStep::Block(label) => PathEntry::Block(block_entry(graph, label, detail)),
                    PathStep::Loop(members) => PathEntry::Loop(
                        members.iter().map(|l| block_entry(graph, l, detail)).collect(),
                    ),
                })
                .collect()
        });

        Self {
            time: Some(path.total),
            by_characters,
            path: entries,
        }
    }
}

/// Breakdown along `path`, largest share first.
fn shares(graph: &OptimizedGraph, path: &PathResult) -> Vec<Share> {
    let mut out: Vec<Share> = graph
        .breakdown(path)
        .into_iter()
        .map(|(category, time)| Share {
            name: category.to_string(),
            builtin: category.is_builtin(),
            time,
        })
        .collect();
    out.sort_by(|a, b| b.time.total_cmp(&a.time));
    out
}

fn block_entry(graph: &OptimizedGraph, label: &Label, detail: Detail) -> BlockEntry {
    BlockEntry {
        label: detail.labels.then(|| label.clone()),
        texts: detail
            .texts
            .then(|| graph.get(label).map(lines).unwrap_or_default()),
    }
}

fn lines(block: &OptimizedBlock) -> Vec<Line> {
    block
        .block()
        .text()
        .iter()
        .filter_map(Record::as_dialogue)
        .filter(|d| !d.text.is_empty())
        .map(|d| Line {
            speaker: d.speaker.clone(),
            text: d.text.clone(),
        })
        .collect()
}
