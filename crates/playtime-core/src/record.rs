//! Classified line records and the two injected collaborators.
//!
//! The core never looks inside dialogue text. A [`LineClassifier`] turns
//! content lines into [`Record`]s, blocks accumulate them, and a
//! [`CostAggregator`] reduces each block's records to a [`BlockCost`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

/// Who says a dialogue line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Speaker {
    Narrator,
    Named(String),
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Narrator => f.write_str("(narrator)"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

impl Serialize for Speaker {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One spoken or narrated line.
#[derive(Debug, Clone, PartialEq)]
pub struct Dialogue {
    pub speaker: Speaker,
    /// Display text with markup removed.
    pub text: String,
    /// Fixed extra time from inline timing tags, in seconds.
    pub extra_seconds: f64,
}

/// A structured line the classifier cares about.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Dialogue(Dialogue),
    Pause { seconds: f64 },
    Scene,
    Show,
}

impl Record {
    /// The dialogue payload, if this is a dialogue record.
    #[must_use]
    pub const fn as_dialogue(&self) -> Option<&Dialogue> {
        match self {
            Self::Dialogue(d) => Some(d),
            Self::Pause { .. } | Self::Scene | Self::Show => None,
        }
    }
}

/// Key of an aggregator's per-category breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Speaker(Speaker),
    Pause,
    Scene,
    Show,
}

impl Category {
    /// Returns `true` for the fixed non-speaker categories.
    #[must_use]
    pub const fn is_builtin(&self) -> bool {
        !matches!(self, Self::Speaker(_))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Speaker(s) => s.fmt(f),
            Self::Pause => f.write_str("(pause)"),
            Self::Scene => f.write_str("(scene)"),
            Self::Show => f.write_str("(show)"),
        }
    }
}

/// What an aggregator returns for one block.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BlockCost {
    pub total: f64,
    /// Optional per-category split of `total`.
    pub breakdown: Option<BTreeMap<Category, f64>>,
}

impl BlockCost {
    #[must_use]
    pub const fn new(total: f64) -> Self {
        Self {
            total,
            breakdown: None,
        }
    }

    #[must_use]
    pub const fn with_breakdown(total: f64, breakdown: BTreeMap<Category, f64>) -> Self {
        Self {
            total,
            breakdown: Some(breakdown),
        }
    }
}

impl From<f64> for BlockCost {
    fn from(total: f64) -> Self {
        Self::new(total)
    }
}

/// Turns an indentation-stripped content line into a record.
///
/// Header, jump and terminator lines are recognized by the core first and
/// never reach the classifier. Returning `None` is not an error.
pub trait LineClassifier {
    fn classify(&self, line: &str) -> Option<Record>;
}

impl<F> LineClassifier for F
where
    F: Fn(&str) -> Option<Record>,
{
    fn classify(&self, line: &str) -> Option<Record> {
        self(line)
    }
}

/// Reduces the ordered records of one block to its cost.
pub trait CostAggregator {
    fn aggregate(&self, records: &[Record]) -> BlockCost;
}

impl<F> CostAggregator for F
where
    F: Fn(&[Record]) -> BlockCost,
{
    fn aggregate(&self, records: &[Record]) -> BlockCost {
        self(records)
    }
}
