//! Block labels.
//!
//! Named labels come from `label NAME:` statements (dotted sub-labels are
//! stored fully qualified, e.g. `chapter1.intro`). Synthetic labels are
//! minted by the builder for scope bodies, conditional dispatch blocks and
//! merge points; their identity is a monotonically increasing index so they
//! can never collide with each other or with script content.

use std::fmt;

use serde::{Serialize, Serializer};

/// Why the builder minted a synthetic block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SyntheticKind {
    /// Body of a non-label header (`menu:`, a menu choice, `if x:`, ...).
    Scope,
    /// Dispatch block in front of an if/elif/else chain.
    Conditional,
    /// Convergence point after a block closes.
    Merge,
}

impl SyntheticKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Scope => "scope",
            Self::Conditional => "cond",
            Self::Merge => "merge",
        }
    }
}

/// A builder-generated label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SyntheticLabel {
    /// Allocation order; unique within one build.
    pub index: u32,
    /// Source line that caused the allocation.
    pub line: usize,
    pub kind: SyntheticKind,
}

/// Identity of a basic block.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Label {
    /// The root block every playthrough starts in.
    Entry,
    /// A label declared by the script.
    Named(String),
    Synthetic(SyntheticLabel),
}

impl Label {
    /// Shorthand for [`Label::Named`].
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Returns `true` for builder-generated labels.
    ///
    /// Only synthetic blocks may be absorbed away by the optimizer.
    #[must_use]
    pub const fn is_synthetic(&self) -> bool {
        matches!(self, Self::Synthetic(_))
    }

    /// The declared name, for named labels.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name),
            Self::Entry | Self::Synthetic(_) => None,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entry => f.write_str("<entry>"),
            Self::Named(name) => f.write_str(name),
            Self::Synthetic(s) => write!(f, "#{}_{}_{}", s.kind.as_str(), s.line, s.index),
        }
    }
}

impl Serialize for Label {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Mints synthetic labels in allocation order.
#[derive(Debug, Default)]
pub(crate) struct LabelArena {
    next: u32,
}

impl LabelArena {
    pub(crate) fn mint(&mut self, line: usize, kind: SyntheticKind) -> Label {
        let index = self.next;
        self.next += 1;
        Label::Synthetic(SyntheticLabel { index, line, kind })
    }
}
