//! Path-cost solvers over an [`OptimizedGraph`](crate::OptimizedGraph).
//!
//! Both solvers are pure: every distance, hop and queue marker lives in a
//! side table owned by one invocation.

pub(crate) mod maximum;
pub(crate) mod minimum;

use serde::Serialize;

use crate::label::Label;

/// One element of a reconstructed playthrough.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PathStep {
    Block(Label),
    /// A contracted cycle; members in label order.
    Loop(Vec<Label>),
}

impl PathStep {
    /// Every block this step stands for.
    #[must_use]
    pub fn labels(&self) -> &[Label] {
        match self {
            Self::Block(label) => std::slice::from_ref(label),
            Self::Loop(members) => members,
        }
    }
}

/// Total cost of a playthrough and the route that achieves it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathResult {
    pub total: f64,
    /// From the entry block to the ending block.
    pub steps: Vec<PathStep>,
}

impl PathResult {
    /// Every block on the path, loop members included.
    pub fn labels(&self) -> impl Iterator<Item = &Label> {
        self.steps.iter().flat_map(PathStep::labels)
    }
}
