#![forbid(unsafe_code)]
//! playtime-core library.
//!
//! Builds a control-flow graph from an indentation-structured narrative
//! script, merges straight-line chains and bounds the reading time of a
//! single playthrough from below ([`OptimizedGraph::minimum`]) and above
//! ([`OptimizedGraph::maximum`]).
//!
//! What a line *costs* is not decided here: callers inject a
//! [`LineClassifier`] and a [`CostAggregator`].
//!
//! # Conventions
//!
//! - **Errors**: Use [`Result`] (alias over [`PlaytimeError`]) for return types.
//! - **Logging**: Use `tracing` macros (`info!`, `debug!`, `trace!`).

mod block;
mod builder;
pub mod error;
mod graph;
mod label;
mod optimize;
mod record;
mod scope;
mod solve;
pub mod syntax;

pub use block::BasicBlock;
pub use builder::GraphBuilder;
pub use error::{ErrorCode, ErrorKind, IndentIssue, PlaytimeError, Result};
pub use graph::{BlockGraph, Incoming};
pub use label::{Label, SyntheticKind, SyntheticLabel};
pub use optimize::{OptimizedBlock, OptimizedGraph, optimize};
pub use record::{
    BlockCost, Category, CostAggregator, Dialogue, LineClassifier, Record, Speaker,
};
pub use solve::{PathResult, PathStep};
