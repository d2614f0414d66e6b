//! Chain merging and block costing.
//!
//! A block whose only successor is reached from nowhere else is merged with
//! it whenever one of the two is synthetic. Named labels always survive, so
//! paths can still be reported in script terms.

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

use tracing::{debug, info, instrument};

use crate::block::BasicBlock;
use crate::error::{PlaytimeError, Result};
use crate::graph::{BlockGraph, Incoming};
use crate::label::Label;
use crate::record::{BlockCost, Category, CostAggregator};
use crate::solve::{self, PathResult};

/// A frozen, costed block.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizedBlock {
    block: BasicBlock,
    incoming: BTreeSet<Label>,
    cost: BlockCost,
}

impl OptimizedBlock {
    #[must_use]
    pub const fn block(&self) -> &BasicBlock {
        &self.block
    }

    #[must_use]
    pub const fn label(&self) -> &Label {
        self.block.label()
    }

    /// Predecessors within the optimized graph.
    #[must_use]
    pub const fn incoming(&self) -> &BTreeSet<Label> {
        &self.incoming
    }

    /// The aggregator's full result for this block.
    #[must_use]
    pub const fn cost(&self) -> &BlockCost {
        &self.cost
    }

    #[must_use]
    pub const fn total(&self) -> f64 {
        self.cost.total
    }
}

/// The merged graph both solvers run over.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizedGraph {
    blocks: BTreeMap<Label, OptimizedBlock>,
}

impl OptimizedGraph {
    /// Number of blocks after merging.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    #[must_use]
    pub fn get(&self, label: &Label) -> Option<&OptimizedBlock> {
        self.blocks.get(label)
    }

    #[must_use]
    pub fn entry(&self) -> Option<&OptimizedBlock> {
        self.blocks.get(&Label::Entry)
    }

    /// Blocks in label order.
    pub fn iter(&self) -> impl Iterator<Item = (&Label, &OptimizedBlock)> {
        self.blocks.iter()
    }

    /// Cheapest playthrough that reaches a valid ending.
    #[must_use]
    pub fn minimum(&self) -> Option<PathResult> {
        solve::minimum::solve(self)
    }

    /// Longest playthrough that traverses every loop at most once.
    #[must_use]
    pub fn maximum(&self) -> Option<PathResult> {
        solve::maximum::solve(self)
    }

    /// Sum the per-category breakdown of every block on `path`.
    ///
    /// Blocks whose aggregator returned no breakdown contribute nothing.
    #[must_use]
    pub fn breakdown(&self, path: &PathResult) -> BTreeMap<Category, f64> {
        let mut sum: BTreeMap<Category, f64> = BTreeMap::new();
        for label in path.labels() {
            let Some(parts) = self.get(label).and_then(|b| b.cost.breakdown.as_ref()) else {
                continue;
            };
            for (category, value) in parts {
                *sum.entry(category.clone()).or_default() += value;
            }
        }
        sum
    }

    /// Drop costs and incoming sets, keeping the merged structure.
    #[must_use]
    pub fn into_graph(self) -> BlockGraph {
        BlockGraph::from_blocks(self.blocks.into_values().map(|b| b.block))
    }
}

/// Merge chains in `graph`, prune what the entry cannot reach and cost every
/// remaining block with `aggregator`.
///
/// # Errors
///
/// [`PlaytimeError::DanglingEdge`] when a reachable edge names no block, and
/// [`PlaytimeError::NonFiniteCost`] when the aggregator returns NaN or an
/// infinity.
#[instrument(skip_all)]
pub fn optimize<A>(graph: BlockGraph, aggregator: &A) -> Result<OptimizedGraph>
where
    A: CostAggregator + ?Sized,
{
    let before = graph.len();
    let mut incoming = graph.incoming()?;
    let mut blocks = graph.into_blocks();
    blocks.retain(|label, _| incoming.contains_key(label));

    merge_chains(&mut blocks, &mut incoming);

    let blocks = BlockGraph::from_blocks(blocks.into_values());
    let incoming = blocks.incoming()?;
    let mut costed = BTreeMap::new();
    for (label, block) in blocks.into_blocks() {
        let Some(preds) = incoming.get(&label) else {
            continue;
        };
        let cost = aggregator.aggregate(block.text());
        if !cost.total.is_finite() {
            return Err(PlaytimeError::NonFiniteCost {
                label: label.to_string(),
                cost: cost.total,
            });
        }
        costed.insert(
            label,
            OptimizedBlock {
                block,
                incoming: preds.clone(),
                cost,
            },
        );
    }

    info!(before, after = costed.len(), "optimized");
    Ok(OptimizedGraph { blocks: costed })
}

/// Work-queue merge pass over the reachable blocks.
///
/// `incoming` is kept exact for every block still in `blocks`.
fn merge_chains(blocks: &mut BTreeMap<Label, BasicBlock>, incoming: &mut Incoming) {
    let mut settled: HashSet<Label> = HashSet::new();
    let mut queue = VecDeque::from([Label::Entry]);

    while let Some(label) = queue.pop_front() {
        if settled.contains(&label) {
            continue;
        }
        let Some(block) = blocks.get(&label) else {
            continue;
        };

        if let [succ] = block.next() {
            let uniquely_reached = *succ != label
                && *succ != Label::Entry
                && !settled.contains(succ)
                && incoming.get(succ).is_some_and(|preds| preds.len() == 1);
            if uniquely_reached {
                let succ = succ.clone();
                if succ.is_synthetic() {
                    absorb_forward(blocks, incoming, &label, &succ);
                    queue.push_back(label);
                    continue;
                }
                if label.is_synthetic() {
                    absorb_backward(blocks, incoming, &label, &succ);
                    queue.push_back(succ);
                    continue;
                }
            }
        }

        for next in block.next() {
            if !settled.contains(next) {
                queue.push_back(next.clone());
            }
        }
        settled.insert(label);
    }
}

/// `head` swallows its synthetic successor `tail`.
fn absorb_forward(
    blocks: &mut BTreeMap<Label, BasicBlock>,
    incoming: &mut Incoming,
    head: &Label,
    tail: &Label,
) {
    let Some(tail_block) = blocks.remove(tail) else {
        return;
    };
    let Some(head_block) = blocks.get_mut(head) else {
        return;
    };
    debug!(head = %head, tail = %tail, "merge forward");
    head_block.absorb(tail_block);
    incoming.remove(tail);
    for next in head_block.next() {
        if let Some(preds) = incoming.get_mut(next) {
            preds.remove(tail);
            preds.insert(head.clone());
        }
    }
}

/// Synthetic `head` swallows its successor `tail` and takes over its label.
fn absorb_backward(
    blocks: &mut BTreeMap<Label, BasicBlock>,
    incoming: &mut Incoming,
    head: &Label,
    tail: &Label,
) {
    let (Some(mut merged), Some(tail_block)) = (blocks.remove(head), blocks.remove(tail)) else {
        return;
    };
    debug!(head = %head, tail = %tail, "merge backward");
    let preds = incoming.remove(head).unwrap_or_default();
    for pred in &preds {
        if let Some(pred_block) = blocks.get_mut(pred) {
            pred_block.relink(head, tail);
        }
    }
    merged.rename(tail.clone());
    merged.absorb(tail_block);
    // A back edge from `tail` to `head` becomes a self-loop.
    merged.relink(head, tail);
    incoming.insert(tail.clone(), preds);
    blocks.insert(tail.clone(), merged);
}
