//! Shortest playthrough by label-correcting relaxation (SPFA).
//!
//! The distance to a block is the cost of everything read before entering
//! it. Block costs are non-negative, so cycles never improve a distance and
//! the queue drains without cycle detection.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::{debug, instrument};

use crate::label::Label;
use crate::optimize::OptimizedGraph;
use crate::solve::{PathResult, PathStep};

#[instrument(skip_all, fields(blocks = graph.len()))]
pub(crate) fn solve(graph: &OptimizedGraph) -> Option<PathResult> {
    let entry = graph.entry()?.label();

    let mut dist: HashMap<&Label, f64> = HashMap::with_capacity(graph.len());
    let mut hop: HashMap<&Label, &Label> = HashMap::with_capacity(graph.len());
    let mut queued: HashSet<&Label> = HashSet::new();
    let mut queue: VecDeque<&Label> = VecDeque::from([entry]);
    dist.insert(entry, 0.0);
    queued.insert(entry);

    let mut best: Option<(f64, &Label)> = None;
    while let Some(label) = queue.pop_front() {
        queued.remove(label);
        let Some(block) = graph.get(label) else {
            continue;
        };
        let reach = dist.get(label).copied().unwrap_or(f64::INFINITY) + block.total();

        if block.block().is_terminal() && best.is_none_or(|(total, _)| reach < total) {
            best = Some((reach, label));
        }

        for next in block.block().next() {
            if dist.get(next).is_some_and(|&d| d <= reach) {
                continue;
            }
            dist.insert(next, reach);
            hop.insert(next, label);
            if queued.insert(next) {
                queue.push_back(next);
            }
        }
    }

    let (total, end) = best?;
    let mut steps = vec![end];
    let mut cursor = end;
    while let Some(&prev) = hop.get(cursor) {
        if steps.len() > graph.len() {
            break;
        }
        steps.push(prev);
        cursor = prev;
    }
    steps.reverse();
    debug!(total, hops = steps.len(), "minimum found");

    Some(PathResult {
        total,
        steps: steps
            .into_iter()
            .map(|label| PathStep::Block(label.clone()))
            .collect(),
    })
}
