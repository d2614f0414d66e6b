//! Longest playthrough over the condensation of the block graph.
//!
//! Loops make the unrestricted longest path unbounded, so every strongly
//! connected component is contracted into one node costing the sum of its
//! members. A component can end the playthrough when any member is a
//! terminal block. The longest path is then a forward pass over the
//! component DAG in topological order.

use std::collections::HashMap;

use petgraph::algo::{condensation, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use tracing::{debug, instrument};

use crate::label::Label;
use crate::optimize::OptimizedGraph;
use crate::solve::{PathResult, PathStep};

// ---------------------------------------------------------------------------
// Condensation
// ---------------------------------------------------------------------------

struct Component<'g> {
    /// Members in label order.
    members: Vec<&'g Label>,
    cost: f64,
    terminates: bool,
}

fn condense(graph: &OptimizedGraph) -> DiGraph<Component<'_>, ()> {
    let mut raw: DiGraph<&Label, ()> = DiGraph::with_capacity(graph.len(), graph.len());
    let mut nodes: HashMap<&Label, NodeIndex> = HashMap::with_capacity(graph.len());
    for (label, _) in graph.iter() {
        nodes.insert(label, raw.add_node(label));
    }
    for (label, block) in graph.iter() {
        for next in block.block().next() {
            if let (Some(&from), Some(&to)) = (nodes.get(label), nodes.get(next)) {
                raw.update_edge(from, to, ());
            }
        }
    }

    // make_acyclic drops self-loops and intra-component edges.
    condensation(raw, true).map(
        |_, members| {
            let mut members = members.clone();
            members.sort_unstable();
            let blocks = members.iter().filter_map(|label| graph.get(label));
            let (cost, terminates) = blocks.fold((0.0, false), |(cost, ends), b| {
                (cost + b.total(), ends || b.block().is_terminal())
            });
            Component {
                members,
                cost,
                terminates,
            }
        },
        |_, _| (),
    )
}

// ---------------------------------------------------------------------------
// Longest path
// ---------------------------------------------------------------------------

#[instrument(skip_all, fields(blocks = graph.len()))]
pub(crate) fn solve(graph: &OptimizedGraph) -> Option<PathResult> {
    let entry = graph.entry()?.label();
    let dag = condense(graph);
    let start = dag
        .node_indices()
        .find(|&n| dag[n].members.contains(&entry))?;

    // The condensation is a DAG by construction.
    let topo: Vec<NodeIndex> =
        toposort(&dag, None).unwrap_or_else(|_| dag.node_indices().collect());

    let mut dist: HashMap<NodeIndex, f64> = HashMap::with_capacity(topo.len());
    let mut hop: HashMap<NodeIndex, NodeIndex> = HashMap::with_capacity(topo.len());
    dist.insert(start, 0.0);

    let mut best: Option<(f64, NodeIndex)> = None;
    for &node in &topo {
        let Some(&arrival) = dist.get(&node) else {
            continue;
        };
        let reach = arrival + dag[node].cost;
        if dag[node].terminates && best.is_none_or(|(total, _)| reach > total) {
            best = Some((reach, node));
        }
        for edge in dag.edges(node) {
            let target = edge.target();
            if dist.get(&target).is_some_and(|&d| d >= reach) {
                continue;
            }
            dist.insert(target, reach);
            hop.insert(target, node);
        }
    }

    let (total, end) = best?;
    let mut chain = vec![end];
    let mut cursor = end;
    while let Some(&prev) = hop.get(&cursor) {
        if chain.len() > topo.len() {
            break;
        }
        chain.push(prev);
        cursor = prev;
    }
    chain.reverse();
    debug!(total, components = dag.node_count(), hops = chain.len(), "maximum found");

    let steps = chain
        .into_iter()
        .map(|node| match dag[node].members.as_slice() {
            [only] => PathStep::Block((*only).clone()),
            members => PathStep::Loop(members.iter().map(|&l| l.clone()).collect()),
        })
        .collect();
    Some(PathResult { total, steps })
}
