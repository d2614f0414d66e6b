//! Property tests over generated well-formed scripts.

use playtime_core::{
    BlockCost, BlockGraph, Dialogue, GraphBuilder, OptimizedGraph, Record, Speaker, optimize,
};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Script generator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Exit {
    Return,
    DeadEnd,
    JumpStart,
}

#[derive(Debug, Clone)]
struct Choice {
    body: Vec<Node>,
    exit: Option<Exit>,
}

#[derive(Debug, Clone)]
enum Node {
    /// A dialogue line costing this much.
    Say(usize),
    Menu(Vec<Choice>),
    If {
        arms: Vec<Vec<Node>>,
        otherwise: Option<Vec<Node>>,
    },
}

fn arb_exit() -> impl Strategy<Value = Option<Exit>> {
    prop_oneof![
        3 => Just(None),
        1 => Just(Some(Exit::Return)),
        1 => Just(Some(Exit::DeadEnd)),
        1 => Just(Some(Exit::JumpStart)),
    ]
}

fn arb_node() -> impl Strategy<Value = Node> {
    (0usize..6).prop_map(Node::Say).prop_recursive(3, 32, 4, |inner| {
        let body = prop::collection::vec(inner, 1..3);
        prop_oneof![
            prop::collection::vec(
                (body.clone(), arb_exit()).prop_map(|(body, exit)| Choice { body, exit }),
                1..4
            )
            .prop_map(Node::Menu),
            (
                prop::collection::vec(body.clone(), 1..3),
                prop::option::of(body)
            )
                .prop_map(|(arms, otherwise)| Node::If { arms, otherwise }),
        ]
    })
}

fn render(nodes: &[Node], depth: usize, out: &mut Vec<String>) {
    let pad = "    ".repeat(depth);
    for node in nodes {
        match node {
            Node::Say(cost) => out.push(format!("{pad}\"{}\"", "a".repeat(cost + 2))),
            Node::Menu(choices) => {
                out.push(format!("{pad}menu:"));
                for (i, choice) in choices.iter().enumerate() {
                    out.push(format!("{pad}    \"choice {i}\":"));
                    render(&choice.body, depth + 2, out);
                    let exit = match choice.exit {
                        None => continue,
                        Some(Exit::Return) => "return",
                        Some(Exit::DeadEnd) => "return # dead",
                        Some(Exit::JumpStart) => "jump start",
                    };
                    out.push(format!("{pad}        {exit}"));
                }
            }
            Node::If { arms, otherwise } => {
                for (i, arm) in arms.iter().enumerate() {
                    let keyword = if i == 0 { "if" } else { "elif" };
                    out.push(format!("{pad}{keyword} flag_{i}:"));
                    render(arm, depth + 1, out);
                }
                if let Some(arm) = otherwise {
                    out.push(format!("{pad}else:"));
                    render(arm, depth + 1, out);
                }
            }
        }
    }
}

fn arb_script() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(arb_node(), 1..6).prop_map(|nodes| {
        let mut lines = vec!["label start:".to_owned()];
        render(&nodes, 1, &mut lines);
        lines
    })
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

fn quoted(line: &str) -> Option<Record> {
    line.starts_with('"').then(|| {
        Record::Dialogue(Dialogue {
            speaker: Speaker::Narrator,
            text: line.to_owned(),
            extra_seconds: 0.0,
        })
    })
}

fn length_minus_two(records: &[Record]) -> BlockCost {
    let total = records
        .iter()
        .filter_map(Record::as_dialogue)
        .map(|d| d.text.chars().count().saturating_sub(2) as f64)
        .sum();
    BlockCost::new(total)
}

fn builder(lines: &[String]) -> GraphBuilder<fn(&str) -> Option<Record>, fn(&[Record]) -> BlockCost> {
    let mut b = GraphBuilder::new(
        quoted as fn(&str) -> Option<Record>,
        length_minus_two as fn(&[Record]) -> BlockCost,
    );
    for (i, line) in lines.iter().enumerate() {
        b.parse_line(line, i + 1).expect("generated script parses");
    }
    b
}

fn raw_reachable_cost(graph: &BlockGraph) -> f64 {
    let incoming = graph.incoming().expect("no dangling edges");
    graph
        .blocks()
        .filter(|b| incoming.contains_key(b.label()))
        .map(|b| length_minus_two(b.text()).total)
        .sum()
}

fn optimized_cost(graph: &OptimizedGraph) -> f64 {
    graph.iter().map(|(_, b)| b.total()).sum()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn minimum_never_exceeds_maximum(lines in arb_script()) {
        let g = builder(&lines).optimize().expect("optimizes");
        match (g.minimum(), g.maximum()) {
            (Some(min), Some(max)) => prop_assert!(min.total <= max.total, "{} > {}", min.total, max.total),
            (None, None) => {}
            (min, max) => prop_assert!(false, "only one bound exists: {min:?} / {max:?}"),
        }
    }

    #[test]
    fn merging_conserves_reachable_cost(lines in arb_script()) {
        let raw = builder(&lines).finish().expect("finishes");
        let g = builder(&lines).optimize().expect("optimizes");
        prop_assert_eq!(raw_reachable_cost(&raw), optimized_cost(&g));
        prop_assert!(g.len() <= raw.len());
    }

    #[test]
    fn optimizing_twice_changes_nothing(lines in arb_script()) {
        let once = builder(&lines).optimize().expect("optimizes");
        let twice = optimize(once.clone().into_graph(), &length_minus_two).expect("optimizes again");
        prop_assert_eq!(once.len(), twice.len());
        prop_assert_eq!(optimized_cost(&once), optimized_cost(&twice));
        prop_assert_eq!(once.minimum().map(|p| p.total), twice.minimum().map(|p| p.total));
        prop_assert_eq!(once.maximum().map(|p| p.total), twice.maximum().map(|p| p.total));
    }
}
