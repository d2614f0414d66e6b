//! End-to-end scenarios over small hand-written scripts.
//!
//! The classifier keeps every content line verbatim and a line costs its
//! character count minus two, so `"ab"` costs 2 and `"abcd"` costs 4.

use std::collections::BTreeMap;

use playtime_core::{
    BlockCost, Category, Dialogue, ErrorCode, GraphBuilder, IndentIssue, Label, OptimizedGraph,
    PathStep, PlaytimeError, Record, Result, Speaker,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn verbatim(line: &str) -> Option<Record> {
    Some(Record::Dialogue(Dialogue {
        speaker: Speaker::Narrator,
        text: line.to_owned(),
        extra_seconds: 0.0,
    }))
}

fn length_minus_two(records: &[Record]) -> BlockCost {
    let total = records
        .iter()
        .filter_map(Record::as_dialogue)
        .map(|d| d.text.chars().count().saturating_sub(2) as f64)
        .sum();
    BlockCost::new(total)
}

fn count(script: &str) -> Result<OptimizedGraph> {
    let mut builder = GraphBuilder::new(verbatim, length_minus_two);
    for (i, line) in script.lines().enumerate() {
        builder.parse_line(line, i + 1)?;
    }
    builder.optimize()
}

fn bounds(script: &str) -> (f64, f64) {
    let g = count(script).expect("script is well formed");
    let min = g.minimum().expect("minimum exists").total;
    let max = g.maximum().expect("maximum exists").total;
    (min, max)
}

fn failure(script: &str) -> PlaytimeError {
    count(script).expect_err("script is malformed")
}

// ---------------------------------------------------------------------------
// Bounds
// ---------------------------------------------------------------------------

#[test]
fn sequential_lines_have_equal_bounds() {
    let script = r#"
"ab"
"abc"
"abcd"
"#;
    assert_eq!(bounds(script), (9.0, 9.0));
}

#[test]
fn if_without_else_is_optional() {
    let script = r#"
"abc"
if flag:
    "abc"
"abc"
"#;
    assert_eq!(bounds(script), (6.0, 9.0));
}

#[test]
fn if_else_takes_one_arm() {
    let script = r#"
"ab"
if flag:
    "abc"
elif other:
    "abcdef"
else:
    "abcd"
"ab"
"#;
    assert_eq!(bounds(script), (7.0, 10.0));
}

#[test]
fn loop_is_escaped_for_minimum_and_counted_once_for_maximum() {
    let script = r#"
"ab"
label choice_point:
    menu:
        "Again":
            "abc"
            jump choice_point
        "Leave":
            "abcd"
"ab"
"#;
    let g = count(script).expect("well formed");
    let min = g.minimum().expect("minimum");
    let max = g.maximum().expect("maximum");
    assert_eq!(min.total, 8.0);
    assert_eq!(max.total, 11.0);

    assert!(min.steps.iter().all(|s| matches!(s, PathStep::Block(_))));
    let looped = max
        .steps
        .iter()
        .find_map(|s| match s {
            PathStep::Loop(members) => Some(members),
            PathStep::Block(_) => None,
        })
        .expect("the loop is contracted");
    assert!(looped.contains(&Label::named("choice_point")));
}

#[test]
fn dead_end_choice_is_not_an_ending() {
    let script = r#"
menu:
    "Bad end":
        "ab"
        return # dead end
    "Good":
        "abcdefgh"
"#;
    assert_eq!(bounds(script), (8.0, 8.0));
}

#[test]
fn soft_return_is_an_ending() {
    let script = r#"
menu:
    "Quit":
        "ab"
        return
    "Stay":
        "abcdefgh"
"#;
    assert_eq!(bounds(script), (2.0, 8.0));
}

#[test]
fn deep_nesting_keeps_absolute_indentation() {
    let script = r#"
label a:
    menu:
        "x":
            "ab"
        "y":
            if c:
                "abc"
            "abcd"
    "ab"
"#;
    assert_eq!(bounds(script), (4.0, 9.0));
}

#[test]
fn dotted_labels_resolve_against_the_global_label() {
    let script = r#"
label chapter:
    "ab"
    jump .end
label .end:
    "abc"
"#;
    let g = count(script).expect("well formed");
    assert!(g.get(&Label::named("chapter.end")).is_some());
    assert_eq!(g.minimum().map(|p| p.total), Some(5.0));
}

#[test]
fn fallthrough_into_next_label() {
    let script = r#"
label one:
    "ab"
label two:
    "abc"
"#;
    assert_eq!(bounds(script), (5.0, 5.0));
}

#[test]
fn optimizer_shrinks_the_raw_graph() {
    let script = r#"
label start:
    "ab"
    menu:
        "a":
            "ab"
        "b":
            "ab"
    "ab"
"#;
    let mut builder = GraphBuilder::new(verbatim, length_minus_two);
    for (i, line) in script.lines().enumerate() {
        builder.parse_line(line, i + 1).expect("parses");
    }
    let raw = builder.block_count();
    let g = builder.optimize().expect("optimizes");
    assert!(g.len() < raw, "{} blocks after, {raw} before", g.len());
}

#[test]
fn breakdown_sums_categories_along_the_path() {
    let by_speaker = |line: &str| {
        let (who, text) = line.split_once(' ')?;
        Some(Record::Dialogue(Dialogue {
            speaker: Speaker::Named(who.to_owned()),
            text: text.to_owned(),
            extra_seconds: 0.0,
        }))
    };
    let split = |records: &[Record]| {
        let mut parts = BTreeMap::new();
        for d in records.iter().filter_map(Record::as_dialogue) {
            *parts.entry(Category::Speaker(d.speaker.clone())).or_insert(0.0) +=
                d.text.chars().count().saturating_sub(2) as f64;
        }
        BlockCost::with_breakdown(parts.values().sum(), parts)
    };

    let mut builder = GraphBuilder::new(by_speaker, split);
    for (i, line) in ["e \"abc\"", "m \"abcd\"", "e \"ab\""].iter().enumerate() {
        builder.parse_line(line, i + 1).expect("parses");
    }
    let g = builder.optimize().expect("optimizes");
    let min = g.minimum().expect("minimum");
    let parts = g.breakdown(&min);

    let speaker = |name: &str| Category::Speaker(Speaker::Named(name.into()));
    assert_eq!(parts.get(&speaker("e")), Some(&5.0));
    assert_eq!(parts.get(&speaker("m")), Some(&4.0));
    assert_eq!(min.total, 9.0);
}

#[test]
fn jump_with_no_ending_has_no_bounds() {
    let g = count("label a:\n    \"ab\"\n    jump a2\nlabel a2:\n    jump a").expect("well formed");
    assert!(g.minimum().is_none());
    assert!(g.maximum().is_none());
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[test]
fn indented_first_line_fails() {
    let err = failure("\n  a \"hello\"\n");
    assert!(matches!(
        err,
        PlaytimeError::Indentation {
            line: 2,
            issue: IndentIssue::IndentedTopLevel,
            ..
        }
    ));
}

#[test]
fn indent_without_header_fails() {
    let err = failure("\na \"hello\"\n  b \"world\"\n");
    assert_eq!(err.code(), ErrorCode::Indentation);
    assert_eq!(err.line(), Some(3));
}

#[test]
fn partial_dedent_fails() {
    let err = failure("\nlabel hello:\n  b \"world\"\n b \"world\"\n");
    assert_eq!(err.code(), ErrorCode::Indentation);
    assert_eq!(err.line(), Some(4));
}

#[test]
fn header_without_body_fails() {
    let err = failure("label a:\n\"ab\"");
    assert!(matches!(
        err,
        PlaytimeError::Indentation {
            issue: IndentIssue::UnindentedBody,
            ..
        }
    ));
}

#[test]
fn self_jump_fails() {
    let err = failure("label start:\n    \"ab\"\n    jump start");
    assert_eq!(
        err,
        PlaytimeError::SelfJump {
            line: 3,
            label: "start".into()
        }
    );
}

#[test]
fn dotted_jump_outside_any_label_fails() {
    let err = failure("\"ab\"\njump .later");
    assert_eq!(err.code(), ErrorCode::NoLabelScope);
}

#[test]
fn duplicate_label_fails() {
    let err = failure("label a:\n    \"ab\"\nlabel a:\n    \"ab\"");
    assert_eq!(err.code(), ErrorCode::DuplicateLabel);
    assert_eq!(err.line(), Some(3));
}

#[test]
fn else_without_if_fails() {
    let err = failure("\"ab\"\nelse:\n    \"ab\"");
    assert_eq!(
        err,
        PlaytimeError::MisplacedBranch {
            line: 2,
            keyword: "else"
        }
    );
}

#[test]
fn jump_to_unknown_label_fails_at_optimize() {
    let err = failure("\"ab\"\njump nowhere");
    assert_eq!(
        err,
        PlaytimeError::DanglingEdge {
            from: "<entry>".into(),
            to: "nowhere".into()
        }
    );
}

#[test]
fn non_finite_cost_fails_at_optimize() {
    let mut builder = GraphBuilder::new(verbatim, |_: &[Record]| BlockCost::new(f64::INFINITY));
    builder.parse_line("\"ab\"", 1).expect("parses");
    let err = builder.optimize().expect_err("infinite cost");
    assert_eq!(err.code(), ErrorCode::NonFiniteCost);
}
