#![no_main]

use libfuzzer_sys::fuzz_target;
use playtime_core::{BlockCost, GraphBuilder, Record};

fuzz_target!(|data: &[u8]| {
    let Ok(script) = std::str::from_utf8(data) else {
        return;
    };

    let classify = |line: &str| line.starts_with('"').then_some(Record::Scene);
    let aggregate = |records: &[Record]| BlockCost::new(records.len() as f64);
    let mut builder = GraphBuilder::new(classify, aggregate);

    // Malformed scripts must fail with an error, never a panic.
    for (i, line) in script.lines().enumerate() {
        if builder.parse_line(line, i + 1).is_err() {
            return;
        }
    }
    let Ok(graph) = builder.optimize() else {
        return;
    };

    if let (Some(min), Some(max)) = (graph.minimum(), graph.maximum()) {
        assert!(min.total <= max.total, "{} > {}", min.total, max.total);
    }
});
