use std::cell::RefCell;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use serde_json::json;

/// Pipeline phases timed for every input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Parse,
    Optimize,
    Minimum,
    Maximum,
}

impl Phase {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Parse => "parse",
            Self::Optimize => "optimize",
            Self::Minimum => "minimum",
            Self::Maximum => "maximum",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timing report across every file processed by this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimingReport {
    /// Samples in the order they were recorded.
    pub samples: Vec<Sample>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub file: String,
    pub phase: Phase,
    pub elapsed: Duration,
}

thread_local! {
    static SAMPLES: RefCell<Vec<Sample>> = const { RefCell::new(Vec::new()) };
}

static TIMING_ENABLED: AtomicBool = AtomicBool::new(false);

/// Returns true when `PLAYTIME_TIMING` enables timing collection.
///
/// Supported truthy values: `1`, `true`, `yes`, `on` (case-insensitive).
#[must_use]
pub fn timing_enabled_from_env() -> bool {
    std::env::var("PLAYTIME_TIMING")
        .ok()
        .is_some_and(|value| is_truthy(value.as_str()))
}

/// Enable or disable timing collection.
pub fn set_timing_enabled(enabled: bool) {
    TIMING_ENABLED.store(enabled, Ordering::Relaxed);
    if !enabled {
        clear_timings();
    }
}

/// Returns true when timing collection is currently enabled.
#[must_use]
pub fn is_timing_enabled() -> bool {
    TIMING_ENABLED.load(Ordering::Relaxed)
}

/// Clears all recorded timings for the current thread.
pub fn clear_timings() {
    SAMPLES.with(|samples| samples.borrow_mut().clear());
}

/// Execute a closure while recording its duration under `file` / `phase`.
pub fn timed<R>(file: &str, phase: Phase, f: impl FnOnce() -> R) -> R {
    if !is_timing_enabled() {
        return f();
    }

    let started = Instant::now();
    let result = f();
    let elapsed = started.elapsed();
    SAMPLES.with(|samples| {
        samples.borrow_mut().push(Sample {
            file: file.to_string(),
            phase,
            elapsed,
        });
    });
    result
}

/// Drain the current thread's samples into a report.
#[must_use]
pub fn collect_report() -> TimingReport {
    let samples = SAMPLES.with(|samples| std::mem::take(&mut *samples.borrow_mut()));
    TimingReport { samples }
}

impl TimingReport {
    /// Returns true when no timing samples were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Render the timing report as JSON.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let samples = self
            .samples
            .iter()
            .map(|s| {
                json!({
                    "file": s.file,
                    "phase": s.phase.as_str(),
                    "elapsed_us": s.elapsed.as_micros(),
                })
            })
            .collect::<Vec<_>>();

        json!({ "samples": samples })
    }

    /// Render the timing report as a simple table for terminal output.
    #[must_use]
    pub fn display_table(&self) -> String {
        if self.samples.is_empty() {
            return "No timing samples recorded.".to_string();
        }

        let width = self
            .samples
            .iter()
            .map(|s| s.file.chars().count())
            .max()
            .unwrap_or(0)
            .max("file".len());

        let mut out = format!("{:<width$}  {:<8}  {:>10}\n", "file", "phase", "elapsed");
        out.push_str(&"-".repeat(width + 22));
        out.push('\n');

        for s in &self.samples {
            out.push_str(&format!(
                "{:<width$}  {:<8}  {:>10}\n",
                s.file,
                s.phase.as_str(),
                format_duration(s.elapsed)
            ));
        }

        out
    }
}

fn format_duration(duration: Duration) -> String {
    let micros = duration.as_micros();

    if micros >= 1_000_000 {
        let secs = micros / 1_000_000;
        let millis = (micros % 1_000_000) / 1_000;
        format!("{secs}.{millis:03}s")
    } else if micros >= 1_000 {
        let millis = micros / 1_000;
        let rem = micros % 1_000;
        format!("{millis}.{rem:03}ms")
    } else {
        format!("{micros}µs")
    }
}

fn is_truthy(value: &str) -> bool {
    value.eq_ignore_ascii_case("1")
        || value.eq_ignore_ascii_case("true")
        || value.eq_ignore_ascii_case("yes")
        || value.eq_ignore_ascii_case("on")
}

#[cfg(test)]
mod tests {
    use super::*;

    static TEST_GUARD: std::sync::Mutex<()> = std::sync::Mutex::new(());

    #[test]
    fn timed_does_not_record_when_disabled() {
        let _guard = TEST_GUARD.lock().expect("guard");
        set_timing_enabled(false);

        let value = timed("a.rpy", Phase::Parse, || 7);
        assert_eq!(value, 7);
        assert!(collect_report().is_empty());
    }

    #[test]
    fn timed_records_file_and_phase_in_order() {
        let _guard = TEST_GUARD.lock().expect("guard");
        set_timing_enabled(true);
        clear_timings();

        timed("a.rpy", Phase::Parse, || ());
        timed("a.rpy", Phase::Optimize, || ());
        timed("b.rpy", Phase::Minimum, || ());

        let report = collect_report();
        set_timing_enabled(false);

        let phases: Vec<(&str, Phase)> = report
            .samples
            .iter()
            .map(|s| (s.file.as_str(), s.phase))
            .collect();
        assert_eq!(
            phases,
            [
                ("a.rpy", Phase::Parse),
                ("a.rpy", Phase::Optimize),
                ("b.rpy", Phase::Minimum)
            ]
        );
    }

    #[test]
    fn collect_drains_samples() {
        let _guard = TEST_GUARD.lock().expect("guard");
        set_timing_enabled(true);
        clear_timings();

        timed("a.rpy", Phase::Maximum, || ());
        assert!(!collect_report().is_empty());
        assert!(collect_report().is_empty());
        set_timing_enabled(false);
    }

    #[test]
    fn table_and_json_name_every_sample() {
        let report = TimingReport {
            samples: vec![Sample {
                file: "chapter1.rpy".into(),
                phase: Phase::Optimize,
                elapsed: Duration::from_micros(1_500),
            }],
        };
        let table = report.display_table();
        assert!(table.contains("chapter1.rpy"));
        assert!(table.contains("optimize"));
        assert!(table.contains("1.500ms"));

        let json = report.to_json();
        assert_eq!(json["samples"][0]["phase"], "optimize");
        assert_eq!(json["samples"][0]["elapsed_us"], 1_500);
    }

    #[test]
    fn empty_report_has_placeholder_table() {
        let report = TimingReport {
            samples: Vec::new(),
        };
        assert_eq!(report.display_table(), "No timing samples recorded.");
    }

    #[test]
    fn format_duration_picks_unit() {
        assert_eq!(format_duration(Duration::from_micros(12)), "12µs");
        assert_eq!(format_duration(Duration::from_micros(2_345_000)), "2.345s");
    }

    #[test]
    fn truthy_values() {
        assert!(is_truthy("YES"));
        assert!(is_truthy("on"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy(""));
    }
}
