//! Output layer: pretty, text and JSON renderings of a [`FileReport`].
//!
//! # Output mode resolution
//!
//! Precedence (highest wins):
//! 1. `--format` / `--json` flag
//! 2. `FORMAT` env var → `"pretty"` | `"text"` | `"json"`
//! 3. Default: [`OutputMode::Pretty`] if stdout is a TTY; [`OutputMode::Text`] if piped.
//!
//! Pretty and text share one layout; only pretty adds color.

use clap::ValueEnum;
use crossterm::style::{Color, ContentStyle};
use playtime_core::PlaytimeError;
use serde::Serialize;
use std::fmt::Display;
use std::io::{self, IsTerminal, Write};

use crate::report::{BlockEntry, BoundReport, FileReport, PathEntry};

/// Shared width for human pretty separators.
pub const PRETTY_RULE_WIDTH: usize = 72;

/// Write a horizontal separator used by pretty human output.
pub fn pretty_rule(w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{:-<width$}", "", width = PRETTY_RULE_WIDTH)
}

/// Write a section heading followed by a separator.
pub fn pretty_section(w: &mut dyn Write, heading: &str) -> io::Result<()> {
    writeln!(w, "{heading}")?;
    pretty_rule(w)
}

/// The three output modes supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Colored output for a terminal.
    Pretty,
    /// The same layout without color, for pipes.
    Text,
    /// One JSON object per file.
    Json,
}

impl OutputMode {
    /// Returns `true` if JSON output was requested.
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Core resolution logic, separated from I/O for testability.
fn resolve_output_mode_inner(
    format_flag: Option<OutputMode>,
    json_flag: bool,
    format_env: Option<&str>,
    is_tty: bool,
) -> OutputMode {
    if let Some(mode) = format_flag {
        return mode;
    }

    if json_flag {
        return OutputMode::Json;
    }

    if let Some(val) = format_env {
        match val.to_lowercase().as_str() {
            "json" => return OutputMode::Json,
            "text" => return OutputMode::Text,
            "pretty" => return OutputMode::Pretty,
            _ => {} // unknown value, fall through to TTY detection
        }
    }

    if is_tty {
        OutputMode::Pretty
    } else {
        OutputMode::Text
    }
}

/// Resolve the output mode from CLI flags, environment, and TTY defaults.
pub fn resolve_output_mode(format_flag: Option<OutputMode>, json_flag: bool) -> OutputMode {
    let env_val = std::env::var("FORMAT").ok();
    let is_tty = io::stdout().is_terminal();
    resolve_output_mode_inner(format_flag, json_flag, env_val.as_deref(), is_tty)
}

// ────────────────────────────────────────────────────────────────────────────
// Reports
// ────────────────────────────────────────────────────────────────────────────

struct Paint {
    color: bool,
}

impl Paint {
    fn fg(&self, color: Color, text: impl Display) -> String {
        self.styled(
            ContentStyle {
                foreground_color: Some(color),
                ..ContentStyle::new()
            },
            text,
        )
    }

    fn bg(&self, color: Color, text: impl Display) -> String {
        self.styled(
            ContentStyle {
                background_color: Some(color),
                ..ContentStyle::new()
            },
            text,
        )
    }

    fn styled(&self, style: ContentStyle, text: impl Display) -> String {
        if self.color {
            style.apply(text).to_string()
        } else {
            text.to_string()
        }
    }
}

/// Render one file's report to stdout.
pub fn render_report(mode: OutputMode, report: &FileReport) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_report(&mut out, mode, report)?;
    Ok(())
}

fn write_report(w: &mut dyn Write, mode: OutputMode, report: &FileReport) -> anyhow::Result<()> {
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut *w, report)?;
            writeln!(w)?;
        }
        OutputMode::Pretty | OutputMode::Text => {
            let paint = Paint {
                color: mode == OutputMode::Pretty,
            };
            write_human(w, &paint, mode, report)?;
        }
    }
    Ok(())
}

fn write_human(
    w: &mut dyn Write,
    paint: &Paint,
    mode: OutputMode,
    report: &FileReport,
) -> io::Result<()> {
    if mode == OutputMode::Pretty {
        pretty_section(w, &report.file)?;
    } else {
        writeln!(w, "file: {}", report.file)?;
    }

    let speed = &report.config.speed;
    writeln!(
        w,
        "{}",
        paint.fg(
            Color::DarkGrey,
            format!("Assuming non-CJK reading speed of {} characters per minute.", speed.ncjk)
        )
    )?;
    writeln!(
        w,
        "{}",
        paint.fg(
            Color::DarkGrey,
            format!("Assuming CJK reading speed of {} characters per minute.", speed.cjk)
        )
    )?;

    if let Some(ref min) = report.minimum {
        write_bound(w, paint, "Minimum", min)?;
    }
    if let Some(ref max) = report.maximum {
        write_bound(w, paint, "Maximum", max)?;
    }
    Ok(())
}

fn write_bound(w: &mut dyn Write, paint: &Paint, which: &str, bound: &BoundReport) -> io::Result<()> {
    let headline = bound.time.map_or_else(
        || format!("{which} time to play: no reachable ending"),
        |time| format!("{which} time to play: {time:.2} min"),
    );
    writeln!(w, "{}", paint.fg(Color::Magenta, headline))?;

    if let Some(ref shares) = bound.by_characters {
        for share in shares {
            let color = if share.builtin { Color::Cyan } else { Color::Green };
            writeln!(w, "  {} {:.2}", paint.fg(color, &share.name), share.time)?;
        }
    }

    if let Some(ref path) = bound.path {
        writeln!(w, "Path:")?;
        for entry in path {
            match entry {
                PathEntry::Block(block) => write_block(w, paint, block, "    ")?,
                PathEntry::Loop(members) => {
                    writeln!(w, "    {}", paint.bg(Color::DarkBlue, "Loop:"))?;
                    for block in members {
                        write_block(w, paint, block, "        ")?;
                    }
                }
            }
        }
    }
    Ok(())
}

fn write_block(w: &mut dyn Write, paint: &Paint, block: &BlockEntry, indent: &str) -> io::Result<()> {
    let mut text_indent = indent.to_string();
    if let Some(ref label) = block.label {
        let shown = if label.name().is_some() {
            paint.bg(Color::DarkMagenta, label)
        } else {
            paint.fg(Color::DarkGrey, label)
        };
        writeln!(w, "{indent}{shown}")?;
        text_indent.push_str("    ");
    }
    for line in block.texts.iter().flatten() {
        let color = if line.speaker == playtime_core::Speaker::Narrator {
            Color::Cyan
        } else {
            Color::Green
        };
        writeln!(w, "{text_indent}{} \"{}\"", paint.fg(color, &line.speaker), line.text)?;
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

/// A structured error with optional suggestion and error code.
#[derive(Debug, Serialize)]
pub struct CliError {
    /// Human-readable error message.
    pub message: String,
    /// Optional suggestion for how to fix the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Machine-readable error code (e.g. "E1001").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// Input file the error belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl CliError {
    /// Create a simple error with just a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
            error_code: None,
            file: None,
        }
    }

    /// Attach the input file.
    #[must_use]
    pub fn in_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Build from any error chain, surfacing a [`PlaytimeError`] code when
    /// one is inside.
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        err.downcast_ref::<PlaytimeError>().map_or_else(
            || Self::new(format!("{err:#}")),
            |inner| Self {
                message: format!("{err:#}"),
                ..Self::from(inner)
            },
        )
    }
}

impl From<&PlaytimeError> for CliError {
    fn from(err: &PlaytimeError) -> Self {
        let code = err.code();
        Self {
            message: err.to_string(),
            suggestion: code.hint().map(ToString::to_string),
            error_code: Some(code.code().to_string()),
            file: None,
        }
    }
}

/// Render an error to stderr in the requested format.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    write_error(&mut out, mode, error)
}

fn write_error(w: &mut dyn Write, mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    match mode {
        OutputMode::Json => {
            let wrapper = serde_json::json!({
                "error": error,
            });
            serde_json::to_writer_pretty(&mut *w, &wrapper)?;
            writeln!(w)?;
        }
        OutputMode::Pretty | OutputMode::Text => {
            match error.file {
                Some(ref file) => writeln!(w, "error: {file}: {}", error.message)?,
                None => writeln!(w, "error: {}", error.message)?,
            }
            if let Some(ref suggestion) = error.suggestion {
                writeln!(w, "  suggestion: {suggestion}")?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReadingConfig;
    use crate::report::{ConfigReport, Line, Share};
    use playtime_core::{Label, Speaker};

    // ── resolve_output_mode_inner ───────────────────────────────────────────

    #[test]
    fn resolve_format_flag_wins_over_json_and_env() {
        let mode = resolve_output_mode_inner(Some(OutputMode::Text), true, Some("pretty"), true);
        assert_eq!(mode, OutputMode::Text);
    }

    #[test]
    fn resolve_json_flag_wins_over_env() {
        let mode = resolve_output_mode_inner(None, true, Some("pretty"), true);
        assert_eq!(mode, OutputMode::Json);
    }

    #[test]
    fn resolve_format_env_case_insensitive() {
        let mode = resolve_output_mode_inner(None, false, Some("TEXT"), true);
        assert_eq!(mode, OutputMode::Text);
    }

    #[test]
    fn resolve_unknown_env_falls_back_to_tty() {
        assert_eq!(
            resolve_output_mode_inner(None, false, Some("yaml"), true),
            OutputMode::Pretty
        );
        assert_eq!(
            resolve_output_mode_inner(None, false, None, false),
            OutputMode::Text
        );
    }

    // ── reports ─────────────────────────────────────────────────────────────

    fn sample() -> FileReport {
        FileReport {
            file: "script.rpy".into(),
            minimum: Some(BoundReport {
                time: Some(1.5),
                by_characters: Some(vec![Share {
                    name: "e".into(),
                    builtin: false,
                    time: 1.5,
                }]),
                path: Some(vec![
                    PathEntry::Block(BlockEntry {
                        label: Some(Label::named("start")),
                        texts: Some(vec![Line {
                            speaker: Speaker::Named("e".into()),
                            text: "Hello.".into(),
                        }]),
                    }),
                    PathEntry::Loop(vec![BlockEntry {
                        label: Some(Label::named("again")),
                        texts: None,
                    }]),
                ]),
            }),
            maximum: Some(BoundReport {
                time: None,
                by_characters: None,
                path: None,
            }),
            config: ConfigReport::from(&ReadingConfig::default()),
        }
    }

    fn render(mode: OutputMode) -> String {
        let mut buf = Vec::new();
        write_report(&mut buf, mode, &sample()).expect("render");
        String::from_utf8(buf).expect("utf8")
    }

    #[test]
    fn text_mode_lays_out_bounds_and_path() {
        let out = render(OutputMode::Text);
        let expected = "\
file: script.rpy
Assuming non-CJK reading speed of 582.9 characters per minute.
Assuming CJK reading speed of 110 characters per minute.
Minimum time to play: 1.50 min
  e 1.50
Path:
    start
        e \"Hello.\"
    Loop:
        again
Maximum time to play: no reachable ending
";
        assert_eq!(out, expected);
    }

    #[test]
    fn pretty_mode_adds_color_and_rule() {
        let out = render(OutputMode::Pretty);
        assert!(out.starts_with("script.rpy\n"));
        assert!(out.contains(&"-".repeat(PRETTY_RULE_WIDTH)));
        if std::env::var_os("NO_COLOR").is_none() {
            assert!(out.contains('\u{1b}'), "expected ANSI escapes");
        }
    }

    #[test]
    fn json_mode_is_machine_readable() {
        let out = render(OutputMode::Json);
        let value: serde_json::Value = serde_json::from_str(&out).expect("json");
        assert_eq!(value["file"], "script.rpy");
        assert_eq!(value["minimum"]["time"], 1.5);
        assert_eq!(value["minimum"]["path"][0]["block"]["label"], "start");
        assert_eq!(value["minimum"]["path"][1]["loop"][0]["label"], "again");
        assert!(value["maximum"]["time"].is_null());
        assert_eq!(value["config"]["speed"]["cjk"], 110.0);
    }

    // ── errors ──────────────────────────────────────────────────────────────

    #[test]
    fn cli_error_from_playtime_error() {
        let err = PlaytimeError::DuplicateLabel {
            line: 4,
            label: "start".into(),
        };
        let cli = CliError::from(&err);
        assert!(cli.message.contains("start"));
        assert_eq!(cli.error_code.as_deref(), Some("E2001"));
        assert!(cli.suggestion.is_some());
    }

    #[test]
    fn cli_error_from_anyhow_keeps_code_and_context() {
        let err = anyhow::Error::new(PlaytimeError::SelfJump {
            line: 2,
            label: "a".into(),
        })
        .context("script.rpy");
        let cli = CliError::from_anyhow(&err);
        assert_eq!(cli.error_code.as_deref(), Some("E2002"));
        assert!(cli.message.starts_with("script.rpy: "));
    }

    #[test]
    fn plain_anyhow_error_has_no_code() {
        let cli = CliError::from_anyhow(&anyhow::anyhow!("disk on fire"));
        assert_eq!(cli.message, "disk on fire");
        assert!(cli.error_code.is_none());
    }

    #[test]
    fn human_error_names_file_and_suggestion() {
        let mut err = CliError::new("bad indentation").in_file("a.rpy");
        err.suggestion = Some("indent it".into());
        let mut buf = Vec::new();
        write_error(&mut buf, OutputMode::Text, &err).expect("render");
        assert_eq!(
            String::from_utf8(buf).expect("utf8"),
            "error: a.rpy: bad indentation\n  suggestion: indent it\n"
        );
    }

    #[test]
    fn json_error_is_wrapped() {
        let err = CliError::new("boom");
        let mut buf = Vec::new();
        write_error(&mut buf, OutputMode::Json, &err).expect("render");
        let value: serde_json::Value = serde_json::from_slice(&buf).expect("json");
        assert_eq!(value["error"]["message"], "boom");
        assert!(value["error"].get("suggestion").is_none());
    }
}
