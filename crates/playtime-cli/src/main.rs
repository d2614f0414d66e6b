#![forbid(unsafe_code)]

mod aggregate;
mod classify;
mod config;
mod output;
mod report;
mod timing;

use aggregate::ReadingAggregator;
use anyhow::Context;
use clap::Parser;
use classify::RenpyClassifier;
use config::{ReadingConfig, load_config, parse_characters};
use output::{CliError, OutputMode};
use playtime_core::GraphBuilder;
use report::{BoundReport, ConfigReport, Detail, FileReport};
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use timing::Phase;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[allow(clippy::struct_excessive_bools)]
#[command(
    name = "playtime",
    author,
    version,
    about = "Estimate minimum and maximum playtime of Ren'Py scripts",
    long_about = None,
    after_help = "EXAMPLES:\n    # Both bounds for a whole game\n    playtime game/*.rpy\n\n    # Shortest route, listed by label\n    playtime --min --labels game/script.rpy\n\n    # Per-speaker time along the longest route, as JSON\n    playtime -M -C --json game/script.rpy"
)]
struct Cli {
    /// Ren'Py script files. Each file is estimated on its own.
    #[arg(required = true, value_name = "FILES")]
    files: Vec<PathBuf>,

    /// Emit JSON output instead of human-readable text.
    #[arg(short, long)]
    json: bool,

    /// Output format (overrides --json and FORMAT).
    #[arg(long, value_enum)]
    format: Option<OutputMode>,

    /// Only compute the minimum (shortest) playthrough.
    #[arg(short = 'm', long = "min", visible_alias = "minimum", conflicts_with = "max")]
    min: bool,

    /// Only compute the maximum (longest) playthrough.
    #[arg(short = 'M', long = "max", visible_alias = "maximum")]
    max: bool,

    /// Speaker aliases: `name,from=to,...`.
    #[arg(short = 'c', long = "character", value_name = "LIST", value_parser = parse_characters)]
    character: Option<BTreeMap<String, String>>,

    /// Tally time spent on each speaker along each path.
    #[arg(short = 'C', long)]
    by_characters: bool,

    /// Non-CJK reading speed in characters per minute [default: 582.9].
    #[arg(short = 's', long)]
    speed: Option<f64>,

    /// CJK reading speed in characters per minute [default: 110].
    #[arg(short = 'S', long)]
    cjk_speed: Option<f64>,

    /// Seconds spent on a scene change [default: 0.8].
    #[arg(long)]
    scene: Option<f64>,

    /// Seconds spent on showing or hiding an image [default: 0.25].
    #[arg(long)]
    show: Option<f64>,

    /// Seconds spent advancing past a dialogue line [default: 0.3].
    #[arg(long)]
    next: Option<f64>,

    /// Include `pause N` statements.
    #[arg(short = 'p', long)]
    pause: bool,

    /// List the chosen path by labels.
    #[arg(short = 'l', long)]
    labels: bool,

    /// List the chosen path by dialogue text.
    #[arg(short = 't', long)]
    texts: bool,

    /// Project configuration file (default: ./playtime.toml when present).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Emit phase timing report to stderr.
    #[arg(long)]
    timing: bool,

    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        output::resolve_output_mode(self.format, self.json)
    }

    const fn detail(&self) -> Detail {
        Detail {
            labels: self.labels,
            texts: self.texts,
            by_characters: self.by_characters,
        }
    }

    /// Apply flag values on top of the file layers.
    fn overlay(&self, config: &mut ReadingConfig) {
        if let Some(v) = self.speed {
            config.speed = v;
        }
        if let Some(v) = self.cjk_speed {
            config.cjk_speed = v;
        }
        if let Some(v) = self.scene {
            config.scene = v;
        }
        if let Some(v) = self.show {
            config.show = v;
        }
        if let Some(v) = self.next {
            config.next = v;
        }
        if self.pause {
            config.pause = true;
        }
        if let Some(ref aliases) = self.character {
            config
                .characters
                .extend(aliases.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
    }

    fn reading_config(&self) -> anyhow::Result<ReadingConfig> {
        let working_dir = env::current_dir()?;
        let mut config = load_config(self.config.as_deref(), &working_dir)?;
        self.overlay(&mut config);
        config.validate()?;
        Ok(config)
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("PLAYTIME_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "playtime=debug,info"
        } else {
            "playtime=info,warn"
        })
    });

    let format = env::var("PLAYTIME_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// Read a script as UTF-8 and drop a leading byte-order mark.
fn read_script(path: &Path) -> anyhow::Result<String> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(match content.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => content,
    })
}

/// Estimate one file.
fn run_file(cli: &Cli, config: &ReadingConfig, path: &Path) -> anyhow::Result<FileReport> {
    let file = path.display().to_string();
    let script = read_script(path)?;

    let classifier = RenpyClassifier::new(config.characters.clone(), config.pause);
    let aggregator = ReadingAggregator::new(config, cli.by_characters);
    let mut builder = GraphBuilder::new(classifier, aggregator);

    timing::timed(&file, Phase::Parse, || {
        script
            .lines()
            .enumerate()
            .try_for_each(|(i, line)| builder.parse_line(line, i + 1))
    })?;

    let raw = builder.block_count();
    let graph = timing::timed(&file, Phase::Optimize, || builder.optimize())?;
    debug!(file = %file, raw, optimized = graph.len(), "graph ready");

    let detail = cli.detail();
    let minimum = (!cli.max).then(|| {
        let route = timing::timed(&file, Phase::Minimum, || graph.minimum());
        if route.is_none() {
            warn!(file = %file, "no ending is reachable for the minimum");
        }
        BoundReport::new(&graph, route.as_ref(), detail)
    });
    let maximum = (!cli.min).then(|| {
        let route = timing::timed(&file, Phase::Maximum, || graph.maximum());
        if route.is_none() {
            warn!(file = %file, "no ending is reachable for the maximum");
        }
        BoundReport::new(&graph, route.as_ref(), detail)
    });

    Ok(FileReport {
        file,
        minimum,
        maximum,
        config: ConfigReport::from(config),
    })
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let timing_enabled = cli.timing || timing::timing_enabled_from_env();
    timing::set_timing_enabled(timing_enabled);
    timing::clear_timings();

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let mode = cli.output_mode();
    let config = match cli.reading_config() {
        Ok(config) => config,
        Err(err) => {
            output::render_error(mode, &CliError::from_anyhow(&err))?;
            return Ok(ExitCode::FAILURE);
        }
    };
    debug!(?config, "reading config");

    let mut failed = 0usize;
    for path in &cli.files {
        match run_file(&cli, &config, path) {
            Ok(report) => output::render_report(mode, &report)?,
            Err(err) => {
                failed += 1;
                let error = CliError::from_anyhow(&err).in_file(path.display().to_string());
                output::render_error(mode, &error)?;
            }
        }
    }

    if timing_enabled {
        let report = timing::collect_report();
        if report.is_empty() {
            eprintln!("timing report: no samples recorded");
        } else {
            eprintln!("timing report:");
            eprintln!("{}", report.display_table());
            eprintln!("timing report (json):");
            eprintln!("{}", serde_json::to_string_pretty(&report.to_json())?);
        }
    }

    if failed > 0 {
        if !mode.is_json() {
            warn!(failed, total = cli.files.len(), "some files could not be estimated");
        }
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
