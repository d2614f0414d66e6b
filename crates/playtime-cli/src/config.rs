use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// File name looked up in the working directory when `--config` is absent.
pub const PROJECT_CONFIG: &str = "playtime.toml";

/// Reading model used to turn script records into minutes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingConfig {
    /// Non-CJK characters read per minute.
    #[serde(default = "default_speed")]
    pub speed: f64,
    /// CJK characters read per minute.
    #[serde(default = "default_cjk_speed")]
    pub cjk_speed: f64,
    /// Seconds spent on a scene change.
    #[serde(default = "default_scene")]
    pub scene: f64,
    /// Seconds spent on a show or hide.
    #[serde(default = "default_show")]
    pub show: f64,
    /// Seconds spent advancing past a dialogue line.
    #[serde(default = "default_next")]
    pub next: f64,
    /// Count `pause N` statements.
    #[serde(default)]
    pub pause: bool,
    /// Speaker aliases: script name to display name.
    #[serde(default)]
    pub characters: BTreeMap<String, String>,
}

impl Default for ReadingConfig {
    fn default() -> Self {
        Self {
            speed: default_speed(),
            cjk_speed: default_cjk_speed(),
            scene: default_scene(),
            show: default_show(),
            next: default_next(),
            pause: false,
            characters: BTreeMap::new(),
        }
    }
}

const fn default_speed() -> f64 {
    582.9
}

const fn default_cjk_speed() -> f64 {
    110.0
}

const fn default_scene() -> f64 {
    0.8
}

const fn default_show() -> f64 {
    0.25
}

const fn default_next() -> f64 {
    0.3
}

/// One configuration file. Every key is optional and only the keys present
/// override the layer below.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
    pub speed: Option<f64>,
    pub cjk_speed: Option<f64>,
    pub scene: Option<f64>,
    pub show: Option<f64>,
    pub next: Option<f64>,
    pub pause: Option<bool>,
    #[serde(default)]
    pub characters: BTreeMap<String, String>,
}

impl ReadingConfig {
    /// Overlay `layer` on top of `self`. Aliases are merged key by key.
    pub fn apply(&mut self, layer: ConfigLayer) {
        if let Some(v) = layer.speed {
            self.speed = v;
        }
        if let Some(v) = layer.cjk_speed {
            self.cjk_speed = v;
        }
        if let Some(v) = layer.scene {
            self.scene = v;
        }
        if let Some(v) = layer.show {
            self.show = v;
        }
        if let Some(v) = layer.next {
            self.next = v;
        }
        if let Some(v) = layer.pause {
            self.pause = v;
        }
        self.characters.extend(layer.characters);
    }

    /// Reject values the aggregator cannot turn into finite minutes.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("speed", self.speed), ("cjk_speed", self.cjk_speed)] {
            if !(value.is_finite() && value > 0.0) {
                bail!("{name} must be a positive number of characters per minute, got {value}");
            }
        }
        for (name, value) in [
            ("scene", self.scene),
            ("show", self.show),
            ("next", self.next),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                bail!("{name} must be a non-negative number of seconds, got {value}");
            }
        }
        Ok(())
    }
}

/// Parse one TOML layer from disk.
pub fn load_layer(path: &Path) -> Result<ConfigLayer> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ConfigLayer>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// `<config_dir>/playtime/config.toml`, when the platform has a config dir.
#[must_use]
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("playtime/config.toml"))
}

/// Resolve the file layers below the command line.
///
/// The user file is optional. An explicit `--config` path must exist;
/// otherwise `./playtime.toml` is used when present.
pub fn load_config(explicit: Option<&Path>, working_dir: &Path) -> Result<ReadingConfig> {
    let mut config = ReadingConfig::default();

    if let Some(path) = user_config_path().filter(|p| p.exists()) {
        config.apply(load_layer(&path)?);
    }

    match explicit {
        Some(path) => config.apply(load_layer(path)?),
        None => {
            let path = working_dir.join(PROJECT_CONFIG);
            if path.exists() {
                config.apply(load_layer(&path)?);
            }
        }
    }

    Ok(config)
}

/// Parse a `-c` alias list: `name,from=to,...`. A bare `name` maps to
/// itself. Empty items are skipped.
pub fn parse_characters(list: &str) -> Result<BTreeMap<String, String>, String> {
    let mut aliases = BTreeMap::new();
    for item in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (from, to) = item
            .split_once('=')
            .map_or((item, item), |(from, to)| (from.trim(), to.trim()));
        if from.is_empty() {
            return Err(format!("alias `{item}` has no script name"));
        }
        aliases.insert(from.to_string(), to.to_string());
    }
    Ok(aliases)
}
