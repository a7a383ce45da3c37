use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::geometry::Layout;

/// Runtime settings, read from `UNFOLD_*` environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub tick: Duration,
    pub layout: Layout,
    pub metrics_port: Option<u16>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            tick: Duration::from_millis(1000),
            layout: Layout::default(),
            metrics_port: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid value for {}: {:?}", self.var, self.value)
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source; unset variables keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut cfg = Config::default();
        if let Some(dir) = lookup("UNFOLD_DATA_DIR") {
            cfg.data_dir = PathBuf::from(dir);
        }
        if let Some(ms) = parse::<u64>(&lookup, "UNFOLD_TICK_MS")? {
            if ms == 0 {
                return Err(ConfigError {
                    var: "UNFOLD_TICK_MS",
                    value: ms.to_string(),
                });
            }
            cfg.tick = Duration::from_millis(ms);
        }
        if let Some(h) = parse_px(&lookup, "UNFOLD_CARD_HEIGHT")? {
            cfg.layout.card_height = h;
        }
        if let Some(g) = parse_px(&lookup, "UNFOLD_CARD_GAP")? {
            cfg.layout.card_gap = g;
        }
        if let Some(o) = parse_px(&lookup, "UNFOLD_START_OFFSET")? {
            cfg.layout.start_offset = o;
        }
        cfg.metrics_port = parse::<u16>(&lookup, "UNFOLD_METRICS_PORT")?;
        Ok(cfg)
    }
}

fn parse<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError { var, value }),
    }
}

/// Pixel sizes must be finite and non-negative.
fn parse_px(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<f64>, ConfigError> {
    match parse::<f64>(lookup, var)? {
        Some(px) if !px.is_finite() || px < 0.0 => Err(ConfigError {
            var,
            value: px.to_string(),
        }),
        other => Ok(other),
    }
}
