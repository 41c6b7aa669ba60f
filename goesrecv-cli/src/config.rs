//! CLI configuration: a `goesrecv_core::DemodulatorConfig` plus the
//! terminal-facing bits (input/output files, logging) the core itself has
//! no opinion on.

use std::path::{Path, PathBuf};

use color_eyre::eyre::{Context, Result};
use goesrecv_core::DemodulatorConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Deep merge JSON values: objects merge key-wise, anything else is replaced.
fn merge_json_values(base: &mut JsonValue, overlay: JsonValue) {
    match (base, overlay) {
        (JsonValue::Object(base_map), JsonValue::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                if let Some(base_value) = base_map.get_mut(&key) {
                    merge_json_values(base_value, value);
                } else {
                    base_map.insert(key, value);
                }
            }
        }
        (base_val, overlay_val) => {
            *base_val = overlay_val;
        }
    }
}

/// Complete CLI configuration bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub demodulator: DemodulatorConfig,
    #[serde(default)]
    pub terminal: TerminalConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            demodulator: DemodulatorConfig::default(),
            terminal: TerminalConfig::default(),
        }
    }
}

/// Terminal-facing configuration: I/O paths and logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminalConfig {
    /// Path to a raw interleaved-f32 I/Q sample file. Required unless
    /// overridden on the command line.
    #[serde(default)]
    pub input: Option<PathBuf>,

    /// Path to write recovered soft bits (raw `i8`). Defaults to stdout if unset.
    #[serde(default)]
    pub output: Option<PathBuf>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            input: None,
            output: None,
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_target")]
    pub target: LogTarget,
    #[serde(default)]
    pub file_path: Option<PathBuf>,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
}

fn default_log_target() -> LogTarget {
    LogTarget::Stderr
}

fn default_log_format() -> LogFormat {
    LogFormat::Json
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            target: default_log_target(),
            file_path: None,
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogTarget {
    Stdout,
    Stderr,
    File,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

impl CliConfig {
    /// Load a TOML config file, merging it over `CliConfig::default()` so
    /// partial files (overriding only, say, `demodulator.decimation`) work.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read config file: {}", path.display()))?;

        let parsed: toml::Value =
            toml::from_str(&content).wrap_err("failed to parse TOML configuration")?;
        let overlay = serde_json::to_value(&parsed).wrap_err("failed to convert TOML to JSON")?;

        let mut merged =
            serde_json::to_value(Self::default()).wrap_err("failed to serialize defaults")?;
        merge_json_values(&mut merged, overlay);

        serde_json::from_value(merged).wrap_err("failed to parse final configuration")
    }
}
