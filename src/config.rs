//! Tool configuration.
//!
//! Handles loading, validating, and merging `imgconv.toml`. Stock defaults
//! are overridden by whatever the user file sets; everything is optional.
//!
//! ## Config File Location
//!
//! `--config <FILE>` names a file explicitly (it must exist). Without it,
//! `imgconv.toml` in the working directory is used when present.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [output]
//! format = "image/jpeg"     # Destination when --to is omitted and the output has no known extension
//! quality = 0               # JPEG quality 1-100 (0 = format default, i.e. 100)
//!
//! [processing]
//! max_processes = 4         # Max parallel batch workers (omit for auto = CPU cores)
//!
//! [logging]
//! level = "info"            # error | warn | info | debug | trace
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::Format;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "imgconv.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `imgconv.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    /// Defaults for the destination side of a conversion.
    pub output: OutputConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
    /// Log verbosity.
    pub logging: LoggingConfig,
}

impl ToolConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output.quality > 100 {
            return Err(ConfigError::Validation(
                "output.quality must be 0-100".into(),
            ));
        }
        if Format::from_mime(&self.output.format).is_none() {
            return Err(ConfigError::Validation(format!(
                "output.format must be one of image/png, image/jpeg, image/gif (got {:?})",
                self.output.format
            )));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        if self.logging.level.parse::<tracing::Level>().is_err() {
            return Err(ConfigError::Validation(format!(
                "logging.level must be one of error, warn, info, debug, trace (got {:?})",
                self.logging.level
            )));
        }
        Ok(())
    }
}

/// Destination defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// MIME tag of the fallback destination format.
    pub format: String,
    /// Quality used when the command line does not give one (0 = format default).
    pub quality: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: Format::Jpeg.mime().to_string(),
            quality: 0,
        }
    }
}

impl OutputConfig {
    /// The configured fallback format. Only meaningful after validation.
    pub fn format(&self) -> Option<Format> {
        Format::from_mime(&self.format)
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel conversion workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Maximum level emitted to stderr.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Parsed level, falling back to `INFO` for unparseable values.
    pub fn level(&self) -> tracing::Level {
        self.level.parse().unwrap_or(tracing::Level::INFO)
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged on top of.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(ToolConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto the stock defaults, then deserialize and
/// validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<ToolConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ToolConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load a config file as a raw TOML value.
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Load the effective config.
///
/// An explicit `path` must exist. Without one, `imgconv.toml` in `cwd` is
/// used when present and stock defaults otherwise.
pub fn load_config(path: Option<&Path>, cwd: &Path) -> Result<ToolConfig, ConfigError> {
    let overlay = match path {
        Some(p) => Some(load_raw_config(p)?),
        None => {
            let default_path = cwd.join(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                Some(load_raw_config(&default_path)?)
            } else {
                None
            }
        }
    };
    resolve_config(overlay)
}

/// Returns a fully-commented stock `imgconv.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# imgconv Configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Pass a file with --config, or put this file in the working directory
# as imgconv.toml. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# Destination format used when --to is not given and the output path has
# no recognised extension. One of image/png, image/jpeg, image/gif.
format = "image/jpeg"

# JPEG quality (1 = worst, 100 = best). 0 means the format default, which
# is 100. PNG and GIF ignore this.
quality = 0

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel conversion workers for `imgconv batch`.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4

# ---------------------------------------------------------------------------
# Logging
# ---------------------------------------------------------------------------
[logging]
# One of error, warn, info, debug, trace. Logs go to stderr.
level = "info"
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = ToolConfig::default();
        assert_eq!(config.output.format, "image/jpeg");
        assert_eq!(config.output.quality, 0);
        assert_eq!(config.processing.max_processes, None);
        assert_eq!(config.logging.level(), tracing::Level::INFO);
    }

    #[test]
    fn validate_default_config_passes() {
        assert!(ToolConfig::default().validate().is_ok());
    }

    #[test]
    fn parse_partial_config() {
        let config: ToolConfig = toml::from_str(
            r#"
            [output]
            quality = 75
            "#,
        )
        .unwrap();
        assert_eq!(config.output.quality, 75);
        // Unset keys keep their defaults
        assert_eq!(config.output.format, "image/jpeg");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn stock_config_parses_to_defaults() {
        let config: ToolConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config, ToolConfig::default());
    }

    // =========================================================================
    // Loading
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(None, tmp.path()).unwrap();
        assert_eq!(config, ToolConfig::default());
    }

    #[test]
    fn load_config_reads_cwd_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(DEFAULT_CONFIG_FILE),
            "[output]\nformat = \"image/png\"\n",
        )
        .unwrap();

        let config = load_config(None, tmp.path()).unwrap();
        assert_eq!(config.output.format(), Some(Format::Png));
    }

    #[test]
    fn load_config_explicit_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("custom.toml");
        fs::write(&path, "[processing]\nmax_processes = 2\n").unwrap();

        let config = load_config(Some(&path), Path::new("/nonexistent")).unwrap();
        assert_eq!(config.processing.max_processes, Some(2));
    }

    #[test]
    fn load_config_explicit_missing_file_is_error() {
        let tmp = TempDir::new().unwrap();
        let result = load_config(Some(&tmp.path().join("missing.toml")), tmp.path());
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(DEFAULT_CONFIG_FILE), "this is not toml [[[").unwrap();
        assert!(matches!(
            load_config(None, tmp.path()),
            Err(ConfigError::Toml(_))
        ));
    }

    // =========================================================================
    // Unknown keys and validation
    // =========================================================================

    #[test]
    fn unknown_key_rejected() {
        let result = resolve_config(Some(toml::from_str("[output]\nqualty = 5\n").unwrap()));
        assert!(result.is_err());
    }

    #[test]
    fn unknown_section_rejected() {
        let result = resolve_config(Some(toml::from_str("[cache]\nenabled = true\n").unwrap()));
        assert!(result.is_err());
    }

    #[test]
    fn validate_quality_boundary_ok() {
        let mut config = ToolConfig::default();
        config.output.quality = 100;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_quality_too_high() {
        let mut config = ToolConfig::default();
        config.output.quality = 101;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("output.quality"));
    }

    #[test]
    fn validate_unknown_format() {
        let mut config = ToolConfig::default();
        config.output.format = "image/bmp".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_zero_processes() {
        let mut config = ToolConfig::default();
        config.processing.max_processes = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_bad_log_level() {
        let mut config = ToolConfig::default();
        config.logging.level = "loud".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn log_level_parses_case_insensitively() {
        let config = LoggingConfig {
            level: "DEBUG".into(),
        };
        assert_eq!(config.level(), tracing::Level::DEBUG);
    }

    // =========================================================================
    // Merging
    // =========================================================================

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str("a = 1\nb = 2").unwrap();
        let overlay: toml::Value = toml::from_str("b = 3").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"].as_integer(), Some(1));
        assert_eq!(merged["b"].as_integer(), Some(3));
    }

    #[test]
    fn merge_toml_table_merge() {
        let base = stock_defaults_value().unwrap();
        let overlay: toml::Value = toml::from_str("[output]\nquality = 40").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["output"]["quality"].as_integer(), Some(40));
        assert_eq!(merged["output"]["format"].as_str(), Some("image/jpeg"));
        assert_eq!(merged["logging"]["level"].as_str(), Some("info"));
    }

    // =========================================================================
    // Thread count
    // =========================================================================

    #[test]
    fn effective_threads_auto() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&ProcessingConfig::default()), cores);
    }

    #[test]
    fn effective_threads_clamped_to_cores() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let config = ProcessingConfig {
            max_processes: Some(cores + 64),
        };
        assert_eq!(effective_threads(&config), cores);
    }

    #[test]
    fn effective_threads_user_constrains_down() {
        let config = ProcessingConfig {
            max_processes: Some(1),
        };
        assert_eq!(effective_threads(&config), 1);
    }
}
