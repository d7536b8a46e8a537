//! Configuration System for fuzzy-signal
//!
//! Provides:
//! - TOML configuration files
//! - Environment variable overrides
//! - Multiple config file locations
//!
//! # Configuration File Locations
//!
//! Configuration files are searched in order (first found wins):
//! 1. `./fuzzy-signal.toml` - Project-local configuration
//! 2. `~/.config/fuzzy-signal/config.toml` - User configuration (XDG)
//! 3. `~/.fuzzy-signal/config.toml` - User configuration (legacy)
//! 4. `/etc/fuzzy-signal/config.toml` - System-wide configuration
//!
//! # Environment Variables
//!
//! - `FUZZY_SIGNAL_RULE_BASE` - Rule base (momentum, contrarian, trend-surface)
//! - `FUZZY_SIGNAL_RESOLUTION` - Sampling step of the action universe
//! - `FUZZY_SIGNAL_BUY_THRESHOLD` - Crisp value above which the signal is Buy
//! - `FUZZY_SIGNAL_SELL_THRESHOLD` - Crisp value below which the signal is Sell
//! - `FUZZY_SIGNAL_DEFAULT_RSI` - Stand-in RSI when a row has none
//! - `FUZZY_SIGNAL_LOG_LEVEL` - Logging verbosity (quiet, normal, verbose, debug)
//!
//! # Example Configuration
//!
//! ```toml
//! [general]
//! log_level = "normal"
//!
//! [engine]
//! rule_base = "momentum"
//! resolution = 0.001
//!
//! [thresholds]
//! buy = 0.3
//! sell = -0.3
//!
//! [defaults]
//! rsi = 50.0
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::decision::Thresholds;
use crate::engine::InferenceEngine;
use crate::error::ConfigError;
use crate::market::{self, IndicatorDefaults, RuleBase, DEFAULT_RESOLUTION};

const ENV_PREFIX: &str = "FUZZY_SIGNAL_";

// ============================================================================
// Configuration Schema
// ============================================================================

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SignalConfig {
    /// General settings
    pub general: GeneralConfig,
    /// Rule base and output sampling
    pub engine: EngineConfig,
    /// Decision thresholds on the crisp output
    pub thresholds: Thresholds,
    /// Stand-ins for indicators a caller cannot supply
    pub defaults: IndicatorDefaults,
}

/// General configuration options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GeneralConfig {
    /// Logging level
    pub log_level: LogLevel,
}

/// Engine configuration options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub rule_base: RuleBase,
    /// Sampling step of the action universe
    pub resolution: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rule_base: RuleBase::default(),
            resolution: DEFAULT_RESOLUTION,
        }
    }
}

// ============================================================================
// Enums
// ============================================================================

/// Log level options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Quiet,
    #[default]
    Normal,
    Verbose,
    Debug,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Verbose => "verbose",
            LogLevel::Debug => "debug",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "quiet" | "q" | "0" => Some(LogLevel::Quiet),
            "normal" | "n" | "1" => Some(LogLevel::Normal),
            "verbose" | "v" | "2" => Some(LogLevel::Verbose),
            "debug" | "d" | "3" => Some(LogLevel::Debug),
            _ => None,
        }
    }

    /// Filter directive for a `tracing` subscriber
    pub fn filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Quiet => "error",
            LogLevel::Normal => "warn",
            LogLevel::Verbose => "info",
            LogLevel::Debug => "debug",
        }
    }

    /// Shift verbosity by `-v` / `-q` counts
    pub fn adjusted(self, verbose: u8, quiet: u8) -> Self {
        let level = match self {
            LogLevel::Quiet => 0i16,
            LogLevel::Normal => 1,
            LogLevel::Verbose => 2,
            LogLevel::Debug => 3,
        };
        match (level + verbose as i16 - quiet as i16).clamp(0, 3) {
            0 => LogLevel::Quiet,
            1 => LogLevel::Normal,
            2 => LogLevel::Verbose,
            _ => LogLevel::Debug,
        }
    }
}

// ============================================================================
// Configuration Loading
// ============================================================================

impl SignalConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from default locations
    ///
    /// The first existing file from [`SignalConfig::config_paths`] is read,
    /// then environment variable overrides are applied.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        for path in Self::config_paths() {
            if path.exists() {
                config = Self::load_from_file(&path)?;
                break;
            }
        }

        config.apply_env_overrides()?;

        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load configuration from a TOML string
    pub fn load_from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Get the list of config file search paths
    pub fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./fuzzy-signal.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("fuzzy-signal").join("config.toml"));
        }

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".fuzzy-signal").join("config.toml"));
        }

        #[cfg(unix)]
        paths.push(PathBuf::from("/etc/fuzzy-signal/config.toml"));

        paths
    }

    /// Apply `FUZZY_SIGNAL_*` environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| env::var(format!("{ENV_PREFIX}{key}")).ok())
    }

    /// Apply overrides from `lookup`, keyed without the `FUZZY_SIGNAL_` prefix.
    ///
    /// An unknown rule base is an error. Other values that fail to parse are
    /// logged and ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let number = |key: &str| {
            let raw = lookup(key)?;
            match raw.trim().parse::<f64>() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(key, value = %raw, "ignoring unparsable override");
                    None
                }
            }
        };

        if let Some(name) = lookup("RULE_BASE") {
            self.engine.rule_base = RuleBase::parse(&name)?;
        }

        if let Some(resolution) = number("RESOLUTION") {
            self.engine.resolution = resolution;
        }

        if let Some(buy) = number("BUY_THRESHOLD") {
            self.thresholds.buy = buy;
        }

        if let Some(sell) = number("SELL_THRESHOLD") {
            self.thresholds.sell = sell;
        }

        if let Some(rsi) = number("DEFAULT_RSI") {
            self.defaults.rsi = Some(rsi);
        }

        if let Some(level) = lookup("LOG_LEVEL").and_then(|v| LogLevel::from_str(&v)) {
            self.general.log_level = level;
        }

        Ok(())
    }

    /// Build the inference engine this configuration describes
    pub fn build_engine(&self) -> Result<InferenceEngine, ConfigError> {
        market::engine(self.engine.rule_base, self.engine.resolution, self.thresholds)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Write configuration to a file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_toml()?;
        fs::write(path, content).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Generate a default configuration file content
    pub fn default_config_content() -> &'static str {
        r#"# fuzzy-signal configuration

[general]
# Logging level: quiet, normal, verbose, debug
log_level = "normal"

[engine]
# Rule base: momentum, contrarian, trend-surface
rule_base = "momentum"
# Sampling step of the action universe [-1, 1]
resolution = 0.001

[thresholds]
# Crisp outputs strictly above buy are Buy, strictly below sell are Sell
buy = 0.3
sell = -0.3

[defaults]
# Stand-ins for indicators that are not available.
# Unset indicators are reported as missing inputs.
# rsi = 50.0
"#
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn overrides(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = SignalConfig::new();
        assert_eq!(config.engine.rule_base, RuleBase::Momentum);
        assert_eq!(config.engine.resolution, 0.001);
        assert_eq!(config.thresholds, Thresholds::default());
        assert_eq!(config.defaults.rsi, None);
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
            [general]
            log_level = "verbose"

            [engine]
            rule_base = "trend-surface"
            resolution = 0.002

            [thresholds]
            buy = 0.4

            [defaults]
            rsi = 50.0
        "#;

        let config = SignalConfig::load_from_str(toml).unwrap();
        assert_eq!(config.general.log_level, LogLevel::Verbose);
        assert_eq!(config.engine.rule_base, RuleBase::TrendSurface);
        assert_eq!(config.engine.resolution, 0.002);
        assert_eq!(config.thresholds.buy, 0.4);
        assert_eq!(config.thresholds.sell, -0.3);
        assert_eq!(config.defaults.rsi, Some(50.0));
    }

    #[test]
    fn test_parse_error() {
        let result = SignalConfig::load_from_str("[engine]\nrule_base = \"sugeno\"\n");
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_default_content_parses() {
        let config = SignalConfig::load_from_str(SignalConfig::default_config_content()).unwrap();
        assert_eq!(config, SignalConfig::default());
    }

    #[test]
    fn test_serialize_config() {
        let config = SignalConfig::new();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[engine]"));
        assert!(toml.contains("rule_base = \"momentum\""));
        assert!(toml.contains("[thresholds]"));

        assert_eq!(SignalConfig::load_from_str(&toml).unwrap(), config);
    }

    #[test]
    fn test_overrides() {
        let mut config = SignalConfig::new();
        config.apply_overrides(overrides(&[
            ("RULE_BASE", "contrarian"),
            ("BUY_THRESHOLD", "0.5"),
            ("SELL_THRESHOLD", "-0.5"),
            ("DEFAULT_RSI", "50"),
            ("LOG_LEVEL", "debug"),
            ("RESOLUTION", "not a number"),
        ]))
        .unwrap();

        assert_eq!(config.engine.rule_base, RuleBase::Contrarian);
        assert_eq!(config.thresholds, Thresholds::new(-0.5, 0.5));
        assert_eq!(config.defaults.rsi, Some(50.0));
        assert_eq!(config.general.log_level, LogLevel::Debug);
        assert_eq!(config.engine.resolution, 0.001);
    }

    #[test]
    fn test_unknown_rule_base_override() {
        let mut config = SignalConfig::new();
        let err = config
            .apply_overrides(overrides(&[("RULE_BASE", "sugeno")]))
            .unwrap_err();
        assert_eq!(err, ConfigError::UnknownRuleBase("sugeno".to_string()));
        assert_eq!(config.engine.rule_base, RuleBase::Momentum);
    }

    #[test]
    fn test_build_engine() {
        let engine = SignalConfig::new().build_engine().unwrap();
        assert_eq!(engine.rules().len(), 13);
        assert_eq!(engine.inputs().count(), 4);
    }

    #[test]
    fn test_build_engine_rejects_bad_values() {
        let mut config = SignalConfig::new();
        config.thresholds = Thresholds::new(0.5, -0.5);
        assert!(matches!(
            config.build_engine(),
            Err(ConfigError::InvalidThresholds { .. })
        ));

        let mut config = SignalConfig::new();
        config.engine.resolution = 0.0;
        assert!(matches!(
            config.build_engine(),
            Err(ConfigError::InvalidUniverse { .. })
        ));

        let mut config = SignalConfig::new();
        config
            .apply_overrides(overrides(&[("RESOLUTION", "1e-12")]))
            .unwrap();
        assert!(matches!(
            config.build_engine(),
            Err(ConfigError::InvalidUniverse { .. })
        ));
    }

    #[test]
    fn test_log_level() {
        assert_eq!(LogLevel::from_str("quiet"), Some(LogLevel::Quiet));
        assert_eq!(LogLevel::from_str("v"), Some(LogLevel::Verbose));
        assert_eq!(LogLevel::from_str("loud"), None);
        assert_eq!(LogLevel::Normal.adjusted(2, 0), LogLevel::Debug);
        assert_eq!(LogLevel::Normal.adjusted(5, 0), LogLevel::Debug);
        assert_eq!(LogLevel::Verbose.adjusted(0, 3), LogLevel::Quiet);
    }

    #[test]
    fn test_config_paths() {
        let paths = SignalConfig::config_paths();
        assert!(paths[0].ends_with("fuzzy-signal.toml"));
    }

    #[test]
    fn test_load_from_missing_file() {
        let result = SignalConfig::load_from_file(Path::new("/nonexistent/fuzzy-signal.toml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
