//! Structured Error Handling for fuzzy-signal
//!
//! Errors are split by the phase in which they can occur:
//!
//! - [`ConfigError`] - raised while building an engine or loading a config
//!   file. Fatal to startup, never produced by an evaluation.
//! - [`EvalError`] - returned by a single evaluation. Recoverable: a batch
//!   caller records the row as failed and keeps going.
//!
//! Every error maps onto a numeric [`ErrorCode`] and can be rendered as a
//! JSON [`ErrorReport`] for tools that flag rows instead of aborting.
//!
//! # Example
//!
//! ```rust,ignore
//! use fuzzy_signal::{market, EvalError};
//!
//! let engine = market::default_engine()?;
//! match engine.evaluate_and_label(&inputs) {
//!     Ok(decision) => println!("{}", decision.signal),
//!     Err(EvalError::DegenerateOutput { fallback, .. }) => flag_row(fallback),
//!     Err(e) => eprintln!("{}", e.report().to_json()),
//! }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::engine::RuleFiring;

// ============================================================================
// Error Codes
// ============================================================================

/// Unique error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Configuration errors (1xxx)
    /// Generic configuration error
    ConfigError = 1000,
    /// Breakpoints out of order or not finite
    InvalidBreakpoints = 1001,
    /// Breakpoint outside the variable's universe
    BreakpointOutOfRange = 1002,
    /// Universe bounds or resolution unusable
    InvalidUniverse = 1003,
    /// Same term or variable declared twice
    DuplicateName = 1004,
    /// Rule references an undeclared variable or term
    UnknownReference = 1005,
    /// Decision thresholds unusable
    InvalidThresholds = 1006,
    /// Unknown rule base name
    UnknownRuleBase = 1007,
    /// Config file could not be read or written
    ConfigIo = 1008,
    /// Config file could not be parsed
    InvalidConfigSyntax = 1009,

    // Evaluation errors (2xxx)
    /// A declared input variable has no value
    MissingInput = 2001,
    /// An input value is NaN or infinite
    InvalidInput = 2002,
    /// No rule fired, centroid undefined
    DegenerateOutput = 2003,

    // Internal errors (9xxx)
    /// Fuzzified inputs disagree with validated rules
    InternalConsistency = 9001,
}

impl ErrorCode {
    /// Get the numeric code value
    pub fn code(&self) -> u32 {
        *self as u32
    }

    /// Get a short description of the error code
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::InvalidBreakpoints => "Invalid membership breakpoints",
            ErrorCode::BreakpointOutOfRange => "Breakpoint outside universe",
            ErrorCode::InvalidUniverse => "Invalid universe",
            ErrorCode::DuplicateName => "Duplicate name",
            ErrorCode::UnknownReference => "Unknown variable or term",
            ErrorCode::InvalidThresholds => "Invalid decision thresholds",
            ErrorCode::UnknownRuleBase => "Unknown rule base",
            ErrorCode::ConfigIo => "Configuration file I/O error",
            ErrorCode::InvalidConfigSyntax => "Invalid configuration syntax",

            ErrorCode::MissingInput => "Missing input value",
            ErrorCode::InvalidInput => "Invalid input value",
            ErrorCode::DegenerateOutput => "No rule fired",

            ErrorCode::InternalConsistency => "Internal consistency error",
        }
    }

    /// Whether a batch caller can skip the row and continue
    pub fn is_recoverable(&self) -> bool {
        self.code() / 1000 == 2
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

// ============================================================================
// Configuration Errors
// ============================================================================

/// Errors raised while building an engine or loading configuration
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("breakpoints {points:?} must be finite and non-decreasing")]
    InvalidBreakpoints { points: Vec<f64> },

    #[error("term '{term}' of '{variable}' has breakpoint {point} outside universe [{min}, {max}]")]
    BreakpointOutOfRange {
        variable: String,
        term: String,
        point: f64,
        min: f64,
        max: f64,
    },

    #[error("variable '{variable}' has invalid universe [{min}, {max}] with resolution {resolution}")]
    InvalidUniverse {
        variable: String,
        min: f64,
        max: f64,
        resolution: f64,
    },

    #[error("variable '{variable}' declares term '{term}' twice")]
    DuplicateTerm { variable: String, term: String },

    #[error("variable '{0}' is declared twice")]
    DuplicateVariable(String),

    #[error("rule {rule} references undeclared variable '{variable}'")]
    UnknownVariable { rule: usize, variable: String },

    #[error("rule {rule} references undeclared term '{term}' of '{variable}'")]
    UnknownTerm {
        rule: usize,
        variable: String,
        term: String,
    },

    #[error("rule {rule} has no antecedent clauses")]
    EmptyAntecedent { rule: usize },

    #[error("decision thresholds sell={sell} buy={buy} must be finite with sell <= buy")]
    InvalidThresholds { sell: f64, buy: f64 },

    #[error("unknown rule base: {0}")]
    UnknownRuleBase(String),

    #[error("IO error reading {}: {message}", .path.display())]
    Io { path: PathBuf, message: String },

    #[error("parse error in {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("serialization error: {0}")]
    Serialize(String),
}

impl ConfigError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ConfigError::InvalidBreakpoints { .. } => ErrorCode::InvalidBreakpoints,
            ConfigError::BreakpointOutOfRange { .. } => ErrorCode::BreakpointOutOfRange,
            ConfigError::InvalidUniverse { .. } => ErrorCode::InvalidUniverse,
            ConfigError::DuplicateTerm { .. } | ConfigError::DuplicateVariable(_) => {
                ErrorCode::DuplicateName
            }
            ConfigError::UnknownVariable { .. }
            | ConfigError::UnknownTerm { .. }
            | ConfigError::EmptyAntecedent { .. } => ErrorCode::UnknownReference,
            ConfigError::InvalidThresholds { .. } => ErrorCode::InvalidThresholds,
            ConfigError::UnknownRuleBase(_) => ErrorCode::UnknownRuleBase,
            ConfigError::Io { .. } => ErrorCode::ConfigIo,
            ConfigError::Parse { .. } => ErrorCode::InvalidConfigSyntax,
            ConfigError::Serialize(_) => ErrorCode::ConfigError,
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport::new(self.code(), self.to_string())
    }
}

// ============================================================================
// Evaluation Errors
// ============================================================================

/// Errors returned by a single evaluation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("no value supplied for input variable '{variable}'")]
    MissingInput { variable: String },

    #[error("input '{variable}' is not a finite number: {value}")]
    InvalidInput { variable: String, value: f64 },

    /// The aggregated output curve is zero everywhere. `fallback` is the
    /// midpoint of the output universe.
    #[error("no rule fired; falling back to universe midpoint {fallback}")]
    DegenerateOutput {
        fallback: f64,
        rule_firings: Vec<RuleFiring>,
    },

    #[error("rule '{rule}' references '{variable}.{term}' missing from fuzzified inputs")]
    InternalConsistency {
        rule: String,
        variable: String,
        term: String,
    },
}

impl EvalError {
    pub fn code(&self) -> ErrorCode {
        match self {
            EvalError::MissingInput { .. } => ErrorCode::MissingInput,
            EvalError::InvalidInput { .. } => ErrorCode::InvalidInput,
            EvalError::DegenerateOutput { .. } => ErrorCode::DegenerateOutput,
            EvalError::InternalConsistency { .. } => ErrorCode::InternalConsistency,
        }
    }

    /// The safe default crisp value, if this error carries one
    pub fn fallback(&self) -> Option<f64> {
        match self {
            EvalError::DegenerateOutput { fallback, .. } => Some(*fallback),
            _ => None,
        }
    }

    pub fn report(&self) -> ErrorReport {
        let report = ErrorReport::new(self.code(), self.to_string());
        match self {
            EvalError::MissingInput { variable } => report.with_detail("variable", variable),
            EvalError::InvalidInput { variable, value } => report
                .with_detail("variable", variable)
                .with_detail("value", value.to_string()),
            EvalError::DegenerateOutput { fallback, .. } => {
                report.with_detail("fallback", fallback.to_string())
            }
            EvalError::InternalConsistency { rule, .. } => report.with_detail("rule", rule),
        }
    }
}

// ============================================================================
// Error report for batch tools
// ============================================================================

/// Structured, serializable form of an error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Error code (string form)
    pub code: ErrorCode,
    /// Numeric error code
    pub code_num: u32,
    /// Whether the caller can skip and continue
    pub recoverable: bool,
    /// Error message
    pub message: String,
    /// Additional details
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub details: HashMap<String, String>,
}

impl ErrorReport {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            code_num: code.code(),
            recoverable: code.is_recoverable(),
            message: message.into(),
            details: HashMap::new(),
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code_num":{},"message":"{}"}}"#, self.code_num, self.message)
        })
    }
}

impl From<&ConfigError> for ErrorReport {
    fn from(err: &ConfigError) -> Self {
        err.report()
    }
}

impl From<&EvalError> for ErrorReport {
    fn from(err: &EvalError) -> Self {
        err.report()
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse {
            path: PathBuf::from("<string>"),
            message: err.to_string(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::InvalidBreakpoints.code(), 1001);
        assert_eq!(ErrorCode::MissingInput.code(), 2001);
        assert_eq!(ErrorCode::InternalConsistency.code(), 9001);
    }

    #[test]
    fn test_recoverable_codes() {
        assert!(ErrorCode::MissingInput.is_recoverable());
        assert!(ErrorCode::DegenerateOutput.is_recoverable());
        assert!(!ErrorCode::UnknownReference.is_recoverable());
        assert!(!ErrorCode::InternalConsistency.is_recoverable());
    }

    #[test]
    fn test_config_error_codes() {
        let err = ConfigError::UnknownTerm {
            rule: 3,
            variable: "rsi".to_string(),
            term: "hot".to_string(),
        };
        assert_eq!(err.code(), ErrorCode::UnknownReference);
        assert!(err.to_string().contains("rule 3"));
        assert!(err.to_string().contains("'hot'"));
    }

    #[test]
    fn test_degenerate_fallback() {
        let err = EvalError::DegenerateOutput {
            fallback: 0.0,
            rule_firings: Vec::new(),
        };
        assert_eq!(err.fallback(), Some(0.0));
        assert_eq!(err.code(), ErrorCode::DegenerateOutput);

        let missing = EvalError::MissingInput { variable: "rsi".to_string() };
        assert_eq!(missing.fallback(), None);
    }

    #[test]
    fn test_report_json() {
        let err = EvalError::MissingInput { variable: "rsi".to_string() };
        let json = err.report().to_json();
        assert!(json.contains("\"MISSING_INPUT\""));
        assert!(json.contains("\"code_num\":2001"));
        assert!(json.contains("\"recoverable\":true"));
        assert!(json.contains("\"variable\":\"rsi\""));
    }
}
