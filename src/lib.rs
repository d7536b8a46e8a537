//! fuzzy-signal - Mamdani fuzzy inference for trading signals
//!
//! Maps four market indicators (`price_change`, `volume_change`, `rsi`,
//! `ma_trend`) to a crisp action in `[-1, 1]` and labels it Buy, Hold or Sell.
//!
//! # Architecture
//!
//! - [`fuzzy`] - Membership functions, linguistic variables and rules
//! - [`engine`] - The inference pipeline, batch evaluation and decision surfaces
//! - [`decision`] - Thresholds mapping crisp values to [`Signal`]s
//! - [`market`] - The market variables and the named rule bases
//! - [`config`] - TOML configuration with environment overrides
//! - [`error`] - Configuration and evaluation errors with stable codes
//!
//! # Example
//!
//! ```rust
//! use fuzzy_signal::{market, Signal};
//!
//! let engine = market::default_engine().unwrap();
//! let decision = engine
//!     .evaluate_and_label(&[
//!         ("price_change", 8.0),
//!         ("volume_change", 60.0),
//!         ("rsi", 72.0),
//!         ("ma_trend", 3.5),
//!     ])
//!     .unwrap();
//!
//! assert_eq!(decision.signal, Signal::Buy);
//! ```

pub mod config;
pub mod decision;
pub mod engine;
pub mod error;
pub mod fuzzy;
pub mod market;

// Re-export fuzzy set types
pub use fuzzy::{Clause, Degree, Fuzzified, FuzzifiedInputs, LinguisticVariable, MembershipFunction, Rule, Shape};

// Re-export engine types
pub use engine::{
    Axis, Decision, DecisionSurface, EvaluationResult, InferenceEngine, InputValues, RuleFiring, SignalTally,
};

// Re-export decision types
pub use decision::{DecisionMapper, Signal, Thresholds};

// Re-export market configuration
pub use market::{IndicatorDefaults, MarketIndicators, RuleBase};

// Re-export configuration types
pub use config::{EngineConfig, GeneralConfig, LogLevel, SignalConfig};

// Re-export error types
pub use error::{ConfigError, ErrorCode, ErrorReport, EvalError};

/// Validate a complete configuration and build an engine from it
pub fn build_engine(
    inputs: Vec<LinguisticVariable>,
    output: LinguisticVariable,
    rules: Vec<Rule>,
    thresholds: Thresholds,
) -> Result<InferenceEngine, ConfigError> {
    InferenceEngine::new(inputs, output, rules, DecisionMapper::new(thresholds)?)
}

/// Evaluate `inputs` and label the crisp output
pub fn evaluate_and_label<I: InputValues + ?Sized>(
    engine: &InferenceEngine,
    inputs: &I,
) -> Result<Decision, EvalError> {
    engine.evaluate_and_label(inputs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_engine_from_market_parts() {
        let engine = build_engine(
            market::variables().unwrap(),
            market::action(market::DEFAULT_RESOLUTION).unwrap(),
            RuleBase::Momentum.rules(),
            Thresholds::default(),
        )
        .unwrap();

        let decision = evaluate_and_label(
            &engine,
            &[
                ("price_change", -8.0),
                ("volume_change", 60.0),
                ("rsi", 25.0),
                ("ma_trend", -3.5),
            ],
        )
        .unwrap();
        assert_eq!(decision.signal, Signal::Sell);
    }

    #[test]
    fn test_build_engine_rejects_thresholds() {
        let result = build_engine(
            market::variables().unwrap(),
            market::action(market::DEFAULT_RESOLUTION).unwrap(),
            RuleBase::Momentum.rules(),
            Thresholds::new(0.3, -0.3),
        );
        assert!(matches!(result, Err(ConfigError::InvalidThresholds { .. })));
    }
}
