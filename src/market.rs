//! Market indicator configuration
//!
//! The four indicator variables, the `action` output and the rule bases are
//! declared here once. Every caller builds its engine from this module
//! instead of re-declaring fuzzy sets.
//!
//! | variable        | universe     | terms                          |
//! |-----------------|--------------|--------------------------------|
//! | `price_change`  | -10 .. 10 %  | negative, stable, positive     |
//! | `volume_change` | -100 .. 100 %| low, medium, high              |
//! | `rsi`           | 0 .. 100     | oversold, neutral, overbought  |
//! | `ma_trend`      | -5 .. 5      | falling, flat, rising          |
//! | `action`        | -1 .. 1      | sell, hold, buy                |
//!
//! How the indicators are derived (percent change windows, which moving
//! averages `ma_trend` compares, how it is scaled) is up to the caller.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::decision::{DecisionMapper, Thresholds};
use crate::engine::InferenceEngine;
use crate::error::ConfigError;
use crate::fuzzy::{LinguisticVariable, MembershipFunction as Mf, Rule};

pub const PRICE_CHANGE: &str = "price_change";
pub const VOLUME_CHANGE: &str = "volume_change";
pub const RSI: &str = "rsi";
pub const MA_TREND: &str = "ma_trend";
pub const ACTION: &str = "action";

/// Default sampling step of the `action` universe
pub const DEFAULT_RESOLUTION: f64 = 0.001;

pub fn price_change() -> Result<LinguisticVariable, ConfigError> {
    LinguisticVariable::new(PRICE_CHANGE, (-10.0, 10.0))?
        .term("negative", Mf::trapezoidal(-10.0, -10.0, -5.0, 0.0))?
        .term("stable", Mf::triangular(-2.0, 0.0, 2.0))?
        .term("positive", Mf::trapezoidal(0.0, 5.0, 10.0, 10.0))
}

pub fn volume_change() -> Result<LinguisticVariable, ConfigError> {
    LinguisticVariable::new(VOLUME_CHANGE, (-100.0, 100.0))?
        .term("low", Mf::trapezoidal(-100.0, -100.0, -40.0, 0.0))?
        .term("medium", Mf::triangular(-20.0, 0.0, 20.0))?
        .term("high", Mf::trapezoidal(0.0, 40.0, 100.0, 100.0))
}

pub fn rsi() -> Result<LinguisticVariable, ConfigError> {
    LinguisticVariable::new(RSI, (0.0, 100.0))?
        .term("oversold", Mf::trapezoidal(0.0, 0.0, 30.0, 40.0))?
        .term("neutral", Mf::triangular(35.0, 50.0, 65.0))?
        .term("overbought", Mf::trapezoidal(60.0, 70.0, 100.0, 100.0))
}

pub fn ma_trend() -> Result<LinguisticVariable, ConfigError> {
    LinguisticVariable::new(MA_TREND, (-5.0, 5.0))?
        .term("falling", Mf::trapezoidal(-5.0, -5.0, -2.0, 0.0))?
        .term("flat", Mf::triangular(-1.0, 0.0, 1.0))?
        .term("rising", Mf::trapezoidal(0.0, 2.0, 5.0, 5.0))
}

/// All four input variables
pub fn variables() -> Result<Vec<LinguisticVariable>, ConfigError> {
    Ok(vec![price_change()?, volume_change()?, rsi()?, ma_trend()?])
}

/// The `action` output sampled every `resolution`
pub fn action(resolution: f64) -> Result<LinguisticVariable, ConfigError> {
    LinguisticVariable::with_resolution(ACTION, (-1.0, 1.0), resolution)?
        .term("sell", Mf::triangular(-1.0, -1.0, 0.0))?
        .term("hold", Mf::triangular(-0.5, 0.0, 0.5))?
        .term("buy", Mf::triangular(0.0, 1.0, 1.0))
}

// ============================================================================
// Rule bases
// ============================================================================

/// Named rule tables over the market variables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RuleBase {
    /// Trend-following: bearish indicators sell, bullish indicators buy
    #[default]
    Momentum,
    /// Mean-reverting table that buys weakness and sells strength
    Contrarian,
    /// RSI against moving-average trend only
    TrendSurface,
}

impl RuleBase {
    pub const ALL: [RuleBase; 3] = [RuleBase::Momentum, RuleBase::Contrarian, RuleBase::TrendSurface];

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleBase::Momentum => "momentum",
            RuleBase::Contrarian => "contrarian",
            RuleBase::TrendSurface => "trend-surface",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "momentum" | "trend-following" | "default" => Some(RuleBase::Momentum),
            "contrarian" | "classic" => Some(RuleBase::Contrarian),
            "trend-surface" | "trend_surface" | "surface" => Some(RuleBase::TrendSurface),
            _ => None,
        }
    }

    /// Like [`RuleBase::from_str`], failing with [`ConfigError::UnknownRuleBase`]
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        Self::from_str(s).ok_or_else(|| ConfigError::UnknownRuleBase(s.to_string()))
    }

    pub fn description(&self) -> &'static str {
        match self {
            RuleBase::Momentum => "Trend-following signals from all four indicators",
            RuleBase::Contrarian => "Mean-reverting signals: buy weakness, sell strength",
            RuleBase::TrendSurface => "RSI against moving-average trend only",
        }
    }

    pub fn rules(&self) -> Vec<Rule> {
        let table: RuleTable = match self {
            RuleBase::Momentum => MOMENTUM,
            RuleBase::Contrarian => CONTRARIAN,
            RuleBase::TrendSurface => TREND_SURFACE,
        };
        table
            .iter()
            .map(|(antecedents, action)| Rule::when(antecedents.iter().copied(), (ACTION, *action)))
            .collect()
    }

    /// Input variables referenced by this rule base, in declaration order
    pub fn variables(&self) -> Result<Vec<LinguisticVariable>, ConfigError> {
        let rules = self.rules();
        Ok(variables()?
            .into_iter()
            .filter(|var| {
                rules
                    .iter()
                    .any(|r| r.antecedents.iter().any(|c| c.variable == var.name()))
            })
            .collect())
    }
}

impl fmt::Display for RuleBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type RuleTable = &'static [(&'static [(&'static str, &'static str)], &'static str)];

// Not every input combination is covered: a stable price with RSI outside
// neutral and a non-flat trend that disagrees with it fires nothing, and the
// evaluation returns `DegenerateOutput`. Roughly one grid point in ten over
// the four universes lands in such a gap, against about one in fifty for the
// contrarian table.
const MOMENTUM: RuleTable = &[
    (&[(PRICE_CHANGE, "positive"), (MA_TREND, "rising")], "buy"),
    (&[(PRICE_CHANGE, "negative"), (MA_TREND, "falling")], "sell"),
    (&[(PRICE_CHANGE, "stable"), (RSI, "neutral")], "hold"),
    (&[(PRICE_CHANGE, "stable"), (MA_TREND, "flat")], "hold"),
    (&[(PRICE_CHANGE, "positive"), (VOLUME_CHANGE, "high")], "buy"),
    (&[(PRICE_CHANGE, "negative"), (VOLUME_CHANGE, "high")], "sell"),
    (&[(MA_TREND, "rising"), (RSI, "neutral")], "buy"),
    (&[(MA_TREND, "falling"), (RSI, "neutral")], "sell"),
    (&[(PRICE_CHANGE, "positive"), (VOLUME_CHANGE, "medium")], "buy"),
    (&[(PRICE_CHANGE, "negative"), (VOLUME_CHANGE, "medium")], "sell"),
    (&[(RSI, "overbought"), (MA_TREND, "rising")], "buy"),
    (&[(RSI, "oversold"), (MA_TREND, "falling")], "sell"),
    (&[(RSI, "neutral"), (MA_TREND, "flat"), (VOLUME_CHANGE, "medium")], "hold"),
];

const CONTRARIAN: RuleTable = &[
    (&[(PRICE_CHANGE, "positive"), (RSI, "overbought")], "sell"),
    (&[(PRICE_CHANGE, "negative"), (RSI, "oversold")], "buy"),
    (&[(PRICE_CHANGE, "stable"), (RSI, "neutral")], "hold"),
    (&[(PRICE_CHANGE, "positive"), (VOLUME_CHANGE, "high")], "sell"),
    (&[(PRICE_CHANGE, "negative"), (VOLUME_CHANGE, "high")], "buy"),
    (&[(MA_TREND, "rising"), (RSI, "neutral")], "buy"),
    (&[(MA_TREND, "falling"), (RSI, "neutral")], "sell"),
    (&[(MA_TREND, "rising"), (PRICE_CHANGE, "positive")], "buy"),
    (&[(MA_TREND, "falling"), (PRICE_CHANGE, "negative")], "sell"),
    (&[(VOLUME_CHANGE, "low"), (RSI, "overbought")], "sell"),
    (&[(VOLUME_CHANGE, "low"), (RSI, "oversold")], "buy"),
    (&[(PRICE_CHANGE, "stable"), (MA_TREND, "flat")], "hold"),
    (&[(PRICE_CHANGE, "positive"), (RSI, "neutral"), (VOLUME_CHANGE, "medium")], "hold"),
    (&[(PRICE_CHANGE, "negative"), (RSI, "neutral"), (VOLUME_CHANGE, "medium")], "hold"),
    (&[(MA_TREND, "rising"), (RSI, "oversold")], "buy"),
    (&[(MA_TREND, "falling"), (RSI, "overbought")], "sell"),
];

const TREND_SURFACE: RuleTable = &[
    (&[(RSI, "overbought"), (MA_TREND, "falling")], "sell"),
    (&[(RSI, "oversold"), (MA_TREND, "rising")], "buy"),
    (&[(RSI, "neutral"), (MA_TREND, "flat")], "hold"),
    (&[(RSI, "neutral"), (MA_TREND, "rising")], "buy"),
    (&[(RSI, "neutral"), (MA_TREND, "falling")], "sell"),
];

/// Build an engine for `rule_base` with the given output resolution and
/// thresholds
pub fn engine(
    rule_base: RuleBase,
    resolution: f64,
    thresholds: Thresholds,
) -> Result<InferenceEngine, ConfigError> {
    InferenceEngine::new(
        rule_base.variables()?,
        action(resolution)?,
        rule_base.rules(),
        DecisionMapper::new(thresholds)?,
    )
}

/// Momentum rule base, default resolution and thresholds
pub fn default_engine() -> Result<InferenceEngine, ConfigError> {
    engine(RuleBase::default(), DEFAULT_RESOLUTION, Thresholds::default())
}

// ============================================================================
// Indicator inputs
// ============================================================================

/// Stand-in values for indicators a caller cannot compute.
///
/// Nothing is substituted unless configured: an absent indicator with no
/// default surfaces as a missing input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorDefaults {
    pub price_change: Option<f64>,
    pub volume_change: Option<f64>,
    pub rsi: Option<f64>,
    pub ma_trend: Option<f64>,
}

/// The four market indicators, any of which may be unavailable
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketIndicators {
    pub price_change: Option<f64>,
    pub volume_change: Option<f64>,
    pub rsi: Option<f64>,
    pub ma_trend: Option<f64>,
}

impl MarketIndicators {
    pub fn new(price_change: f64, volume_change: f64, rsi: f64, ma_trend: f64) -> Self {
        Self {
            price_change: Some(price_change),
            volume_change: Some(volume_change),
            rsi: Some(rsi),
            ma_trend: Some(ma_trend),
        }
    }

    /// Input map for the engine, filling gaps from `defaults`
    pub fn to_inputs(&self, defaults: &IndicatorDefaults) -> HashMap<String, f64> {
        [
            (PRICE_CHANGE, self.price_change.or(defaults.price_change)),
            (VOLUME_CHANGE, self.volume_change.or(defaults.volume_change)),
            (RSI, self.rsi.or(defaults.rsi)),
            (MA_TREND, self.ma_trend.or(defaults.ma_trend)),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name.to_string(), v)))
        .collect()
    }
}
