//! Mamdani Inference Engine
//!
//! Evaluation pipeline (max-min composition, centroid defuzzification):
//!
//! ```text
//! crisp inputs ──► fuzzify ──► fire rules (min) ──► activation per output term (max)
//!                                                          │
//!        Signal ◄── DecisionMapper ◄── centroid ◄── clip + aggregate (max)
//! ```
//!
//! The engine holds only immutable configuration. Every call to
//! [`InferenceEngine::evaluate`] builds its own fuzzified map and aggregated
//! curve, so one engine can be shared across threads without locking.

mod batch;
mod defuzz;
mod surface;

use std::collections::{BTreeMap, HashMap};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::decision::{DecisionMapper, Signal};
use crate::error::{ConfigError, EvalError};
use crate::fuzzy::{Degree, FuzzifiedInputs, LinguisticVariable, Rule};

pub use batch::SignalTally;
pub use surface::{Axis, DecisionSurface};

use defuzz::OutputUniverse;

// ============================================================================
// Input values
// ============================================================================

/// Source of crisp input values, looked up by variable name
pub trait InputValues {
    fn value(&self, variable: &str) -> Option<f64>;
}

impl InputValues for HashMap<String, f64> {
    fn value(&self, variable: &str) -> Option<f64> {
        self.get(variable).copied()
    }
}

impl InputValues for HashMap<&str, f64> {
    fn value(&self, variable: &str) -> Option<f64> {
        self.get(variable).copied()
    }
}

impl InputValues for BTreeMap<String, f64> {
    fn value(&self, variable: &str) -> Option<f64> {
        self.get(variable).copied()
    }
}

impl InputValues for IndexMap<String, f64> {
    fn value(&self, variable: &str) -> Option<f64> {
        self.get(variable).copied()
    }
}

impl InputValues for [(&str, f64)] {
    fn value(&self, variable: &str) -> Option<f64> {
        self.iter().find(|(name, _)| *name == variable).map(|(_, v)| *v)
    }
}

impl<const N: usize> InputValues for [(&str, f64); N] {
    fn value(&self, variable: &str) -> Option<f64> {
        self[..].value(variable)
    }
}

// ============================================================================
// Results
// ============================================================================

/// Firing strength of one rule, by position in the rule list
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RuleFiring {
    pub index: usize,
    pub strength: f64,
}

/// Result of a single evaluation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResult {
    /// Defuzzified output
    pub crisp: f64,
    /// Firing strength of every rule, in rule order
    pub rule_firings: Vec<RuleFiring>,
    /// Clip level of every output term, in declaration order
    pub activations: IndexMap<String, f64>,
}

/// A labelled evaluation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub signal: Signal,
    pub crisp_value: f64,
    pub rule_firings: Vec<RuleFiring>,
}

// ============================================================================
// Engine
// ============================================================================

/// Immutable Mamdani fuzzy inference system with a single output
#[derive(Debug, Clone)]
pub struct InferenceEngine {
    inputs: IndexMap<String, LinguisticVariable>,
    output: LinguisticVariable,
    rules: Vec<Rule>,
    mapper: DecisionMapper,
    universe: OutputUniverse,
}

impl InferenceEngine {
    /// Validate the configuration and sample the output universe.
    ///
    /// Every rule must reference declared input variables and terms, and its
    /// consequent must name a term of the output variable.
    pub fn new(
        inputs: Vec<LinguisticVariable>,
        output: LinguisticVariable,
        rules: Vec<Rule>,
        mapper: DecisionMapper,
    ) -> Result<Self, ConfigError> {
        let mut table = IndexMap::with_capacity(inputs.len());
        for var in inputs {
            if table.contains_key(var.name()) || var.name() == output.name() {
                return Err(ConfigError::DuplicateVariable(var.name().to_string()));
            }
            table.insert(var.name().to_string(), var);
        }

        for (index, rule) in rules.iter().enumerate() {
            Self::validate_rule(index, rule, &table, &output)?;
        }

        let universe = OutputUniverse::discretize(&output);
        debug!(
            inputs = table.len(),
            rules = rules.len(),
            output = output.name(),
            samples = universe.len(),
            "built inference engine"
        );

        Ok(Self {
            inputs: table,
            output,
            rules,
            mapper,
            universe,
        })
    }

    fn validate_rule(
        index: usize,
        rule: &Rule,
        inputs: &IndexMap<String, LinguisticVariable>,
        output: &LinguisticVariable,
    ) -> Result<(), ConfigError> {
        if rule.antecedents.is_empty() {
            return Err(ConfigError::EmptyAntecedent { rule: index });
        }

        for clause in &rule.antecedents {
            let var = inputs
                .get(&clause.variable)
                .ok_or_else(|| ConfigError::UnknownVariable {
                    rule: index,
                    variable: clause.variable.clone(),
                })?;
            if !var.has_term(&clause.term) {
                return Err(ConfigError::UnknownTerm {
                    rule: index,
                    variable: clause.variable.clone(),
                    term: clause.term.clone(),
                });
            }
        }

        let consequent = &rule.consequent;
        if consequent.variable != output.name() {
            return Err(ConfigError::UnknownVariable {
                rule: index,
                variable: consequent.variable.clone(),
            });
        }
        if !output.has_term(&consequent.term) {
            return Err(ConfigError::UnknownTerm {
                rule: index,
                variable: consequent.variable.clone(),
                term: consequent.term.clone(),
            });
        }

        Ok(())
    }

    pub fn inputs(&self) -> impl Iterator<Item = &LinguisticVariable> {
        self.inputs.values()
    }

    pub fn input(&self, name: &str) -> Option<&LinguisticVariable> {
        self.inputs.get(name)
    }

    pub fn output(&self) -> &LinguisticVariable {
        &self.output
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn mapper(&self) -> &DecisionMapper {
        &self.mapper
    }

    /// Number of points the output universe is sampled at
    pub fn sample_count(&self) -> usize {
        self.universe.len()
    }

    /// Fuzzify every declared input
    pub fn fuzzify<I: InputValues + ?Sized>(
        &self,
        inputs: &I,
    ) -> Result<FuzzifiedInputs, EvalError> {
        let mut fuzzified = FuzzifiedInputs::with_capacity(self.inputs.len());
        for (name, var) in &self.inputs {
            let value = inputs.value(name).ok_or_else(|| EvalError::MissingInput {
                variable: name.clone(),
            })?;
            if !value.is_finite() {
                return Err(EvalError::InvalidInput {
                    variable: name.clone(),
                    value,
                });
            }
            fuzzified.insert(name.clone(), var.fuzzify(value));
        }
        Ok(fuzzified)
    }

    /// Evaluate the fuzzy inference system
    pub fn evaluate<I: InputValues + ?Sized>(
        &self,
        inputs: &I,
    ) -> Result<EvaluationResult, EvalError> {
        self.evaluate_on(&self.universe, inputs)
    }

    fn evaluate_on<I: InputValues + ?Sized>(
        &self,
        universe: &OutputUniverse,
        inputs: &I,
    ) -> Result<EvaluationResult, EvalError> {
        let fuzzified = self.fuzzify(inputs)?;

        let mut activations: IndexMap<String, Degree> = self
            .output
            .terms()
            .map(|(name, _)| (name.to_string(), Degree::ZERO))
            .collect();
        let mut rule_firings = Vec::with_capacity(self.rules.len());

        for (index, rule) in self.rules.iter().enumerate() {
            let strength = rule.fire(&fuzzified)?;
            if let Some(level) = activations.get_mut(&rule.consequent.term) {
                *level = level.or(&strength);
            }
            rule_firings.push(RuleFiring {
                index,
                strength: strength.value(),
            });
        }

        let aggregated = universe.aggregate(&activations);
        let Some(crisp) = universe.centroid(&aggregated) else {
            trace!(rules = self.rules.len(), "no rule fired");
            return Err(EvalError::DegenerateOutput {
                fallback: self.output.midpoint(),
                rule_firings,
            });
        };

        trace!(crisp, "evaluated");
        Ok(EvaluationResult {
            crisp,
            rule_firings,
            activations: activations
                .into_iter()
                .map(|(term, degree)| (term, degree.value()))
                .collect(),
        })
    }

    /// Evaluate against the output universe re-sampled at `step` instead of
    /// the configured resolution. Used to measure discretization error.
    pub(crate) fn evaluate_with_step<I: InputValues + ?Sized>(
        &self,
        inputs: &I,
        step: f64,
    ) -> Result<EvaluationResult, EvalError> {
        let universe = OutputUniverse::with_step(&self.output, step);
        self.evaluate_on(&universe, inputs)
    }

    pub fn label(&self, crisp: f64) -> Signal {
        self.mapper.label(crisp)
    }

    /// Evaluate and map the crisp output to a [`Signal`]
    pub fn evaluate_and_label<I: InputValues + ?Sized>(
        &self,
        inputs: &I,
    ) -> Result<Decision, EvalError> {
        let result = self.evaluate(inputs)?;
        Ok(Decision {
            signal: self.mapper.label(result.crisp),
            crisp_value: result.crisp,
            rule_firings: result.rule_firings,
        })
    }
}
