//! Fuzzy rules

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::membership::Degree;
use super::variable::Fuzzified;
use crate::error::EvalError;

/// Fuzzified values of every input variable, keyed by variable name
pub type FuzzifiedInputs = IndexMap<String, Fuzzified>;

/// A `variable IS term` clause
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Clause {
    pub variable: String,
    pub term: String,
}

impl Clause {
    pub fn new(variable: impl Into<String>, term: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            term: term.into(),
        }
    }
}

impl<V: Into<String>, T: Into<String>> From<(V, T)> for Clause {
    fn from((variable, term): (V, T)) -> Self {
        Self::new(variable, term)
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} IS {}", self.variable, self.term)
    }
}

/// A Mamdani rule: antecedent clauses ANDed together imply one output term
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Antecedents (ANDed together)
    pub antecedents: Vec<Clause>,
    /// Consequent
    pub consequent: Clause,
}

impl Rule {
    pub fn new(antecedents: Vec<Clause>, consequent: Clause) -> Self {
        Self {
            antecedents,
            consequent,
        }
    }

    /// Shorthand for building rules from `(variable, term)` pairs
    ///
    /// ```
    /// use fuzzy_signal::Rule;
    ///
    /// let rule = Rule::when(
    ///     [("price_change", "positive"), ("ma_trend", "rising")],
    ///     ("action", "buy"),
    /// );
    /// assert_eq!(
    ///     rule.to_string(),
    ///     "IF price_change IS positive AND ma_trend IS rising THEN action IS buy"
    /// );
    /// ```
    pub fn when<I, C>(antecedents: I, consequent: impl Into<Clause>) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Clause>,
    {
        Self::new(
            antecedents.into_iter().map(Into::into).collect(),
            consequent.into(),
        )
    }

    /// Firing strength: minimum membership across all antecedents.
    ///
    /// A rule without antecedents never fires.
    pub fn fire(&self, fuzzified: &FuzzifiedInputs) -> Result<Degree, EvalError> {
        let mut strength: Option<Degree> = None;

        for clause in &self.antecedents {
            let degree = fuzzified
                .get(&clause.variable)
                .and_then(|terms| terms.get(&clause.term))
                .ok_or_else(|| EvalError::InternalConsistency {
                    rule: self.to_string(),
                    variable: clause.variable.clone(),
                    term: clause.term.clone(),
                })?;

            strength = Some(match strength {
                Some(s) => s.and(degree),
                None => *degree,
            });
        }

        Ok(strength.unwrap_or(Degree::ZERO))
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IF ")?;
        for (i, clause) in self.antecedents.iter().enumerate() {
            if i > 0 {
                write!(f, " AND ")?;
            }
            write!(f, "{}", clause)?;
        }
        write!(f, " THEN {}", self.consequent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs() -> FuzzifiedInputs {
        let mut fuzzified = FuzzifiedInputs::new();
        fuzzified.insert(
            "price_change".to_string(),
            [("negative", 0.0), ("stable", 0.25), ("positive", 0.6)]
                .into_iter()
                .map(|(t, d)| (t.to_string(), Degree::new(d)))
                .collect(),
        );
        fuzzified.insert(
            "rsi".to_string(),
            [("oversold", 0.0), ("neutral", 0.8), ("overbought", 0.4)]
                .into_iter()
                .map(|(t, d)| (t.to_string(), Degree::new(d)))
                .collect(),
        );
        fuzzified
    }

    #[test]
    fn test_firing_strength_is_minimum() {
        let rule = Rule::when([("price_change", "positive"), ("rsi", "overbought")], ("action", "sell"));
        assert_eq!(rule.fire(&inputs()).unwrap(), Degree::new(0.4));

        let rule = Rule::when([("price_change", "positive"), ("rsi", "neutral")], ("action", "hold"));
        assert_eq!(rule.fire(&inputs()).unwrap(), Degree::new(0.6));
    }

    #[test]
    fn test_single_antecedent() {
        let rule = Rule::when([("price_change", "stable")], ("action", "hold"));
        assert_eq!(rule.fire(&inputs()).unwrap(), Degree::new(0.25));
    }

    #[test]
    fn test_empty_antecedent_never_fires() {
        let rule = Rule::new(Vec::new(), Clause::new("action", "hold"));
        assert_eq!(rule.fire(&inputs()).unwrap(), Degree::ZERO);
    }

    #[test]
    fn test_missing_reference_is_internal_error() {
        let rule = Rule::when([("ma_trend", "rising")], ("action", "buy"));
        let err = rule.fire(&inputs()).unwrap_err();
        assert!(matches!(
            err,
            EvalError::InternalConsistency { ref variable, ref term, .. }
                if variable == "ma_trend" && term == "rising"
        ));

        let rule = Rule::when([("rsi", "euphoric")], ("action", "sell"));
        assert!(rule.fire(&inputs()).is_err());
    }

    #[test]
    fn test_rule_display() {
        let rule = Rule::when(
            [("price_change", "positive"), ("rsi", "neutral"), ("volume_change", "medium")],
            ("action", "hold"),
        );
        assert_eq!(
            rule.to_string(),
            "IF price_change IS positive AND rsi IS neutral AND volume_change IS medium THEN action IS hold"
        );
    }
}
