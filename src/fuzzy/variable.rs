//! Linguistic variables

use indexmap::IndexMap;

use super::membership::{Degree, MembershipFunction};
use crate::error::ConfigError;

/// Upper bound on the number of points an output universe is sampled at
pub const MAX_SAMPLES: usize = 1_000_000;

/// Membership degree of every term of one variable, in declaration order
pub type Fuzzified = IndexMap<String, Degree>;

/// A named numeric axis described by overlapping fuzzy sets
#[derive(Debug, Clone)]
pub struct LinguisticVariable {
    name: String,
    /// Universe of discourse [min, max]
    universe: (f64, f64),
    /// Sampling step, only used when the variable is an output
    resolution: f64,
    terms: IndexMap<String, MembershipFunction>,
}

impl LinguisticVariable {
    /// Create a variable over `[min, max]`. The resolution defaults to one
    /// thousandth of the universe width.
    pub fn new(name: impl Into<String>, universe: (f64, f64)) -> Result<Self, ConfigError> {
        let resolution = (universe.1 - universe.0) / 1000.0;
        Self::with_resolution(name, universe, resolution)
    }

    pub fn with_resolution(
        name: impl Into<String>,
        universe: (f64, f64),
        resolution: f64,
    ) -> Result<Self, ConfigError> {
        let name = name.into();
        let (min, max) = universe;
        let valid = min.is_finite()
            && max.is_finite()
            && min < max
            && resolution.is_finite()
            && resolution > 0.0
            && resolution <= max - min
            && (max - min) / resolution <= MAX_SAMPLES as f64;
        if !valid {
            return Err(ConfigError::InvalidUniverse {
                variable: name,
                min,
                max,
                resolution,
            });
        }

        Ok(Self {
            name,
            universe,
            resolution,
            terms: IndexMap::new(),
        })
    }

    /// Add a term (fuzzy set) to this variable
    pub fn add_term(
        &mut self,
        name: impl Into<String>,
        membership: MembershipFunction,
    ) -> Result<(), ConfigError> {
        let term = name.into();
        if self.terms.contains_key(&term) {
            return Err(ConfigError::DuplicateTerm {
                variable: self.name.clone(),
                term,
            });
        }

        let (min, max) = self.universe;
        if let Some(&point) = membership
            .breakpoints()
            .iter()
            .find(|p| **p < min || **p > max)
        {
            return Err(ConfigError::BreakpointOutOfRange {
                variable: self.name.clone(),
                term,
                point,
                min,
                max,
            });
        }

        self.terms.insert(term, membership);
        Ok(())
    }

    /// Builder form of [`add_term`](Self::add_term)
    pub fn term(
        mut self,
        name: impl Into<String>,
        membership: Result<MembershipFunction, ConfigError>,
    ) -> Result<Self, ConfigError> {
        self.add_term(name, membership?)?;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn universe(&self) -> (f64, f64) {
        self.universe
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Midpoint of the universe
    pub fn midpoint(&self) -> f64 {
        (self.universe.0 + self.universe.1) / 2.0
    }

    pub fn terms(&self) -> impl Iterator<Item = (&str, &MembershipFunction)> {
        self.terms.iter().map(|(name, mf)| (name.as_str(), mf))
    }

    pub fn get_term(&self, name: &str) -> Option<&MembershipFunction> {
        self.terms.get(name)
    }

    pub fn has_term(&self, name: &str) -> bool {
        self.terms.contains_key(name)
    }

    /// Clamp a value into the universe
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.universe.0, self.universe.1)
    }

    /// Fuzzify a crisp value - get membership for all terms.
    ///
    /// Values outside the universe are clamped, not rejected.
    pub fn fuzzify(&self, value: f64) -> Fuzzified {
        let x = self.clamp(value);
        self.terms
            .iter()
            .map(|(name, mf)| (name.clone(), mf.degree(x)))
            .collect()
    }

    /// Get the term with highest membership for a value. Ties go to the
    /// term declared first.
    pub fn dominant_term(&self, value: f64) -> Option<(&str, Degree)> {
        let x = self.clamp(value);
        self.terms
            .iter()
            .map(|(name, mf)| (name.as_str(), mf.degree(x)))
            .fold(None, |best, (name, degree)| match best {
                Some((_, d)) if d >= degree => best,
                _ => Some((name, degree)),
            })
    }
}
