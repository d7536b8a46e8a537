//! Fuzzy Set Primitives
//!
//! The building blocks the inference engine is assembled from:
//! - [`Degree`] - a truth value clamped to [0, 1]
//! - [`MembershipFunction`] - triangular and trapezoidal fuzzy sets
//! - [`LinguisticVariable`] - a named universe holding named terms
//! - [`Rule`] - a min-conjunction of terms implying one output term

mod membership;
mod rule;
mod variable;

pub use membership::{Degree, MembershipFunction, Shape};
pub use rule::{Clause, FuzzifiedInputs, Rule};
pub use variable::{Fuzzified, LinguisticVariable, MAX_SAMPLES};
