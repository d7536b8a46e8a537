//! Decision surfaces over two input axes

use std::collections::HashMap;

use rayon::prelude::*;
use serde::Serialize;

use super::InferenceEngine;
use super::defuzz::sample_points;

/// One axis of a surface: a variable swept over `[start, end]`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub variable: String,
    pub start: f64,
    pub end: f64,
    pub step: f64,
}

impl Axis {
    pub fn new(variable: impl Into<String>, start: f64, end: f64, step: f64) -> Self {
        Self {
            variable: variable.into(),
            start,
            end,
            step,
        }
    }

    /// Swept values, empty when the range or step is unusable
    pub fn values(&self) -> Vec<f64> {
        let usable = self.start.is_finite()
            && self.end.is_finite()
            && self.step.is_finite()
            && self.step > 0.0
            && self.start <= self.end;
        if !usable {
            return Vec::new();
        }
        if self.start == self.end {
            return vec![self.start];
        }
        sample_points((self.start, self.end), self.step)
    }
}

/// Crisp output sampled over a grid of two inputs.
///
/// `z[i][j]` is the output at `y[i]`, `x[j]`; cells whose evaluation failed
/// are `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionSurface {
    pub x_variable: String,
    pub y_variable: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<Vec<Option<f64>>>,
}

impl DecisionSurface {
    /// Sweep `x_axis` and `y_axis`, holding every other input at its value in
    /// `base`.
    pub fn sample(
        engine: &InferenceEngine,
        base: &HashMap<String, f64>,
        x_axis: &Axis,
        y_axis: &Axis,
    ) -> Self {
        let x = x_axis.values();
        let y = y_axis.values();

        let z: Vec<Vec<Option<f64>>> = y
            .par_iter()
            .map(|&yv| {
                let mut inputs = base.clone();
                inputs.insert(y_axis.variable.clone(), yv);
                x.iter()
                    .map(|&xv| {
                        inputs.insert(x_axis.variable.clone(), xv);
                        engine.evaluate(&inputs).ok().map(|r| r.crisp)
                    })
                    .collect::<Vec<_>>()
            })
            .collect();

        Self {
            x_variable: x_axis.variable.clone(),
            y_variable: y_axis.variable.clone(),
            x,
            y,
            z,
        }
    }

    /// Output at grid cell (`row`, `col`)
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.z.get(row).and_then(|r| r.get(col)).copied().flatten()
    }

    /// Number of cells that could not be evaluated
    pub fn failed_cells(&self) -> usize {
        self.z.iter().flatten().filter(|cell| cell.is_none()).count()
    }

    /// Smallest and largest evaluated output
    pub fn range(&self) -> Option<(f64, f64)> {
        self.z
            .iter()
            .flatten()
            .flatten()
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::DecisionMapper;
    use crate::fuzzy::{LinguisticVariable, MembershipFunction, Rule};

    fn engine() -> InferenceEngine {
        let a = LinguisticVariable::new("a", (0.0, 10.0))
            .unwrap()
            .term("low", MembershipFunction::trapezoidal(0.0, 0.0, 3.0, 6.0))
            .unwrap()
            .term("high", MembershipFunction::trapezoidal(4.0, 7.0, 10.0, 10.0))
            .unwrap();
        let b = LinguisticVariable::new("b", (0.0, 10.0))
            .unwrap()
            .term("on", MembershipFunction::trapezoidal(2.0, 5.0, 10.0, 10.0))
            .unwrap();
        let out = LinguisticVariable::with_resolution("out", (-1.0, 1.0), 0.001)
            .unwrap()
            .term("down", MembershipFunction::triangular(-1.0, -1.0, 0.0))
            .unwrap()
            .term("up", MembershipFunction::triangular(0.0, 1.0, 1.0))
            .unwrap();
        InferenceEngine::new(
            vec![a, b],
            out,
            vec![
                Rule::when([("a", "low"), ("b", "on")], ("out", "down")),
                Rule::when([("a", "high"), ("b", "on")], ("out", "up")),
            ],
            DecisionMapper::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_axis_values() {
        assert_eq!(Axis::new("rsi", 0.0, 100.0, 5.0).values().len(), 21);
        assert_eq!(Axis::new("rsi", 50.0, 50.0, 5.0).values(), vec![50.0]);
        assert!(Axis::new("rsi", 10.0, 0.0, 5.0).values().is_empty());
        assert!(Axis::new("rsi", 0.0, 10.0, 0.0).values().is_empty());
    }

    #[test]
    fn test_surface_shape_and_failures() {
        let surface = DecisionSurface::sample(
            &engine(),
            &HashMap::new(),
            &Axis::new("a", 0.0, 10.0, 1.0),
            &Axis::new("b", 0.0, 10.0, 2.0),
        );

        assert_eq!(surface.x.len(), 11);
        assert_eq!(surface.y.len(), 6);
        assert_eq!(surface.z.len(), 6);
        assert!(surface.z.iter().all(|row| row.len() == 11));

        // b = 0 and b = 2 leave "on" at zero
        assert!(surface.z[0].iter().all(Option::is_none));
        assert!(surface.z[1].iter().all(Option::is_none));
        assert_eq!(surface.failed_cells(), 22);

        let low_a = surface.get(5, 0).unwrap();
        let high_a = surface.get(5, 10).unwrap();
        assert!(low_a < 0.0);
        assert!(high_a > 0.0);

        let (lo, hi) = surface.range().unwrap();
        assert!(lo <= low_a && hi >= high_a);
    }

    #[test]
    fn test_surface_uses_base_inputs() {
        let mut base = HashMap::new();
        base.insert("b".to_string(), 10.0);
        let surface = DecisionSurface::sample(
            &engine(),
            &base,
            &Axis::new("a", 0.0, 10.0, 5.0),
            &Axis::new("a", 0.0, 0.0, 1.0),
        );
        // x overrides y when both sweep the same variable
        assert_eq!(surface.z.len(), 1);
        assert_eq!(surface.failed_cells(), 0);
    }
}
