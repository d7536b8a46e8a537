//! Output discretization, max aggregation and centroid defuzzification

use indexmap::IndexMap;

use crate::fuzzy::{Degree, LinguisticVariable, MAX_SAMPLES};

/// Sample points `min + i * step` covering the closed universe `[min, max]`.
///
/// `max` is appended when the step does not divide the width evenly. Empty
/// when the step is not positive and finite or would exceed [`MAX_SAMPLES`].
pub(crate) fn sample_points(universe: (f64, f64), step: f64) -> Vec<f64> {
    let (min, max) = universe;
    let width = max - min;
    if !(step.is_finite() && step > 0.0 && width.is_finite() && width >= 0.0)
        || width / step > MAX_SAMPLES as f64
    {
        return Vec::new();
    }
    let intervals = (width / step + 1e-9).floor() as usize;
    let mut points: Vec<f64> = (0..=intervals)
        .map(|i| (min + i as f64 * step).min(max))
        .collect();

    if let Some(&last) = points.last() {
        if max - last > step * 1e-6 {
            points.push(max);
        }
    }
    points
}

/// The output variable sampled once at construction time.
///
/// Each term's membership curve is precomputed, so an evaluation only clips
/// and aggregates.
#[derive(Debug, Clone)]
pub(crate) struct OutputUniverse {
    samples: Vec<f64>,
    curves: IndexMap<String, Vec<f64>>,
}

impl OutputUniverse {
    pub fn discretize(output: &LinguisticVariable) -> Self {
        Self::with_step(output, output.resolution())
    }

    pub fn with_step(output: &LinguisticVariable, step: f64) -> Self {
        let samples = sample_points(output.universe(), step);
        let curves = output
            .terms()
            .map(|(name, mf)| {
                let curve = samples.iter().map(|&y| mf.degree(y).value()).collect();
                (name.to_string(), curve)
            })
            .collect();

        Self { samples, curves }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Clip every term at its activation and combine with max.
    ///
    /// Terms without an activation entry contribute nothing.
    pub fn aggregate(&self, activations: &IndexMap<String, Degree>) -> Vec<f64> {
        let mut aggregated = vec![0.0f64; self.samples.len()];

        for (term, curve) in &self.curves {
            let level = match activations.get(term) {
                Some(degree) if !degree.is_zero() => degree.value(),
                _ => continue,
            };
            for (acc, &mu) in aggregated.iter_mut().zip(curve) {
                *acc = acc.max(mu.min(level));
            }
        }

        aggregated
    }

    /// Centroid of area, `None` when the curve is zero everywhere
    pub fn centroid(&self, aggregated: &[f64]) -> Option<f64> {
        let mut numerator = 0.0;
        let mut denominator = 0.0;
        for (&y, &mu) in self.samples.iter().zip(aggregated) {
            numerator += y * mu;
            denominator += mu;
        }

        if denominator > 0.0 {
            Some(numerator / denominator)
        } else {
            None
        }
    }
}
