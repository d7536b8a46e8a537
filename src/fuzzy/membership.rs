//! Membership functions and fuzzy truth degrees

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A fuzzy truth value in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Degree(f64);

impl Degree {
    pub const ZERO: Degree = Degree(0.0);
    pub const ONE: Degree = Degree(1.0);

    pub fn new(value: f64) -> Self {
        Self(value.clamp(0.0, 1.0))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Fuzzy AND (Zadeh t-norm) - minimum
    pub fn and(&self, other: &Self) -> Self {
        Self(self.0.min(other.0))
    }

    /// Fuzzy OR (Zadeh t-conorm) - maximum
    pub fn or(&self, other: &Self) -> Self {
        Self(self.0.max(other.0))
    }

    pub fn is_zero(&self) -> bool {
        self.0 <= 0.0
    }
}

impl From<f64> for Degree {
    fn from(v: f64) -> Self {
        Self::new(v)
    }
}

impl fmt::Display for Degree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

/// Shape of a membership function with its ordered breakpoints
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    /// Triangular: (left, peak, right)
    Triangular([f64; 3]),
    /// Trapezoidal: (left, left_top, right_top, right)
    Trapezoidal([f64; 4]),
}

/// A piecewise-linear fuzzy set.
///
/// Breakpoints are validated on construction, so [`degree`](Self::degree)
/// never fails and never divides by zero: equal neighbouring breakpoints turn
/// the corresponding ramp into a step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MembershipFunction {
    shape: Shape,
}

impl MembershipFunction {
    pub fn new(shape: Shape) -> Result<Self, ConfigError> {
        let points = match &shape {
            Shape::Triangular(p) => &p[..],
            Shape::Trapezoidal(p) => &p[..],
        };
        let finite = points.iter().all(|p| p.is_finite());
        let ordered = points.windows(2).all(|w| w[0] <= w[1]);
        if !finite || !ordered {
            return Err(ConfigError::InvalidBreakpoints {
                points: points.to_vec(),
            });
        }
        Ok(Self { shape })
    }

    pub fn triangular(a: f64, b: f64, c: f64) -> Result<Self, ConfigError> {
        Self::new(Shape::Triangular([a, b, c]))
    }

    pub fn trapezoidal(a: f64, b: f64, c: f64, d: f64) -> Result<Self, ConfigError> {
        Self::new(Shape::Trapezoidal([a, b, c, d]))
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn breakpoints(&self) -> &[f64] {
        match &self.shape {
            Shape::Triangular(p) => p,
            Shape::Trapezoidal(p) => p,
        }
    }

    /// Evaluate membership for a crisp value
    pub fn degree(&self, x: f64) -> Degree {
        let value = match self.shape {
            Shape::Triangular([a, b, c]) => {
                if x < a || x > c {
                    0.0
                } else if x == b {
                    1.0
                } else if x < b {
                    // a <= x < b, so b > a
                    (x - a) / (b - a)
                } else {
                    // b < x <= c, so c > b
                    (c - x) / (c - b)
                }
            }
            Shape::Trapezoidal([a, b, c, d]) => {
                if x < a || x > d {
                    0.0
                } else if x >= b && x <= c {
                    1.0
                } else if x < b {
                    (x - a) / (b - a)
                } else {
                    (d - x) / (d - c)
                }
            }
        };

        Degree::new(value)
    }

    /// Get the core (where membership = 1)
    pub fn core(&self) -> (f64, f64) {
        match self.shape {
            Shape::Triangular([_, b, _]) => (b, b),
            Shape::Trapezoidal([_, b, c, _]) => (b, c),
        }
    }

    /// Get the support (where membership can be > 0)
    pub fn support(&self) -> (f64, f64) {
        match self.shape {
            Shape::Triangular([a, _, c]) => (a, c),
            Shape::Trapezoidal([a, _, _, d]) => (a, d),
        }
    }
}

impl fmt::Display for MembershipFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.shape {
            Shape::Triangular([a, b, c]) => write!(f, "trimf[{}, {}, {}]", a, b, c),
            Shape::Trapezoidal([a, b, c, d]) => write!(f, "trapmf[{}, {}, {}, {}]", a, b, c, d),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_degree_operations() {
        let a = Degree::new(0.6);
        let b = Degree::new(0.4);

        assert!((a.and(&b).value() - 0.4).abs() < 0.001);
        assert!((a.or(&b).value() - 0.6).abs() < 0.001);
        assert_eq!(Degree::new(1.7), Degree::ONE);
        assert_eq!(Degree::new(-0.2), Degree::ZERO);
    }

    #[test]
    fn test_triangular_membership() {
        let mf = MembershipFunction::triangular(0.0, 5.0, 10.0).unwrap();

        assert!((mf.degree(0.0).value() - 0.0).abs() < 0.001);
        assert!((mf.degree(5.0).value() - 1.0).abs() < 0.001);
        assert!((mf.degree(10.0).value() - 0.0).abs() < 0.001);
        assert!((mf.degree(2.5).value() - 0.5).abs() < 0.001);
        assert!((mf.degree(7.5).value() - 0.5).abs() < 0.001);
        assert_eq!(mf.degree(-3.0), Degree::ZERO);
        assert_eq!(mf.degree(11.0), Degree::ZERO);
    }

    #[test]
    fn test_triangular_left_step() {
        // sell = trimf[-1, -1, 0]
        let mf = MembershipFunction::triangular(-1.0, -1.0, 0.0).unwrap();

        assert_eq!(mf.degree(-1.0), Degree::ONE);
        assert_eq!(mf.degree(-1.5), Degree::ZERO);
        assert!((mf.degree(-0.5).value() - 0.5).abs() < 1e-12);
        assert_eq!(mf.degree(0.0), Degree::ZERO);
    }

    #[test]
    fn test_triangular_right_step() {
        let mf = MembershipFunction::triangular(0.0, 1.0, 1.0).unwrap();

        assert_eq!(mf.degree(1.0), Degree::ONE);
        assert_eq!(mf.degree(1.01), Degree::ZERO);
        assert!((mf.degree(0.25).value() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_triangular_spike() {
        let mf = MembershipFunction::triangular(2.0, 2.0, 2.0).unwrap();

        assert_eq!(mf.degree(2.0), Degree::ONE);
        assert_eq!(mf.degree(1.999), Degree::ZERO);
        assert_eq!(mf.degree(2.001), Degree::ZERO);
    }

    #[test]
    fn test_trapezoidal_membership() {
        let mf = MembershipFunction::trapezoidal(0.0, 5.0, 10.0, 10.0).unwrap();

        assert_eq!(mf.degree(0.0), Degree::ZERO);
        assert!((mf.degree(2.5).value() - 0.5).abs() < 0.001);
        assert_eq!(mf.degree(5.0), Degree::ONE);
        assert_eq!(mf.degree(7.0), Degree::ONE);
        assert_eq!(mf.degree(10.0), Degree::ONE);
        assert_eq!(mf.degree(10.5), Degree::ZERO);
    }

    #[test]
    fn test_trapezoidal_shoulders() {
        // oversold = trapmf[0, 0, 30, 40]
        let mf = MembershipFunction::trapezoidal(0.0, 0.0, 30.0, 40.0).unwrap();

        assert_eq!(mf.degree(0.0), Degree::ONE);
        assert_eq!(mf.degree(30.0), Degree::ONE);
        assert!((mf.degree(35.0).value() - 0.5).abs() < 1e-12);
        assert_eq!(mf.degree(40.0), Degree::ZERO);
    }

    #[test]
    fn test_trapezoidal_collapsed_plateau() {
        let mf = MembershipFunction::trapezoidal(0.0, 2.0, 2.0, 4.0).unwrap();

        assert_eq!(mf.degree(2.0), Degree::ONE);
        assert!((mf.degree(1.0).value() - 0.5).abs() < 1e-12);
        assert!((mf.degree(3.0).value() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_unordered_breakpoints() {
        let err = MembershipFunction::triangular(0.0, 5.0, 4.0).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBreakpoints { .. }));

        assert!(MembershipFunction::trapezoidal(0.0, 3.0, 2.0, 4.0).is_err());
        assert!(MembershipFunction::triangular(f64::NAN, 0.0, 1.0).is_err());
        assert!(MembershipFunction::trapezoidal(0.0, 1.0, 2.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_core_and_support() {
        let mf = MembershipFunction::trapezoidal(60.0, 70.0, 100.0, 100.0).unwrap();
        assert_eq!(mf.core(), (70.0, 100.0));
        assert_eq!(mf.support(), (60.0, 100.0));
        assert_eq!(mf.breakpoints(), &[60.0, 70.0, 100.0, 100.0]);
        assert_eq!(mf.to_string(), "trapmf[60, 70, 100, 100]");
    }

    fn any_shape() -> impl Strategy<Value = MembershipFunction> {
        (-100.0f64..100.0, 0.0f64..50.0, 0.0f64..50.0, 0.0f64..50.0, any::<bool>()).prop_map(
            |(a, g1, g2, g3, tri)| {
                if tri {
                    MembershipFunction::triangular(a, a + g1, a + g1 + g2).unwrap()
                } else {
                    MembershipFunction::trapezoidal(a, a + g1, a + g1 + g2, a + g1 + g2 + g3)
                        .unwrap()
                }
            },
        )
    }

    proptest! {
        #[test]
        fn test_degree_stays_in_unit_interval(mf in any_shape(), x in -1e6f64..1e6) {
            let d = mf.degree(x).value();
            prop_assert!((0.0..=1.0).contains(&d));
        }

        #[test]
        fn test_degree_is_lipschitz_between_breakpoints(
            a in -100.0f64..100.0,
            g1 in 0.5f64..50.0,
            g2 in 0.5f64..50.0,
            g3 in 0.5f64..50.0,
            x in -200.0f64..300.0,
        ) {
            let mf = MembershipFunction::trapezoidal(a, a + g1, a + g1 + g2, a + g1 + g2 + g3).unwrap();
            let h = 1e-3;
            let slope = 1.0 / g1.min(g3);
            let jump = (mf.degree(x + h).value() - mf.degree(x).value()).abs();
            prop_assert!(jump <= slope * h + 1e-9);
        }
    }
}
