//! Numerically exact, real rotation angles backed by rational numbers.
//!
//! All angles and arithmetic operations thereof are automatically performed
//! modulo 2*π*, so two rotation gates compare equal exactly when they describe
//! the same rotation.

use std::f64::consts::TAU;
use num_complex::Complex64 as C64;
use num_rational::Rational64 as R64;

// return the reduction of `a` modulo 1, constrained to non-negative values
pub(crate) fn rempos1(a: R64) -> R64 {
    let d = *a.denom();
    R64::new((*a.numer()).rem_euclid(d), d)
}

/// An angle *θ* = 2*π* × *φ*, stored as the rational number *φ* in `[0, 1)`.
///
/// ```
/// # use qconst::phase::Phase;
/// assert_eq!(  Phase::new(3, 4),      -Phase::new(1, 4) );
/// assert_eq!(  Phase::new(3, 4) / 2,   Phase::new(3, 8) );
/// assert_eq!(  Phase::pi() + Phase::pi(), Phase::zero() );
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Phase(R64);

impl From<f64> for Phase {
    /// *Panics if the original floating-point number is non-normal.*
    fn from(f: f64) -> Self {
        let ph =
            R64::approximate_float(f / TAU)
            .expect("error converting to phase: unrepresentable float");
        Self(rempos1(ph))
    }
}

impl From<Phase> for f64 {
    fn from(ph: Phase) -> Self {
        TAU * (*ph.0.numer() as f64 / *ph.0.denom() as f64)
    }
}

impl Phase {
    /// Construct a new `Phase` as `(numer / denom) × 2π`.
    ///
    /// *Panics if `denom` is zero.*
    pub fn new(numer: i64, denom: i64) -> Self {
        Self(rempos1(R64::new(numer, denom)))
    }

    /// Convert from a floating-point number of radians.
    pub fn from_float(f: f64) -> Self { f.into() }

    /// Convert to a floating-point number of radians in `[0, 2π)`.
    pub fn into_float(self) -> f64 { self.into() }

    /// Return the `Phase` representation of 0 ≡ 2π mod 2π.
    pub fn zero() -> Self { Self(R64::from_integer(0)) }

    /// Return the `Phase` representation of π.
    pub fn pi() -> Self { Self(R64::new(1, 2)) }

    /// Return the `Phase` representation of π/2.
    pub fn pi2() -> Self { Self(R64::new(1, 4)) }

    /// Return the `Phase` representation of π/4.
    pub fn pi4() -> Self { Self(R64::new(1, 8)) }

    /// Return `true` if `self` is zero modulo 2π.
    pub fn is_zero(self) -> bool { self == Self::zero() }

    /// Convert to a complex number with modulus 1 and argument equal to `self`.
    pub fn cis(self) -> C64 { C64::cis(self.into()) }

    // θ/2 in radians, for rotation matrices
    pub(crate) fn half_float(self) -> f64 { f64::from(self) / 2.0 }

    pub(crate) fn label(&self) -> String {
        if self.is_zero() {
            return "0".to_string();
        } else if *self == Self::pi() {
            return "π".to_string();
        }
        let modpi = self.0 * 2;
        if *modpi.numer() == 1 {
            format!("π/{}", modpi.denom())
        } else {
            format!("({})π", modpi)
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::ops::Neg for Phase {
    type Output = Phase;

    fn neg(self) -> Self::Output { Self(rempos1(-self.0)) }
}

impl std::ops::Add<Phase> for Phase {
    type Output = Phase;

    fn add(self, rhs: Phase) -> Self::Output { Self(rempos1(self.0 + rhs.0)) }
}

impl std::ops::Sub<Phase> for Phase {
    type Output = Phase;

    fn sub(self, rhs: Phase) -> Self::Output { Self(rempos1(self.0 - rhs.0)) }
}

impl std::ops::Mul<i64> for Phase {
    type Output = Phase;

    fn mul(self, rhs: i64) -> Self::Output { Self(rempos1(self.0 * rhs)) }
}

impl std::ops::Div<i64> for Phase {
    type Output = Phase;

    fn div(self, rhs: i64) -> Self::Output { Self(rempos1(self.0 / rhs)) }
}
