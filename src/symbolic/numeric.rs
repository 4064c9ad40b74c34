//! # Numeric Tower Module
//!
//! Number type backing the symbolic engine: exact arbitrary-precision rationals,
//! double-precision reals and complex values, promoted in that order by every
//! arithmetic operation.
//!
//! ## Purpose
//!
//! Symbolic expressions carry their literals as `Number` so that integer
//! arithmetic inside differentiation and simplification stays exact (`3 - 1`
//! is the rational `2`, not `2.0000000000000004`), while transcendental
//! results fall through to floating point.
//!
//! ## NaN convention
//!
//! A NaN real is the engine's "undefined" sentinel: dividing a rational by
//! zero, differentiating a factorial, or evaluating an unknown variable all
//! yield NaN *data* rather than an error. Equality deliberately treats NaN
//! as equal to itself so that tree rewriting (which must recognize a NaN
//! subtree it produced earlier) works; this diverges from IEEE comparison
//! semantics on purpose and is pinned down by tests. Equality is also
//! value-based across variants, so a solution set endpoint computed exactly
//! compares equal to the same endpoint computed in floating point.

use num::BigRational;
use num::bigint::BigInt;
use num_complex::Complex64;
use num_traits::{One, Signed, ToPrimitive, Zero};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Numeric literal of the expression tree.
///
/// Variants form a promotion ladder: Rational + Rational stays exact,
/// anything touching a Real becomes Real, anything touching a Complex
/// becomes Complex.
#[derive(Clone, Debug)]
pub enum Number {
    /// Exact arbitrary-precision rational (integers included)
    Rational(BigRational),
    /// Double-precision real; NaN is the "undefined" sentinel
    Real(f64),
    /// Double-precision complex value
    Complex(Complex64),
}

impl Number {
    /// Integer constructor (exact)
    pub fn int(value: i64) -> Number {
        Number::Rational(BigRational::from_integer(BigInt::from(value)))
    }

    /// Real constructor
    pub fn real(value: f64) -> Number {
        Number::Real(value)
    }

    /// Complex constructor
    pub fn complex(re: f64, im: f64) -> Number {
        Number::Complex(Complex64::new(re, im))
    }

    /// The "undefined" sentinel
    pub fn nan() -> Number {
        Number::Real(f64::NAN)
    }

    pub fn is_nan(&self) -> bool {
        match self {
            Number::Rational(_) => false,
            Number::Real(v) => v.is_nan(),
            Number::Complex(c) => c.re.is_nan() || c.im.is_nan(),
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Number::Rational(r) => r.is_zero(),
            Number::Real(v) => *v == 0.0,
            Number::Complex(c) => c.re == 0.0 && c.im == 0.0,
        }
    }

    pub fn is_one(&self) -> bool {
        match self {
            Number::Rational(r) => r.is_one(),
            Number::Real(v) => *v == 1.0,
            Number::Complex(c) => c.re == 1.0 && c.im == 0.0,
        }
    }

    /// True for a complex value with a nonzero imaginary part
    pub fn is_properly_complex(&self) -> bool {
        matches!(self, Number::Complex(c) if c.im != 0.0)
    }

    /// Exact integer extraction: rationals with denominator 1 that fit in i64
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Number::Rational(r) if r.is_integer() => r.numer().to_i64(),
            _ => None,
        }
    }

    /// Lossy conversion to f64; complex values with a nonzero imaginary part
    /// and unrepresentable rationals come out as NaN
    pub fn to_f64(&self) -> f64 {
        match self {
            Number::Rational(r) => r.to_f64().unwrap_or(f64::NAN),
            Number::Real(v) => *v,
            Number::Complex(c) => {
                if c.im == 0.0 {
                    c.re
                } else {
                    f64::NAN
                }
            }
        }
    }

    /// Conversion to the complex plane (rationals and reals land on the real axis)
    pub fn to_complex(&self) -> Complex64 {
        match self {
            Number::Rational(r) => Complex64::new(r.to_f64().unwrap_or(f64::NAN), 0.0),
            Number::Real(v) => Complex64::new(*v, 0.0),
            Number::Complex(c) => *c,
        }
    }

    /// Numeric approximate equality within `threshold` (complex distance).
    /// Two NaN values compare approximately equal: both mean "undefined".
    pub fn approx_eq(&self, other: &Number, threshold: f64) -> bool {
        if self.is_nan() && other.is_nan() {
            return true;
        }
        let d = self.to_complex() - other.to_complex();
        d.norm() < threshold
    }

    /// Raises self to the power of `exp`.
    ///
    /// Rational base with small integer exponent stays exact; otherwise the
    /// computation happens in f64 and falls through to the complex plane when
    /// a real power is undefined (negative base, fractional exponent).
    pub fn pow(&self, exp: &Number) -> Number {
        if self.is_nan() || exp.is_nan() {
            return Number::nan();
        }
        if let (Number::Rational(base), Some(n)) = (self, exp.as_integer()) {
            if n.unsigned_abs() <= 1024 {
                if let Some(r) = rational_pow(base, n) {
                    return Number::Rational(r);
                }
                return Number::nan();
            }
        }
        match (self, exp) {
            (Number::Complex(_), _) | (_, Number::Complex(_)) => {
                Number::Complex(self.to_complex().powc(exp.to_complex()))
            }
            _ => {
                let b = self.to_f64();
                let e = exp.to_f64();
                let res = b.powf(e);
                if res.is_nan() && !b.is_nan() && !e.is_nan() {
                    Number::Complex(self.to_complex().powc(exp.to_complex()))
                } else {
                    Number::Real(res)
                }
            }
        }
    }

    /// Absolute value (complex modulus)
    pub fn abs(&self) -> Number {
        match self {
            Number::Rational(r) => Number::Rational(r.abs()),
            Number::Real(v) => Number::Real(v.abs()),
            Number::Complex(c) => Number::Real(c.norm()),
        }
    }

    /// Real sign: -1, 0 or 1; NaN for undefined or properly complex input
    pub fn signum(&self) -> Number {
        if self.is_nan() || self.is_properly_complex() {
            return Number::nan();
        }
        let v = self.to_f64();
        if v == 0.0 {
            Number::int(0)
        } else if v > 0.0 {
            Number::int(1)
        } else {
            Number::int(-1)
        }
    }
}

/// Exact integer power of a rational; None when inverting zero
fn rational_pow(base: &BigRational, n: i64) -> Option<BigRational> {
    if n == 0 {
        return Some(BigRational::one());
    }
    if base.is_zero() && n < 0 {
        return None;
    }
    let mut acc = BigRational::one();
    let mut b = if n < 0 { base.recip() } else { base.clone() };
    let mut k = n.unsigned_abs();
    while k > 0 {
        if k & 1 == 1 {
            acc *= b.clone();
        }
        b = b.clone() * b;
        k >>= 1;
    }
    Some(acc)
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number::int(value)
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::Real(value)
    }
}

impl std::ops::Add for Number {
    type Output = Number;
    fn add(self, rhs: Number) -> Number {
        match (self, rhs) {
            (Number::Rational(a), Number::Rational(b)) => Number::Rational(a + b),
            (a, b) if a.is_properly_complex() || b.is_properly_complex() => {
                Number::Complex(a.to_complex() + b.to_complex())
            }
            (a, b) => Number::Real(a.to_f64() + b.to_f64()),
        }
    }
}

impl std::ops::Sub for Number {
    type Output = Number;
    fn sub(self, rhs: Number) -> Number {
        match (self, rhs) {
            (Number::Rational(a), Number::Rational(b)) => Number::Rational(a - b),
            (a, b) if a.is_properly_complex() || b.is_properly_complex() => {
                Number::Complex(a.to_complex() - b.to_complex())
            }
            (a, b) => Number::Real(a.to_f64() - b.to_f64()),
        }
    }
}

impl std::ops::Mul for Number {
    type Output = Number;
    fn mul(self, rhs: Number) -> Number {
        match (self, rhs) {
            (Number::Rational(a), Number::Rational(b)) => Number::Rational(a * b),
            (a, b) if a.is_properly_complex() || b.is_properly_complex() => {
                Number::Complex(a.to_complex() * b.to_complex())
            }
            (a, b) => Number::Real(a.to_f64() * b.to_f64()),
        }
    }
}

impl std::ops::Div for Number {
    type Output = Number;
    fn div(self, rhs: Number) -> Number {
        match (self, rhs) {
            // rational division by zero is "undefined", not a panic
            (Number::Rational(_), Number::Rational(b)) if b.is_zero() => Number::nan(),
            (Number::Rational(a), Number::Rational(b)) => Number::Rational(a / b),
            (a, b) if a.is_properly_complex() || b.is_properly_complex() => {
                Number::Complex(a.to_complex() / b.to_complex())
            }
            (a, b) => Number::Real(a.to_f64() / b.to_f64()),
        }
    }
}

impl std::ops::Neg for Number {
    type Output = Number;
    fn neg(self) -> Number {
        match self {
            Number::Rational(r) => Number::Rational(-r),
            Number::Real(v) => Number::Real(-v),
            Number::Complex(c) => Number::Complex(-c),
        }
    }
}

/// Canonical bit pattern so that every NaN hashes and compares the same way
fn canonical_bits(v: f64) -> u64 {
    if v.is_nan() { f64::NAN.to_bits() } else { v.to_bits() }
}

/// Equality is value-based across representations: `Rational(2)`,
/// `Real(2.0)` and `Complex(2, 0)` are the same number. Two rationals
/// compare exactly; every other pair compares through the complex plane.
impl PartialEq for Number {
    fn eq(&self, other: &Number) -> bool {
        match (self, other) {
            (Number::Rational(a), Number::Rational(b)) => a == b,
            (a, b) => {
                let (x, y) = (a.to_complex(), b.to_complex());
                canonical_bits(x.re) == canonical_bits(y.re)
                    && canonical_bits(x.im) == canonical_bits(y.im)
            }
        }
    }
}

impl Eq for Number {}

/// Hashes the complex-plane projection so equal values hash equal no matter
/// which variant carries them.
impl Hash for Number {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let c = self.to_complex();
        state.write_u64(canonical_bits(c.re));
        state.write_u64(canonical_bits(c.im));
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Number::Rational(r) => {
                if r.is_integer() {
                    write!(f, "{}", r.numer())
                } else {
                    write!(f, "{}/{}", r.numer(), r.denom())
                }
            }
            Number::Real(v) => write!(f, "{}", v),
            Number::Complex(c) => {
                if c.im >= 0.0 {
                    write!(f, "({} + {}i)", c.re, c.im)
                } else {
                    write!(f, "({} - {}i)", c.re, -c.im)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_rational_arithmetic() {
        let a = Number::int(3);
        let b = Number::int(1);
        assert_eq!(a - b, Number::int(2));
        let third = Number::int(1) / Number::int(3);
        assert_eq!(
            third + (Number::int(2) / Number::int(3)),
            Number::int(1)
        );
    }

    #[test]
    fn test_nan_equals_itself() {
        assert_eq!(Number::nan(), Number::nan());
        assert!(Number::nan().is_nan());
        assert_ne!(Number::nan(), Number::real(0.0));
    }

    #[test]
    fn test_rational_division_by_zero_is_nan() {
        let q = Number::int(1) / Number::int(0);
        assert!(q.is_nan());
    }

    #[test]
    fn test_integer_pow_is_exact() {
        let two = Number::int(2);
        assert_eq!(two.pow(&Number::int(10)), Number::int(1024));
        let half = Number::int(1) / Number::int(2);
        assert_eq!(half.pow(&Number::int(-2)), Number::int(4));
    }

    #[test]
    fn test_negative_base_fractional_exp_goes_complex() {
        let r = Number::int(-1).pow(&(Number::int(1) / Number::int(2)));
        // sqrt(-1) = i
        assert!(r.is_properly_complex());
        assert!(r.approx_eq(&Number::complex(0.0, 1.0), 1e-11));
    }

    #[test]
    fn test_approx_eq_threshold() {
        let a = Number::real(1.0);
        let b = Number::real(1.0 + 1e-13);
        assert!(a.approx_eq(&b, 1e-11));
        assert!(!a.approx_eq(&Number::real(1.0 + 1e-9), 1e-11));
    }

    #[test]
    fn test_equality_is_value_based_across_variants() {
        assert_eq!(Number::int(2), Number::real(2.0));
        assert_eq!(Number::real(2.0), Number::complex(2.0, 0.0));
        assert_ne!(Number::int(2), Number::complex(2.0, 0.1));
        assert_ne!(Number::real(0.0), Number::real(-0.0));
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};
        let hash = |n: &Number| {
            let mut h = DefaultHasher::new();
            n.hash(&mut h);
            h.finish()
        };
        assert_eq!(hash(&Number::int(2)), hash(&Number::real(2.0)));
    }

    #[test]
    fn test_promotion_rational_to_real() {
        let r = Number::int(1) + Number::real(0.5);
        assert_eq!(r, Number::real(1.5));
    }
}
