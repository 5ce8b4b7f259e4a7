//! # Complex Numbers
//!
//! Double-precision complex value type for amplitude vectors.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// A complex number (16 bytes per amplitude).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Complex {
    /// Real part.
    pub re: f64,
    /// Imaginary part.
    pub im: f64,
}

impl Complex {
    /// Zero constant.
    pub const ZERO: Complex = Complex { re: 0.0, im: 0.0 };

    /// One constant.
    pub const ONE: Complex = Complex { re: 1.0, im: 0.0 };

    /// Imaginary unit.
    pub const I: Complex = Complex { re: 0.0, im: 1.0 };

    /// Create a new complex number.
    #[inline]
    #[must_use]
    pub const fn new(re: f64, im: f64) -> Self {
        Complex { re, im }
    }

    /// A purely real value.
    #[inline]
    #[must_use]
    pub const fn real(re: f64) -> Self {
        Complex { re, im: 0.0 }
    }

    /// `e^{iθ}` - the unit phasor at angle θ.
    #[inline]
    #[must_use]
    pub fn exp_i(theta: f64) -> Self {
        Complex {
            re: theta.cos(),
            im: theta.sin(),
        }
    }

    /// Scale by a real factor.
    #[inline]
    #[must_use]
    pub fn scale(self, factor: f64) -> Self {
        Complex {
            re: self.re * factor,
            im: self.im * factor,
        }
    }

    /// Squared magnitude `|z|²`.
    #[inline]
    #[must_use]
    pub fn norm_sq(self) -> f64 {
        self.re * self.re + self.im * self.im
    }

    /// Magnitude `|z|`.
    #[inline]
    #[must_use]
    pub fn abs(self) -> f64 {
        self.norm_sq().sqrt()
    }

    /// Complex conjugate.
    #[inline]
    #[must_use]
    pub fn conj(self) -> Self {
        Complex {
            re: self.re,
            im: -self.im,
        }
    }
}

impl Add for Complex {
    type Output = Complex;

    #[inline]
    fn add(self, other: Complex) -> Complex {
        Complex {
            re: self.re + other.re,
            im: self.im + other.im,
        }
    }
}

impl AddAssign for Complex {
    #[inline]
    fn add_assign(&mut self, other: Complex) {
        self.re += other.re;
        self.im += other.im;
    }
}

impl Sub for Complex {
    type Output = Complex;

    #[inline]
    fn sub(self, other: Complex) -> Complex {
        Complex {
            re: self.re - other.re,
            im: self.im - other.im,
        }
    }
}

impl Mul for Complex {
    type Output = Complex;

    #[inline]
    fn mul(self, other: Complex) -> Complex {
        Complex {
            re: self.re * other.re - self.im * other.im,
            im: self.re * other.im + self.im * other.re,
        }
    }
}

impl Neg for Complex {
    type Output = Complex;

    #[inline]
    fn neg(self) -> Complex {
        Complex {
            re: -self.re,
            im: -self.im,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mul() {
        // (1 + i)(1 - i) = 2
        let z = Complex::new(1.0, 1.0) * Complex::new(1.0, -1.0);
        assert!((z.re - 2.0).abs() < 1e-12);
        assert!(z.im.abs() < 1e-12);
    }

    #[test]
    fn test_exp_i_unit_magnitude() {
        for k in 0..8 {
            let theta = k as f64 * std::f64::consts::FRAC_PI_4;
            assert!((Complex::exp_i(theta).abs() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_conj_norm() {
        let z = Complex::new(3.0, -4.0);
        assert!((z.abs() - 5.0).abs() < 1e-12);
        let p = z * z.conj();
        assert!((p.re - 25.0).abs() < 1e-12);
        assert!(p.im.abs() < 1e-12);
    }
}
