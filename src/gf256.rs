//! Arithmetic over GF(2^8)
//!
//! Elements are bytes. Addition and subtraction are both XOR; multiplication
//! and division go through log/exp tables for generator `0x03` under the AES
//! reduction polynomial x^8 + x^4 + x^3 + x + 1 (`0x11b`). The tables are
//! computed at compile time, so there is no runtime initialisation.
//!
//! # Examples
//!
//! ```rust
//! use horcrux::gf256::Gf256;
//!
//! // FIPS-197 section 4.2 worked example
//! assert_eq!(Gf256(0x57) * Gf256(0x83), Gf256(0xc1));
//! assert_eq!(Gf256(0x57) + Gf256(0x83), Gf256(0xd4));
//! assert_eq!(Gf256(0x53).inverse(), Some(Gf256(0xca)));
//! ```

use std::ops::{Add, AddAssign, Mul, MulAssign, Sub};

/// Reduction polynomial, including the x^8 term
const POLYNOMIAL: u16 = 0x11b;

/// Exp table is doubled so `EXP[LOG[a] + LOG[b]]` never needs a modulo
const fn build_tables() -> ([u8; 512], [u8; 256]) {
    let mut exp = [0u8; 512];
    let mut log = [0u8; 256];
    let mut x: u16 = 1;
    let mut i = 0;
    while i < 255 {
        exp[i] = x as u8;
        log[x as usize] = i as u8;
        // x * 3 == (x * 2) ^ x
        let mut doubled = x << 1;
        if doubled & 0x100 != 0 {
            doubled ^= POLYNOMIAL;
        }
        x = doubled ^ x;
        i += 1;
    }
    while i < 512 {
        exp[i] = exp[i - 255];
        i += 1;
    }
    (exp, log)
}

const TABLES: ([u8; 512], [u8; 256]) = build_tables();
const EXP: [u8; 512] = TABLES.0;
const LOG: [u8; 256] = TABLES.1;

/// A single field element
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Gf256(pub u8);

impl Gf256 {
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(1);

    /// Multiplicative inverse, `None` for zero
    #[must_use]
    pub fn inverse(self) -> Option<Self> {
        if self.0 == 0 {
            return None;
        }
        Some(Self(EXP[255 - LOG[self.0 as usize] as usize]))
    }

    /// Division, `None` when dividing by zero
    #[must_use]
    pub fn checked_div(self, rhs: Self) -> Option<Self> {
        if rhs.0 == 0 {
            return None;
        }
        if self.0 == 0 {
            return Some(Self::ZERO);
        }
        let log = LOG[self.0 as usize] as usize + 255 - LOG[rhs.0 as usize] as usize;
        Some(Self(EXP[log]))
    }
}

impl Add for Gf256 {
    type Output = Self;

    #[inline]
    #[allow(clippy::suspicious_arithmetic_impl)]
    fn add(self, rhs: Self) -> Self {
        Self(self.0 ^ rhs.0)
    }
}

impl AddAssign for Gf256 {
    #[inline]
    #[allow(clippy::suspicious_op_assign_impl)]
    fn add_assign(&mut self, rhs: Self) {
        self.0 ^= rhs.0;
    }
}

impl Sub for Gf256 {
    type Output = Self;

    #[inline]
    #[allow(clippy::suspicious_arithmetic_impl)]
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 ^ rhs.0)
    }
}

impl Mul for Gf256 {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        if self.0 == 0 || rhs.0 == 0 {
            return Self::ZERO;
        }
        Self(EXP[LOG[self.0 as usize] as usize + LOG[rhs.0 as usize] as usize])
    }
}

impl MulAssign for Gf256 {
    #[inline]
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

/// Evaluates `constant + coefficients[0]*x + coefficients[1]*x^2 + ...` with Horner's rule
#[inline]
#[must_use]
pub fn evaluate(constant: u8, coefficients: &[u8], x: Gf256) -> u8 {
    let acc = coefficients
        .iter()
        .rev()
        .fold(Gf256::ZERO, |acc, &c| acc * x + Gf256(c));
    (acc * x + Gf256(constant)).0
}

/// Lagrange basis weights for a fixed set of x-coordinates, evaluated at one point
///
/// For points `x_0..x_k` and target `t`, weight `j` is
/// `prod_{m != j} (t - x_m) / (x_j - x_m)`, so the interpolated value at `t`
/// is `sum_j weight_j * y_j`. Computing the weights once per operation turns
/// every byte of reconstruction into a dot product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LagrangeWeights {
    weights: Vec<Gf256>,
}

impl LagrangeWeights {
    /// Returns `None` when `xs` is empty or contains a repeated coordinate
    #[must_use]
    pub fn new(xs: &[u8], at: u8) -> Option<Self> {
        if xs.is_empty() {
            return None;
        }
        let at = Gf256(at);
        let mut weights = Vec::with_capacity(xs.len());
        for (j, &xj) in xs.iter().enumerate() {
            let xj = Gf256(xj);
            let mut numerator = Gf256::ONE;
            let mut denominator = Gf256::ONE;
            for (m, &xm) in xs.iter().enumerate() {
                if m == j {
                    continue;
                }
                numerator *= at - Gf256(xm);
                denominator *= xj - Gf256(xm);
            }
            weights.push(numerator.checked_div(denominator)?);
        }
        Some(Self { weights })
    }

    /// Number of points the weights were built for
    #[must_use]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Interpolated value given one y per point, in the same order as `xs`
    #[inline]
    pub fn interpolate<I>(&self, ys: I) -> u8
    where
        I: IntoIterator<Item = u8>,
    {
        self.weights
            .iter()
            .zip(ys)
            .fold(Gf256::ZERO, |acc, (&w, y)| acc + w * Gf256(y))
            .0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_are_a_permutation() {
        let mut seen = [false; 256];
        for &v in &EXP[..255] {
            assert_ne!(v, 0);
            assert!(!seen[v as usize], "exp table repeats {v:#04x}");
            seen[v as usize] = true;
        }
    }

    #[test]
    fn test_fips_197_multiplication() {
        assert_eq!(Gf256(0x57) * Gf256(0x83), Gf256(0xc1));
        assert_eq!(Gf256(0x57) * Gf256(0x13), Gf256(0xfe));
    }

    #[test]
    fn test_every_nonzero_element_has_inverse() {
        for a in 1..=255u8 {
            let inv = Gf256(a).inverse().unwrap();
            assert_eq!(Gf256(a) * inv, Gf256::ONE, "a = {a:#04x}");
        }
        assert_eq!(Gf256::ZERO.inverse(), None);
    }

    #[test]
    fn test_division_undoes_multiplication() {
        for a in 0..=255u8 {
            for b in [1u8, 2, 3, 0x53, 0xca, 0xff] {
                let product = Gf256(a) * Gf256(b);
                assert_eq!(product.checked_div(Gf256(b)), Some(Gf256(a)));
            }
        }
        assert_eq!(Gf256(7).checked_div(Gf256::ZERO), None);
    }

    #[test]
    fn test_distributive_law() {
        for a in (0..=255u8).step_by(7) {
            for b in (0..=255u8).step_by(11) {
                for c in (0..=255u8).step_by(13) {
                    let (a, b, c) = (Gf256(a), Gf256(b), Gf256(c));
                    assert_eq!(a * (b + c), a * b + a * c);
                }
            }
        }
    }

    #[test]
    fn test_evaluate_at_zero_is_constant() {
        assert_eq!(evaluate(0x42, &[0x11, 0x22, 0x33], Gf256::ZERO), 0x42);
        assert_eq!(evaluate(0x42, &[], Gf256(9)), 0x42);
    }

    #[test]
    fn test_evaluate_linear() {
        // 5 + 3x at x = 2 is 5 ^ (3 * 2) = 5 ^ 6
        assert_eq!(evaluate(5, &[3], Gf256(2)), 5 ^ 6);
    }

    #[test]
    fn test_lagrange_recovers_constant() {
        let constant = 0xa7;
        let coefficients = [0x19, 0xe2, 0x04];
        let xs = [3u8, 9, 200, 17];
        let ys: Vec<u8> = xs
            .iter()
            .map(|&x| evaluate(constant, &coefficients, Gf256(x)))
            .collect();

        let weights = LagrangeWeights::new(&xs, 0).unwrap();
        assert_eq!(weights.interpolate(ys.iter().copied()), constant);
    }

    #[test]
    fn test_lagrange_predicts_other_points() {
        let coefficients = [0x01, 0x80];
        let xs = [1u8, 2, 3];
        let ys: Vec<u8> = xs
            .iter()
            .map(|&x| evaluate(0x5c, &coefficients, Gf256(x)))
            .collect();

        let weights = LagrangeWeights::new(&xs, 77).unwrap();
        assert_eq!(
            weights.interpolate(ys.iter().copied()),
            evaluate(0x5c, &coefficients, Gf256(77))
        );
    }

    #[test]
    fn test_lagrange_rejects_repeated_coordinates() {
        assert!(LagrangeWeights::new(&[4, 5, 4], 0).is_none());
        assert!(LagrangeWeights::new(&[], 0).is_none());
    }
}
