//! Integer helpers: gcd, checked lcm and linear congruences.

use thiserror::Error;

/// Arithmetic left the supported integer range.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
#[error("arithmetic overflow")]
pub struct Overflow;

/// Iterative Euclidean gcd. Returns the other value when one input is `0`.
#[must_use]
pub const fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

/// Euclidean gcd on 128-bit values.
#[must_use]
pub const fn gcd_u128(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

/// Checked lcm of a running step and a period.
///
/// # Errors
/// - If the result does not fit into `u128`.
pub fn lcm(step: u128, period: u64) -> Result<u128, Overflow> {
    let period = u128::from(period);
    if step == 0 || period == 0 {
        return Ok(0);
    }
    (step / gcd_u128(step, period))
        .checked_mul(period)
        .ok_or(Overflow)
}

/// Extended Euclid: returns `(g, x)` with `a * x ≡ g (mod b)`, both inputs non-negative.
const fn extended_gcd(a: i128, b: i128) -> (i128, i128) {
    let (mut remainder, mut next) = (a, b);
    let (mut factor, mut next_factor) = (1i128, 0i128);
    while next != 0 {
        let quotient = remainder / next;
        (remainder, next) = (next, remainder - quotient * next);
        (factor, next_factor) = (next_factor, factor - quotient * next_factor);
    }
    (remainder, factor)
}

/// Multiplicative inverse of `a` modulo `m`, `None` if they share a factor.
#[must_use]
pub fn mod_inverse(a: i128, m: i128) -> Option<i128> {
    if m == 1 {
        return Some(0);
    }
    let (g, x) = extended_gcd(a.rem_euclid(m), m);
    (g == 1).then(|| x.rem_euclid(m))
}

/// `a * b mod m` for non-negative operands below `m` without intermediate overflow.
#[must_use]
pub fn mul_mod(a: i128, b: i128, m: i128) -> i128 {
    if let Some(product) = a.checked_mul(b) {
        return product.rem_euclid(m);
    }

    // operands are below m <= i128::MAX, so doubling fits in u128
    let m = m.unsigned_abs();
    let (mut a, mut b) = (a.unsigned_abs() % m, b.unsigned_abs());
    let mut result = 0u128;
    while b > 0 {
        if b & 1 == 1 {
            result = (result + a) % m;
        }
        a = (a << 1) % m;
        b >>= 1;
    }
    // result < m <= i128::MAX
    i128::try_from(result).unwrap_or_else(|_| unreachable!("residue exceeds modulus"))
}

/// The set of integers `t` with `t ≡ residue (mod modulus)`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Congruence {
    residue: i128,
    modulus: i128,
}

impl Congruence {
    /// Every integer.
    pub const ANY: Self = Self {
        residue: 0,
        modulus: 1,
    };

    /// Creates a congruence; the residue is normalized into `0..modulus`.
    ///
    /// # Panics
    /// - If `modulus` is not positive.
    #[must_use]
    pub fn new(residue: i128, modulus: i128) -> Self {
        assert!(modulus > 0, "modulus must be positive");
        Self {
            residue: residue.rem_euclid(modulus),
            modulus,
        }
    }

    #[must_use]
    pub const fn residue(&self) -> i128 {
        self.residue
    }

    #[must_use]
    pub const fn modulus(&self) -> i128 {
        self.modulus
    }

    /// Solves `a * t ≡ c (mod m)` for `t`. Returns `None` if there is no solution.
    ///
    /// # Panics
    /// - If `m` is not positive.
    #[must_use]
    pub fn solve_linear(a: i128, c: i128, m: i128) -> Option<Self> {
        assert!(m > 0, "modulus must be positive");
        let (a, c) = (a.rem_euclid(m), c.rem_euclid(m));
        let (g, _) = extended_gcd(a, m);
        let g = if g == 0 { m } else { g };
        if c % g != 0 {
            return None;
        }

        let reduced = m / g;
        let inverse = mod_inverse(a / g, reduced)?;
        Some(Self::new(mul_mod(c / g, inverse, reduced), reduced))
    }

    /// Intersects two congruences. `Ok(None)` means they are inconsistent.
    ///
    /// # Errors
    /// - If the combined modulus does not fit into `i128`.
    pub fn merge(self, other: Self) -> Result<Option<Self>, Overflow> {
        let (g, _) = extended_gcd(self.modulus, other.modulus);
        let difference = other.residue - self.residue;
        if difference % g != 0 {
            return Ok(None);
        }

        let reduced = other.modulus / g;
        let Some(inverse) = mod_inverse(self.modulus / g, reduced) else {
            unreachable!("moduli divided by their gcd are coprime")
        };
        let k = mul_mod((difference / g).rem_euclid(reduced), inverse, reduced);
        let modulus = self.modulus.checked_mul(reduced).ok_or(Overflow)?;
        // k < reduced, so the product stays below the combined modulus
        let residue = self.residue + self.modulus * k;
        Ok(Some(Self::new(residue, modulus)))
    }

    /// Smallest member that is at least `lower`.
    ///
    /// # Errors
    /// - If the value does not fit into `i128`.
    pub fn smallest_at_least(&self, lower: i128) -> Result<i128, Overflow> {
        let offset = self
            .residue
            .checked_sub(lower)
            .ok_or(Overflow)?
            .rem_euclid(self.modulus);
        lower.checked_add(offset).ok_or(Overflow)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn gcd_basic_cases() {
        assert_eq!(gcd(12, 8), 4);
        assert_eq!(gcd(17, 13), 1);
        assert_eq!(gcd(0, 5), 5);
        assert_eq!(gcd_u128(1789 * 37, 37 * 47), 37);
    }

    #[test]
    fn lcm_cases() {
        assert_eq!(lcm(4, 6), Ok(12));
        assert_eq!(lcm(1, 1789), Ok(1789));
        assert_eq!(lcm(u128::MAX / 2, 3), Err(Overflow));
    }

    #[test]
    fn inverse_cases() {
        assert_eq!(mod_inverse(3, 7), Some(5));
        assert_eq!(mod_inverse(-3, 7), Some(2));
        assert_eq!(mod_inverse(4, 6), None);
        assert_eq!(mod_inverse(5, 1), Some(0));
    }

    #[test]
    fn mul_mod_does_not_overflow() {
        let m = i128::MAX - 1;
        let a = m - 3;
        // (m - 3)^2 ≡ 9 (mod m)
        assert_eq!(mul_mod(a, a, m), 9);
        assert_eq!(mul_mod(6, 7, 5), 2);
    }

    #[test]
    fn linear_congruence_cases() {
        // 3t ≡ 2 (mod 7) -> t ≡ 3
        assert_eq!(
            Congruence::solve_linear(3, 2, 7),
            Some(Congruence::new(3, 7))
        );
        // 4t ≡ 2 (mod 6) -> 2t ≡ 1 (mod 3) -> t ≡ 2
        assert_eq!(
            Congruence::solve_linear(4, 2, 6),
            Some(Congruence::new(2, 3))
        );
        // 4t ≡ 1 (mod 6) has no solution
        assert_eq!(Congruence::solve_linear(4, 1, 6), None);
        // 0t ≡ 0 (mod 5) holds for every t
        assert_eq!(Congruence::solve_linear(0, 0, 5), Some(Congruence::ANY));
        assert_eq!(Congruence::solve_linear(0, 1, 5), None);
    }

    #[test]
    fn merge_coprime() -> anyhow::Result<()> {
        // t ≡ 0 (mod 17), t ≡ -2 (mod 13), t ≡ -3 (mod 19)
        let merged = Congruence::new(0, 17)
            .merge(Congruence::new(-2, 13))?
            .and_then(|c| c.merge(Congruence::new(-3, 19)).ok().flatten());
        let merged = merged.ok_or_else(|| anyhow::anyhow!("inconsistent"))?;
        assert_eq!(merged.modulus(), 17 * 13 * 19);
        assert_eq!(merged.residue(), 3417);
        Ok(())
    }

    #[test]
    fn merge_shared_factor() -> anyhow::Result<()> {
        assert_eq!(
            Congruence::new(0, 4).merge(Congruence::new(4, 6))?,
            Some(Congruence::new(4, 12))
        );
        assert_eq!(Congruence::new(0, 4).merge(Congruence::new(5, 6))?, None);
        Ok(())
    }

    #[test]
    fn smallest_member() -> anyhow::Result<()> {
        let congruence = Congruence::new(0, 15);
        assert_eq!(congruence.smallest_at_least(1)?, 15);
        assert_eq!(congruence.smallest_at_least(0)?, 0);
        assert_eq!(Congruence::new(3, 7).smallest_at_least(-10)?, -4);
        Ok(())
    }
}
