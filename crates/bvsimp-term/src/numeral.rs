// SPDX-License-Identifier: AGPL-3.0

//! Bit-width-modular integer arithmetic.
//!
//! Numerals are non-negative `BigUint` values kept in the canonical range
//! `[0, 2^n)`. The signed view is two's complement, derived on demand and
//! never stored. All helpers work uniformly for widths beyond the native
//! machine word.

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, Zero};

/// All-ones value of the given width: `2^n - 1`.
pub fn mask(width: u32) -> BigUint {
    if width == 0 {
        BigUint::zero()
    } else {
        (BigUint::one() << width as usize) - BigUint::one()
    }
}

/// Reduce a value into the canonical range `[0, 2^n)`.
pub fn normalize(value: BigUint, width: u32) -> BigUint {
    if width == 0 {
        BigUint::zero()
    } else {
        value & mask(width)
    }
}

/// Whether the sign bit (bit `n-1`) of a canonical value is set.
pub fn has_sign_bit(value: &BigUint, width: u32) -> bool {
    debug_assert!(width > 0);
    value.bit(width as u64 - 1)
}

/// Two's-complement reinterpretation: `v - 2^n` when `v >= 2^(n-1)`.
pub fn to_signed(value: &BigUint, width: u32) -> BigInt {
    if width == 0 {
        return BigInt::zero();
    }
    if has_sign_bit(value, width) {
        let modulus = BigUint::one() << width as usize;
        BigInt::from_biguint(Sign::Minus, modulus - value)
    } else {
        BigInt::from(value.clone())
    }
}

/// Embed a signed integer back into `[0, 2^n)`.
pub fn from_signed(value: &BigInt, width: u32) -> BigUint {
    if width == 0 {
        return BigUint::zero();
    }
    let modulus = BigUint::one() << width as usize;
    match value.sign() {
        Sign::NoSign => BigUint::zero(),
        Sign::Plus => normalize(value.to_biguint().expect("non-negative"), width),
        Sign::Minus => {
            let magnitude = normalize((-value).to_biguint().expect("positive"), width);
            if magnitude.is_zero() {
                BigUint::zero()
            } else {
                modulus - magnitude
            }
        }
    }
}

/// If `value` is `2^s`, return `s`.
pub fn power_of_two_shift(value: &BigUint) -> Option<u32> {
    if value.is_zero() {
        return None;
    }
    let minus_one = value - BigUint::one();
    if (value & &minus_one).is_zero() {
        Some((value.bits() - 1) as u32)
    } else {
        None
    }
}

/// Multiplicative inverse modulo `2^n`, when one exists.
///
/// A value is invertible modulo a power of two exactly when it is odd. The
/// inverse is computed by Hensel lifting: starting from the inverse modulo 2,
/// each step doubles the number of correct low bits.
pub fn mult_inverse(value: &BigUint, width: u32) -> Option<BigUint> {
    if width == 0 || !value.bit(0) {
        return None;
    }
    let two = BigUint::from(2u32);
    let mut inv = BigUint::one();
    let mut bits = 1u32;
    while bits < width {
        // inv' = inv * (2 - v * inv)  (mod 2^min(2*bits, width))
        bits = (bits * 2).min(width);
        let m = mask(bits);
        let prod = (value * &inv) & &m;
        // 2 - prod, taken modulo 2^bits
        let correction = normalize((BigUint::one() << bits as usize) + &two - prod, bits);
        inv = (inv * correction) & &m;
    }
    debug_assert!(normalize(value * &inv, width).is_one());
    Some(inv)
}

/// Bit `idx` of a canonical value.
pub fn bit(value: &BigUint, idx: u32) -> bool {
    value.bit(idx as u64)
}
