//! Deterministic value hashing with Python's cross-type invariant.
//!
//! Python guarantees that `a == b` implies `hash(a) == hash(b)`, and since
//! `0 == 0.0 == False` the int, float, and bool hash functions must agree on
//! equivalent inputs. Numeric hashing therefore reduces modulo the Mersenne
//! prime `2^61 - 1`, the same algorithm CPython uses in `longobject.c` and
//! `floatobject.c`. String/bytes hashing only needs to be deterministic (dict
//! ordering is insertion-based, so nothing observes the bits); FNV-1a is
//! enough.

use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive, Zero};

/// Mersenne prime `2^61 - 1` used for all numeric hashing.
const MODULUS: i64 = (1 << 61) - 1;

/// Hashes a signed 64-bit integer: `n % MODULUS`, sign-preserving, with a
/// result of `-1` remapped to `-2` (CPython reserves `-1` internally).
#[must_use]
pub(crate) fn hash_int(value: i64) -> u64 {
    as_u64(hash_int_signed(value))
}

fn hash_int_signed(value: i64) -> i64 {
    if value == 0 {
        return 0;
    }
    let sign: i64 = if value < 0 { -1 } else { 1 };
    let abs_val = i128::from(value).unsigned_abs() as u64;
    let remainder = (abs_val % MODULUS as u64) as i64;
    let result = sign * remainder;
    if result == -1 { -2 } else { result }
}

/// Hashes an arbitrary-precision integer with the same modular reduction, so
/// `hash(2**70)` agrees between the i64 fast path and the big-int path.
#[must_use]
pub(crate) fn hash_bigint(value: &BigInt) -> u64 {
    if value.is_zero() {
        return 0;
    }
    let modulus = BigInt::from(MODULUS);
    let remainder = (value.abs() % &modulus).to_i64().expect("remainder fits by construction");
    let result = if value.is_negative() { -remainder } else { remainder };
    as_u64(if result == -1 { -2 } else { result })
}

/// Hashes an `f64` such that `hash(n) == hash(float(n))` for integral values.
///
/// Integral floats delegate to the integer path; non-integral floats use the
/// frexp decomposition from CPython's `_Py_HashDouble`. `+inf`/`-inf` hash to
/// `±314159` and NaN hashes to 0.
#[must_use]
pub(crate) fn hash_float(value: f64) -> u64 {
    as_u64(hash_float_signed(value))
}

fn hash_float_signed(value: f64) -> i64 {
    if value.is_infinite() {
        return if value > 0.0 { 314_159 } else { -314_159 };
    }
    if value.is_nan() {
        return 0;
    }

    let truncated = value.trunc();
    if value == truncated && truncated >= i64::MIN as f64 && truncated <= i64::MAX as f64 {
        return hash_int_signed(truncated as i64);
    }

    let (frac, exp) = frexp(value);
    let mut m = frac;
    let mut e = exp;
    let sign: i64 = if m < 0.0 {
        m = -m;
        -1
    } else {
        1
    };

    // Fold the mantissa in 28-bit chunks.
    let mut x: u64 = 0;
    while m > 0.0 {
        x = ((x << 28) & (MODULUS as u64)) | (x >> 33);
        m *= 268_435_456.0; // 2^28
        e -= 28;
        let w = m as u64;
        m -= w as f64;
        x = x.wrapping_add(w);
        if x >= MODULUS as u64 {
            x -= MODULUS as u64;
        }
    }

    e %= 61;
    if e < 0 {
        e += 61;
    }
    x = ((x << e as u32) & (MODULUS as u64)) | (x >> (61 - e) as u32);

    let result = (sign * x as i64) % MODULUS;
    if result == -1 { -2 } else { result }
}

/// `(frac, exp)` such that `value == frac * 2^exp` with `0.5 <= |frac| < 1`.
fn frexp(value: f64) -> (f64, i32) {
    if value == 0.0 || value.is_nan() || value.is_infinite() {
        return (value, 0);
    }
    let bits = value.to_bits();
    let exponent = ((bits >> 52) & 0x7ff) as i32;
    if exponent == 0 {
        // Subnormal: normalize first, then correct the exponent.
        let normalized = value * (1u64 << 63) as f64 * 2.0;
        let (frac, exp) = frexp(normalized);
        return (frac, exp - 64);
    }
    let frac_bits = (bits & 0x800F_FFFF_FFFF_FFFF) | 0x3FE0_0000_0000_0000;
    (f64::from_bits(frac_bits), exponent - 1022)
}

/// Deterministic FNV-1a over raw bytes, used for str and bytes keys.
#[must_use]
pub(crate) fn hash_bytes(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut hash = OFFSET;
    for &byte in bytes {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

#[must_use]
pub(crate) fn hash_str(value: &str) -> u64 {
    hash_bytes(value.as_bytes())
}

/// Mixes element hashes into a tuple hash (order-sensitive).
#[must_use]
pub(crate) fn hash_tuple_fold(acc: u64, element: u64) -> u64 {
    // A simplified xxHash-style round; stable and well-distributed.
    let mut acc = acc ^ element.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    acc = acc.rotate_left(31);
    acc.wrapping_mul(0x85EB_CA77_C2B2_AE63)
}

/// Seed for tuple hashing, distinct from the empty-string hash.
pub(crate) const TUPLE_HASH_SEED: u64 = 0x345678;

/// Seed for frozenset hashing; element hashes are XOR-combined so the result
/// is order-insensitive.
pub(crate) fn hash_frozenset(element_hashes: impl Iterator<Item = u64>) -> u64 {
    let mut acc: u64 = 0x1234_5678;
    for h in element_hashes {
        acc ^= h.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    }
    acc
}

fn as_u64(value: i64) -> u64 {
    u64::from_ne_bytes(value.to_ne_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_float_bool_agree() {
        assert_eq!(hash_int(1), hash_float(1.0));
        assert_eq!(hash_int(0), hash_float(0.0));
        assert_eq!(hash_int(-7), hash_float(-7.0));
        assert_eq!(hash_int(42), hash_bigint(&BigInt::from(42)));
    }

    #[test]
    fn big_values_reduce_modulo_mersenne() {
        let big = BigInt::from(2).pow(61) - 1 + 5; // MODULUS + 5
        assert_eq!(hash_bigint(&big), hash_int(5));
    }

    #[test]
    fn minus_one_is_remapped() {
        assert_eq!(hash_int(-1), hash_int(-2));
    }

    #[test]
    fn float_infinities_and_nan() {
        assert_eq!(hash_float(f64::INFINITY), as_u64(314_159));
        assert_eq!(hash_float(f64::NEG_INFINITY), as_u64(-314_159));
        assert_eq!(hash_float(f64::NAN), 0);
    }

    #[test]
    fn fractional_floats_are_stable() {
        assert_eq!(hash_float(0.5), hash_float(0.5));
        assert_ne!(hash_float(0.5), hash_float(0.25));
    }

    #[test]
    fn strings_are_deterministic() {
        assert_eq!(hash_str("abc"), hash_str("abc"));
        assert_ne!(hash_str("abc"), hash_str("abd"));
        assert_eq!(hash_str(""), hash_bytes(b""));
    }
}
