//! Conversions between fixed-width amounts and arbitrary-precision numbers.

use {
    num::{
        bigint::{BigInt, Sign},
        BigRational,
    },
    primitive_types::U256,
};

pub fn u256_to_big_int(value: &U256) -> BigInt {
    let mut bytes = [0u8; 32];
    value.to_little_endian(&mut bytes);
    BigInt::from_bytes_le(Sign::Plus, &bytes)
}

pub fn u256_to_big_rational(value: &U256) -> BigRational {
    BigRational::from_integer(u256_to_big_int(value))
}

/// Returns `None` for negative values and values wider than 256 bits.
pub fn big_int_to_u256(value: &BigInt) -> Option<U256> {
    let (sign, bytes) = value.to_bytes_le();
    if sign == Sign::Minus || bytes.len() > 32 {
        return None;
    }
    Some(U256::from_little_endian(&bytes))
}

/// `floor(amount · fraction)` for a non-negative fraction.
pub fn mul_ratio_floor(amount: u64, fraction: &BigRational) -> u64 {
    let scaled = BigRational::from_integer(BigInt::from(amount)) * fraction;
    let floored = scaled.floor().to_integer();
    // Budget fractions are capped at 1, so the result always fits.
    u64::try_from(floored).unwrap_or(amount)
}
