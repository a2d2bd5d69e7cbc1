//! Conversions between arbitrary precision integers and the fixed width integers carried by
//! blob transactions.
//!
//! Big integers that arrive over JSON are transported as hex strings. They are decoded with
//! [`decode_hex_biguint`], either directly or through the [`HexBigUint`] wrapper.

use alloy::primitives::U256;
use num_bigint::BigUint;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};

/// Number of bits in [`U256`].
pub const FIXED_WIDTH_BITS: u32 = 256;

/// Number of bits the EIP-4844 message uses for each fee cap.
pub const WIRE_FEE_BITS: u32 = 128;

/// Errors decoding a hex encoded big integer.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum DecodeError {
    /// the text was not a base 16 number
    #[error("invalid hex number: {0}")]
    InvalidHexNumber(String),
}

/// A fee field of the blob transaction message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum FeeField {
    /// Max priority fee per gas.
    GasTipCap,
    /// Max fee per gas.
    GasFeeCap,
    /// Max fee per blob gas.
    BlobFeeCap,
}

/// A value did not fit in the fixed width integer for `field`.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("{field} overflow: value does not fit in {bits} bits")]
pub struct OverflowError {
    /// The field that overflowed.
    pub field: FeeField,
    /// Width of the target integer.
    pub bits: u32,
}

/// Decode a base 16 big integer.
///
/// Surrounding `"` characters and a leading `0x` are stripped first. The remainder must be a
/// non-empty run of hex digits; signs and digit separators are rejected.
pub fn decode_hex_biguint(text: &str) -> Result<BigUint, DecodeError> {
    let trimmed = text.trim_matches('"');
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(DecodeError::InvalidHexNumber(digits.to_string()));
    }

    BigUint::parse_bytes(digits.as_bytes(), 16)
        .ok_or_else(|| DecodeError::InvalidHexNumber(digits.to_string()))
}

/// Convert `value` to a [`U256`], failing instead of wrapping.
pub fn to_fixed_width(value: &BigUint, field: FeeField) -> Result<U256, OverflowError> {
    if value.bits() > u64::from(FIXED_WIDTH_BITS) {
        return Err(OverflowError { field, bits: FIXED_WIDTH_BITS });
    }

    U256::try_from_be_slice(&value.to_bytes_be())
        .ok_or(OverflowError { field, bits: FIXED_WIDTH_BITS })
}

/// Convert `value` to the `u128` the EIP-4844 message stores fee caps as.
///
/// The value is first checked against the 256 bit range and then narrowed, so an overflow
/// always names the width that was exceeded.
pub fn to_wire_fee(value: &BigUint, field: FeeField) -> Result<u128, OverflowError> {
    let fixed = to_fixed_width(value, field)?;
    u128::try_from(fixed).map_err(|_| OverflowError { field, bits: WIRE_FEE_BITS })
}

/// An arbitrary precision unsigned integer transported as a hex string.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HexBigUint(pub BigUint);

impl HexBigUint {
    /// Borrow the inner integer.
    pub const fn as_biguint(&self) -> &BigUint {
        &self.0
    }

    /// Take the inner integer.
    pub fn into_inner(self) -> BigUint {
        self.0
    }

    /// The value as a `u64`, if it fits.
    pub fn to_u64(&self) -> Option<u64> {
        u64::try_from(&self.0).ok()
    }
}

impl From<BigUint> for HexBigUint {
    fn from(value: BigUint) -> Self {
        Self(value)
    }
}

impl From<u64> for HexBigUint {
    fn from(value: u64) -> Self {
        Self(BigUint::from(value))
    }
}

impl FromStr for HexBigUint {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_hex_biguint(s).map(Self)
    }
}

impl fmt::Display for HexBigUint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

impl Serialize for HexBigUint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for HexBigUint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        decode_hex_biguint(&s).map(Self).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::prefixed_upper("0xFF", 255)]
    #[case::bare_lower("ff", 255)]
    #[case::quoted("\"0x1a\"", 26)]
    #[case::zero("0x0", 0)]
    #[case::leading_zeros("0x000010", 16)]
    fn decodes_hex(#[case] text: &str, #[case] expected: u64) {
        assert_eq!(decode_hex_biguint(text).unwrap(), BigUint::from(expected));
    }

    #[rstest]
    #[case::not_hex("not-hex")]
    #[case::empty("")]
    #[case::bare_prefix("0x")]
    #[case::negative("-ff")]
    #[case::signed("+ff")]
    #[case::separator("f_f")]
    #[case::whitespace(" ff")]
    fn rejects_malformed_hex(#[case] text: &str) {
        assert!(matches!(decode_hex_biguint(text), Err(DecodeError::InvalidHexNumber(_))));
    }

    #[test]
    fn decodes_values_wider_than_256_bits() {
        let text = format!("0x1{}", "0".repeat(70));
        let value = decode_hex_biguint(&text).unwrap();
        assert_eq!(value.bits(), 281);
    }

    #[test]
    fn fixed_width_accepts_u256_max() {
        let max = BigUint::from_bytes_be(&[0xff; 32]);
        assert_eq!(to_fixed_width(&max, FeeField::GasFeeCap).unwrap(), U256::MAX);
        assert_eq!(to_fixed_width(&BigUint::ZERO, FeeField::GasFeeCap).unwrap(), U256::ZERO);
    }

    #[test]
    fn fixed_width_rejects_two_pow_256() {
        let value = BigUint::from(1u8) << 256u32;
        let err = to_fixed_width(&value, FeeField::GasTipCap).unwrap_err();
        assert_eq!(err, OverflowError { field: FeeField::GasTipCap, bits: 256 });
        assert_eq!(err.to_string(), "GasTipCap overflow: value does not fit in 256 bits");
    }

    #[test]
    fn wire_fee_narrows_to_u128() {
        let max = BigUint::from(u128::MAX);
        assert_eq!(to_wire_fee(&max, FeeField::BlobFeeCap).unwrap(), u128::MAX);

        let err = to_wire_fee(&(max + 1u8), FeeField::BlobFeeCap).unwrap_err();
        assert_eq!(err, OverflowError { field: FeeField::BlobFeeCap, bits: 128 });

        let value = BigUint::from(1u8) << 300u32;
        let err = to_wire_fee(&value, FeeField::GasFeeCap).unwrap_err();
        assert_eq!(err.bits, 256);
    }

    #[test]
    fn hex_biguint_json() {
        let value: HexBigUint = serde_json::from_str("\"0x2a\"").unwrap();
        assert_eq!(value, HexBigUint::from(42));
        assert_eq!(serde_json::to_string(&value).unwrap(), "\"0x2a\"");

        let err = serde_json::from_str::<HexBigUint>("\"zz\"").unwrap_err();
        assert!(err.to_string().contains("invalid hex number: zz"));

        // numbers must be transported as strings
        assert!(serde_json::from_str::<HexBigUint>("42").is_err());
    }
}
