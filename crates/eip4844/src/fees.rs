//! Fee cap policy.

use num_bigint::BigUint;

/// Compute the recommended gas fee cap from the base fee and the tip cap:
///
/// ```text
/// fee_cap = tip_cap + 2 * base_fee
/// ```
///
/// Doubling the base fee leaves room for it to grow for several blocks between signing and
/// inclusion.
pub fn compute_fee_cap(base_fee: &BigUint, tip_cap: &BigUint) -> BigUint {
    tip_cap + (base_fee << 1u8)
}

/// Where the gas fee cap of a transaction comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeeCap {
    /// Use this fee cap as is.
    Exact(BigUint),
    /// Derive the fee cap from this base fee with [`compute_fee_cap`].
    FromBaseFee(BigUint),
}

impl FeeCap {
    /// Resolve the fee cap for a transaction tipping `tip_cap`.
    pub fn resolve(&self, tip_cap: &BigUint) -> BigUint {
        match self {
            Self::Exact(fee_cap) => fee_cap.clone(),
            Self::FromBaseFee(base_fee) => compute_fee_cap(base_fee, tip_cap),
        }
    }
}

impl From<BigUint> for FeeCap {
    fn from(fee_cap: BigUint) -> Self {
        Self::Exact(fee_cap)
    }
}
