//! Build and sign EIP-4844 blob transactions.
//!
//! A payload is encoded into a single blob, committed to with KZG, and carried in the sidecar
//! of a signed type 3 transaction. Submitting the transaction and querying chain state (nonce,
//! base fee) are left to the caller.
//!
//! ```no_run
//! use blobtx_eip4844::{build_blob_transaction, Account, BlobTxParams, FeeCap};
//! use num_bigint::BigUint;
//!
//! let account = Account::from_hex_key(&std::env::var("BLOBTX_PRIVATE_KEY").unwrap()).unwrap();
//! let params = BlobTxParams {
//!     chain_id: 1,
//!     gas_limit: 100_000,
//!     gas_tip_cap: BigUint::from(1_000_000_000u64),
//!     gas_fee_cap: FeeCap::FromBaseFee(BigUint::from(20_000_000_000u64)),
//!     blob_fee_cap: BigUint::from(1_000_000_000u64),
//!     to: alloy::primitives::Address::ZERO,
//!     nonce: 0,
//! };
//! let signed = build_blob_transaction(&account, &params, b"hello").unwrap();
//! let raw = signed.encoded_2718();
//! ```

pub mod account;
pub mod codec;
pub mod fees;
pub mod kzg;
pub mod numeric;
pub mod tx;
pub mod types;

pub use account::Account;
pub use codec::MAX_BLOB_DATA_SIZE;
pub use fees::{compute_fee_cap, FeeCap};
pub use kzg::{BlobCommitmentSet, BlobCommitter, KzgConfig};
pub use numeric::{decode_hex_biguint, to_fixed_width, FeeField, HexBigUint, OverflowError};
pub use tx::{
    build_blob_transaction, BlobTxBuilder, BlobTxParams, BuildError, SignedBlobTransaction,
};
pub use types::{BlobSidecarRecord, SidecarSubmissionRecord};
