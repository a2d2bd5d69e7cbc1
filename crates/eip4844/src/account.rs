//! Signing accounts.

use alloy::{
    primitives::{hex, Address, PrimitiveSignature, B256},
    signers::{local::PrivateKeySigner, SignerSync},
};

/// Account errors
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// the private key could not be parsed into a secp256k1 key
    #[error("invalid private key format: {0}")]
    InvalidKeyFormat(String),
    /// the signer failed to sign a well formed hash
    #[error("error signing: {0}")]
    Signing(#[from] alloy::signers::Error),
}

/// A spend authorized identity.
///
/// The address is derived from the private key when the account is created. The key is never
/// printed: `Debug` only shows the address.
#[derive(Clone)]
pub struct Account {
    signer: PrivateKeySigner,
    address: Address,
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account").field("address", &self.address).finish_non_exhaustive()
    }
}

impl Account {
    /// Create an account from a hex encoded secp256k1 private key. The `0x` prefix is
    /// optional.
    pub fn from_hex_key(hex_key: &str) -> Result<Self, Error> {
        let bytes = hex::decode(hex_key.trim())
            .map_err(|e| Error::InvalidKeyFormat(format!("not valid hex: {e}")))?;
        if bytes.len() != 32 {
            return Err(Error::InvalidKeyFormat(format!("expected 32 bytes, got {}", bytes.len())));
        }

        let signer = PrivateKeySigner::from_slice(&bytes)
            .map_err(|e| Error::InvalidKeyFormat(e.to_string()))?;

        Ok(Self::from_signer(signer))
    }

    /// Create an account from an existing signer.
    pub fn from_signer(signer: PrivateKeySigner) -> Self {
        let address = signer.address();
        Self { signer, address }
    }

    /// Address of the account.
    pub const fn address(&self) -> Address {
        self.address
    }

    /// Sign a 32 byte hash. Signatures are deterministic (RFC 6979).
    pub fn sign_hash(&self, hash: &B256) -> Result<PrimitiveSignature, Error> {
        self.signer.sign_hash_sync(hash).map_err(Into::into)
    }
}
