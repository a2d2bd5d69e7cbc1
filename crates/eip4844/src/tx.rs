//! Blob transaction assembly and signing.

use crate::{
    account::{self, Account},
    codec,
    fees::FeeCap,
    kzg::{self, BlobCommitter, KzgConfig},
    numeric::{to_wire_fee, FeeField, OverflowError},
};
use alloy::{
    consensus::{
        BlobTransactionSidecar, SignableTransaction, Signed, TxEip4844, TxEip4844Variant,
        TxEip4844WithSidecar, TxEnvelope,
    },
    eips::{eip2718::Encodable2718, eip2930::AccessList},
    primitives::{Address, Bytes, ChainId, PrimitiveSignature, B256, U256},
};
use num_bigint::BigUint;
use tracing::{debug, info, instrument};

/// Errors building a blob transaction. Each variant names the step that failed.
#[derive(thiserror::Error, Debug)]
pub enum BuildError {
    /// payload could not be encoded into a blob
    #[error("payload encoding: {0}")]
    PayloadEncoding(#[from] codec::Error),
    /// commitment or proof generation rejected the blob
    #[error("blob commitment: {0}")]
    Commitment(#[from] kzg::Error),
    /// a fee cap does not fit the message
    #[error("failed to create blob transaction: {0}")]
    Overflow(#[from] OverflowError),
    /// signing the message failed
    #[error("signing: {0}")]
    Signing(#[from] account::Error),
}

/// Parameters of a blob transaction, apart from the payload and the signing account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobTxParams {
    /// Chain the transaction is valid on.
    pub chain_id: ChainId,
    /// Gas limit.
    pub gas_limit: u64,
    /// Max priority fee per gas.
    pub gas_tip_cap: BigUint,
    /// Max fee per gas, exact or derived from a base fee.
    pub gas_fee_cap: FeeCap,
    /// Max fee per blob gas.
    pub blob_fee_cap: BigUint,
    /// Recipient.
    pub to: Address,
    /// Account nonce.
    pub nonce: u64,
}

/// Builds signed blob transactions.
#[derive(Debug, Clone, Default)]
pub struct BlobTxBuilder {
    committer: BlobCommitter,
}

impl BlobTxBuilder {
    /// Create a new instance of [`Self`].
    pub const fn new(committer: BlobCommitter) -> Self {
        Self { committer }
    }

    /// Create a new instance of [`Self`] with the trusted setup named by `config`.
    pub fn from_config(config: &KzgConfig) -> Result<Self, kzg::Error> {
        BlobCommitter::from_config(config).map(Self::new)
    }

    /// Build a transaction carrying `payload` in a single blob and sign it with `account`.
    ///
    /// The payload travels only in the sidecar: the message has no call data and transfers no
    /// value. Nothing is signed unless every step before signing succeeds.
    #[instrument(
        skip_all,
        fields(chain_id = params.chain_id, nonce = params.nonce, payload_len = payload.len())
    )]
    pub fn build(
        &self,
        account: &Account,
        params: &BlobTxParams,
        payload: &[u8],
    ) -> Result<SignedBlobTransaction, BuildError> {
        let blob = codec::encode(payload)?;
        let commitment_set = self.committer.commit(blob)?;
        debug!(commitment = %commitment_set.commitment(), "computed blob commitment and proof");

        let sidecar = commitment_set.into_sidecar();
        let blob_versioned_hashes: Vec<B256> = sidecar.versioned_hashes().collect();

        let max_priority_fee_per_gas = to_wire_fee(&params.gas_tip_cap, FeeField::GasTipCap)?;
        let gas_fee_cap = params.gas_fee_cap.resolve(&params.gas_tip_cap);
        let max_fee_per_gas = to_wire_fee(&gas_fee_cap, FeeField::GasFeeCap)?;
        let max_fee_per_blob_gas = to_wire_fee(&params.blob_fee_cap, FeeField::BlobFeeCap)?;
        debug!(max_priority_fee_per_gas, max_fee_per_gas, max_fee_per_blob_gas, "fee caps");

        let tx = TxEip4844 {
            chain_id: params.chain_id,
            nonce: params.nonce,
            gas_limit: params.gas_limit,
            max_fee_per_gas,
            max_priority_fee_per_gas,
            to: params.to,
            value: U256::ZERO,
            access_list: AccessList::default(),
            blob_versioned_hashes,
            max_fee_per_blob_gas,
            input: Bytes::new(),
        };
        let message = TxEip4844WithSidecar::from_tx_and_sidecar(tx, sidecar);

        let signature = account.sign_hash(&message.signature_hash())?;
        let signed = message.into_signed(signature);

        info!(
            tx_hash = %signed.hash(),
            from = %account.address(),
            to = %params.to,
            "signed blob transaction"
        );

        Ok(SignedBlobTransaction { inner: signed })
    }
}

/// Build and sign a blob transaction using the bundled Ethereum trusted setup.
pub fn build_blob_transaction(
    account: &Account,
    params: &BlobTxParams,
    payload: &[u8],
) -> Result<SignedBlobTransaction, BuildError> {
    BlobTxBuilder::default().build(account, params, payload)
}

/// A signed blob transaction together with its sidecar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedBlobTransaction {
    inner: Signed<TxEip4844WithSidecar>,
}

impl SignedBlobTransaction {
    /// Transaction hash.
    pub fn tx_hash(&self) -> B256 {
        *self.inner.hash()
    }

    /// The signed message.
    pub fn message(&self) -> &TxEip4844 {
        &self.inner.tx().tx
    }

    /// The blobs, commitments and proofs backing the message's blob hashes.
    pub fn sidecar(&self) -> &BlobTransactionSidecar {
        &self.inner.tx().sidecar
    }

    /// Chain id the signature is scoped to.
    pub fn chain_id(&self) -> ChainId {
        self.message().chain_id
    }

    /// Account nonce.
    pub fn nonce(&self) -> u64 {
        self.message().nonce
    }

    /// Versioned hashes of the sidecar's commitments.
    pub fn blob_versioned_hashes(&self) -> &[B256] {
        &self.message().blob_versioned_hashes
    }

    /// Signature over the message.
    pub fn signature(&self) -> &PrimitiveSignature {
        self.inner.signature()
    }

    /// Recover the address that signed the message.
    pub fn recover_signer(&self) -> Result<Address, alloy::primitives::SignatureError> {
        self.inner.recover_signer()
    }

    /// EIP-2718 network encoding, including the sidecar. This is the payload for
    /// `eth_sendRawTransaction`.
    pub fn encoded_2718(&self) -> Vec<u8> {
        self.clone().into_envelope().encoded_2718()
    }

    /// Convert into a transaction envelope.
    pub fn into_envelope(self) -> TxEnvelope {
        let (tx, signature, hash) = self.inner.into_parts();
        TxEnvelope::Eip4844(Signed::new_unchecked(TxEip4844Variant::from(tx), signature, hash))
    }

    /// Take the inner signed transaction.
    pub fn into_inner(self) -> Signed<TxEip4844WithSidecar> {
        self.inner
    }
}
