//! KZG commitments and proofs for encoded blobs.
//!
//! ref: https://github.com/ethereum/consensus-specs/blob/86fb82b221474cc89387fa6436806507b3849d88/specs/deneb/polynomial-commitments.md

use crate::codec;
use alloy::{
    consensus::{BlobTransactionSidecar, EnvKzgSettings},
    eips::eip4844::{kzg_to_versioned_hash, Blob, Bytes48},
    primitives::B256,
};
use c_kzg::{KzgCommitment, KzgProof, KzgSettings};
use std::{path::PathBuf, sync::Arc};

/// Errors for this module.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// kzg blobs error
    #[error("kzg blobs: {0}")]
    Kzg(#[from] c_kzg::Error),
    /// error generating a kzg proof for a blob
    #[error("error generating blob proof: {0}")]
    ProofGen(c_kzg::Error),
    /// error generating a commitment to a blob
    #[error("error generating blob commitment: {0}")]
    CommitmentGen(c_kzg::Error),
    /// error loading a trusted setup file
    #[error("error loading trusted setup {path}: {source}")]
    TrustedSetup {
        /// Path of the trusted setup file.
        path: PathBuf,
        /// Underlying error.
        source: c_kzg::Error,
    },
}

/// Trusted setup configuration.
#[derive(Debug, Clone, Default)]
pub struct KzgConfig {
    /// Path to a trusted setup file. The Ethereum mainnet setup bundled with `c-kzg` is used
    /// when this is `None`.
    pub trusted_setup: Option<PathBuf>,
}

/// A blob with its commitment and proof.
///
/// All three are computed from the same blob; the fields are only set by
/// [`BlobCommitter::commit`]. The blob stays boxed from encoding to the sidecar.
#[derive(Clone, PartialEq, Eq)]
pub struct BlobCommitmentSet {
    blob: Box<Blob>,
    commitment: Bytes48,
    proof: Bytes48,
}

impl std::fmt::Debug for BlobCommitmentSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobCommitmentSet")
            .field("commitment", &self.commitment)
            .field("proof", &self.proof)
            .finish_non_exhaustive()
    }
}

impl BlobCommitmentSet {
    /// The committed blob.
    pub fn blob(&self) -> &Blob {
        &self.blob
    }

    /// The KZG commitment to the blob.
    pub const fn commitment(&self) -> &Bytes48 {
        &self.commitment
    }

    /// The KZG blob proof.
    pub const fn proof(&self) -> &Bytes48 {
        &self.proof
    }

    /// Versioned hash of the commitment, as referenced by the transaction.
    pub fn versioned_hash(&self) -> B256 {
        kzg_to_versioned_hash(self.commitment.as_slice())
    }

    /// Build a sidecar carrying exactly this blob, commitment and proof.
    pub fn into_sidecar(self) -> BlobTransactionSidecar {
        let mut blobs = Vec::with_capacity(1);
        blobs.push(*self.blob);
        BlobTransactionSidecar::new(blobs, vec![self.commitment], vec![self.proof])
    }
}

/// Computes commitments and proofs against a trusted setup.
#[derive(Debug, Clone)]
pub struct BlobCommitter {
    kzg_settings: EnvKzgSettings,
}

impl Default for BlobCommitter {
    fn default() -> Self {
        Self::new(EnvKzgSettings::Default)
    }
}

impl BlobCommitter {
    /// Create a new instance of [`Self`].
    pub const fn new(kzg_settings: EnvKzgSettings) -> Self {
        Self { kzg_settings }
    }

    /// Create a new instance of [`Self`], loading the trusted setup named by `config`.
    pub fn from_config(config: &KzgConfig) -> Result<Self, Error> {
        let Some(path) = &config.trusted_setup else {
            return Ok(Self::default());
        };

        let settings = KzgSettings::load_trusted_setup_file(path)
            .map_err(|source| Error::TrustedSetup { path: path.clone(), source })?;
        tracing::info!(path = %path.display(), "loaded kzg trusted setup");

        Ok(Self::new(EnvKzgSettings::Custom(Arc::new(settings))))
    }

    /// Commit to `blob` and compute its blob proof.
    ///
    /// Note that computing the proof is CPU heavy; async callers should run this on a
    /// blocking thread.
    pub fn commit(&self, blob: Box<Blob>) -> Result<BlobCommitmentSet, Error> {
        commit(blob, self.kzg_settings.get())
    }

    /// Check that the proof in `set` opens its commitment against its blob.
    pub fn verify(&self, set: &BlobCommitmentSet) -> Result<bool, Error> {
        let blob = codec::to_kzg_blob(&set.blob)?;
        let commitment = c_kzg::Bytes48::from_bytes(set.commitment.as_slice())?;
        let proof = c_kzg::Bytes48::from_bytes(set.proof.as_slice())?;

        KzgProof::verify_blob_kzg_proof(&blob, &commitment, &proof, self.kzg_settings.get())
            .map_err(Into::into)
    }
}

fn commit(blob: Box<Blob>, settings: &KzgSettings) -> Result<BlobCommitmentSet, Error> {
    let kzg_blob = codec::to_kzg_blob(&blob)?;
    let commitment = KzgCommitment::blob_to_kzg_commitment(&kzg_blob, settings)
        .map_err(Error::CommitmentGen)?;
    let commitment = commitment.to_bytes();
    let proof = KzgProof::compute_blob_kzg_proof(&kzg_blob, &commitment, settings)
        .map_err(Error::ProofGen)?;

    Ok(BlobCommitmentSet {
        blob,
        commitment: Bytes48::from(commitment.into_inner()),
        proof: Bytes48::from(proof.to_bytes().into_inner()),
    })
}
