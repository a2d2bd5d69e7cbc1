//! JSON shapes for reporting submitted blob sidecars.

use crate::numeric::{decode_hex_biguint, DecodeError, HexBigUint};
use alloy::{
    consensus::BlobTransactionSidecar,
    eips::eip4844::{kzg_to_versioned_hash, Blob, Bytes48},
    primitives::B256,
};
use serde::{Deserialize, Serialize};

/// Errors converting records.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// the record is missing blobs, commitments or proofs
    #[error("sidecar record is missing {0}")]
    MissingField(&'static str),
    /// blobs, commitments and proofs differ in length
    #[error(
        "sidecar record lengths differ: {blobs} blobs, {commitments} commitments, {proofs} proofs"
    )]
    LengthMismatch {
        /// Number of blobs.
        blobs: usize,
        /// Number of commitments.
        commitments: usize,
        /// Number of proofs.
        proofs: usize,
    },
    /// the transaction index is not a hex number
    #[error("invalid transaction index: {0}")]
    TxIndex(#[from] DecodeError),
    /// the transaction index does not fit a `u64`
    #[error("transaction index out of range: {0}")]
    TxIndexRange(String),
}

/// Blobs, commitments and proofs of a submitted sidecar. Every part is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobSidecarRecord {
    /// Blobs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blobs: Option<Vec<Blob>>,
    /// KZG commitments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commitments: Option<Vec<Bytes48>>,
    /// KZG proofs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proofs: Option<Vec<Bytes48>>,
}

impl BlobSidecarRecord {
    /// Versioned hashes of the recorded commitments, in order.
    pub fn blob_versioned_hashes(&self) -> Vec<B256> {
        self.commitments
            .iter()
            .flatten()
            .map(|commitment| kzg_to_versioned_hash(commitment.as_slice()))
            .collect()
    }

    /// Convert into a sidecar. Blobs, commitments and proofs must all be present and of the
    /// same length.
    pub fn into_sidecar(self) -> Result<BlobTransactionSidecar, Error> {
        let blobs = self.blobs.ok_or(Error::MissingField("blobs"))?;
        let commitments = self.commitments.ok_or(Error::MissingField("commitments"))?;
        let proofs = self.proofs.ok_or(Error::MissingField("proofs"))?;

        if blobs.len() != commitments.len() || blobs.len() != proofs.len() {
            return Err(Error::LengthMismatch {
                blobs: blobs.len(),
                commitments: commitments.len(),
                proofs: proofs.len(),
            });
        }

        Ok(BlobTransactionSidecar::new(blobs, commitments, proofs))
    }
}

impl From<&BlobTransactionSidecar> for BlobSidecarRecord {
    fn from(sidecar: &BlobTransactionSidecar) -> Self {
        Self {
            blobs: Some(sidecar.blobs.clone()),
            commitments: Some(sidecar.commitments.clone()),
            proofs: Some(sidecar.proofs.clone()),
        }
    }
}

/// A blob sidecar and where its transaction landed on chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SidecarSubmissionRecord {
    /// The submitted sidecar.
    #[serde(default, rename = "blobSidecar", skip_serializing_if = "Option::is_none")]
    pub sidecar: Option<BlobSidecarRecord>,
    /// Block the transaction was included in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<HexBigUint>,
    /// Hash of that block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_hash: Option<String>,
    /// Index of the transaction in the block, hex encoded.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tx_index: String,
    /// Transaction hash.
    #[serde(default)]
    pub tx_hash: Option<B256>,
}

impl SidecarSubmissionRecord {
    /// Decode the transaction index. `None` when the record carries no index.
    pub fn transaction_index(&self) -> Result<Option<u64>, Error> {
        if self.tx_index.is_empty() {
            return Ok(None);
        }

        let index = decode_hex_biguint(&self.tx_index)?;
        u64::try_from(&index).map(Some).map_err(|_| Error::TxIndexRange(self.tx_index.clone()))
    }

    /// Versioned hashes of the recorded commitments, empty without a sidecar.
    pub fn blob_versioned_hashes(&self) -> Vec<B256> {
        self.sidecar.as_ref().map(BlobSidecarRecord::blob_versioned_hashes).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{codec, kzg::BlobCommitter};
    use alloy::primitives::b256;

    const TX_HASH: B256 = b256!("4e012b119391bdc192653bfee9758c432ea6f35ff23f8af60a7dca4664383dfc");

    #[test]
    fn deserializes_placement() {
        let json = r#"{
            "blockNumber": "0x10",
            "blockHash": "0xabc",
            "txIndex": "0x2",
            "txHash": "0x4e012b119391bdc192653bfee9758c432ea6f35ff23f8af60a7dca4664383dfc"
        }"#;

        let record: SidecarSubmissionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.sidecar, None);
        assert_eq!(record.block_number, Some(HexBigUint::from(16)));
        assert_eq!(record.block_hash.as_deref(), Some("0xabc"));
        assert_eq!(record.transaction_index().unwrap(), Some(2));
        assert_eq!(record.tx_hash, Some(TX_HASH));
        assert!(record.blob_versioned_hashes().is_empty());
    }

    #[test]
    fn rejects_malformed_block_number() {
        let json = r#"{"blockNumber": "0xnope", "txHash": null}"#;
        let err = serde_json::from_str::<SidecarSubmissionRecord>(json).unwrap_err();
        assert!(err.to_string().contains("invalid hex number"));
    }

    #[test]
    fn omits_absent_fields() {
        let record = SidecarSubmissionRecord::default();
        assert_eq!(serde_json::to_string(&record).unwrap(), r#"{"txHash":null}"#);

        let record = SidecarSubmissionRecord {
            sidecar: Some(BlobSidecarRecord::default()),
            block_number: Some(HexBigUint::from(255)),
            tx_index: "0x0".to_string(),
            tx_hash: Some(TX_HASH),
            ..Default::default()
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["blobSidecar"], serde_json::json!({}));
        assert_eq!(json["blockNumber"], "0xff");
        assert_eq!(json["txIndex"], "0x0");
        assert!(json.get("blockHash").is_none());
    }

    #[test]
    fn transaction_index() {
        let mut record = SidecarSubmissionRecord::default();
        assert_eq!(record.transaction_index().unwrap(), None);

        record.tx_index = "garbage".to_string();
        assert!(matches!(record.transaction_index(), Err(Error::TxIndex(_))));

        record.tx_index = format!("0x1{}", "0".repeat(16));
        assert!(matches!(record.transaction_index(), Err(Error::TxIndexRange(_))));
    }

    #[test]
    fn sidecar_record_round_trip() {
        let set = BlobCommitter::default().commit(codec::encode(b"hello").unwrap()).unwrap();
        let hash = set.versioned_hash();
        let sidecar = set.into_sidecar();

        let record = SidecarSubmissionRecord {
            sidecar: Some(BlobSidecarRecord::from(&sidecar)),
            tx_hash: Some(TX_HASH),
            ..Default::default()
        };
        let json = serde_json::to_string(&record).unwrap();
        let decoded: SidecarSubmissionRecord = serde_json::from_str(&json).unwrap();

        assert_eq!(decoded.blob_versioned_hashes(), vec![hash]);
        assert_eq!(decoded.sidecar.unwrap().into_sidecar().unwrap(), sidecar);
    }

    #[test]
    fn incomplete_sidecar_record() {
        let record = BlobSidecarRecord { blobs: Some(vec![]), ..Default::default() };
        assert_eq!(record.into_sidecar().unwrap_err(), Error::MissingField("commitments"));

        let record = BlobSidecarRecord {
            blobs: Some(vec![]),
            commitments: Some(vec![Bytes48::ZERO]),
            proofs: Some(vec![]),
        };
        assert!(matches!(record.into_sidecar(), Err(Error::LengthMismatch { .. })));
    }
}
