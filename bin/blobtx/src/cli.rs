//! CLI for building blob transactions offline.
//!
//! Nothing is broadcast: `build` prints the raw signed transaction, ready for
//! `eth_sendRawTransaction`, and `inspect` checks a sidecar record reported by the node.

use alloy::primitives::{hex, Address, Bytes, B256};
use blobtx_eip4844::{
    account, codec, decode_hex_biguint, types, Account, BlobTxBuilder, BlobTxParams, BuildError,
    FeeCap, HexBigUint, KzgConfig, SidecarSubmissionRecord,
};
use clap::{Args, Parser, Subcommand};
use num_bigint::BigUint;
use serde::Serialize;
use std::{path::PathBuf, str::FromStr};
use tracing::instrument;

/// Env var holding the hex encoded private key of the sending account.
pub const ENV_PRIVATE_KEY: &str = "BLOBTX_PRIVATE_KEY";

/// Errors from the CLI
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// private key was not set
    #[error("environment variable {} must be set", ENV_PRIVATE_KEY)]
    PrivateKeyNotSet,
    /// private key was not valid
    #[error(transparent)]
    Account(#[from] account::Error),
    /// error loading the trusted setup
    #[error(transparent)]
    Kzg(#[from] blobtx_eip4844::kzg::Error),
    /// error building the transaction
    #[error(transparent)]
    Build(#[from] BuildError),
    /// payload was not valid hex
    #[error("payload was not valid hex: {0}")]
    PayloadHex(#[from] hex::FromHexError),
    /// error reading an input file
    #[error("reading {path}: {source}")]
    Read {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// malformed sidecar record
    #[error("malformed sidecar record: {0}")]
    Json(#[from] serde_json::Error),
    /// sidecar record fields could not be decoded
    #[error(transparent)]
    Record(#[from] types::Error),
    /// neither or both of two exclusive arguments were given
    #[error("exactly one of {0} or {1} must be given")]
    ExactlyOneOf(&'static str, &'static str),
    /// a recorded blob could not be decoded
    #[error("blob {index}: {source}")]
    Blob {
        /// Position of the blob in the sidecar.
        index: usize,
        /// Underlying error.
        source: codec::Error,
    },
}

/// Parse a non-negative integer given in decimal or `0x` prefixed hex. Signs are rejected.
fn parse_biguint(s: &str) -> Result<BigUint, String> {
    if s.starts_with("0x") {
        return decode_hex_biguint(s).map_err(|e| e.to_string());
    }

    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("invalid integer {s}: expected decimal digits or 0x prefixed hex"));
    }
    BigUint::from_str(s).map_err(|e| format!("invalid integer {s}: {e}"))
}

fn read_file(path: &PathBuf) -> Result<Vec<u8>, Error> {
    std::fs::read(path).map_err(|source| Error::Read { path: path.clone(), source })
}

/// Build blob transactions offline.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Opts {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build and sign a blob transaction carrying a payload. The key is read from
    /// `BLOBTX_PRIVATE_KEY`.
    Build(BuildArgs),
    /// Inspect a sidecar submission record.
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
struct BuildArgs {
    /// Chain ID the transaction is signed for.
    #[arg(long)]
    chain_id: u64,

    /// Gas limit.
    #[arg(long, default_value_t = 21_000)]
    gas_limit: u64,

    /// Max priority fee per gas, in wei.
    #[arg(long, value_parser = parse_biguint)]
    tip_cap: BigUint,

    #[command(flatten)]
    fee: FeeCapArgs,

    /// Max fee per blob gas, in wei.
    #[arg(long, value_parser = parse_biguint)]
    blob_fee_cap: BigUint,

    /// Recipient.
    #[arg(long, default_value_t = Address::ZERO)]
    to: Address,

    /// Account nonce.
    #[arg(long)]
    nonce: u64,

    #[command(flatten)]
    payload: PayloadArgs,

    /// KZG trusted setup file. Defaults to the Ethereum mainnet setup.
    #[arg(long)]
    trusted_setup: Option<PathBuf>,
}

/// Where the gas fee cap comes from.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct FeeCapArgs {
    /// Max fee per gas, in wei.
    #[arg(long, value_parser = parse_biguint)]
    fee_cap: Option<BigUint>,

    /// Base fee to derive the fee cap from, as `tip_cap + 2 * base_fee`.
    #[arg(long, value_parser = parse_biguint)]
    base_fee: Option<BigUint>,
}

impl FeeCapArgs {
    fn fee_cap(&self) -> Result<FeeCap, Error> {
        match (&self.fee_cap, &self.base_fee) {
            (Some(fee_cap), None) => Ok(FeeCap::Exact(fee_cap.clone())),
            (None, Some(base_fee)) => Ok(FeeCap::FromBaseFee(base_fee.clone())),
            _ => Err(Error::ExactlyOneOf("--fee-cap", "--base-fee")),
        }
    }
}

/// Where the payload comes from.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct PayloadArgs {
    /// File holding the payload.
    #[arg(long)]
    payload_file: Option<PathBuf>,

    /// Payload as hex.
    #[arg(long)]
    payload_hex: Option<String>,
}

impl PayloadArgs {
    fn read(&self) -> Result<Vec<u8>, Error> {
        match (&self.payload_file, &self.payload_hex) {
            (Some(path), None) => read_file(path),
            (None, Some(payload)) => hex::decode(payload).map_err(Into::into),
            _ => Err(Error::ExactlyOneOf("--payload-file", "--payload-hex")),
        }
    }
}

#[derive(Args, Debug)]
struct InspectArgs {
    /// JSON file holding a sidecar submission record.
    record: PathBuf,
}

/// Output of `build`.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct BuildOutput {
    /// Transaction hash.
    pub tx_hash: B256,
    /// Sender.
    pub from: Address,
    /// Nonce.
    pub nonce: u64,
    /// Versioned hashes of the blobs.
    pub blob_versioned_hashes: Vec<B256>,
    /// EIP-2718 network encoding, including the sidecar.
    pub raw_transaction: Bytes,
}

/// Output of `inspect`.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct InspectOutput {
    /// Block the transaction landed in.
    pub block_number: Option<HexBigUint>,
    /// Index of the transaction in the block.
    pub transaction_index: Option<u64>,
    /// Transaction hash.
    pub tx_hash: Option<B256>,
    /// Versioned hashes recomputed from the recorded commitments.
    pub blob_versioned_hashes: Vec<B256>,
    /// Decoded payload length of each recorded blob.
    pub payload_lengths: Vec<usize>,
}

impl BuildArgs {
    fn params(&self) -> Result<BlobTxParams, Error> {
        Ok(BlobTxParams {
            chain_id: self.chain_id,
            gas_limit: self.gas_limit,
            gas_tip_cap: self.tip_cap.clone(),
            gas_fee_cap: self.fee.fee_cap()?,
            blob_fee_cap: self.blob_fee_cap.clone(),
            to: self.to,
            nonce: self.nonce,
        })
    }

    fn execute(&self, account: &Account) -> Result<BuildOutput, Error> {
        let builder =
            BlobTxBuilder::from_config(&KzgConfig { trusted_setup: self.trusted_setup.clone() })?;
        let payload = self.payload.read()?;
        let signed = builder.build(account, &self.params()?, &payload)?;

        Ok(BuildOutput {
            tx_hash: signed.tx_hash(),
            from: account.address(),
            nonce: signed.nonce(),
            blob_versioned_hashes: signed.blob_versioned_hashes().to_vec(),
            raw_transaction: signed.encoded_2718().into(),
        })
    }
}

impl InspectArgs {
    fn execute(&self) -> Result<InspectOutput, Error> {
        let record: SidecarSubmissionRecord = serde_json::from_slice(&read_file(&self.record)?)?;

        let payload_lengths = record
            .sidecar
            .iter()
            .flat_map(|sidecar| sidecar.blobs.iter().flatten())
            .enumerate()
            .map(|(index, blob)| {
                codec::decode(blob).map(|p| p.len()).map_err(|source| Error::Blob { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(InspectOutput {
            transaction_index: record.transaction_index()?,
            blob_versioned_hashes: record.blob_versioned_hashes(),
            block_number: record.block_number,
            tx_hash: record.tx_hash,
            payload_lengths,
        })
    }
}

fn account_from_env() -> Result<Account, Error> {
    dotenvy::dotenv().ok();
    let secret = std::env::var(ENV_PRIVATE_KEY).map_err(|_| Error::PrivateKeyNotSet)?;
    Account::from_hex_key(&secret).map_err(Into::into)
}

/// Command line interface for building blob transactions.
#[derive(Debug)]
pub struct Cli;

impl Cli {
    /// Run the CLI
    #[instrument]
    pub fn run() -> Result<(), Error> {
        let opts = Opts::parse();

        let json = match opts.command {
            Command::Build(args) => {
                let account = account_from_env()?;
                tracing::info!(from = %account.address(), "building blob transaction");
                serde_json::to_string_pretty(&args.execute(&account)?)?
            }
            Command::Inspect(args) => serde_json::to_string_pretty(&args.execute()?)?,
        };

        println!("{json}");
        Ok(())
    }
}
