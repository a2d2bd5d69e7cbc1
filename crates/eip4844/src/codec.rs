//! Version 0 blob encoding.
//!
//! A blob holds 4096 field elements of 32 bytes each. The encoding runs 1024 rounds; every
//! round takes 127 bytes of a logical stream and spreads them over 4 field elements. Each
//! element carries 31 bytes verbatim in bytes 1..32, and its first byte carries 6 bits of the
//! 3 remaining bytes of the round. The two high bits of every first byte are zero, so each
//! element is a canonical BLS12-381 scalar.
//!
//! The logical stream is `[version, len_u24_be, ..payload, ..zero padding]`.
//!
//! ref: <https://github.com/ethereum-optimism/specs/blob/main/specs/protocol/derivation.md#blob-encoding>

use alloy::eips::eip4844::{Blob, BYTES_PER_BLOB};

/// Encoding version written to the first byte of the stream.
pub const ENCODING_VERSION: u8 = 0;

/// Blob offset of the version byte.
pub const VERSION_OFFSET: usize = 1;

/// Number of encode rounds per blob.
pub const ROUNDS: usize = 1024;

/// Bytes of the logical stream consumed per round.
const BYTES_PER_ROUND: usize = 4 * 31 + 3;

/// Version and length prefix of the logical stream.
const HEADER_LEN: usize = 4;

const FIELD_ELEMENT_LEN: usize = 32;

/// Maximum payload length that fits into one blob.
pub const MAX_BLOB_DATA_SIZE: usize = BYTES_PER_ROUND * ROUNDS - HEADER_LEN;

// The stream offsets of the 3 bytes that get split into 6 bit chunks.
const SPLIT_X: usize = 31;
const SPLIT_Y: usize = 63;
const SPLIT_Z: usize = 95;

const LOW_6_BITS: u8 = 0b0011_1111;
const HIGH_2_BITS: u8 = 0b1100_0000;

/// Blob codec errors.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// payload does not fit into one blob
    #[error("blob input too large: len={len}, max={max}")]
    InputTooLarge {
        /// Payload length.
        len: usize,
        /// Blob capacity.
        max: usize,
    },
    /// blob carries an unknown encoding version
    #[error("invalid blob encoding version: expected {ENCODING_VERSION}, got {0}")]
    InvalidVersion(u8),
    /// blob declares a payload larger than its capacity
    #[error("invalid blob length: {0}")]
    InvalidLength(usize),
    /// a field element has one of its two high bits set
    #[error("invalid field element: {0}")]
    InvalidFieldElement(usize),
    /// non zero bytes follow the declared payload
    #[error("non-zero data at stream offset {0} beyond the declared length")]
    TrailingData(usize),
}

/// Encode `data` into a single blob.
///
/// A blob is 128 KiB, so it is returned boxed and never held on the stack.
pub fn encode(data: &[u8]) -> Result<Box<Blob>, Error> {
    if data.len() > MAX_BLOB_DATA_SIZE {
        return Err(Error::InputTooLarge { len: data.len(), max: MAX_BLOB_DATA_SIZE });
    }

    let mut blob = Box::<Blob>::default();
    if data.is_empty() {
        return Ok(blob);
    }

    // The length check above keeps the length within 3 bytes.
    let len = (data.len() as u32).to_be_bytes();
    let mut stream = vec![0u8; BYTES_PER_ROUND * ROUNDS];
    stream[0] = ENCODING_VERSION;
    stream[1..HEADER_LEN].copy_from_slice(&len[1..]);
    stream[HEADER_LEN..HEADER_LEN + data.len()].copy_from_slice(data);

    let rounds_used = (HEADER_LEN + data.len()).div_ceil(BYTES_PER_ROUND);
    let chunks =
        stream.chunks_exact(BYTES_PER_ROUND).zip(blob.chunks_exact_mut(BYTES_PER_ROUND + 1));
    for (chunk, out) in chunks.take(rounds_used) {
        encode_round(chunk, out);
    }

    Ok(blob)
}

/// Pack 127 stream bytes into 4 field elements.
fn encode_round(chunk: &[u8], out: &mut [u8]) {
    let (x, y, z) = (chunk[SPLIT_X], chunk[SPLIT_Y], chunk[SPLIT_Z]);

    let heads = [
        x & LOW_6_BITS,
        (y & 0b0000_1111) | ((x & HIGH_2_BITS) >> 2),
        z & LOW_6_BITS,
        ((z & HIGH_2_BITS) >> 2) | ((y & 0b1111_0000) >> 4),
    ];
    let bodies = [&chunk[0..31], &chunk[32..63], &chunk[64..95], &chunk[96..127]];

    for ((fe, head), body) in out.chunks_exact_mut(FIELD_ELEMENT_LEN).zip(heads).zip(bodies) {
        fe[0] = head;
        fe[1..].copy_from_slice(body);
    }
}

/// Decode the payload carried by `blob`.
pub fn decode(blob: &Blob) -> Result<Vec<u8>, Error> {
    let version = blob[VERSION_OFFSET];
    if version != ENCODING_VERSION {
        return Err(Error::InvalidVersion(version));
    }

    let mut stream = vec![0u8; BYTES_PER_ROUND * ROUNDS];
    let rounds =
        blob.chunks_exact(BYTES_PER_ROUND + 1).zip(stream.chunks_exact_mut(BYTES_PER_ROUND));
    for (round, (input, chunk)) in rounds.enumerate() {
        decode_round(round, input, chunk)?;
    }

    let len =
        (usize::from(stream[1]) << 16) | (usize::from(stream[2]) << 8) | usize::from(stream[3]);
    if len > MAX_BLOB_DATA_SIZE {
        return Err(Error::InvalidLength(len));
    }

    let end = HEADER_LEN + len;
    if let Some(offset) = stream[end..].iter().position(|b| *b != 0) {
        return Err(Error::TrailingData(end + offset));
    }

    stream.truncate(end);
    stream.drain(..HEADER_LEN);
    Ok(stream)
}

/// Unpack 4 field elements into 127 stream bytes.
fn decode_round(round: usize, input: &[u8], chunk: &mut [u8]) -> Result<(), Error> {
    let mut heads = [0u8; 4];
    for (i, fe) in input.chunks_exact(FIELD_ELEMENT_LEN).enumerate() {
        if fe[0] & HIGH_2_BITS != 0 {
            return Err(Error::InvalidFieldElement(round * 4 + i));
        }
        heads[i] = fe[0];
        let start = i * FIELD_ELEMENT_LEN;
        chunk[start..start + 31].copy_from_slice(&fe[1..]);
    }

    chunk[SPLIT_X] = (heads[0] & LOW_6_BITS) | ((heads[1] & 0b0011_0000) << 2);
    chunk[SPLIT_Y] = (heads[1] & 0b0000_1111) | ((heads[3] & 0b0000_1111) << 4);
    chunk[SPLIT_Z] = (heads[2] & LOW_6_BITS) | ((heads[3] & 0b0011_0000) << 2);

    Ok(())
}

/// Copy `blob` into the commitment library's blob type.
pub fn to_kzg_blob(blob: &Blob) -> Result<Box<c_kzg::Blob>, c_kzg::Error> {
    c_kzg::Blob::from_bytes(blob.as_slice()).map(Box::new)
}

const _: () = assert!((BYTES_PER_ROUND + 1) * ROUNDS == BYTES_PER_BLOB);
