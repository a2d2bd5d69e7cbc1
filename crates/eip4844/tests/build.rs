use alloy::{
    eips::eip4844::{kzg_to_versioned_hash, Bytes48},
    primitives::{b256, fixed_bytes, Address, B256},
};
use blobtx_eip4844::{
    build_blob_transaction, codec, compute_fee_cap, Account, BlobCommitter, BlobTxBuilder,
    BlobTxParams, BuildError, FeeCap, FeeField, OverflowError, MAX_BLOB_DATA_SIZE,
};
use blobtx_test_utils::{test_payload, DEV_PRIVATE_KEY, DEV_PRIVATE_KEY_2};
use num_bigint::BigUint;
use std::{sync::Arc, thread};

/// KZG commitment to the version 0 encoding of `b"hello"` under the mainnet trusted setup.
const HELLO_COMMITMENT: Bytes48 = fixed_bytes!(
    "aafc074b87d80562509ddc1a97fd37bf7fdb035fa195980f9178e6f5eb1a4d2f829f377cddd24fa288a04e9b922838d6"
);

/// Versioned hash of [`HELLO_COMMITMENT`].
const HELLO_BLOB_HASH: B256 =
    b256!("015335c5e31a15350dd77839e3e9ebdd5e016b740ed0576ea295ef4165128b75");

/// Rust's default stack size for spawned threads.
const DEFAULT_THREAD_STACK: usize = 2 << 20;

fn params(nonce: u64) -> BlobTxParams {
    BlobTxParams {
        chain_id: 1,
        gas_limit: 100_000,
        gas_tip_cap: BigUint::from(1u64),
        gas_fee_cap: FeeCap::Exact(BigUint::from(3u64)),
        blob_fee_cap: BigUint::from(1u64),
        to: Address::ZERO,
        nonce,
    }
}

#[test]
fn hello_blob_transaction() {
    blobtx_test_utils::test_tracing();

    let account = Account::from_hex_key(DEV_PRIVATE_KEY).unwrap();
    let signed = build_blob_transaction(&account, &params(0), b"hello").unwrap();

    assert_eq!(signed.recover_signer().unwrap(), account.address());
    assert_eq!(signed.chain_id(), 1);
    assert_eq!(signed.nonce(), 0);

    assert_eq!(signed.blob_versioned_hashes(), &[HELLO_BLOB_HASH]);
    assert_eq!(signed.sidecar().commitments, vec![HELLO_COMMITMENT]);

    let expected = BlobCommitter::default().commit(codec::encode(b"hello").unwrap()).unwrap();
    assert_eq!(expected.versioned_hash(), HELLO_BLOB_HASH);
    assert_eq!(signed.sidecar().proofs, vec![*expected.proof()]);
    assert!(BlobCommitter::default().verify(&expected).unwrap());
}

#[test]
fn builds_on_default_sized_thread() {
    let account = Account::from_hex_key(DEV_PRIVATE_KEY).unwrap();
    let payload = test_payload(MAX_BLOB_DATA_SIZE);

    let signed = thread::Builder::new()
        .stack_size(DEFAULT_THREAD_STACK)
        .spawn(move || build_blob_transaction(&account, &params(0), &payload))
        .unwrap()
        .join()
        .unwrap()
        .unwrap();
    assert_eq!(signed.blob_versioned_hashes().len(), 1);
}

#[test]
fn each_key_signs_as_its_own_account() {
    let first = Account::from_hex_key(DEV_PRIVATE_KEY).unwrap();
    let second = Account::from_hex_key(DEV_PRIVATE_KEY_2).unwrap();
    assert_ne!(first.address(), second.address());

    let a = build_blob_transaction(&first, &params(0), b"hello").unwrap();
    let b = build_blob_transaction(&second, &params(0), b"hello").unwrap();

    assert_eq!(a.recover_signer().unwrap(), first.address());
    assert_eq!(b.recover_signer().unwrap(), second.address());
    assert_ne!(a.tx_hash(), b.tx_hash());
    assert_eq!(a.blob_versioned_hashes(), b.blob_versioned_hashes());
}

#[test]
fn hashes_follow_sidecar_commitments() {
    let account = Account::from_hex_key(DEV_PRIVATE_KEY).unwrap();
    let payload = test_payload(MAX_BLOB_DATA_SIZE);
    let signed = build_blob_transaction(&account, &params(7), &payload).unwrap();

    let from_sidecar: Vec<_> = signed
        .sidecar()
        .commitments
        .iter()
        .map(|commitment| kzg_to_versioned_hash(commitment.as_slice()))
        .collect();
    assert_eq!(signed.blob_versioned_hashes(), from_sidecar.as_slice());
    assert_eq!(codec::decode(&signed.sidecar().blobs[0]).unwrap(), payload);
}

#[test]
fn failed_builds_produce_nothing() {
    let account = Account::from_hex_key(DEV_PRIVATE_KEY).unwrap();

    let too_large = test_payload(MAX_BLOB_DATA_SIZE + 1);
    assert!(matches!(
        build_blob_transaction(&account, &params(0), &too_large),
        Err(BuildError::PayloadEncoding(_))
    ));

    let overflowing = BlobTxParams { gas_tip_cap: BigUint::from(1u8) << 256u32, ..params(0) };
    let err = build_blob_transaction(&account, &overflowing, b"hello").unwrap_err();
    assert!(matches!(
        err,
        BuildError::Overflow(OverflowError { field: FeeField::GasTipCap, bits: 256 })
    ));
    assert_eq!(
        err.to_string(),
        "failed to create blob transaction: GasTipCap overflow: value does not fit in 256 bits"
    );
}

#[test]
fn base_fee_policy() {
    let account = Account::from_hex_key(DEV_PRIVATE_KEY).unwrap();
    let base_fee = BigUint::from(30_000_000_000u64);
    let tip = BigUint::from(2_000_000_000u64);

    let params = BlobTxParams {
        gas_tip_cap: tip.clone(),
        gas_fee_cap: FeeCap::FromBaseFee(base_fee.clone()),
        ..params(0)
    };
    let signed = build_blob_transaction(&account, &params, b"hello").unwrap();

    let expected = u128::try_from(compute_fee_cap(&base_fee, &tip)).unwrap();
    assert_eq!(signed.message().max_fee_per_gas, expected);
    assert_eq!(expected, 62_000_000_000);
}

#[test]
fn concurrent_builds_share_builder_and_account() {
    let builder = Arc::new(BlobTxBuilder::default());
    let account = Arc::new(Account::from_hex_key(DEV_PRIVATE_KEY).unwrap());

    let handles: Vec<_> = (0..4u64)
        .map(|nonce| {
            let builder = Arc::clone(&builder);
            let account = Arc::clone(&account);
            thread::spawn(move || builder.build(&account, &params(nonce), b"hello").unwrap())
        })
        .collect();

    let signed: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for (nonce, tx) in signed.iter().enumerate() {
        assert_eq!(tx.nonce(), nonce as u64);
        assert_eq!(tx.recover_signer().unwrap(), account.address());
        assert_eq!(tx.blob_versioned_hashes(), signed[0].blob_versioned_hashes());
    }
}
