//! Utilities for setting up tests.

use tracing_subscriber::{filter::LevelFilter, EnvFilter};

/// Private key of the first anvil / hardhat dev account. Never fund this on a live network.
pub const DEV_PRIVATE_KEY: &str =
    "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// Private key of the second anvil / hardhat dev account.
pub const DEV_PRIVATE_KEY_2: &str =
    "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

/// Initialize a tracing subscriber for tests. Use `RUST_LOG` to set the filter level.
///
/// If the tracing subscriber has already been initialized in a previous test, this
/// function will silently fail due to `try_init()`, which does not reinitialize
/// the subscriber if one is already set.
pub fn test_tracing() {
    let filter =
        EnvFilter::builder().with_default_directive(LevelFilter::INFO.into()).from_env_lossy();
    let _ =
        tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

/// A payload of `len` bytes with a repeating, non-trivial pattern.
pub fn test_payload(len: usize) -> Vec<u8> {
    (0..len).map(|n| (n % 251) as u8).collect()
}
