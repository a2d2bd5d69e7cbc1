//! Offline operator tool for blob transactions.

pub mod cli;
