//! The binary for building blob transactions

use blobtx_cli::cli::Cli;

fn main() -> eyre::Result<()> {
    let _guards = blobtx_tracing::init_logging()?;

    Cli::run()?;
    Ok(())
}
