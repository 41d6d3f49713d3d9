//! Command line interface for the installer media generator.

mod args;
mod output;

pub use args::Args;
pub use output::OutputManager;

use crate::error::{CliError, Result};
use crate::generator::Generator;
use crate::installer::Installer;

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    if let Err(reason) = args.validate() {
        return Err(CliError::InvalidArguments { reason }.into());
    }

    let installer = Installer::load(&args.input)?;
    let options = args.into_options();

    Generator::new(installer, options).generate().await?;
    Ok(0)
}
