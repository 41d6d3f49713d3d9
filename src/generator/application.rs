//! Application bundle output: the assembled installer copied off the
//! mounted volume.

use super::{GenerationOptions, check_destination, path_str, remove_existing};
use crate::cli::OutputManager;
use crate::error::Result;
use crate::installer::Installer;
use crate::process;
use std::path::PathBuf;

/// Copy the assembled installer application to the output directory.
pub async fn generate_application(
    installer: &Installer,
    options: &GenerationOptions,
    output: &OutputManager,
) -> Result<PathBuf> {
    let destination = options.output_dir.join(installer.bundle_name());
    check_destination(&destination, options.force)?;

    output.step("Copying installer application...");
    remove_existing(&destination).await?;
    process::run(&[
        "ditto",
        path_str(&installer.installer_bundle_path())?,
        path_str(&destination)?,
    ])
    .await?;

    output.success(&format!("Created '{}'", destination.display()));
    Ok(destination)
}
