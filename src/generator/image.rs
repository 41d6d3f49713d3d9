//! Disk image (.dmg) output: a compressed image wrapping the assembled
//! installer application, optionally signed.

use super::{GenerationOptions, check_destination, move_file, path_str, remove_existing};
use super::workspace::{TemporaryWorkspace, remove_dir_idempotent};
use crate::cli::OutputManager;
use crate::error::Result;
use crate::installer::Installer;
use crate::process;
use std::path::PathBuf;

/// Build a .dmg containing the installer application.
pub async fn generate_image(
    installer: &Installer,
    options: &GenerationOptions,
    workspace: &TemporaryWorkspace,
    output: &OutputManager,
) -> Result<PathBuf> {
    let destination = options
        .output_dir
        .join(artifact_filename(installer, "dmg"));
    check_destination(&destination, options.force)?;

    output.step("Creating disk image...");
    let staged = workspace.image_dir().join(artifact_filename(installer, "dmg"));
    let bundle = installer.installer_bundle_path();
    let volume_name = installer.volume_name();
    process::run(&[
        "hdiutil",
        "create",
        "-fs",
        "HFS+",
        "-srcfolder",
        path_str(&bundle)?,
        "-volname",
        volume_name.as_str(),
        path_str(&staged)?,
    ])
    .await?;

    if let Some(identity) = &options.image_signing_identity {
        output.step("Codesigning disk image...");
        let mut arguments = vec!["codesign", "--sign", identity.as_str()];
        if let Some(path) = &options.keychain {
            arguments.extend(["--keychain", path_str(path)?]);
        }
        arguments.push(path_str(&staged)?);
        process::run(&arguments).await?;
    }

    remove_existing(&destination).await?;
    move_file(&staged, &destination).await?;
    remove_dir_idempotent(&workspace.image_dir()).await?;

    output.success(&format!("Created '{}'", destination.display()));
    Ok(destination)
}

/// `<name> <version>-<build>.<extension>`
pub fn artifact_filename(installer: &Installer, extension: &str) -> String {
    format!(
        "{} {}-{}.{}",
        installer.name, installer.version, installer.build, extension
    )
}
