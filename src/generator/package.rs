//! Installer package (.pkg) output.
//!
//! Big Sur catalogs already ship a consolidated package, so that output is
//! a pass-through (re-signed when an identity is given). Older releases
//! get a component package built around the assembled application.

use super::image::artifact_filename;
use super::workspace::{TemporaryWorkspace, remove_dir_idempotent};
use super::{GenerationOptions, check_destination, move_file, path_str, remove_existing};
use crate::cli::OutputManager;
use crate::error::{Error, Result};
use crate::installer::{INSTALL_ASSISTANT_PACKAGE, Installer};
use crate::process;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Where the built package installs its payload.
const INSTALL_LOCATION: &str = "/Applications";

/// Produce the installer package artifact.
pub async fn generate_package(
    installer: &Installer,
    options: &GenerationOptions,
    workspace: &TemporaryWorkspace,
    output: &OutputManager,
) -> Result<PathBuf> {
    let destination = options.output_dir.join(artifact_filename(installer, "pkg"));
    check_destination(&destination, options.force)?;

    let staged = workspace.package_dir().join(artifact_filename(installer, "pkg"));
    if installer.big_sur_or_newer() {
        stage_install_assistant(installer, options, &staged, output).await?;
    } else {
        build_component_package(installer, options, &staged, output).await?;
    }

    remove_existing(&destination).await?;
    move_file(&staged, &destination).await?;
    remove_dir_idempotent(&workspace.package_dir()).await?;

    output.success(&format!("Created '{}'", destination.display()));
    Ok(destination)
}

/// Big Sur and newer: the download already is the package. Re-sign with
/// `productsign` when an identity is configured, plain copy otherwise.
async fn stage_install_assistant(
    installer: &Installer,
    options: &GenerationOptions,
    staged: &Path,
    output: &OutputManager,
) -> Result<()> {
    let source = options.input_dir.join(INSTALL_ASSISTANT_PACKAGE);
    if !source.is_file() {
        return Err(Error::Generic(format!(
            "'{}' not found for {}",
            source.display(),
            installer.name
        )));
    }

    if let Some(identity) = &options.package_signing_identity {
        output.step("Signing installer package...");
        let mut arguments = vec!["productsign", "--sign", identity.as_str()];
        if let Some(path) = &options.keychain {
            arguments.extend(["--keychain", path_str(path)?]);
        }
        arguments.extend([path_str(&source)?, path_str(staged)?]);
        process::run(&arguments).await?;
    } else {
        output.step("Copying installer package...");
        fs::copy(&source, staged).await?;
    }
    Ok(())
}

/// Pre-Big Sur: wrap the assembled application in a component package.
async fn build_component_package(
    installer: &Installer,
    options: &GenerationOptions,
    staged: &Path,
    output: &OutputManager,
) -> Result<()> {
    output.step("Building installer package...");
    let identifier = format!("com.installmedia.pkg.{}", installer.identifier);
    let bundle = installer.installer_bundle_path();

    let mut arguments = vec![
        "pkgbuild",
        "--identifier",
        identifier.as_str(),
        "--version",
        installer.version.as_str(),
        "--component",
        path_str(&bundle)?,
        "--install-location",
        INSTALL_LOCATION,
    ];
    if let Some(identity) = &options.package_signing_identity {
        arguments.extend(["--sign", identity.as_str()]);
        if let Some(path) = &options.keychain {
            arguments.extend(["--keychain", path_str(path)?]);
        }
    }
    arguments.push(path_str(staged)?);

    process::run(&arguments).await?;
    Ok(())
}
