//! Shared `createinstallmedia` invocation for the ISO and bootable-volume
//! outputs.
//!
//! Big Sur and newer bundles run the media tool in place. Older bundles are
//! first copied and ad-hoc re-signed: the copy that put the assembled
//! application onto our volume invalidated Apple's signature, and the media
//! tool validates its host bundle before doing anything.

use super::codesign;
use super::path_str;
use super::plist::{LEGACY_MEDIA_VERSION, SHORT_VERSION_KEY, patch};
use super::workspace::remove_dir_idempotent;
use crate::cli::OutputManager;
use crate::error::Result;
use crate::installer::Installer;
use crate::process;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Version family whose bundles need the short-version rewrite before
/// `createinstallmedia` will accept them.
const PATCHED_VERSION_PREFIX: &str = "10.12";

/// Run `createinstallmedia` against `target_volume`.
///
/// The tool erases the volume, writes the install environment, and renames
/// the volume to the installer's `Install <name>` label.
pub async fn create_install_media(
    installer: &Installer,
    target_volume: &Path,
    output: &OutputManager,
) -> Result<()> {
    let original_bundle = installer.installer_bundle_path();

    let media_bundle = if installer.big_sur_or_newer() {
        original_bundle.clone()
    } else {
        prepare_signed_bundle(installer, output).await?
    };

    output.step("Creating install media...");
    let binary = media_bundle.join("Contents/Resources/createinstallmedia");
    let mut arguments = vec![
        path_str(&binary)?.to_string(),
        "--volume".to_string(),
        path_str(target_volume)?.to_string(),
        "--nointeraction".to_string(),
    ];
    // createinstallmedia before High Sierra takes the source application
    // explicitly instead of deriving it from its own location
    if installer.sierra_or_older() {
        arguments.push("--applicationpath".to_string());
        arguments.push(path_str(&original_bundle)?.to_string());
    }

    let argv: Vec<&str> = arguments.iter().map(String::as_str).collect();
    process::run(&argv).await?;
    Ok(())
}

/// Copy the assembled bundle aside, patch the 10.12.x version gate if
/// needed, and ad-hoc re-sign the copy so `createinstallmedia` accepts it.
async fn prepare_signed_bundle(installer: &Installer, output: &OutputManager) -> Result<PathBuf> {
    let source = installer.installer_bundle_path();
    let copy = installer.signed_bundle_path();

    remove_dir_idempotent(&copy).await?;
    if let Some(parent) = copy.parent() {
        fs::create_dir_all(parent).await?;
    }

    output.step("Copying installer for re-signing...");
    process::run(&["ditto", path_str(&source)?, path_str(&copy)?]).await?;

    if needs_version_patch(&installer.version) {
        output.step("Patching installer version manifest...");
        patch(
            &copy.join("Contents/Info.plist"),
            SHORT_VERSION_KEY,
            plist::Value::String(LEGACY_MEDIA_VERSION.into()),
        )?;
    }

    output.step("Codesigning installer copy...");
    codesign::sign(&copy).await;

    Ok(copy)
}

fn needs_version_patch(version: &str) -> bool {
    version.starts_with(PATCHED_VERSION_PREFIX)
}
