//! Bootable ISO output.
//!
//! Mavericks and newer: stage a scratch disk image, run the media tool
//! against its volume, detach, and convert the image to a DVD/CD master.
//! Pre-Mavericks installers never had `createinstallmedia`; their bundle
//! embeds a bootable ESD image which converts directly.

use super::image::artifact_filename;
use super::workspace::{TemporaryWorkspace, remove_dir_idempotent};
use super::{GenerationOptions, check_destination, disk, media, move_file, remove_existing};
use crate::cli::OutputManager;
use crate::error::{Error, Result};
use crate::installer::Installer;
use std::path::{Path, PathBuf};

/// Embedded bootable image inside pre-Mavericks installer bundles.
const EMBEDDED_ESD: &str = "Contents/SharedSupport/InstallESD.dmg";

/// Build a bootable .iso for the installer.
pub async fn generate_iso(
    installer: &Installer,
    options: &GenerationOptions,
    workspace: &TemporaryWorkspace,
    output: &OutputManager,
) -> Result<PathBuf> {
    let destination = options.output_dir.join(artifact_filename(installer, "iso"));
    check_destination(&destination, options.force)?;

    let staged = if installer.mavericks_or_newer() {
        stage_with_install_media(installer, options, workspace, output).await?
    } else {
        stage_from_embedded_image(installer, workspace, output).await?
    };

    remove_existing(&destination).await?;
    move_file(&staged, &destination).await?;
    remove_dir_idempotent(&workspace.iso_dir()).await?;

    output.success(&format!("Created '{}'", destination.display()));
    Ok(destination)
}

/// Scratch image → createinstallmedia → detach → convert to master.
async fn stage_with_install_media(
    installer: &Installer,
    options: &GenerationOptions,
    workspace: &TemporaryWorkspace,
    output: &OutputManager,
) -> Result<PathBuf> {
    let scratch_image = workspace
        .iso_dir()
        .join(format!("{}.dmg", installer.identifier));
    let mount_point = installer.iso_mount_point();
    // Big Sur's media tool requires a GUID partition map on its target
    let layout = installer
        .big_sur_or_newer()
        .then_some(disk::GUID_PARTITION_LAYOUT);

    // Only the ISO mount point is cleared here; the primary assembly
    // volume stays mounted, createinstallmedia reads the app from it.
    output.step("Creating scratch disk image...");
    disk::create_and_attach(
        &scratch_image,
        options.image_size_gb,
        &installer.volume_name(),
        layout,
        &mount_point,
    )
    .await?;

    let media_result = media::create_install_media(installer, &mount_point, output).await;
    let _ = disk::unmount(&mount_point).await;
    media_result?;

    output.step("Converting disk image...");
    convert_to_master(&scratch_image, workspace, installer).await
}

/// Pre-Mavericks: no image and no mount, the embedded ESD converts directly.
async fn stage_from_embedded_image(
    installer: &Installer,
    workspace: &TemporaryWorkspace,
    output: &OutputManager,
) -> Result<PathBuf> {
    let embedded = installer.installer_bundle_path().join(EMBEDDED_ESD);
    if !embedded.is_file() {
        return Err(Error::Generic(format!(
            "no embedded install image at '{}'",
            embedded.display()
        )));
    }

    output.step("Converting embedded install image...");
    convert_to_master(&embedded, workspace, installer).await
}

/// `hdiutil convert -format UDTO` appends `.cdr` to its output name.
async fn convert_to_master(
    source: &Path,
    workspace: &TemporaryWorkspace,
    installer: &Installer,
) -> Result<PathBuf> {
    let converted = workspace.iso_dir().join(&installer.identifier);
    disk::convert(source, disk::ImageFormat::Master, &converted).await?;
    Ok(converted.with_extension("cdr"))
}
