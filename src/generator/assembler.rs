//! Installer assembly: turn downloaded component packages into a runnable
//! installer application on the primary mounted volume.
//!
//! Exactly one of three strategies runs per installer, chosen up front from
//! version metadata. All three converge on the same result: the installer
//! application at [`Installer::installer_bundle_path`], permissions
//! normalized.

use super::disk;
use super::workspace::{TemporaryWorkspace, remove_dir_idempotent};
use super::{GenerationOptions, path_str};
use crate::cli::OutputManager;
use crate::error::{Error, Result};
use crate::installer::{INSTALL_ASSISTANT_PACKAGE, Installer};
use crate::process;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Auto-install package carrying the installer application payload
/// (High Sierra through Catalina catalogs).
const AUTO_INSTALL_PACKAGE: &str = "InstallAssistantAuto.pkg";
/// Package carrying the ESD system image.
const SYSTEM_IMAGE_PACKAGE: &str = "InstallESDDmg.pkg";
/// System image placed in the bundle's SharedSupport directory.
const SYSTEM_IMAGE: &str = "InstallESD.dmg";
/// OS-install manifest, present in some catalogs.
const INSTALL_INFO_MANIFEST: &str = "InstallInfo.plist";
/// Recovery image and its chunklist, present in some catalogs.
const RECOVERY_ARTIFACTS: [&str; 2] = ["BaseSystem.dmg", "BaseSystem.chunklist"];
/// Diagnostics image and its chunklist, present in some catalogs.
const DIAGNOSTICS_ARTIFACTS: [&str; 2] = ["AppleDiagnostics.dmg", "AppleDiagnostics.chunklist"];

/// `installer(8)` refuses to run outside an Apple install environment;
/// setting this sentinel satisfies its distribution check.
const INSTALLER_ENVIRONMENT: (&str, &str) = ("CM_BUILD", "CM_BUILD");

/// Mode every file in the assembled bundle is normalized to.
const BUNDLE_PERMISSIONS: &str = "755";

/// The three mutually exclusive assembly procedures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyStrategy {
    /// Sierra and older: the download is a disk image wrapping a package;
    /// attach it and hand the package to `installer(8)`.
    LegacyDiskImage,
    /// Big Sur and newer: a single consolidated package installs directly.
    InstallAssistant,
    /// High Sierra through Catalina: `installer(8)` no longer accepts the
    /// distribution packages (CVE-2021-30703 era restriction), so the
    /// bundle is assembled by hand from expanded packages.
    ManualAssembly,
}

impl AssemblyStrategy {
    /// Pure function of installer metadata. Every metadata combination
    /// selects exactly one strategy.
    pub fn select(installer: &Installer) -> Self {
        if installer.sierra_or_older() && !installer.packages.is_empty() {
            AssemblyStrategy::LegacyDiskImage
        } else if installer.contains_install_assistant_package() {
            AssemblyStrategy::InstallAssistant
        } else {
            AssemblyStrategy::ManualAssembly
        }
    }
}

impl std::fmt::Display for AssemblyStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AssemblyStrategy::LegacyDiskImage => "legacy disk image",
            AssemblyStrategy::InstallAssistant => "install assistant",
            AssemblyStrategy::ManualAssembly => "manual assembly",
        };
        f.write_str(name)
    }
}

/// Assemble the installer application onto the primary mounted volume.
pub async fn assemble(
    installer: &Installer,
    options: &GenerationOptions,
    workspace: &TemporaryWorkspace,
    output: &OutputManager,
) -> Result<()> {
    let strategy = AssemblyStrategy::select(installer);
    output.step(&format!("Assembling installer ({strategy})..."));

    match strategy {
        AssemblyStrategy::LegacyDiskImage => {
            assemble_from_legacy_image(installer, options).await?;
        }
        AssemblyStrategy::InstallAssistant => {
            let package = options.input_dir.join(INSTALL_ASSISTANT_PACKAGE);
            install_package(&package, &installer.disk_image_mount_point()).await?;
        }
        AssemblyStrategy::ManualAssembly => {
            assemble_manually(installer, options, workspace).await?;
        }
    }

    normalize_permissions(&installer.installer_bundle_path()).await?;
    output.success("Installer assembled");
    Ok(())
}

/// Attach the download's own disk image at a secondary mount point, install
/// the package found inside it, then detach.
async fn assemble_from_legacy_image(
    installer: &Installer,
    options: &GenerationOptions,
) -> Result<()> {
    let package = installer
        .packages
        .first()
        .ok_or_else(|| Error::Generic("legacy installer has no component packages".into()))?;
    let image_path = options.input_dir.join(&package.filename);
    let mount_point = PathBuf::from("/Volumes").join(format!("{}-installer", installer.identifier));

    disk::attach(&image_path, &mount_point).await?;
    let install_result = match locate_package(&mount_point) {
        Ok(package_path) => {
            install_package(&package_path, &installer.disk_image_mount_point()).await
        }
        Err(err) => Err(err),
    };
    let _ = disk::unmount(&mount_point).await;
    install_result
}

/// Run `installer(8)` against the primary volume with the environment
/// sentinel its install check requires.
async fn install_package(package: &Path, target: &Path) -> Result<()> {
    process::run_with_env(
        &[
            "installer",
            "-pkg",
            path_str(package)?,
            "-target",
            path_str(target)?,
        ],
        &[INSTALLER_ENVIRONMENT],
    )
    .await?;
    Ok(())
}

/// First package found at the top level of a mounted legacy image.
fn locate_package(mount_point: &Path) -> Result<PathBuf> {
    for entry in std::fs::read_dir(mount_point)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "pkg") {
            return Ok(path);
        }
    }
    Err(Error::Generic(format!(
        "no installer package found in '{}'",
        mount_point.display()
    )))
}

/// Hand-assemble the bundle from expanded packages.
///
/// Only the application payload and the system image are mandatory; the
/// manifest, recovery, and diagnostics artifacts ship in some catalogs and
/// not others, and are skipped silently when absent.
async fn assemble_manually(
    installer: &Installer,
    options: &GenerationOptions,
    workspace: &TemporaryWorkspace,
) -> Result<()> {
    let expansion = workspace.expansion_dir();

    // pkgutil refuses to expand onto an existing path
    let assistant_expansion = expansion.join("assistant");
    remove_dir_idempotent(&assistant_expansion).await?;
    expand_package(
        &options.input_dir.join(AUTO_INSTALL_PACKAGE),
        &assistant_expansion,
    )
    .await?;
    let application = locate_bundle(&assistant_expansion)?;

    let applications_dir = installer.disk_image_mount_point().join("Applications");
    fs::create_dir_all(&applications_dir).await?;
    let bundle_path = installer.installer_bundle_path();
    copy_bundle(&application, &bundle_path).await?;

    let esd_expansion = expansion.join("esd");
    remove_dir_idempotent(&esd_expansion).await?;
    expand_package(
        &options.input_dir.join(SYSTEM_IMAGE_PACKAGE),
        &esd_expansion,
    )
    .await?;
    let system_image = locate_payload_file(&esd_expansion, SYSTEM_IMAGE)?;

    let shared_support = bundle_path.join("Contents/SharedSupport");
    fs::create_dir_all(&shared_support).await?;
    fs::copy(&system_image, shared_support.join(SYSTEM_IMAGE)).await?;

    copy_optional_artifacts(&options.input_dir, &shared_support).await?;

    remove_dir_idempotent(&expansion).await
}

/// Copy the manifest, recovery, and diagnostics artifacts into
/// SharedSupport. Whichever the catalog did not carry are skipped silently.
async fn copy_optional_artifacts(input_dir: &Path, shared_support: &Path) -> Result<()> {
    let optional_artifacts = std::iter::once(INSTALL_INFO_MANIFEST)
        .chain(RECOVERY_ARTIFACTS)
        .chain(DIAGNOSTICS_ARTIFACTS);
    for name in optional_artifacts {
        let source = input_dir.join(name);
        if source.exists() {
            fs::copy(&source, shared_support.join(name)).await?;
        } else {
            log::debug!("optional artifact '{name}' not downloaded, skipping");
        }
    }
    Ok(())
}

async fn expand_package(package: &Path, destination: &Path) -> Result<()> {
    process::run(&[
        "pkgutil",
        "--expand-full",
        path_str(package)?,
        path_str(destination)?,
    ])
    .await?;
    Ok(())
}

/// Bundle copies go through `ditto`, which preserves the metadata installer
/// bundles need.
async fn copy_bundle(source: &Path, destination: &Path) -> Result<()> {
    process::run(&["ditto", path_str(source)?, path_str(destination)?]).await?;
    Ok(())
}

async fn normalize_permissions(bundle: &Path) -> Result<()> {
    process::run(&["chmod", "-R", BUNDLE_PERMISSIONS, path_str(bundle)?]).await?;
    Ok(())
}

/// The installer application inside an expanded auto-install package.
fn locate_bundle(expansion: &Path) -> Result<PathBuf> {
    for dir in [expansion.join("Payload"), expansion.to_path_buf()] {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "app") {
                return Ok(path);
            }
        }
    }
    Err(Error::Generic(format!(
        "no application payload found under '{}'",
        expansion.display()
    )))
}

/// A named file inside an expanded package, at the payload root or the
/// expansion root.
fn locate_payload_file(expansion: &Path, name: &str) -> Result<PathBuf> {
    for candidate in [expansion.join("Payload").join(name), expansion.join(name)] {
        if candidate.is_file() {
            return Ok(candidate);
        }
    }
    Err(Error::Generic(format!(
        "'{name}' not found under '{}'",
        expansion.display()
    )))
}
