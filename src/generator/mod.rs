//! Artifact generation pipeline.
//!
//! [`Generator`] owns one generation run: clear stale mounts, stage the
//! primary assembly volume, assemble the installer application, then
//! produce each requested output kind in a fixed order. Teardown (volume
//! detach, workspace removal) always runs, and its failures never mask a
//! produced artifact.

mod application;
mod assembler;
mod bootable;
pub mod disk;
mod image;
mod iso;
mod media;
mod package;
mod plist;
mod tools;
mod workspace;

pub mod codesign;

pub use assembler::AssemblyStrategy;
pub use image::artifact_filename;
pub use self::plist::{LEGACY_MEDIA_VERSION, SHORT_VERSION_KEY, patch};
pub use workspace::TemporaryWorkspace;

use crate::cli::OutputManager;
use crate::error::{Error, Result};
use crate::installer::Installer;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Everything one generation run was asked to do.
#[derive(Debug, Clone)]
pub struct GenerationOptions {
    /// Output kinds to produce; dispatched in [`OutputKind::DISPATCH_ORDER`]
    pub output_kinds: Vec<OutputKind>,
    /// Overwrite existing destination artifacts
    pub force: bool,
    /// Silence all reporting
    pub quiet: bool,
    /// Plain output without color escapes
    pub no_ansi: bool,
    /// Directory holding the downloaded components and `installer.json`
    pub input_dir: PathBuf,
    /// Directory artifacts are written into
    pub output_dir: PathBuf,
    /// Identity for signing the .dmg output
    pub image_signing_identity: Option<String>,
    /// Identity for signing the .pkg output
    pub package_signing_identity: Option<String>,
    /// Keychain holding the signing identities
    pub keychain: Option<PathBuf>,
    /// Target volume for the bootable-installer output
    pub bootable_volume: Option<PathBuf>,
    /// Size of the scratch disk images, in gigabytes
    pub image_size_gb: u64,
}

/// One distributable artifact kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// The installer application itself
    Application,
    /// Compressed disk image wrapping the application
    Image,
    /// Bootable ISO
    Iso,
    /// Installer package
    Package,
    /// Bootable installer written onto an existing volume
    BootableVolume,
}

impl OutputKind {
    /// Fixed generation order, cheapest first.
    pub const DISPATCH_ORDER: [OutputKind; 5] = [
        OutputKind::Application,
        OutputKind::Image,
        OutputKind::Iso,
        OutputKind::Package,
        OutputKind::BootableVolume,
    ];
}

/// Drives one full generation run for one installer.
pub struct Generator {
    installer: Installer,
    options: GenerationOptions,
    output: OutputManager,
}

impl Generator {
    pub fn new(installer: Installer, options: GenerationOptions) -> Self {
        let output = OutputManager::new(options.quiet, options.no_ansi);
        Self {
            installer,
            options,
            output,
        }
    }

    pub fn installer(&self) -> &Installer {
        &self.installer
    }

    /// Run the pipeline. The first failing output kind aborts the kinds
    /// not yet started; teardown runs regardless.
    pub async fn generate(&self) -> Result<()> {
        self.output.section(&format!(
            "{} {} ({})",
            self.installer.name, self.installer.version, self.installer.build
        ));

        if !*tools::HAS_HDIUTIL || !*tools::HAS_DISKUTIL {
            self.output
                .warn("disk image tooling not found in PATH; generation will likely fail");
        }

        // Surface destination collisions before anything touches the
        // filesystem. Each output kind re-checks right before it writes.
        for kind in self.requested_kinds() {
            if let Some(destination) = artifact_destination(&self.installer, &self.options, kind) {
                check_destination(&destination, self.options.force)?;
            }
        }

        let workspace = TemporaryWorkspace::create(self.installer.working_directory()).await?;
        let result = self.run_pipeline(&workspace).await;

        // Teardown is cosmetic next to a produced artifact: a stuck mount
        // is logged and left for the next run's stale-mount cleanup.
        let _ = disk::unmount(&self.installer.disk_image_mount_point()).await;
        let _ = workspace.remove().await;

        result
    }

    async fn run_pipeline(&self, workspace: &TemporaryWorkspace) -> Result<()> {
        let primary_image = workspace
            .disk_dir()
            .join(format!("{}.dmg", self.installer.identifier));

        // Recover both of this installer's mount points from a prior
        // crashed or interrupted run before anything fresh is attached.
        disk::cleanup_stale_mounts(&self.installer).await;

        self.output.step("Creating assembly volume...");
        disk::create_and_attach(
            &primary_image,
            self.options.image_size_gb,
            &self.installer.identifier,
            None,
            &self.installer.disk_image_mount_point(),
        )
        .await?;

        assembler::assemble(&self.installer, &self.options, workspace, &self.output).await?;

        for kind in self.requested_kinds() {
            match kind {
                OutputKind::Application => {
                    application::generate_application(
                        &self.installer,
                        &self.options,
                        &self.output,
                    )
                    .await?;
                }
                OutputKind::Image => {
                    image::generate_image(&self.installer, &self.options, workspace, &self.output)
                        .await?;
                }
                OutputKind::Iso => {
                    iso::generate_iso(&self.installer, &self.options, workspace, &self.output)
                        .await?;
                }
                OutputKind::Package => {
                    package::generate_package(
                        &self.installer,
                        &self.options,
                        workspace,
                        &self.output,
                    )
                    .await?;
                }
                OutputKind::BootableVolume => {
                    bootable::generate_bootable_volume(
                        &self.installer,
                        &self.options,
                        &self.output,
                    )
                    .await?;
                }
            }
        }

        Ok(())
    }

    /// Requested kinds in dispatch order.
    fn requested_kinds(&self) -> impl Iterator<Item = OutputKind> + '_ {
        OutputKind::DISPATCH_ORDER
            .into_iter()
            .filter(|kind| self.options.output_kinds.contains(kind))
    }
}

/// Destination path an output kind writes to, `None` for the
/// bootable-volume output which targets an existing volume instead.
pub fn artifact_destination(
    installer: &Installer,
    options: &GenerationOptions,
    kind: OutputKind,
) -> Option<PathBuf> {
    let name = match kind {
        OutputKind::Application => installer.bundle_name(),
        OutputKind::Image => artifact_filename(installer, "dmg"),
        OutputKind::Iso => artifact_filename(installer, "iso"),
        OutputKind::Package => artifact_filename(installer, "pkg"),
        OutputKind::BootableVolume => return None,
    };
    Some(options.output_dir.join(name))
}

/// Refuse to continue when the destination exists and force was not
/// requested. Runs before any destructive action.
pub fn check_destination(destination: &Path, force: bool) -> Result<()> {
    if destination.exists() && !force {
        return Err(Error::ExistingDestination {
            path: destination.to_path_buf(),
        });
    }
    Ok(())
}

/// Delete a pre-existing destination artifact. Existence is re-checked
/// here, immediately before the deletion, not earlier.
pub(crate) async fn remove_existing(destination: &Path) -> Result<()> {
    match fs::metadata(destination).await {
        Ok(metadata) if metadata.is_dir() => fs::remove_dir_all(destination).await?,
        Ok(_) => fs::remove_file(destination).await?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// Move a staged artifact into place. Rename first; fall back to copy and
/// delete when the destination sits on another filesystem.
pub(crate) async fn move_file(source: &Path, destination: &Path) -> Result<()> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).await?;
    }
    match fs::rename(source, destination).await {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(source, destination).await?;
            fs::remove_file(source).await?;
            Ok(())
        }
    }
}

pub(crate) fn path_str(path: &Path) -> Result<&str> {
    path.to_str()
        .ok_or_else(|| Error::Generic(format!("path is not valid UTF-8: {}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn existing_destination_without_force_is_a_precondition_error() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("App.dmg");
        std::fs::write(&destination, b"previous artifact").unwrap();

        let result = check_destination(&destination, false);
        match result {
            Err(Error::ExistingDestination { path }) => assert_eq!(path, destination),
            other => panic!("expected ExistingDestination, got {other:?}"),
        }
        // nothing was touched
        assert_eq!(
            std::fs::read(&destination).unwrap(),
            b"previous artifact"
        );
    }

    #[test]
    fn existing_destination_with_force_passes() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("App.dmg");
        std::fs::write(&destination, b"previous artifact").unwrap();

        assert!(check_destination(&destination, true).is_ok());
        // check alone never deletes
        assert!(destination.exists());
    }

    #[test]
    fn absent_destination_passes_without_force() {
        let dir = tempfile::tempdir().unwrap();
        assert!(check_destination(&dir.path().join("App.dmg"), false).is_ok());
    }

    #[tokio::test]
    async fn remove_existing_handles_files_directories_and_absence() {
        let dir = tempfile::tempdir().unwrap();

        let file = dir.path().join("artifact.dmg");
        std::fs::write(&file, b"x").unwrap();
        remove_existing(&file).await.unwrap();
        assert!(!file.exists());

        let bundle = dir.path().join("Install.app");
        std::fs::create_dir_all(bundle.join("Contents")).unwrap();
        remove_existing(&bundle).await.unwrap();
        assert!(!bundle.exists());

        remove_existing(&dir.path().join("never-existed")).await.unwrap();
    }

    #[tokio::test]
    async fn move_file_replaces_staged_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let staged = dir.path().join("staged.iso");
        let destination = dir.path().join("out/final.iso");
        std::fs::write(&staged, b"artifact").unwrap();

        move_file(&staged, &destination).await.unwrap();
        assert!(!staged.exists());
        assert_eq!(std::fs::read(&destination).unwrap(), b"artifact");
    }
}
