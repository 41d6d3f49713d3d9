//! Installer metadata and version-tier classification.
//!
//! An [`Installer`] describes one downloaded macOS installer: identity,
//! version metadata, and the component packages sitting in the input
//! directory. The downloader records this as `installer.json` next to the
//! packages; [`Installer::load`] reads it back.
//!
//! Behavior differences between releases are keyed on a single ordered
//! [`VersionEra`] derived from the version string at load time, rather than
//! scattered boolean checks.

use crate::error::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Metadata filename the downloader writes into the input directory.
pub const METADATA_FILENAME: &str = "installer.json";

/// Consolidated install assistant package shipped with Big Sur and newer.
pub const INSTALL_ASSISTANT_PACKAGE: &str = "InstallAssistant.pkg";

/// One downloaded component package.
#[derive(Debug, Clone, Deserialize)]
pub struct ComponentPackage {
    /// Filename within the input directory, e.g. `InstallESDDmg.pkg`
    pub filename: String,
}

/// Raw metadata document as written by the downloader.
#[derive(Debug, Deserialize)]
struct InstallerRecord {
    identifier: String,
    name: String,
    version: String,
    build: String,
    #[serde(default)]
    packages: Vec<ComponentPackage>,
}

/// One macOS installer and its downloaded components.
///
/// Immutable for the duration of a generation run.
#[derive(Debug, Clone)]
pub struct Installer {
    /// Catalog product identifier, e.g. `012-34567`
    pub identifier: String,
    /// Display name, e.g. `macOS Ventura`
    pub name: String,
    /// Version string, e.g. `13.0.1`
    pub version: String,
    /// Build string, e.g. `22A400`
    pub build: String,
    /// Component packages in catalog order
    pub packages: Vec<ComponentPackage>,
    era: VersionEra,
}

impl Installer {
    /// Read `installer.json` from the input directory.
    pub fn load(input_dir: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(input_dir.join(METADATA_FILENAME))?;
        let record: InstallerRecord = serde_json::from_str(&contents)?;
        Ok(Self::from_record(record))
    }

    /// Build an installer from explicit metadata. Exposed for library
    /// consumers that parse catalogs themselves.
    pub fn new(
        identifier: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
        build: impl Into<String>,
        packages: Vec<ComponentPackage>,
    ) -> Self {
        Self::from_record(InstallerRecord {
            identifier: identifier.into(),
            name: name.into(),
            version: version.into(),
            build: build.into(),
            packages,
        })
    }

    fn from_record(record: InstallerRecord) -> Self {
        let era = VersionEra::from_version(&record.version);
        Self {
            identifier: record.identifier,
            name: record.name,
            version: record.version,
            build: record.build,
            packages: record.packages,
            era,
        }
    }

    /// Version era, derived once at load.
    pub fn era(&self) -> VersionEra {
        self.era
    }

    /// Sierra (10.12) or anything older.
    pub fn sierra_or_older(&self) -> bool {
        self.era <= VersionEra::MavericksThroughSierra
    }

    /// Mavericks (10.9) or anything newer.
    pub fn mavericks_or_newer(&self) -> bool {
        self.era >= VersionEra::MavericksThroughSierra
    }

    /// Big Sur (11.0) or anything newer.
    pub fn big_sur_or_newer(&self) -> bool {
        self.era >= VersionEra::BigSurOrNewer
    }

    /// Whether the download includes the consolidated install assistant
    /// package (Big Sur and newer catalogs).
    pub fn contains_install_assistant_package(&self) -> bool {
        self.packages
            .iter()
            .any(|package| package.filename == INSTALL_ASSISTANT_PACKAGE)
    }

    /// Volume label shared by the primary image and bootable media.
    /// `createinstallmedia` renames its target volume to exactly this, so
    /// using it as the label up front keeps mount points stable.
    pub fn volume_name(&self) -> String {
        format!("Install {}", self.name)
    }

    /// Filename of the assembled installer application.
    pub fn bundle_name(&self) -> String {
        format!("Install {}.app", self.name)
    }

    /// Mount point of the primary assembly volume, keyed by identifier so
    /// it can never collide with the ISO volume.
    pub fn disk_image_mount_point(&self) -> PathBuf {
        PathBuf::from("/Volumes").join(&self.identifier)
    }

    /// Mount point of the ISO staging volume.
    pub fn iso_mount_point(&self) -> PathBuf {
        PathBuf::from("/Volumes").join(self.volume_name())
    }

    /// Assembled installer application on the primary volume.
    pub fn installer_bundle_path(&self) -> PathBuf {
        self.disk_image_mount_point()
            .join("Applications")
            .join(self.bundle_name())
    }

    /// Scratch root for this installer's generation run.
    pub fn working_directory(&self) -> PathBuf {
        std::env::temp_dir().join("installmedia").join(&self.identifier)
    }

    /// Ad-hoc re-signed copy of the installer application, used when
    /// `createinstallmedia` would reject the original after a copy
    /// invalidated its signature.
    pub fn signed_bundle_path(&self) -> PathBuf {
        self.working_directory().join(self.bundle_name())
    }
}

/// Ordered classification of macOS installer versions.
///
/// Ordering follows release history, oldest first, so tier checks are plain
/// comparisons: `era >= VersionEra::BigSurOrNewer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum VersionEra {
    /// 10.8 and older: no `createinstallmedia`, media comes from the
    /// embedded ESD image.
    PreMavericks,
    /// 10.9 through 10.12: `createinstallmedia` with `--applicationpath`.
    MavericksThroughSierra,
    /// 10.13 through 10.15: modern `createinstallmedia`, manual assembly.
    HighSierraThroughCatalina,
    /// 11.0 and newer: consolidated install assistant package.
    BigSurOrNewer,
}

impl VersionEra {
    /// Classify a version string. Unparseable strings fall into the oldest
    /// tier, which never reaches a destructive operation without the
    /// matching on-disk components.
    pub fn from_version(version: &str) -> Self {
        let mut parts = version.split('.');
        let major: u32 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
        let minor: u32 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);

        match (major, minor) {
            (major, _) if major >= 11 => Self::BigSurOrNewer,
            (10, minor) if minor >= 13 => Self::HighSierraThroughCatalina,
            (10, minor) if minor >= 9 => Self::MavericksThroughSierra,
            _ => Self::PreMavericks,
        }
    }
}
