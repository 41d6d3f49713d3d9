//! Command line argument parsing and validation.

use crate::generator::{GenerationOptions, OutputKind};
use clap::Parser;
use std::path::PathBuf;

/// macOS installer media generator
#[derive(Parser, Debug)]
#[command(
    name = "installmedia",
    version,
    about = "Builds distributable macOS installer media from downloaded installer components",
    long_about = "Builds distributable macOS installer media from downloaded installer components.

Reads installer.json plus the component packages from the input directory and
produces the requested artifacts in the output directory.

Usage:
  installmedia --input ~/Downloads/012-34567 --output ~/Installers --image --iso
  installmedia --input ./catalina --output . --application --package --force
  sudo installmedia --input ./ventura --output . --bootable-volume /Volumes/MyUSB

Creating disk images and bootable media drives hdiutil, installer, and
createinstallmedia; those steps require macOS and, for most volumes, root."
)]
pub struct Args {
    /// Directory containing installer.json and the downloaded packages
    #[arg(short, long, value_name = "DIR")]
    pub input: PathBuf,

    /// Directory the generated artifacts are written into
    #[arg(short, long, value_name = "DIR")]
    pub output: PathBuf,

    /// Generate the installer application (.app)
    #[arg(long)]
    pub application: bool,

    /// Generate a compressed disk image (.dmg)
    #[arg(long)]
    pub image: bool,

    /// Generate a bootable ISO (.iso)
    #[arg(long)]
    pub iso: bool,

    /// Generate an installer package (.pkg)
    #[arg(long)]
    pub package: bool,

    /// Write a bootable installer onto this volume (erases it)
    #[arg(long, value_name = "VOLUME")]
    pub bootable_volume: Option<PathBuf>,

    /// Overwrite existing artifacts in the output directory
    #[arg(short, long)]
    pub force: bool,

    /// Suppress all output
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_ansi: bool,

    /// Codesigning identity for the disk image
    #[arg(long, value_name = "IDENTITY")]
    pub image_identity: Option<String>,

    /// Signing identity for the installer package
    #[arg(long, value_name = "IDENTITY")]
    pub package_identity: Option<String>,

    /// Keychain holding the signing identities
    #[arg(long, value_name = "PATH")]
    pub keychain: Option<PathBuf>,

    /// Size of the scratch disk images in gigabytes
    #[arg(long, value_name = "GB", default_value_t = 16)]
    pub image_size: u64,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.output_kinds().is_empty() {
            return Err(
                "No output type requested. Pass at least one of --application, --image, \
                 --iso, --package, --bootable-volume."
                    .to_string(),
            );
        }
        if self.image_size == 0 {
            return Err("--image-size must be at least 1 GB".to_string());
        }
        Ok(())
    }

    /// Output kinds selected by the flags.
    pub fn output_kinds(&self) -> Vec<OutputKind> {
        let mut kinds = Vec::new();
        if self.application {
            kinds.push(OutputKind::Application);
        }
        if self.image {
            kinds.push(OutputKind::Image);
        }
        if self.iso {
            kinds.push(OutputKind::Iso);
        }
        if self.package {
            kinds.push(OutputKind::Package);
        }
        if self.bootable_volume.is_some() {
            kinds.push(OutputKind::BootableVolume);
        }
        kinds
    }

    /// Convert parsed arguments into pipeline options.
    pub fn into_options(self) -> GenerationOptions {
        let output_kinds = self.output_kinds();
        GenerationOptions {
            output_kinds,
            force: self.force,
            quiet: self.quiet,
            no_ansi: self.no_ansi,
            input_dir: self.input,
            output_dir: self.output,
            image_signing_identity: self.image_identity,
            package_signing_identity: self.package_identity,
            keychain: self.keychain,
            bootable_volume: self.bootable_volume,
            image_size_gb: self.image_size,
        }
    }
}
