//! Disk image creation, attachment, and format conversion via `hdiutil`.

use super::mount::unmount;
use crate::error::Result;
use crate::generator::path_str;
use crate::process;
use std::path::Path;

/// GUID partition map with a single partition, required by bootable media
/// for Big Sur and newer.
pub const GUID_PARTITION_LAYOUT: &str = "GPTSPUD";

/// Target formats for `hdiutil convert`.
#[derive(Debug, Clone, Copy)]
pub enum ImageFormat {
    /// UDZO: compressed read-only, the distribution format for .dmg output
    Compressed,
    /// UDTO: DVD/CD master, the distribution format for .iso output.
    /// `hdiutil` appends `.cdr` to the output path.
    Master,
}

impl ImageFormat {
    fn flag(self) -> &'static str {
        match self {
            ImageFormat::Compressed => "UDZO",
            ImageFormat::Master => "UDTO",
        }
    }
}

/// Create a sized, journaled-HFS+ image at `image_path`.
pub async fn create(
    image_path: &Path,
    size_gb: u64,
    volume_name: &str,
    layout: Option<&str>,
) -> Result<()> {
    let size = format!("{size_gb}g");
    let image = path_str(image_path)?;

    let mut arguments = vec![
        "hdiutil",
        "create",
        "-fs",
        "JHFS+",
        "-size",
        size.as_str(),
        "-volname",
        volume_name,
    ];
    if let Some(layout) = layout {
        arguments.extend(["-layout", layout]);
    }
    arguments.push(image);

    process::run(&arguments).await?;
    Ok(())
}

/// Attach an image at a fixed mount point, non-interactive and without any
/// Finder window (`-noverify -nobrowse`).
pub async fn attach(image_path: &Path, mount_point: &Path) -> Result<()> {
    let image = path_str(image_path)?;
    let mount = path_str(mount_point)?;
    process::run(&[
        "hdiutil",
        "attach",
        image,
        "-noverify",
        "-nobrowse",
        "-mountpoint",
        mount,
    ])
    .await?;
    Ok(())
}

/// Create and attach in one step.
///
/// Only the target mount point is cleared beforehand: the installer's other
/// mount points may be live volumes of the current run (the ISO stage
/// attaches while the primary assembly volume is still in use).
pub async fn create_and_attach(
    image_path: &Path,
    size_gb: u64,
    volume_name: &str,
    layout: Option<&str>,
    mount_point: &Path,
) -> Result<()> {
    let _ = unmount(mount_point).await;
    create(image_path, size_gb, volume_name, layout).await?;
    attach(image_path, mount_point).await
}

/// Convert an image to a distribution format. The caller owns naming; note
/// that [`ImageFormat::Master`] output gains a `.cdr` suffix.
pub async fn convert(source: &Path, format: ImageFormat, destination: &Path) -> Result<()> {
    let source = path_str(source)?;
    let destination = path_str(destination)?;
    process::run(&[
        "hdiutil",
        "convert",
        source,
        "-format",
        format.flag(),
        "-o",
        destination,
    ])
    .await?;
    Ok(())
}
