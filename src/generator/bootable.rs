//! Bootable installer volume output: run the media tool against a
//! caller-supplied volume (typically external USB media).

use super::{GenerationOptions, media};
use crate::cli::OutputManager;
use crate::error::{CliError, Error, Result};
use crate::installer::Installer;
use std::path::PathBuf;

/// Write a bootable installer onto the volume named in the options.
///
/// `createinstallmedia` erases the volume and renames it to the
/// installer's `Install <name>` label; the volume stays mounted afterwards.
pub async fn generate_bootable_volume(
    installer: &Installer,
    options: &GenerationOptions,
    output: &OutputManager,
) -> Result<PathBuf> {
    let volume = options.bootable_volume.as_ref().ok_or_else(|| {
        Error::Cli(CliError::InvalidArguments {
            reason: "bootable volume output requested without a target volume".into(),
        })
    })?;
    if !volume.exists() {
        return Err(Error::Generic(format!(
            "volume '{}' does not exist",
            volume.display()
        )));
    }

    media::create_install_media(installer, volume, output).await?;

    output.success(&format!(
        "Created bootable installer on '{}'",
        volume.display()
    ));
    Ok(volume.clone())
}
