//! External tool detection.
//!
//! Probed once and cached; absence is reported as a warning before the
//! pipeline starts rather than an early failure, since the eventual spawn
//! error carries the authoritative diagnostics.

use std::sync::LazyLock;

/// Whether `hdiutil` is on PATH.
pub static HAS_HDIUTIL: LazyLock<bool> = LazyLock::new(|| probe("hdiutil"));

/// Whether `diskutil` is on PATH.
pub static HAS_DISKUTIL: LazyLock<bool> = LazyLock::new(|| probe("diskutil"));

fn probe(tool: &str) -> bool {
    match which::which(tool) {
        Ok(path) => {
            log::debug!("found {tool} at: {}", path.display());
            true
        }
        Err(err) => {
            log::debug!("{tool} not found in PATH: {err}");
            false
        }
    }
}
