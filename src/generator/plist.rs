//! One-key property list patching.
//!
//! The pipeline rewrites exactly one manifest: the short version string of
//! the copied installer bundle, so `createinstallmedia`'s internal version
//! gate accepts the 10.12.x family.

use crate::error::{Error, Result};
use plist::Value;
use std::io::Write;
use std::path::Path;

/// Key patched in the installer bundle's `Info.plist`.
pub const SHORT_VERSION_KEY: &str = "CFBundleShortVersionString";

/// Version the 10.12.x bundles are relabelled as; the newest release whose
/// `createinstallmedia` the compatibility gate still accepts.
pub const LEGACY_MEDIA_VERSION: &str = "12.6.03";

/// Set `key` to `value` in the plist at `path`, preserving every other
/// entry, and write the result back atomically (temp file + rename in the
/// same directory).
pub fn patch(path: &Path, key: &str, value: Value) -> Result<()> {
    let mut root = Value::from_file(path)?;
    let dict = root.as_dictionary_mut().ok_or_else(|| {
        Error::Generic(format!(
            "'{}' is not a dictionary-rooted property list",
            path.display()
        ))
    })?;
    dict.insert(key.to_string(), value);

    let mut encoded = Vec::new();
    root.to_writer_xml(&mut encoded)?;

    let parent = path.parent().ok_or_else(|| {
        Error::Generic(format!("'{}' has no parent directory", path.display()))
    })?;
    let mut staged = tempfile::NamedTempFile::new_in(parent)?;
    staged.write_all(&encoded)?;
    staged.persist(path).map_err(|err| Error::Io(err.error))?;
    Ok(())
}
