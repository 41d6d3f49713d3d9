//! Best-effort ad-hoc re-signing of a copied installer bundle.
//!
//! Copying an installer application invalidates its original signature, and
//! `createinstallmedia` refuses to run from a bundle that fails validation.
//! Re-signing every file, and every nested bundle as a unit, with the
//! ad-hoc identity (`-`) is enough to make the copy executable again.
//!
//! Per-file failures are expected (plenty of files carry no signature to
//! strip, and some cannot take one), so both the strip and the sign results
//! are discarded and the walk always runs to completion.

use crate::process;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Directory extensions `codesign` seals as a single unit.
const NESTED_BUNDLE_EXTENSIONS: [&str; 5] = ["app", "framework", "bundle", "plugin", "xpc"];

/// Ad-hoc re-sign everything under `bundle`: regular files one by one,
/// nested bundles as opaque wholes.
pub async fn sign(bundle: &Path) {
    for target in signable_targets(bundle) {
        let Some(path) = target.to_str() else {
            continue;
        };
        let _ = process::run(&["codesign", "--remove-signature", path]).await;
        let _ = process::run(&["codesign", "--force", "--sign", "-", path]).await;
    }
}

/// Every regular file under `bundle`, with hidden files and anything under
/// a hidden directory excluded. A nested bundle is yielded once as a whole
/// and never descended into; `codesign` signs it as one unit.
fn signable_targets(bundle: &Path) -> Vec<PathBuf> {
    let mut targets = Vec::new();
    let mut walk = WalkDir::new(bundle).into_iter();
    while let Some(entry) = walk.next() {
        let Ok(entry) = entry else {
            continue;
        };
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if entry.file_type().is_dir() {
            // the bundle root itself is the caller's concern, not a target
            if entry.depth() == 0 {
                continue;
            }
            if hidden {
                walk.skip_current_dir();
            } else if is_nested_bundle(entry.path()) {
                walk.skip_current_dir();
                targets.push(entry.into_path());
            }
        } else if entry.file_type().is_file() && !hidden {
            targets.push(entry.into_path());
        }
    }
    targets
}

fn is_nested_bundle(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| NESTED_BUNDLE_EXTENSIONS.contains(&ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn visits_every_regular_file_exactly_once() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = dir.path().join("Install macOS Test.app");
        touch(&bundle.join("Contents/MacOS/InstallAssistant"));
        touch(&bundle.join("Contents/Info.plist"));
        touch(&bundle.join("Contents/Resources/Licence.rtf"));

        let mut targets = signable_targets(&bundle);
        targets.sort();
        assert_eq!(targets.len(), 3);
        targets.dedup();
        assert_eq!(targets.len(), 3);
    }

    #[test]
    fn skips_hidden_files() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = dir.path().join("Install macOS Test.app");
        touch(&bundle.join("Contents/MacOS/InstallAssistant"));
        touch(&bundle.join("Contents/.DS_Store"));

        let targets = signable_targets(&bundle);
        assert_eq!(targets.len(), 1);
        assert!(targets[0].ends_with("Contents/MacOS/InstallAssistant"));
    }

    #[test]
    fn skips_everything_under_hidden_directories() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = dir.path().join("Install macOS Test.app");
        touch(&bundle.join("Contents/MacOS/InstallAssistant"));
        touch(&bundle.join("Contents/.build/cache.dat"));

        let targets = signable_targets(&bundle);
        assert_eq!(targets.len(), 1);
        assert!(targets[0].ends_with("Contents/MacOS/InstallAssistant"));
    }

    #[test]
    fn nested_bundles_are_yielded_as_units_and_not_descended_into() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = dir.path().join("Install macOS Test.app");
        touch(&bundle.join("Contents/MacOS/InstallAssistant"));
        touch(&bundle.join("Contents/Frameworks/OSInstall.framework/Versions/A/OSInstall"));

        let mut targets = signable_targets(&bundle);
        targets.sort();
        assert_eq!(targets.len(), 2);
        assert!(targets[0].ends_with("Contents/Frameworks/OSInstall.framework"));
        assert!(targets[1].ends_with("Contents/MacOS/InstallAssistant"));
    }

    #[test]
    fn skips_directories_themselves() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = dir.path().join("Install macOS Test.app");
        fs::create_dir_all(bundle.join("Contents/Resources")).unwrap();

        assert!(signable_targets(&bundle).is_empty());
    }

    #[tokio::test]
    async fn walk_completes_even_when_every_sign_call_fails() {
        // No codesign on the test host: every per-file call errors and is
        // discarded, and the walk still finishes.
        let dir = tempfile::tempdir().unwrap();
        let bundle = dir.path().join("Install macOS Test.app");
        touch(&bundle.join("Contents/MacOS/InstallAssistant"));
        touch(&bundle.join("Contents/Info.plist"));

        sign(&bundle).await;
    }
}
