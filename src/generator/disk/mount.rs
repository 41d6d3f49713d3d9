//! Mount-point tracking and escalating unmount.
//!
//! Mount points are a machine-global resource: a previous crashed run can
//! leave a volume attached at one of our deterministic paths. Nothing here
//! caches mount state; every decision re-queries the live mount table.
//!
//! Unmounting is best-effort by design. A stuck mount must never discard an
//! artifact that was already produced, so [`unmount`] reports failure as a
//! warning and `false`, never as an error.

use crate::installer::Installer;
use crate::process;
use std::path::Path;
use std::time::Duration;
use tokio::time::sleep;

/// Forced-detach attempts before falling back to `diskutil`.
const DETACH_ATTEMPTS: u32 = 3;
/// Fixed delay between detach attempts. Not exponential: the common cause
/// is Spotlight or fseventsd holding the volume for a moment.
const DETACH_RETRY_DELAY: Duration = Duration::from_secs(2);
/// Settle time after each fallback before re-checking the mount table.
const FALLBACK_SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Whether `path` is currently an active mount point.
///
/// Queries the mount table once. If the listing cannot be obtained the
/// answer is `false`: treating "unknown" as "not mounted" keeps cleanup
/// from double-unmounting or blocking on a stale assumption.
pub async fn is_mount_point(path: &Path) -> bool {
    match process::run(&["mount"]).await {
        Ok(output) => mount_table_contains(&output.stdout, path),
        Err(err) => {
            log::debug!("could not read mount table: {err}");
            false
        }
    }
}

/// Exact space-bounded match against the mount table, so `/Volumes/Foo`
/// never matches an entry for `/Volumes/FooBar`.
fn mount_table_contains(table: &str, path: &Path) -> bool {
    let needle = format!(" {} ", path.display());
    table.lines().any(|line| line.contains(&needle))
}

/// Tear down a mounted volume, escalating through three strategies.
///
/// 1. no-op when the path is not mounted;
/// 2. up to [`DETACH_ATTEMPTS`] forced `hdiutil detach` calls with a fixed
///    delay between failures;
/// 3. forced `diskutil unmount`, best-effort eject, re-check;
/// 4. raw `umount -f`, re-check.
///
/// Returns `false` (after a logged warning) when everything failed; a later
/// run's stale-mount cleanup or manual intervention can clear it.
pub async fn unmount(mount_point: &Path) -> bool {
    if !is_mount_point(mount_point).await {
        return true;
    }

    let path = mount_point.to_string_lossy();

    for attempt in 1..=DETACH_ATTEMPTS {
        match process::run(&["hdiutil", "detach", &path, "-force"]).await {
            Ok(_) => return true,
            Err(err) => {
                log::debug!(
                    "hdiutil detach attempt {attempt}/{DETACH_ATTEMPTS} for '{path}' failed: {err}"
                );
                if attempt < DETACH_ATTEMPTS {
                    sleep(DETACH_RETRY_DELAY).await;
                }
            }
        }
    }

    let _ = process::run(&["diskutil", "unmount", "force", &path]).await;
    sleep(FALLBACK_SETTLE_DELAY).await;
    let _ = process::run(&["diskutil", "eject", &path]).await;
    if !is_mount_point(mount_point).await {
        return true;
    }

    let _ = process::run(&["umount", "-f", &path]).await;
    sleep(FALLBACK_SETTLE_DELAY).await;
    if !is_mount_point(mount_point).await {
        return true;
    }

    log::warn!(
        "unable to unmount '{}'; a later run or manual cleanup can clear it",
        mount_point.display()
    );
    false
}

/// Clear mounts left behind by a crashed or interrupted run.
///
/// Checks the installer's primary and ISO mount points against the live
/// mount table and unmounts whichever are active. Invoked once at the
/// start of a run, before the first attach; later attaches clear only
/// their own target mount point, since by then the primary volume is
/// live and in use.
pub async fn cleanup_stale_mounts(installer: &Installer) {
    for mount_point in [
        installer.disk_image_mount_point(),
        installer.iso_mount_point(),
    ] {
        if is_mount_point(&mount_point).await {
            log::info!("clearing stale mount at '{}'", mount_point.display());
            let _ = unmount(&mount_point).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    const TABLE: &str = "\
/dev/disk1s1 on / (apfs, local, read-only, journaled)
/dev/disk2s1 on /Volumes/Install macOS Test (hfs, local, nodev, nosuid, journaled, noowners)
/dev/disk3s2 on /Volumes/FooBar (hfs, local, nodev, nosuid)
";

    #[test]
    fn exact_entry_matches() {
        assert!(mount_table_contains(
            TABLE,
            Path::new("/Volumes/Install macOS Test")
        ));
        assert!(mount_table_contains(TABLE, Path::new("/Volumes/FooBar")));
    }

    #[test]
    fn absent_entry_does_not_match() {
        assert!(!mount_table_contains(TABLE, Path::new("/Volumes/Missing")));
    }

    #[test]
    fn path_prefix_does_not_match() {
        // "/Volumes/Foo" is a strict prefix of a mounted path, not a mount.
        assert!(!mount_table_contains(TABLE, Path::new("/Volumes/Foo")));
        assert!(!mount_table_contains(
            TABLE,
            Path::new("/Volumes/Install macOS")
        ));
    }

    #[tokio::test]
    async fn unmount_of_unmounted_path_is_a_no_op() {
        // Not in any mount table, so unmount must succeed without ever
        // reaching for a detach tool.
        assert!(unmount(Path::new("/Volumes/installmedia-test-absent")).await);
    }

    #[tokio::test]
    async fn is_mount_point_is_false_for_absent_path() {
        assert!(!is_mount_point(Path::new("/Volumes/installmedia-test-absent")).await);
    }
}
