//! Per-run temporary workspace.
//!
//! One scratch root per installer per generation call, with a subdirectory
//! per stage. Created fresh (any leftovers from a crashed run are erased)
//! and removed during teardown; the ISO and package stages additionally
//! drop their own subdirectories as soon as their artifact has been moved
//! into place.

use crate::error::Result;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Scratch directory tree owned by a single generation run.
#[derive(Debug)]
pub struct TemporaryWorkspace {
    root: PathBuf,
}

impl TemporaryWorkspace {
    /// Erase and recreate the workspace root with its stage directories.
    pub async fn create(root: PathBuf) -> Result<Self> {
        remove_dir_idempotent(&root).await?;
        let workspace = Self { root };
        for dir in [
            workspace.disk_dir(),
            workspace.image_dir(),
            workspace.iso_dir(),
            workspace.package_dir(),
            workspace.expansion_dir(),
        ] {
            fs::create_dir_all(&dir).await?;
        }
        Ok(workspace)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Backing file for the primary assembly disk image.
    pub fn disk_dir(&self) -> PathBuf {
        self.root.join("disk")
    }

    /// Staging for the .dmg output.
    pub fn image_dir(&self) -> PathBuf {
        self.root.join("image")
    }

    /// Staging for the .iso output.
    pub fn iso_dir(&self) -> PathBuf {
        self.root.join("iso")
    }

    /// Staging for the .pkg output.
    pub fn package_dir(&self) -> PathBuf {
        self.root.join("package")
    }

    /// Scratch for `pkgutil --expand-full` during manual assembly.
    pub fn expansion_dir(&self) -> PathBuf {
        self.root.join("expansion")
    }

    /// Remove the whole workspace. Idempotent.
    pub async fn remove(&self) -> Result<()> {
        remove_dir_idempotent(&self.root).await
    }
}

/// Remove a directory tree, treating "already gone" as success.
pub async fn remove_dir_idempotent(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_erases_leftovers_from_a_previous_run() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("work");
        std::fs::create_dir_all(root.join("disk")).unwrap();
        std::fs::write(root.join("disk/stale.dmg"), b"stale").unwrap();

        let workspace = TemporaryWorkspace::create(root).await.unwrap();
        assert!(workspace.disk_dir().exists());
        assert!(!workspace.disk_dir().join("stale.dmg").exists());
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = TemporaryWorkspace::create(dir.path().join("work"))
            .await
            .unwrap();

        workspace.remove().await.unwrap();
        assert!(!workspace.root().exists());
        workspace.remove().await.unwrap();
    }
}
