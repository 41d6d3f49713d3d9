//! Disk image lifecycle: create, attach, track, and tear down mounts.

mod image;
mod mount;

pub use image::{GUID_PARTITION_LAYOUT, ImageFormat, attach, convert, create, create_and_attach};
pub use mount::{cleanup_stale_mounts, is_mount_point, unmount};
