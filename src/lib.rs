//! macOS installer media generator
//!
//! Turns downloaded installer components into distributable artifacts:
//! - installer applications (.app)
//! - compressed disk images (.dmg)
//! - bootable ISOs (.iso)
//! - installer packages (.pkg)
//! - bootable installer volumes
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod cli;
pub mod error;
pub mod generator;
pub mod installer;
pub mod process;

// Re-export commonly used types
pub use error::{CliError, Error, Result};
