//! installmedia - macOS installer media generator.
//!
//! This binary assembles distributable installer artifacts (.app, .dmg,
//! .iso, .pkg, bootable volumes) from installer components that a
//! downloader has already placed on local storage.

use installmedia::cli;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Run CLI and get exit code
    let exit_code = match cli::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };

    std::process::exit(exit_code);
}
