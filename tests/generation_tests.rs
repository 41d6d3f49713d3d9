//! Pipeline-level tests that exercise the generator without reaching the
//! platform tools: precondition failures, teardown, and strategy
//! selection over realistic metadata.

use installmedia::error::Error;
use installmedia::generator::{
    AssemblyStrategy, GenerationOptions, Generator, OutputKind, artifact_destination,
};
use installmedia::installer::{ComponentPackage, Installer};

fn test_installer(identifier: &str) -> Installer {
    Installer::new(identifier, "macOS Test", "12.6", "21G115", Vec::new())
}

fn options(input: &std::path::Path, output: &std::path::Path, kind: OutputKind) -> GenerationOptions {
    GenerationOptions {
        output_kinds: vec![kind],
        force: false,
        quiet: true,
        no_ansi: true,
        input_dir: input.to_path_buf(),
        output_dir: output.to_path_buf(),
        image_signing_identity: None,
        package_signing_identity: None,
        keychain: None,
        bootable_volume: None,
        image_size_gb: 16,
    }
}

#[tokio::test]
async fn existing_destination_without_force_fails_and_leaves_it_untouched() {
    for (index, kind) in [
        OutputKind::Application,
        OutputKind::Image,
        OutputKind::Iso,
        OutputKind::Package,
    ]
    .into_iter()
    .enumerate()
    {
        let dir = tempfile::tempdir().unwrap();
        let installer = test_installer(&format!("gen-test-existing-{index}"));
        let options = options(dir.path(), dir.path(), kind);

        let destination = artifact_destination(&installer, &options, kind).unwrap();
        std::fs::write(&destination, b"previous artifact").unwrap();

        let result = Generator::new(installer, options).generate().await;
        match result {
            Err(Error::ExistingDestination { path }) => assert_eq!(path, destination),
            other => panic!("{kind:?}: expected ExistingDestination, got {other:?}"),
        }
        assert_eq!(std::fs::read(&destination).unwrap(), b"previous artifact");
    }
}

#[tokio::test]
async fn workspace_is_removed_after_a_failed_run() {
    let dir = tempfile::tempdir().unwrap();
    let installer = test_installer("gen-test-workspace");
    let workspace_root = installer.working_directory();
    let options = options(dir.path(), dir.path(), OutputKind::Image);

    let destination = artifact_destination(&installer, &options, OutputKind::Image).unwrap();
    std::fs::write(&destination, b"previous artifact").unwrap();

    let _ = Generator::new(installer, options).generate().await;
    assert!(!workspace_root.exists());
}

#[tokio::test]
async fn bootable_volume_requires_a_target() {
    let dir = tempfile::tempdir().unwrap();
    let installer = test_installer("gen-test-bootable");
    let mut options = options(dir.path(), dir.path(), OutputKind::BootableVolume);
    options.bootable_volume = None;

    // No destination preflight applies; the failure comes from the missing
    // volume, before any media-tool invocation.
    let result = Generator::new(installer, options).generate().await;
    assert!(result.is_err());
}

#[test]
fn strategy_selection_is_exclusive_over_realistic_catalogs() {
    let el_capitan = Installer::new(
        "031-62353",
        "OS X El Capitan",
        "10.11.6",
        "15G31",
        vec![ComponentPackage {
            filename: "InstallMacOSX.dmg".into(),
        }],
    );
    assert_eq!(
        AssemblyStrategy::select(&el_capitan),
        AssemblyStrategy::LegacyDiskImage
    );

    let monterey = Installer::new(
        "002-23774",
        "macOS Monterey",
        "12.6.1",
        "21G217",
        vec![ComponentPackage {
            filename: "InstallAssistant.pkg".into(),
        }],
    );
    assert_eq!(
        AssemblyStrategy::select(&monterey),
        AssemblyStrategy::InstallAssistant
    );

    let mojave = Installer::new(
        "041-88800",
        "macOS Mojave",
        "10.14.6",
        "18G103",
        vec![
            ComponentPackage {
                filename: "InstallAssistantAuto.pkg".into(),
            },
            ComponentPackage {
                filename: "InstallESDDmg.pkg".into(),
            },
            ComponentPackage {
                filename: "BaseSystem.dmg".into(),
            },
        ],
    );
    assert_eq!(
        AssemblyStrategy::select(&mojave),
        AssemblyStrategy::ManualAssembly
    );
}

#[test]
fn artifact_destinations_are_distinct_per_kind() {
    let dir = std::path::Path::new("/out");
    let installer = test_installer("gen-test-destinations");
    let options = options(dir, dir, OutputKind::Image);

    let mut destinations: Vec<_> = [
        OutputKind::Application,
        OutputKind::Image,
        OutputKind::Iso,
        OutputKind::Package,
    ]
    .into_iter()
    .map(|kind| artifact_destination(&installer, &options, kind).unwrap())
    .collect();
    destinations.sort();
    destinations.dedup();
    assert_eq!(destinations.len(), 4);

    assert!(
        artifact_destination(&installer, &options, OutputKind::BootableVolume).is_none()
    );
}
