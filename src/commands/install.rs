use anyhow::Result;
use log::debug;
use std::path::Path;

use crate::application::InstallAction;
use crate::install::InstallOptions;
use crate::package::PackageRegistry;
use crate::runtime::Runtime;

use super::config::Config;
use super::join_quoted;

/// Install an archive into the install root
#[tracing::instrument(skip(runtime, config))]
pub fn install<R: Runtime>(
    runtime: R,
    archive: &Path,
    options: InstallOptions,
    config: Config,
) -> Result<()> {
    debug!("Using install root: {:?}", config.install_root);
    let registry = PackageRegistry::load(&runtime, config.registry_path.clone());
    let mut action = InstallAction::new(
        &runtime,
        config.install_root.clone(),
        config.bin_dirs.clone(),
        registry,
    );

    let outcome = action.install(archive, options)?;
    let package = &outcome.package;

    println!(
        "Installed {} into {}",
        package,
        config.install_root.join(&package.folder_name).display()
    );
    if !outcome.link_failures.is_empty() {
        println!(
            "{} of {} binaries could not be linked",
            outcome.link_failures.len(),
            outcome.link_failures.len() + package.binaries.len()
        );
    }
    if outcome.registry_error.is_some() {
        println!(
            "Note: {} is not in the package list and has to be removed by hand",
            package.folder_name
        );
    }
    println!(
        "You can now use {} in the command line",
        join_quoted(&package.binaries)
    );
    Ok(())
}
