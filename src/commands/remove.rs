use anyhow::{Result, bail};
use log::{debug, warn};

use crate::application::RemoveAction;
use crate::error::{ErrorKind, kind_of};
use crate::package::PackageRegistry;
use crate::runtime::Runtime;

use super::config::Config;
use super::join_quoted;

/// Remove installed packages by display name or folder name
#[tracing::instrument(skip(runtime, config))]
pub fn remove<R: Runtime>(runtime: R, names: &[String], config: Config) -> Result<()> {
    let registry = PackageRegistry::load(&runtime, config.registry_path.clone());
    let mut action = RemoveAction::new(
        &runtime,
        config.install_root.clone(),
        config.bin_dirs.clone(),
        registry,
    );

    let mut removed = Vec::new();
    let mut failed = 0;
    for name in names {
        match action.remove(name) {
            Ok(outcome) => {
                debug!("Removed {}: {:?}", outcome.package, outcome.unlinked);
                if let Some(e) = outcome.registry_error {
                    warn!("{} is removed but the package list was not updated: {:#}", name, e);
                }
                removed.push(name.as_str());
            }
            Err(e) if kind_of(&e) == Some(ErrorKind::NotFound) => {
                eprintln!("Package {} is not installed, skipping", name);
            }
            Err(e) => {
                eprintln!("Could not remove {}: {:#}", name, e);
                failed += 1;
            }
        }
    }

    if removed.is_empty() {
        println!("No packages removed");
    } else {
        println!("Successfully removed {}", join_quoted(&removed));
    }
    if failed > 0 {
        bail!("{} package(s) could not be removed", failed);
    }
    Ok(())
}
