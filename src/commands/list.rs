use anyhow::Result;

use crate::package::PackageRegistry;
use crate::runtime::Runtime;

use super::config::Config;

/// Print installed packages grouped by bin directory
#[tracing::instrument(skip(runtime, config))]
pub fn list<R: Runtime>(runtime: R, config: Config) -> Result<()> {
    let registry = PackageRegistry::load(&runtime, config.registry_path);
    println!("{}", registry);
    Ok(())
}
