use anyhow::{Context, Result};
use log::debug;
use std::path::{Path, PathBuf};

use crate::install::BinDirs;
use crate::package::default_registry_path;
use crate::runtime::{Runtime, normalize_path};

pub const DEFAULT_INSTALL_ROOT: &str = "/opt";
pub const DEFAULT_GLOBAL_BIN_DIR: &str = "/usr/local/bin";

/// Resolved locations for a single invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub install_root: PathBuf,
    pub bin_dirs: BinDirs,
    pub registry_path: PathBuf,
}

impl Config {
    /// Fill in defaults for anything not given on the command line or in the environment.
    #[tracing::instrument(skip(runtime))]
    pub fn new<R: Runtime>(
        runtime: &R,
        install_root: Option<PathBuf>,
        global_bin_dir: Option<PathBuf>,
    ) -> Result<Self> {
        let home = runtime.home_dir().context("No home folder found")?;
        let install_root = install_root.unwrap_or_else(|| PathBuf::from(DEFAULT_INSTALL_ROOT));
        let global_bin_dir =
            global_bin_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_GLOBAL_BIN_DIR));
        let config = Self {
            install_root: absolute(runtime, &install_root)?,
            bin_dirs: BinDirs {
                global: absolute(runtime, &global_bin_dir)?,
                user: home.join(".local").join("bin"),
            },
            registry_path: default_registry_path(runtime)?,
        };
        debug!("Using {:?}", config);
        Ok(config)
    }
}

/// Link targets are stored as given, so every directory has to be absolute.
fn absolute<R: Runtime>(runtime: &R, path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = runtime
        .current_dir()
        .with_context(|| format!("Cannot resolve {:?}", path))?;
    Ok(normalize_path(&cwd.join(path)))
}
