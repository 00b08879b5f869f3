//! JSON-backed registry of installed packages.
//!
//! The whole document is read once when the registry is loaded and rewritten in
//! full after every mutation. There is no locking: concurrent invocations race
//! and the last writer wins.

use anyhow::{Context, Result};
use log::{debug, warn};
use std::fmt;
use std::path::{Path, PathBuf};

use super::Package;
use crate::error::Error;
use crate::runtime::Runtime;

const REGISTRY_DIR_MODE: u32 = 0o700;
const REGISTRY_FILE_MODE: u32 = 0o600;

/// A lookup hit: the package and its position in the registry.
///
/// The index is only meaningful until the registry is mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundPackage {
    pub index: usize,
    pub package: Package,
}

/// Ordered list of installed packages, keyed by folder name.
pub struct PackageRegistry<'a, R: Runtime> {
    runtime: &'a R,
    path: PathBuf,
    packages: Vec<Package>,
}

impl<'a, R: Runtime> PackageRegistry<'a, R> {
    /// Load the registry at `path`.
    ///
    /// A missing or unreadable document yields an empty registry; a malformed one is
    /// logged and discarded.
    #[tracing::instrument(skip(runtime))]
    pub fn load(runtime: &'a R, path: PathBuf) -> Self {
        let packages = if runtime.exists(&path) {
            match runtime.read_to_string(&path) {
                Ok(content) => match serde_json::from_str::<Vec<Package>>(&content) {
                    Ok(packages) => packages,
                    Err(e) => {
                        warn!("Ignoring malformed package list {:?}: {}", path, e);
                        Vec::new()
                    }
                },
                Err(e) => {
                    warn!("Could not read package list {:?}: {}", path, e);
                    Vec::new()
                }
            }
        } else {
            debug!("No package list at {:?}, starting empty", path);
            Vec::new()
        };

        Self {
            runtime,
            path,
            packages,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Whether a package with exactly this folder name is registered.
    pub fn contains(&self, folder_name: &str) -> bool {
        self.packages.iter().any(|p| p.folder_name == folder_name)
    }

    /// Find the first package whose display name or folder name matches `name`,
    /// ignoring case.
    pub fn lookup(&self, name: &str) -> Result<FoundPackage> {
        self.packages
            .iter()
            .position(|p| p.matches(name))
            .map(|index| FoundPackage {
                index,
                package: self.packages[index].clone(),
            })
            .ok_or_else(|| Error::PackageNotFound(name.to_string()).into())
    }

    /// Append `package` and persist.
    ///
    /// Returns `Ok(false)` without touching the document when the folder name is
    /// already registered.
    #[tracing::instrument(skip(self))]
    pub fn add(&mut self, package: Package) -> Result<bool> {
        if self.contains(&package.folder_name) {
            debug!("{} is already registered", package.folder_name);
            return Ok(false);
        }
        self.packages.push(package);
        self.save()?;
        Ok(true)
    }

    /// Remove the package at `index` and persist.
    ///
    /// The in-memory removal stands even if persisting fails.
    #[tracing::instrument(skip(self))]
    pub fn remove_at(&mut self, index: usize) -> Result<Package> {
        if index >= self.packages.len() {
            return Err(Error::IndexOutOfBounds {
                index,
                len: self.packages.len(),
            }
            .into());
        }
        let removed = self.packages.remove(index);
        self.save()?;
        Ok(removed)
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !self.runtime.exists(parent)
        {
            self.runtime
                .create_dir_all(parent)
                .with_context(|| format!("Could not create folder {:?} for saving", parent))?;
            self.runtime.set_permissions(parent, REGISTRY_DIR_MODE)?;
        }

        let content = serde_json::to_string_pretty(&self.packages)
            .context("Could not serialize the package list")?;
        self.runtime
            .write(&self.path, content.as_bytes(), REGISTRY_FILE_MODE)
            .with_context(|| format!("Could not store changes to {:?}", self.path))?;
        Ok(())
    }
}

impl<R: Runtime> fmt::Display for PackageRegistry<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (global, local): (Vec<&Package>, Vec<&Package>) =
            self.packages.iter().partition(|p| p.global);

        write_group(f, "Global", &global)?;
        writeln!(f)?;
        write_group(f, "Local", &local)
    }
}

fn write_group(f: &mut fmt::Formatter<'_>, title: &str, packages: &[&Package]) -> fmt::Result {
    if packages.is_empty() {
        return write!(f, "{}: none", title);
    }
    write!(f, "{}:", title)?;
    for pkg in packages {
        write!(f, "\n   {}", pkg)?;
    }
    Ok(())
}

/// `$XDG_DATA_HOME/optager/pkgs.json`, or `~/.local/share/optager/pkgs.json` when the
/// variable is unset or empty.
#[tracing::instrument(skip(runtime))]
pub fn default_registry_path<R: Runtime>(runtime: &R) -> Result<PathBuf> {
    let data_home = match runtime.env_var("XDG_DATA_HOME") {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => runtime
            .home_dir()
            .context("No home folder found")?
            .join(".local")
            .join("share"),
    };
    Ok(data_home.join("optager").join("pkgs.json"))
}
