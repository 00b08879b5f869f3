//! Turning an archive [`Descriptor`] into an install: where to extract, which
//! binaries to expose, and whether the result is worth keeping.

mod symlink;

use log::debug;
use std::path::{Path, PathBuf};

use crate::archive::Descriptor;
use crate::package::Package;

pub use symlink::{BinDirs, LinkFailure, LinkReport, SymlinkManager, UnlinkReport};

/// User overrides applied on top of what the archive scan found.
#[derive(Debug, Clone, Default)]
pub struct InstallOptions {
    pub display_name: Option<String>,
    pub global: bool,
}

/// Where and how a package gets installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPlan {
    /// The package record; `binaries` are paths relative to `package_dir`.
    pub package: Package,
    /// `<install root>/<folder name>`
    pub package_dir: PathBuf,
    /// Directory the archive is unpacked into.
    pub extract_to: PathBuf,
    /// Archive prefix to unpack: the root folder, or empty for everything.
    pub extract_within: PathBuf,
    /// The archive has no root folder, so `package_dir` has to be created first.
    pub create_folder: bool,
}

/// What to do with a package once linking has been attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finalized {
    /// At least one binary was exposed: record this package.
    Keep(Package),
    /// Nothing was exposed: delete the package directory and record nothing.
    Discard { package_dir: PathBuf },
}

pub struct InstallPlanner {
    install_root: PathBuf,
}

impl InstallPlanner {
    pub fn new(install_root: impl Into<PathBuf>) -> Self {
        Self {
            install_root: install_root.into(),
        }
    }

    pub fn install_root(&self) -> &Path {
        &self.install_root
    }

    /// Decide the extraction target and the binaries to expose.
    #[tracing::instrument(skip(self))]
    pub fn plan(&self, descriptor: Descriptor, options: InstallOptions) -> InstallPlan {
        let Descriptor {
            folder_name,
            binaries,
            must_synthesize_folder,
        } = descriptor;

        let package_dir = self.install_root.join(&folder_name);
        let (extract_to, extract_within, binaries) = if must_synthesize_folder {
            // Archive paths are already relative to the folder we create
            (package_dir.clone(), PathBuf::new(), binaries)
        } else {
            let binaries = binaries
                .into_iter()
                .map(|b| strip_folder_prefix(&b, &folder_name))
                .collect();
            // Loose entries beside the root folder would land outside the package
            (
                self.install_root.clone(),
                PathBuf::from(&folder_name),
                binaries,
            )
        };
        debug!(
            "Extracting {} into {:?}, exposing {:?}",
            folder_name, extract_to, binaries
        );

        InstallPlan {
            package: Package {
                folder_name,
                display_name: options.display_name.filter(|n| !n.is_empty()),
                binaries,
                global: options.global,
            },
            package_dir,
            extract_to,
            extract_within,
            create_folder: must_synthesize_folder,
        }
    }

    /// Settle the plan once linking is done. `linked` holds the names of the symlinks
    /// that were actually created.
    pub fn finalize(&self, plan: InstallPlan, linked: Vec<String>) -> Finalized {
        if linked.is_empty() {
            return Finalized::Discard {
                package_dir: plan.package_dir,
            };
        }
        Finalized::Keep(Package {
            binaries: linked,
            ..plan.package
        })
    }
}

/// `tool-1.0/bin/tool` -> `bin/tool` for folder `tool-1.0`. Paths that are not
/// strictly inside the folder are returned unchanged.
fn strip_folder_prefix(binary: &str, folder_name: &str) -> String {
    match Path::new(binary).strip_prefix(folder_name) {
        Ok(rest) if !rest.as_os_str().is_empty() => rest.to_string_lossy().into_owned(),
        _ => binary.to_string(),
    }
}
