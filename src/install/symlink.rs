use anyhow::{Context, Result, anyhow};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

use crate::package::Package;
use crate::runtime::Runtime;

/// The two directories binaries can be exposed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinDirs {
    /// Shared by all users, e.g. `/usr/local/bin`.
    pub global: PathBuf,
    /// Per user, e.g. `~/.local/bin`. Created on first use.
    pub user: PathBuf,
}

impl BinDirs {
    pub fn select(&self, global: bool) -> &Path {
        if global { &self.global } else { &self.user }
    }
}

#[derive(Debug)]
pub struct LinkFailure {
    pub binary: String,
    pub error: anyhow::Error,
}

#[derive(Debug, Default)]
pub struct LinkReport {
    /// Base names of the links that were created.
    pub linked: Vec<String>,
    pub failures: Vec<LinkFailure>,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct UnlinkReport {
    pub removed: Vec<String>,
    /// Links that were already gone.
    pub missing: Vec<String>,
}

/// Creates and removes the symlinks exposing a package's binaries.
pub struct SymlinkManager<'a, R: Runtime> {
    runtime: &'a R,
    install_root: PathBuf,
    bin_dirs: BinDirs,
}

impl<'a, R: Runtime> SymlinkManager<'a, R> {
    pub fn new(runtime: &'a R, install_root: impl Into<PathBuf>, bin_dirs: BinDirs) -> Self {
        Self {
            runtime,
            install_root: install_root.into(),
            bin_dirs,
        }
    }

    /// Link every binary of `package` into its bin directory.
    ///
    /// `package.binaries` are paths relative to the package folder. A binary that
    /// cannot be linked is reported in [`LinkReport::failures`] and does not stop
    /// the others; only an unusable bin directory is an error.
    #[tracing::instrument(skip(self, package), fields(folder = %package.folder_name))]
    pub fn link(&self, package: &Package) -> Result<LinkReport> {
        let bin_dir = self.bin_dirs.select(package.global);
        if !package.global && !self.runtime.is_dir(bin_dir) {
            debug!("Creating user bin directory {:?}", bin_dir);
            self.runtime
                .create_dir_all(bin_dir)
                .with_context(|| format!("Failed to create bin directory {:?}", bin_dir))?;
        }

        let package_dir = self.install_root.join(&package.folder_name);
        let mut report = LinkReport::default();
        for binary in &package.binaries {
            let Some(name) = Path::new(binary).file_name() else {
                warn!("Skipping binary without a file name: {:?}", binary);
                continue;
            };
            let source = package_dir.join(binary);
            let link = bin_dir.join(name);

            let linked = if self.runtime.exists(&source) {
                self.runtime.symlink(&source, &link)
            } else {
                Err(anyhow!("{:?} was not extracted", source))
            };
            match linked {
                Ok(()) => {
                    info!("Linked {:?} -> {:?}", link, source);
                    report.linked.push(name.to_string_lossy().into_owned());
                }
                Err(error) => {
                    warn!("Could not link {:?} to {:?}: {:#}", source, link, error);
                    report.failures.push(LinkFailure {
                        binary: binary.clone(),
                        error,
                    });
                }
            }
        }
        Ok(report)
    }

    /// Remove the links recorded for `package`. Links already gone are skipped;
    /// the first link that cannot be removed aborts with an error.
    #[tracing::instrument(skip(self, package), fields(folder = %package.folder_name))]
    pub fn unlink(&self, package: &Package) -> Result<UnlinkReport> {
        let bin_dir = self.bin_dirs.select(package.global);
        let mut report = UnlinkReport::default();
        for binary in &package.binaries {
            let link = bin_dir.join(binary);
            if !self.runtime.entry_exists(&link) {
                debug!("Link {:?} already gone", link);
                report.missing.push(binary.clone());
                continue;
            }
            self.runtime
                .remove_file(&link)
                .with_context(|| format!("Could not remove {} from {:?}", binary, bin_dir))?;
            report.removed.push(binary.clone());
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use crate::test_utils::{test_bin_dir, test_home, test_root};
    use mockall::predicate::eq;

    fn bin_dirs() -> BinDirs {
        BinDirs {
            global: test_bin_dir(),
            user: test_home().join(".local/bin"),
        }
    }

    fn package(binaries: &[&str], global: bool) -> Package {
        Package {
            folder_name: "tool-1.0".into(),
            display_name: None,
            binaries: binaries.iter().map(|b| b.to_string()).collect(),
            global,
        }
    }

    #[test]
    fn test_select_bin_dir() {
        let dirs = bin_dirs();
        assert_eq!(dirs.select(true), test_bin_dir());
        assert_eq!(dirs.select(false), test_home().join(".local/bin"));
    }

    #[test]
    fn test_link_global_uses_base_names() {
        let mut runtime = MockRuntime::new();
        runtime.expect_exists().returning(|_| true);

        runtime
            .expect_symlink()
            .with(
                eq(test_root().join("tool-1.0/bin/tool")),
                eq(test_bin_dir().join("tool")),
            )
            .returning(|_, _| Ok(()));
        runtime
            .expect_symlink()
            .with(
                eq(test_root().join("tool-1.0/toolctl")),
                eq(test_bin_dir().join("toolctl")),
            )
            .returning(|_, _| Ok(()));

        let manager = SymlinkManager::new(&runtime, test_root(), bin_dirs());
        let report = manager
            .link(&package(&["bin/tool", "toolctl"], true))
            .unwrap();

        assert_eq!(report.linked, vec!["tool", "toolctl"]);
        assert!(report.failures.is_empty());
    }

    #[test]
    fn test_link_user_creates_bin_dir() {
        let mut runtime = MockRuntime::new();
        let user_bin = test_home().join(".local/bin");

        runtime
            .expect_is_dir()
            .with(eq(user_bin.clone()))
            .returning(|_| false);
        runtime
            .expect_create_dir_all()
            .with(eq(user_bin.clone()))
            .times(1)
            .returning(|_| Ok(()));
        runtime
            .expect_exists()
            .with(eq(test_root().join("tool-1.0/tool")))
            .returning(|_| true);
        runtime
            .expect_symlink()
            .with(eq(test_root().join("tool-1.0/tool")), eq(user_bin.join("tool")))
            .returning(|_, _| Ok(()));

        let manager = SymlinkManager::new(&runtime, test_root(), bin_dirs());
        let report = manager.link(&package(&["tool"], false)).unwrap();

        assert_eq!(report.linked, vec!["tool"]);
    }

    #[test]
    fn test_link_user_bin_dir_uncreatable() {
        let mut runtime = MockRuntime::new();

        runtime.expect_is_dir().returning(|_| false);
        runtime
            .expect_create_dir_all()
            .returning(|_| Err(anyhow::anyhow!("permission denied")));
        runtime.expect_symlink().never();

        let manager = SymlinkManager::new(&runtime, test_root(), bin_dirs());
        assert!(manager.link(&package(&["tool"], false)).is_err());
    }

    #[test]
    fn test_link_failure_does_not_stop_others() {
        let mut runtime = MockRuntime::new();
        runtime.expect_exists().returning(|_| true);

        runtime
            .expect_symlink()
            .with(
                eq(test_root().join("tool-1.0/bin/tool")),
                eq(test_bin_dir().join("tool")),
            )
            .returning(|_, _| Err(anyhow::anyhow!("File exists")));
        runtime
            .expect_symlink()
            .with(
                eq(test_root().join("tool-1.0/bin/toolctl")),
                eq(test_bin_dir().join("toolctl")),
            )
            .returning(|_, _| Ok(()));

        let manager = SymlinkManager::new(&runtime, test_root(), bin_dirs());
        let report = manager
            .link(&package(&["bin/tool", "bin/toolctl"], true))
            .unwrap();

        assert_eq!(report.linked, vec!["toolctl"]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].binary, "bin/tool");
    }

    #[test]
    fn test_link_missing_source_is_a_failure() {
        let mut runtime = MockRuntime::new();

        runtime
            .expect_exists()
            .with(eq(test_root().join("tool-1.0/setup.sh")))
            .returning(|_| false);
        runtime
            .expect_exists()
            .with(eq(test_root().join("tool-1.0/bin/tool")))
            .returning(|_| true);
        runtime
            .expect_symlink()
            .with(
                eq(test_root().join("tool-1.0/bin/tool")),
                eq(test_bin_dir().join("tool")),
            )
            .times(1)
            .returning(|_, _| Ok(()));

        let manager = SymlinkManager::new(&runtime, test_root(), bin_dirs());
        let report = manager
            .link(&package(&["setup.sh", "bin/tool"], true))
            .unwrap();

        assert_eq!(report.linked, vec!["tool"]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].binary, "setup.sh");
    }

    #[test]
    fn test_unlink_skips_missing_links() {
        let mut runtime = MockRuntime::new();

        runtime
            .expect_entry_exists()
            .with(eq(test_bin_dir().join("tool")))
            .returning(|_| true);
        runtime
            .expect_entry_exists()
            .with(eq(test_bin_dir().join("toolctl")))
            .returning(|_| false);
        runtime
            .expect_remove_file()
            .with(eq(test_bin_dir().join("tool")))
            .times(1)
            .returning(|_| Ok(()));

        let manager = SymlinkManager::new(&runtime, test_root(), bin_dirs());
        let report = manager
            .unlink(&package(&["tool", "toolctl"], true))
            .unwrap();

        assert_eq!(
            report,
            UnlinkReport {
                removed: vec!["tool".into()],
                missing: vec!["toolctl".into()],
            }
        );
    }

    #[test]
    fn test_unlink_aborts_on_first_failure() {
        let mut runtime = MockRuntime::new();
        let user_bin = test_home().join(".local/bin");

        runtime.expect_entry_exists().returning(|_| true);
        runtime
            .expect_remove_file()
            .with(eq(user_bin.join("a")))
            .times(1)
            .returning(|_| Err(anyhow::anyhow!("permission denied")));
        runtime
            .expect_remove_file()
            .with(eq(user_bin.join("b")))
            .never();

        let manager = SymlinkManager::new(&runtime, test_root(), bin_dirs());
        let err = manager.unlink(&package(&["a", "b"], false)).unwrap_err();
        assert!(err.to_string().contains("Could not remove a"));
    }

    #[cfg(unix)]
    #[test]
    fn test_link_and_unlink_on_disk() {
        use crate::runtime::RealRuntime;
        use tempfile::tempdir;

        let dir = tempdir().unwrap();
        let root = dir.path().join("opt");
        let dirs = BinDirs {
            global: dir.path().join("global-bin"),
            user: dir.path().join("home/.local/bin"),
        };
        std::fs::create_dir_all(root.join("tool-1.0/bin")).unwrap();
        std::fs::write(root.join("tool-1.0/bin/tool"), "#!/bin/sh\n").unwrap();

        let runtime = RealRuntime;
        let manager = SymlinkManager::new(&runtime, &root, dirs.clone());
        let report = manager.link(&package(&["bin/tool"], false)).unwrap();
        assert_eq!(report.linked, vec!["tool"]);

        let link = dirs.user.join("tool");
        assert_eq!(
            std::fs::read_link(&link).unwrap(),
            root.join("tool-1.0/bin/tool")
        );

        let linked = Package {
            binaries: report.linked,
            ..package(&[], false)
        };
        manager.unlink(&linked).unwrap();
        assert!(std::fs::symlink_metadata(&link).is_err());
    }
}
