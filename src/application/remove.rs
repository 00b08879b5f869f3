//! Remove action - unlink, delete and unregister an installed package.

use anyhow::{Context, Result};
use log::debug;
use std::path::PathBuf;

use crate::install::{BinDirs, SymlinkManager, UnlinkReport};
use crate::package::{Package, PackageRegistry};
use crate::runtime::Runtime;

#[derive(Debug)]
pub struct RemoveOutcome {
    pub package: Package,
    pub unlinked: UnlinkReport,
    /// Set when the package is gone from disk but the registry could not be rewritten.
    pub registry_error: Option<anyhow::Error>,
}

pub struct RemoveAction<'a, R: Runtime> {
    runtime: &'a R,
    install_root: PathBuf,
    linker: SymlinkManager<'a, R>,
    registry: PackageRegistry<'a, R>,
}

impl<'a, R: Runtime> RemoveAction<'a, R> {
    pub fn new(
        runtime: &'a R,
        install_root: impl Into<PathBuf>,
        bin_dirs: BinDirs,
        registry: PackageRegistry<'a, R>,
    ) -> Self {
        let install_root = install_root.into();
        Self {
            runtime,
            linker: SymlinkManager::new(runtime, install_root.clone(), bin_dirs),
            install_root,
            registry,
        }
    }

    pub fn registry(&self) -> &PackageRegistry<'a, R> {
        &self.registry
    }

    /// Remove the package matching `name`.
    ///
    /// Links go first, then the package folder. The registry entry is dropped
    /// only after both succeeded, so a failed removal can be retried.
    #[tracing::instrument(skip(self))]
    pub fn remove(&mut self, name: &str) -> Result<RemoveOutcome> {
        let found = self.registry.lookup(name)?;
        let package = found.package;

        let unlinked = self.linker.unlink(&package)?;

        let package_dir = self.install_root.join(&package.folder_name);
        if self.runtime.entry_exists(&package_dir) {
            debug!("Removing package folder {:?}", package_dir);
            self.runtime
                .remove_dir_all(&package_dir)
                .with_context(|| format!("Could not remove {:?}", package_dir))?;
        } else {
            debug!("Package folder {:?} already gone", package_dir);
        }

        let registry_error = self.registry.remove_at(found.index).err();
        Ok(RemoveOutcome {
            package,
            unlinked,
            registry_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, kind_of};
    use crate::runtime::MockRuntime;
    use crate::test_utils::{test_bin_dir, test_home, test_root};
    use mockall::predicate::{always, eq};

    const DOCUMENT: &str = r#"[
        {"folderName": "tool-1.0", "name": "tool", "binaries": ["tool", "toolctl"], "global": true},
        {"folderName": "other", "binaries": ["other"]}
    ]"#;

    fn registry_path() -> PathBuf {
        test_home().join(".local/share/optager/pkgs.json")
    }

    fn bin_dirs() -> BinDirs {
        BinDirs {
            global: test_bin_dir(),
            user: test_home().join(".local/bin"),
        }
    }

    fn loaded(runtime: &mut MockRuntime) {
        runtime
            .expect_exists()
            .with(eq(registry_path()))
            .returning(|_| true);
        runtime
            .expect_read_to_string()
            .with(eq(registry_path()))
            .returning(|_| Ok(DOCUMENT.into()));
    }

    #[test]
    fn test_remove_unknown_package() {
        let mut runtime = MockRuntime::new();
        loaded(&mut runtime);
        runtime.expect_remove_file().never();
        runtime.expect_remove_dir_all().never();

        let registry = PackageRegistry::load(&runtime, registry_path());
        let mut action = RemoveAction::new(&runtime, test_root(), bin_dirs(), registry);
        let err = action.remove("nope").unwrap_err();

        assert_eq!(kind_of(&err), Some(ErrorKind::NotFound));
        assert_eq!(action.registry().len(), 2);
    }

    #[test]
    fn test_remove_by_display_name() {
        let mut runtime = MockRuntime::new();
        loaded(&mut runtime);

        let mut seq = mockall::Sequence::new();
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
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        runtime
            .expect_entry_exists()
            .with(eq(test_root().join("tool-1.0")))
            .returning(|_| true);
        runtime
            .expect_remove_dir_all()
            .with(eq(test_root().join("tool-1.0")))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        // Registry save
        runtime
            .expect_exists()
            .with(eq(registry_path().parent().unwrap().to_path_buf()))
            .returning(|_| true);
        runtime
            .expect_write()
            .with(eq(registry_path()), always(), eq(0o600_u32))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, content, _| {
                let saved: Vec<Package> = serde_json::from_slice(content).unwrap();
                assert_eq!(saved.len(), 1);
                assert_eq!(saved[0].folder_name, "other");
                Ok(())
            });

        let registry = PackageRegistry::load(&runtime, registry_path());
        let mut action = RemoveAction::new(&runtime, test_root(), bin_dirs(), registry);
        let outcome = action.remove("TOOL").unwrap();

        assert_eq!(outcome.package.folder_name, "tool-1.0");
        assert_eq!(outcome.unlinked.removed, vec!["tool"]);
        assert_eq!(outcome.unlinked.missing, vec!["toolctl"]);
        assert!(outcome.registry_error.is_none());
        assert_eq!(action.registry().len(), 1);
    }

    #[test]
    fn test_remove_keeps_entry_when_unlink_fails() {
        let mut runtime = MockRuntime::new();
        loaded(&mut runtime);

        runtime.expect_entry_exists().returning(|_| true);
        runtime
            .expect_remove_file()
            .with(eq(test_home().join(".local/bin/other")))
            .returning(|_| Err(anyhow::anyhow!("permission denied")));
        runtime.expect_remove_dir_all().never();
        runtime.expect_write().never();

        let registry = PackageRegistry::load(&runtime, registry_path());
        let mut action = RemoveAction::new(&runtime, test_root(), bin_dirs(), registry);
        assert!(action.remove("other").is_err());
        assert_eq!(action.registry().len(), 2);
    }

    #[test]
    fn test_remove_keeps_entry_when_folder_removal_fails() {
        let mut runtime = MockRuntime::new();
        loaded(&mut runtime);

        runtime.expect_entry_exists().returning(|_| true);
        runtime.expect_remove_file().returning(|_| Ok(()));
        runtime
            .expect_remove_dir_all()
            .with(eq(test_root().join("other")))
            .returning(|_| Err(anyhow::anyhow!("device busy")));
        runtime.expect_write().never();

        let registry = PackageRegistry::load(&runtime, registry_path());
        let mut action = RemoveAction::new(&runtime, test_root(), bin_dirs(), registry);
        let err = action.remove("other").unwrap_err();
        assert!(err.to_string().contains("Could not remove"));
        assert_eq!(action.registry().len(), 2);
    }

    #[test]
    fn test_remove_already_deleted_folder() {
        let mut runtime = MockRuntime::new();
        loaded(&mut runtime);

        runtime.expect_entry_exists().returning(|_| false);
        runtime.expect_remove_file().never();
        runtime.expect_remove_dir_all().never();
        runtime.expect_exists().returning(|_| true);
        runtime.expect_write().returning(|_, _, _| Ok(()));

        let registry = PackageRegistry::load(&runtime, registry_path());
        let mut action = RemoveAction::new(&runtime, test_root(), bin_dirs(), registry);
        let outcome = action.remove("other").unwrap();

        assert_eq!(outcome.unlinked.missing, vec!["other"]);
        assert_eq!(action.registry().len(), 1);
    }
}
