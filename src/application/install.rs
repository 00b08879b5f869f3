//! Install action - inspect, extract, link and register an archive.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

use crate::archive::{self, ArchiveFormat};
use crate::error::Error;
use crate::install::{BinDirs, Finalized, InstallOptions, InstallPlanner, LinkFailure, SymlinkManager};
use crate::package::{Package, PackageRegistry};
use crate::runtime::Runtime;

#[derive(Debug)]
pub struct InstallOutcome {
    /// The package as recorded, with the names of the links that were created.
    pub package: Package,
    pub link_failures: Vec<LinkFailure>,
    /// Set when the package is installed but could not be written to the registry.
    pub registry_error: Option<anyhow::Error>,
}

pub struct InstallAction<'a, R: Runtime> {
    runtime: &'a R,
    planner: InstallPlanner,
    linker: SymlinkManager<'a, R>,
    registry: PackageRegistry<'a, R>,
}

impl<'a, R: Runtime> InstallAction<'a, R> {
    pub fn new(
        runtime: &'a R,
        install_root: impl Into<PathBuf>,
        bin_dirs: BinDirs,
        registry: PackageRegistry<'a, R>,
    ) -> Self {
        let install_root = install_root.into();
        Self {
            runtime,
            planner: InstallPlanner::new(install_root.clone()),
            linker: SymlinkManager::new(runtime, install_root, bin_dirs),
            registry,
        }
    }

    pub fn registry(&self) -> &PackageRegistry<'a, R> {
        &self.registry
    }

    /// Install the archive at `archive`.
    ///
    /// Nothing is written before the archive has been fully inspected. Once
    /// extraction has started, any failure removes the package folder again.
    #[tracing::instrument(skip(self))]
    pub fn install(&mut self, archive: &Path, options: InstallOptions) -> Result<InstallOutcome> {
        if !self.runtime.exists(archive) {
            return Err(Error::PathNotFound(archive.to_path_buf()).into());
        }
        if self.runtime.is_dir(archive) {
            return Err(Error::PathIsDirectory(archive.to_path_buf()).into());
        }

        let format = ArchiveFormat::from_path(archive)?;
        let archive_name = archive
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let reader = self.runtime.open(archive)?;
        let descriptor = archive::inspect(format.decompress(reader), &archive_name)
            .with_context(|| format!("Failed to inspect {:?}", archive))?;
        debug!("Inspected {:?}: {:?}", archive, descriptor);

        let plan = self.planner.plan(descriptor, options);
        let folder_name = plan.package.folder_name.clone();
        if self.registry.contains(&folder_name) {
            return Err(Error::AlreadyInstalled(folder_name).into());
        }
        if self.runtime.entry_exists(&plan.package_dir) {
            return Err(Error::FolderExists(plan.package_dir).into());
        }
        if plan.package.global && !self.runtime.is_privileged() {
            warn!("Installing globally without elevated privileges, linking may fail");
        }

        self.runtime
            .create_dir_all(&plan.extract_to)
            .with_context(|| format!("Failed to create {:?}", plan.extract_to))?;
        info!("Extracting {:?} into {:?}", archive, plan.extract_to);
        if let Err(e) = self
            .runtime
            .extract(archive, &plan.extract_to, &plan.extract_within)
        {
            self.discard(&plan.package_dir);
            return Err(e);
        }

        let report = match self.linker.link(&plan.package) {
            Ok(report) => report,
            Err(e) => {
                self.discard(&plan.package_dir);
                return Err(e);
            }
        };

        let package = match self.planner.finalize(plan, report.linked) {
            Finalized::Keep(package) => package,
            Finalized::Discard { package_dir } => {
                self.discard(&package_dir);
                return Err(Error::NoUsableBinaries(folder_name).into());
            }
        };

        let registry_error = match self.registry.add(package.clone()) {
            Ok(_) => None,
            Err(e) => {
                warn!("{} is installed but could not be registered: {:#}", package, e);
                Some(e)
            }
        };

        Ok(InstallOutcome {
            package,
            link_failures: report.failures,
            registry_error,
        })
    }

    fn discard(&self, package_dir: &Path) {
        if !self.runtime.entry_exists(package_dir) {
            return;
        }
        debug!("Removing {:?}", package_dir);
        if let Err(e) = self.runtime.remove_dir_all(package_dir) {
            warn!("Could not clean up {:?}: {:#}", package_dir, e);
        }
    }
}
