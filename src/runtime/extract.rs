//! Unpacking a compressed tar archive into a directory.

use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::path::Path;

use super::{RealRuntime, normalize_path};
use crate::archive::ArchiveFormat;

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) fn extract_impl(&self, archive: &Path, dest: &Path, within: &Path) -> Result<()> {
        let format = ArchiveFormat::from_path(archive)?;
        let file = fs::File::open(archive)
            .with_context(|| format!("Failed to open archive {:?}", archive))?;

        debug!("Unpacking {:?} ({:?}) into {:?}", archive, format, dest);
        let mut tar = tar::Archive::new(format.decompress(file));
        tar.set_preserve_permissions(true);
        let failed = || format!("Failed to extract {:?} into {:?}", archive, dest);
        for entry in tar.entries().with_context(failed)? {
            let mut entry = entry.with_context(failed)?;
            let path = normalize_path(&entry.path().with_context(failed)?);
            if path.as_os_str().is_empty() || !path.starts_with(within) {
                debug!("Skipping {:?} outside of {:?}", path, within);
                continue;
            }
            entry.unpack_in(dest).with_context(failed)?;
        }
        Ok(())
    }
}
