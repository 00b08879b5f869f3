//! Symlink creation.

use anyhow::{Context, Result};
use std::path::Path;

use super::RealRuntime;

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) fn symlink_impl(&self, original: &Path, link: &Path) -> Result<()> {
        #[cfg(unix)]
        {
            std::os::unix::fs::symlink(original, link).context("Failed to create symlink")?;
            Ok(())
        }
        #[cfg(not(unix))]
        {
            anyhow::bail!(
                "Symlinks are not supported on this platform: link={:?} target={:?}",
                link,
                original
            );
        }
    }
}
