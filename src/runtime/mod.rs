//! Runtime abstraction for system operations.
//!
//! Every side effect the installer performs goes through the [`Runtime`] trait so
//! that planning, linking and registry code can be exercised against a mock.
//!
//! # Structure
//!
//! - `path` - Lexical path helpers (normalize)
//! - `env` - Environment variables, home directory and privilege
//! - `fs` - File system operations (read, write, directory, permissions)
//! - `symlink` - Symlink creation
//! - `extract` - Unpacking a compressed tar archive into a directory

mod env;
mod extract;
mod fs;
pub mod path;
mod symlink;

use anyhow::Result;
use std::env as std_env;
use std::path::{Path, PathBuf};

pub use path::normalize_path;

#[cfg_attr(test, mockall::automock)]
pub trait Runtime {
    // Environment
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError>;
    fn home_dir(&self) -> Option<PathBuf>;
    fn current_dir(&self) -> Result<PathBuf>;

    // Privilege
    fn is_privileged(&self) -> bool;

    // File System
    /// Whether `path` exists, following symlinks.
    fn exists(&self, path: &Path) -> bool;
    /// Whether anything exists at `path` without following symlinks.
    /// A dangling symlink counts as present.
    fn entry_exists(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    fn open(&self, path: &Path) -> Result<Box<dyn std::io::Read + Send>>;
    fn read_to_string(&self, path: &Path) -> Result<String>;
    /// Create or truncate `path` and write `contents`. On Unix the file has permission
    /// bits `mode` before any content is written, also when it already existed.
    fn write(&self, path: &Path, contents: &[u8], mode: u32) -> Result<()>;
    /// Set file permissions (mode) on Unix systems. No-op elsewhere.
    fn set_permissions(&self, path: &Path, mode: u32) -> Result<()>;
    fn create_dir_all(&self, path: &Path) -> Result<()>;
    fn remove_file(&self, path: &Path) -> Result<()>;
    fn remove_dir_all(&self, path: &Path) -> Result<()>;

    // Symlinks
    fn symlink(&self, original: &Path, link: &Path) -> Result<()>;

    // Archives
    /// Unpack the compressed tar archive at `archive` into the existing directory `dest`,
    /// preserving permission bits and symlinks. Only entries under `within` are unpacked;
    /// an empty `within` unpacks everything.
    fn extract(&self, archive: &Path, dest: &Path, within: &Path) -> Result<()>;
}

pub struct RealRuntime;

impl Runtime for RealRuntime {
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError> {
        self.env_var_impl(key)
    }

    fn home_dir(&self) -> Option<PathBuf> {
        self.home_dir_impl()
    }

    fn current_dir(&self) -> Result<PathBuf> {
        self.current_dir_impl()
    }

    fn is_privileged(&self) -> bool {
        self.is_privileged_impl()
    }

    fn exists(&self, path: &Path) -> bool {
        self.exists_impl(path)
    }

    fn entry_exists(&self, path: &Path) -> bool {
        self.entry_exists_impl(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.is_dir_impl(path)
    }

    fn open(&self, path: &Path) -> Result<Box<dyn std::io::Read + Send>> {
        self.open_impl(path)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.read_to_string_impl(path)
    }

    fn write(&self, path: &Path, contents: &[u8], mode: u32) -> Result<()> {
        self.write_impl(path, contents, mode)
    }

    fn set_permissions(&self, path: &Path, mode: u32) -> Result<()> {
        self.set_permissions_impl(path, mode)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.create_dir_all_impl(path)
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        self.remove_file_impl(path)
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        self.remove_dir_all_impl(path)
    }

    fn symlink(&self, original: &Path, link: &Path) -> Result<()> {
        self.symlink_impl(original, link)
    }

    fn extract(&self, archive: &Path, dest: &Path, within: &Path) -> Result<()> {
        self.extract_impl(archive, dest, within)
    }
}
