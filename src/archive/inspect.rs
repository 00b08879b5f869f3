//! Single forward pass over a tar stream that works out which folder an archive
//! installs into and which of its entries are executables.

use anyhow::{Context, Result};
use log::{debug, warn};
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use super::{Descriptor, detect::is_executable};
use crate::error::Error;
use crate::runtime::normalize_path;

/// Entries nested deeper than this are not classified, unless a symlink points at them.
const MAX_CLASSIFIED_DEPTH: usize = 2;

/// Scan a decompressed tar stream and describe the package it contains.
///
/// `archive_name` is the archive's file name, used to name the package folder when
/// the archive has no root folder and more than one binary.
#[tracing::instrument(skip(reader))]
pub fn inspect<R: Read>(reader: R, archive_name: &str) -> Result<Descriptor> {
    let mut archive = tar::Archive::new(reader);
    let mut scan = Scan::default();

    for entry in archive.entries().context("Failed to read archive")? {
        let mut entry = entry.context("Failed to read archive entry")?;
        let path = normalize_path(&entry.path().context("Invalid entry path")?);
        let kind = entry.header().entry_type();

        if kind.is_dir() {
            scan.visit_dir(&path);
        } else if kind.is_symlink() {
            let link_name = entry
                .link_name()
                .context("Invalid symlink target")?
                .map(|l| l.into_owned());
            if let Some(link_name) = link_name {
                scan.visit_symlink(&path, &link_name);
            }
        } else if kind.is_file() {
            if scan.is_classified(&path) {
                let mode = entry.header().mode().unwrap_or(0);
                if is_executable(mode, &path, &mut entry) {
                    scan.accept_binary(path);
                }
            }
        } else if kind.is_pax_global_extensions() {
            debug!("Skipping pax global header");
        } else {
            warn!("Unknown filetype {:?} in {:?}, skipping", kind, path);
        }
    }

    scan.finish(archive_name)
}

/// Strip every extension from an archive file name: `tool.tar.gz` becomes `tool`.
pub fn strip_extensions(name: &str) -> &str {
    let mut stem = name;
    while let Some(idx) = stem.rfind('.') {
        stem = &stem[..idx];
    }
    stem
}

fn depth(path: &Path) -> usize {
    path.parent().map_or(0, |p| p.components().count())
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[derive(Default)]
struct Scan {
    root_folders: Vec<String>,
    bin_dir: Option<PathBuf>,
    binaries: Vec<String>,
    /// Resolved symlink target -> the symlink's own name.
    symlink_targets: HashMap<PathBuf, String>,
    /// Path of an accepted regular file -> its slot in `binaries`.
    accepted: HashMap<PathBuf, usize>,
}

impl Scan {
    fn is_classified(&self, path: &Path) -> bool {
        depth(path) <= MAX_CLASSIFIED_DEPTH || self.symlink_targets.contains_key(path)
    }

    fn visit_dir(&mut self, path: &Path) {
        if path.as_os_str().is_empty() {
            // The archive root itself ("./")
            return;
        }
        match depth(path) {
            0 => {
                let name = path_string(path);
                if !self.root_folders.contains(&name) {
                    self.root_folders.push(name);
                }
            }
            1 if path.file_name().is_some_and(|n| n == "bin") => {
                self.bin_dir = Some(path.to_path_buf());
            }
            _ => {}
        }
    }

    fn visit_symlink(&mut self, path: &Path, link_name: &Path) {
        if depth(path) > MAX_CLASSIFIED_DEPTH {
            return;
        }
        let parent = path.parent().unwrap_or(Path::new(""));
        let target = normalize_path(&parent.join(link_name));
        let name = path_string(path);
        debug!("Symlink {} points to {:?}", name, target);

        // The target may already have been accepted if it came first in the archive
        if let Some(&slot) = self.accepted.get(&target) {
            self.binaries[slot] = name.clone();
        }
        self.symlink_targets.insert(target, name);
    }

    fn accept_binary(&mut self, path: PathBuf) {
        let name = self
            .symlink_targets
            .get(&path)
            .cloned()
            .unwrap_or_else(|| path_string(&path));
        debug!("Found binary {}", name);
        self.accepted.insert(path, self.binaries.len());
        self.binaries.push(name);
    }

    fn finish(self, archive_name: &str) -> Result<Descriptor> {
        let Scan {
            mut root_folders,
            bin_dir,
            mut binaries,
            ..
        } = self;

        if root_folders.len() > 1 {
            return Err(Error::TooManyRootFolders {
                folders: root_folders,
            }
            .into());
        }

        // Only entries inside the root folder end up in the package
        if let Some(root) = root_folders.first() {
            binaries.retain(|b| {
                let inside = Path::new(b)
                    .strip_prefix(root)
                    .is_ok_and(|rest| !rest.as_os_str().is_empty());
                if !inside {
                    debug!("Ignoring {} outside of {}", b, root);
                }
                inside
            });
        }

        if let Some(bin_dir) = bin_dir {
            binaries.retain(|b| Path::new(b).starts_with(&bin_dir));
        }

        if binaries.is_empty() {
            return Err(Error::NoBinaries.into());
        }

        let (folder_name, must_synthesize_folder) = match root_folders.pop() {
            Some(folder) => (folder, false),
            None => (synthesize_folder_name(&binaries, archive_name), true),
        };

        Ok(Descriptor {
            folder_name,
            binaries,
            must_synthesize_folder,
        })
    }
}

fn synthesize_folder_name(binaries: &[String], archive_name: &str) -> String {
    if let [only] = binaries
        && let Some(base) = Path::new(only).file_name()
    {
        return base.to_string_lossy().into_owned();
    }

    let file_name = Path::new(archive_name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| archive_name.to_string());
    match strip_extensions(&file_name) {
        "" => file_name.clone(),
        stem => stem.to_string(),
    }
}
