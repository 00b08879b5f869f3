//! Archive handling: compression detection, executable detection and the
//! single-pass inspection that turns an archive into a [`Descriptor`].

mod detect;
mod inspect;

use anyhow::Result;
use flate2::read::GzDecoder;
use std::io::Read;
use std::path::Path;
use xz2::read::XzDecoder;

use crate::error::Error;

pub use detect::{SNIFF_LEN, is_executable};
pub use inspect::{inspect, strip_extensions};

/// Compressed tar formats that can be installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    TarXz,
}

impl ArchiveFormat {
    /// Detect the compression from the archive's file name.
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        if name.ends_with(".gz") || name.ends_with(".tgz") {
            Ok(Self::TarGz)
        } else if name.ends_with(".xz") || name.ends_with(".txz") {
            Ok(Self::TarXz)
        } else {
            Err(Error::UnsupportedFormat(path.to_path_buf()).into())
        }
    }

    /// Wrap `reader` so that it yields the decompressed tar stream.
    pub fn decompress<'a, R: Read + 'a>(self, reader: R) -> Box<dyn Read + 'a> {
        match self {
            Self::TarGz => Box::new(GzDecoder::new(reader)),
            Self::TarXz => Box::new(XzDecoder::new(reader)),
        }
    }
}

/// What an archive scan found, before install-time overrides are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    /// The archive's single root folder, or a synthesized name when it has none.
    pub folder_name: String,
    /// Archive-relative paths of the executables to expose, in archive order.
    pub binaries: Vec<String>,
    /// True when the archive has no root folder and one must be created for it.
    pub must_synthesize_folder: bool,
}
