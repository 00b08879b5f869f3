use std::path::PathBuf;
use thiserror::Error;

/// Conditions the installer reports to its caller.
///
/// Functions return `anyhow::Result`; these values travel inside it and can be
/// recovered with `downcast_ref::<Error>()`.
#[derive(Debug, Error)]
pub enum Error {
    #[error("specified path does not exist: {0}")]
    PathNotFound(PathBuf),

    #[error("specified path is a directory: {0}")]
    PathIsDirectory(PathBuf),

    #[error("archive not supported: {0}")]
    UnsupportedFormat(PathBuf),

    #[error(
        "archive contains {} folders ({}) and thus is not supposed to be installed into the install root",
        .folders.len(),
        .folders.join(", ")
    )]
    TooManyRootFolders { folders: Vec<String> },

    #[error("archive contains no binaries")]
    NoBinaries,

    #[error("no binaries of {0} could be linked")]
    NoUsableBinaries(String),

    #[error("package {0} is already installed")]
    AlreadyInstalled(String),

    #[error("{0} already exists in the install root")]
    FolderExists(PathBuf),

    #[error("package not found: {0}")]
    PackageNotFound(String),

    #[error("index {index} out of bounds for {len} installed packages")]
    IndexOutOfBounds { index: usize, len: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The archive path is unusable, or the install would clobber existing state.
    Validation,
    /// Unsupported container or compression.
    Format,
    /// The archive does not fit the one-folder-with-binaries install model.
    Integrity,
    /// A registry lookup or index did not resolve.
    NotFound,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::PathNotFound(_)
            | Error::PathIsDirectory(_)
            | Error::AlreadyInstalled(_)
            | Error::FolderExists(_) => ErrorKind::Validation,
            Error::UnsupportedFormat(_) => ErrorKind::Format,
            Error::TooManyRootFolders { .. } | Error::NoBinaries | Error::NoUsableBinaries(_) => {
                ErrorKind::Integrity
            }
            Error::PackageNotFound(_) | Error::IndexOutOfBounds { .. } => ErrorKind::NotFound,
        }
    }
}

/// Returns the [`ErrorKind`] of an `anyhow` error if it carries an [`Error`].
pub fn kind_of(err: &anyhow::Error) -> Option<ErrorKind> {
    err.downcast_ref::<Error>().map(Error::kind)
}
