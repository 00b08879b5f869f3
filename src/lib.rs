pub mod application;
pub mod archive;
pub mod commands;
pub mod error;
pub mod install;
pub mod package;
pub mod runtime;

pub use error::{Error, ErrorKind};
