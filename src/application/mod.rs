//! Use cases that coordinate archive inspection, planning, linking and the registry.

mod install;
mod remove;

pub use install::{InstallAction, InstallOutcome};
pub use remove::{RemoveAction, RemoveOutcome};
