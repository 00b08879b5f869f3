//! Installed package records and the registry that persists them.

mod model;
mod registry;

pub use model::Package;
pub use registry::{FoundPackage, PackageRegistry, default_registry_path};
