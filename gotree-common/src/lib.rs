// gotree-common/src/lib.rs
pub mod config;
pub mod error;
pub mod model;
pub mod resolver;

// Re-export key types
pub use config::{Config, ModuleMode, VendorMode};
pub use error::{GoTreeError, Result};
pub use model::PackageNode;
pub use resolver::Resolver;
