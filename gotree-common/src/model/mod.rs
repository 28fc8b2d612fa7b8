// gotree-common/src/model/mod.rs
pub mod import_path;
pub mod package;

// Re-export
pub use import_path::{is_local_import, is_standard_package, CGO_PSEUDO_PACKAGE};
pub use package::PackageNode;
