// gotree-core/src/build/mod.rs
//! Go package discovery: where a package lives and what it imports.
pub mod constraint;
pub mod context;
pub mod gomod;
pub mod importer;
pub mod scan;

pub use context::BuildContext;
pub use importer::GoResolver;
