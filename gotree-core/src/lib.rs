// gotree-core/src/lib.rs

// Declare the top-level modules within the library crate
pub mod build;
pub mod filter;
pub mod walker;

// Re-export key types for easier use by the CLI crate
pub use build::GoResolver;
pub use filter::ImportFilter;
pub use walker::{TreeWalker, WalkOptions};
