// gotree-common/src/resolver.rs
use std::path::Path;

use crate::error::Result;
use crate::model::PackageNode;

/// Locates a package and reports its imports.
///
/// Implementations are consulted once per visit; the walker never caches
/// their answers.
pub trait Resolver {
    fn resolve(&self, import_path: &str, src_dir: &Path) -> Result<PackageNode>;
}

impl<R: Resolver + ?Sized> Resolver for &R {
    fn resolve(&self, import_path: &str, src_dir: &Path) -> Result<PackageNode> {
        (**self).resolve(import_path, src_dir)
    }
}
