use std::collections::BTreeSet;
use std::path::PathBuf;

/// A resolved package as seen by the tree walker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageNode {
    /// Canonical import path. May differ from the path that was requested,
    /// e.g. vendored packages gain their `vendor/` prefix.
    pub import_path: String,
    /// Directory holding the package sources; the search root for its own
    /// imports.
    pub dir: PathBuf,
    pub imports: BTreeSet<String>,
    /// Imports of the in-package `_test.go` files.
    pub test_imports: BTreeSet<String>,
}

impl PackageNode {
    pub fn new(import_path: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            import_path: import_path.into(),
            dir: dir.into(),
            imports: BTreeSet::new(),
            test_imports: BTreeSet::new(),
        }
    }

    pub fn with_imports<I, S>(mut self, imports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.imports.extend(imports.into_iter().map(Into::into));
        self
    }

    pub fn with_test_imports<I, S>(mut self, imports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.test_imports.extend(imports.into_iter().map(Into::into));
        self
    }
}
