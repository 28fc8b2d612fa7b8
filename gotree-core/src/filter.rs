//! Decides which imports show up in the tree at all.
use gotree_common::model::{is_standard_package, CGO_PSEUDO_PACKAGE};

/// Inclusion predicate, chosen once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFilter {
    /// Drop the cgo pseudo-package and every standard package.
    ThirdPartyOnly,
    /// Drop only the cgo pseudo-package.
    WithStandard,
}

impl ImportFilter {
    pub fn new(with_standard: bool) -> Self {
        if with_standard {
            Self::WithStandard
        } else {
            Self::ThirdPartyOnly
        }
    }

    pub fn include(&self, import_path: &str) -> bool {
        if import_path == CGO_PSEUDO_PACKAGE {
            return false;
        }
        match self {
            Self::WithStandard => true,
            Self::ThirdPartyOnly => !is_standard_package(import_path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cgo_is_always_excluded() {
        assert!(!ImportFilter::ThirdPartyOnly.include("C"));
        assert!(!ImportFilter::WithStandard.include("C"));
    }

    #[test]
    fn default_filter_drops_standard_packages() {
        let filter = ImportFilter::new(false);
        assert!(!filter.include("fmt"));
        assert!(!filter.include("net/http"));
        assert!(filter.include("example.com/lib"));
        assert!(filter.include("github.com/a/b/c"));
    }

    #[test]
    fn standard_filter_keeps_standard_packages() {
        let filter = ImportFilter::new(true);
        assert!(filter.include("fmt"));
        assert!(filter.include("net/http"));
        assert!(filter.include("example.com/lib"));
    }
}
