//! Classification helpers for Go import paths.

/// Pseudo-package imported by cgo files. Names no directory on disk.
pub const CGO_PSEUDO_PACKAGE: &str = "C";

/// Reports whether `import_path` looks like a standard library package: its
/// first `/`-delimited element carries no dot, so it cannot be a domain.
///
/// This is a heuristic and intentionally not checked against GOROOT.
pub fn is_standard_package(import_path: &str) -> bool {
    let first = import_path.split('/').next().unwrap_or(import_path);
    !first.contains('.')
}

/// Reports whether `import_path` is relative (`.`, `..`, `./x`, `../x`).
pub fn is_local_import(import_path: &str) -> bool {
    import_path == "."
        || import_path == ".."
        || import_path.starts_with("./")
        || import_path.starts_with("../")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_classification_uses_first_segment() {
        assert!(is_standard_package("fmt"));
        assert!(is_standard_package("net/http"));
        assert!(is_standard_package("vendor/golang.org/x/net/dns"));
        assert!(!is_standard_package("example.com/x"));
        assert!(!is_standard_package("github.com/user/repo/pkg"));
        assert!(!is_standard_package("gopkg.in/yaml.v3"));
    }

    #[test]
    fn local_imports() {
        assert!(is_local_import("."));
        assert!(is_local_import(".."));
        assert!(is_local_import("./sub"));
        assert!(is_local_import("../sibling"));
        assert!(!is_local_import(".hidden"));
        assert!(!is_local_import("fmt"));
    }
}
