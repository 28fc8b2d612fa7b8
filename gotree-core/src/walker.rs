// gotree-core/src/walker.rs
//! Depth-first rendering of a package's import tree.
use std::collections::{BTreeSet, HashSet};
use std::io::Write;
use std::path::Path;

use gotree_common::error::Result;
use gotree_common::resolver::Resolver;
use tracing::{debug, trace};

use crate::filter::ImportFilter;

const TEE_BRANCH: &str = "|- ";
const TEE_CONTINUATION: &str = "|  ";
const CORNER_BRANCH: &str = "`- ";
const CORNER_CONTINUATION: &str = "   ";

/// Run options taken from the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkOptions {
    /// Keep standard library packages in the tree.
    pub with_standard: bool,
    /// Expand the root package's test imports.
    pub with_tests: bool,
}

impl WalkOptions {
    pub fn filter(&self) -> ImportFilter {
        ImportFilter::new(self.with_standard)
    }
}

/// Prints one package tree. A walker owns its visited set, so use a fresh
/// walker for every root.
pub struct TreeWalker<R, W> {
    resolver: R,
    filter: ImportFilter,
    out: W,
    printed: HashSet<String>,
}

impl<R: Resolver, W: Write> TreeWalker<R, W> {
    pub fn new(resolver: R, filter: ImportFilter, out: W) -> Self {
        Self {
            resolver,
            filter,
            out,
            printed: HashSet::new(),
        }
    }

    /// Walks `import_path` as the root of the tree (no prefixes).
    pub fn walk_root(&mut self, import_path: &str, src_dir: &Path, with_tests: bool) -> Result<()> {
        self.walk(import_path, src_dir, with_tests, "", "")?;
        self.out.flush()?;
        Ok(())
    }

    /// Prints `import_path` with `branch` in front and, unless it was printed
    /// before, its filtered imports below it, each line led by
    /// `continuation`.
    ///
    /// The first resolution failure aborts the whole walk; lines written so
    /// far stay written.
    pub fn walk(
        &mut self,
        import_path: &str,
        src_dir: &Path,
        with_tests: bool,
        branch: &str,
        continuation: &str,
    ) -> Result<()> {
        trace!("Resolving '{}' from {}", import_path, src_dir.display());
        let pkg = self.resolver.resolve(import_path, src_dir)?;

        if self.printed.contains(&pkg.import_path) {
            debug!("'{}' already printed, not expanding again", pkg.import_path);
            writeln!(self.out, "{branch}{} (see above)", pkg.import_path)?;
            return Ok(());
        }
        writeln!(self.out, "{branch}{}", pkg.import_path)?;
        self.printed.insert(pkg.import_path.clone());

        let test_imports = with_tests.then_some(&pkg.test_imports);
        let deps: BTreeSet<&str> = pkg
            .imports
            .iter()
            .chain(test_imports.into_iter().flatten())
            .map(String::as_str)
            .filter(|dep| self.filter.include(dep))
            .collect();
        debug!(
            "'{}' ({}) has {} dependencies to print",
            pkg.import_path,
            pkg.dir.display(),
            deps.len()
        );

        let last = deps.len().saturating_sub(1);
        for (i, dep) in deps.into_iter().enumerate() {
            let (own, below) = if i == last {
                (CORNER_BRANCH, CORNER_CONTINUATION)
            } else {
                (TEE_BRANCH, TEE_CONTINUATION)
            };
            // Test imports are only ever expanded for the root.
            self.walk(
                dep,
                &pkg.dir,
                false,
                &format!("{continuation}{own}"),
                &format!("{continuation}{below}"),
            )?;
        }

        Ok(())
    }

    pub fn printed_count(&self) -> usize {
        self.printed.len()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
