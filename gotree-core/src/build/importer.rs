// gotree-core/src/build/importer.rs
//! Filesystem implementation of [`Resolver`] following the Go toolchain's
//! package lookup rules.
use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use gotree_common::config::{Config, ModuleMode, VendorMode};
use gotree_common::error::{GoTreeError, Result};
use gotree_common::model::{
    is_local_import, is_standard_package, PackageNode, CGO_PSEUDO_PACKAGE,
};
use gotree_common::resolver::Resolver;
use once_cell::unsync::OnceCell;
use tracing::{debug, trace};

use super::constraint::{parse_go_build, parse_plus_build};
use super::context::BuildContext;
use super::gomod::MainModule;
use super::scan::scan_source;

pub struct GoResolver {
    config: Config,
    ctxt: BuildContext,
    /// Directory the main module is searched from.
    work_dir: PathBuf,
    main_module: OnceCell<Option<MainModule>>,
}

impl GoResolver {
    pub fn new(config: Config, work_dir: impl Into<PathBuf>) -> Self {
        let ctxt = BuildContext::from_config(&config);
        Self {
            config,
            ctxt,
            work_dir: work_dir.into(),
            main_module: OnceCell::new(),
        }
    }

    pub fn build_context(&self) -> &BuildContext {
        &self.ctxt
    }

    /// The main module, found and parsed on first use. Always `None` when
    /// module mode is off.
    fn main_module(&self) -> Result<Option<&MainModule>> {
        if self.config.module_mode == ModuleMode::Off {
            return Ok(None);
        }
        let main = self.main_module.get_or_try_init(|| {
            let mut main = MainModule::find(&self.work_dir)?;
            if let Some(main) = main.as_mut() {
                main.vendored = match self.config.vendor_mode {
                    VendorMode::Vendor => true,
                    VendorMode::Disabled => false,
                    VendorMode::Auto => main.has_vendor_manifest(),
                };
                debug!(
                    "Main module '{}' at {} (vendored: {})",
                    main.path(),
                    main.root.display(),
                    main.vendored
                );
            }
            Ok::<_, GoTreeError>(main)
        })?;
        Ok(main.as_ref())
    }

    fn module_mode_active(&self, main: Option<&MainModule>) -> bool {
        match self.config.module_mode {
            ModuleMode::On => true,
            ModuleMode::Off => false,
            ModuleMode::Auto => main.is_some(),
        }
    }

    /// Maps an import path to its canonical path and directory.
    fn locate(&self, import_path: &str, src_dir: &Path) -> Result<(String, PathBuf)> {
        if import_path.is_empty() {
            return Err(GoTreeError::InvalidImportPath(import_path.to_string()));
        }
        let main = self.main_module()?;
        if is_local_import(import_path) {
            return self.locate_local(import_path, src_dir, main);
        }
        if import_path.starts_with('/') {
            return Err(GoTreeError::AbsoluteImport(import_path.to_string()));
        }
        if self.module_mode_active(main) {
            self.locate_module(import_path, src_dir, main)
        } else {
            self.locate_gopath(import_path, src_dir)
        }
    }

    fn locate_local(
        &self,
        import_path: &str,
        src_dir: &Path,
        main: Option<&MainModule>,
    ) -> Result<(String, PathBuf)> {
        let dir = clean_path(&src_dir.join(import_path));
        if !dir.is_dir() {
            return Err(GoTreeError::NotFound {
                import_path: import_path.to_string(),
                searched: vec![dir.display().to_string()],
            });
        }
        let canonical = self
            .canonical_for_dir(&dir, main)
            .unwrap_or_else(|| import_path.to_string());
        Ok((canonical, dir))
    }

    /// Import path of a directory inside GOROOT, a GOPATH entry or the main
    /// module.
    fn canonical_for_dir(&self, dir: &Path, main: Option<&MainModule>) -> Option<String> {
        let src_roots = self.config.goroot_src().into_iter().chain(self.config.gopath_srcs());
        for root in src_roots {
            if let Some(sub) = has_subdir(&root, dir) {
                if !sub.is_empty() && !in_testdata(&sub) {
                    return Some(sub);
                }
            }
        }
        let main = main?;
        let sub = has_subdir(&main.root, dir)?;
        Some(module_join(main.path(), &sub))
    }

    fn locate_module(
        &self,
        import_path: &str,
        src_dir: &Path,
        main: Option<&MainModule>,
    ) -> Result<(String, PathBuf)> {
        let mut searched = Vec::new();
        let goroot_src = self.config.goroot_src();

        if let Some(src) = &goroot_src {
            if is_standard_package(import_path) {
                let dir = src.join(import_path);
                if dir.is_dir() {
                    return Ok((import_path.to_string(), dir));
                }
                searched.push(format!("{} (from $GOROOT)", dir.display()));
            } else if src_dir.starts_with(src) {
                // The standard library vendors its own third-party code.
                let dir = src.join("vendor").join(import_path);
                if dir.is_dir() {
                    return Ok((format!("vendor/{import_path}"), dir));
                }
            }
        }

        let Some(main) = main else {
            return Err(not_found_or_unprovided(import_path, searched));
        };

        if let Some(rest) = module_suffix(import_path, main.path()) {
            let dir = join_rel(&main.root, rest);
            if dir.is_dir() {
                return Ok((import_path.to_string(), dir));
            }
            searched.push(format!("{} (main module {})", dir.display(), main.path()));
            return Err(GoTreeError::NotFound {
                import_path: import_path.to_string(),
                searched,
            });
        }

        if main.vendored {
            let dir = main.root.join("vendor").join(import_path);
            if dir.is_dir() {
                return Ok((import_path.to_string(), dir));
            }
            searched.push(format!("{} (vendor tree)", dir.display()));
            return Err(GoTreeError::NotFound {
                import_path: import_path.to_string(),
                searched,
            });
        }

        let provider = main
            .gomod
            .requires
            .iter()
            .filter(|req| module_suffix(import_path, &req.path).is_some())
            .max_by_key(|req| req.path.len());
        let Some(require) = provider else {
            return Err(not_found_or_unprovided(import_path, searched));
        };
        trace!(
            "'{}' is provided by {}@{}",
            import_path,
            require.path,
            require.version
        );
        let module_dir = main
            .module_dir(require, self.config.gomodcache.as_deref())
            .ok_or_else(|| {
                GoTreeError::Config(format!(
                    "cannot locate {}@{}: neither GOMODCACHE nor GOPATH is set",
                    require.path, require.version
                ))
            })?;
        let rest = module_suffix(import_path, &require.path).unwrap_or("");
        let dir = join_rel(&module_dir, rest);
        if dir.is_dir() {
            return Ok((import_path.to_string(), dir));
        }
        searched.push(format!(
            "{} (from {}@{})",
            dir.display(),
            require.path,
            require.version
        ));
        Err(GoTreeError::NotFound {
            import_path: import_path.to_string(),
            searched,
        })
    }

    fn locate_gopath(&self, import_path: &str, src_dir: &Path) -> Result<(String, PathBuf)> {
        let mut searched = Vec::new();
        let goroot_src = self.config.goroot_src();

        // Vendor directories between src_dir and the root holding it, deepest
        // first.
        let src_roots = goroot_src.clone().into_iter().chain(self.config.gopath_srcs());
        for root in src_roots {
            let Some(sub) = has_subdir(&root, src_dir) else {
                continue;
            };
            if in_testdata(&sub) {
                break;
            }
            let mut prefix = sub.as_str();
            loop {
                let vendor = join_rel(&root, prefix).join("vendor");
                if vendor.is_dir() {
                    let dir = vendor.join(import_path);
                    if dir.is_dir() && has_go_files(&dir) {
                        let canonical = module_join(prefix, &format!("vendor/{import_path}"));
                        return Ok((canonical, dir));
                    }
                    searched.push(format!("{} (vendor tree)", dir.display()));
                }
                if prefix.is_empty() {
                    break;
                }
                prefix = prefix.rfind('/').map_or("", |i| &prefix[..i]);
            }
            break;
        }

        match &goroot_src {
            Some(src) => {
                let dir = src.join(import_path);
                if dir.is_dir() {
                    return Ok((import_path.to_string(), dir));
                }
                searched.push(format!("{} (from $GOROOT)", dir.display()));
            }
            None => searched.push("($GOROOT not set)".to_string()),
        }

        if self.config.gopath.is_empty() {
            searched.push("($GOPATH not set)".to_string());
        }
        for src in self.config.gopath_srcs() {
            let dir = src.join(import_path);
            if dir.is_dir() {
                return Ok((import_path.to_string(), dir));
            }
            searched.push(format!("{} (from $GOPATH)", dir.display()));
        }

        Err(GoTreeError::NotFound {
            import_path: import_path.to_string(),
            searched,
        })
    }

    /// Reads the Go files of `dir` that belong to the current build.
    fn load_package(&self, import_path: String, dir: PathBuf) -> Result<PackageNode> {
        let mut names: Vec<String> = fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.ends_with(".go") && !name.starts_with(['_', '.']))
            .collect();
        names.sort();

        let has_tag = |tag: &str| self.ctxt.match_tag(tag);
        let mut package: Option<(String, String)> = None;
        let mut any_files = false;
        let mut node = PackageNode::new(import_path, dir.clone());

        for name in names {
            let path = dir.join(&name);
            if !path.is_file() {
                continue;
            }
            if !self.ctxt.good_os_arch_file(&name) {
                trace!("Skipping {}: GOOS/GOARCH file name", path.display());
                continue;
            }

            let src = fs::read_to_string(&path)?;
            let file = scan_source(&src).map_err(|e| {
                GoTreeError::ParseError("Go source", format!("{}: {e}", path.display()))
            })?;

            let included = match &file.go_build {
                Some(expr) => parse_go_build(expr)
                    .map_err(|e| GoTreeError::Constraint(path.display().to_string(), e))?
                    .eval(&has_tag),
                None => parse_plus_build(&file.plus_build)
                    .map_err(|e| GoTreeError::Constraint(path.display().to_string(), e))?
                    .map_or(true, |expr| expr.eval(&has_tag)),
            };
            if !included {
                trace!("Skipping {}: build constraints", path.display());
                continue;
            }
            if file.package == "documentation" {
                trace!("Skipping {}: documentation package", path.display());
                continue;
            }

            let is_test = name.ends_with("_test.go");
            let mut package_name = file.package.as_str();
            let mut is_xtest = false;
            if is_test {
                if let Some(base) = package_name.strip_suffix("_test") {
                    if package.as_ref().map_or(true, |(first, _)| first != package_name) {
                        package_name = base;
                        is_xtest = true;
                    }
                }
            }

            match &package {
                None => package = Some((package_name.to_string(), name.clone())),
                Some((first, first_file)) if first != package_name => {
                    return Err(GoTreeError::MultiplePackages {
                        dir,
                        first: first.clone(),
                        first_file: first_file.clone(),
                        second: package_name.to_string(),
                        second_file: name,
                    });
                }
                Some(_) => {}
            }

            if !self.ctxt.cgo_enabled && file.imports.iter().any(|i| i == CGO_PSEUDO_PACKAGE) {
                trace!("Skipping {}: cgo is disabled", path.display());
                continue;
            }

            any_files = true;
            if is_xtest {
                // External test package; its imports are not the package's.
                continue;
            }

            let target: &mut BTreeSet<String> = if is_test {
                &mut node.test_imports
            } else {
                &mut node.imports
            };
            target.extend(file.imports);
        }

        if !any_files {
            return Err(GoTreeError::NoGoFiles(dir));
        }
        Ok(node)
    }
}

impl Resolver for GoResolver {
    fn resolve(&self, import_path: &str, src_dir: &Path) -> Result<PackageNode> {
        let (canonical, dir) = self.locate(import_path, src_dir)?;
        debug!(
            "Resolved '{}' as '{}' in {}",
            import_path,
            canonical,
            dir.display()
        );
        self.load_package(canonical, dir)
    }
}

fn not_found_or_unprovided(import_path: &str, searched: Vec<String>) -> GoTreeError {
    if searched.is_empty() {
        GoTreeError::NotFound {
            import_path: import_path.to_string(),
            searched: vec!["(no required module provides this package)".to_string()],
        }
    } else {
        GoTreeError::NotFound {
            import_path: import_path.to_string(),
            searched,
        }
    }
}

/// `rest` of `path` below `module`, or `""` when they are equal.
fn module_suffix<'a>(path: &'a str, module: &str) -> Option<&'a str> {
    if path == module {
        return Some("");
    }
    path.strip_prefix(module)?.strip_prefix('/')
}

fn module_join(base: &str, sub: &str) -> String {
    match (base.is_empty(), sub.is_empty()) {
        (true, _) => sub.to_string(),
        (_, true) => base.to_string(),
        _ => format!("{base}/{sub}"),
    }
}

fn join_rel(base: &Path, rel: &str) -> PathBuf {
    if rel.is_empty() {
        base.to_path_buf()
    } else {
        base.join(rel)
    }
}

/// Slash-separated path of `dir` below `root`, `""` for `root` itself.
fn has_subdir(root: &Path, dir: &Path) -> Option<String> {
    let rel = dir.strip_prefix(root).ok()?;
    let parts: Option<Vec<&str>> = rel
        .components()
        .map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect();
    Some(parts?.join("/"))
}

fn in_testdata(sub: &str) -> bool {
    sub.split('/').any(|part| part == "testdata")
}

fn has_go_files(dir: &Path) -> bool {
    fs::read_dir(dir)
        .map(|entries| {
            entries.filter_map(|e| e.ok()).any(|e| {
                e.file_name().to_str().is_some_and(|n| n.ends_with(".go")) && e.path().is_file()
            })
        })
        .unwrap_or(false)
}

/// Lexically resolves `.` and `..` components.
fn clean_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}
