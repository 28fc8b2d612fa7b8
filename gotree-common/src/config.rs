// gotree-common/src/config.rs
use std::env;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use directories::UserDirs;
use tracing::{debug, warn};

use super::error::{GoTreeError, Result};

/// Highest `go1.N` release tag satisfied when GOTREE_GO_RELEASE is unset.
const DEFAULT_GO_RELEASE: u32 = 22;

/// How the resolver decides between module and GOPATH lookup (GO111MODULE).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModuleMode {
    On,
    Off,
    /// Module mode when a go.mod is found, GOPATH mode otherwise.
    #[default]
    Auto,
}

/// Whether imports of a module-mode build are served from `vendor/` (the
/// `-mod` flag in GOFLAGS).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VendorMode {
    /// Use `vendor/` when `vendor/modules.txt` exists.
    #[default]
    Auto,
    Vendor,
    /// `-mod=mod` or `-mod=readonly`: always the module cache.
    Disabled,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub goroot: Option<PathBuf>,
    pub gopath: Vec<PathBuf>,
    pub goos: String,
    pub goarch: String,
    pub cgo_enabled: bool,
    pub module_mode: ModuleMode,
    pub vendor_mode: VendorMode,
    pub gomodcache: Option<PathBuf>,
    /// Extra tags from `--tags`.
    pub build_tags: Vec<String>,
    /// Minor version of the newest satisfied `go1.N` tag.
    pub release: u32,
}

impl Config {
    pub fn load() -> Result<Self> {
        debug!("Loading gotree configuration");
        let mut config = Self::from_lookup(|key| env::var(key).ok())?;

        if config.goroot.is_none() {
            config.goroot = goroot_from_toolchain();
        }
        match &config.goroot {
            Some(goroot) => debug!("Effective GOROOT set to: {}", goroot.display()),
            None => warn!("GOROOT is unknown; standard packages cannot be resolved"),
        }

        debug!("Configuration loaded successfully.");
        Ok(config)
    }

    /// Builds a configuration from an environment lookup. Never runs the `go`
    /// tool, so GOROOT stays unset unless the lookup provides it.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|s| !s.is_empty());

        let goroot = var("GOROOT").map(PathBuf::from);

        let gopath: Vec<PathBuf> = match var("GOPATH") {
            Some(list) => env::split_paths(&list)
                .filter(|p| {
                    let usable = p.is_absolute();
                    if !usable {
                        debug!("Ignoring relative GOPATH entry: {}", p.display());
                    }
                    usable
                })
                .collect(),
            None => default_gopath().into_iter().collect(),
        };
        debug!("Effective GOPATH: {:?}", gopath);

        let goos = var("GOOS").unwrap_or_else(|| host_goos().to_string());
        let goarch = var("GOARCH").unwrap_or_else(|| host_goarch().to_string());

        let cgo_enabled = match var("CGO_ENABLED").as_deref() {
            Some("1") => true,
            Some("0") => false,
            Some(other) => {
                return Err(GoTreeError::Config(format!(
                    "CGO_ENABLED must be 0 or 1, got '{other}'"
                )))
            }
            None => goos == host_goos() && goarch == host_goarch(),
        };

        let module_mode = match var("GO111MODULE").as_deref() {
            None | Some("auto") => ModuleMode::Auto,
            Some("on") => ModuleMode::On,
            Some("off") => ModuleMode::Off,
            Some(other) => {
                return Err(GoTreeError::Config(format!(
                    "unknown GO111MODULE value '{other}' (expected on, off or auto)"
                )))
            }
        };

        let vendor_mode = match var("GOFLAGS") {
            Some(flags) => parse_mod_flag(&flags)?,
            None => VendorMode::Auto,
        };

        let gomodcache = var("GOMODCACHE")
            .map(PathBuf::from)
            .or_else(|| gopath.first().map(|p| p.join("pkg").join("mod")));

        let release = match var("GOTREE_GO_RELEASE") {
            Some(raw) => raw.parse::<u32>().map_err(|e| {
                GoTreeError::Config(format!("GOTREE_GO_RELEASE '{raw}' is not a number: {e}"))
            })?,
            None => DEFAULT_GO_RELEASE,
        };

        Ok(Self {
            goroot,
            gopath,
            goos,
            goarch,
            cgo_enabled,
            module_mode,
            vendor_mode,
            gomodcache,
            build_tags: Vec::new(),
            release,
        })
    }

    pub fn with_build_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.build_tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn goroot(&self) -> Option<&Path> {
        self.goroot.as_deref()
    }

    pub fn goroot_src(&self) -> Option<PathBuf> {
        self.goroot.as_ref().map(|root| root.join("src"))
    }

    pub fn gopath_srcs(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.gopath.iter().map(|root| root.join("src"))
    }
}

fn parse_mod_flag(flags: &str) -> Result<VendorMode> {
    let mut mode = VendorMode::Auto;
    for flag in flags.split_whitespace() {
        let Some(value) = flag
            .strip_prefix("--mod=")
            .or_else(|| flag.strip_prefix("-mod="))
        else {
            continue;
        };
        mode = match value {
            "vendor" => VendorMode::Vendor,
            "mod" | "readonly" => VendorMode::Disabled,
            other => {
                return Err(GoTreeError::Config(format!(
                    "-mod may only be set to readonly, vendor or mod, not '{other}'"
                )))
            }
        };
    }
    Ok(mode)
}

fn default_gopath() -> Option<PathBuf> {
    UserDirs::new().map(|ud| ud.home_dir().join("go"))
}

fn goroot_from_toolchain() -> Option<PathBuf> {
    let go = match which::which("go") {
        Ok(path) => path,
        Err(e) => {
            debug!("No go tool on PATH, cannot ask it for GOROOT: {e}");
            return None;
        }
    };
    debug!("Asking {} for GOROOT", go.display());
    let output = Command::new(&go)
        .args(["env", "GOROOT"])
        .stderr(Stdio::piped())
        .output();
    match output {
        Ok(out) if out.status.success() => {
            let root = String::from_utf8_lossy(&out.stdout).trim().to_string();
            if root.is_empty() {
                debug!("'go env GOROOT' returned an empty path");
                None
            } else {
                Some(PathBuf::from(root))
            }
        }
        Ok(out) => {
            let stderr = String::from_utf8_lossy(&out.stderr);
            warn!("'go env GOROOT' failed: {}", stderr.trim());
            None
        }
        Err(e) => {
            warn!(
                "{}",
                GoTreeError::CommandExecError(format!("{} env GOROOT: {e}", go.display()))
            );
            None
        }
    }
}

pub fn host_goos() -> &'static str {
    match env::consts::OS {
        "macos" => "darwin",
        other => other,
    }
}

pub fn host_goarch() -> &'static str {
    match env::consts::ARCH {
        "x86_64" => "amd64",
        "x86" => "386",
        "aarch64" => "arm64",
        "loongarch64" => "loong64",
        "wasm32" => "wasm",
        "powerpc64" if cfg!(target_endian = "little") => "ppc64le",
        "powerpc64" => "ppc64",
        "mips" if cfg!(target_endian = "little") => "mipsle",
        "mips64" if cfg!(target_endian = "little") => "mips64le",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn reads_go_environment() {
        let config = config_from(&[
            ("GOROOT", "/usr/local/go"),
            ("GOPATH", "/home/u/go"),
            ("GOOS", "linux"),
            ("GOARCH", "arm64"),
            ("CGO_ENABLED", "0"),
            ("GO111MODULE", "off"),
        ])
        .unwrap();
        assert_eq!(config.goroot(), Some(Path::new("/usr/local/go")));
        assert_eq!(config.gopath, vec![PathBuf::from("/home/u/go")]);
        assert_eq!(config.goos, "linux");
        assert_eq!(config.goarch, "arm64");
        assert!(!config.cgo_enabled);
        assert_eq!(config.module_mode, ModuleMode::Off);
        assert_eq!(
            config.gomodcache,
            Some(PathBuf::from("/home/u/go/pkg/mod"))
        );
        assert_eq!(config.release, DEFAULT_GO_RELEASE);
    }

    #[test]
    fn relative_gopath_entries_are_dropped() {
        let config = config_from(&[("GOPATH", "relative/dir")]).unwrap();
        assert!(config.gopath.is_empty());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            config_from(&[("GO111MODULE", "maybe")]),
            Err(GoTreeError::Config(_))
        ));
        assert!(matches!(
            config_from(&[("CGO_ENABLED", "yes")]),
            Err(GoTreeError::Config(_))
        ));
        assert!(matches!(
            config_from(&[("GOFLAGS", "-mod=sometimes")]),
            Err(GoTreeError::Config(_))
        ));
    }

    #[test]
    fn goflags_select_vendor_mode() {
        let vendor = config_from(&[("GOFLAGS", "-v -mod=vendor")]).unwrap();
        assert_eq!(vendor.vendor_mode, VendorMode::Vendor);
        let disabled = config_from(&[("GOFLAGS", "--mod=readonly")]).unwrap();
        assert_eq!(disabled.vendor_mode, VendorMode::Disabled);
        let auto = config_from(&[("GOFLAGS", "-trimpath")]).unwrap();
        assert_eq!(auto.vendor_mode, VendorMode::Auto);
    }

    #[test]
    fn explicit_gomodcache_wins() {
        let config = config_from(&[("GOPATH", "/a"), ("GOMODCACHE", "/cache")]).unwrap();
        assert_eq!(config.gomodcache, Some(PathBuf::from("/cache")));
    }
}
