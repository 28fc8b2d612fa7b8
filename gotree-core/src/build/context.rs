// gotree-core/src/build/context.rs
use gotree_common::Config;

const KNOWN_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "js", "linux",
    "nacl", "netbsd", "openbsd", "plan9", "solaris", "wasip1", "windows", "zos",
];

const UNIX_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "linux",
    "netbsd", "openbsd", "solaris",
];

const KNOWN_ARCH: &[&str] = &[
    "386", "amd64", "amd64p32", "arm", "armbe", "arm64", "arm64be", "loong64", "mips", "mipsle",
    "mips64", "mips64le", "mips64p32", "mips64p32le", "ppc", "ppc64", "ppc64le", "riscv",
    "riscv64", "s390", "s390x", "sparc", "sparc64", "wasm",
];

/// Target description used to decide which files belong to a build.
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub goos: String,
    pub goarch: String,
    pub cgo_enabled: bool,
    pub tags: Vec<String>,
    /// Minor version of the newest satisfied `go1.N` tag.
    pub release: u32,
}

impl BuildContext {
    pub fn from_config(config: &Config) -> Self {
        Self {
            goos: config.goos.clone(),
            goarch: config.goarch.clone(),
            cgo_enabled: config.cgo_enabled,
            tags: config.build_tags.clone(),
            release: config.release,
        }
    }

    pub fn match_tag(&self, name: &str) -> bool {
        if name.is_empty() {
            return false;
        }
        if name == "cgo" {
            return self.cgo_enabled;
        }
        if name == self.goos || name == self.goarch || name == "gc" {
            return true;
        }
        if name == "unix" && UNIX_OS.contains(&self.goos.as_str()) {
            return true;
        }
        match (self.goos.as_str(), name) {
            ("android", "linux") | ("illumos", "solaris") | ("ios", "darwin") => return true,
            _ => {}
        }
        if let Some(minor) = name.strip_prefix("go1.").and_then(|m| m.parse::<u32>().ok()) {
            if minor <= self.release {
                return true;
            }
        }
        self.tags.iter().any(|tag| tag == name)
    }

    /// Applies the `_GOOS`, `_GOARCH` and `_GOOS_GOARCH` file name suffixes
    /// (before an optional `_test`).
    pub fn good_os_arch_file(&self, file_name: &str) -> bool {
        let stem = file_name.split('.').next().unwrap_or(file_name);
        let Some(underscore) = stem.find('_') else {
            return true;
        };
        let mut parts: Vec<&str> = stem[underscore..].split('_').collect();
        if parts.last() == Some(&"test") {
            parts.pop();
        }
        let n = parts.len();
        if n >= 2 && KNOWN_OS.contains(&parts[n - 2]) && KNOWN_ARCH.contains(&parts[n - 1]) {
            return self.match_tag(parts[n - 2]) && self.match_tag(parts[n - 1]);
        }
        if n >= 1 && (KNOWN_OS.contains(&parts[n - 1]) || KNOWN_ARCH.contains(&parts[n - 1])) {
            return self.match_tag(parts[n - 1]);
        }
        true
    }
}
