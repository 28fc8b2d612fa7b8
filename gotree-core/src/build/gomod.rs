// gotree-core/src/build/gomod.rs
//! The subset of `go.mod` needed to map import paths to directories.
use std::fs;
use std::path::{Path, PathBuf};

use gotree_common::error::{GoTreeError, Result};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Require {
    pub path: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplaceTarget {
    /// Local directory, relative to the main module root unless absolute.
    Dir(PathBuf),
    Module { path: String, version: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replace {
    pub old_path: String,
    /// `None` replaces every version.
    pub old_version: Option<String>,
    pub target: ReplaceTarget,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoMod {
    pub module: String,
    pub requires: Vec<Require>,
    pub replaces: Vec<Replace>,
}

impl GoMod {
    pub fn parse(src: &str) -> std::result::Result<Self, String> {
        let mut module: Option<String> = None;
        let mut requires = Vec::new();
        let mut replaces = Vec::new();
        let mut block: Option<String> = None;

        for (idx, raw) in src.lines().enumerate() {
            let lineno = idx + 1;
            let tokens = tokenize_line(raw).map_err(|e| format!("line {lineno}: {e}"))?;
            if tokens.is_empty() {
                continue;
            }

            if block.is_some() && tokens.len() == 1 && tokens[0] == ")" {
                debug!("Closing go.mod {:?} block at line {}", block, lineno);
                block = None;
                continue;
            }
            let (verb, args) = match &block {
                Some(verb) => (verb.clone(), &tokens[..]),
                None if tokens.len() == 2 && tokens[1] == "(" => {
                    block = Some(tokens[0].clone());
                    continue;
                }
                None => (tokens[0].clone(), &tokens[1..]),
            };

            match verb.as_str() {
                "module" => match args {
                    [path] => module = Some(path.clone()),
                    _ => return Err(format!("line {lineno}: usage: module module/path")),
                },
                "require" => match args {
                    [path, version] => requires.push(Require {
                        path: path.clone(),
                        version: version.clone(),
                    }),
                    _ => {
                        return Err(format!(
                            "line {lineno}: usage: require module/path v1.2.3"
                        ))
                    }
                },
                "replace" => {
                    let replace = parse_replace(args).map_err(|e| format!("line {lineno}: {e}"))?;
                    replaces.push(replace);
                }
                // go, toolchain, exclude, retract, godebug: irrelevant to lookup.
                _ => {}
            }
        }

        if let Some(verb) = block {
            return Err(format!("unterminated '{verb}' block"));
        }
        let module = module.ok_or_else(|| "no module declaration".to_string())?;
        Ok(Self {
            module,
            requires,
            replaces,
        })
    }

    /// Finds the replacement for `path@version`; an exact version match
    /// wins over a wildcard one.
    pub fn replacement(&self, path: &str, version: &str) -> Option<&ReplaceTarget> {
        let mut wildcard = None;
        for replace in self.replaces.iter().filter(|r| r.old_path == path) {
            match replace.old_version.as_deref() {
                Some(v) if v == version => return Some(&replace.target),
                None => wildcard = Some(&replace.target),
                Some(_) => {}
            }
        }
        wildcard
    }
}

fn parse_replace(args: &[String]) -> std::result::Result<Replace, String> {
    const USAGE: &str = "usage: replace module/path [v1.2.3] => other/module v1.4 | replace module/path [v1.2.3] => ../local/directory";
    let arrow = args.iter().position(|t| t == "=>").ok_or(USAGE)?;
    let (old, new) = (&args[..arrow], &args[arrow + 1..]);
    let (old_path, old_version) = match old {
        [path] => (path.clone(), None),
        [path, version] => (path.clone(), Some(version.clone())),
        _ => return Err(USAGE.to_string()),
    };
    let target = match new {
        [dir] if is_local_path(dir) => ReplaceTarget::Dir(PathBuf::from(dir)),
        [path] => {
            return Err(format!(
                "replacement module without version must be directory path (rooted or starting with ./ or ../): {path}"
            ))
        }
        [path, version] => ReplaceTarget::Module {
            path: path.clone(),
            version: version.clone(),
        },
        _ => return Err(USAGE.to_string()),
    };
    Ok(Replace {
        old_path,
        old_version,
        target,
    })
}

fn is_local_path(path: &str) -> bool {
    path == "."
        || path == ".."
        || path.starts_with("./")
        || path.starts_with("../")
        || Path::new(path).is_absolute()
}

/// Splits a go.mod line into tokens, honouring quoted strings and `//`
/// comments. Parentheses and `=>` are separate tokens.
fn tokenize_line(line: &str) -> std::result::Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut rest = line.trim_start();
    while !rest.is_empty() {
        if rest.starts_with("//") {
            break;
        }
        let (token, remaining) = if let Some(body) = rest.strip_prefix('"') {
            let end = body
                .find('"')
                .ok_or_else(|| "unterminated quoted string".to_string())?;
            (body[..end].to_string(), &body[end + 1..])
        } else if let Some(body) = rest.strip_prefix('`') {
            let end = body
                .find('`')
                .ok_or_else(|| "unterminated raw string".to_string())?;
            (body[..end].to_string(), &body[end + 1..])
        } else if rest.starts_with('(') || rest.starts_with(')') {
            (rest[..1].to_string(), &rest[1..])
        } else if let Some(after) = rest.strip_prefix("=>") {
            ("=>".to_string(), after)
        } else {
            let end = rest
                .find(|c: char| c.is_whitespace() || c == '(' || c == ')' || c == '"')
                .unwrap_or(rest.len());
            let end = rest[..end].find("=>").unwrap_or(end);
            let end = rest[..end].find("//").unwrap_or(end);
            (rest[..end].to_string(), &rest[end..])
        };
        tokens.push(token);
        rest = remaining.trim_start();
    }
    Ok(tokens)
}

/// Escapes a module path or version for use in the module cache: every
/// upper-case letter becomes `!` followed by its lower-case form.
pub fn escape_module_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for c in path.chars() {
        if c.is_ascii_uppercase() {
            out.push('!');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// The module whose `go.mod` sits at or above the directory a walk started
/// from.
#[derive(Debug, Clone)]
pub struct MainModule {
    pub root: PathBuf,
    pub gomod: GoMod,
    /// Whether non-main packages resolve from `<root>/vendor`.
    pub vendored: bool,
}

impl MainModule {
    pub fn path(&self) -> &str {
        &self.gomod.module
    }

    /// Searches `start` and its ancestors for a `go.mod`.
    pub fn find(start: &Path) -> Result<Option<Self>> {
        for dir in start.ancestors() {
            let gomod_path = dir.join("go.mod");
            if !gomod_path.is_file() {
                continue;
            }
            debug!("Found main module file: {}", gomod_path.display());
            let src = fs::read_to_string(&gomod_path)?;
            let gomod = GoMod::parse(&src).map_err(|e| {
                GoTreeError::ParseError("go.mod", format!("{}: {e}", gomod_path.display()))
            })?;
            return Ok(Some(Self {
                root: dir.to_path_buf(),
                gomod,
                vendored: false,
            }));
        }
        Ok(None)
    }

    pub fn has_vendor_manifest(&self) -> bool {
        self.root.join("vendor").join("modules.txt").is_file()
    }

    /// Directory of a required module, honouring `replace` directives.
    pub fn module_dir(&self, require: &Require, modcache: Option<&Path>) -> Option<PathBuf> {
        match self.gomod.replacement(&require.path, &require.version) {
            Some(ReplaceTarget::Dir(dir)) if dir.is_absolute() => Some(dir.clone()),
            Some(ReplaceTarget::Dir(dir)) => Some(self.root.join(dir)),
            Some(ReplaceTarget::Module { path, version }) => {
                Some(cache_dir(modcache?, path, version))
            }
            None => Some(cache_dir(modcache?, &require.path, &require.version)),
        }
    }
}

fn cache_dir(modcache: &Path, path: &str, version: &str) -> PathBuf {
    modcache.join(format!(
        "{}@{}",
        escape_module_path(path),
        escape_module_path(version)
    ))
}
