use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// A GOROOT and a GOPATH inside one temporary directory.
struct Workspace {
    tmp: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let ws = Self {
            tmp: TempDir::new().unwrap(),
        };
        fs::create_dir_all(ws.tmp.path().join("goroot/src")).unwrap();
        fs::create_dir_all(ws.tmp.path().join("gopath/src")).unwrap();
        ws
    }

    fn root(&self) -> &Path {
        self.tmp.path()
    }

    /// Writes `<dir>/pkg.go` importing `imports`.
    fn package(&self, dir: &str, imports: &[&str]) -> &Self {
        self.file(dir, "pkg.go", imports)
    }

    /// Writes `<dir>/<name>`, a file of package `pkg` importing `imports`.
    fn file(&self, dir: &str, name: &str, imports: &[&str]) -> &Self {
        let path = self.root().join(dir);
        fs::create_dir_all(&path).unwrap();
        let mut src = String::from("package pkg\n\nimport (\n");
        for import in imports {
            src.push_str(&format!("\t\"{import}\"\n"));
        }
        src.push_str(")\n");
        fs::write(path.join(name), src).unwrap();
        self
    }

    fn std(&self, path: &str, imports: &[&str]) -> &Self {
        self.package(&format!("goroot/src/{path}"), imports)
    }

    fn gopath(&self, path: &str, imports: &[&str]) -> &Self {
        self.package(&format!("gopath/src/{path}"), imports)
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("gotree").unwrap();
        cmd.current_dir(self.root())
            .env("GOROOT", self.root().join("goroot"))
            .env("GOPATH", self.root().join("gopath"))
            .env("GO111MODULE", "off")
            .env("GOOS", "linux")
            .env("GOARCH", "amd64")
            .env("CGO_ENABLED", "0")
            .env_remove("GOFLAGS")
            .env_remove("GOMODCACHE")
            .env_remove("GOTREE_LOG");
        cmd
    }
}

#[test]
fn diamond_dependency_is_printed_once() {
    let ws = Workspace::new();
    ws.gopath("example.com/app", &["example.com/libA", "example.com/libB"])
        .gopath("example.com/libA", &["example.com/libB"])
        .gopath("example.com/libB", &[]);

    ws.cmd()
        .arg("example.com/app")
        .assert()
        .success()
        .stdout(
            "example.com/app\n\
             |- example.com/libA\n\
             |  `- example.com/libB\n\
             `- example.com/libB (see above)\n",
        );
}

#[test]
fn no_arguments_prints_usage() {
    let ws = Workspace::new();
    ws.cmd()
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn too_many_arguments_prints_usage() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["example.com/a", "example.com/b"])
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn help_exits_successfully() {
    let ws = Workspace::new();
    ws.cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--standard"));
}

#[test]
fn standard_packages_need_the_flag() {
    let ws = Workspace::new();
    ws.gopath("example.com/tool", &["os", "fmt", "net/http"])
        .std("fmt", &["os"])
        .std("os", &[])
        .std("net/http", &["fmt"]);

    ws.cmd()
        .arg("example.com/tool")
        .assert()
        .success()
        .stdout("example.com/tool\n");

    ws.cmd()
        .args(["--standard", "example.com/tool"])
        .assert()
        .success()
        .stdout(
            "example.com/tool\n\
             |- fmt\n\
             |  `- os\n\
             |- net/http\n\
             |  `- fmt (see above)\n\
             `- os (see above)\n",
        );
}

#[test]
fn test_imports_only_at_root() {
    let ws = Workspace::new();
    ws.gopath("example.com/app", &["example.com/dep"])
        .file(
            "gopath/src/example.com/app",
            "app_test.go",
            &["example.com/check"],
        )
        .gopath("example.com/dep", &[])
        .file(
            "gopath/src/example.com/dep",
            "dep_test.go",
            &["example.com/deponly"],
        )
        .gopath("example.com/check", &[]);

    ws.cmd()
        .arg("example.com/app")
        .assert()
        .success()
        .stdout("example.com/app\n`- example.com/dep\n");

    ws.cmd()
        .args(["--test", "example.com/app"])
        .assert()
        .success()
        .stdout("example.com/app\n|- example.com/check\n`- example.com/dep\n");
}

#[test]
fn missing_dependency_fails_the_walk() {
    let ws = Workspace::new();
    ws.gopath("example.com/app", &["example.com/a", "example.com/missing"])
        .gopath("example.com/a", &[]);

    ws.cmd()
        .arg("example.com/app")
        .assert()
        .failure()
        .code(1)
        .stdout("example.com/app\n|- example.com/a\n")
        .stderr(predicate::str::contains(
            "cannot find package \"example.com/missing\"",
        ));
}

#[test]
fn build_tags_flag_enables_files() {
    let ws = Workspace::new();
    ws.gopath("example.com/app", &[]).gopath("example.com/extra", &[]);
    fs::write(
        ws.root().join("gopath/src/example.com/app/extra.go"),
        "//go:build extra\n\npackage pkg\n\nimport \"example.com/extra\"\n",
    )
    .unwrap();

    ws.cmd()
        .arg("example.com/app")
        .assert()
        .success()
        .stdout("example.com/app\n");

    ws.cmd()
        .args(["--tags", "extra", "example.com/app"])
        .assert()
        .success()
        .stdout("example.com/app\n`- example.com/extra\n");
}

#[test]
fn empty_import_path_is_rejected() {
    let ws = Workspace::new();
    ws.cmd()
        .arg("")
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("import \"\": invalid import path"));
}
