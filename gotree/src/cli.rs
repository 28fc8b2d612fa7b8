// gotree/src/cli.rs
//! Defines the command-line argument structure using clap.
use std::io;
use std::path::Path;

use clap::{ArgAction, Parser};
use gotree_common::error::Result;
use gotree_common::Config;
use gotree_core::{GoResolver, TreeWalker, WalkOptions};
use tracing::debug;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, name = "gotree", bin_name = "gotree")]
pub struct CliArgs {
    /// Include standard packages
    #[arg(long)]
    pub standard: bool,

    /// Include dependencies for tests (root package only)
    #[arg(long)]
    pub test: bool,

    /// Comma-separated build tags to satisfy in addition to GOOS/GOARCH
    #[arg(long, value_delimiter = ',', value_name = "TAGS")]
    pub tags: Vec<String>,

    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Import path of the package to print
    #[arg(value_name = "IMPORT_PATH")]
    pub import_path: String,
}

impl CliArgs {
    pub fn options(&self) -> WalkOptions {
        WalkOptions {
            with_standard: self.standard,
            with_tests: self.test,
        }
    }

    /// Prints the tree of `import_path` to standard output, resolving the
    /// root from `work_dir`.
    pub fn run(&self, config: Config, work_dir: &Path) -> Result<()> {
        let options = self.options();
        let resolver = GoResolver::new(config, work_dir);
        debug!("Build context: {:?}", resolver.build_context());
        debug!("Walk options: {:?}", options);

        let stdout = io::stdout();
        let mut walker = TreeWalker::new(&resolver, options.filter(), stdout.lock());
        walker.walk_root(&self.import_path, work_dir, options.with_tests)?;
        debug!("Printed {} packages", walker.printed_count());
        Ok(())
    }
}
