use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum GoTreeError {
    #[error("I/O Error: {0}")]
    Io(#[from] Arc<std::io::Error>),

    #[error("Configuration Error: {0}")]
    Config(String),

    /// No candidate directory exists for the import path. `searched` holds
    /// every location tried, already formatted as `dir (from $ROOT)`.
    #[error("cannot find package \"{import_path}\" in any of:{}", format_searched(.searched))]
    NotFound {
        import_path: String,
        searched: Vec<String>,
    },

    #[error("no buildable Go source files in {}", .0.display())]
    NoGoFiles(PathBuf),

    #[error("found packages {first} ({first_file}) and {second} ({second_file}) in {}", .dir.display())]
    MultiplePackages {
        dir: PathBuf,
        first: String,
        first_file: String,
        second: String,
        second_file: String,
    },

    #[error("import \"{0}\": invalid import path")]
    InvalidImportPath(String),

    #[error("import \"{0}\": cannot import absolute path")]
    AbsoluteImport(String),

    #[error("Parsing Error in {0}: {1}")]
    ParseError(&'static str, String),

    #[error("Build constraint error in {0}: {1}")]
    Constraint(String, String),

    #[error("Failed to execute command: {0}")]
    CommandExecError(String),
}

fn format_searched(searched: &[String]) -> String {
    searched.iter().map(|s| format!("\n\t{s}")).collect()
}

impl From<std::io::Error> for GoTreeError {
    fn from(err: std::io::Error) -> Self {
        GoTreeError::Io(Arc::new(err))
    }
}

pub type Result<T> = std::result::Result<T, GoTreeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_lists_every_location() {
        let err = GoTreeError::NotFound {
            import_path: "example.com/x".to_string(),
            searched: vec![
                "/goroot/src/example.com/x (from $GOROOT)".to_string(),
                "/gopath/src/example.com/x (from $GOPATH)".to_string(),
            ],
        };
        assert_eq!(
            err.to_string(),
            "cannot find package \"example.com/x\" in any of:\n\t/goroot/src/example.com/x (from $GOROOT)\n\t/gopath/src/example.com/x (from $GOPATH)"
        );
    }

    #[test]
    fn io_errors_convert() {
        let err: GoTreeError = std::io::Error::other("boom").into();
        assert!(matches!(err, GoTreeError::Io(_)));
        assert_eq!(err.to_string(), "I/O Error: boom");
    }
}
