// Imports
use thiserror::Error;

/// Every way a parse can fail.
///
/// Failures are terminal: the first one raised aborts the parse and no
/// partial document is handed back.
#[derive(Debug, Error)]
pub enum TomlError {
    /// A lexical failure with the position it was found at.
    /// Columns are counted in grapheme clusters, both are 1-based.
    #[error("Err: Line {line}, Column {column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },
    /// A structural failure found while building the document.
    #[error("Syntax error: {0}")]
    SyntaxError(String),
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),
    #[error("Invalid number format: {0}")]
    InvalidNumberFormat(String),
    /// Holds the expected pattern along with the rejected literal.
    #[error("Invalid date format. Expected {0}")]
    InvalidDateFormat(String),
    #[error("Array at {path} mixes {expected} and {found} values")]
    HeterogeneousArray {
        path: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("File error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Incorrect file extension: {0}")]
    FileExtension(String),
}

impl TomlError {
    /// Attach a location to an unlocated syntax error.
    /// Number and date failures keep their own kind.
    pub(crate) fn locate(self, line: usize, column: usize) -> Self {
        match self {
            Self::SyntaxError(message) => Self::Syntax {
                line,
                column,
                message,
            },
            other => other,
        }
    }
}

pub type TomlResult<T> = Result<T, TomlError>;

/// Render a key path the way diagnostics print it.
pub(crate) fn describe_path<S: AsRef<str>>(path: &[S]) -> String {
    let segments: Vec<&str> = path.iter().map(AsRef::as_ref).collect();
    format!("{:?}", segments)
}
