use thiserror::Error;

/// Failures while recovering text from a document
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("not a PDF document")]
    NotPdf,

    #[error("password-protected PDF")]
    PasswordProtected,

    #[error("{0}")]
    Parse(String),

    #[error("text extraction aborted: {0}")]
    Panicked(String),
}

/// Errors surfaced by the file-level helpers
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
