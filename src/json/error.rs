use thiserror::Error;

/// Malformed JSON found in a stored column
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Malformed JSON at line {line}, column {column}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self {
        ParseError {
            line: err.line(),
            column: err.column(),
            message: err.to_string(),
        }
    }
}
