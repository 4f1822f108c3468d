//! Unified error handling
//!
//! Scanning itself never fails: every line is classifiable. The errors here are
//! raised while a rule table is being constructed (bad vocabulary, bad pattern,
//! a state without a fallback) or while the binary reads its inputs.

use crate::lexer::State;
use thiserror::Error;

/// Top-level error type of the highlighter
#[derive(Error, Debug, Clone)]
pub enum HighlightError {
    /// Rule table construction failed
    #[error("rule table construction failed: {0}")]
    RuleTable(#[from] RuleTableError),

    /// Configuration (vocabulary file, state name) could not be used
    #[error("configuration error: {0}")]
    Config(String),

    /// Host asked for a line the document does not have
    #[error("line {line} is out of range (document has {len} lines)")]
    LineOutOfRange { line: usize, len: usize },

    /// File I/O error
    #[error("file operation failed: {0}")]
    Io(String),
}

/// Errors detected while building a rule table
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleTableError {
    #[error("vocabulary list '{list}' is empty")]
    EmptyVocabulary { list: &'static str },

    #[error("vocabulary list '{list}' contains '{entry}', which is not an identifier")]
    InvalidVocabularyEntry { list: &'static str, entry: String },

    #[error("invalid pattern /{pattern}/ in state '{state}': {message}")]
    InvalidPattern {
        state: State,
        pattern: String,
        message: String,
    },

    #[error("pattern /{pattern}/ in state '{state}' has {groups} capture groups but {kinds} classifications")]
    GroupCountMismatch {
        state: State,
        pattern: String,
        groups: usize,
        kinds: usize,
    },

    #[error("state '{state}' has no rules")]
    MissingState { state: State },

    #[error("state '{state}' has no fallback rule covering arbitrary input")]
    MissingFallback { state: State },

    #[error("no rule in state '{state}' matches at end of line")]
    UncoveredLineEnd { state: State },
}

/// Result alias
pub type HighlightResult<T> = Result<T, HighlightError>;

/// Conversion helper into [`HighlightError`]
pub trait IntoHighlightError {
    fn into_highlight_error(self) -> HighlightError;
}

impl IntoHighlightError for std::io::Error {
    fn into_highlight_error(self) -> HighlightError {
        HighlightError::Io(self.to_string())
    }
}

impl IntoHighlightError for serde_json::Error {
    fn into_highlight_error(self) -> HighlightError {
        HighlightError::Config(self.to_string())
    }
}

impl From<std::io::Error> for HighlightError {
    fn from(e: std::io::Error) -> Self {
        HighlightError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for HighlightError {
    fn from(e: serde_json::Error) -> Self {
        HighlightError::Config(e.to_string())
    }
}

/// Adds context to a foreign error while converting it
pub trait WithContext<T> {
    fn with_context<F>(self, f: F) -> HighlightResult<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> WithContext<T> for Result<T, E>
where
    E: IntoHighlightError,
{
    fn with_context<F>(self, f: F) -> HighlightResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| match e.into_highlight_error() {
            HighlightError::Io(msg) => HighlightError::Io(format!("{}: {}", f(), msg)),
            HighlightError::Config(msg) => HighlightError::Config(format!("{}: {}", f(), msg)),
            other => other,
        })
    }
}
