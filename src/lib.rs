//! EncryScript Syntax Highlighting Library
//!
//! This library classifies EncryScript source text line by line for
//! syntax highlighting. Each call takes a line plus the state the previous
//! line ended in and returns typed tokens plus the state for the next line.

pub mod document;
pub mod error;
pub mod lexer;
pub mod render;

// Re-export commonly used types
pub use document::Document;
pub use error::{HighlightError, HighlightResult, RuleTableError};
pub use lexer::{
    default_table, scan, tokenize_lines, RuleTable, ScanResult, Scanner, State, Token, TokenKind,
    Vocabulary,
};
