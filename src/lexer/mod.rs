//! Lexical classification for EncryScript.
//!
//! The lexer is line-oriented: it receives one line plus the [`State`] the
//! previous line ended in, and returns classified tokens covering the whole
//! line together with the state to carry into the next line. No AST is built;
//! the output exists so a renderer can style spans.
//!
//! - [`rules`] builds the per-state rule lists (patterns, classifications,
//!   transitions) once, validated at construction time.
//! - [`lexer`] walks a line with first-match-wins semantics over those rules.
//! - [`vocabulary`] holds the word lists used to classify identifiers.

#[allow(clippy::module_inception)]
pub mod lexer;
pub mod rules;
pub mod state;
pub mod token;
pub mod vocabulary;

pub use lexer::{format_tokens, scan, tokenize_lines, Scanner};
pub use rules::{default_table, Classification, Rule, RuleSpec, RuleTable, RuleTableBuilder};
pub use state::State;
pub use token::{ScanResult, Span, Token, TokenKind};
pub use vocabulary::{KeywordMapper, Vocabulary};
