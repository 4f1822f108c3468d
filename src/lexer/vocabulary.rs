//! Word lists and the keyword mapper
//!
//! Identifiers are matched by one pattern and classified afterwards by looking
//! the word up in an ordered list of vocabularies. The first list containing
//! the word decides its kind.

use indexmap::IndexMap;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use super::token::TokenKind;
use crate::error::{HighlightResult, RuleTableError, WithContext};

/// The compiled-in word lists of EncryScript.
///
/// Lists may share spellings (`context` is both a builtin structure and a
/// library root); [`KeywordMapper`] resolves overlaps by priority.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Vocabulary {
    pub keywords: Vec<String>,
    /// Keywords promoted to `ControlKeyword`
    pub control_keywords: Vec<String>,
    pub builtin_constants: Vec<String>,
    pub builtin_functions: Vec<String>,
    pub builtin_types: Vec<String>,
    pub library_roots: Vec<String>,
    pub builtin_structures: Vec<String>,
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            keywords: words(&["and", "or", "case", "match", "return", "if", "else", "unlock"]),
            control_keywords: words(&["return"]),
            builtin_constants: words(&["true", "false", "base58"]),
            builtin_functions: words(&["checkSig", "checkType", "pkFromAddress", "unixTime"]),
            builtin_types: words(&[
                "Any", "Bool", "String", "Bytes", "Long", "Int", "Float", "Double", "Dict",
                "List", "Option",
            ]),
            library_roots: words(&["context", "state", "proof"]),
            builtin_structures: words(&["context", "reference"]),
        }
    }
}

impl Vocabulary {
    /// Parses a JSON override. Missing lists fall back to the defaults.
    pub fn from_json_str(json: &str) -> HighlightResult<Self> {
        let vocabulary: Vocabulary = serde_json::from_str(json)?;
        vocabulary.validate()?;
        Ok(vocabulary)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> HighlightResult<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read vocabulary {}", path.display()))?;
        let vocabulary: Vocabulary = serde_json::from_str(&json)
            .with_context(|| format!("invalid vocabulary {}", path.display()))?;
        vocabulary.validate()?;
        Ok(vocabulary)
    }

    /// Lists in classification priority order
    fn classes(&self) -> [(&'static str, &[String], TokenKind); 7] {
        [
            ("builtin_structures", &self.builtin_structures, TokenKind::BuiltinStructure),
            ("builtin_functions", &self.builtin_functions, TokenKind::BuiltinFunction),
            ("builtin_types", &self.builtin_types, TokenKind::BuiltinType),
            ("builtin_constants", &self.builtin_constants, TokenKind::BuiltinConstant),
            ("control_keywords", &self.control_keywords, TokenKind::ControlKeyword),
            ("keywords", &self.keywords, TokenKind::Keyword),
            ("library_roots", &self.library_roots, TokenKind::LibraryRoot),
        ]
    }

    /// Every list must be non-empty and hold identifier-shaped words.
    pub fn validate(&self) -> Result<(), RuleTableError> {
        for (list, entries, _) in self.classes() {
            if entries.is_empty() {
                return Err(RuleTableError::EmptyVocabulary { list });
            }
            if let Some(entry) = entries.iter().find(|e| !is_identifier(e)) {
                return Err(RuleTableError::InvalidVocabularyEntry {
                    list,
                    entry: entry.clone(),
                });
            }
        }
        Ok(())
    }

    /// Alternation of the builtin types for the typed-parameter rule.
    /// Longer names come first so `Long` is not cut short by a shorter prefix.
    pub fn types_pattern(&self) -> String {
        let mut types: Vec<&str> = self.builtin_types.iter().map(String::as_str).collect();
        types.sort_by(|a, b| b.len().cmp(&a.len()));
        types
            .into_iter()
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join("|")
    }
}

/// `[a-zA-Z$_][a-zA-Z0-9$_]*`
pub fn is_identifier(word: &str) -> bool {
    let mut chars = word.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '$' || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '$' || c == '_')
}

/// Resolves an identifier to its [`TokenKind`]
#[derive(Debug, Clone)]
pub struct KeywordMapper {
    words: IndexMap<String, TokenKind>,
    default: TokenKind,
}

impl KeywordMapper {
    pub fn new(vocabulary: &Vocabulary) -> Result<Self, RuleTableError> {
        vocabulary.validate()?;

        let mut words = IndexMap::new();
        for (_, entries, kind) in vocabulary.classes() {
            for entry in entries {
                // earlier lists win
                words.entry(entry.clone()).or_insert(kind);
            }
        }

        Ok(Self {
            words,
            default: TokenKind::Identifier,
        })
    }

    pub fn classify(&self, word: &str) -> TokenKind {
        self.words.get(word).copied().unwrap_or(self.default)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn mapper() -> KeywordMapper {
        KeywordMapper::new(&Vocabulary::default()).unwrap()
    }

    #[test_case("context", TokenKind::BuiltinStructure; "context is a structure before a root")]
    #[test_case("reference", TokenKind::BuiltinStructure)]
    #[test_case("checkSig", TokenKind::BuiltinFunction)]
    #[test_case("Option", TokenKind::BuiltinType)]
    #[test_case("base58", TokenKind::BuiltinConstant)]
    #[test_case("return", TokenKind::ControlKeyword; "return is overridden")]
    #[test_case("unlock", TokenKind::Keyword)]
    #[test_case("state", TokenKind::LibraryRoot)]
    #[test_case("proof", TokenKind::LibraryRoot)]
    #[test_case("foo", TokenKind::Identifier)]
    #[test_case("int", TokenKind::Identifier; "case sensitive")]
    fn test_classify(word: &str, expected: TokenKind) {
        assert_eq!(mapper().classify(word), expected);
    }

    #[test]
    fn test_duplicates_collapse() {
        // context appears twice, return appears twice
        let vocabulary = Vocabulary::default();
        let total: usize = vocabulary.classes().iter().map(|(_, e, _)| e.len()).sum();
        assert_eq!(mapper().len(), total - 2);
    }

    #[test]
    fn test_empty_list_rejected() {
        let vocabulary = Vocabulary {
            keywords: vec![],
            ..Vocabulary::default()
        };
        assert_eq!(
            KeywordMapper::new(&vocabulary).unwrap_err(),
            RuleTableError::EmptyVocabulary { list: "keywords" }
        );
    }

    #[test]
    fn test_non_identifier_rejected() {
        let vocabulary = Vocabulary {
            builtin_types: vec!["Int".into(), "List<Int>".into()],
            ..Vocabulary::default()
        };
        assert_eq!(
            vocabulary.validate().unwrap_err(),
            RuleTableError::InvalidVocabularyEntry {
                list: "builtin_types",
                entry: "List<Int>".into()
            }
        );
    }

    #[test]
    fn test_json_override_keeps_defaults() {
        let vocabulary = Vocabulary::from_json_str(r#"{"keywords": ["and", "or", "let"]}"#).unwrap();
        assert_eq!(vocabulary.keywords, vec!["and", "or", "let"]);
        assert_eq!(vocabulary.builtin_types, Vocabulary::default().builtin_types);
    }

    #[test]
    fn test_json_unknown_field() {
        assert!(Vocabulary::from_json_str(r#"{"kewords": []}"#).is_err());
    }

    #[test]
    fn test_types_pattern_prefers_longer() {
        let vocabulary = Vocabulary {
            builtin_types: vec!["In".into(), "Int".into()],
            ..Vocabulary::default()
        };
        assert_eq!(vocabulary.types_pattern(), "Int|In");
    }

    #[test_case("$ref", true)]
    #[test_case("_x9", true)]
    #[test_case("9x", false)]
    #[test_case("", false)]
    #[test_case("a-b", false)]
    fn test_is_identifier(word: &str, expected: bool) {
        assert_eq!(is_identifier(word), expected);
    }
}
