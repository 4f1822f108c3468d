//! Rule table construction
//!
//! A rule table maps every [`State`] to an ordered list of rules. Within a
//! state the first rule whose pattern matches at the cursor wins; there is no
//! longest-match arbitration, so declaration order is the only way to resolve
//! ambiguities (float before integer, `->` before `-`, and so on).

use indexmap::IndexMap;
use regex::{Captures, Regex};
use std::sync::LazyLock;

use super::state::State;
use super::token::TokenKind;
use super::vocabulary::{KeywordMapper, Vocabulary};
use crate::error::RuleTableError;

const DECIMAL_INTEGER: &str = r"(?:[1-9][0-9]*|0)";
const HEX_INTEGER: &str = r"(?:0[xX][0-9A-Fa-f]+)";
const BIN_INTEGER: &str = r"(?:0[bB][01]+)";
const INT_PART: &str = r"(?:[0-9]+)";
const FRACTION: &str = r"(?:\.[0-9]+)";
const IDENTIFIER: &str = r"[a-zA-Z$_][a-zA-Z0-9$_]*";
/// ASCII word boundary; `é` after `caf` still ends the identifier
const WORD_END: &str = r"(?-u:\b)";
const STRING_ESCAPE: &str =
    r#"\\(?:x[0-9A-Fa-f]{2}|[0-7]{3}|[\\abfnrtv'"]|U[0-9A-Fa-f]{8}|u[0-9A-Fa-f]{4})"#;
const OPERATORS: &str = r"//|<<|>>|<=|=>|==|!=|<>|\+|-|\*|/|%|&|\||\^|~|<|>|=";

fn integer() -> String {
    format!("(?:{DECIMAL_INTEGER}|{HEX_INTEGER}|{BIN_INTEGER})")
}

/// `.5`, `1.5` or `3.`; exponents are not part of the grammar
fn float_number() -> String {
    format!("(?:{INT_PART}?{FRACTION}|{INT_PART}\\.)")
}

/// How a match turns into tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// The whole match is one token
    Token(TokenKind),
    /// One kind per capture group, in order
    Groups(Vec<TokenKind>),
    /// The whole match is a word looked up in the vocabulary
    Keywords,
}

/// Uncompiled rule, as declared
#[derive(Debug, Clone)]
pub struct RuleSpec {
    pattern: String,
    lookahead: Option<String>,
    classification: Classification,
    next: Option<State>,
    consumes_line_end: bool,
    fallback: bool,
}

impl RuleSpec {
    fn new(pattern: impl Into<String>, classification: Classification) -> Self {
        Self {
            pattern: pattern.into(),
            lookahead: None,
            classification,
            next: None,
            consumes_line_end: false,
            fallback: false,
        }
    }

    pub fn token(kind: TokenKind, pattern: impl Into<String>) -> Self {
        Self::new(pattern, Classification::Token(kind))
    }

    pub fn groups(kinds: &[TokenKind], pattern: impl Into<String>) -> Self {
        Self::new(pattern, Classification::Groups(kinds.to_vec()))
    }

    pub fn keywords(pattern: impl Into<String>) -> Self {
        Self::new(pattern, Classification::Keywords)
    }

    /// Switch to `state` after this rule matched
    pub fn next(mut self, state: State) -> Self {
        self.next = Some(state);
        self
    }

    /// Require `pattern` right after the match without consuming it
    pub fn followed_by(mut self, pattern: impl Into<String>) -> Self {
        self.lookahead = Some(pattern.into());
        self
    }

    /// Stop scanning the line after this rule; the end-of-line rules of the
    /// active state are skipped
    pub fn consume_line_end(mut self) -> Self {
        self.consumes_line_end = true;
        self
    }

    /// Mark this rule as the state's catch-all
    pub fn fallback(mut self) -> Self {
        self.fallback = true;
        self
    }
}

/// Compiled rule
#[derive(Debug, Clone)]
pub struct Rule {
    source: String,
    pattern: Regex,
    lookahead: Option<Regex>,
    pub classification: Classification,
    pub next: Option<State>,
    pub consumes_line_end: bool,
    pub fallback: bool,
}

fn anchored(state: State, pattern: &str) -> Result<Regex, RuleTableError> {
    Regex::new(&format!(r"\A(?:{pattern})")).map_err(|e| RuleTableError::InvalidPattern {
        state,
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

impl Rule {
    fn compile(state: State, spec: RuleSpec) -> Result<Self, RuleTableError> {
        let pattern = anchored(state, &spec.pattern)?;
        let lookahead = spec
            .lookahead
            .as_deref()
            .map(|la| anchored(state, la))
            .transpose()?;

        if let Classification::Groups(kinds) = &spec.classification {
            let groups = pattern.captures_len() - 1;
            if groups != kinds.len() {
                return Err(RuleTableError::GroupCountMismatch {
                    state,
                    pattern: spec.pattern,
                    groups,
                    kinds: kinds.len(),
                });
            }
        }

        Ok(Self {
            source: spec.pattern,
            pattern,
            lookahead,
            classification: spec.classification,
            next: spec.next,
            consumes_line_end: spec.consumes_line_end,
            fallback: spec.fallback,
        })
    }

    /// Match at the start of `rest` (the line from the cursor on)
    pub fn match_at<'h>(&self, rest: &'h str) -> Option<Captures<'h>> {
        let captures = self.pattern.captures(rest)?;
        let end = captures.get(0)?.end();
        match &self.lookahead {
            Some(lookahead) if !lookahead.is_match(&rest[end..]) => None,
            _ => Some(captures),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Builds and validates a [`RuleTable`]
pub struct RuleTableBuilder {
    vocabulary: Vocabulary,
    states: IndexMap<State, Vec<RuleSpec>>,
}

impl RuleTableBuilder {
    pub fn new(vocabulary: Vocabulary) -> Self {
        Self {
            vocabulary,
            states: IndexMap::new(),
        }
    }

    /// Append rules to `state`
    pub fn state(mut self, state: State, rules: Vec<RuleSpec>) -> Self {
        self.states.entry(state).or_default().extend(rules);
        self
    }

    pub fn build(self) -> Result<RuleTable, RuleTableError> {
        let keywords = KeywordMapper::new(&self.vocabulary)?;

        let mut states = IndexMap::new();
        for (state, specs) in self.states {
            let rules = specs
                .into_iter()
                .map(|spec| Rule::compile(state, spec))
                .collect::<Result<Vec<_>, _>>()?;
            states.insert(state, rules);
        }

        for state in State::ALL {
            let rules = match states.get(&state) {
                Some(rules) if !rules.is_empty() => rules,
                _ => return Err(RuleTableError::MissingState { state }),
            };
            check_coverage(state, rules)?;
        }

        log::debug!(
            "built rule table: {} states, {} rules, {} vocabulary words",
            states.len(),
            states.values().map(Vec::len).sum::<usize>(),
            keywords.len()
        );

        Ok(RuleTable { states, keywords })
    }
}

/// Every state needs a rule for the end of the line and a fallback that
/// either consumes any character or leaves for another state.
fn check_coverage(state: State, rules: &[Rule]) -> Result<(), RuleTableError> {
    if !rules.iter().any(|rule| rule.match_at("").is_some()) {
        return Err(RuleTableError::UncoveredLineEnd { state });
    }

    let covering = rules.iter().filter(|rule| rule.fallback).any(|rule| {
        match rule.match_at("\u{1}").and_then(|c| c.get(0).map(|m| m.end())) {
            Some(0) => rule.next.is_some_and(|next| next != state),
            Some(_) => true,
            None => false,
        }
    });
    if !covering {
        return Err(RuleTableError::MissingFallback { state });
    }
    Ok(())
}

/// Immutable mapping from state to its ordered rules
#[derive(Debug, Clone)]
pub struct RuleTable {
    states: IndexMap<State, Vec<Rule>>,
    keywords: KeywordMapper,
}

impl RuleTable {
    pub fn builder(vocabulary: Vocabulary) -> RuleTableBuilder {
        RuleTableBuilder::new(vocabulary)
    }

    pub fn rules(&self, state: State) -> &[Rule] {
        self.states.get(&state).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn keywords(&self) -> &KeywordMapper {
        &self.keywords
    }

    /// The EncryScript rule set over `vocabulary`
    pub fn encryscript(vocabulary: &Vocabulary) -> Result<Self, RuleTableError> {
        use TokenKind::*;

        vocabulary.validate()?;
        let integer = integer();
        let types = vocabulary.types_pattern();

        let start = vec![
            RuleSpec::token(TokenKind::String, "\"").followed_by(".").next(State::DoubleQuotedString),
            RuleSpec::token(TokenKind::String, "'").followed_by(".").next(State::QuotedString),
            RuleSpec::token(Numeric, float_number()),
            RuleSpec::token(Numeric, format!(r"{integer}[lL]{WORD_END}")),
            RuleSpec::groups(
                &[StorageDeclaration, Whitespace, Variable],
                format!(r"(let)( +)({IDENTIFIER}){WORD_END}"),
            ),
            RuleSpec::groups(
                &[MemberAccessLeft, Punctuation, MemberAccessRight],
                format!(r"({IDENTIFIER})(\.)({IDENTIFIER})"),
            ),
            RuleSpec::groups(
                &[Keyword, Whitespace, FunctionName, OpenParen],
                format!(r"(def)( +)({IDENTIFIER})(\()"),
            )
            .next(State::FunctionArguments),
            RuleSpec::token(FunctionName, IDENTIFIER).followed_by(r"\("),
            RuleSpec::token(Numeric, format!(r"{integer}{WORD_END}")),
            RuleSpec::keywords(format!(r"{IDENTIFIER}{WORD_END}")),
            RuleSpec::token(Keyword, "->"),
            RuleSpec::token(Operator, OPERATORS),
            RuleSpec::token(OpenParen, r"[\[({]"),
            RuleSpec::token(CloseParen, r"[\])}]"),
            RuleSpec::token(Whitespace, r"\s+"),
            RuleSpec::token(Empty, "$"),
            RuleSpec::token(Text, "(?s).").fallback(),
        ];

        let string_rules = |quote: &str, state: State| {
            vec![
                RuleSpec::token(Escape, STRING_ESCAPE),
                RuleSpec::token(TokenKind::String, r"\\$").next(state).consume_line_end(),
                RuleSpec::token(TokenKind::String, format!("{}|$", regex::escape(quote))).next(State::Start),
                RuleSpec::token(TokenKind::String, "(?s).").fallback(),
            ]
        };

        let function_arguments = vec![
            RuleSpec::groups(
                &[ParameterName, Punctuation, Whitespace, BuiltinType],
                format!(r"({IDENTIFIER})(:)( *)({types}){WORD_END}"),
            ),
            RuleSpec::token(Punctuation, "[, :]+"),
            RuleSpec::token(Punctuation, "$"),
            RuleSpec::token(Empty, "").next(State::Start).fallback(),
        ];

        RuleTable::builder(vocabulary.clone())
            .state(State::Start, start)
            .state(State::DoubleQuotedString, string_rules("\"", State::DoubleQuotedString))
            .state(State::QuotedString, string_rules("'", State::QuotedString))
            .state(State::FunctionArguments, function_arguments)
            .build()
    }
}

static DEFAULT_TABLE: LazyLock<RuleTable> = LazyLock::new(|| {
    RuleTable::encryscript(&Vocabulary::default())
        .unwrap_or_else(|e| panic!("built-in EncryScript rule table is invalid: {e}"))
});

/// The process-wide EncryScript table, built on first use
pub fn default_table() -> &'static RuleTable {
    &DEFAULT_TABLE
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn first_match(state: State, input: &str) -> (usize, String) {
        let table = default_table();
        table
            .rules(state)
            .iter()
            .enumerate()
            .find_map(|(i, rule)| {
                rule.match_at(input)
                    .map(|c| (i, c.get(0).map_or("", |m| m.as_str()).to_string()))
            })
            .unwrap()
    }

    #[test]
    fn test_every_state_registered() {
        let table = default_table();
        for state in State::ALL {
            assert!(!table.rules(state).is_empty(), "{state} has no rules");
        }
    }

    #[test_case("3.14e2", "3.14")]
    #[test_case(".5", ".5")]
    #[test_case("3.", "3.")]
    #[test_case("42L", "42L")]
    #[test_case("0x1A", "0x1A")]
    #[test_case("0b101", "0b101")]
    #[test_case("42", "42")]
    fn test_numeric_prefix(input: &str, expected: &str) {
        let (_, matched) = first_match(State::Start, input);
        assert_eq!(matched, expected);
    }

    #[test]
    fn test_float_precedes_integer() {
        let (float_rule, _) = first_match(State::Start, "3.");
        let (integer_rule, _) = first_match(State::Start, "3 ");
        assert!(float_rule < integer_rule);
    }

    #[test]
    fn test_long_suffix_only_on_integers() {
        assert_eq!(first_match(State::Start, "1.5L").1, "1.5");
    }

    #[test_case("café", "caf")]
    #[test_case("42é", "42")]
    #[test_case("7lü", "7l"; "long suffix before non-ascii")]
    fn test_word_end_is_ascii(input: &str, expected: &str) {
        assert_eq!(first_match(State::Start, input).1, expected);
    }

    #[test]
    fn test_call_site_does_not_consume_paren() {
        assert_eq!(first_match(State::Start, "foo(1)").1, "foo");
    }

    #[test]
    fn test_quote_at_line_end_is_text() {
        let (index, matched) = first_match(State::Start, "\"");
        assert_eq!(matched, "\"");
        assert!(default_table().rules(State::Start)[index].fallback);
    }

    #[test_case(r"\x41", r"\x41"; "hex escape")]
    #[test_case(r"\101", r"\101"; "octal escape")]
    #[test_case(r"\U0001F600", r"\U0001F600"; "long unicode escape")]
    #[test_case("é", "é"; "plain character")]
    #[test_case(r#"\""#, r#"\""#; "escaped quote")]
    #[test_case(r"\q", r"\"; "unknown escape falls through")]
    fn test_string_escapes(input: &str, expected: &str) {
        assert_eq!(first_match(State::DoubleQuotedString, input).1, expected);
    }

    #[test]
    fn test_group_count_mismatch() {
        let err = RuleTable::builder(Vocabulary::default())
            .state(
                State::Start,
                vec![RuleSpec::groups(&[TokenKind::Keyword], "(a)(b)")],
            )
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            RuleTableError::GroupCountMismatch {
                state: State::Start,
                pattern: "(a)(b)".into(),
                groups: 2,
                kinds: 1,
            }
        );
    }

    #[test]
    fn test_invalid_pattern() {
        let err = RuleTable::builder(Vocabulary::default())
            .state(State::Start, vec![RuleSpec::token(TokenKind::Text, "(")])
            .build()
            .unwrap_err();
        assert!(matches!(err, RuleTableError::InvalidPattern { state: State::Start, .. }));
    }

    fn minimal() -> Vec<RuleSpec> {
        vec![
            RuleSpec::token(TokenKind::Empty, "$"),
            RuleSpec::token(TokenKind::Text, "(?s).").fallback(),
        ]
    }

    fn builder_with_all() -> RuleTableBuilder {
        State::ALL
            .into_iter()
            .fold(RuleTable::builder(Vocabulary::default()), |b, s| b.state(s, minimal()))
    }

    #[test]
    fn test_minimal_table_builds() {
        assert!(builder_with_all().build().is_ok());
    }

    #[test]
    fn test_missing_state() {
        let err = RuleTable::builder(Vocabulary::default())
            .state(State::Start, minimal())
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            RuleTableError::MissingState {
                state: State::DoubleQuotedString
            }
        );
    }

    #[test]
    fn test_missing_fallback() {
        let err = State::ALL
            .into_iter()
            .fold(RuleTable::builder(Vocabulary::default()), |b, s| {
                if s == State::QuotedString {
                    b.state(s, vec![RuleSpec::token(TokenKind::String, "'|$")])
                } else {
                    b.state(s, minimal())
                }
            })
            .build()
            .unwrap_err();
        assert_eq!(err, RuleTableError::MissingFallback { state: State::QuotedString });
    }

    #[test]
    fn test_zero_width_fallback_must_leave() {
        let err = State::ALL
            .into_iter()
            .fold(RuleTable::builder(Vocabulary::default()), |b, s| {
                if s == State::FunctionArguments {
                    b.state(s, vec![RuleSpec::token(TokenKind::Empty, "").fallback()])
                } else {
                    b.state(s, minimal())
                }
            })
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            RuleTableError::MissingFallback {
                state: State::FunctionArguments
            }
        );
    }

    #[test]
    fn test_uncovered_line_end() {
        let err = State::ALL
            .into_iter()
            .fold(RuleTable::builder(Vocabulary::default()), |b, s| {
                if s == State::Start {
                    b.state(s, vec![RuleSpec::token(TokenKind::Text, "(?s).").fallback()])
                } else {
                    b.state(s, minimal())
                }
            })
            .build()
            .unwrap_err();
        assert_eq!(err, RuleTableError::UncoveredLineEnd { state: State::Start });
    }

    #[test]
    fn test_empty_vocabulary_reported_at_construction() {
        let vocabulary = Vocabulary {
            builtin_functions: vec![],
            ..Vocabulary::default()
        };
        assert_eq!(
            RuleTable::encryscript(&vocabulary).unwrap_err(),
            RuleTableError::EmptyVocabulary {
                list: "builtin_functions"
            }
        );
    }
}
