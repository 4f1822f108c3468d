//! Terminal and dump output for scan results

use colored::{Color, ColoredString, Colorize};
use serde::Serialize;

use crate::error::HighlightResult;
use crate::lexer::{format_tokens, ScanResult, State, Token, TokenKind};

/// Terminal color and boldness for a token kind; `None` leaves the text plain
pub fn style(kind: TokenKind) -> Option<(Color, bool)> {
    use TokenKind::*;
    let style = match kind {
        Keyword | ControlKeyword => (Color::Magenta, true),
        StorageDeclaration => (Color::BrightMagenta, true),
        Operator => (Color::Magenta, false),
        BuiltinFunction | FunctionName => (Color::Blue, false),
        BuiltinType => (Color::Cyan, false),
        BuiltinConstant | Numeric => (Color::Yellow, false),
        BuiltinStructure | LibraryRoot | MemberAccessLeft => (Color::BrightCyan, false),
        MemberAccessRight => (Color::BrightBlue, false),
        String => (Color::Green, false),
        Escape => (Color::BrightGreen, true),
        Variable | ParameterName => (Color::Red, false),
        Identifier | Punctuation | OpenParen | CloseParen | Whitespace | Text | Empty => {
            return None
        }
    };
    Some(style)
}

pub fn paint(token: &Token<'_>) -> ColoredString {
    match style(token.kind) {
        Some((color, true)) => token.text.color(color).bold(),
        Some((color, false)) => token.text.color(color),
        None => token.text.normal(),
    }
}

/// The line with every token painted
pub fn paint_line(result: &ScanResult<'_>) -> String {
    result.tokens.iter().map(|t| paint(t).to_string()).collect()
}

/// Human-readable token dump, one block per line
pub fn dump_text(results: &[ScanResult<'_>]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, result)| format!("--- line {} ---\n{}", i + 1, format_tokens(result)))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Serialize)]
struct LineDump<'r, 'a> {
    line: usize,
    tokens: &'r [Token<'a>],
    end_state: State,
}

/// JSON token dump
pub fn dump_json(results: &[ScanResult<'_>]) -> HighlightResult<String> {
    let lines: Vec<_> = results
        .iter()
        .enumerate()
        .map(|(i, result)| LineDump {
            line: i + 1,
            tokens: &result.tokens,
            end_state: result.end_state,
        })
        .collect();
    Ok(serde_json::to_string_pretty(&lines)?)
}
