//! トークン定義

use serde::Serialize;
use std::fmt;

use super::state::State;

/// 字句カテゴリ
///
/// 一つのスパンにつき一つだけ割り当てられる。描画側は [`TokenKind::scope`]
/// を見てスタイルを決める。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenKind {
    // 語彙による分類
    Keyword,
    ControlKeyword,
    BuiltinFunction,
    BuiltinType,
    BuiltinConstant,
    BuiltinStructure,
    LibraryRoot,
    Identifier,

    // リテラル
    String,
    Numeric,
    Escape,

    // 記号
    Operator,
    OpenParen,
    CloseParen,
    Punctuation,

    // 宣言・アクセス
    StorageDeclaration,
    Variable,
    FunctionName,
    ParameterName,
    MemberAccessLeft,
    MemberAccessRight,

    // その他
    Whitespace,
    Text,
    Empty,
}

impl TokenKind {
    /// スタイル用のスコープ名
    pub fn scope(self) -> &'static str {
        match self {
            TokenKind::Keyword => "keyword",
            TokenKind::ControlKeyword => "keyword.control",
            TokenKind::BuiltinFunction => "function.buildin",
            TokenKind::BuiltinType => "support.type",
            TokenKind::BuiltinConstant => "constant.language",
            TokenKind::BuiltinStructure => "constant.library",
            TokenKind::LibraryRoot => "support.constant.library",
            TokenKind::Identifier => "identifier",
            TokenKind::String => "string",
            TokenKind::Numeric => "constant.numeric",
            TokenKind::Escape => "constant.language.escape",
            TokenKind::Operator => "keyword.operator",
            TokenKind::OpenParen => "paren.lparen",
            TokenKind::CloseParen => "paren.rparen",
            TokenKind::Punctuation => "punctuation.operator",
            TokenKind::StorageDeclaration => "storage.type",
            TokenKind::Variable => "variable",
            TokenKind::FunctionName => "support.function",
            TokenKind::ParameterName => "variable.parameter",
            TokenKind::MemberAccessLeft => "entity.name.section",
            TokenKind::MemberAccessRight => "entity.other",
            TokenKind::Whitespace | TokenKind::Text => "text",
            TokenKind::Empty => "empty",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scope())
    }
}

/// 行内のバイト範囲
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// 分類済みのスパン
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub span: Span,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind, text: &'a str, span: Span) -> Self {
        Self { kind, text, span }
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?}) @ {}..{}", self.kind, self.text, self.span.start, self.span.end)
    }
}

/// 1行分のスキャン結果
///
/// `tokens` は行全体を隙間なく覆う。`end_state` は次の行に渡す状態。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanResult<'a> {
    pub tokens: Vec<Token<'a>>,
    pub end_state: State,
}

impl<'a> ScanResult<'a> {
    /// トークンを連結して元の行を復元する
    pub fn text(&self) -> String {
        self.tokens.iter().map(|t| t.text).collect()
    }

    /// (種別, テキスト) の組だけを取り出す（テスト・ダンプ用）
    pub fn pairs(&self) -> Vec<(TokenKind, &'a str)> {
        self.tokens.iter().map(|t| (t.kind, t.text)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scopes() {
        assert_eq!(TokenKind::ControlKeyword.scope(), "keyword.control");
        assert_eq!(TokenKind::BuiltinStructure.scope(), "constant.library");
        assert_eq!(TokenKind::Escape.to_string(), "constant.language.escape");
    }

    #[test]
    fn test_token_display() {
        let token = Token::new(TokenKind::Numeric, "42L", Span::new(4, 7));
        assert_eq!(token.to_string(), "constant.numeric(\"42L\") @ 4..7");
    }

    #[test]
    fn test_scan_result_text() {
        let result = ScanResult {
            tokens: vec![
                Token::new(TokenKind::Identifier, "x", Span::new(0, 1)),
                Token::new(TokenKind::Whitespace, " ", Span::new(1, 2)),
                Token::new(TokenKind::Operator, "=", Span::new(2, 3)),
            ],
            end_state: State::Start,
        };
        assert_eq!(result.text(), "x =");
        assert_eq!(
            result.pairs(),
            vec![
                (TokenKind::Identifier, "x"),
                (TokenKind::Whitespace, " "),
                (TokenKind::Operator, "="),
            ]
        );
    }
}
