//! 状態機械スキャナ
//!
//! 1行と開始状態を受け取り、行全体を覆うトークン列と終了状態を返す。
//! スキャナ自身はセッション状態を持たない。

use super::rules::{default_table, Classification, Rule, RuleTable};
use super::state::State;
use super::token::{ScanResult, Span, Token, TokenKind};

/// ルールテーブルを参照するだけのスキャナ
#[derive(Debug, Clone, Copy)]
pub struct Scanner<'t> {
    table: &'t RuleTable,
}

/// 同種トークンの結合を受け持つ出力先
struct Emitter<'a> {
    line: &'a str,
    tokens: Vec<Token<'a>>,
    /// 直前のトークンが単一分類ルール由来か
    last_mergeable: bool,
}

impl<'a> Emitter<'a> {
    fn new(line: &'a str) -> Self {
        Self {
            line,
            tokens: Vec::new(),
            last_mergeable: false,
        }
    }

    fn push(&mut self, kind: TokenKind, start: usize, end: usize, mergeable: bool) {
        if start == end {
            return;
        }

        if mergeable && self.last_mergeable {
            if let Some(last) = self.tokens.last_mut() {
                if last.kind == kind && last.span.end == start {
                    last.span.end = end;
                    last.text = &self.line[last.span.start..end];
                    return;
                }
            }
        }

        self.tokens
            .push(Token::new(kind, &self.line[start..end], Span::new(start, end)));
        self.last_mergeable = mergeable;
    }

    fn finish(self) -> Vec<Token<'a>> {
        self.tokens
    }
}

impl<'t> Scanner<'t> {
    pub fn new(table: &'t RuleTable) -> Self {
        Self { table }
    }

    /// 1行をスキャンする
    ///
    /// # Panics
    ///
    /// どのルールにもマッチしない位置があった場合、または入力を消費せず状態も
    /// 変えないマッチが続いた場合。どちらもテーブル構築時に排除されるはずの不整合。
    pub fn scan<'a>(&self, line: &'a str, start: State) -> ScanResult<'a> {
        let mut state = start;
        let mut cursor = 0;
        let mut stalled = 0;
        let mut emitter = Emitter::new(line);

        loop {
            let at_end = cursor == line.len();
            let rest = &line[cursor..];

            let (rule, captures) = self
                .table
                .rules(state)
                .iter()
                .find_map(|rule| rule.match_at(rest).map(|captures| (rule, captures)))
                .unwrap_or_else(|| {
                    panic!(
                        "no rule in state '{}' matches at byte {} of {:?}",
                        state, cursor, line
                    )
                });

            let matched = captures.get(0).map_or(0, |m| m.end());
            self.emit(&mut emitter, rule, &captures, cursor);

            if let Some(next) = rule.next {
                if next != state {
                    log::trace!("{} -> {} at byte {}", state, next, cursor + matched);
                }
                state = next;
            }
            cursor += matched;

            if at_end || rule.consumes_line_end {
                break;
            }

            // 入力を消費しない遷移が状態数を超えて続くなら循環している
            if matched == 0 {
                stalled += 1;
                if rule.next.is_none() || stalled > State::ALL.len() {
                    panic!(
                        "rule /{}/ in state '{}' matched without progress at byte {} of {:?}",
                        rule.source(),
                        state,
                        cursor,
                        line
                    );
                }
            } else {
                stalled = 0;
            }
        }

        ScanResult {
            tokens: emitter.finish(),
            end_state: state,
        }
    }

    /// 複数行のテキストを、状態を引き継ぎながらスキャンする
    pub fn scan_lines<'a>(&self, text: &'a str, start: State) -> Vec<ScanResult<'a>> {
        let mut state = start;
        text.lines()
            .map(|line| {
                let result = self.scan(line, state);
                state = result.end_state;
                result
            })
            .collect()
    }

    /// マッチ結果をトークンに変換する
    fn emit<'a>(
        &self,
        emitter: &mut Emitter<'a>,
        rule: &Rule,
        captures: &regex::Captures<'a>,
        offset: usize,
    ) {
        let Some(whole) = captures.get(0) else {
            return;
        };
        let (start, end) = (offset + whole.start(), offset + whole.end());

        match &rule.classification {
            Classification::Token(kind) => emitter.push(*kind, start, end, true),
            Classification::Keywords => {
                let kind = self.table.keywords().classify(whole.as_str());
                emitter.push(kind, start, end, true);
            }
            Classification::Groups(kinds) => {
                // グループ間の隙間はテキストとして埋める
                let mut pos = start;
                for (i, kind) in kinds.iter().enumerate() {
                    if let Some(group) = captures.get(i + 1) {
                        let (g_start, g_end) = (offset + group.start(), offset + group.end());
                        if g_start < pos {
                            continue;
                        }
                        emitter.push(TokenKind::Text, pos, g_start, false);
                        emitter.push(*kind, g_start, g_end, false);
                        pos = g_end;
                    }
                }
                emitter.push(TokenKind::Text, pos, end, false);
            }
        }
    }
}

impl Default for Scanner<'static> {
    fn default() -> Self {
        Scanner::new(default_table())
    }
}

/// 既定の EncryScript テーブルで1行をスキャンする
pub fn scan(line: &str, start: State) -> ScanResult<'_> {
    Scanner::default().scan(line, start)
}

/// 既定のテーブルで複数行をスキャンする
pub fn tokenize_lines(text: &str, start: State) -> Vec<ScanResult<'_>> {
    Scanner::default().scan_lines(text, start)
}

/// デバッグ用：スキャン結果を文字列として出力
pub fn format_tokens(result: &ScanResult<'_>) -> String {
    result
        .tokens
        .iter()
        .map(|t| t.to_string())
        .chain(std::iter::once(format!("=> {}", result.end_state)))
        .collect::<Vec<_>>()
        .join("\n")
}
