//! Per-line state cache
//!
//! A host keeps the end state of every line so that re-highlighting after an
//! edit only has to re-scan lines whose start state actually changed. This
//! module is that bookkeeping; the scanner itself stays stateless.

use crate::error::{HighlightError, HighlightResult};
use crate::lexer::{RuleTable, ScanResult, Scanner, State};

/// Lines of a buffer with the end state of each line
#[derive(Debug, Clone)]
pub struct Document<'t> {
    scanner: Scanner<'t>,
    lines: Vec<String>,
    end_states: Vec<State>,
}

impl Document<'static> {
    /// Document over the built-in EncryScript table
    pub fn new(text: &str) -> Self {
        Self::with_scanner(Scanner::default(), text)
    }
}

impl<'t> Document<'t> {
    pub fn with_table(table: &'t RuleTable, text: &str) -> Self {
        Self::with_scanner(Scanner::new(table), text)
    }

    fn with_scanner(scanner: Scanner<'t>, text: &str) -> Self {
        let lines: Vec<String> = text
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
            .collect();

        let mut end_states = Vec::with_capacity(lines.len());
        let mut state = State::INITIAL;
        for line in &lines {
            state = scanner.scan(line, state).end_state;
            end_states.push(state);
        }

        Self {
            scanner,
            lines,
            end_states,
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// State the given line starts in
    pub fn start_state(&self, index: usize) -> State {
        match index {
            0 => State::INITIAL,
            i => self.end_states.get(i - 1).copied().unwrap_or(State::INITIAL),
        }
    }

    /// State after the last line
    pub fn end_state(&self) -> State {
        self.end_states.last().copied().unwrap_or(State::INITIAL)
    }

    /// Tokens of one line, scanned from its stored start state
    pub fn line(&self, index: usize) -> Option<ScanResult<'_>> {
        let text = self.lines.get(index)?;
        Some(self.scanner.scan(text, self.start_state(index)))
    }

    /// Tokens of every line
    pub fn lines(&self) -> impl Iterator<Item = ScanResult<'_>> {
        (0..self.lines.len()).filter_map(move |i| self.line(i))
    }

    fn check_index(&self, index: usize, len: usize) -> HighlightResult<()> {
        if index < len {
            Ok(())
        } else {
            Err(HighlightError::LineOutOfRange { line: index, len })
        }
    }

    /// Replace a line; returns how many lines were re-scanned
    pub fn set_line(&mut self, index: usize, text: &str) -> HighlightResult<usize> {
        self.check_index(index, self.lines.len())?;
        self.lines[index] = text.to_string();
        Ok(self.rescan_from(index))
    }

    /// Insert a line before `index` (`index == len()` appends)
    pub fn insert_line(&mut self, index: usize, text: &str) -> HighlightResult<usize> {
        self.check_index(index, self.lines.len() + 1)?;
        // a new line ending in its own start state leaves the next line untouched
        let placeholder = self.start_state(index);
        self.lines.insert(index, text.to_string());
        self.end_states.insert(index, placeholder);
        Ok(self.rescan_from(index))
    }

    pub fn remove_line(&mut self, index: usize) -> HighlightResult<usize> {
        self.check_index(index, self.lines.len())?;
        self.lines.remove(index);
        self.end_states.remove(index);
        if index == self.lines.len() {
            return Ok(0);
        }
        Ok(self.rescan_from(index))
    }

    /// Re-scan from `index` until a line ends in the state it ended in before
    fn rescan_from(&mut self, index: usize) -> usize {
        let mut state = self.start_state(index);
        let mut rescanned = 0;

        for i in index..self.lines.len() {
            let end = self.scanner.scan(&self.lines[i], state).end_state;
            rescanned += 1;
            let unchanged = self.end_states[i] == end;
            self.end_states[i] = end;
            if unchanged {
                break;
            }
            state = end;
        }

        log::debug!("re-scanned {} line(s) from line {}", rescanned, index);
        rescanned
    }
}
