//! Scanning modes

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::HighlightError;

/// The mode a line starts (and ends) in.
///
/// Hosts keep one of these per buffer line and hand it back on the next call;
/// [`State::name`] / [`FromStr`] give a stable textual form for persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum State {
    Start,
    DoubleQuotedString,
    QuotedString,
    FunctionArguments,
}

impl State {
    /// State of the first line of a document
    pub const INITIAL: State = State::Start;

    pub const ALL: [State; 4] = [
        State::Start,
        State::DoubleQuotedString,
        State::QuotedString,
        State::FunctionArguments,
    ];

    pub fn name(self) -> &'static str {
        match self {
            State::Start => "start",
            State::DoubleQuotedString => "double-quoted-string",
            State::QuotedString => "quoted-string",
            State::FunctionArguments => "function-arguments",
        }
    }
}

impl Default for State {
    fn default() -> Self {
        State::INITIAL
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for State {
    type Err = HighlightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        State::ALL
            .into_iter()
            .find(|state| state.name() == s)
            .ok_or_else(|| HighlightError::Config(format!("unknown scanner state '{}'", s)))
    }
}
