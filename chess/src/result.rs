use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::types::Side;

/// Outcome of a game as recorded in PGN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GameResult {
    WhiteWins,
    BlackWins,
    Draw,
    /// Game still in progress, abandoned, or result not known (`*`).
    #[default]
    Unknown,
}

impl GameResult {
    /// The canonical short form used in the `Result` tag and as the
    /// termination marker.
    pub fn to_simple_string(self) -> &'static str {
        match self {
            Self::WhiteWins => "1-0",
            Self::BlackWins => "0-1",
            Self::Draw => "1/2-1/2",
            Self::Unknown => "*",
        }
    }

    pub fn winner(self) -> Option<Side> {
        match self {
            Self::WhiteWins => Some(Side::White),
            Self::BlackWins => Some(Side::Black),
            Self::Draw | Self::Unknown => None,
        }
    }

    pub fn is_decisive(self) -> bool {
        self.winner().is_some()
    }

    /// Result of a game won by `side`, e.g. after the opponent resigned or
    /// lost on time.
    pub fn win_for(side: Side) -> Self {
        match side {
            Side::White => Self::WhiteWins,
            Side::Black => Self::BlackWins,
        }
    }
}

impl FromStr for GameResult {
    type Err = ResultParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1-0" => Ok(Self::WhiteWins),
            "0-1" => Ok(Self::BlackWins),
            "1/2-1/2" => Ok(Self::Draw),
            "*" => Ok(Self::Unknown),
            other => Err(ResultParseError(other.to_string())),
        }
    }
}

impl std::fmt::Display for GameResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_simple_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid result: {0}")]
pub struct ResultParseError(pub String);
