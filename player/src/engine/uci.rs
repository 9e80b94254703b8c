//! UCI wire format: rendering commands and parsing engine output lines.

use chess::{converters::parse_square, PieceKind};
use cozy_chess::{Move, Piece};

use super::{EngineCommand, GoParams};

/// Incoming message from a UCI engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UciMessage {
    Id { name: String, value: String },
    UciOk,
    ReadyOk,
    /// `mv` is `None` for `bestmove (none)` / `bestmove 0000`, sent when
    /// the engine has no move to play.
    BestMove { mv: Option<Move>, ponder: Option<Move> },
    Info(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UciError {
    #[error("Malformed UCI message: {0}")]
    MalformedMessage(String),
    #[error("Unknown UCI message: {0}")]
    UnknownMessage(String),
    #[error("Invalid move: {0}")]
    InvalidMove(String),
}

/// Parse a UCI message line
pub fn parse_uci_message(line: &str) -> Result<UciMessage, UciError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    match tokens.first() {
        Some(&"uciok") => Ok(UciMessage::UciOk),
        Some(&"readyok") => Ok(UciMessage::ReadyOk),

        Some(&"id") => {
            if tokens.len() < 3 {
                return Err(UciError::MalformedMessage(line.to_string()));
            }
            Ok(UciMessage::Id {
                name: tokens[1].to_string(),
                value: tokens[2..].join(" "),
            })
        }

        Some(&"bestmove") => {
            let mv = match tokens.get(1) {
                Some(&"(none)") | Some(&"0000") => None,
                Some(text) => Some(parse_uci_move(text)?),
                None => return Err(UciError::MalformedMessage(line.to_string())),
            };
            let ponder = match tokens.get(2..4) {
                Some(["ponder", text]) => parse_uci_move(text).ok(),
                _ => None,
            };
            Ok(UciMessage::BestMove { mv, ponder })
        }

        Some(&"info") => Ok(UciMessage::Info(tokens[1..].join(" "))),

        _ => Err(UciError::UnknownMessage(line.to_string())),
    }
}

/// Parse UCI move format (e2e4, e7e8q)
pub fn parse_uci_move(s: &str) -> Result<Move, UciError> {
    let invalid = || UciError::InvalidMove(s.to_string());
    if !s.is_ascii() || !(4..=5).contains(&s.len()) {
        return Err(invalid());
    }

    let from = parse_square(&s[0..2]).ok_or_else(invalid)?;
    let to = parse_square(&s[2..4]).ok_or_else(invalid)?;
    let promotion = match s[4..].chars().next() {
        Some(c) => match PieceKind::from_char(c).map(Piece::from) {
            Some(piece @ (Piece::Queen | Piece::Rook | Piece::Bishop | Piece::Knight)) => {
                Some(piece)
            }
            _ => return Err(invalid()),
        },
        None => None,
    };

    Ok(Move {
        from,
        to,
        promotion,
    })
}

impl EngineCommand {
    /// The command as one UCI line, without the line terminator.
    pub fn to_uci(&self) -> String {
        match self {
            Self::NewGame => "ucinewgame".to_string(),
            Self::SetPosition { fen, moves } => {
                let mut cmd = format!("position fen {}", fen);
                if !moves.is_empty() {
                    cmd.push_str(" moves");
                    for mv in moves {
                        cmd.push(' ');
                        cmd.push_str(&chess::format_uci_move(*mv));
                    }
                }
                cmd
            }
            Self::SetOption { name, value } => match value {
                Some(value) => format!("setoption name {} value {}", name, value),
                None => format!("setoption name {}", name),
            },
            Self::Go(params) => params.to_uci(),
            Self::Stop => "stop".to_string(),
            Self::Quit => "quit".to_string(),
        }
    }
}

impl GoParams {
    pub fn to_uci(&self) -> String {
        let mut cmd = "go".to_string();
        if self.infinite {
            cmd.push_str(" infinite");
            return cmd;
        }
        if let Some(movetime) = self.movetime {
            cmd.push_str(&format!(" movetime {}", movetime));
            return cmd;
        }
        if let Some(depth) = self.depth {
            cmd.push_str(&format!(" depth {}", depth));
            return cmd;
        }

        let clock = [
            ("wtime", self.wtime),
            ("btime", self.btime),
            ("winc", self.winc),
            ("binc", self.binc),
            ("movestogo", self.movestogo.map(u64::from)),
        ];
        for (key, value) in clock {
            if let Some(value) = value {
                cmd.push_str(&format!(" {} {}", key, value));
            }
        }
        cmd
    }
}
