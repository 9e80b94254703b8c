use cozy_chess::{Board, File, GameStatus, Move, Piece, Rank, Square};

use crate::converters::{file_from_char, file_to_char, format_square, rank_from_char, rank_to_char};
use crate::types::PieceKind;

/// Parse Standard Algebraic Notation (SAN) move.
///
/// Check, mate and annotation suffixes (`+ # ! ?`) are ignored. The
/// returned move is always legal in `board`; castling is returned in
/// cozy-chess form (king takes own rook).
pub fn parse_san(board: &Board, san: &str) -> Result<Move, SanError> {
    let body = san.trim().trim_end_matches(|c: char| matches!(c, '+' | '#' | '!' | '?'));
    if body.is_empty() {
        return Err(SanError::InvalidFormat(san.to_string()));
    }

    match body {
        "O-O" | "0-0" => return find_castling(board, true, san),
        "O-O-O" | "0-0-0" => return find_castling(board, false, san),
        _ => {}
    }

    let mut chars: Vec<char> = body.chars().collect();

    let piece = match chars[0] {
        c if c.is_ascii_uppercase() => {
            let kind = PieceKind::from_char(c)
                .filter(|k| *k != PieceKind::Pawn)
                .ok_or_else(|| SanError::InvalidFormat(san.to_string()))?;
            chars.remove(0);
            Piece::from(kind)
        }
        _ => Piece::Pawn,
    };

    // Promotion suffix: "e8=Q", "e8Q" or "e8q"
    let mut promotion = None;
    if chars.len() >= 3 {
        let last = chars[chars.len() - 1];
        let prev = chars[chars.len() - 2];
        if last.is_ascii_alphabetic() && (prev == '=' || prev.is_ascii_digit()) {
            let kind = PieceKind::from_char(last)
                .filter(|k| !matches!(k, PieceKind::Pawn | PieceKind::King))
                .ok_or_else(|| SanError::InvalidPromotion(san.to_string()))?;
            promotion = Some(Piece::from(kind));
            chars.pop();
            if prev == '=' {
                chars.pop();
            }
        }
    }

    if chars.len() < 2 {
        return Err(SanError::InvalidFormat(san.to_string()));
    }
    let rank_char = chars.pop().unwrap_or_default();
    let file_char = chars.pop().unwrap_or_default();
    let to = match (file_from_char(file_char), rank_from_char(rank_char)) {
        (Some(file), Some(rank)) => Square::new(file, rank),
        _ => {
            return Err(SanError::InvalidSquare(format!(
                "{}{}",
                file_char, rank_char
            )))
        }
    };

    let mut from_file: Option<File> = None;
    let mut from_rank: Option<Rank> = None;
    for c in chars {
        match c {
            'x' | ':' | '-' => {}
            'a'..='h' => from_file = file_from_char(c),
            '1'..='8' => from_rank = rank_from_char(c),
            other => return Err(SanError::InvalidFormat(format!("{} ({})", san, other))),
        }
    }

    let mut candidates = Vec::new();
    board.generate_moves(|moves| {
        if moves.piece != piece {
            return false;
        }
        for mv in moves {
            if mv.to != to || mv.promotion != promotion || is_castling(board, mv) {
                continue;
            }
            if from_file.is_some_and(|f| mv.from.file() != f) {
                continue;
            }
            if from_rank.is_some_and(|r| mv.from.rank() != r) {
                continue;
            }
            candidates.push(mv);
        }
        false
    });

    match candidates.as_slice() {
        [mv] => Ok(*mv),
        [] => Err(SanError::NoLegalMove(san.to_string())),
        _ => Err(SanError::AmbiguousMove(san.to_string())),
    }
}

/// Format a legal move as SAN, with minimal disambiguation and a `+`/`#`
/// suffix.
///
/// Falls back to coordinate notation when `mv` does not start on a piece.
pub fn format_san(board: &Board, mv: Move) -> String {
    let Some(piece) = board.piece_on(mv.from) else {
        return format!("{}{}", format_square(mv.from), format_square(mv.to));
    };

    let mut san = String::new();

    if is_castling(board, mv) {
        if mv.to.file() as u8 > mv.from.file() as u8 {
            san.push_str("O-O");
        } else {
            san.push_str("O-O-O");
        }
    } else {
        let is_capture = board.piece_on(mv.to).is_some()
            || (piece == Piece::Pawn && mv.from.file() != mv.to.file());

        if piece == Piece::Pawn {
            if is_capture {
                san.push(file_to_char(mv.from.file()));
            }
        } else {
            san.push(PieceKind::from(piece).to_char_upper());
            push_disambiguation(&mut san, board, mv, piece);
        }

        if is_capture {
            san.push('x');
        }
        san.push_str(&format_square(mv.to));

        if let Some(promo) = mv.promotion {
            san.push('=');
            san.push(PieceKind::from(promo).to_char_upper());
        }
    }

    let mut after = board.clone();
    after.play_unchecked(mv);
    if !after.checkers().is_empty() {
        if after.status() == GameStatus::Won {
            san.push('#');
        } else {
            san.push('+');
        }
    }

    san
}

/// cozy-chess encodes castling as the king capturing its own rook.
fn is_castling(board: &Board, mv: Move) -> bool {
    board.piece_on(mv.from) == Some(Piece::King)
        && board.color_on(mv.to) == Some(board.side_to_move())
}

fn find_castling(board: &Board, short: bool, san: &str) -> Result<Move, SanError> {
    let mut found = None;
    board.generate_moves(|moves| {
        if moves.piece != Piece::King {
            return false;
        }
        for mv in moves {
            let kingside = mv.to.file() as u8 > mv.from.file() as u8;
            if is_castling(board, mv) && kingside == short {
                found = Some(mv);
                return true;
            }
        }
        false
    });
    found.ok_or_else(|| SanError::NoLegalMove(san.to_string()))
}

fn push_disambiguation(san: &mut String, board: &Board, mv: Move, piece: Piece) {
    let mut rivals = Vec::new();
    board.generate_moves(|moves| {
        if moves.piece != piece || moves.from == mv.from {
            return false;
        }
        for other in moves {
            if other.to == mv.to && !is_castling(board, other) {
                rivals.push(other.from);
                break;
            }
        }
        false
    });

    if rivals.is_empty() {
        return;
    }

    let file_unique = rivals.iter().all(|sq| sq.file() != mv.from.file());
    let rank_unique = rivals.iter().all(|sq| sq.rank() != mv.from.rank());
    if file_unique {
        san.push(file_to_char(mv.from.file()));
    } else if rank_unique {
        san.push(rank_to_char(mv.from.rank()));
    } else {
        san.push_str(&format_square(mv.from));
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SanError {
    #[error("No legal move found for: {0}")]
    NoLegalMove(String),
    #[error("Ambiguous move: {0}")]
    AmbiguousMove(String),
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
    #[error("Invalid square: {0}")]
    InvalidSquare(String),
    #[error("Invalid promotion: {0}")]
    InvalidPromotion(String),
}
