use cozy_chess::{GameStatus, Move};

use crate::fen::{format_fen, parse_fen, FenError};
use crate::pgn::san::{self, SanError};
use crate::types::Side;
use crate::variant::Variant;

/// Board state wrapper around cozy-chess, carrying the variant, the
/// starting position and the moves played since.
#[derive(Debug, Clone)]
pub struct Board {
    variant: Variant,
    position: cozy_chess::Board,
    starting_fen: String,
    history: Vec<Move>,
}

impl Board {
    /// Create a board at the starting position of `variant`.
    pub fn new(variant: Variant) -> Self {
        Self {
            variant,
            position: cozy_chess::Board::default(),
            starting_fen: variant.starting_fen().to_string(),
            history: Vec::new(),
        }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn is_random_variant(&self) -> bool {
        self.variant.is_random()
    }

    /// Switch to `variant` and reset to its starting position.
    pub fn set_variant(&mut self, variant: Variant) {
        self.variant = variant;
        self.position = cozy_chess::Board::default();
        self.starting_fen = variant.starting_fen().to_string();
        self.history.clear();
    }

    /// Set up the position described by `fen`, clearing the move history.
    /// On failure the board is left unchanged.
    pub fn set_board(&mut self, fen: &str) -> Result<(), FenError> {
        let position = parse_fen(fen)?;
        self.position = position;
        self.starting_fen = fen.trim().to_string();
        self.history.clear();
        Ok(())
    }

    /// FEN the current game started from, as it was given to `set_board`.
    pub fn starting_fen(&self) -> &str {
        &self.starting_fen
    }

    /// FEN of the current position.
    pub fn fen(&self) -> String {
        format_fen(&self.position)
    }

    pub fn position(&self) -> &cozy_chess::Board {
        &self.position
    }

    pub fn move_history(&self) -> &[Move] {
        &self.history
    }

    pub fn side_to_move(&self) -> Side {
        self.position.side_to_move().into()
    }

    pub fn fullmove_number(&self) -> u16 {
        self.position.fullmove_number()
    }

    pub fn status(&self) -> GameStatus {
        self.position.status()
    }

    /// Get all legal moves for the current position
    pub fn legal_moves(&self) -> Vec<Move> {
        let mut moves = Vec::new();
        self.position.generate_moves(|mvs| {
            moves.extend(mvs);
            false
        });
        moves
    }

    pub fn is_legal_move(&self, mv: Move) -> bool {
        self.legal_moves().contains(&mv)
    }

    /// Decode a SAN move in the current position.
    pub fn move_from_string(&self, text: &str) -> Result<Move, SanError> {
        san::parse_san(&self.position, text)
    }

    /// Encode `mv` as SAN in the current position.
    pub fn move_string(&self, mv: Move) -> String {
        san::format_san(&self.position, mv)
    }

    /// Play a legal move and record it in the history.
    pub fn make_move(&mut self, mv: Move) -> Result<(), BoardError> {
        if !self.is_legal_move(mv) {
            return Err(BoardError::IllegalMove(crate::uci::format_uci_move(mv)));
        }
        self.position.play_unchecked(mv);
        self.history.push(mv);
        Ok(())
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new(Variant::Standard)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("Illegal move: {0}")]
    IllegalMove(String),
    #[error("FEN parse error: {0}")]
    FenError(#[from] FenError),
}
