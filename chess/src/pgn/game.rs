use cozy_chess::Move;

use super::parser::PgnError;
use crate::board::Board;
use crate::result::GameResult;
use crate::variant::Variant;

/// One game record: the canonical header fields and the main line.
///
/// Comments, NAGs, variations and unknown tags are dropped on read.
#[derive(Debug, Default)]
pub struct PgnGame {
    pub(super) white: String,
    pub(super) black: String,
    pub(super) result: GameResult,
    /// Set once a `Result` tag with a valid value has been read; it takes
    /// precedence over the termination marker.
    pub(super) result_tag: Option<GameResult>,
    pub(super) variant: Variant,
    pub(super) is_random_variant: bool,
    pub(super) fen: String,
    pub(super) moves: Vec<Move>,
    pub(super) has_tags: bool,
    pub(super) round: u32,
    pub(super) error: Option<PgnError>,
    pub(super) truncated: bool,
}

impl PgnGame {
    /// Snapshot a game being played on `board`.
    ///
    /// The record starts from the board's starting FEN and carries every
    /// move in its history.
    pub fn from_board(
        white: impl Into<String>,
        black: impl Into<String>,
        board: &Board,
        result: GameResult,
    ) -> Self {
        Self {
            white: white.into(),
            black: black.into(),
            result,
            result_tag: Some(result),
            variant: board.variant(),
            is_random_variant: board.is_random_variant(),
            fen: board.starting_fen().to_string(),
            moves: board.move_history().to_vec(),
            has_tags: true,
            ..Self::default()
        }
    }

    pub fn white_player(&self) -> &str {
        &self.white
    }

    pub fn black_player(&self) -> &str {
        &self.black
    }

    pub fn result(&self) -> GameResult {
        self.result
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn is_random_variant(&self) -> bool {
        self.is_random_variant
    }

    /// FEN of the starting position. Empty until a `FEN` tag or the first
    /// move established one.
    pub fn starting_fen(&self) -> &str {
        &self.fen
    }

    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    pub fn has_tags(&self) -> bool {
        self.has_tags
    }

    /// Round number from the `Round` tag, 0 if absent or not a number.
    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn set_round(&mut self, round: u32) {
        self.round = round;
    }

    pub fn set_result(&mut self, result: GameResult) {
        self.result = result;
        self.result_tag = Some(result);
    }

    /// The error that stopped reading this game early, if any.
    pub fn error(&self) -> Option<&PgnError> {
        self.error.as_ref()
    }

    /// Whether reading stopped because the move cap was reached.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::STANDARD_START_FEN;

    #[test]
    fn test_from_board_snapshot() {
        let mut board = Board::default();
        for san in ["e4", "c5", "Nf3"] {
            let mv = board.move_from_string(san).unwrap();
            board.make_move(mv).unwrap();
        }

        let game = PgnGame::from_board("Alice", "Bob", &board, GameResult::Draw);
        assert!(game.has_tags());
        assert_eq!(game.white_player(), "Alice");
        assert_eq!(game.black_player(), "Bob");
        assert_eq!(game.result(), GameResult::Draw);
        assert_eq!(game.starting_fen(), STANDARD_START_FEN);
        assert_eq!(game.moves().len(), 3);
        assert_eq!(game.variant(), Variant::Standard);
        assert!(game.error().is_none());
    }

    #[test]
    fn test_default_game_is_empty() {
        let game = PgnGame::default();
        assert!(game.is_empty());
        assert!(!game.has_tags());
        assert_eq!(game.result(), GameResult::Unknown);
        assert_eq!(game.round(), 0);
    }
}
