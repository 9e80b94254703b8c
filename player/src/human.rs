use chess::GameResult;
use cozy_chess::Move;

use crate::events::EventSender;
use crate::player::{Player, PlayerCore, PlayerError};
use crate::scheduler::Scheduler;

/// A player whose moves come from a person, e.g. through a UI.
///
/// Moves submitted while it is not this player's turn are dropped.
pub struct HumanPlayer {
    core: PlayerCore,
    thinking: bool,
    last_opponent_move: Option<Move>,
}

impl HumanPlayer {
    pub fn new(name: impl Into<String>, events: EventSender, scheduler: Box<dyn Scheduler>) -> Self {
        Self {
            core: PlayerCore::new(name, events, scheduler),
            thinking: false,
            last_opponent_move: None,
        }
    }

    pub fn is_thinking(&self) -> bool {
        self.thinking
    }

    /// The move most recently passed to [`Player::make_move`].
    pub fn last_opponent_move(&self) -> Option<Move> {
        self.last_opponent_move
    }

    /// Play `mv` as this player's move. Returns `false` if it is not this
    /// player's turn.
    pub fn submit_move(&mut self, mv: Move) -> bool {
        if !self.thinking {
            tracing::warn!(
                player = %self.core.name(),
                mv = %chess::format_uci_move(mv),
                "Ignoring move submitted out of turn"
            );
            return false;
        }
        self.thinking = false;
        self.core.emit_move(mv);
        true
    }

    pub fn resign(&mut self) {
        self.thinking = false;
        self.core.emit_resign();
    }
}

impl Player for HumanPlayer {
    fn core(&self) -> &PlayerCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut PlayerCore {
        &mut self.core
    }

    fn is_human(&self) -> bool {
        true
    }

    fn make_move(&mut self, mv: Move) -> Result<(), PlayerError> {
        self.last_opponent_move = Some(mv);
        Ok(())
    }

    fn go(&mut self) -> Result<(), PlayerError> {
        self.core.go();
        self.thinking = true;
        Ok(())
    }

    fn end_game(&mut self, result: GameResult) -> Result<(), PlayerError> {
        self.thinking = false;
        self.core.end_game(result);
        Ok(())
    }
}
