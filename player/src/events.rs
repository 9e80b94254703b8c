use cozy_chess::Move;
use tokio::sync::mpsc;

/// Notifications a player sends to whoever runs the game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    /// The player finished its start-up handshake and can take a game.
    Ready,
    /// The player started thinking with this many milliseconds to spend.
    StartedThinking(i64),
    MoveMade(Move),
    Resign,
    /// The player's clock ran out. A `MoveMade` that follows is a late move.
    Timeout,
    DebugMessage(String),
}

pub type EventSender = mpsc::UnboundedSender<PlayerEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<PlayerEvent>;

pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
