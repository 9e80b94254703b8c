//! Chess players and their clocks.
//!
//! A [`Player`] is told about the game through method calls and answers
//! with [`PlayerEvent`]s on a channel. Humans and UCI engines share the
//! clock handling in [`PlayerCore`].

pub mod engine;
pub mod events;
pub mod human;
pub mod player;
pub mod scheduler;

pub use engine::{EngineCommand, EngineConfig, EngineEvent, EnginePlayer, GoParams};
pub use events::{event_channel, EventReceiver, EventSender, PlayerEvent};
pub use human::HumanPlayer;
pub use player::{Player, PlayerCore, PlayerError, PlayerRef, WeakPlayerRef};
pub use scheduler::{ManualScheduler, Scheduler, TimerCallback, TokioScheduler};
