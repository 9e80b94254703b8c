use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::{Duration, Instant};

use chess::{BoardError, FenError, GameResult, Side, TimeControl, Variant};
use cozy_chess::Move;

use crate::events::{EventSender, PlayerEvent};
use crate::scheduler::Scheduler;

pub type PlayerRef = Rc<RefCell<dyn Player>>;
pub type WeakPlayerRef = Weak<RefCell<dyn Player>>;

#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    #[error("Engine command channel closed")]
    ChannelClosed,
    #[error("Engine command queue is full")]
    QueueFull,
    #[error(transparent)]
    Board(#[from] BoardError),
    #[error("Invalid starting position: {0}")]
    Fen(#[from] FenError),
}

/// State and clock handling shared by every kind of player.
///
/// The clock is the authority on how much time a move took. The timer only
/// wakes the game up when the clock is probably out; [`emit_move`] settles
/// which of the two won.
///
/// [`emit_move`]: PlayerCore::emit_move
pub struct PlayerCore {
    name: String,
    side: Option<Side>,
    time_control: TimeControl,
    opponent: Option<WeakPlayerRef>,
    ready: bool,
    variants: Vec<Variant>,
    scheduler: Box<dyn Scheduler>,
    events: EventSender,
}

impl PlayerCore {
    pub fn new(name: impl Into<String>, events: EventSender, scheduler: Box<dyn Scheduler>) -> Self {
        Self {
            name: name.into(),
            side: None,
            time_control: TimeControl::infinite(),
            opponent: None,
            ready: true,
            variants: vec![Variant::Standard],
            scheduler,
            events,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// The side being played, `None` outside a game.
    pub fn side(&self) -> Option<Side> {
        self.side
    }

    pub fn time_control(&self) -> &TimeControl {
        &self.time_control
    }

    pub fn time_control_mut(&mut self) -> &mut TimeControl {
        &mut self.time_control
    }

    pub fn set_time_control(&mut self, time_control: TimeControl) {
        self.time_control = time_control;
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }

    pub fn supports_variant(&self, variant: Variant) -> bool {
        self.variants.contains(&variant)
    }

    pub fn set_supported_variants(&mut self, variants: Vec<Variant>) {
        self.variants = variants;
    }

    /// The opponent in the current game, if it is still alive.
    pub fn opponent(&self) -> Option<PlayerRef> {
        self.opponent.as_ref().and_then(Weak::upgrade)
    }

    pub fn now(&self) -> Instant {
        self.scheduler.now()
    }

    /// Whether the timeout timer is armed.
    pub fn is_timer_active(&self) -> bool {
        self.scheduler.is_active()
    }

    /// Start a game as `side` against `opponent`, with a full clock.
    ///
    /// # Panics
    ///
    /// If the player is not ready.
    pub fn new_game(&mut self, side: Side, opponent: WeakPlayerRef) {
        assert!(self.ready, "new_game: player {} is not ready", self.name);

        self.opponent = Some(opponent);
        self.side = Some(side);
        self.time_control.reset();
        tracing::info!(player = %self.name, side = %side, time_control = %self.time_control, "New game");
    }

    /// Stop the clock's timer. The result is informational.
    pub fn end_game(&mut self, result: GameResult) {
        self.scheduler.cancel();
        tracing::debug!(player = %self.name, result = %result, "Game ended");
    }

    /// Start thinking: report the time budget, start the clock and arm the
    /// timeout timer. An infinite clock never times out, so no timer is
    /// armed for it.
    ///
    /// # Panics
    ///
    /// If the player is not ready.
    pub fn go(&mut self) {
        assert!(self.ready, "go: player {} is not ready", self.name);

        if !self.time_control.is_infinite() {
            self.send(PlayerEvent::StartedThinking(self.time_control.move_budget()));
        }

        let now = self.scheduler.now();
        self.time_control.start_timer_at(now);
        if self.time_control.is_infinite() {
            tracing::debug!(player = %self.name, "Thinking without a time limit");
            return;
        }

        let time_left = self.time_control.time_left();
        let events = self.events.clone();
        let name = self.name.clone();
        self.scheduler.arm(
            Duration::from_millis(u64::try_from(time_left).unwrap_or(0)),
            Box::new(move || {
                tracing::info!(player = %name, "Time is up");
                let _ = events.send(PlayerEvent::Timeout);
            }),
        );
        tracing::debug!(player = %self.name, time_left, "Thinking");
    }

    /// Disarm the timeout timer, leaving the clock running.
    pub fn cancel_timer(&mut self) {
        if self.scheduler.cancel() {
            tracing::debug!(player = %self.name, "Timer cancelled");
        }
    }

    /// Start timing a move without arming the timer.
    pub fn start_clock(&mut self) {
        let now = self.scheduler.now();
        self.time_control.start_timer_at(now);
    }

    /// Charge the time since [`start_clock`](Self::start_clock) or
    /// [`go`](Self::go) to the clock.
    pub fn stop_clock(&mut self) {
        let now = self.scheduler.now();
        self.time_control.update_at(now);
    }

    /// The one way a move leaves the player.
    ///
    /// Charges the move to the clock and stops the timer. If the timer was
    /// still pending but the clock shows the time ran out, `Timeout` is sent
    /// first; if the timer already fired it sent `Timeout` itself. Either way
    /// `MoveMade` follows.
    pub fn emit_move(&mut self, mv: Move) {
        self.stop_clock();
        if self.scheduler.cancel() && self.time_control.is_expired() {
            tracing::info!(player = %self.name, "Move arrived after the time ran out");
            self.send(PlayerEvent::Timeout);
        }
        tracing::debug!(
            player = %self.name,
            mv = %chess::format_uci_move(mv),
            elapsed = self.time_control.last_move_time(),
            "Move made"
        );
        self.send(PlayerEvent::MoveMade(mv));
    }

    pub fn emit_ready(&mut self) {
        self.ready = true;
        self.send(PlayerEvent::Ready);
    }

    pub fn emit_resign(&mut self) {
        self.scheduler.cancel();
        tracing::info!(player = %self.name, "Resigned");
        self.send(PlayerEvent::Resign);
    }

    pub fn emit_debug(&self, message: impl Into<String>) {
        self.send(PlayerEvent::DebugMessage(message.into()));
    }

    fn send(&self, event: PlayerEvent) {
        if self.events.send(event).is_err() {
            tracing::debug!(player = %self.name, "Event receiver dropped");
        }
    }
}

/// A participant in a game: a human at a board or a chess engine.
///
/// Every implementation owns a [`PlayerCore`]; the provided methods drive
/// the clock through it, so implementors only add what their decision
/// process needs.
pub trait Player {
    fn core(&self) -> &PlayerCore;

    fn core_mut(&mut self) -> &mut PlayerCore;

    fn is_human(&self) -> bool;

    /// Tell the player about a move played on the board, normally the
    /// opponent's.
    fn make_move(&mut self, mv: Move) -> Result<(), PlayerError>;

    /// # Panics
    ///
    /// If the player is not ready.
    fn new_game(&mut self, side: Side, opponent: WeakPlayerRef) -> Result<(), PlayerError> {
        self.core_mut().new_game(side, opponent);
        Ok(())
    }

    fn end_game(&mut self, result: GameResult) -> Result<(), PlayerError> {
        self.core_mut().end_game(result);
        Ok(())
    }

    /// # Panics
    ///
    /// If the player is not ready.
    fn go(&mut self) -> Result<(), PlayerError> {
        self.core_mut().go();
        Ok(())
    }

    /// Play `mv` as this player's own move without deliberation, charging
    /// the time it takes to the clock.
    fn make_book_move(&mut self, mv: Move) -> Result<(), PlayerError> {
        self.core_mut().start_clock();
        let result = self.make_move(mv);
        self.core_mut().stop_clock();
        result
    }

    fn name(&self) -> &str {
        self.core().name()
    }

    fn side(&self) -> Option<Side> {
        self.core().side()
    }

    fn is_ready(&self) -> bool {
        self.core().is_ready()
    }

    fn time_control(&self) -> &TimeControl {
        self.core().time_control()
    }

    fn set_time_control(&mut self, time_control: TimeControl) {
        self.core_mut().set_time_control(time_control);
    }

    fn supports_variant(&self, variant: Variant) -> bool {
        self.core().supports_variant(variant)
    }
}
