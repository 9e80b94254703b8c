//! Players backed by a UCI chess engine.
//!
//! The engine process itself lives behind a command channel: the player
//! queues [`EngineCommand`]s and whoever owns the process feeds its output
//! back through [`EnginePlayer::handle_uci_line`] or
//! [`EnginePlayer::handle_event`].

pub mod uci;

pub use uci::{parse_uci_message, parse_uci_move, UciError, UciMessage};

use chess::{Board, GameResult, Side, TimeControl, Variant};
use cozy_chess::Move;
use tokio::sync::mpsc;

use crate::events::EventSender;
use crate::player::{Player, PlayerCore, PlayerError, WeakPlayerRef};
use crate::scheduler::Scheduler;

/// Commands sent to the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    NewGame,
    SetPosition { fen: String, moves: Vec<Move> },
    SetOption { name: String, value: Option<String> },
    Go(GoParams),
    Stop,
    Quit,
}

/// Parameters for the "go" command. Times are in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoParams {
    pub wtime: Option<u64>,
    pub btime: Option<u64>,
    pub winc: Option<u64>,
    pub binc: Option<u64>,
    pub movestogo: Option<u32>,
    pub movetime: Option<u64>,
    pub depth: Option<u8>,
    pub infinite: bool,
}

impl GoParams {
    /// Search limits for `side`, given its own clock and, when known, the
    /// opponent's.
    pub fn from_clocks(side: Side, own: &TimeControl, opponent: Option<&TimeControl>) -> Self {
        if own.is_infinite() {
            return Self {
                infinite: true,
                ..Self::default()
            };
        }
        if own.is_per_move() {
            return Self {
                movetime: Some(millis(own.time_per_move())),
                ..Self::default()
            };
        }

        let own_time = Some(millis(own.time_left()));
        let own_inc = Some(millis(own.increment()));
        let opp_time = opponent.map(|tc| millis(tc.time_left()));
        let opp_inc = opponent.map(|tc| millis(tc.increment()));
        let (wtime, btime, winc, binc) = match side {
            Side::White => (own_time, opp_time, own_inc, opp_inc),
            Side::Black => (opp_time, own_time, opp_inc, own_inc),
        };

        Self {
            wtime,
            btime,
            winc,
            binc,
            movestogo: (own.moves_per_tc() > 0).then(|| own.moves_left()),
            ..Self::default()
        }
    }
}

fn millis(ms: i64) -> u64 {
    u64::try_from(ms).unwrap_or(0)
}

/// Events received from the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Ready,
    BestMove(Move),
    /// The engine reported that it has no move to play.
    Resign,
    Info(String),
    Error(String),
}

/// How an engine player presents itself.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub name: String,
    pub variants: Vec<Variant>,
    /// Options sent once, before the first game.
    pub options: Vec<(String, Option<String>)>,
    /// Start out not ready, until the engine reports `uciok`/`readyok`.
    pub wait_for_ready: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name: "Engine".to_string(),
            variants: vec![Variant::Standard],
            options: Vec::new(),
            wait_for_ready: true,
        }
    }
}

/// A [`Player`] whose moves come from a UCI engine.
pub struct EnginePlayer {
    core: PlayerCore,
    board: Board,
    commands: mpsc::Sender<EngineCommand>,
    options: Vec<(String, Option<String>)>,
    thinking: bool,
}

impl EnginePlayer {
    pub fn new(
        config: EngineConfig,
        commands: mpsc::Sender<EngineCommand>,
        events: EventSender,
        scheduler: Box<dyn Scheduler>,
    ) -> Self {
        let mut core = PlayerCore::new(config.name, events, scheduler);
        core.set_supported_variants(config.variants);
        core.set_ready(!config.wait_for_ready);
        Self {
            core,
            board: Board::default(),
            commands,
            options: config.options,
            thinking: false,
        }
    }

    /// The engine's view of the game.
    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn is_thinking(&self) -> bool {
        self.thinking
    }

    /// Play the following games in `variant`.
    pub fn set_variant(&mut self, variant: Variant) {
        self.board.set_variant(variant);
    }

    /// Start the next game from `fen` instead of the variant's start.
    /// Must be called after [`Player::new_game`].
    pub fn set_start_position(&mut self, fen: &str) -> Result<(), PlayerError> {
        self.board.set_board(fen)?;
        Ok(())
    }

    /// Feed one line of engine output.
    pub fn handle_uci_line(&mut self, line: &str) -> Result<(), PlayerError> {
        let line = line.trim();
        tracing::trace!(player = %self.core.name(), "UCI << {}", line);

        let event = match parse_uci_message(line) {
            Ok(UciMessage::UciOk) | Ok(UciMessage::ReadyOk) => EngineEvent::Ready,
            Ok(UciMessage::BestMove { mv: Some(mv), .. }) => EngineEvent::BestMove(mv),
            Ok(UciMessage::BestMove { mv: None, .. }) => EngineEvent::Resign,
            Ok(UciMessage::Info(info)) => EngineEvent::Info(info),
            Ok(UciMessage::Id { name, value }) => {
                tracing::debug!(player = %self.core.name(), "Engine id {}: {}", name, value);
                return Ok(());
            }
            Err(UciError::UnknownMessage(_)) => {
                tracing::trace!("Ignoring UCI message: {}", line);
                return Ok(());
            }
            Err(e) => EngineEvent::Error(e.to_string()),
        };
        self.handle_event(event)
    }

    pub fn handle_event(&mut self, event: EngineEvent) -> Result<(), PlayerError> {
        match event {
            EngineEvent::Ready => {
                if !self.core.is_ready() {
                    tracing::info!(player = %self.core.name(), "Engine ready");
                    self.core.emit_ready();
                }
            }
            EngineEvent::BestMove(mv) => {
                if !self.thinking {
                    tracing::debug!(
                        player = %self.core.name(),
                        mv = %chess::format_uci_move(mv),
                        "Ignoring bestmove while not thinking"
                    );
                    return Ok(());
                }
                self.thinking = false;
                self.play_best_move(mv)?;
            }
            EngineEvent::Resign => {
                self.thinking = false;
                self.core.emit_resign();
            }
            EngineEvent::Info(info) => self.core.emit_debug(info),
            EngineEvent::Error(message) => {
                tracing::warn!(player = %self.core.name(), "Engine error: {}", message);
                self.core.emit_debug(message);
            }
        }
        Ok(())
    }

    /// Ask the engine to shut down.
    pub fn quit(&mut self) -> Result<(), PlayerError> {
        self.thinking = false;
        self.send(EngineCommand::Quit)
    }

    fn play_best_move(&mut self, mv: Move) -> Result<(), PlayerError> {
        let mv = if self.board.is_random_variant() {
            mv
        } else {
            chess::convert_uci_castling_to_cozy(mv, &self.board.legal_moves())
        };

        if !self.board.is_legal_move(mv) {
            let text = chess::format_uci_move(mv);
            tracing::warn!(player = %self.core.name(), mv = %text, "Engine played an illegal move");
            self.core.emit_debug(format!("Illegal move from engine: {}", text));
            self.core.emit_resign();
            return Ok(());
        }

        self.board.make_move(mv)?;
        self.core.emit_move(mv);
        Ok(())
    }

    /// The game so far in the notation engines expect: castling as a
    /// two-square king move, except in random variants.
    fn uci_history(&self) -> Result<Vec<Move>, PlayerError> {
        let history = self.board.move_history();
        if self.board.is_random_variant() {
            return Ok(history.to_vec());
        }

        let mut position = chess::fen::parse_fen(self.board.starting_fen())?;
        let mut moves = Vec::with_capacity(history.len());
        for &mv in history {
            moves.push(chess::convert_cozy_castling_to_uci(&position, mv));
            position.play_unchecked(mv);
        }
        Ok(moves)
    }

    fn opponent_clock(&self) -> Option<TimeControl> {
        let opponent = self.core.opponent()?;
        let opponent = opponent.try_borrow().ok()?;
        Some(opponent.time_control().clone())
    }

    fn send(&self, command: EngineCommand) -> Result<(), PlayerError> {
        tracing::trace!(player = %self.core.name(), "UCI >> {}", command.to_uci());
        self.commands.try_send(command).map_err(|e| {
            let err = match e {
                mpsc::error::TrySendError::Full(_) => PlayerError::QueueFull,
                mpsc::error::TrySendError::Closed(_) => PlayerError::ChannelClosed,
            };
            tracing::error!(player = %self.core.name(), "Failed to send engine command: {}", err);
            self.core.emit_debug(err.to_string());
            err
        })
    }
}

impl Player for EnginePlayer {
    fn core(&self) -> &PlayerCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut PlayerCore {
        &mut self.core
    }

    fn is_human(&self) -> bool {
        false
    }

    fn make_move(&mut self, mv: Move) -> Result<(), PlayerError> {
        self.board.make_move(mv)?;
        Ok(())
    }

    fn new_game(&mut self, side: Side, opponent: WeakPlayerRef) -> Result<(), PlayerError> {
        self.core.new_game(side, opponent);
        self.thinking = false;
        self.board.set_variant(self.board.variant());

        for (name, value) in std::mem::take(&mut self.options) {
            self.send(EngineCommand::SetOption { name, value })?;
        }
        self.send(EngineCommand::NewGame)
    }

    fn end_game(&mut self, result: GameResult) -> Result<(), PlayerError> {
        self.core.end_game(result);
        if self.thinking {
            self.thinking = false;
            self.send(EngineCommand::Stop)?;
        }
        Ok(())
    }

    fn go(&mut self) -> Result<(), PlayerError> {
        self.core.go();
        self.thinking = true;

        let side = self.core.side().unwrap_or_else(|| self.board.side_to_move());
        let opponent = self.opponent_clock();
        let params = GoParams::from_clocks(side, self.core.time_control(), opponent.as_ref());

        let sent = self.uci_history().and_then(|moves| {
            self.send(EngineCommand::SetPosition {
                fen: self.board.starting_fen().to_string(),
                moves,
            })?;
            self.send(EngineCommand::Go(params))
        });
        if sent.is_err() {
            // The engine will never answer, so it must not flag either
            self.thinking = false;
            self.core.cancel_timer();
        }
        sent
    }
}
