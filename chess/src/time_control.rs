//! Chess clock bookkeeping.
//!
//! [`TimeControl`] only does the accounting: it is told when a move starts
//! and when it arrives, and works out what is left. Firing a timer when the
//! time runs out is up to the owner.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Instant;

/// A time control and the state of one player's clock under it.
///
/// All times are in milliseconds. A live clock has either a time budget per
/// control (`time_per_tc`) or a fixed time per move (`time_per_move`); with
/// neither the clock is infinite and never expires.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeControl {
    time_per_tc: i64,
    /// Moves per control; 0 means the budget covers the whole game.
    moves_per_tc: u32,
    time_per_move: i64,
    increment: i64,
    #[serde(skip)]
    time_left: i64,
    #[serde(skip)]
    moves_left: u32,
    #[serde(skip)]
    last_move_time: i64,
    #[serde(skip)]
    expired: bool,
    #[serde(skip)]
    started_at: Option<Instant>,
}

impl TimeControl {
    /// A clock with `time_per_tc` ms for the whole game.
    pub fn new(time_per_tc: i64) -> Self {
        let mut tc = Self {
            time_per_tc: time_per_tc.max(0),
            ..Self::default()
        };
        tc.reset();
        tc
    }

    /// A clock giving each move `time_per_move` ms.
    pub fn per_move(time_per_move: i64) -> Self {
        Self::default().with_time_per_move(time_per_move)
    }

    /// A clock that never runs out.
    pub fn infinite() -> Self {
        Self::default()
    }

    pub fn with_moves_per_tc(mut self, moves: u32) -> Self {
        self.moves_per_tc = moves;
        self.reset();
        self
    }

    pub fn with_increment(mut self, increment: i64) -> Self {
        self.increment = increment.max(0);
        self
    }

    /// Switch to a fixed time per move. The per-control budget is dropped.
    pub fn with_time_per_move(mut self, time_per_move: i64) -> Self {
        self.time_per_move = time_per_move.max(0);
        self.time_per_tc = 0;
        self.moves_per_tc = 0;
        self.reset();
        self
    }

    /// Refill the clock to the configured budget, as at the start of a game.
    pub fn reset(&mut self) {
        self.time_left = self.time_per_tc;
        self.moves_left = self.moves_per_tc;
        self.last_move_time = 0;
        self.expired = false;
        self.started_at = None;
    }

    pub fn time_per_tc(&self) -> i64 {
        self.time_per_tc
    }

    pub fn moves_per_tc(&self) -> u32 {
        self.moves_per_tc
    }

    pub fn time_per_move(&self) -> i64 {
        self.time_per_move
    }

    pub fn increment(&self) -> i64 {
        self.increment
    }

    /// Time left on the clock. Negative once the player overstepped it.
    pub fn time_left(&self) -> i64 {
        self.time_left
    }

    pub fn set_time_left(&mut self, time_left: i64) {
        self.time_left = time_left;
    }

    /// Moves left until the next control, 0 when the budget covers the
    /// whole game.
    pub fn moves_left(&self) -> u32 {
        self.moves_left
    }

    pub fn set_moves_left(&mut self, moves_left: u32) {
        self.moves_left = moves_left;
    }

    /// Time used by the last completed move.
    pub fn last_move_time(&self) -> i64 {
        self.last_move_time
    }

    pub fn is_infinite(&self) -> bool {
        self.time_per_tc == 0 && self.time_per_move == 0
    }

    pub fn is_per_move(&self) -> bool {
        self.time_per_tc == 0 && self.time_per_move > 0
    }

    /// Whether the last completed move used up all the time it had.
    pub fn is_expired(&self) -> bool {
        self.expired
    }

    /// Whether a move is being timed.
    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Time the player may think about the next move before flagging.
    pub fn move_budget(&self) -> i64 {
        if self.time_per_tc > 0 {
            self.time_left
        } else {
            self.time_per_move
        }
    }

    pub fn start_timer(&mut self) {
        self.start_timer_at(Instant::now());
    }

    /// Start timing a move at `now`.
    pub fn start_timer_at(&mut self, now: Instant) {
        if self.is_per_move() {
            self.time_left = self.time_per_move;
        }
        self.expired = false;
        self.started_at = Some(now);
    }

    pub fn update(&mut self) {
        self.update_at(Instant::now());
    }

    /// Charge the move that started at the last `start_timer_at` and ended
    /// at `now`.
    ///
    /// In a budgeted control the increment is added after the move, and
    /// completing the last move of a control adds the next control's time.
    /// A fixed time per move gets no increment.
    pub fn update_at(&mut self, now: Instant) {
        let elapsed = self
            .started_at
            .take()
            .map(|start| now.saturating_duration_since(start).as_millis())
            .map_or(0, |ms| i64::try_from(ms).unwrap_or(i64::MAX));
        self.last_move_time = elapsed;

        if self.is_infinite() {
            return;
        }

        self.time_left -= elapsed;
        self.expired = self.time_left <= 0;
        if self.is_per_move() {
            return;
        }

        self.time_left += self.increment;
        if self.moves_per_tc > 0 {
            self.moves_left = self.moves_left.saturating_sub(1);
            if self.moves_left == 0 {
                self.moves_left = self.moves_per_tc;
                self.time_left += self.time_per_tc;
            }
        }
    }
}

/// Parses `[moves/]seconds[+increment]` (`40/60+1`, `0/300`, `300+2`),
/// `st=seconds` for a fixed time per move, and `inf`.
impl FromStr for TimeControl {
    type Err = TimeControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("inf") || s.eq_ignore_ascii_case("infinite") {
            return Ok(Self::infinite());
        }
        if let Some(secs) = s.strip_prefix("st=") {
            return Ok(Self::per_move(parse_seconds(secs)?));
        }

        let (moves, rest) = match s.split_once('/') {
            Some((moves, rest)) => {
                let moves = moves
                    .parse::<u32>()
                    .map_err(|_| TimeControlError::InvalidNumber(moves.to_string()))?;
                (moves, rest)
            }
            None => (0, s),
        };
        let (time, increment) = match rest.split_once('+') {
            Some((time, inc)) => (parse_seconds(time)?, parse_seconds(inc)?),
            None => (parse_seconds(rest)?, 0),
        };
        if time == 0 {
            return Err(TimeControlError::InvalidFormat(s.to_string()));
        }

        Ok(Self::new(time)
            .with_moves_per_tc(moves)
            .with_increment(increment))
    }
}

impl std::fmt::Display for TimeControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_infinite() {
            return f.write_str("inf");
        }
        if self.is_per_move() {
            return write!(f, "st={}", format_seconds(self.time_per_move));
        }
        if self.moves_per_tc > 0 {
            write!(f, "{}/", self.moves_per_tc)?;
        }
        f.write_str(&format_seconds(self.time_per_tc))?;
        if self.increment > 0 {
            write!(f, "+{}", format_seconds(self.increment))?;
        }
        Ok(())
    }
}

fn parse_seconds(text: &str) -> Result<i64, TimeControlError> {
    let secs: f64 = text
        .trim()
        .parse()
        .map_err(|_| TimeControlError::InvalidNumber(text.to_string()))?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(TimeControlError::InvalidNumber(text.to_string()));
    }
    Ok((secs * 1000.0).round() as i64)
}

fn format_seconds(ms: i64) -> String {
    if ms % 1000 == 0 {
        (ms / 1000).to_string()
    } else {
        let secs = format!("{:.3}", ms as f64 / 1000.0);
        secs.trim_end_matches('0').to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeControlError {
    #[error("Invalid time control: {0}")]
    InvalidFormat(String),
    #[error("Invalid number in time control: {0}")]
    InvalidNumber(String),
}
