//! Single-shot timers for player clocks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

pub type TimerCallback = Box<dyn FnOnce() + Send>;

/// A clock plus one single-shot timer.
///
/// Arming a new timer replaces any pending one. Once the timer has fired or
/// been cancelled it is inactive until armed again.
pub trait Scheduler: Send {
    fn now(&self) -> Instant;

    fn arm(&mut self, after: Duration, on_fire: TimerCallback);

    /// Stop the pending timer. Returns `true` if a timer was pending, i.e.
    /// the callback has not run and now never will.
    fn cancel(&mut self) -> bool;

    fn is_active(&self) -> bool;
}

/// Timer backed by a sleeping Tokio task.
///
/// Must be armed from within a Tokio runtime.
#[derive(Default)]
pub struct TokioScheduler {
    pending: Option<(JoinHandle<()>, Arc<AtomicBool>)>,
}

impl TokioScheduler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scheduler for TokioScheduler {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }

    fn arm(&mut self, after: Duration, on_fire: TimerCallback) {
        self.cancel();

        let armed = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&armed);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            // Whoever clears the flag first wins against cancel()
            if flag.swap(false, Ordering::SeqCst) {
                on_fire();
            }
        });
        self.pending = Some((handle, armed));
    }

    fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some((handle, armed)) => {
                let was_pending = armed.swap(false, Ordering::SeqCst);
                handle.abort();
                was_pending
            }
            None => false,
        }
    }

    fn is_active(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|(_, armed)| armed.load(Ordering::SeqCst))
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// A scheduler driven by hand, for tests and simulations.
///
/// Clones share the same clock and timer, so a test can keep one clone and
/// hand another to a player.
#[derive(Clone)]
pub struct ManualScheduler {
    inner: Arc<Mutex<ManualState>>,
}

struct ManualState {
    now: Instant,
    deadline: Option<Instant>,
    on_fire: Option<TimerCallback>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ManualState {
                now: Instant::now(),
                deadline: None,
                on_fire: None,
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, ManualState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move the clock forward, firing the timer if its deadline is reached.
    pub fn advance(&self, by: Duration) {
        let callback = {
            let mut state = self.state();
            state.now += by;
            match state.deadline {
                Some(deadline) if deadline <= state.now => {
                    state.deadline = None;
                    state.on_fire.take()
                }
                _ => None,
            }
        };
        if let Some(on_fire) = callback {
            on_fire();
        }
    }

    /// Move the clock forward without firing anything, as if the timer
    /// woke up late.
    pub fn skip(&self, by: Duration) {
        self.state().now += by;
    }
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for ManualScheduler {
    fn now(&self) -> Instant {
        self.state().now
    }

    fn arm(&mut self, after: Duration, on_fire: TimerCallback) {
        let mut state = self.state();
        state.deadline = Some(state.now + after);
        state.on_fire = Some(on_fire);
    }

    fn cancel(&mut self) -> bool {
        let mut state = self.state();
        state.deadline = None;
        state.on_fire.take().is_some()
    }

    fn is_active(&self) -> bool {
        self.state().on_fire.is_some()
    }
}
