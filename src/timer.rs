//! Per-turn countdown.
//!
//! [`TurnTimer`] runs at most one countdown at a time. Starting a countdown
//! always cancels the previous one first. When the countdown reaches zero the
//! timeout future is spawned exactly once and the countdown ends; the timeout
//! future itself is responsible for checking whether its turn is still current.

use std::future::Future;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::debug;

use crate::settings::PlaySettings;

const TICK: Duration = Duration::from_secs(1);

type TickObserver = Box<dyn Fn(u32) + Send + Sync>;

struct Active {
    id: u64,
    task: JoinHandle<()>,
}

struct Shared {
    settings: PlaySettings,
    remaining: AtomicU32,
    next_id: AtomicU64,
    active: Mutex<Option<Active>>,
    on_tick: Option<TickObserver>,
}

impl Shared {
    fn active(&self) -> MutexGuard<'_, Option<Active>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn show(&self, remaining: u32) {
        self.remaining.store(remaining, Ordering::Release);
        if let Some(observer) = &self.on_tick {
            observer(remaining);
        }
    }

    fn cancel(&self, id: Option<u64>) -> bool {
        let mut slot = self.active();
        match slot.as_ref() {
            Some(active) if id.is_none_or(|id| id == active.id) => {
                if let Some(active) = slot.take() {
                    active.task.abort();
                    debug!(timer = active.id, "turn timer cancelled");
                }
                true
            }
            _ => false,
        }
    }
}

/// Single-instance turn countdown with a one-second cadence.
pub struct TurnTimer {
    shared: Arc<Shared>,
}

impl TurnTimer {
    /// Create a timer reading its configured duration from `settings`.
    pub fn new(settings: PlaySettings) -> Self {
        Self::build(settings, None)
    }

    /// Create a timer that reports every displayed value to `on_tick`.
    pub fn with_observer(settings: PlaySettings, on_tick: impl Fn(u32) + Send + Sync + 'static) -> Self {
        Self::build(settings, Some(Box::new(on_tick)))
    }

    fn build(settings: PlaySettings, on_tick: Option<TickObserver>) -> Self {
        let remaining = AtomicU32::new(settings.turn_seconds());
        Self {
            shared: Arc::new(Shared {
                settings,
                remaining,
                next_id: AtomicU64::new(1),
                active: Mutex::new(None),
                on_tick,
            }),
        }
    }

    /// Start a countdown of the currently configured duration.
    pub fn start<F>(&self, on_timeout: F) -> TimerHandle
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let seconds = self.shared.settings.turn_seconds();
        self.start_for(seconds, on_timeout)
    }

    /// Start a countdown of `seconds`, cancelling any running one.
    ///
    /// `on_timeout` is spawned once, when the remaining time reaches zero. It
    /// is not polled at all if the countdown is stopped first.
    pub fn start_for<F>(&self, seconds: u32, on_timeout: F) -> TimerHandle
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut slot = self.shared.active();
        if let Some(previous) = slot.take() {
            previous.task.abort();
        }

        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        self.shared.show(seconds);

        let shared = Arc::clone(&self.shared);
        let task = tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + TICK, TICK);
            let mut remaining = seconds;
            loop {
                ticks.tick().await;
                remaining = remaining.saturating_sub(1);
                shared.show(remaining);
                if remaining == 0 {
                    break;
                }
            }
            {
                let mut slot = shared.active();
                if slot.as_ref().is_some_and(|a| a.id == id) {
                    slot.take();
                }
            }
            debug!(timer = id, "turn timer expired");
            tokio::spawn(on_timeout);
        });

        *slot = Some(Active { id, task });
        debug!(timer = id, seconds, "turn timer started");
        TimerHandle {
            id,
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// Cancel the running countdown, if any. With `reset_display`, the
    /// displayed remaining time returns to the configured duration without
    /// restarting the countdown.
    pub fn stop(&self, reset_display: bool) {
        self.shared.cancel(None);
        if reset_display {
            self.shared.show(self.shared.settings.turn_seconds());
        }
    }

    /// Returns `true` while a countdown is running.
    pub fn is_running(&self) -> bool {
        self.shared.active().is_some()
    }

    /// The remaining seconds currently displayed.
    pub fn remaining(&self) -> u32 {
        self.shared.remaining.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for TurnTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnTimer")
            .field("running", &self.is_running())
            .field("remaining", &self.remaining())
            .finish()
    }
}

impl Drop for TurnTimer {
    fn drop(&mut self) {
        self.shared.cancel(None);
    }
}

/// Handle to one countdown started by [`TurnTimer::start`].
///
/// Cancelling is idempotent and only affects the countdown this handle was
/// returned for; a later countdown started on the same timer is untouched.
#[derive(Debug, Clone)]
pub struct TimerHandle {
    id: u64,
    shared: std::sync::Weak<Shared>,
}

impl TimerHandle {
    /// Cancel this countdown. Returns `true` if it was still running.
    pub fn cancel(&self) -> bool {
        self.shared
            .upgrade()
            .is_some_and(|shared| shared.cancel(Some(self.id)))
    }
}
