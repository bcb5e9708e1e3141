//! Input gate: debounce plus single-flight for user-initiated actions.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

/// Debounces and single-flights manual inputs (board clicks, the step button).
///
/// An input is accepted only when no gated operation is running and at least
/// `gap` has elapsed since the previous acceptance. Server-driven auto-play
/// does not pass through the gate.
#[derive(Debug)]
pub struct InputGate {
    gap: Duration,
    busy: AtomicBool,
    last_accepted: Mutex<Option<Instant>>,
}

impl InputGate {
    pub fn new(gap: Duration) -> Self {
        Self {
            gap,
            busy: AtomicBool::new(false),
            last_accepted: Mutex::new(None),
        }
    }

    /// Decides synchronously whether an input may proceed, recording the
    /// acceptance time when it may.
    pub fn try_enter(&self) -> bool {
        if self.is_busy() {
            return false;
        }
        let now = Instant::now();
        let mut last = self
            .last_accepted
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(prev) = *last {
            if now.duration_since(prev) < self.gap {
                return false;
            }
        }
        *last = Some(now);
        true
    }

    /// Sets or clears the busy flag.
    pub fn set_busy(&self, busy: bool) {
        self.busy.store(busy, Ordering::Release);
    }

    /// Returns `true` while a gated operation is executing.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// [`try_enter`](Self::try_enter) and, on success, mark the gate busy
    /// until the returned guard is dropped. The guard releases the flag on
    /// every exit path, including early returns and `?`.
    pub fn enter(&self) -> Option<BusyGuard<'_>> {
        if !self.try_enter() {
            return None;
        }
        // A competing enter may have won between the check and here.
        if self.busy.swap(true, Ordering::AcqRel) {
            return None;
        }
        Some(BusyGuard { gate: self })
    }
}

/// Clears the gate's busy flag on drop.
#[derive(Debug)]
pub struct BusyGuard<'a> {
    gate: &'a InputGate,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.gate.set_busy(false);
    }
}
