//! Epoch manager: generation counter, current session and cancellation scope.
//!
//! Every asynchronous operation captures a [`Snapshot`] before its first
//! suspension point and re-validates it with [`EpochManager::is_current`]
//! after every resumption. A bump invalidates all outstanding snapshots and
//! cancels the shared [`CancellationToken`], so in-flight calls raced against
//! [`EpochManager::scope`] are dropped and their results never applied.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::protocol::SessionId;

/// The `(epoch, session)` pair captured at the start of an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub epoch: u64,
    pub session: Option<SessionId>,
}

impl Snapshot {
    /// The captured session identifier.
    pub fn session(&self) -> Option<&str> {
        self.session.as_deref()
    }
}

#[derive(Debug)]
struct EpochState {
    epoch: u64,
    session: Option<SessionId>,
    scope: CancellationToken,
}

/// Owns the epoch counter, the current session identifier and the
/// cancellation scope shared by every request of the current epoch.
#[derive(Debug)]
pub struct EpochManager {
    state: Mutex<EpochState>,
}

impl EpochManager {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(EpochState {
                epoch: 0,
                session: None,
                scope: CancellationToken::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, EpochState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cancels the current scope, installs a fresh one and increments the
    /// epoch. Returns the new epoch.
    pub fn bump_and_cancel_all(&self) -> u64 {
        let mut state = self.lock();
        state.scope.cancel();
        state.scope = CancellationToken::new();
        state.epoch += 1;
        debug!(epoch = state.epoch, "epoch bumped, outstanding requests cancelled");
        state.epoch
    }

    /// Captures `(epoch, session)` atomically.
    pub fn snapshot(&self) -> Snapshot {
        let state = self.lock();
        Snapshot {
            epoch: state.epoch,
            session: state.session.clone(),
        }
    }

    /// Returns `true` if neither the epoch nor the session changed since
    /// `snapshot` was taken.
    pub fn is_current(&self, snapshot: &Snapshot) -> bool {
        let state = self.lock();
        state.epoch == snapshot.epoch && state.session == snapshot.session
    }

    /// The current epoch.
    pub fn epoch(&self) -> u64 {
        self.lock().epoch
    }

    /// The current session identifier.
    pub fn session(&self) -> Option<SessionId> {
        self.lock().session.clone()
    }

    /// Replaces the current session. Returns the previous one.
    pub fn replace_session(&self, session: Option<SessionId>) -> Option<SessionId> {
        std::mem::replace(&mut self.lock().session, session)
    }

    /// Installs `session` only if the epoch is still `epoch`.
    ///
    /// Used by session creation that raced with a bump: a session created for
    /// an abandoned epoch must not become current.
    pub fn install_session_if(&self, epoch: u64, session: SessionId) -> bool {
        let mut state = self.lock();
        if state.epoch != epoch {
            return false;
        }
        state.session = Some(session);
        true
    }

    /// The cancellation scope of the current epoch.
    pub fn scope(&self) -> CancellationToken {
        self.lock().scope.clone()
    }
}

impl Default for EpochManager {
    fn default() -> Self {
        Self::new()
    }
}
