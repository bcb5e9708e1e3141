//! Server-driven auto-play.
//!
//! A toggle starts or stops a loop that repeatedly asks the service to
//! advance the game by one move, pausing for the configured delay between
//! moves. The loop is bound to the epoch it started in: a reset, a new game
//! or shutdown makes it exit at its next check without touching visible
//! state.
//!
//! Three flags describe the loop:
//!
//! - [`AutoState`]: what the operator asked for;
//! - the *playing* flag: the loop task is alive;
//! - the *loop busy* latch: at most one loop task exists at a time.

use std::sync::atomic::Ordering;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::classifier::{resolve_mover, Outcome};
use crate::controller::{lock, ApplyOptions, GameController};
use crate::epoch::Snapshot;
use crate::error::{CubeFourError, Result};
use crate::event::MoveLogEntry;
use crate::protocol::AutoStepRequest;
use crate::service::GameService;

/// Operator-level auto-play state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutoState {
    #[default]
    Idle,
    Running,
    /// Stop was requested; the loop exits at its next check.
    StopRequested,
}

/// Result of [`GameController::toggle_auto_play`].
#[derive(Debug)]
pub enum AutoToggle {
    /// A loop was started. The handle resolves when it exits.
    Started(JoinHandle<Result<AutoExit>>),
    /// The running loop was asked to stop.
    Stopping,
    /// Ignored: inside the toggle cooldown, or a previous loop is still
    /// winding down.
    Ignored,
}

/// Why an auto-play loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutoExit {
    /// The game reached a terminal outcome.
    GameOver(Outcome),
    /// The operator stopped it.
    Stopped,
    /// A reset, next game or shutdown superseded it.
    Stale,
}

impl<S: GameService> GameController<S> {
    /// Start auto-play if it is idle, stop it if it is running.
    ///
    /// Toggles closer together than
    /// [`ControllerConfig::auto_toggle_cooldown`](crate::ControllerConfig::auto_toggle_cooldown)
    /// are ignored.
    pub fn toggle_auto_play(&self) -> AutoToggle {
        let now = Instant::now();
        {
            let mut until = lock(&self.inner.auto_cooldown_until);
            if until.is_some_and(|until| now < until) {
                debug!("auto-play toggle inside cooldown, ignored");
                return AutoToggle::Ignored;
            }
            *until = Some(now + self.inner.config.auto_toggle_cooldown);
        }

        {
            let mut state = lock(&self.inner.auto_state);
            if *state == AutoState::Running {
                *state = AutoState::StopRequested;
                drop(state);
                info!("auto-play stop requested");
                self.inner.timer.stop(false);
                self.set_auto_visible(false);
                self.set_status("Auto-play stopped");
                return AutoToggle::Stopping;
            }
        }

        if self.is_game_over() {
            debug!("game is over, auto-play not started");
            return AutoToggle::Ignored;
        }
        if self.inner.auto_loop_busy.swap(true, Ordering::AcqRel) {
            debug!("previous auto-play loop still running, toggle ignored");
            return AutoToggle::Ignored;
        }
        *lock(&self.inner.auto_state) = AutoState::Running;
        self.inner.auto_playing.store(true, Ordering::Release);
        self.set_auto_visible(true);

        let me = self.clone();
        AutoToggle::Started(tokio::spawn(async move { me.run_auto_loop().await }))
    }

    /// The operator-level auto-play state.
    pub fn auto_state(&self) -> AutoState {
        *lock(&self.inner.auto_state)
    }

    /// Returns `true` while an auto-play loop task is alive.
    pub fn is_auto_playing(&self) -> bool {
        self.inner.auto_playing.load(Ordering::Acquire)
    }

    /// Auto-play was requested or its loop has not yet exited.
    pub(crate) fn auto_alive(&self) -> bool {
        self.auto_state() != AutoState::Idle || self.is_auto_playing()
    }

    /// Forces auto-play to idle without waiting for the loop. The loop sees
    /// its epoch has moved on and exits on its own.
    pub(crate) fn force_auto_idle(&self) {
        let was = std::mem::take(&mut *lock(&self.inner.auto_state));
        self.inner.auto_playing.store(false, Ordering::Release);
        if was != AutoState::Idle {
            self.set_auto_visible(false);
        }
    }

    async fn run_auto_loop(&self) -> Result<AutoExit> {
        let entry_epoch = self.inner.epochs.epoch();
        let result = match self.auto_loop_body().await {
            Ok(exit) => Ok(exit),
            Err(e) if e.is_cancellation() => Ok(AutoExit::Stale),
            Err(e) if e.is_configuration() => {
                self.set_status(format!("Cannot start auto-play: {e}"));
                self.notice("Select an algorithm for both sides");
                Err(e)
            }
            Err(e) => {
                warn!(error = %e, "auto-play failed");
                self.set_status(format!("Auto-play error: {e}"));
                self.notice(format!("Auto-play error: {e}"));
                Err(e)
            }
        };

        // A newer epoch owns the timer and the flags now.
        if self.inner.epochs.epoch() == entry_epoch {
            self.inner.timer.stop(false);
            let was = std::mem::take(&mut *lock(&self.inner.auto_state));
            self.inner.auto_playing.store(false, Ordering::Release);
            if was == AutoState::Running || self.visible().auto_play_running {
                self.set_auto_visible(false);
            }
        }
        self.inner.auto_loop_busy.store(false, Ordering::Release);
        debug!(?result, "auto-play loop exited");
        result
    }

    async fn auto_loop_body(&self) -> Result<AutoExit> {
        self.ensure_session().await?;
        self.inner.timer.stop(false);
        let paths = self.lineup().algorithm_paths()?;

        let snap = self.inner.epochs.snapshot();
        let session = snap.session.clone().ok_or(CubeFourError::NoSession)?;
        info!(session = %session, "auto-play started");

        let state = self
            .call(&snap, self.inner.service.fetch_state(&session))
            .await?;
        if !self.inner.epochs.is_current(&snap) {
            return Ok(AutoExit::Stale);
        }
        let to_move = state.current_side();
        self.show_board(state.board, state.winning_coords.unwrap_or_default());
        if let Some(side) = to_move {
            self.set_status(format!("{side}'s turn"));
        }

        loop {
            if let Some(exit) = self.auto_should_exit(&snap) {
                return Ok(exit);
            }
            let delay = self.inner.settings.auto_delay();
            if !delay.is_zero() {
                let scope = self.inner.epochs.scope();
                tokio::select! {
                    biased;
                    () = scope.cancelled() => return Ok(AutoExit::Stale),
                    () = tokio::time::sleep(delay) => {}
                }
                if let Some(exit) = self.auto_should_exit(&snap) {
                    return Ok(exit);
                }
            }

            // The countdown is display-only here: the service enforces the
            // time limit itself.
            self.inner.timer.start(async {});
            let request = AutoStepRequest {
                player1: paths.side_one.clone(),
                player2: paths.side_two.clone(),
                time_limit: self.inner.settings.turn_seconds(),
            };
            let response = self
                .call(&snap, self.inner.service.advance_one_move(&session, request))
                .await;
            if !self.inner.epochs.is_current(&snap) {
                return Ok(AutoExit::Stale);
            }
            self.inner.timer.stop(false);
            let response = response?;

            if let Some(mover) = resolve_mover(&response) {
                self.log_move(MoveLogEntry {
                    move_count: response.move_count,
                    team: self.lineup().label(mover),
                    side: mover,
                    column: response.last_move,
                    reason: response.reason_text().map(str::to_owned),
                });
            }
            let outcome = self.apply_response(
                &response,
                ApplyOptions {
                    suppress_log: true,
                    ..Default::default()
                },
            );
            if outcome.is_terminal() {
                info!(?outcome, "auto-play reached the end of the game");
                return Ok(AutoExit::GameOver(outcome));
            }
        }
    }

    fn auto_should_exit(&self, snap: &Snapshot) -> Option<AutoExit> {
        if !self.inner.epochs.is_current(snap) {
            return Some(AutoExit::Stale);
        }
        if self.auto_state() != AutoState::Running {
            return Some(AutoExit::Stopped);
        }
        None
    }
}
