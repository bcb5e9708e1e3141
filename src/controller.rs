//! Session controller.
//!
//! [`GameController`] keeps one visible game session consistent while user
//! clicks, the step button, turn timeouts, auto-play and resets overlap on a
//! cooperative scheduler. It is a cheap-to-clone handle; every clone drives
//! the same session.
//!
//! Three identities guard every write to visible state:
//!
//! - the **epoch** and **session** captured in a [`Snapshot`] before the
//!   first suspension point, re-validated after every resumption;
//! - the **step token**, advanced whenever a step or timeout fallback
//!   finishes or is superseded;
//! - the **move flight** flag, which admits at most one move submission at
//!   a time.
//!
//! A response is applied only when all three still agree; otherwise it is
//! observed and discarded.
//!
//! # Example
//!
//! ```rust,ignore
//! let service = HttpGameService::new("http://localhost:8001");
//! let (controller, mut events) =
//!     GameController::new(service, ControllerConfig::new(), PlaySettings::default());
//! controller.set_lineup(Lineup::new(Some(alpha), Some(beta), Seat::Ai1));
//! controller.resume_or_start(None).await?;
//! controller.submit_step().await?;
//!
//! while let Some(event) = events.recv().await {
//!     match event {
//!         GameEvent::BoardUpdated { board, .. } => { /* redraw */ }
//!         GameEvent::Status(text) => { /* status line */ }
//!         _ => {}
//!     }
//! }
//! ```

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::autoplay::AutoState;
use crate::board::{Board, Column, Coord, Side};
use crate::classifier::{classify, resolve_mover, Outcome};
use crate::epoch::{EpochManager, Snapshot};
use crate::error::{CubeFourError, Result};
use crate::event::{GameEvent, LogLine, MoveLogEntry, VisibleState};
use crate::gate::InputGate;
use crate::lineup::Lineup;
use crate::protocol::{AlgoMoveRequest, GameState, MoveResponse, ResponseStatus, SessionId};
use crate::series::{MatchResult, MatchSeries, SeriesProgress, DRAW_LABEL};
use crate::service::GameService;
use crate::settings::{ControllerConfig, PlaySettings};
use crate::timer::TurnTimer;

// ── Results ─────────────────────────────────────────────────────────

/// What happened to a move submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// The response was current and has been applied.
    Applied(Outcome),
    /// The epoch, session or step moved on; the response was discarded.
    Stale,
    /// Refused up front: input gate closed, auto-play alive, or another move
    /// already in flight.
    Rejected,
    /// There was no open column to play.
    NoOpenColumn,
}

/// What happened to a single AI step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepReport {
    /// The move was played and its result applied.
    Played {
        column: Column,
        /// Set when the suggestion was replaced by the fallback column.
        substituted: bool,
        outcome: Outcome,
    },
    /// The service rejected the move; nothing was logged.
    Invalid,
    /// The board has no open column.
    BoardFull,
    /// Superseded by a reset or by the turn timeout's fallback move.
    Stale,
    /// Refused up front.
    Rejected,
}

/// How [`GameController::apply_response`] should treat a response.
#[derive(Debug, Clone, Default)]
pub(crate) struct ApplyOptions {
    /// The caller has already logged the move.
    pub suppress_log: bool,
    /// Start a new turn countdown when the game continues.
    pub restart_timer_on_ok: bool,
    /// Reason attached to the log line, taking precedence over the response's.
    pub reason: Option<String>,
}

// ── Shared state ────────────────────────────────────────────────────

pub(crate) struct Inner<S> {
    pub(crate) service: S,
    pub(crate) config: ControllerConfig,
    pub(crate) settings: PlaySettings,
    pub(crate) epochs: EpochManager,
    pub(crate) gate: InputGate,
    pub(crate) timer: TurnTimer,
    pub(crate) step_token: AtomicU64,
    move_in_flight: AtomicBool,
    game_over: AtomicBool,
    lineup: Mutex<Lineup>,
    series: Mutex<MatchSeries>,
    visible: Mutex<VisibleState>,
    pub(crate) auto_state: Mutex<AutoState>,
    pub(crate) auto_playing: AtomicBool,
    pub(crate) auto_loop_busy: AtomicBool,
    pub(crate) auto_cooldown_until: Mutex<Option<Instant>>,
    events: mpsc::Sender<GameEvent>,
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clears the move-flight flag on drop.
struct FlightGuard<'a>(&'a AtomicBool);

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// ── Controller handle ───────────────────────────────────────────────

/// Drives one visible game session against a [`GameService`].
pub struct GameController<S> {
    pub(crate) inner: Arc<Inner<S>>,
}

impl<S> Clone for GameController<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: GameService> GameController<S> {
    /// Create a controller and the receiver for its [`GameEvent`]s.
    ///
    /// No session is created until the first operation needs one (or
    /// [`resume_or_start`](Self::resume_or_start) is called).
    #[must_use = "the event receiver must be used to receive events"]
    pub fn new(
        service: S,
        config: ControllerConfig,
        settings: PlaySettings,
    ) -> (Self, mpsc::Receiver<GameEvent>) {
        let capacity = config.event_channel_capacity.max(1);
        let (events, event_rx) = mpsc::channel(capacity);

        let tick_tx = events.clone();
        let timer = TurnTimer::with_observer(settings.clone(), move |remaining| {
            emit_event(&tick_tx, GameEvent::TimerTick { remaining });
        });

        let visible = VisibleState {
            play_controls_enabled: true,
            timer_remaining: settings.turn_seconds(),
            ..Default::default()
        };

        let inner = Inner {
            service,
            gate: InputGate::new(config.click_gap),
            config,
            settings,
            epochs: EpochManager::new(),
            timer,
            step_token: AtomicU64::new(0),
            move_in_flight: AtomicBool::new(false),
            game_over: AtomicBool::new(false),
            lineup: Mutex::new(Lineup::default()),
            series: Mutex::new(MatchSeries::new()),
            visible: Mutex::new(visible),
            auto_state: Mutex::new(AutoState::Idle),
            auto_playing: AtomicBool::new(false),
            auto_loop_busy: AtomicBool::new(false),
            auto_cooldown_until: Mutex::new(None),
            events,
        };

        (
            Self {
                inner: Arc::new(inner),
            },
            event_rx,
        )
    }

    // ── Accessors ───────────────────────────────────────────────────

    /// The live play settings.
    pub fn settings(&self) -> &PlaySettings {
        &self.inner.settings
    }

    /// The turn timer.
    pub fn timer(&self) -> &TurnTimer {
        &self.inner.timer
    }

    /// The underlying service.
    pub fn service(&self) -> &S {
        &self.inner.service
    }

    /// Replace the team lineup. Takes effect at the next step or auto-play start.
    pub fn set_lineup(&self, lineup: Lineup) {
        *lock(&self.inner.lineup) = lineup;
    }

    /// The current team lineup.
    pub fn lineup(&self) -> Lineup {
        lock(&self.inner.lineup).clone()
    }

    /// Everything the renderer is currently showing.
    pub fn visible(&self) -> VisibleState {
        let mut visible = lock(&self.inner.visible).clone();
        visible.timer_remaining = self.inner.timer.remaining();
        visible
    }

    /// The current `(epoch, session)` pair.
    pub fn snapshot(&self) -> Snapshot {
        self.inner.epochs.snapshot()
    }

    /// The current epoch.
    pub fn epoch(&self) -> u64 {
        self.inner.epochs.epoch()
    }

    /// The current session identifier.
    pub fn session(&self) -> Option<SessionId> {
        self.inner.epochs.session()
    }

    /// The current step token.
    pub fn step_token(&self) -> u64 {
        self.inner.step_token.load(Ordering::Acquire)
    }

    /// Returns `true` once a win, draw or finished response ended the game.
    /// Steps and auto-play are refused until a new game starts.
    pub fn is_game_over(&self) -> bool {
        self.inner.game_over.load(Ordering::Acquire)
    }

    /// Returns `true` while a move submission is awaiting the service.
    pub fn is_move_in_flight(&self) -> bool {
        self.inner.move_in_flight.load(Ordering::Acquire)
    }

    /// Recorded series results.
    pub fn series(&self) -> Vec<MatchResult> {
        lock(&self.inner.series).results().to_vec()
    }

    /// The game being played in the series (1 or 2).
    pub fn current_match(&self) -> u8 {
        lock(&self.inner.series).current_match()
    }

    // ── Session lifecycle ───────────────────────────────────────────

    /// Create a new session and make it current. The previous session, if
    /// any, is replaced but not deleted.
    pub async fn start_new_game(&self) -> Result<SessionId> {
        let snap = self.inner.epochs.snapshot();
        let session = self.call(&snap, self.inner.service.create_session()).await?;
        if !self.inner.epochs.install_session_if(snap.epoch, session.clone()) {
            debug!(session = %session, "session created for an abandoned epoch, discarding");
            return Err(CubeFourError::Cancelled);
        }
        self.inner.game_over.store(false, Ordering::Release);
        info!(session = %session, "new game started");
        self.emit(GameEvent::SessionStarted {
            session: session.clone(),
        });
        Ok(session)
    }

    /// The current session, creating one if there is none.
    pub async fn ensure_session(&self) -> Result<SessionId> {
        match self.inner.epochs.session() {
            Some(session) => Ok(session),
            None => self.start_new_game().await,
        }
    }

    /// Reattach to `previous` if the service still knows it, otherwise start
    /// a new game. Displays the board either way.
    pub async fn resume_or_start(&self, previous: Option<SessionId>) -> Result<GameState> {
        if let Some(previous) = previous {
            self.inner.epochs.replace_session(Some(previous.clone()));
            match self.refresh_board().await {
                Ok(state) => {
                    self.inner.game_over.store(state.game_over, Ordering::Release);
                    info!(session = %previous, "resumed existing session");
                    self.emit(GameEvent::SessionStarted { session: previous });
                    return Ok(state);
                }
                Err(e) if e.is_cancellation() => return Err(e),
                Err(e) => {
                    debug!(session = %previous, error = %e, "previous session unusable");
                    self.inner.epochs.replace_session(None);
                }
            }
        }
        self.start_new_game().await?;
        self.refresh_board().await
    }

    /// Fetch the session state. The board and turn are displayed only if the
    /// epoch and session did not change while the request was in flight; the
    /// fetched state is returned either way.
    pub async fn refresh_board(&self) -> Result<GameState> {
        let snap = self.inner.epochs.snapshot();
        let session = snap.session.clone().ok_or(CubeFourError::NoSession)?;
        let state = self
            .call(&snap, self.inner.service.fetch_state(&session))
            .await?;

        if self.inner.epochs.is_current(&snap) {
            self.show_board(state.board, state.winning_coords.clone().unwrap_or_default());
            if let Some(side) = state.current_side() {
                self.set_status(format!("{side}'s turn"));
            }
        } else {
            debug!(epoch = snap.epoch, "stale board state discarded");
        }
        Ok(state)
    }

    /// Invalidate everything in flight and start over with a clean slate.
    ///
    /// The visible state is cleared immediately. Deleting the old session and
    /// creating a new one happens in the background; the returned handle
    /// completes when it is done. Failures there are only logged.
    pub fn reset(&self) -> JoinHandle<()> {
        let epoch = self.inner.epochs.bump_and_cancel_all();
        self.inner.step_token.fetch_add(1, Ordering::AcqRel);
        let previous = self.inner.epochs.replace_session(None);
        self.inner.timer.stop(true);
        self.force_auto_idle();
        self.inner.game_over.store(false, Ordering::Release);
        self.set_play_controls(true);

        lock(&self.inner.series).reset();
        {
            let mut visible = lock(&self.inner.visible);
            visible.series.clear();
            visible.series_winner = None;
            visible.next_game_available = false;
        }
        self.emit(GameEvent::SeriesUpdated(Vec::new()));
        self.emit(GameEvent::NextGameAvailable(false));
        self.clear_log();
        self.clear_board();
        self.set_status("Reset");
        info!(epoch, "controller reset");

        let me = self.clone();
        tokio::spawn(async move {
            if let Some(previous) = previous {
                let snap = me.inner.epochs.snapshot();
                if let Err(e) = me
                    .call(&snap, me.inner.service.delete_session(&previous))
                    .await
                {
                    warn!(session = %previous, error = %e, "failed to delete session after reset");
                }
            }
            let restarted = match me.start_new_game().await {
                Ok(_) => me.refresh_board().await.map(drop),
                Err(e) => Err(e),
            };
            match restarted {
                Ok(()) => {}
                Err(e) if e.is_cancellation() => debug!("reset follow-up superseded"),
                Err(e) => warn!(error = %e, "failed to start a new game after reset"),
            }
        })
    }

    /// Start game two of the series on a fresh session.
    ///
    /// # Errors
    ///
    /// Service failures are surfaced as status plus notice and returned.
    pub async fn next_game(&self) -> Result<SessionId> {
        self.set_next_game_available(false);
        self.force_auto_idle();
        self.inner.epochs.bump_and_cancel_all();
        self.inner.step_token.fetch_add(1, Ordering::AcqRel);
        self.inner.timer.stop(true);

        match self.start_second_game().await {
            Ok(session) => Ok(session),
            Err(e) if e.is_cancellation() => Err(e),
            Err(e) => {
                self.set_status(format!("Failed to start game 2: {e}"));
                self.notice(format!("Failed to start game 2: {e}"));
                Err(e)
            }
        }
    }

    async fn start_second_game(&self) -> Result<SessionId> {
        if let Some(previous) = self.inner.epochs.replace_session(None) {
            let snap = self.inner.epochs.snapshot();
            self.call(&snap, self.inner.service.delete_session(&previous))
                .await?;
        }
        let session = self.start_new_game().await?;
        let snap = self.inner.epochs.snapshot();
        let state = self
            .call(&snap, self.inner.service.fetch_state(&session))
            .await?;
        if !self.inner.epochs.is_current(&snap) {
            return Err(CubeFourError::Cancelled);
        }

        self.clear_board();
        self.show_board(state.board, Vec::new());
        let turn = state
            .current_side()
            .map_or_else(String::new, |side| format!(", {side} to move"));
        self.set_status(format!("Game 2 started{turn}"));
        self.log_note("------ game 2 ------");
        self.set_play_controls(true);
        info!(session = %session, "second game of the series started");
        Ok(session)
    }

    /// Tear the session down: invalidate everything in flight, stop the
    /// timer and auto-play, and delete the remote session (bounded by
    /// [`ControllerConfig::shutdown_timeout`]).
    pub async fn shutdown(&self) {
        debug!("controller shutdown requested");
        self.inner.epochs.bump_and_cancel_all();
        self.inner.step_token.fetch_add(1, Ordering::AcqRel);
        self.inner.timer.stop(false);
        self.force_auto_idle();

        let Some(previous) = self.inner.epochs.replace_session(None) else {
            return;
        };
        let timeout = self.inner.config.shutdown_timeout;
        match tokio::time::timeout(timeout, self.inner.service.delete_session(&previous)).await {
            Ok(Ok(())) => debug!(session = %previous, "session deleted on shutdown"),
            Ok(Err(e)) => warn!(session = %previous, error = %e, "failed to delete session on shutdown"),
            Err(_) => warn!(session = %previous, "session deletion timed out on shutdown"),
        }
    }

    // ── Move submission ─────────────────────────────────────────────

    /// A click on a column: passes through the input gate, then submits.
    pub async fn click(&self, column: Column) -> Result<Submission> {
        if self.auto_alive() {
            return Ok(Submission::Rejected);
        }
        let Some(_busy) = self.inner.gate.enter() else {
            debug!(%column, "click rejected by input gate");
            return Ok(Submission::Rejected);
        };
        self.submit_move(column).await
    }

    /// Submit a move for the side to move.
    ///
    /// Creates a session first if there is none, and recreates it once if the
    /// service no longer knows it. The response is applied only if the epoch
    /// and session are unchanged when it arrives. Cancellations resolve to
    /// [`Submission::Stale`]; other failures are shown as status and returned.
    pub async fn submit_move(&self, column: Column) -> Result<Submission> {
        match self.submit_move_inner(column).await {
            Ok(submission) => Ok(submission),
            Err(e) if e.is_cancellation() => Ok(Submission::Stale),
            Err(e) => {
                warn!(%column, error = %e, "move submission failed");
                self.set_status(format!("Move failed: {e}"));
                Err(e)
            }
        }
    }

    async fn submit_move_inner(&self, column: Column) -> Result<Submission> {
        self.ensure_session().await?;
        let Some(_flight) = self.begin_flight() else {
            debug!(%column, "move already in flight, submission rejected");
            return Ok(Submission::Rejected);
        };

        let (snap, response) = self.post_move(column).await?;
        if !self.inner.epochs.is_current(&snap) {
            debug!(%column, epoch = snap.epoch, "stale move response discarded");
            return Ok(Submission::Stale);
        }
        let outcome = self.apply_response(
            &response,
            ApplyOptions {
                restart_timer_on_ok: true,
                ..Default::default()
            },
        );
        Ok(Submission::Applied(outcome))
    }

    /// Posts a move for the current session, recreating the session once if
    /// the service has forgotten it. Returns the snapshot the successful
    /// request was issued under.
    async fn post_move(&self, column: Column) -> Result<(Snapshot, MoveResponse)> {
        let snap = self.inner.epochs.snapshot();
        let session = snap.session.clone().ok_or(CubeFourError::NoSession)?;
        match self
            .call(&snap, self.inner.service.submit_move(&session, column.into()))
            .await
        {
            Err(CubeFourError::SessionNotFound) => {
                if !self.inner.epochs.is_current(&snap) {
                    return Err(CubeFourError::Cancelled);
                }
                warn!(session = %session, "session unknown to the service, creating a new one");
                self.inner.epochs.replace_session(None);
                let session = self.start_new_game().await?;
                let snap = self.inner.epochs.snapshot();
                let response = self
                    .call(&snap, self.inner.service.submit_move(&session, column.into()))
                    .await?;
                Ok((snap, response))
            }
            other => other.map(|response| (snap, response)),
        }
    }

    fn begin_flight(&self) -> Option<FlightGuard<'_>> {
        if self.inner.move_in_flight.swap(true, Ordering::AcqRel) {
            return None;
        }
        Some(FlightGuard(&self.inner.move_in_flight))
    }

    // ── Single step ─────────────────────────────────────────────────

    /// Play one move chosen by the algorithm of the side to move.
    ///
    /// The turn countdown runs while the algorithm thinks; if it expires
    /// first, the first open column is played instead and this step becomes
    /// stale. A suggestion for a full or nonexistent column is replaced by
    /// the first open column, and the log line says so. Refused once the
    /// game is over.
    pub async fn submit_step(&self) -> Result<StepReport> {
        if self.is_game_over() {
            debug!("step requested after the game ended");
            return Ok(StepReport::Rejected);
        }
        if self.auto_alive() {
            self.set_status("Stop auto-play before stepping");
            return Ok(StepReport::Rejected);
        }
        let Some(_busy) = self.inner.gate.enter() else {
            return Ok(StepReport::Rejected);
        };

        self.set_play_controls(false);
        let token = self.inner.step_token.fetch_add(1, Ordering::AcqRel) + 1;
        let result = self.run_step(token).await;
        if !self.inner.game_over.load(Ordering::Acquire) {
            self.set_play_controls(true);
        }

        match result {
            Ok(report) => Ok(report),
            Err(e) if e.is_cancellation() => Ok(StepReport::Stale),
            Err(e) => {
                self.inner.timer.stop(false);
                if e.is_configuration() {
                    self.set_status(format!("Cannot step: {e}"));
                    self.notice("Select an algorithm for both sides");
                } else {
                    warn!(error = %e, "step failed");
                    self.set_status(format!("AI move error: {e}"));
                }
                Err(e)
            }
        }
    }

    async fn run_step(&self, token: u64) -> Result<StepReport> {
        self.ensure_session().await?;
        self.start_turn_timer(token);

        let state = self.refresh_board().await?;
        let side = state.current_side().ok_or_else(|| {
            CubeFourError::InvalidResponse("game state has no current player".into())
        })?;
        let algorithm = self.lineup().algorithm_path(side)?;

        let snap = self.inner.epochs.snapshot();
        let session = snap.session.clone().ok_or(CubeFourError::NoSession)?;
        let request = AlgoMoveRequest::new(
            side,
            state.board,
            algorithm,
            self.inner.settings.turn_seconds(),
        );
        let suggestion = self
            .call(&snap, self.inner.service.request_ai_move(&session, request))
            .await?;
        if !self.step_is_current(token, &snap) {
            debug!(token, "AI suggestion arrived for a superseded step");
            return Ok(StepReport::Stale);
        }

        let mut reason = suggestion.reason_text().map(str::to_owned);
        let requested = suggestion.suggestion.and_then(|s| s.column());
        let (column, substituted) = match requested {
            Some(column) if !state.board.is_column_full(column) => (column, false),
            _ => {
                let Some(fallback) = state.board.first_open_column() else {
                    self.inner.timer.stop(false);
                    self.set_status("No open column left: the board is full");
                    return Ok(StepReport::BoardFull);
                };
                let why = if requested.is_some() {
                    "column was full"
                } else {
                    "invalid coordinates"
                };
                warn!(?requested, %fallback, why, "replacing AI suggestion with fallback column");
                let note = format!("{why}, placed at first open column");
                reason = Some(match reason {
                    Some(r) => format!("{r} / {note}"),
                    None => note,
                });
                (fallback, true)
            }
        };

        // Claim the turn before posting. From here on the timeout cannot fire
        // for this token, so an accepted move is always applied.
        if self
            .inner
            .step_token
            .compare_exchange(token, token + 1, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(token, "turn already claimed by the timeout");
            return Ok(StepReport::Stale);
        }
        self.inner.timer.stop(false);
        if !self.inner.epochs.is_current(&snap) {
            return Ok(StepReport::Stale);
        }
        let Some(_flight) = self.begin_flight() else {
            return Ok(StepReport::Rejected);
        };
        let (snap, response) = self.post_move(column).await?;
        if !self.inner.epochs.is_current(&snap) {
            debug!(token, "move response arrived after the epoch moved on");
            return Ok(StepReport::Stale);
        }

        if response.status == ResponseStatus::Invalid {
            self.set_status("Invalid move, please retry");
            return Ok(StepReport::Invalid);
        }

        let mover = response.current_side().map_or(side, Side::other);
        self.log_move(MoveLogEntry {
            move_count: response.move_count,
            team: self.lineup().label(mover),
            side: mover,
            column: Some(column),
            reason: reason.clone(),
        });
        let outcome = self.apply_response(
            &response,
            ApplyOptions {
                suppress_log: true,
                restart_timer_on_ok: false,
                reason,
            },
        );

        Ok(StepReport::Played {
            column,
            substituted,
            outcome,
        })
    }

    fn step_is_current(&self, token: u64, snap: &Snapshot) -> bool {
        self.inner.step_token.load(Ordering::Acquire) == token
            && self.inner.epochs.is_current(snap)
    }

    // ── Turn timeout ────────────────────────────────────────────────

    /// Start the turn countdown; on expiry the fallback move is played for
    /// the turn identified by `token`.
    fn start_turn_timer(&self, token: u64) {
        let snap = self.inner.epochs.snapshot();
        let me = self.clone();
        self.inner
            .timer
            .start(async move { me.on_turn_timeout(snap, token).await });
    }

    async fn on_turn_timeout(&self, snap: Snapshot, token: u64) {
        if !self.inner.epochs.is_current(&snap) {
            debug!("turn timeout for a previous epoch ignored");
            return;
        }
        // Claim the turn: any step still waiting on this token becomes stale.
        if self
            .inner
            .step_token
            .compare_exchange(token, token + 1, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(token, "turn timeout superseded");
            return;
        }
        info!("turn timed out, playing the first open column");
        match self.fallback_move(&snap).await {
            Ok(_) => {}
            Err(e) if e.is_cancellation() => {}
            Err(e) => warn!(error = %e, "fallback move failed"),
        }
    }

    async fn fallback_move(&self, snap: &Snapshot) -> Result<Submission> {
        let state = self.refresh_board().await?;
        if !self.inner.epochs.is_current(snap) {
            return Ok(Submission::Stale);
        }
        match state.board.first_open_column() {
            Some(column) => self.submit_move(column).await,
            None => Ok(Submission::NoOpenColumn),
        }
    }

    // ── Result application ──────────────────────────────────────────

    /// Carry out the actions prescribed for a response's outcome.
    ///
    /// Callers must have checked that the response is current.
    pub(crate) fn apply_response(&self, resp: &MoveResponse, opts: ApplyOptions) -> Outcome {
        let outcome = classify(resp);
        debug!(?outcome, "applying service response");

        if outcome.moved() {
            if let Some(board) = resp.board {
                self.show_board(board, resp.winning_coords.clone().unwrap_or_default());
            }
        }

        let lineup = self.lineup();
        let mover = resolve_mover(resp);
        let reason = opts.reason.clone().or_else(|| resp.reason.clone());
        let entry = |side: Side| MoveLogEntry {
            move_count: resp.move_count,
            team: lineup.label(side),
            side,
            column: resp.last_move,
            reason: reason.clone(),
        };

        match &outcome {
            Outcome::Continue => {
                if let (false, Some(side)) = (opts.suppress_log, mover) {
                    self.log_move(entry(side));
                }
                if let Some(next) = resp.current_side() {
                    self.set_status(format!("{next}'s turn"));
                }
                if opts.restart_timer_on_ok && !self.is_auto_playing() {
                    let token = self.step_token();
                    self.start_turn_timer(token);
                }
            }
            Outcome::Win { winner } => {
                // No usable player field at all: the service's convention is side two.
                let winner = winner.unwrap_or(Side::Two);
                let label = lineup.label(winner);
                if !opts.suppress_log {
                    self.log_move(entry(mover.unwrap_or(winner)));
                }
                let moves = resp.move_count;
                self.set_status(format!("{label} wins!"));
                self.end_game();
                let count = moves.map_or_else(|| "?".to_owned(), |n| n.to_string());
                self.log_note(format!("{label} won in {count} moves"));
                self.notice(format!("{label} wins! ({count} moves)"));
                self.record_result(label, moves.unwrap_or(self.inner.config.draw_move_count));
            }
            Outcome::Draw => {
                if let (false, Some(side)) = (opts.suppress_log, mover) {
                    self.log_move(entry(side));
                }
                self.set_status("Draw!");
                self.end_game();
                self.log_note("The game ended in a draw");
                self.notice("Draw!");
                self.record_result(DRAW_LABEL.to_owned(), self.inner.config.draw_move_count);
            }
            Outcome::Invalid { message } => {
                self.set_status(format!(
                    "Invalid move: {}",
                    message.as_deref().unwrap_or("try another column")
                ));
            }
            Outcome::Finished => {
                self.set_status("Game over");
                self.end_game();
            }
            Outcome::Error { message } => {
                let message = message.as_deref().unwrap_or_default();
                self.set_status(format!("Error: {message}"));
                self.inner.timer.stop(false);
                self.notice(format!("Error: {message}"));
            }
            Outcome::Unrecognized { status } => {
                warn!(%status, "unrecognized response status");
                self.set_status("Unrecognized response");
            }
        }
        outcome
    }

    fn end_game(&self) {
        self.inner.timer.stop(false);
        self.inner.game_over.store(true, Ordering::Release);
        self.set_play_controls(false);
    }

    fn record_result(&self, label: String, moves: u32) {
        let (progress, results) = {
            let mut series = lock(&self.inner.series);
            let progress = series.record_result(label, moves);
            (progress, series.results().to_vec())
        };
        lock(&self.inner.visible).series.clone_from(&results);
        self.emit(GameEvent::SeriesUpdated(results));

        match progress {
            SeriesProgress::AwaitingSecondGame => {
                self.set_next_game_available(true);
                self.set_status("Game 1 finished. Start game 2 with \"next game\".");
            }
            SeriesProgress::Decided { winner } => {
                lock(&self.inner.visible).series_winner = Some(winner.clone());
                self.emit(GameEvent::SeriesDecided { winner });
            }
            SeriesProgress::Ignored => {}
        }
    }

    // ── Remote calls ────────────────────────────────────────────────

    /// Runs a service call under the cancellation scope of `snap`'s epoch.
    ///
    /// Fails with [`CubeFourError::Cancelled`] without issuing the call if the
    /// snapshot is already stale, and drops the call if the epoch is bumped
    /// while it is in flight.
    pub(crate) async fn call<T, F>(&self, snap: &Snapshot, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.inner.epochs.epoch() != snap.epoch {
            return Err(CubeFourError::Cancelled);
        }
        let scope = self.inner.epochs.scope();
        tokio::select! {
            biased;
            () = scope.cancelled() => Err(CubeFourError::Cancelled),
            result = call => result,
        }
    }

    // ── Visible state ───────────────────────────────────────────────

    pub(crate) fn emit(&self, event: GameEvent) {
        emit_event(&self.inner.events, event);
    }

    pub(crate) fn set_status(&self, text: impl Into<String>) {
        let text = text.into();
        lock(&self.inner.visible).status.clone_from(&text);
        self.emit(GameEvent::Status(text));
    }

    pub(crate) fn notice(&self, text: impl Into<String>) {
        self.emit(GameEvent::Notice(text.into()));
    }

    pub(crate) fn show_board(&self, board: Board, winning_coords: Vec<Coord>) {
        {
            let mut visible = lock(&self.inner.visible);
            visible.board = Some(board);
            visible.winning_coords.clone_from(&winning_coords);
        }
        self.emit(GameEvent::BoardUpdated {
            board,
            winning_coords,
        });
    }

    fn clear_board(&self) {
        {
            let mut visible = lock(&self.inner.visible);
            visible.board = None;
            visible.winning_coords.clear();
        }
        self.emit(GameEvent::BoardCleared);
    }

    pub(crate) fn log_move(&self, entry: MoveLogEntry) {
        lock(&self.inner.visible)
            .log
            .push(LogLine::Move(entry.clone()));
        self.emit(GameEvent::MoveLogged(entry));
    }

    fn log_note(&self, text: impl Into<String>) {
        let text = text.into();
        lock(&self.inner.visible).log.push(LogLine::Note(text.clone()));
        self.emit(GameEvent::LogNote(text));
    }

    fn clear_log(&self) {
        lock(&self.inner.visible).log.clear();
        self.emit(GameEvent::LogCleared);
    }

    fn set_play_controls(&self, enabled: bool) {
        lock(&self.inner.visible).play_controls_enabled = enabled;
        self.emit(GameEvent::PlayControlsEnabled(enabled));
    }

    fn set_next_game_available(&self, available: bool) {
        lock(&self.inner.visible).next_game_available = available;
        self.emit(GameEvent::NextGameAvailable(available));
    }

    pub(crate) fn set_auto_visible(&self, running: bool) {
        lock(&self.inner.visible).auto_play_running = running;
        self.emit(GameEvent::AutoPlayChanged { running });
    }
}

impl<S> std::fmt::Debug for GameController<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameController")
            .field("epoch", &self.inner.epochs.epoch())
            .field("session", &self.inner.epochs.session())
            .field("step_token", &self.inner.step_token.load(Ordering::Relaxed))
            .field(
                "move_in_flight",
                &self.inner.move_in_flight.load(Ordering::Relaxed),
            )
            .finish()
    }
}

/// Emit an event. If the channel is full, log a warning and drop the event so
/// the controller never blocks on the renderer.
fn emit_event(events: &mpsc::Sender<GameEvent>, event: GameEvent) {
    match events.try_send(event) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(dropped)) => {
            warn!(
                "event channel full, dropping event: {:?}",
                std::mem::discriminant(&dropped)
            );
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {}
    }
}
