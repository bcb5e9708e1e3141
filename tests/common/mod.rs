#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing,
    dead_code
)]
//! Shared test utilities for cube-four client integration tests.
//!
//! Provides a [`ScriptedService`] whose replies are queued per endpoint and
//! can be held back until the test releases them, plus helpers for building
//! common service responses.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use cube_four_client::protocol::{
    AlgoMoveRequest, AlgoMoveResponse, AutoStepRequest, GameState, MoveRequest, MoveResponse,
    SessionId, SuggestedMove,
};
use cube_four_client::{
    Board, ControllerConfig, CubeFourError, GameController, GameEvent, GameService, Lineup,
    PlaySettings, Seat, Team,
};
use tokio::sync::{mpsc, Notify};

// ── ScriptedService ─────────────────────────────────────────────────

/// A call received by the [`ScriptedService`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateSession,
    FetchState(SessionId),
    SubmitMove(SessionId, MoveRequest),
    RequestAiMove(SessionId, AlgoMoveRequest),
    AdvanceOneMove(SessionId, AutoStepRequest),
    DeleteSession(SessionId),
}

/// One scripted reply, optionally held until released.
struct Reply<T> {
    result: Result<T, CubeFourError>,
    hold: Option<Arc<Notify>>,
}

impl<T> Reply<T> {
    async fn deliver(self) -> Result<T, CubeFourError> {
        if let Some(hold) = self.hold {
            hold.notified().await;
        }
        self.result
    }
}

#[derive(Default)]
struct Script {
    sessions: VecDeque<Reply<SessionId>>,
    states: VecDeque<Reply<GameState>>,
    moves: VecDeque<Reply<MoveResponse>>,
    ai_moves: VecDeque<Reply<AlgoMoveResponse>>,
    auto_steps: VecDeque<Reply<MoveResponse>>,
}

/// A [`GameService`] replaying scripted replies in order.
///
/// Unscripted calls fall back to defaults: sessions are named `game-1`,
/// `game-2`, ...; state is [`ScriptedService::set_state`]'s value (an empty
/// board with player 1 to move unless changed); moves, AI moves and
/// auto-steps fail with an "unscripted" error. Every call is recorded.
#[derive(Clone)]
pub struct ScriptedService {
    script: Arc<StdMutex<Script>>,
    state: Arc<StdMutex<GameState>>,
    calls: Arc<StdMutex<Vec<Call>>>,
    next_session: Arc<AtomicU32>,
}

impl ScriptedService {
    pub fn new() -> Self {
        Self {
            script: Arc::default(),
            state: Arc::new(StdMutex::new(state_json(Board::empty(), 1))),
            calls: Arc::default(),
            next_session: Arc::new(AtomicU32::new(1)),
        }
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    /// Every call received so far.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls matching `pred`.
    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    /// The state returned by unscripted `fetch_state` calls.
    pub fn set_state(&self, state: GameState) {
        *self.state.lock().unwrap() = state;
    }

    pub fn push_session(&self, result: Result<SessionId, CubeFourError>) {
        self.script.lock().unwrap().sessions.push_back(Reply { result, hold: None });
    }

    pub fn push_state(&self, result: Result<GameState, CubeFourError>) {
        self.script.lock().unwrap().states.push_back(Reply { result, hold: None });
    }

    pub fn push_move(&self, result: Result<MoveResponse, CubeFourError>) {
        self.script.lock().unwrap().moves.push_back(Reply { result, hold: None });
    }

    /// Queue a move reply that is only delivered after the returned
    /// [`Notify`] is notified.
    pub fn hold_move(&self, result: Result<MoveResponse, CubeFourError>) -> Arc<Notify> {
        let hold = Arc::new(Notify::new());
        self.script.lock().unwrap().moves.push_back(Reply {
            result,
            hold: Some(Arc::clone(&hold)),
        });
        hold
    }

    pub fn push_ai_move(&self, result: Result<AlgoMoveResponse, CubeFourError>) {
        self.script.lock().unwrap().ai_moves.push_back(Reply { result, hold: None });
    }

    pub fn hold_ai_move(&self, result: Result<AlgoMoveResponse, CubeFourError>) -> Arc<Notify> {
        let hold = Arc::new(Notify::new());
        self.script.lock().unwrap().ai_moves.push_back(Reply {
            result,
            hold: Some(Arc::clone(&hold)),
        });
        hold
    }

    pub fn push_auto_step(&self, result: Result<MoveResponse, CubeFourError>) {
        self.script.lock().unwrap().auto_steps.push_back(Reply { result, hold: None });
    }

    pub fn hold_auto_step(&self, result: Result<MoveResponse, CubeFourError>) -> Arc<Notify> {
        let hold = Arc::new(Notify::new());
        self.script.lock().unwrap().auto_steps.push_back(Reply {
            result,
            hold: Some(Arc::clone(&hold)),
        });
        hold
    }
}

fn unscripted(endpoint: &str) -> CubeFourError {
    CubeFourError::InvalidResponse(format!("unscripted {endpoint} call"))
}

#[async_trait]
impl GameService for ScriptedService {
    async fn create_session(&self) -> cube_four_client::Result<SessionId> {
        self.record(Call::CreateSession);
        let reply = self.script.lock().unwrap().sessions.pop_front();
        match reply {
            Some(reply) => reply.deliver().await,
            None => {
                let n = self.next_session.fetch_add(1, Ordering::Relaxed);
                Ok(format!("game-{n}"))
            }
        }
    }

    async fn fetch_state(&self, session: &str) -> cube_four_client::Result<GameState> {
        self.record(Call::FetchState(session.to_owned()));
        let reply = self.script.lock().unwrap().states.pop_front();
        match reply {
            Some(reply) => reply.deliver().await,
            None => Ok(self.state.lock().unwrap().clone()),
        }
    }

    async fn submit_move(&self, session: &str, mv: MoveRequest) -> cube_four_client::Result<MoveResponse> {
        self.record(Call::SubmitMove(session.to_owned(), mv));
        let reply = self.script.lock().unwrap().moves.pop_front();
        match reply {
            Some(reply) => reply.deliver().await,
            None => Err(unscripted("move")),
        }
    }

    async fn request_ai_move(
        &self,
        session: &str,
        req: AlgoMoveRequest,
    ) -> cube_four_client::Result<AlgoMoveResponse> {
        self.record(Call::RequestAiMove(session.to_owned(), req));
        let reply = self.script.lock().unwrap().ai_moves.pop_front();
        match reply {
            Some(reply) => reply.deliver().await,
            None => Err(unscripted("algo-move")),
        }
    }

    async fn advance_one_move(
        &self,
        session: &str,
        req: AutoStepRequest,
    ) -> cube_four_client::Result<MoveResponse> {
        self.record(Call::AdvanceOneMove(session.to_owned(), req));
        let reply = self.script.lock().unwrap().auto_steps.pop_front();
        match reply {
            Some(reply) => reply.deliver().await,
            None => Err(unscripted("auto-step")),
        }
    }

    async fn delete_session(&self, session: &str) -> cube_four_client::Result<()> {
        self.record(Call::DeleteSession(session.to_owned()));
        Ok(())
    }
}

// ── Controller helpers ──────────────────────────────────────────────

/// Configuration for tests: no click gap so consecutive inputs are accepted.
pub fn test_config() -> ControllerConfig {
    ControllerConfig::new()
        .with_click_gap(Duration::ZERO)
        .with_auto_toggle_cooldown(Duration::ZERO)
        .with_event_channel_capacity(4096)
}

/// Two teams, Alpha seated first.
pub fn alpha_beta() -> Lineup {
    Lineup::new(
        Some(Team::new("Alpha", "teams/alpha")),
        Some(Team::new("Beta", "teams/beta")),
        Seat::Ai1,
    )
}

/// Start a controller over `service` with the Alpha/Beta lineup.
pub fn start_controller(
    service: ScriptedService,
) -> (GameController<ScriptedService>, mpsc::Receiver<GameEvent>) {
    start_controller_with(service, PlaySettings::new(30, Duration::ZERO))
}

pub fn start_controller_with(
    service: ScriptedService,
    settings: PlaySettings,
) -> (GameController<ScriptedService>, mpsc::Receiver<GameEvent>) {
    let (controller, events) = GameController::new(service, test_config(), settings);
    controller.set_lineup(alpha_beta());
    (controller, events)
}

/// Receive every event currently queued.
pub fn drain(events: &mut mpsc::Receiver<GameEvent>) -> Vec<GameEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

/// Let spawned tasks run until they are all parked.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

// ── JSON helper functions ───────────────────────────────────────────

/// A game state with `current` to move.
pub fn state_json(board: Board, current: i64) -> GameState {
    serde_json::from_value(serde_json::json!({
        "board": board,
        "current_player": current,
        "game_over": false,
    }))
    .expect("state_json")
}

/// An `ok` move response with `next` to move.
pub fn ok_json(board: Board, next: i64, move_count: u32, x: u8, y: u8) -> MoveResponse {
    serde_json::from_value(serde_json::json!({
        "status": "ok",
        "board": board,
        "current_player": next,
        "move_count": move_count,
        "move": { "x": x, "y": y },
    }))
    .expect("ok_json")
}

/// A `win` response for `winner`.
pub fn win_json(board: Board, winner: i64, move_count: u32) -> MoveResponse {
    serde_json::from_value(serde_json::json!({
        "status": "win",
        "board": board,
        "winner": winner,
        "move_count": move_count,
        "winning_coords": [[0, 0, 0], [1, 1, 1], [2, 2, 2], [3, 3, 3]],
    }))
    .expect("win_json")
}

/// A `draw` response.
pub fn draw_json(board: Board) -> MoveResponse {
    serde_json::from_value(serde_json::json!({ "status": "draw", "board": board }))
        .expect("draw_json")
}

/// A response carrying only `status` and `message`.
pub fn status_json(status: &str, message: &str) -> MoveResponse {
    serde_json::from_value(serde_json::json!({ "status": status, "message": message }))
        .expect("status_json")
}

/// An algorithm suggestion.
pub fn suggestion(x: i64, y: i64) -> AlgoMoveResponse {
    AlgoMoveResponse {
        suggestion: Some(SuggestedMove {
            x: Some(x),
            y: Some(y),
        }),
        ..serde_json::from_str(r#"{"status":"ok"}"#).expect("suggestion")
    }
}

/// A board with one stone of `side` at the bottom of `(x, y)`.
pub fn board_with(x: usize, y: usize, side: u8) -> Board {
    let mut board = Board::empty();
    board.set(x, y, 0, side);
    board
}

/// A board whose column `(x, y)` is full.
pub fn board_with_full_column(x: usize, y: usize) -> Board {
    let mut board = Board::empty();
    for z in 0..4 {
        board.set(x, y, z, if z % 2 == 0 { 1 } else { 2 });
    }
    board
}

/// A board with every cell filled.
pub fn full_board() -> Board {
    let mut board = Board::empty();
    for z in 0..4 {
        for y in 0..4 {
            for x in 0..4 {
                board.set(x, y, z, if (x + y + z) % 2 == 0 { 1 } else { 2 });
            }
        }
    }
    board
}
