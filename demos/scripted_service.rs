//! # Custom Service Example
//!
//! Shows how to implement the [`GameService`] trait with a small in-process
//! game host. This is useful for:
//!
//! - **Testing**: exercise your UI without a running game service
//! - **Custom backends**: adapt any API (gRPC, a local engine, a replay file)
//!
//! The toy host drops stones under gravity and always suggests the first open
//! column. Its rules are deliberately simple: whoever plays move eight wins.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example scripted_service
//! ```

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use cube_four_client::protocol::{
    AlgoMoveRequest, AlgoMoveResponse, AutoStepRequest, GameState, MoveRequest, MoveResponse,
    ResponseStatus, SessionId, SuggestedMove,
};
use cube_four_client::{
    Board, Column, ControllerConfig, CubeFourError, GameController, GameEvent, GameService,
    Lineup, PlaySettings, Seat, Side, StepReport, Team,
};

/// Move on which the toy rules declare a winner.
const WINNING_MOVE: u32 = 8;

// ─────────────────────────────────────────────────────────────────────
// Step 1: Define the in-process host
// ─────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy)]
struct Game {
    board: Board,
    to_move: Side,
    moves: u32,
    over: bool,
}

/// Games keyed by session identifier.
#[derive(Default)]
struct LocalService {
    games: Mutex<HashMap<SessionId, Game>>,
}

impl LocalService {
    fn with_game<T>(
        &self,
        session: &str,
        f: impl FnOnce(&mut Game) -> T,
    ) -> cube_four_client::Result<T> {
        let mut games = self
            .games
            .lock()
            .map_err(|_| CubeFourError::Transport("host state poisoned".into()))?;
        games
            .get_mut(session)
            .map(f)
            .ok_or(CubeFourError::SessionNotFound)
    }
}

/// Drop a stone for the side to move and report the result.
fn play(game: &mut Game, column: Column) -> MoveResponse {
    if game.over {
        return MoveResponse::with_status(ResponseStatus::Finished);
    }
    let (x, y) = (usize::from(column.x), usize::from(column.y));
    let Some(z) = (0..4).find(|&z| game.board.cell(x, y, z) == Some(0)) else {
        return MoveResponse {
            message: Some("column is full".into()),
            ..MoveResponse::with_status(ResponseStatus::Invalid)
        };
    };

    let mover = game.to_move;
    game.board.set(x, y, z, mover.number());
    game.moves += 1;
    game.to_move = mover.other();

    let status = if game.moves == WINNING_MOVE {
        game.over = true;
        ResponseStatus::Win
    } else if game.board.is_full() {
        game.over = true;
        ResponseStatus::Draw
    } else {
        ResponseStatus::Ok
    };
    MoveResponse {
        board: Some(game.board),
        current_player: Some(i64::from(game.to_move.number())),
        winner: (status == ResponseStatus::Win).then(|| i64::from(mover.number())),
        move_count: Some(game.moves),
        last_move: Some(column),
        ..MoveResponse::with_status(status)
    }
}

// ─────────────────────────────────────────────────────────────────────
// Step 2: Implement the GameService trait
// ─────────────────────────────────────────────────────────────────────

#[async_trait]
impl GameService for LocalService {
    async fn create_session(&self) -> cube_four_client::Result<SessionId> {
        let mut games = self
            .games
            .lock()
            .map_err(|_| CubeFourError::Transport("host state poisoned".into()))?;
        let id = format!("local-{}", games.len() + 1);
        games.insert(
            id.clone(),
            Game {
                board: Board::empty(),
                to_move: Side::One,
                moves: 0,
                over: false,
            },
        );
        Ok(id)
    }

    async fn fetch_state(&self, session: &str) -> cube_four_client::Result<GameState> {
        self.with_game(session, |game| GameState {
            board: game.board,
            current_player: Some(i64::from(game.to_move.number())),
            game_over: game.over,
            move_count: Some(game.moves),
            winning_coords: None,
        })
    }

    async fn submit_move(
        &self,
        session: &str,
        mv: MoveRequest,
    ) -> cube_four_client::Result<MoveResponse> {
        self.with_game(session, |game| play(game, Column::new(mv.x, mv.y)))
    }

    async fn request_ai_move(
        &self,
        session: &str,
        req: AlgoMoveRequest,
    ) -> cube_four_client::Result<AlgoMoveResponse> {
        tracing::info!("{} asks {} for a move", req.player_id, req.algorithm_path);
        let column = self.with_game(session, |game| game.board.first_open_column())?;
        Ok(AlgoMoveResponse {
            suggestion: column.map(|c| SuggestedMove {
                x: Some(i64::from(c.x)),
                y: Some(i64::from(c.y)),
            }),
            ..AlgoMoveResponse::default()
        })
    }

    async fn advance_one_move(
        &self,
        session: &str,
        _req: AutoStepRequest,
    ) -> cube_four_client::Result<MoveResponse> {
        self.with_game(session, |game| match game.board.first_open_column() {
            Some(column) => play(game, column),
            None => MoveResponse::with_status(ResponseStatus::Finished),
        })
    }

    async fn delete_session(&self, session: &str) -> cube_four_client::Result<()> {
        if let Ok(mut games) = self.games.lock() {
            games.remove(session);
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────
// Step 3: Drive a game one step at a time
// ─────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for readable output.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let (controller, mut events) = GameController::new(
        LocalService::default(),
        ControllerConfig::new().with_click_gap(std::time::Duration::ZERO),
        PlaySettings::default(),
    );
    controller.set_lineup(Lineup::new(
        Some(Team::new("Alpha", "teams/alpha")),
        Some(Team::new("Beta", "teams/beta")),
        Seat::Ai1,
    ));
    controller.resume_or_start(None).await?;

    // Step until the game is decided.
    loop {
        match controller.submit_step().await? {
            StepReport::Played { outcome, .. } if outcome.is_terminal() => break,
            StepReport::Played { .. } | StepReport::Invalid => {}
            other => {
                tracing::warn!("Step ended early: {other:?}");
                break;
            }
        }
    }

    // ── Read what the renderer would have shown ─────────────────────
    while let Ok(event) = events.try_recv() {
        match event {
            GameEvent::MoveLogged(entry) => println!("{entry}"),
            GameEvent::LogNote(text) => println!("{text}"),
            _ => {}
        }
    }
    println!("Final status: {}", controller.visible().status);

    controller.shutdown().await;
    Ok(())
}
