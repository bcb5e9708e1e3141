//! Wire types for the remote game service.
//!
//! Every request and response body exchanged with the service is defined
//! here. The service is not consistent about naming, so several fields carry
//! serde aliases, and the fields that identify a player are kept raw so the
//! classifier can derive who moved instead of trusting any single one.

use serde::{Deserialize, Serialize};

use crate::board::{Board, Column, Coord, Side};

// ── Type aliases ────────────────────────────────────────────────────

/// Opaque session identifier issued by the service.
pub type SessionId = String;

// ── Status ──────────────────────────────────────────────────────────

/// The `status` tag of a move or auto-step response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResponseStatus {
    /// Move accepted, game continues.
    Ok,
    /// Move accepted and it won the game.
    Win,
    /// Move accepted and the board is full.
    Draw,
    /// Move rejected (full column); retryable.
    Invalid,
    /// The game was already over.
    Finished,
    /// The service reported a failure.
    Error,
    /// Anything else, including a missing status.
    Unrecognized(String),
}

impl Default for ResponseStatus {
    fn default() -> Self {
        Self::Unrecognized(String::new())
    }
}

impl From<String> for ResponseStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "ok" => Self::Ok,
            "win" => Self::Win,
            "draw" => Self::Draw,
            "invalid" => Self::Invalid,
            "finished" => Self::Finished,
            "error" => Self::Error,
            _ => Self::Unrecognized(s),
        }
    }
}

impl From<ResponseStatus> for String {
    fn from(status: ResponseStatus) -> Self {
        match status {
            ResponseStatus::Ok => "ok".into(),
            ResponseStatus::Win => "win".into(),
            ResponseStatus::Draw => "draw".into(),
            ResponseStatus::Invalid => "invalid".into(),
            ResponseStatus::Finished => "finished".into(),
            ResponseStatus::Error => "error".into(),
            ResponseStatus::Unrecognized(s) => s,
        }
    }
}

// ── Responses ───────────────────────────────────────────────────────

/// Body of `POST /games`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGameResponse {
    #[serde(default)]
    pub game_id: Option<SessionId>,
}

/// Body of `GET /games/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub board: Board,
    #[serde(default)]
    pub current_player: Option<i64>,
    #[serde(default)]
    pub game_over: bool,
    #[serde(default, alias = "moves", alias = "turn_count")]
    pub move_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winning_coords: Option<Vec<Coord>>,
}

impl GameState {
    /// The side to move next, if the service reported a valid one.
    pub fn current_side(&self) -> Option<Side> {
        self.current_player.and_then(Side::from_number)
    }
}

/// The `player` field: a number on some endpoints, a label such as
/// `"Player 2"` on others.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlayerField {
    Number(i64),
    Label(String),
}

/// Body of `POST /games/{id}/move` and `POST /games/{id}/auto-step`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MoveResponse {
    #[serde(default)]
    pub status: ResponseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board: Option<Board>,
    /// Whose turn it is *next*.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_player: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player: Option<PlayerField>,
    #[serde(
        default,
        alias = "moves",
        alias = "turn_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub move_count: Option<u32>,
    #[serde(default, alias = "move", skip_serializing_if = "Option::is_none")]
    pub last_move: Option<Column>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winning_coords: Option<Vec<Coord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_over: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl MoveResponse {
    /// A response carrying only a status.
    pub fn with_status(status: ResponseStatus) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }

    /// The side to move next, if reported.
    pub fn current_side(&self) -> Option<Side> {
        self.current_player.and_then(Side::from_number)
    }

    /// `reason`, falling back to `message`.
    pub fn reason_text(&self) -> Option<&str> {
        self.reason.as_deref().or(self.message.as_deref())
    }
}

/// Raw coordinates suggested by an algorithm. Kept signed and optional so an
/// out-of-range or missing suggestion can be detected instead of failing to
/// parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SuggestedMove {
    #[serde(default)]
    pub x: Option<i64>,
    #[serde(default)]
    pub y: Option<i64>,
}

impl SuggestedMove {
    /// The suggested column, if both coordinates are inside the cube.
    pub fn column(&self) -> Option<Column> {
        let x = u8::try_from(self.x?).ok()?;
        let y = u8::try_from(self.y?).ok()?;
        let column = Column::new(x, y);
        column.in_bounds().then_some(column)
    }
}

/// Body of `POST /games/{id}/algo-move`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlgoMoveResponse {
    #[serde(default)]
    pub status: ResponseStatus,
    #[serde(default, rename = "move", skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<SuggestedMove>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AlgoMoveResponse {
    /// `reason`, falling back to `message`.
    pub fn reason_text(&self) -> Option<&str> {
        self.reason.as_deref().or(self.message.as_deref())
    }
}

// ── Requests ────────────────────────────────────────────────────────

/// Body of `POST /games/{id}/move`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    pub x: u8,
    pub y: u8,
}

impl From<Column> for MoveRequest {
    fn from(c: Column) -> Self {
        Self { x: c.x, y: c.y }
    }
}

/// Body of `POST /games/{id}/algo-move`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgoMoveRequest {
    /// `"player1"` or `"player2"`.
    pub player_id: String,
    pub board: Board,
    #[serde(rename = "algorithmPath")]
    pub algorithm_path: String,
    /// Thinking budget in seconds.
    #[serde(rename = "timeLimit")]
    pub time_limit: u32,
}

impl AlgoMoveRequest {
    pub fn new(side: Side, board: Board, algorithm_path: String, time_limit: u32) -> Self {
        Self {
            player_id: format!("player{}", side.number()),
            board,
            algorithm_path,
            time_limit,
        }
    }
}

/// Body of `POST /games/{id}/auto-step`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoStepRequest {
    pub player1: String,
    pub player2: String,
    /// Thinking budget in seconds.
    #[serde(rename = "timeLimit")]
    pub time_limit: u32,
}
