//! Abstraction over the remote game service.
//!
//! The [`GameService`] trait is the seam between the session controller and
//! whatever actually hosts the game: the bundled HTTP client
//! ([`HttpGameService`](crate::services::HttpGameService)), a scripted mock in
//! tests, or anything else that speaks the same six operations.
//!
//! # Cancellation
//!
//! Implementations do not need to observe cancellation themselves. The
//! controller races every call against the current epoch's cancellation scope
//! and drops the call future when the scope is cancelled. Implementations
//! whose futures release their connection on drop (such as `reqwest`) are
//! therefore interrupted at the transport level; others simply have their
//! eventual result ignored.
//!
//! # Implementing a custom service
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use cube_four_client::error::Result;
//! use cube_four_client::protocol::*;
//! use cube_four_client::service::GameService;
//!
//! struct MyService { /* ... */ }
//!
//! #[async_trait]
//! impl GameService for MyService {
//!     async fn create_session(&self) -> Result<SessionId> { todo!() }
//!     async fn fetch_state(&self, session: &str) -> Result<GameState> { todo!() }
//!     async fn submit_move(&self, session: &str, mv: MoveRequest) -> Result<MoveResponse> { todo!() }
//!     async fn request_ai_move(&self, session: &str, req: AlgoMoveRequest) -> Result<AlgoMoveResponse> { todo!() }
//!     async fn advance_one_move(&self, session: &str, req: AutoStepRequest) -> Result<MoveResponse> { todo!() }
//!     async fn delete_session(&self, session: &str) -> Result<()> { todo!() }
//! }
//! ```

use async_trait::async_trait;

use crate::error::Result;
use crate::protocol::{
    AlgoMoveRequest, AlgoMoveResponse, AutoStepRequest, GameState, MoveRequest, MoveResponse,
    SessionId,
};

/// The remote, authoritative game service.
///
/// The service owns the rules and the AI. The client only ever asks it to do
/// things and reflects what it answers.
///
/// # Errors
///
/// Every method returns [`CubeFourError::SessionNotFound`] when the service no
/// longer knows `session`, and [`CubeFourError::Http`] or
/// [`CubeFourError::Transport`] for other failures.
///
/// [`CubeFourError::SessionNotFound`]: crate::CubeFourError::SessionNotFound
/// [`CubeFourError::Http`]: crate::CubeFourError::Http
/// [`CubeFourError::Transport`]: crate::CubeFourError::Transport
#[async_trait]
pub trait GameService: Send + Sync + 'static {
    /// Create a new game and return its identifier.
    async fn create_session(&self) -> Result<SessionId>;

    /// Fetch the board, the side to move and any winning line.
    async fn fetch_state(&self, session: &str) -> Result<GameState>;

    /// Drop a stone into a column for the side to move.
    async fn submit_move(&self, session: &str, mv: MoveRequest) -> Result<MoveResponse>;

    /// Ask an algorithm for a move without playing it.
    async fn request_ai_move(&self, session: &str, req: AlgoMoveRequest)
        -> Result<AlgoMoveResponse>;

    /// Let the service pick and play one move for the side to move, using
    /// the algorithm configured for that side.
    async fn advance_one_move(&self, session: &str, req: AutoStepRequest) -> Result<MoveResponse>;

    /// Delete a game.
    async fn delete_session(&self, session: &str) -> Result<()>;
}
