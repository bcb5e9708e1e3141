//! Error types for the cube-four client.

use thiserror::Error;

use crate::board::Side;

/// Errors that can occur while driving a game session.
#[derive(Debug, Error)]
pub enum CubeFourError {
    /// The request was abandoned because the epoch it belonged to was
    /// invalidated. Never shown to the user.
    #[error("operation cancelled")]
    Cancelled,

    /// The remote service does not know the session identifier.
    #[error("session not found on the game service")]
    SessionNotFound,

    /// An operation needed a session but none has been created yet.
    #[error("no active session")]
    NoSession,

    /// The game service answered with a non-success HTTP status.
    #[error("game service error ({status}): {message}")]
    Http {
        /// HTTP status code returned by the service.
        status: u16,
        /// `detail` / `message` text from the response body, or the reason phrase.
        message: String,
    },

    /// The request never produced a response (connection refused, reset, ...).
    #[error("transport error: {0}")]
    Transport(String),

    /// Failed to serialize or deserialize a wire message.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No algorithm is configured for the side that has to move.
    #[error("no algorithm selected for {side}")]
    MissingAlgorithm {
        /// The side whose seat is empty.
        side: Side,
    },

    /// An operation timed out.
    #[error("operation timed out")]
    Timeout,

    /// The service answered, but with something the client cannot use.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl CubeFourError {
    /// Returns `true` for the silent category: cancellations are expected
    /// after a reset and are never surfaced as failures.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns `true` for configuration problems that are reported before
    /// any request is attempted.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::MissingAlgorithm { .. })
    }
}

/// A specialized [`Result`] type for cube-four client operations.
pub type Result<T> = std::result::Result<T, CubeFourError>;
