//! Maps a service response to one of seven outcomes.
//!
//! This module is pure: it decides *what* a response means. The
//! [`GameController`](crate::GameController) carries out the actions each
//! outcome prescribes once it has checked the response is still current.

use crate::board::Side;
use crate::protocol::{MoveResponse, PlayerField, ResponseStatus};

/// The meaning of a move or auto-step response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// `ok`: the move was played and the game continues.
    Continue,
    /// `win`: the move won the game.
    Win { winner: Option<Side> },
    /// `draw`: the board filled up without a winner.
    Draw,
    /// `invalid`: the move was rejected; the same side may retry.
    Invalid { message: Option<String> },
    /// `finished`: the game was already over.
    Finished,
    /// `error`: the service reported a failure.
    Error { message: Option<String> },
    /// Any other status.
    Unrecognized { status: String },
}

impl Outcome {
    /// Returns `true` if the game can no longer be played.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Win { .. } | Self::Draw | Self::Finished | Self::Error { .. }
        )
    }

    /// Returns `true` if the board changed with this response.
    pub fn moved(&self) -> bool {
        matches!(self, Self::Continue | Self::Win { .. } | Self::Draw)
    }
}

/// Classify a response.
pub fn classify(resp: &MoveResponse) -> Outcome {
    match &resp.status {
        ResponseStatus::Ok => Outcome::Continue,
        ResponseStatus::Win => Outcome::Win {
            winner: resolve_mover(resp),
        },
        ResponseStatus::Draw => Outcome::Draw,
        ResponseStatus::Invalid => Outcome::Invalid {
            message: resp.message.clone(),
        },
        ResponseStatus::Finished => Outcome::Finished,
        ResponseStatus::Error => Outcome::Error {
            message: resp.message.clone(),
        },
        ResponseStatus::Unrecognized(status) => Outcome::Unrecognized {
            status: status.clone(),
        },
    }
}

/// Derives the side that just moved.
///
/// The service does not name the mover uniformly, so the fields are tried in
/// order: `winner`, a numeric `player`, a `player` label containing `1` or
/// `2`, and finally the opponent of `current_player` (which names the side to
/// move *next*).
pub fn resolve_mover(resp: &MoveResponse) -> Option<Side> {
    if let Some(side) = resp.winner.and_then(Side::from_number) {
        return Some(side);
    }
    match &resp.player {
        Some(PlayerField::Number(n)) => {
            if let Some(side) = Side::from_number(*n) {
                return Some(side);
            }
        }
        Some(PlayerField::Label(label)) => {
            if label.contains('1') {
                return Some(Side::One);
            }
            if label.contains('2') {
                return Some(Side::Two);
            }
        }
        None => {}
    }
    resp.current_side().map(Side::other)
}
