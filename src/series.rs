//! Best-of-two match series.
//!
//! A series is two games with the sides swapped by the operator between them.
//! The overall winner is decided as follows:
//!
//! 1. the same label won both games: that label;
//! 2. otherwise the game finished in fewer moves decides, whoever won it;
//! 3. equal move counts: the winner of game two.
//!
//! Draws are recorded under [`DRAW_LABEL`] with a large sentinel move count,
//! so a decisive game always beats a draw.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Winner label recorded for a drawn game.
pub const DRAW_LABEL: &str = "draw";

/// Games per series.
pub const GAMES_PER_SERIES: usize = 2;

/// Result of one game of the series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub winner: String,
    pub moves: u32,
}

/// What recording a result did to the series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeriesProgress {
    /// Game one is in; game two can be started.
    AwaitingSecondGame,
    /// Game two is in; the series has a winner.
    Decided { winner: String },
    /// The series was already complete; the result was not recorded.
    Ignored,
}

/// Aggregates at most two game results.
#[derive(Debug, Clone, Default)]
pub struct MatchSeries {
    results: Vec<MatchResult>,
}

impl MatchSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished game.
    pub fn record_result(&mut self, winner: impl Into<String>, moves: u32) -> SeriesProgress {
        if self.results.len() >= GAMES_PER_SERIES {
            warn!("series already complete, ignoring extra result");
            return SeriesProgress::Ignored;
        }
        let winner = winner.into();
        info!(game = self.results.len() + 1, %winner, moves, "game result recorded");
        self.results.push(MatchResult { winner, moves });
        match self.winner() {
            Some(winner) => {
                info!(%winner, "series decided");
                SeriesProgress::Decided { winner }
            }
            None => SeriesProgress::AwaitingSecondGame,
        }
    }

    /// The overall winner, once both games are recorded.
    pub fn winner(&self) -> Option<String> {
        match self.results.as_slice() {
            [first, second] => Some(decide(first, second).to_owned()),
            _ => None,
        }
    }

    /// The game being played: 1 until game one is recorded, then 2.
    pub fn current_match(&self) -> u8 {
        if self.results.is_empty() {
            1
        } else {
            2
        }
    }

    /// Recorded results, in order.
    pub fn results(&self) -> &[MatchResult] {
        &self.results
    }

    /// Returns `true` once both games are recorded.
    pub fn is_complete(&self) -> bool {
        self.results.len() >= GAMES_PER_SERIES
    }

    /// Clear the series for a new pair of games.
    pub fn reset(&mut self) {
        self.results.clear();
    }
}

fn decide<'a>(first: &'a MatchResult, second: &'a MatchResult) -> &'a str {
    // Equal move counts fall through to game two.
    if first.winner == second.winner || first.moves < second.moves {
        &first.winner
    } else {
        &second.winner
    }
}
