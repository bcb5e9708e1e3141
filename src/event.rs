//! Events delivered to the renderer collaborator.
//!
//! The controller never draws anything itself. Every visible change is
//! published as a [`GameEvent`] on the channel returned by
//! [`GameController::new`](crate::GameController::new), and mirrored in the
//! controller's [`VisibleState`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::board::{Board, Column, Coord, Side};
use crate::protocol::SessionId;
use crate::series::MatchResult;

/// Longest reason suffix kept in a log line.
const MAX_REASON_LEN: usize = 200;

/// Markers that identify the useful part of an algorithm's error output.
const REASON_MARKERS: [&str; 3] = ["ModuleNotFoundError:", "RuntimeError:", "ValueError:"];

/// One line of the move log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveLogEntry {
    pub move_count: Option<u32>,
    pub team: String,
    pub side: Side,
    pub column: Option<Column>,
    /// Why the move differs from what was asked for (substitution, algorithm failure).
    pub reason: Option<String>,
}

impl fmt::Display for MoveLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.move_count {
            Some(n) => write!(f, "move {n}")?,
            None => write!(f, "move ?")?,
        }
        write!(f, "  {} : {} : ", self.team, self.side.colour())?;
        match self.column {
            Some(c) => write!(f, "{c}")?,
            None => write!(f, "(?, ?)")?,
        }
        if let Some(reason) = self.reason.as_deref().map(condense_reason) {
            if !reason.is_empty() {
                write!(f, "  * {reason}")?;
            }
        }
        Ok(())
    }
}

/// Condenses an algorithm's reason text to a single short line.
pub fn condense_reason(reason: &str) -> String {
    let start = REASON_MARKERS
        .iter()
        .filter_map(|marker| reason.find(marker))
        .min()
        .unwrap_or(0);
    let tail = reason.get(start..).unwrap_or(reason);
    tail.lines()
        .next()
        .unwrap_or_default()
        .trim()
        .chars()
        .take(MAX_REASON_LEN)
        .collect()
}

/// A line in the log: either a move or a free-text note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLine {
    Move(MoveLogEntry),
    Note(String),
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Move(entry) => entry.fmt(f),
            Self::Note(text) => f.write_str(text),
        }
    }
}

/// Everything the renderer currently shows, as last published.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VisibleState {
    pub board: Option<Board>,
    pub winning_coords: Vec<Coord>,
    pub status: String,
    pub log: Vec<LogLine>,
    pub play_controls_enabled: bool,
    pub auto_play_running: bool,
    pub next_game_available: bool,
    pub series: Vec<MatchResult>,
    pub series_winner: Option<String>,
    pub timer_remaining: u32,
}

/// Events emitted by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// A new session became current.
    SessionStarted { session: SessionId },
    /// Redraw the board; highlight `winning_coords`.
    BoardUpdated {
        board: Board,
        winning_coords: Vec<Coord>,
    },
    /// Remove every piece from the board.
    BoardCleared,
    /// Replace the status line.
    Status(String),
    /// Append a move to the log.
    MoveLogged(MoveLogEntry),
    /// Append a free-text line to the log.
    LogNote(String),
    /// Empty the log.
    LogCleared,
    /// Alert-level notice for the user.
    Notice(String),
    /// Enable or disable the step and auto-play controls.
    PlayControlsEnabled(bool),
    /// Turn timer display.
    TimerTick { remaining: u32 },
    /// Auto-play started or stopped.
    AutoPlayChanged { running: bool },
    /// Show or hide the "play game two" affordance.
    NextGameAvailable(bool),
    /// The recorded series results changed.
    SeriesUpdated(Vec<MatchResult>),
    /// The two-game series has a winner.
    SeriesDecided { winner: String },
}
