//! Which team plays which side.
//!
//! The UI has two seats, `ai1` and `ai2`, each optionally holding a team, and
//! a choice of which seat moves first. Side one is always the first mover.

use serde::{Deserialize, Serialize};

use crate::board::Side;
use crate::error::{CubeFourError, Result};

/// A registered team and the location of its algorithm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub name: String,
    pub path: String,
}

impl Team {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// One of the two seats in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Seat {
    #[default]
    Ai1,
    Ai2,
}

/// Both seats plus the first-player choice.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Lineup {
    pub ai1: Option<Team>,
    pub ai2: Option<Team>,
    pub first: Seat,
}

/// The algorithm path for each side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlgorithmPaths {
    pub side_one: String,
    pub side_two: String,
}

impl AlgorithmPaths {
    pub fn for_side(&self, side: Side) -> &str {
        match side {
            Side::One => &self.side_one,
            Side::Two => &self.side_two,
        }
    }
}

impl Lineup {
    pub fn new(ai1: Option<Team>, ai2: Option<Team>, first: Seat) -> Self {
        Self { ai1, ai2, first }
    }

    /// The seat that plays `side`.
    pub fn seat_for(&self, side: Side) -> Seat {
        match (self.first, side) {
            (Seat::Ai1, Side::One) | (Seat::Ai2, Side::Two) => Seat::Ai1,
            (Seat::Ai1, Side::Two) | (Seat::Ai2, Side::One) => Seat::Ai2,
        }
    }

    /// The team seated for `side`, if any.
    pub fn team_for(&self, side: Side) -> Option<&Team> {
        match self.seat_for(side) {
            Seat::Ai1 => self.ai1.as_ref(),
            Seat::Ai2 => self.ai2.as_ref(),
        }
    }

    /// Display label for `side`: the team name, else `"Player n"`.
    pub fn label(&self, side: Side) -> String {
        self.team_for(side)
            .map(|t| t.name.trim())
            .filter(|name| !name.is_empty())
            .map_or_else(|| side.to_string(), str::to_owned)
    }

    /// The normalized algorithm path for `side`.
    ///
    /// # Errors
    ///
    /// [`CubeFourError::MissingAlgorithm`] if the seat is empty or its path is blank.
    pub fn algorithm_path(&self, side: Side) -> Result<String> {
        self.team_for(side)
            .and_then(|t| normalize_algorithm_path(&t.path))
            .ok_or(CubeFourError::MissingAlgorithm { side })
    }

    /// The normalized algorithm paths for both sides.
    ///
    /// # Errors
    ///
    /// [`CubeFourError::MissingAlgorithm`] naming the first side without one.
    pub fn algorithm_paths(&self) -> Result<AlgorithmPaths> {
        Ok(AlgorithmPaths {
            side_one: self.algorithm_path(Side::One)?,
            side_two: self.algorithm_path(Side::Two)?,
        })
    }
}

/// Normalizes a team path into the algorithm entry point.
///
/// Backslashes become slashes; a path that already names a `.py` file is kept,
/// otherwise `main.py` inside that directory is used. Blank input yields `None`.
pub fn normalize_algorithm_path(raw: &str) -> Option<String> {
    let normalized = raw.trim().replace('\\', "/");
    if normalized.is_empty() {
        return None;
    }
    if normalized.to_ascii_lowercase().ends_with(".py") {
        return Some(normalized);
    }
    if normalized.ends_with('/') {
        Some(format!("{normalized}main.py"))
    } else {
        Some(format!("{normalized}/main.py"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn lineup(first: Seat) -> Lineup {
        Lineup::new(
            Some(Team::new("Alpha", "teams\\alpha")),
            Some(Team::new("Beta", "teams/beta/bot.PY")),
            first,
        )
    }

    #[test]
    fn first_seat_plays_side_one() {
        let l = lineup(Seat::Ai1);
        assert_eq!(l.label(Side::One), "Alpha");
        assert_eq!(l.label(Side::Two), "Beta");

        let l = lineup(Seat::Ai2);
        assert_eq!(l.label(Side::One), "Beta");
        assert_eq!(l.label(Side::Two), "Alpha");
    }

    #[test]
    fn empty_seat_falls_back_to_player_label() {
        let l = Lineup::new(Some(Team::new("Alpha", "a")), None, Seat::Ai1);
        assert_eq!(l.label(Side::Two), "Player 2");
        assert!(matches!(
            l.algorithm_path(Side::Two),
            Err(CubeFourError::MissingAlgorithm { side: Side::Two })
        ));
    }

    #[test]
    fn paths_are_normalized() {
        let paths = lineup(Seat::Ai1).algorithm_paths().unwrap();
        assert_eq!(paths.side_one, "teams/alpha/main.py");
        assert_eq!(paths.side_two, "teams/beta/bot.PY");
        assert_eq!(paths.for_side(Side::Two), "teams/beta/bot.PY");
    }

    #[test]
    fn normalize_handles_trailing_slash_and_blank() {
        assert_eq!(
            normalize_algorithm_path("  repo/x/ ").as_deref(),
            Some("repo/x/main.py")
        );
        assert_eq!(normalize_algorithm_path("   "), None);
    }
}
