//! Board snapshot types.
//!
//! The service reports the board as a `4 × 4 × 4` array indexed
//! `[level][row][column]` (`board[z][y][x]`), where level 0 is the bottom.
//! Each cell is `0` (empty), `1` (side one, black) or `2` (side two, white).
//! Pieces drop under gravity, so a move is addressed by its column `(x, y)`
//! only.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Edge length of the cube.
pub const SIZE: usize = 4;

/// One of the two sides of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Side {
    /// Side one: moves first, plays black.
    One,
    /// Side two: plays white.
    Two,
}

impl Side {
    /// Maps the wire number (`1` or `2`) to a side.
    pub fn from_number(n: i64) -> Option<Self> {
        match n {
            1 => Some(Self::One),
            2 => Some(Self::Two),
            _ => None,
        }
    }

    /// The wire number of this side.
    pub fn number(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }

    /// The opposing side.
    #[must_use]
    pub fn other(self) -> Self {
        match self {
            Self::One => Self::Two,
            Self::Two => Self::One,
        }
    }

    /// Stone colour used in the move log.
    pub fn colour(self) -> &'static str {
        match self {
            Self::One => "black",
            Self::Two => "white",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Player {}", self.number())
    }
}

impl TryFrom<u8> for Side {
    type Error = String;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        Self::from_number(i64::from(n)).ok_or_else(|| format!("invalid side number {n}"))
    }
}

impl From<Side> for u8 {
    fn from(side: Side) -> Self {
        side.number()
    }
}

/// A column on the board, the unit of a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    pub x: u8,
    pub y: u8,
}

impl Column {
    pub fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }

    /// Returns `true` if both coordinates address a column of the cube.
    pub fn in_bounds(self) -> bool {
        usize::from(self.x) < SIZE && usize::from(self.y) < SIZE
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A single cell, as reported in `winning_coords` (`[x, y, z]` on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct Coord {
    pub x: u8,
    pub y: u8,
    pub z: u8,
}

impl From<[u8; 3]> for Coord {
    fn from([x, y, z]: [u8; 3]) -> Self {
        Self { x, y, z }
    }
}

impl From<Coord> for [u8; 3] {
    fn from(c: Coord) -> Self {
        [c.x, c.y, c.z]
    }
}

/// Snapshot of the 4×4×4 board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    cells: [[[u8; SIZE]; SIZE]; SIZE],
}

impl Board {
    /// An empty board.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a board from raw `[z][y][x]` cells.
    pub fn from_cells(cells: [[[u8; SIZE]; SIZE]; SIZE]) -> Self {
        Self { cells }
    }

    /// Raw `[z][y][x]` cells.
    pub fn cells(&self) -> &[[[u8; SIZE]; SIZE]; SIZE] {
        &self.cells
    }

    /// The cell at `(x, y, z)`, or `None` if out of range.
    pub fn cell(&self, x: usize, y: usize, z: usize) -> Option<u8> {
        self.cells.get(z)?.get(y)?.get(x).copied()
    }

    /// Sets the cell at `(x, y, z)`. Out-of-range writes are ignored.
    pub fn set(&mut self, x: usize, y: usize, z: usize, value: u8) {
        if let Some(cell) = self
            .cells
            .get_mut(z)
            .and_then(|level| level.get_mut(y))
            .and_then(|row| row.get_mut(x))
        {
            *cell = value;
        }
    }

    /// Returns `true` if no level of the column `(x, y)` is empty.
    ///
    /// Out-of-range columns count as full: nothing can be placed there.
    pub fn is_column_full(&self, column: Column) -> bool {
        let (x, y) = (usize::from(column.x), usize::from(column.y));
        (0..SIZE).all(|z| self.cell(x, y, z).is_none_or(|c| c != 0))
    }

    /// The first column with an open level, scanning `y` ascending, then `x`
    /// ascending, then level. `None` means the board is full.
    pub fn first_open_column(&self) -> Option<Column> {
        for y in 0..SIZE {
            for x in 0..SIZE {
                for z in 0..SIZE {
                    if self.cell(x, y, z) == Some(0) {
                        return Some(Column::new(x as u8, y as u8));
                    }
                }
            }
        }
        None
    }

    /// Returns `true` if every cell is occupied.
    pub fn is_full(&self) -> bool {
        self.first_open_column().is_none()
    }

    /// Number of occupied cells.
    pub fn stones(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .flatten()
            .filter(|&&c| c != 0)
            .count()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn full_board() -> Board {
        Board::from_cells([[[1; SIZE]; SIZE]; SIZE])
    }

    #[test]
    fn first_open_column_scans_row_major() {
        // Fill row 0 columns 0 and 1 completely, and column (2, 0) up to level 0.
        let mut board = full_board();
        for y in 0..SIZE {
            for x in 0..SIZE {
                for z in 0..SIZE {
                    let keep = y == 0 && x < 2 || (y == 0 && x == 2 && z == 0);
                    if !keep {
                        board.set(x, y, z, 0);
                    }
                }
            }
        }
        // First open cell is row 0, column 2, level 1.
        assert_eq!(board.cell(2, 0, 1), Some(0));
        assert_eq!(board.first_open_column(), Some(Column::new(2, 0)));
    }

    #[test]
    fn first_open_column_prefers_lower_row_over_lower_column() {
        let mut board = full_board();
        board.set(3, 0, 3, 0);
        board.set(0, 1, 0, 0);
        assert_eq!(board.first_open_column(), Some(Column::new(3, 0)));
    }

    #[test]
    fn full_board_has_no_open_column() {
        let board = full_board();
        assert!(board.is_full());
        assert_eq!(board.first_open_column(), None);
    }

    #[test]
    fn column_full_checks_every_level() {
        let mut board = Board::empty();
        let col = Column::new(1, 2);
        assert!(!board.is_column_full(col));
        for z in 0..SIZE {
            board.set(1, 2, z, 2);
        }
        assert!(board.is_column_full(col));
        assert!(board.is_column_full(Column::new(4, 0)));
    }

    #[test]
    fn board_json_is_level_row_column() {
        let mut board = Board::empty();
        board.set(3, 1, 0, 1);
        let json = serde_json::to_value(board).unwrap();
        assert_eq!(json[0][1][3], 1);
        let back: Board = serde_json::from_value(json).unwrap();
        assert_eq!(back, board);
        assert_eq!(back.stones(), 1);
    }

    #[test]
    fn coord_uses_triple_wire_format() {
        let c: Coord = serde_json::from_str("[1, 2, 3]").unwrap();
        assert_eq!(c, Coord { x: 1, y: 2, z: 3 });
    }

    #[test]
    fn side_numbers_and_labels() {
        assert_eq!(Side::from_number(2), Some(Side::Two));
        assert_eq!(Side::from_number(3), None);
        assert_eq!(Side::One.other(), Side::Two);
        assert_eq!(Side::Two.to_string(), "Player 2");
        assert_eq!(Side::One.colour(), "black");
    }
}
