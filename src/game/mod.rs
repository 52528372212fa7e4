mod board;
mod capture;
mod history;
mod rules;
pub mod session;
mod territory;

use bincode::{Decode, Encode};
use std::fmt::{Display, Formatter};

/// Represents player color (black or white)
#[derive(Clone, PartialEq, Eq, Copy, Debug, Hash, Encode, Decode)]
#[repr(u8)]
pub enum Color {
    Black = 1,
    White = 2,
}

impl Color {
    pub fn switch(&self) -> Self {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Color::Black => f.write_str("BLACK"),
            Color::White => f.write_str("WHITE"),
        }
    }
}

/// represents an intersection: Black, White, Empty
#[derive(Clone, PartialEq, Eq, Copy, Debug, Hash)]
#[repr(u8)]
pub enum Cell {
    Black = 1,
    White = 2,
    Empty = 3,
}

impl Cell {
    /// wire symbol of the cell
    pub fn symbol(&self) -> char {
        match self {
            Cell::Black => 'B',
            Cell::White => 'W',
            Cell::Empty => 'U',
        }
    }

    pub fn from_symbol(symbol: char) -> Option<Cell> {
        match symbol {
            'B' => Some(Cell::Black),
            'W' => Some(Cell::White),
            'U' => Some(Cell::Empty),
            _ => None,
        }
    }

    /// `None` for an empty cell
    pub fn color(&self) -> Option<Color> {
        match self {
            Cell::Black => Some(Color::Black),
            Cell::White => Some(Color::White),
            Cell::Empty => None,
        }
    }
}

impl From<Color> for Cell {
    #[inline(always)]
    fn from(c: Color) -> Self {
        match c {
            Color::Black => Cell::Black,
            Color::White => Cell::White,
        }
    }
}

pub use board::{neighbors, Board, BoardParseError, InvalidLocation, Location, MAX_DIMENSION};
pub use capture::{group_at, resolve_captures, Group};
pub use history::History;
pub use rules::{IllegalMove, Move, MoveValidator, Play};
pub use territory::{empty_regions, score, Region, Score};
