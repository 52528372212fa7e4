use crate::game::{Cell, Color};
use std::fmt::{Debug, Display, Formatter, Write};
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Row-major index of an intersection.
pub type Location = usize;

/// largest board accepted by the server
pub const MAX_DIMENSION: usize = 25;

/// An immutable square Go board.
///
/// Every rule operation takes a `Board` by reference and returns a new one,
/// so boards kept in history are never aliased by a later move.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Board {
    dimension: usize,
    cells: Arc<[Cell]>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidLocation {
    #[error("location {0} is off the board")]
    OutOfBounds(Location),
    #[error("location {0} is already occupied")]
    Occupied(Location),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BoardParseError {
    #[error("board of {0} cells is not a square")]
    NotSquare(usize),
    #[error("unknown cell symbol `{0}`")]
    UnknownSymbol(char),
}

impl Board {
    pub fn empty(dimension: usize) -> Self {
        Board {
            dimension,
            cells: vec![Cell::Empty; dimension * dimension].into(),
        }
    }

    /// build a board from row-major cells, `cells.len()` must be `dimension²`
    pub(crate) fn from_cells(dimension: usize, cells: Vec<Cell>) -> Self {
        debug_assert_eq!(cells.len(), dimension * dimension);
        Board {
            dimension,
            cells: cells.into(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// number of intersections
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|c| *c == Cell::Empty)
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn in_bounds(&self, location: Location) -> bool {
        location < self.cells.len()
    }

    pub fn get(&self, location: Location) -> Option<Cell> {
        self.cells.get(location).copied()
    }

    /// orthogonal neighbors inside the board
    pub fn neighbors(&self, location: Location) -> impl Iterator<Item = Location> {
        neighbors(self.dimension, location)
    }

    /// a copy of this board with `color` at `location`
    pub fn place(&self, location: Location, color: Color) -> Result<Board, InvalidLocation> {
        match self.get(location) {
            None => Err(InvalidLocation::OutOfBounds(location)),
            Some(Cell::Empty) => {
                let mut cells = self.cells.to_vec();
                cells[location] = color.into();
                Ok(Board::from_cells(self.dimension, cells))
            }
            Some(_) => Err(InvalidLocation::Occupied(location)),
        }
    }

    /// number of stones of `color`
    pub fn count(&self, color: Color) -> usize {
        let cell = Cell::from(color);
        self.cells.iter().filter(|c| **c == cell).count()
    }
}

/// Up to four orthogonally adjacent locations of a `dimension`-sized board.
///
/// Adjacency never wraps around a row edge.
pub fn neighbors(dimension: usize, location: Location) -> impl Iterator<Item = Location> {
    let size = dimension * dimension;
    let (row, col) = if dimension == 0 {
        (0, 0)
    } else {
        (location / dimension, location % dimension)
    };
    let valid = location < size;
    let up = (valid && row > 0).then(|| location - dimension);
    let down = (valid && row + 1 < dimension).then(|| location + dimension);
    let left = (valid && col > 0).then(|| location - 1);
    let right = (valid && col + 1 < dimension).then(|| location + 1);
    [up, down, left, right].into_iter().flatten()
}

impl Display for Board {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for c in self.cells.iter() {
            f.write_char(c.symbol())?;
        }
        Ok(())
    }
}

impl FromStr for Board {
    type Err = BoardParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cells = s
            .chars()
            .map(|c| Cell::from_symbol(c).ok_or(BoardParseError::UnknownSymbol(c)))
            .collect::<Result<Vec<_>, _>>()?;
        let dimension = (cells.len() as f64).sqrt().round() as usize;
        if dimension * dimension != cells.len() {
            return Err(BoardParseError::NotSquare(cells.len()));
        }
        Ok(Board::from_cells(dimension, cells))
    }
}

impl Debug for Board {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for row in self.cells.chunks(self.dimension.max(1)) {
            for c in row {
                match c {
                    Cell::Black => f.write_char('x')?,
                    Cell::White => f.write_char('o')?,
                    Cell::Empty => f.write_char('.')?,
                }
                f.write_char(' ')?;
            }
            f.write_char('\n')?;
        }
        Ok(())
    }
}
