//! Area scoring: stones plus surrounded empty regions, komi charged to black.
use crate::game::board::{neighbors, Board, Location};
use crate::game::{Cell, Color};
use std::collections::HashSet;
use std::fmt::{Display, Formatter};

/// final score of both colors
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Score {
    pub black: f64,
    pub white: f64,
}

impl Score {
    /// the color with the higher score, `None` on an exact tie
    pub fn leader(&self) -> Option<Color> {
        if self.black > self.white {
            Some(Color::Black)
        } else if self.white > self.black {
            Some(Color::White)
        } else {
            None
        }
    }
}

impl Display for Score {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}; {}", self.black, self.white)
    }
}

/// A maximal connected set of empty intersections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub cells: Vec<Location>,
    /// the only color bordering the region; `None` for dame or a region with no stone around it
    pub owner: Option<Color>,
}

/// every empty region of the board, seeded in row-major order
pub fn empty_regions(board: &Board) -> Vec<Region> {
    let dimension = board.dimension();
    let cells = board.cells();
    let mut visited = vec![false; cells.len()];
    let mut regions = Vec::new();
    for seed in 0..cells.len() {
        if cells[seed] != Cell::Empty || visited[seed] {
            continue;
        }
        let mut region = Vec::new();
        let mut borders = HashSet::new();
        let mut worklist = vec![seed];
        visited[seed] = true;
        while let Some(current) = worklist.pop() {
            region.push(current);
            for n in neighbors(dimension, current) {
                match cells[n].color() {
                    Some(color) => {
                        borders.insert(color);
                    }
                    None if !visited[n] => {
                        visited[n] = true;
                        worklist.push(n);
                    }
                    None => {}
                }
            }
        }
        let owner = match (borders.contains(&Color::Black), borders.contains(&Color::White)) {
            (true, false) => Some(Color::Black),
            (false, true) => Some(Color::White),
            _ => None,
        };
        regions.push(Region {
            cells: region,
            owner,
        });
    }
    regions
}

/// Score a finished board: one point per stone, territory for regions bordered
/// by a single color, and `komi` subtracted from black.
pub fn score(board: &Board, komi: f64) -> Score {
    let mut black = board.count(Color::Black);
    let mut white = board.count(Color::White);
    for region in empty_regions(board) {
        match region.owner {
            Some(Color::Black) => black += region.cells.len(),
            Some(Color::White) => white += region.cells.len(),
            None => {}
        }
    }
    Score {
        black: black as f64 - komi,
        white: white as f64,
    }
}
