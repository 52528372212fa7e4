//! Group connectivity and capture resolution.
//!
//! Flood fills use an explicit worklist and a visited set, never recursion.
use crate::game::board::{neighbors, Board, Location};
use crate::game::{Cell, Color};
use std::collections::HashSet;

/// A maximal 4-connected set of same-colored stones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub color: Color,
    pub stones: Vec<Location>,
    pub liberties: HashSet<Location>,
}

impl Group {
    pub fn is_captured(&self) -> bool {
        self.liberties.is_empty()
    }
}

/// the group containing `seed`, `None` if `seed` is empty or off the board
pub fn group_at(board: &Board, seed: Location) -> Option<Group> {
    let color = board.get(seed)?.color()?;
    let mut visited = vec![false; board.len()];
    let (stones, liberties) = flood_group(board.dimension(), board.cells(), seed, &mut visited);
    Some(Group {
        color,
        stones,
        liberties,
    })
}

/// Remove every captured group after `mover` placed a stone.
///
/// Opponent groups are resolved first; only then are the mover's own groups
/// checked, so a placement that captures keeps its stone, and a placement that
/// captures nothing and has no liberty removes itself.
pub fn resolve_captures(board: &Board, mover: Color) -> Board {
    let dimension = board.dimension();
    let mut cells = board.cells().to_vec();
    remove_dead_groups(dimension, &mut cells, mover.switch());
    remove_dead_groups(dimension, &mut cells, mover);
    Board::from_cells(dimension, cells)
}

/// scan `color` groups in row-major seed order and clear those without liberties
fn remove_dead_groups(dimension: usize, cells: &mut [Cell], color: Color) {
    let target = Cell::from(color);
    let mut visited = vec![false; cells.len()];
    let mut dead = Vec::new();
    for seed in 0..cells.len() {
        if cells[seed] != target || visited[seed] {
            continue;
        }
        let (stones, liberties) = flood_group(dimension, cells, seed, &mut visited);
        if liberties.is_empty() {
            dead.extend(stones);
        }
    }
    // distinct groups of one color are never adjacent, so clearing after the
    // scan matches clearing during it
    for location in dead {
        cells[location] = Cell::Empty;
    }
}

/// collect the stones and liberties of the group at `seed`, marking members visited
fn flood_group(
    dimension: usize,
    cells: &[Cell],
    seed: Location,
    visited: &mut [bool],
) -> (Vec<Location>, HashSet<Location>) {
    let color = cells[seed];
    let mut stones = Vec::new();
    let mut liberties = HashSet::new();
    let mut worklist = vec![seed];
    visited[seed] = true;
    while let Some(current) = worklist.pop() {
        stones.push(current);
        for n in neighbors(dimension, current) {
            match cells[n] {
                Cell::Empty => {
                    liberties.insert(n);
                }
                c if c == color && !visited[n] => {
                    visited[n] = true;
                    worklist.push(n);
                }
                _ => {}
            }
        }
    }
    (stones, liberties)
}

#[cfg(test)]
mod test_capture {
    use super::*;
    use crate::game::Color::{Black, White};
    use quickcheck::{Arbitrary, Gen};
    use quickcheck_macros::quickcheck;

    fn board(s: &str) -> Board {
        s.parse().unwrap()
    }

    /// a random position plus a move on it
    #[derive(Clone, Debug)]
    struct Position {
        board: Board,
        location: Location,
        color: Color,
    }

    impl Arbitrary for Position {
        fn arbitrary<G: Gen>(g: &mut G) -> Position {
            let dimension = usize::arbitrary(g) % 6 + 2;
            let cells = (0..dimension * dimension)
                .map(|_| match u8::arbitrary(g) % 3 {
                    0 => Cell::Black,
                    1 => Cell::White,
                    _ => Cell::Empty,
                })
                .collect();
            let color = if bool::arbitrary(g) { Black } else { White };
            Position {
                board: Board::from_cells(dimension, cells),
                location: usize::arbitrary(g) % (dimension * dimension),
                color,
            }
        }
    }

    /// mirror the board along its main diagonal
    fn transpose(board: &Board) -> Board {
        let d = board.dimension();
        let cells = (0..d * d)
            .map(|l| board.cells()[(l % d) * d + l / d])
            .collect();
        Board::from_cells(d, cells)
    }

    #[test]
    fn test_group_and_liberties() {
        // B B U
        // W B U
        // U U U
        let b = board("BBUWBUUUU");
        let group = group_at(&b, 0).unwrap();
        let mut stones = group.stones.clone();
        stones.sort_unstable();
        assert_eq!(group.color, Black);
        assert_eq!(stones, vec![0, 1, 4]);
        assert_eq!(group.liberties.len(), 3);
        assert_eq!(group_at(&b, 2), None);
        assert_eq!(group_at(&b, 3).unwrap().liberties.len(), 1);
    }

    #[test]
    fn test_single_capture() {
        // U B U
        // B W B
        // U U U   black plays 7 and captures the white stone at 4
        let before = board("UBUBWBUUU");
        let placed = before.place(7, Black).unwrap();
        let after = resolve_captures(&placed, Black);
        assert_eq!(after, board("UBUBUBUBU"));
        assert_eq!(after.count(White), before.count(White) - 1);
    }

    #[test]
    fn test_encircled_stone_on_2x2() {
        // B W
        // U U   black fills 3, the last liberty of the white stone
        let before = board("BWUU");
        let placed = before.place(3, Black).unwrap();
        let after = resolve_captures(&placed, Black);
        assert_eq!(after, board("BUUB"));
        let stones = |b: &Board| b.count(Black) + b.count(White);
        assert_eq!(stones(&after), stones(&placed) - 1);
    }

    #[test]
    fn test_capture_before_suicide() {
        // U W B
        // W B U
        // B U U   black plays 0: no liberty of its own, but captures white 1 and 3
        let before = board("UWBWBUBUU");
        let placed = before.place(0, Black).unwrap();
        let after = resolve_captures(&placed, Black);
        assert_eq!(after.get(0), Some(Cell::Black));
        assert_eq!(after.get(1), Some(Cell::Empty));
        assert_eq!(after.get(3), Some(Cell::Empty));
    }

    #[test]
    fn test_multiple_disjoint_captures() {
        // U W B U
        // W B U U
        // B U U U
        // U U U U   black at 0 captures two separate white stones at once
        let before = board("UWBUWBUUBUUUUUUU");
        let after = resolve_captures(&before.place(0, Black).unwrap(), Black);
        assert_eq!(after.count(White), 0);
        assert_eq!(after.get(0), Some(Cell::Black));
    }

    #[test]
    fn test_pure_self_capture_removes_stone() {
        // U W U
        // W U U
        // U U U   black at 0 has no liberty and captures nothing
        let before = board("UWUWUUUUU");
        let after = resolve_captures(&before.place(0, Black).unwrap(), Black);
        assert_eq!(after, before);
    }

    #[test]
    fn test_group_suicide_removes_whole_group() {
        // B W U
        // U W U
        // W U U   black at 3 joins 0 and the pair has no liberty
        let before = board("BWUUWUWUU");
        let after = resolve_captures(&before.place(3, Black).unwrap(), Black);
        assert_eq!(after.count(Black), 0);
        assert_eq!(after.count(White), 3);
    }

    #[test]
    fn test_unrelated_dead_groups_are_cleared() {
        // a zero-liberty opponent group anywhere on the board is removed,
        // not only the ones touching the placed stone
        let before = board("WBUBUUUUU");
        let after = resolve_captures(&before.place(8, Black).unwrap(), Black);
        assert_eq!(after.get(0), Some(Cell::Empty));
    }

    #[quickcheck]
    fn no_group_without_liberties_survives(position: Position) -> bool {
        let placed = match position.board.place(position.location, position.color) {
            Ok(b) => b,
            Err(_) => position.board.clone(),
        };
        let after = resolve_captures(&placed, position.color);
        (0..after.len())
            .filter_map(|l| group_at(&after, l))
            .all(|g| !g.is_captured())
    }

    #[quickcheck]
    fn resolution_is_idempotent(position: Position) -> bool {
        let once = resolve_captures(&position.board, position.color);
        resolve_captures(&once, position.color) == once
    }

    #[quickcheck]
    fn resolution_ignores_scan_order(position: Position) -> bool {
        // transposing changes the row-major seed order but not connectivity
        let resolved = resolve_captures(&position.board, position.color);
        resolve_captures(&transpose(&position.board), position.color) == transpose(&resolved)
    }

    #[test]
    fn test_extreme_board_sizes() {
        // black fills the last point of a full white board and takes everything
        let d = 25;
        let mut cells = vec![Cell::White; d * d];
        cells[0] = Cell::Empty;
        let placed = Board::from_cells(d, cells).place(0, Black).unwrap();
        let after = resolve_captures(&placed, Black);
        assert_eq!(after.count(White), 0);
        assert_eq!(after.count(Black), 1);

        // a lone stone on 1x1 has no liberty and removes itself
        let single = Board::empty(1).place(0, White).unwrap();
        assert_eq!(resolve_captures(&single, White), Board::empty(1));
    }
}
