use crate::game::board::Board;
use std::collections::HashMap;

/// Every board of a match indexed by ply, the empty start board at ply 0.
///
/// Boards are looked up by a crc32 of their wire form first, then compared
/// cell by cell, so a repetition check does not walk the whole game.
#[derive(Clone, Debug)]
pub struct History {
    boards: Vec<Board>,
    index: HashMap<u32, Vec<usize>>,
}

fn fingerprint(board: &Board) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&(board.dimension() as u32).to_le_bytes());
    hasher.update(board.to_string().as_bytes());
    hasher.finalize()
}

impl History {
    pub fn new(initial: Board) -> Self {
        let mut history = History {
            boards: Vec::new(),
            index: HashMap::new(),
        };
        history.push(initial);
        history
    }

    /// Append a board. Duplicates are accepted: a pass records the unchanged board.
    pub fn push(&mut self, board: Board) {
        let ply = self.boards.len();
        self.index.entry(fingerprint(&board)).or_default().push(ply);
        self.boards.push(board);
    }

    /// whether `board` occurred at any earlier ply
    pub fn contains(&self, board: &Board) -> bool {
        self.index
            .get(&fingerprint(board))
            .map(|plies| plies.iter().any(|&ply| self.boards[ply] == *board))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.boards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boards.is_empty()
    }
}
