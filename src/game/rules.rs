//! Move legality: bounds, occupancy, capture and whole-history repetition.
use crate::game::board::{Board, InvalidLocation, Location};
use crate::game::capture::resolve_captures;
use crate::game::history::History;
use crate::game::Color;
use std::fmt::{Display, Formatter};
use thiserror::Error;

/// A move as sent on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Move {
    Place(Location),
    Pass,
    Quit,
}

impl Display for Move {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Move::Place(location) => write!(f, "{}", location),
            Move::Pass => f.write_str("PASS"),
            Move::Quit => f.write_str("QUIT"),
        }
    }
}

/// Game-rule violations. Each one forfeits the match.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IllegalMove {
    #[error("move `{0}` is not an integer")]
    NotAnInteger(String),
    #[error("location {0} is off the board")]
    OutOfBounds(String),
    #[error("location {0} is already occupied")]
    Occupied(Location),
    #[error("playing at {0} repeats an earlier position")]
    PositionRepeated(Location),
}

/// The accepted form of a move.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Play {
    /// a stone was placed; `board` has captures already resolved
    Place { location: Location, board: Board },
    Pass,
    Quit,
}

/// Judges candidate moves against the current board and the match history.
pub struct MoveValidator<'a> {
    board: &'a Board,
    history: &'a History,
}

impl<'a> MoveValidator<'a> {
    pub fn new(board: &'a Board, history: &'a History) -> Self {
        MoveValidator { board, history }
    }

    /// Parse a move token. `PASS` and `QUIT` are recognized first; anything
    /// else must be an in-bounds integer.
    pub fn parse(&self, token: &str) -> Result<Move, IllegalMove> {
        let token = token.trim();
        match token {
            "PASS" => return Ok(Move::Pass),
            "QUIT" => return Ok(Move::Quit),
            _ => {}
        }
        if !is_integer(token) {
            return Err(IllegalMove::NotAnInteger(token.to_string()));
        }
        // negative numbers and values past usize are integers, but never on the board
        match token.parse::<Location>() {
            Ok(location) if self.board.in_bounds(location) => Ok(Move::Place(location)),
            _ => Err(IllegalMove::OutOfBounds(token.to_string())),
        }
    }

    /// Place `color` at `location`, resolve captures and reject repeated positions.
    pub fn check_place(&self, location: Location, color: Color) -> Result<Board, IllegalMove> {
        let placed = self.board.place(location, color).map_err(|e| match e {
            InvalidLocation::OutOfBounds(l) => IllegalMove::OutOfBounds(l.to_string()),
            InvalidLocation::Occupied(l) => IllegalMove::Occupied(l),
        })?;
        let candidate = resolve_captures(&placed, color);
        if self.history.contains(&candidate) {
            return Err(IllegalMove::PositionRepeated(location));
        }
        Ok(candidate)
    }

    /// parse and check a raw move token for `color`
    pub fn validate(&self, token: &str, color: Color) -> Result<Play, IllegalMove> {
        match self.parse(token)? {
            Move::Pass => Ok(Play::Pass),
            Move::Quit => Ok(Play::Quit),
            Move::Place(location) => Ok(Play::Place {
                location,
                board: self.check_place(location, color)?,
            }),
        }
    }
}

/// an optional sign followed by at least one ascii digit
fn is_integer(token: &str) -> bool {
    let digits = token.strip_prefix(&['+', '-'][..]).unwrap_or(token);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod test_rules {
    use super::*;
    use crate::game::Color::{Black, White};

    fn board(s: &str) -> Board {
        s.parse().unwrap()
    }

    #[test]
    fn test_corner_then_occupied() {
        let empty = Board::empty(5);
        let history = History::new(empty.clone());
        let first = match MoveValidator::new(&empty, &history).validate("0", Black) {
            Ok(Play::Place { location, board }) => {
                assert_eq!(location, 0);
                board
            }
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(first.count(Black), 1);
        assert_eq!(first.count(White), 0);

        let mut history = history;
        history.push(first.clone());
        assert_eq!(
            MoveValidator::new(&first, &history).validate("0", White),
            Err(IllegalMove::Occupied(0))
        );
    }

    #[test]
    fn test_pass_and_quit_bypass_board() {
        let full = board("BBBB");
        let history = History::new(Board::empty(2));
        let validator = MoveValidator::new(&full, &history);
        assert_eq!(validator.validate("PASS", White), Ok(Play::Pass));
        assert_eq!(validator.validate(" QUIT ", White), Ok(Play::Quit));
    }

    #[test]
    fn test_token_errors_in_order() {
        let empty = Board::empty(3);
        let history = History::new(empty.clone());
        let validator = MoveValidator::new(&empty, &history);
        assert_eq!(
            validator.validate("a1", Black),
            Err(IllegalMove::NotAnInteger("a1".to_string()))
        );
        assert_eq!(
            validator.validate("", Black),
            Err(IllegalMove::NotAnInteger("".to_string()))
        );
        assert_eq!(
            validator.validate("1.5", Black),
            Err(IllegalMove::NotAnInteger("1.5".to_string()))
        );
        assert_eq!(
            validator.validate("9", Black),
            Err(IllegalMove::OutOfBounds("9".to_string()))
        );
        assert_eq!(
            validator.validate("-1", Black),
            Err(IllegalMove::OutOfBounds("-1".to_string()))
        );
        assert_eq!(
            validator.validate("99999999999999999999999", Black),
            Err(IllegalMove::OutOfBounds("99999999999999999999999".to_string()))
        );
        assert_eq!(validator.parse("8"), Ok(Move::Place(8)));
    }

    #[test]
    fn test_signed_tokens() {
        let empty = Board::empty(3);
        let history = History::new(empty.clone());
        let validator = MoveValidator::new(&empty, &history);
        assert_eq!(validator.parse("+5"), Ok(Move::Place(5)));
        assert_eq!(
            validator.parse("+"),
            Err(IllegalMove::NotAnInteger("+".to_string()))
        );
        assert_eq!(
            validator.parse("+-1"),
            Err(IllegalMove::NotAnInteger("+-1".to_string()))
        );
        assert_eq!(
            validator.parse("+9"),
            Err(IllegalMove::OutOfBounds("+9".to_string()))
        );
    }

    #[test]
    fn test_ko_recapture_is_rejected() {
        // U B W U
        // B W U W
        // U B W U
        // U U U U   black takes at 6, white retaking at 5 would restore the board
        let start = board("UBWUBWUWUBWUUUUU");
        let mut history = History::new(start.clone());
        let after_take = MoveValidator::new(&start, &history)
            .check_place(6, Black)
            .unwrap();
        assert_eq!(after_take.get(5), Some(crate::game::Cell::Empty));
        history.push(after_take.clone());
        assert_eq!(
            MoveValidator::new(&after_take, &history).check_place(5, White),
            Err(IllegalMove::PositionRepeated(5))
        );
    }

    #[test]
    fn test_repetition_of_an_older_position() {
        // W B
        // B U   black at 3 captures the white stone and recreates ply 1,
        //       which is not the latest board
        let current = board("WBBU");
        let mut history = History::new(Board::empty(2));
        history.push(board("UBBB"));
        history.push(current.clone());
        assert_eq!(
            MoveValidator::new(&current, &history).check_place(3, Black),
            Err(IllegalMove::PositionRepeated(3))
        );

        let fresh = History::new(current.clone());
        assert_eq!(
            MoveValidator::new(&current, &fresh).check_place(3, Black),
            Ok(board("UBBB"))
        );
    }

    #[test]
    fn test_pure_self_capture_repeats_current_board() {
        // U W
        // W U   black at 0 removes itself, leaving the board as it was
        let current = board("UWWU");
        let history = History::new(current.clone());
        assert_eq!(
            MoveValidator::new(&current, &history).check_place(0, Black),
            Err(IllegalMove::PositionRepeated(0))
        );
    }
}
