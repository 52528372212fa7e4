//! Line framing and the messages a match sends to its players.
//!
//! A line is a list of `;`-separated fields, each trimmed of surrounding
//! whitespace. The first field names the command.
use crate::game::session::api::EndReason;
use crate::game::{Board, Color, Move, Score};
use std::fmt::{Display, Formatter};
use thiserror::Error;

/// a line that does not have the shape of any known command
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FramingError {
    #[error("empty message")]
    Empty,
    #[error("unknown command `{0}`")]
    UnknownCommand(String),
    #[error("{command} takes {expected} fields, got {found}")]
    FieldCount {
        command: String,
        expected: usize,
        found: usize,
    },
}

/// split a line into its command and argument fields
pub fn split_fields(line: &str) -> Result<(&str, Vec<&str>), FramingError> {
    let mut fields = line.split(';').map(str::trim);
    let command = match fields.next() {
        Some(c) if !c.is_empty() => c,
        _ => return Err(FramingError::Empty),
    };
    Ok((command, fields.collect()))
}

/// `args.len()` must equal `expected`, counting the command itself
pub fn check_field_count(command: &str, args: &[&str], expected: usize) -> Result<(), FramingError> {
    let found = args.len() + 1;
    if found != expected {
        return Err(FramingError::FieldCount {
            command: command.to_string(),
            expected,
            found,
        });
    }
    Ok(())
}

/// the move token of a `MOVE; token` reply
pub fn parse_move_reply(line: &str) -> Result<&str, FramingError> {
    let (command, args) = split_fields(line)?;
    if command != "MOVE" {
        return Err(FramingError::UnknownCommand(command.to_string()));
    }
    check_field_count(command, &args, 2)?;
    Ok(args[0])
}

/// Messages a match sends to one of its players.
#[derive(Clone, Debug, PartialEq)]
pub enum MatchMessage {
    /// match started, with the player's color
    Game { board: Board, color: Color },
    /// your move, with the opponent's last move (`None` on the first turn)
    Turn { board: Board, last_move: Option<Move> },
    /// the reply was accepted, with the board after it
    Valid(Board),
    /// the reply forfeits the match
    Invalid(String),
    /// `winner` is the winner's name, `None` for a draw
    End {
        reason: EndReason,
        winner: Option<String>,
        score: Score,
    },
}

/// keep free text from breaking the line framing
fn field(text: &str) -> String {
    text.replace(|c| c == ';' || c == '\n' || c == '\r', " ")
}

impl Display for MatchMessage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchMessage::Game { board, color } => write!(f, "GAME; {}; {}", board, color),
            MatchMessage::Turn { board, last_move } => match last_move {
                Some(m) => write!(f, "TURN; {}; {}", board, m),
                None => write!(f, "TURN; {}; null", board),
            },
            MatchMessage::Valid(board) => write!(f, "RESULT; VALID; {}", board),
            MatchMessage::Invalid(reason) => write!(f, "RESULT; INVALID; {}", field(reason)),
            MatchMessage::End {
                reason,
                winner,
                score,
            } => write!(
                f,
                "END; {}; {}; {}",
                reason,
                winner.as_deref().map(field).unwrap_or_else(|| "DRAW".to_string()),
                score
            ),
        }
    }
}

impl From<MatchMessage> for String {
    fn from(m: MatchMessage) -> Self {
        m.to_string()
    }
}
