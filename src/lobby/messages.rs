//! Handshake messages, and the server's wrapper around match messages.
//!
//! - a connection is expected to start with `JOIN; version; name`.
//! - disconnection without `MOVE; QUIT` is considered as disconnection.
use crate::game::session::{check_field_count, split_fields, FramingError, MatchMessage};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// the only protocol version this server speaks
pub const PROTOCOL_VERSION: &str = "1";

/// Lines sent by a client.
#[derive(Clone, PartialEq, Debug)]
pub enum Messages {
    /// `JOIN; version; name`
    Join { version: String, name: String },
    /// `MOVE; location | PASS | QUIT`
    Move(String),
}

/// Lines sent to a client.
#[derive(Clone, PartialEq, Debug)]
pub enum Responses {
    /// handshake accepted, with the player's archived record
    Welcome {
        name: String,
        wins: u32,
        losses: u32,
    },
    /// first player of a match, waiting for an opponent
    Wait { dimension: usize, komi: f64 },
    /// handshake failure
    Error(String),
    Match(MatchMessage),
}

impl FromStr for Messages {
    type Err = FramingError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let (command, args) = split_fields(line)?;
        match command {
            "JOIN" => {
                check_field_count(command, &args, 3)?;
                Ok(Messages::Join {
                    version: args[0].to_string(),
                    name: args[1].to_string(),
                })
            }
            "MOVE" => {
                check_field_count(command, &args, 2)?;
                Ok(Messages::Move(args[0].to_string()))
            }
            _ => Err(FramingError::UnknownCommand(command.to_string())),
        }
    }
}

impl Display for Messages {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Messages::Join { version, name } => write!(f, "JOIN; {}; {}", version, name),
            Messages::Move(token) => write!(f, "MOVE; {}", token),
        }
    }
}

impl Display for Responses {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Responses::Welcome { name, wins, losses } => {
                write!(f, "WELCOME; {}; {}; {}", name, wins, losses)
            }
            Responses::Wait { dimension, komi } => write!(f, "WAIT; {}; {}", dimension, komi),
            Responses::Error(e) => write!(f, "ERROR; {}", e.replace(';', ",")),
            Responses::Match(m) => Display::fmt(m, f),
        }
    }
}

impl From<MatchMessage> for Responses {
    fn from(m: MatchMessage) -> Self {
        Responses::Match(m)
    }
}

impl From<Responses> for String {
    fn from(r: Responses) -> Self {
        r.to_string()
    }
}

impl From<Messages> for String {
    fn from(m: Messages) -> Self {
        m.to_string()
    }
}

#[cfg(test)]
mod test_lobby_messages {
    use super::*;
    use crate::game::{Board, Color};

    #[test]
    fn test_parse_messages() {
        assert_eq!(
            "JOIN; 1; alice".parse::<Messages>(),
            Ok(Messages::Join {
                version: "1".to_string(),
                name: "alice".to_string()
            })
        );
        assert_eq!(
            " MOVE ;PASS ".parse::<Messages>(),
            Ok(Messages::Move("PASS".to_string()))
        );
        assert_eq!(
            "JOIN; alice".parse::<Messages>(),
            Err(FramingError::FieldCount {
                command: "JOIN".to_string(),
                expected: 3,
                found: 2
            })
        );
        assert_eq!(
            "HELLO".parse::<Messages>(),
            Err(FramingError::UnknownCommand("HELLO".to_string()))
        );
        assert_eq!("".parse::<Messages>(), Err(FramingError::Empty));
    }

    #[test]
    fn test_messages_round_trip_through_text() {
        let join = Messages::Join {
            version: PROTOCOL_VERSION.to_string(),
            name: "bob".to_string(),
        };
        assert_eq!(String::from(join.clone()), "JOIN; 1; bob");
        assert_eq!(String::from(join.clone()).parse::<Messages>(), Ok(join));
    }

    #[test]
    fn test_responses_format() {
        assert_eq!(
            String::from(Responses::Welcome {
                name: "alice".to_string(),
                wins: 3,
                losses: 1
            }),
            "WELCOME; alice; 3; 1"
        );
        assert_eq!(
            String::from(Responses::Wait {
                dimension: 9,
                komi: 6.5
            }),
            "WAIT; 9; 6.5"
        );
        assert_eq!(
            String::from(Responses::Error("name; taken".to_string())),
            "ERROR; name, taken"
        );
        assert_eq!(
            String::from(Responses::from(MatchMessage::Game {
                board: Board::empty(2),
                color: Color::Black
            })),
            "GAME; UUUU; BLACK"
        );
    }
}
