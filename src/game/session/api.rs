use crate::game::session::messages::MatchMessage;
use crate::game::{Color, Score, MAX_DIMENSION};
use async_std::channel::Sender;
use bincode::{Decode, Encode};
use futures::Stream;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use thiserror::Error;

/// The capability a match needs from each of its two players.
///
/// The stream yields every line the player sends. It ends when the player
/// disconnects, which is how a match notices a dropped connection even while
/// it is blocked on the other player.
pub trait PlayerChannel: Stream<Item = String> + Unpin + Send {
    /// outgoing message type of the underlying connection
    type Msg: From<MatchMessage> + Send + 'static;

    fn name(&self) -> &str;

    fn sender(&self) -> Sender<Self::Msg>;
}

/// Settings of a single match, shared by every match the server starts.
///
/// `move_timeout` of `None` waits forever for a reply.
#[derive(Clone, PartialEq, Debug)]
pub struct MatchConfig {
    pub dimension: usize,
    pub komi: f64,
    pub move_timeout: Option<Duration>,
}

/// 9×9 with half a point of komi and one minute per move
impl Default for MatchConfig {
    fn default() -> Self {
        MatchConfig {
            dimension: 9,
            komi: 0.5,
            move_timeout: Some(Duration::from_secs(60)),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum InvalidConfig {
    #[error("board dimension {0} is not within 1..={}", MAX_DIMENSION)]
    Dimension(usize),
    #[error("komi must be a finite number, got {0}")]
    Komi(f64),
}

impl MatchConfig {
    pub fn validate(&self) -> Result<(), InvalidConfig> {
        if self.dimension == 0 || self.dimension > MAX_DIMENSION {
            return Err(InvalidConfig::Dimension(self.dimension));
        }
        if !self.komi.is_finite() {
            return Err(InvalidConfig::Komi(self.komi));
        }
        Ok(())
    }
}

/// why a match ended
#[derive(Clone, Copy, Debug, PartialEq, Eq, Encode, Decode)]
pub enum EndReason {
    /// two consecutive passes
    Finished,
    /// a player's connection closed or timed out
    Disconnect,
    /// a malformed reply or an illegal move
    Cheat,
    Quit,
}

impl Display for EndReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            EndReason::Finished => f.write_str("Finished"),
            EndReason::Disconnect => f.write_str("Disconnect"),
            EndReason::Cheat => f.write_str("Cheat"),
            EndReason::Quit => f.write_str("Quit"),
        }
    }
}

/// The terminal result of a match. `winner` is `None` for a draw.
#[derive(Clone, Debug, PartialEq)]
pub struct Outcome {
    pub reason: EndReason,
    pub winner: Option<Color>,
    pub score: Score,
}
