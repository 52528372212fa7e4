use crate::game::session::api::{EndReason, MatchConfig, Outcome};
use crate::game::session::messages::parse_move_reply;
use crate::game::{score, Board, Color, History, Move, MoveValidator, Play};
#[allow(unused_imports)]
use log::trace;
use thiserror::Error;

/// Calls that do not fit the current state of a match.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MatchError {
    #[error("match {0} already has two players")]
    AlreadyStarted(u64),
    #[error("match {0} is not in progress")]
    NotInProgress(u64),
    #[error("it is not {1}'s turn in match {0}")]
    NotYourTurn(u64, Color),
}

/// What happened to a reply.
#[derive(Clone, Debug, PartialEq)]
pub enum Step {
    /// the placement or pass was accepted; the match may now be finished
    Accepted(Board),
    /// the reply was malformed or illegal and the match is forfeited
    Rejected(String),
    Quit,
}

#[derive(Clone, Debug)]
struct Progress {
    board: Board,
    history: History,
    turn: Color,
    passed: bool,
    last_move: Option<Move>,
}

#[derive(Clone, Debug)]
enum MatchState {
    AwaitingSecondPlayer,
    InProgress(Progress),
    Finished { board: Board, outcome: Outcome },
}

/// One match, from the first player's arrival to its outcome.
///
/// Pure state: no I/O happens here. `run_match` drives it over two
/// player channels.
#[derive(Clone, Debug)]
pub struct Match {
    id: u64,
    config: MatchConfig,
    first_player: String,
    black: Option<String>,
    white: Option<String>,
    state: MatchState,
}

impl Match {
    pub fn new(id: u64, config: MatchConfig, first_player: String) -> Self {
        Match {
            id,
            config,
            first_player,
            black: None,
            white: None,
            state: MatchState::AwaitingSecondPlayer,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn first_player(&self) -> &str {
        &self.first_player
    }

    /// a still unpaired match takes a new first player
    pub fn replace_first_player(&mut self, name: String) -> Result<(), MatchError> {
        match self.state {
            MatchState::AwaitingSecondPlayer => {
                self.first_player = name;
                Ok(())
            }
            _ => Err(MatchError::AlreadyStarted(self.id)),
        }
    }

    /// Pair the second player and start on an empty board with black to move.
    pub fn start(&mut self, second_player: String, first_is_black: bool) -> Result<(), MatchError> {
        if !matches!(self.state, MatchState::AwaitingSecondPlayer) {
            return Err(MatchError::AlreadyStarted(self.id));
        }
        let first = self.first_player.clone();
        let (black, white) = if first_is_black {
            (first, second_player)
        } else {
            (second_player, first)
        };
        self.black = Some(black);
        self.white = Some(white);
        let board = Board::empty(self.config.dimension);
        self.state = MatchState::InProgress(Progress {
            history: History::new(board.clone()),
            board,
            turn: Color::Black,
            passed: false,
            last_move: None,
        });
        Ok(())
    }

    pub fn player_name(&self, color: Color) -> Option<&str> {
        match color {
            Color::Black => self.black.as_deref(),
            Color::White => self.white.as_deref(),
        }
    }

    /// the color holding the turn, `None` unless in progress
    pub fn turn(&self) -> Option<Color> {
        match &self.state {
            MatchState::InProgress(p) => Some(p.turn),
            _ => None,
        }
    }

    pub fn board(&self) -> Option<&Board> {
        match &self.state {
            MatchState::AwaitingSecondPlayer => None,
            MatchState::InProgress(p) => Some(&p.board),
            MatchState::Finished { board, .. } => Some(board),
        }
    }

    /// the move made by the player who just moved
    pub fn last_move(&self) -> Option<Move> {
        match &self.state {
            MatchState::InProgress(p) => p.last_move,
            _ => None,
        }
    }

    /// whether the previous move was a pass
    pub fn passed(&self) -> bool {
        matches!(&self.state, MatchState::InProgress(p) if p.passed)
    }

    /// number of boards recorded so far, including the empty start board
    pub fn plies(&self) -> usize {
        match &self.state {
            MatchState::InProgress(p) => p.history.len(),
            _ => 0,
        }
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        match &self.state {
            MatchState::Finished { outcome, .. } => Some(outcome),
            _ => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.outcome().is_some()
    }

    /// Apply the raw reply line of `color`, which must hold the turn.
    pub fn apply_reply(&mut self, color: Color, line: &str) -> Result<Step, MatchError> {
        let id = self.id;
        let progress = match &mut self.state {
            MatchState::InProgress(p) => p,
            _ => return Err(MatchError::NotInProgress(id)),
        };
        if progress.turn != color {
            return Err(MatchError::NotYourTurn(id, color));
        }
        let token = match parse_move_reply(line) {
            Ok(token) => token,
            Err(e) => {
                let reason = e.to_string();
                self.finish(EndReason::Cheat, Some(color.switch()));
                return Ok(Step::Rejected(reason));
            }
        };
        let play = MoveValidator::new(&progress.board, &progress.history).validate(token, color);
        #[cfg(debug_assertions)]
        trace!("match {} {} plays {:?}", id, color, play);
        match play {
            Err(e) => {
                let reason = e.to_string();
                self.finish(EndReason::Cheat, Some(color.switch()));
                Ok(Step::Rejected(reason))
            }
            Ok(Play::Quit) => {
                self.finish(EndReason::Quit, Some(color.switch()));
                Ok(Step::Quit)
            }
            Ok(Play::Pass) if progress.passed => {
                let board = progress.board.clone();
                let winner = score(&board, self.config.komi).leader();
                self.finish(EndReason::Finished, winner);
                Ok(Step::Accepted(board))
            }
            Ok(Play::Pass) => {
                progress.passed = true;
                progress.history.push(progress.board.clone());
                progress.last_move = Some(Move::Pass);
                progress.turn = color.switch();
                Ok(Step::Accepted(progress.board.clone()))
            }
            Ok(Play::Place { location, board }) => {
                progress.passed = false;
                progress.history.push(board.clone());
                progress.board = board.clone();
                progress.last_move = Some(Move::Place(location));
                progress.turn = color.switch();
                Ok(Step::Accepted(board))
            }
        }
    }

    /// `color` is gone; the other player wins
    pub fn disconnect(&mut self, color: Color) -> Result<(), MatchError> {
        if !matches!(self.state, MatchState::InProgress(_)) {
            return Err(MatchError::NotInProgress(self.id));
        }
        self.finish(EndReason::Disconnect, Some(color.switch()));
        Ok(())
    }

    /// record the outcome, scoring the board as it stands
    fn finish(&mut self, reason: EndReason, winner: Option<Color>) {
        let board = match &self.state {
            MatchState::InProgress(p) => p.board.clone(),
            _ => return,
        };
        let score = score(&board, self.config.komi);
        self.state = MatchState::Finished {
            board,
            outcome: Outcome {
                reason,
                winner,
                score,
            },
        };
    }
}
