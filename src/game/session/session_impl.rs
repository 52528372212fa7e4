use crate::game::session::api::{EndReason, PlayerChannel};
use crate::game::session::messages::MatchMessage;
use crate::game::session::state::{Match, Step};
use crate::game::Color::{self, Black, White};
use async_std::future::timeout;
use futures::future::{select, Either};
use futures::StreamExt;
#[allow(unused_imports)]
use log::trace;
use log::{error, info, warn};
use std::time::Duration;

/// bound on each send when the match has no move timeout
const SEND_TIMEOUT: Duration = Duration::from_secs(30);

/// what the coordinator got while blocked on the active player
enum Reply {
    Line(String),
    /// the player of this color closed its connection
    Gone(Color),
    TimedOut,
}

/// Drive a started match to its outcome over two player channels.
///
/// The match runs on the caller's task. Every exit path records an outcome,
/// which the returned `Match` carries.
pub async fn run_match<P: PlayerChannel>(mut game: Match, mut black: P, mut white: P) -> Match {
    let id = game.id();
    let board = match game.board() {
        Some(board) => board.clone(),
        None => {
            error!("match {} was run before it had two players", id);
            return game;
        }
    };
    info!(
        "match {} started: {} (black) vs {} (white)",
        id,
        black.name(),
        white.name()
    );
    // a player that stops reading is treated like one that left
    let limit = game.config().move_timeout.unwrap_or(SEND_TIMEOUT);
    let game_msg = |color| MatchMessage::Game {
        board: board.clone(),
        color,
    };
    if !send(&black, game_msg(Black), limit).await {
        let _ = game.disconnect(Black);
    } else if !send(&white, game_msg(White), limit).await {
        let _ = game.disconnect(White);
    }

    while let (Some(color), Some(board)) = (game.turn(), game.board().cloned()) {
        let (active, idle) = match color {
            Black => (&mut black, &mut white),
            White => (&mut white, &mut black),
        };
        let turn = MatchMessage::Turn {
            board,
            last_move: game.last_move(),
        };
        if !send(active, turn, limit).await {
            warn!("match {}: {} stopped reading", id, active.name());
            let _ = game.disconnect(color);
            continue;
        }
        let reply = match game.config().move_timeout {
            Some(limit) => timeout(limit, next_reply(color, active, idle))
                .await
                .unwrap_or(Reply::TimedOut),
            None => next_reply(color, active, idle).await,
        };
        match reply {
            Reply::Line(line) => match game.apply_reply(color, &line) {
                Ok(Step::Accepted(board)) => {
                    if !send(active, MatchMessage::Valid(board), limit).await {
                        warn!("match {}: {} stopped reading", id, active.name());
                        let _ = game.disconnect(color);
                    }
                }
                Ok(Step::Rejected(reason)) => {
                    error!(
                        "match {}: {} forfeits with `{}`: {}",
                        id,
                        active.name(),
                        line,
                        reason
                    );
                    send(active, MatchMessage::Invalid(reason), limit).await;
                }
                Ok(Step::Quit) => info!("match {}: {} quit", id, active.name()),
                Err(e) => {
                    error!("match {} in unexpected state: {}", id, e);
                    return game;
                }
            },
            Reply::Gone(gone) => {
                warn!("match {}: {} disconnected", id, gone);
                let _ = game.disconnect(gone);
            }
            Reply::TimedOut => {
                warn!("match {}: {} timed out", id, active.name());
                let _ = game.disconnect(color);
            }
        }
    }

    if let Some(end) = end_message(&game) {
        let reason = game.outcome().map(|o| o.reason);
        info!("match {} ended: {}", id, end);
        if reason == Some(EndReason::Disconnect) {
            // the loser is gone, only the survivor hears about it
            let survivor = game.outcome().and_then(|o| o.winner);
            match survivor {
                Some(Black) => send(&black, end, limit).await,
                Some(White) => send(&white, end, limit).await,
                None => false,
            };
        } else {
            send(&black, end.clone(), limit).await;
            send(&white, end, limit).await;
        }
    }
    game
}

/// Wait for the next line of `active`, noticing `idle` leaving meanwhile.
///
/// Lines from `idle` arrive out of turn and are dropped.
async fn next_reply<P: PlayerChannel>(color: Color, active: &mut P, idle: &mut P) -> Reply {
    loop {
        let polled = match select(active.next(), idle.next()).await {
            Either::Left((line, _)) => Either::Left(line),
            Either::Right((line, _)) => Either::Right(line),
        };
        match polled {
            Either::Left(Some(line)) => return Reply::Line(line),
            Either::Left(None) => return Reply::Gone(color),
            Either::Right(Some(line)) => {
                warn!("{} sent `{}` out of turn, ignored", idle.name(), line);
            }
            Either::Right(None) => return Reply::Gone(color.switch()),
        }
    }
}

fn end_message(game: &Match) -> Option<MatchMessage> {
    let outcome = game.outcome()?;
    Some(MatchMessage::End {
        reason: outcome.reason,
        winner: outcome
            .winner
            .and_then(|c| game.player_name(c))
            .map(str::to_string),
        score: outcome.score,
    })
}

/// `false` if the message could not be queued within `limit`
async fn send<P: PlayerChannel>(player: &P, msg: MatchMessage, limit: Duration) -> bool {
    #[cfg(debug_assertions)]
    trace!("to {}: {}", player.name(), msg);
    let sender = player.sender();
    // a closed channel is noticed on the receiving side
    timeout(limit, sender.send(msg.into())).await.is_ok()
}
