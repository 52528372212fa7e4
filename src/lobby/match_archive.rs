use crate::game::session::{EndReason, Match};
use crate::game::Color;
use bincode::config::Configuration;
use bincode::{config, decode_from_slice, encode_to_vec, Decode, Encode};
use log::error;
use sled::{Db, Tree};
use std::path::Path;
use thiserror::Error;

const DB_BIN_CONFIG: Configuration = config::standard();
const MATCH_TREE: &[u8] = b"matches";
const PLAYER_TREE: &[u8] = b"players";

/// A finished match as stored in the archive.
#[derive(Encode, Decode, Clone, Debug, PartialEq)]
pub struct MatchRecord {
    pub id: u64,
    pub black: String,
    pub white: String,
    pub reason: EndReason,
    /// `None` for a draw
    pub winner: Option<String>,
    pub black_score: f64,
    pub white_score: f64,
}

/// win/loss counters of one player
#[derive(Encode, Decode, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlayerRecord {
    pub wins: u32,
    pub losses: u32,
}

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("archive database error: {0}")]
    Db(#[from] sled::Error),
    #[error("archive encode error: {0}")]
    Encode(#[from] bincode::error::EncodeError),
    #[error("archive decode error: {0}")]
    Decode(#[from] bincode::error::DecodeError),
}

impl MatchRecord {
    /// `None` unless the match has finished
    pub fn from_match(game: &Match) -> Option<Self> {
        let outcome = game.outcome()?;
        Some(MatchRecord {
            id: game.id(),
            black: game.player_name(Color::Black)?.to_string(),
            white: game.player_name(Color::White)?.to_string(),
            reason: outcome.reason,
            winner: outcome
                .winner
                .and_then(|c| game.player_name(c))
                .map(str::to_string),
            black_score: outcome.score.black,
            white_score: outcome.score.white,
        })
    }
}

/// Finished matches and per-player records, kept in sled.
#[derive(Clone)]
pub struct MatchArchive {
    db: Db,
    matches: Tree,
    players: Tree,
}

impl MatchArchive {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let db = sled::open(path)
            .map_err(|e| anyhow::Error::msg(format!("bad archive path {:?}: {}", path, e)))?;
        Self::from_db(db)
    }

    /// an archive that is deleted when dropped
    pub fn temporary() -> anyhow::Result<Self> {
        Self::from_db(sled::Config::new().temporary(true).open()?)
    }

    fn from_db(db: Db) -> anyhow::Result<Self> {
        let matches = db
            .open_tree(MATCH_TREE)
            .map_err(|_| anyhow::Error::msg("failed to open tree (matches)"))?;
        let players = db
            .open_tree(PLAYER_TREE)
            .map_err(|_| anyhow::Error::msg("failed to open tree (players)"))?;
        Ok(MatchArchive {
            db,
            matches,
            players,
        })
    }

    /// Store a finished match and update both players' counters.
    ///
    /// A draw counts for neither player.
    pub fn record(&self, record: &MatchRecord) -> Result<(), ArchiveError> {
        let bytes = encode_to_vec(record, DB_BIN_CONFIG)?;
        self.matches.insert(record.id.to_be_bytes(), bytes)?;
        if let Some(winner) = &record.winner {
            let loser = if *winner == record.black {
                &record.white
            } else {
                &record.black
            };
            self.bump(winner, true)?;
            self.bump(loser, false)?;
        }
        let _ = self.db.flush();
        Ok(())
    }

    /// the record of `name`, all zero for an unknown player
    pub fn player_record(&self, name: &str) -> Result<PlayerRecord, ArchiveError> {
        match self.players.get(name.as_bytes())? {
            Some(data) => Ok(decode_from_slice(data.as_ref(), DB_BIN_CONFIG)?.0),
            None => Ok(PlayerRecord::default()),
        }
    }

    pub fn match_record(&self, id: u64) -> Result<Option<MatchRecord>, ArchiveError> {
        match self.matches.get(id.to_be_bytes())? {
            Some(data) => Ok(Some(decode_from_slice(data.as_ref(), DB_BIN_CONFIG)?.0)),
            None => Ok(None),
        }
    }

    fn bump(&self, name: &str, won: bool) -> Result<(), ArchiveError> {
        self.players.update_and_fetch(name.as_bytes(), |old| {
            let mut record: PlayerRecord = match old.map(|b| decode_from_slice(b, DB_BIN_CONFIG)) {
                Some(Ok((record, _))) => record,
                Some(Err(e)) => {
                    error!("player record of {} is corrupted, reset: {}", name, e);
                    PlayerRecord::default()
                }
                None => PlayerRecord::default(),
            };
            if won {
                record.wins += 1;
            } else {
                record.losses += 1;
            }
            encode_to_vec(record, DB_BIN_CONFIG).ok()
        })?;
        Ok(())
    }
}

impl Drop for MatchArchive {
    fn drop(&mut self) {
        let _ = self.db.flush();
    }
}

#[cfg(test)]
mod test_match_archive {
    use super::*;
    use crate::game::session::MatchConfig;

    fn record(id: u64, winner: Option<&str>) -> MatchRecord {
        MatchRecord {
            id,
            black: "alice".to_string(),
            white: "bob".to_string(),
            reason: EndReason::Finished,
            winner: winner.map(str::to_string),
            black_score: 10.5,
            white_score: 12.0,
        }
    }

    #[test]
    fn test_unknown_player_has_empty_record() {
        let archive = MatchArchive::temporary().unwrap();
        assert_eq!(
            archive.player_record("nobody").unwrap(),
            PlayerRecord::default()
        );
        assert_eq!(archive.match_record(1).unwrap(), None);
    }

    #[test]
    fn test_record_updates_players() {
        let archive = MatchArchive::temporary().unwrap();
        archive.record(&record(1, Some("bob"))).unwrap();
        archive.record(&record(2, Some("bob"))).unwrap();
        archive.record(&record(3, Some("alice"))).unwrap();
        assert_eq!(
            archive.player_record("bob").unwrap(),
            PlayerRecord { wins: 2, losses: 1 }
        );
        assert_eq!(
            archive.player_record("alice").unwrap(),
            PlayerRecord { wins: 1, losses: 2 }
        );
        assert_eq!(archive.match_record(2).unwrap(), Some(record(2, Some("bob"))));
    }

    #[test]
    fn test_draw_counts_for_neither() {
        let archive = MatchArchive::temporary().unwrap();
        archive.record(&record(5, None)).unwrap();
        assert_eq!(
            archive.player_record("alice").unwrap(),
            PlayerRecord::default()
        );
        assert!(archive.match_record(5).unwrap().is_some());
    }

    #[test]
    fn test_record_from_match() {
        let config = MatchConfig {
            dimension: 2,
            komi: 0.5,
            move_timeout: None,
        };
        let mut game = Match::new(9, config, "alice".to_string());
        assert_eq!(MatchRecord::from_match(&game), None);
        game.start("bob".to_string(), false).unwrap();
        game.apply_reply(Color::Black, "MOVE; QUIT").unwrap();
        let record = MatchRecord::from_match(&game).unwrap();
        assert_eq!(record.id, 9);
        assert_eq!(record.black, "bob");
        assert_eq!(record.white, "alice");
        assert_eq!(record.reason, EndReason::Quit);
        assert_eq!(record.winner.as_deref(), Some("alice"));
        assert_eq!(record.black_score, -0.5);
    }
}
