//! A Go (weiqi) server: the rules engine, the match coordinator, and a
//! line-based TCP lobby that pairs players into matches.
pub mod game;
pub mod lobby;
pub(crate) mod network;
mod stream_utility;

pub use game::*;
pub use lobby::{
    start_server, ArchiveError, ConnectionInitError, MatchArchive, MatchRecord, Messages,
    PlayerRecord, Responses, ServerConfig, PROTOCOL_VERSION,
};
pub use network::{handle_connection, Conn, ConnectionError, Received};
