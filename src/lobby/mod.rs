mod client_connection;
mod match_archive;
mod match_pool;
pub(crate) mod messages;

use crate::game::session::MatchConfig;
use anyhow::Result;
use async_std::net::{TcpListener, TcpStream};
use async_std::task;
pub use client_connection::{ClientConnection, ConnectionInitError, ConnectionStats, OnlineNames};
use log::{info, warn};
pub use match_archive::{ArchiveError, MatchArchive, MatchRecord, PlayerRecord};
use match_pool::MatchPool;
pub use messages::{Messages, Responses, PROTOCOL_VERSION};
use std::collections::HashSet;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Everything `start_server` needs.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub address: SocketAddr,
    pub match_config: MatchConfig,
    pub max_connections_per_ip: u32,
    /// sled directory of the match archive, no archive if `None`
    pub archive_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            address: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::new(127, 0, 0, 1), 8080)),
            match_config: MatchConfig::default(),
            max_connections_per_ip: 8,
            archive_path: None,
        }
    }
}

pub async fn start_server(config: ServerConfig) -> Result<()> {
    config.match_config.validate()?;
    let archive = match &config.archive_path {
        Some(path) => Some(MatchArchive::open(path)?),
        None => None,
    };
    let connection_stats = ConnectionStats::new();
    let online_names: OnlineNames = Arc::new(Mutex::new(HashSet::new()));
    let pool = MatchPool::new(config.match_config.clone(), archive.clone());
    let listener = TcpListener::bind(config.address).await?;
    info!("server listening on {}", config.address);
    while let Ok((stream, socket)) = listener.accept().await {
        task::spawn(join_pool(
            stream,
            socket,
            config.max_connections_per_ip,
            connection_stats.clone(),
            online_names.clone(),
            archive.clone(),
            pool.clone(),
        ));
    }
    Ok(())
}

async fn join_pool(
    stream: TcpStream,
    socket: SocketAddr,
    max_conn_per_ip: u32,
    connection_stats: Arc<Mutex<ConnectionStats>>,
    online_names: OnlineNames,
    archive: Option<MatchArchive>,
    pool: MatchPool,
) {
    match ClientConnection::init(
        stream,
        socket,
        max_conn_per_ip,
        connection_stats,
        online_names,
        archive,
    )
    .await
    {
        Ok(conn) => pool.accept(conn).await,
        Err((e, Some(conn))) => {
            warn!("connection from {} refused: {}", socket, e);
            let _ = conn.sender().send(Responses::Error(e.to_string())).await;
        }
        Err((e, None)) => warn!("connection from {} refused: {}", socket, e),
    }
}
