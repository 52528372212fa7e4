use crate::game::session::{FramingError, PlayerChannel};
use crate::lobby::match_archive::{MatchArchive, PlayerRecord};
use crate::lobby::messages::{Messages, Responses, PROTOCOL_VERSION};
use crate::network::connection::{handle_connection, Conn, ConnectionError, Received};
use async_std::channel::Sender;
use async_std::net::TcpStream;
use async_std::prelude::Stream;
use futures::StreamExt;
use log::{error, info, warn};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::net::{IpAddr, SocketAddr};
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use thiserror::Error;
use unicode_segmentation::UnicodeSegmentation;

const MAX_LINE_BYTES: usize = 1024;
const MAX_NAME_GRAPHEMES: usize = 24;
/// framing errors tolerated in a row during the handshake
const FRAMING_STRIKES: u32 = 2;

/// names of the players currently connected
pub type OnlineNames = Arc<Mutex<HashSet<String>>>;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConnectionInitError {
    #[error("too many connections from this address")]
    IpMaxConnExceed,
    #[error("connection closed before joining")]
    ConnectionClosed,
    #[error("expected JOIN first")]
    JoinExpected,
    #[error("unsupported protocol version `{0}`")]
    UnsupportedVersion(String),
    #[error("player name is empty")]
    EmptyName,
    #[error("player name is longer than {} characters", MAX_NAME_GRAPHEMES)]
    NameTooLong,
    #[error("player name contains `;` or control characters")]
    InvalidName,
    #[error("player `{0}` is already online")]
    NameExists(String),
    #[error("malformed message: {0}")]
    Framing(FramingError),
    #[error("network error: {0}")]
    NetworkError(ConnectionError),
}

/// A client that completed the `JOIN` handshake.
///
/// Dropping it closes the connection and frees its name and per-ip slot.
pub struct ClientConnection {
    inner: Conn<Responses>,
    player_name: String,
    connection_id: u64,
    socket_address: SocketAddr,
    connection_stats: Arc<Mutex<ConnectionStats>>,
    online_names: OnlineNames,
}

/// Handle Client Connection
///
/// # Convention
///
/// The connection should start by sending `JOIN; 1; name`. A malformed line
/// gets an `ERROR` and one more chance; the second one in a row ends the
/// connection.
impl ClientConnection {
    pub async fn init(
        tcp: TcpStream,
        socket_address: SocketAddr,
        max_conn_per_ip: u32,
        connection_stats: Arc<Mutex<ConnectionStats>>,
        online_names: OnlineNames,
        archive: Option<MatchArchive>,
    ) -> Result<Self, (ConnectionInitError, Option<Conn<Responses>>)> {
        let mut inner = handle_connection(tcp, MAX_LINE_BYTES);
        // add connection, check if ip max connection number exceeded
        let added = lock(&connection_stats).add_conn(socket_address, max_conn_per_ip);
        let connection_id = match added {
            Ok(id) => id,
            Err(e) => return Err((e, Some(inner))),
        };
        let player_name = match handshake(&mut inner, &online_names).await {
            Ok(name) => name,
            Err(e) => {
                lock(&connection_stats).remove_conn(socket_address);
                return Err((e, Some(inner)));
            }
        };
        let record = match &archive {
            Some(archive) => archive.player_record(&player_name).unwrap_or_else(|e| {
                error!("failed to read record of {}: {}", player_name, e);
                PlayerRecord::default()
            }),
            None => PlayerRecord::default(),
        };
        info!("player {connection_id}: {player_name} connected to server from {socket_address}");
        let _ = inner
            .sender()
            .send(Responses::Welcome {
                name: player_name.clone(),
                wins: record.wins,
                losses: record.losses,
            })
            .await;
        Ok(ClientConnection {
            inner,
            player_name,
            connection_id,
            socket_address,
            connection_stats,
            online_names,
        })
    }

    pub(crate) fn sender(&self) -> &Sender<Responses> {
        self.inner.sender()
    }

    pub fn player_name(&self) -> &str {
        &self.player_name
    }

    pub fn connection_id(&self) -> u64 {
        self.connection_id
    }
}

/// read lines until a valid `JOIN`, returning the registered name
async fn handshake(
    inner: &mut Conn<Responses>,
    online_names: &OnlineNames,
) -> Result<String, ConnectionInitError> {
    let mut strikes = 0;
    loop {
        let line = match inner.next().await {
            None => return Err(ConnectionInitError::ConnectionClosed),
            Some(Received::Error(e)) => return Err(ConnectionInitError::NetworkError(e)),
            Some(Received::Line(line)) => line,
        };
        let error = match line.parse::<Messages>() {
            Ok(Messages::Join { version, name }) => {
                if version != PROTOCOL_VERSION {
                    return Err(ConnectionInitError::UnsupportedVersion(version));
                }
                let name = validate_name(&name)?;
                let mut names = lock(online_names);
                if !names.insert(name.to_string()) {
                    return Err(ConnectionInitError::NameExists(name.to_string()));
                }
                return Ok(name.to_string());
            }
            Ok(Messages::Move(_)) => ConnectionInitError::JoinExpected,
            Err(e) => ConnectionInitError::Framing(e),
        };
        strikes += 1;
        if strikes >= FRAMING_STRIKES {
            return Err(error);
        }
        warn!("malformed handshake line `{}`: {}", line, error);
        let _ = inner.sender().send(Responses::Error(error.to_string())).await;
    }
}

fn validate_name(name: &str) -> Result<&str, ConnectionInitError> {
    if name.is_empty() {
        Err(ConnectionInitError::EmptyName)
    } else if name.graphemes(true).count() > MAX_NAME_GRAPHEMES {
        Err(ConnectionInitError::NameTooLong)
    } else if name.chars().any(|c| c == ';' || c.is_control()) {
        Err(ConnectionInitError::InvalidName)
    } else {
        Ok(name)
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Stream for ClientConnection {
    type Item = String;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.inner.poll_next_unpin(cx) {
            Poll::Ready(Some(Received::Line(line))) => Poll::Ready(Some(line)),
            Poll::Ready(Some(Received::Error(e))) => {
                // log and quit on connection error automatically
                let address = self.socket_address;
                error!("connection error ({e}) of {address}");
                Poll::Ready(None)
            }
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl PlayerChannel for ClientConnection {
    type Msg = Responses;

    fn name(&self) -> &str {
        &self.player_name
    }

    fn sender(&self) -> Sender<Responses> {
        self.inner.sender().clone()
    }
}

impl Drop for ClientConnection {
    fn drop(&mut self) {
        info!(
            "player {}: {} ({}) disconnected from server",
            self.connection_id, self.player_name, self.socket_address
        );
        lock(&self.connection_stats).remove_conn(self.socket_address);
        lock(&self.online_names).remove(&self.player_name);
    }
}

/// count number of connections from each ip address
pub struct ConnectionStats {
    conn_count: HashMap<IpAddr, u32>,
    current_uid: u64,
}

impl ConnectionStats {
    pub fn new() -> Arc<Mutex<Self>> {
        Arc::new(Mutex::new(Self {
            conn_count: Default::default(),
            current_uid: 0,
        }))
    }

    /// add a new connection, returning its id
    fn add_conn(
        &mut self,
        socket_address: SocketAddr,
        single_ip_max_conn: u32,
    ) -> Result<u64, ConnectionInitError> {
        Self::add_ip(
            &mut self.current_uid,
            &mut self.conn_count,
            socket_address.ip(),
            single_ip_max_conn,
        )
    }

    /// drop a connection
    fn remove_conn(&mut self, socket_address: SocketAddr) {
        Self::remove_ip(&mut self.conn_count, socket_address.ip())
    }

    /// number of open connections from `ip`
    #[cfg(test)]
    fn count(&self, ip: IpAddr) -> u32 {
        self.conn_count.get(&ip).copied().unwrap_or(0)
    }

    fn add_ip<T: Eq + Hash>(
        current_uid: &mut u64,
        count_table: &mut HashMap<T, u32>,
        ip: T,
        single_ip_max_conn: u32,
    ) -> Result<u64, ConnectionInitError> {
        let count = count_table.entry(ip).or_insert(0);
        if *count >= single_ip_max_conn {
            return Err(ConnectionInitError::IpMaxConnExceed);
        }
        *count += 1;
        *current_uid = current_uid.wrapping_add(1);
        Ok(*current_uid)
    }

    fn remove_ip<T: Eq + Hash>(count_table: &mut HashMap<T, u32>, ip: T) {
        if let Entry::Occupied(mut o) = count_table.entry(ip) {
            let count = o.get_mut();
            if *count > 1 {
                *count -= 1;
            } else {
                o.remove();
            }
        }
    }
}
