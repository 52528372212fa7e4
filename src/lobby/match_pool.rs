use crate::game::session::{run_match, Match, MatchConfig};
use crate::lobby::client_connection::ClientConnection;
use crate::lobby::match_archive::{MatchArchive, MatchRecord};
use crate::lobby::messages::Responses;
use crate::stream_utility::{Plug, UnplugHandle};
use async_std::sync::Mutex;
use async_std::task;
use futures::StreamExt;
use log::{error, info, warn};
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering::SeqCst;
use std::sync::Arc;

/// the match waiting for its second player
struct Pending {
    game: Match,
    /// connection id and handle of the waiting player, `None` once it left
    first: Option<(u64, UnplugHandle<ClientConnection>)>,
}

/// Pairs incoming connections two by two into matches.
#[derive(Clone)]
pub(crate) struct MatchPool {
    pending: Arc<Mutex<Option<Pending>>>,
    counter: Arc<AtomicU64>,
    config: MatchConfig,
    archive: Option<MatchArchive>,
}

impl MatchPool {
    pub fn new(config: MatchConfig, archive: Option<MatchArchive>) -> Self {
        MatchPool {
            pending: Arc::new(Mutex::new(None)),
            counter: Arc::new(AtomicU64::default()),
            config,
            archive,
        }
    }

    /// Pair `conn` with the waiting player, or make it wait for the next one.
    pub async fn accept(&self, conn: ClientConnection) {
        let mut pending = self.pending.lock().await;
        let name = conn.player_name().to_string();
        match pending.take() {
            Some(Pending { mut game, first }) => {
                match first.and_then(|(_, handle)| handle.unplug()) {
                    Some(first_conn) => {
                        let first_is_black = rand::random::<bool>();
                        if let Err(e) = game.start(name, first_is_black) {
                            error!("failed to start match: {}", e);
                            return;
                        }
                        let (black, white) = if first_is_black {
                            (first_conn, conn)
                        } else {
                            (conn, first_conn)
                        };
                        self.spawn_match(game, black, white);
                    }
                    None => {
                        // the waiting player left, the newcomer takes its seat
                        if let Err(e) = game.replace_first_player(name) {
                            error!("failed to reseat match: {}", e);
                            return;
                        }
                        *pending = Some(self.wait(game, conn).await);
                    }
                }
            }
            None => {
                let id = self.counter.fetch_add(1, SeqCst) + 1;
                let game = Match::new(id, self.config.clone(), name);
                *pending = Some(self.wait(game, conn).await);
            }
        }
    }

    async fn wait(&self, game: Match, conn: ClientConnection) -> Pending {
        let connection_id = conn.connection_id();
        info!(
            "player {}: {} waits for an opponent in match {}",
            connection_id,
            conn.player_name(),
            game.id()
        );
        let _ = conn
            .sender()
            .send(Responses::Wait {
                dimension: game.config().dimension,
                komi: game.config().komi,
            })
            .await;
        let (plug, handle) = Plug::new(conn);
        self.watch(connection_id, plug);
        Pending {
            game,
            first: Some((connection_id, handle)),
        }
    }

    /// drain the waiting player's lines, and free its seat when it leaves
    fn watch(&self, connection_id: u64, mut plug: Plug<ClientConnection>) {
        let pool = self.clone();
        task::spawn(async move {
            while let Some(line) = plug.next().await {
                warn!(
                    "player {} sent `{}` before the match started, ignored",
                    connection_id, line
                );
            }
            if plug.stream_terminated() {
                let mut pending = pool.pending.lock().await;
                if let Some(p) = pending.as_mut() {
                    if matches!(&p.first, Some((id, _)) if *id == connection_id) {
                        p.first = None;
                    }
                }
            }
        });
    }

    fn spawn_match(&self, game: Match, black: ClientConnection, white: ClientConnection) {
        let archive = self.archive.clone();
        task::spawn(async move {
            let game = run_match(game, black, white).await;
            if let (Some(archive), Some(record)) = (archive, MatchRecord::from_match(&game)) {
                if let Err(e) = archive.record(&record) {
                    error!("failed to archive match {}: {}", record.id, e);
                }
            }
        });
    }
}
