use async_std::task::block_on;
use clap::Parser;
use log::{error, info, LevelFilter};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use weiqi::session::MatchConfig;
use weiqi::{start_server, ServerConfig};

#[derive(Parser, Debug)]
#[command(version, about = "Go (weiqi) match server")]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8080")]
    address: SocketAddr,

    /// Board dimension
    #[arg(long, default_value = "9")]
    dimension: usize,

    /// Points subtracted from black's score
    #[arg(long, default_value = "0.5")]
    komi: f64,

    /// Seconds to wait for each move, 0 waits forever
    #[arg(long, default_value = "60")]
    move_timeout: u64,

    /// Open connections allowed from one ip address
    #[arg(long, default_value = "8")]
    max_conn_per_ip: u32,

    /// Directory of the match archive
    #[arg(long)]
    archive: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            address: self.address,
            match_config: MatchConfig {
                dimension: self.dimension,
                komi: self.komi,
                move_timeout: match self.move_timeout {
                    0 => None,
                    secs => Some(Duration::from_secs(secs)),
                },
            },
            max_connections_per_ip: self.max_conn_per_ip,
            archive_path: self.archive.clone(),
        }
    }
}

fn main() {
    let args = Args::parse();
    let level = args.log_level.parse().unwrap_or(LevelFilter::Info);
    env_logger::builder().filter_module("weiqi", level).init();
    let config = args.server_config();
    info!("server started");
    if let Err(e) = block_on(start_server(config)) {
        error!("server ended in error: {e}");
    }
}
