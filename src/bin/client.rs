use anyhow::Result;
use async_std::channel::Sender;
use async_std::io::{stdin, BufReader, Stdin};
use async_std::net::TcpStream;
use async_std::task;
use async_std::task::{block_on, JoinHandle};
use clap::Parser;
use futures::{join, AsyncBufReadExt, StreamExt};
use log::{error, info, warn, LevelFilter};
use std::net::SocketAddr;
use weiqi::{Conn, Messages, Received, PROTOCOL_VERSION};

const MAX_LINE_BYTES: usize = 4096;

#[derive(Parser, Debug)]
#[command(version, about = "Plays Go on a weiqi server from the terminal")]
struct Args {
    /// Player name
    name: String,

    /// Server address
    #[arg(long, default_value = "127.0.0.1:8080")]
    address: SocketAddr,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() {
    let args = Args::parse();
    let level = args.log_level.parse().unwrap_or(LevelFilter::Info);
    env_logger::builder().filter_level(level).init();
    if let Err(e) = block_on(run_client(args)) {
        error!("client stopped on error {}", e);
    }
}

async fn run_client(args: Args) -> Result<()> {
    let tcp = TcpStream::connect(args.address).await?;
    let conn: Conn<String> = weiqi::handle_connection(tcp, MAX_LINE_BYTES);
    conn.sender()
        .send(
            Messages::Join {
                version: PROTOCOL_VERSION.to_string(),
                name: args.name,
            }
            .into(),
        )
        .await?;
    let handle1 = accept_input(stdin(), conn.sender().clone());
    let handle2 = print_server_lines(conn);
    join!(handle1, handle2);
    Ok(())
}

fn accept_input(input: Stdin, sender: Sender<String>) -> JoinHandle<()> {
    task::spawn(async move {
        let reader = BufReader::new(input);
        let mut lines = reader.lines();
        while let Some(line) = lines.next().await {
            match line {
                Ok(line) => {
                    if sender.send(to_message(&line)).await.is_err() {
                        info!("server closed");
                        break;
                    }
                }
                Err(e) => {
                    warn!("read line error: {}", e);
                }
            }
        }
    })
}

fn print_server_lines(mut conn: Conn<String>) -> JoinHandle<()> {
    task::spawn(async move {
        while let Some(rsp) = conn.next().await {
            match rsp {
                Received::Line(line) => println!("{}", line),
                Received::Error(e) => {
                    error!("connection error: {}", e);
                    break;
                }
            }
        }
        println!("connection closed");
    })
}

/// wrap a bare move into `MOVE; ...`, pass anything else through
fn to_message(line: &str) -> String {
    let token = line.trim();
    let is_move = token == "PASS" || token == "QUIT" || token.parse::<i64>().is_ok();
    if is_move {
        Messages::Move(token.to_string()).into()
    } else {
        line.to_string()
    }
}
