//! A wrapper to convert a line-based TCP connection into a channel `Sender`
//! and a `Stream` of received lines.
//!
//! ## feature:
//!
//! - Automatic disconnection handling: on `send` error, `next` will eventually
//!   receive `None`.
//!
//! Each message is written as one line terminated by `\n`. Incoming lines are
//! split on `\n`, and a trailing `\r` is dropped.
//!
//! When the remote closes its write side, `next()` eventually returns `None`.
//! The `Sender` may still be used until the remote closes its read side.
//!
//! Any tcp write failure closes both sides of the connection.
//!
//! Dropping the `Conn` struct closes both sides of the connection.
//!
//! The following errors on receiving lines are reported to the remote socket
//! as an `ERROR; ...` line, and then the connection is closed.
//!
//! - LineTooLong: no line terminator within the allowed length
//! - InvalidUtf8: the line is not valid utf-8
use crate::network::utility;
use async_std::channel::{bounded, Receiver, Sender};
use async_std::io::BufReader;
use async_std::net::TcpStream;
use async_std::prelude::Stream;
use async_std::task;
use futures::{AsyncWriteExt, StreamExt};
#[allow(unused_imports)]
use log::trace;
use std::net::Shutdown;
use std::pin::Pin;
use std::task::{Context, Poll};
use thiserror::Error;

const NET_CHANNEL_SIZE: usize = 20;

/// Connection portal, returned by `handle_connection`.
///
/// The type parameter is the type of messages sent.
///
/// dropping this struct will close the connection
pub struct Conn<Msg> {
    sender: Sender<Msg>,
    receiver: Receiver<Received>,
}

impl<Msg> Conn<Msg> {
    pub fn sender(&self) -> &Sender<Msg> {
        &self.sender
    }
}

impl<Msg> Stream for Conn<Msg> {
    type Item = Received;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_next_unpin(cx)
    }
}

/// wrapper of lines received
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Received {
    /// one line, without its terminator
    Line(String),
    /// local read error: reason for connection close
    Error(ConnectionError),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConnectionError {
    #[error("line exceeds {0} bytes")]
    LineTooLong(usize),
    #[error("line is not valid utf-8")]
    InvalidUtf8,
}

pub fn handle_connection<Msg>(tcp: TcpStream, max_line_bytes: usize) -> Conn<Msg>
where
    Msg: Send + 'static + Into<String>,
{
    let (msg_sender, msg_receiver) = bounded(NET_CHANNEL_SIZE);
    let (rsp_sender, rsp_receiver) = bounded(NET_CHANNEL_SIZE);
    send_messages(&tcp, msg_receiver);
    retrieve_lines(&tcp, rsp_sender, max_line_bytes);
    Conn {
        sender: msg_sender,
        receiver: rsp_receiver,
    }
}

/// This function takes the ownership of the only instance of `Sender<Received>`.
///
/// Dropping the receiver of lines closes the read side of the connection.
fn retrieve_lines(tcp: &TcpStream, rsp_sender: Sender<Received>, max_line_bytes: usize) {
    let mut tcp = tcp.clone();
    let inner = tcp.clone();
    task::spawn(async move {
        let mut reader = BufReader::new(inner);
        loop {
            match utility::read_line(&mut reader, max_line_bytes).await {
                Ok(Some(line)) => {
                    #[cfg(debug_assertions)]
                    trace!("line received: {}", line);
                    if rsp_sender.send(Received::Line(line)).await.is_err() {
                        let _ = tcp.shutdown(Shutdown::Read);
                        break;
                    }
                }
                // no more line to read
                Ok(None) => {
                    let _ = tcp.shutdown(Shutdown::Read);
                    break;
                }
                Err(e) => {
                    let _ = rsp_sender.send(Received::Error(e.clone())).await;
                    let _ = write_line(&mut tcp, format!("ERROR; {}", e)).await;
                    let _ = tcp.shutdown(Shutdown::Both);
                    break;
                }
            }
        }
    });
}

/// This function takes the ownership of `Receiver<Msg>`.
///
/// ## Closing Connection:
/// Drop all instances of `Sender<Msg>`, and this function will close
/// the TCP connection.
///
/// ## Error Handling:
/// On write error, this function closes *both* sides of the connection,
/// and drops `Receiver<Msg>`.
fn send_messages<Msg>(tcp: &TcpStream, mut msg_receiver: Receiver<Msg>)
where
    Msg: Send + 'static + Into<String>,
{
    let mut tcp = tcp.clone();
    task::spawn(async move {
        while let Some(msg) = msg_receiver.next().await {
            if write_line(&mut tcp, msg.into()).await.is_err() {
                break;
            }
        }
        let _ = tcp.shutdown(Shutdown::Both);
    });
}

/// write `line` followed by `\n`, flattening any embedded line breaks
async fn write_line(tcp: &mut TcpStream, line: String) -> std::io::Result<()> {
    let mut bytes = line.replace(|c| c == '\n' || c == '\r', " ").into_bytes();
    bytes.push(b'\n');
    tcp.write_all(&bytes).await
}
