use crate::command;
use crate::config::SharedConfig;
use crate::error::RillError;
use crate::resp::{RespParser, RespValue};
use crate::store::SharedStore;
use bytes::BytesMut;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

/// Bind the listener and serve until ctrl-c. Returns Err only when the
/// listen address cannot be bound.
pub async fn run(store: SharedStore, config: SharedConfig) -> io::Result<()> {
    let addr = format!("{}:{}", config.bind, config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("rill listening on {addr}");

    if config.active_expire_enabled {
        let store = store.clone();
        let sample_size = config.expire_sample_size;
        tokio::spawn(async move {
            expiry_sweep_loop(store, sample_size).await;
        });
    }

    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, peer_addr)) => {
                        debug!("new connection from {peer_addr}");
                        let store = store.clone();
                        tokio::spawn(async move {
                            match handle_connection(stream, store).await {
                                Ok(()) => debug!("connection closed: {peer_addr}"),
                                Err(e) if is_normal_disconnect(&e) => {
                                    debug!("connection closed: {peer_addr}")
                                }
                                Err(e) => warn!("connection error from {peer_addr}: {e}"),
                            }
                        });
                    }
                    Err(e) => warn!("accept error: {e}"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                return Ok(());
            }
        }
    }
}

/// Disconnects that are part of normal client behavior and not worth a log
/// line above debug.
fn is_normal_disconnect(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::NotConnected
    )
}

/// Per-connection loop: parse complete frames out of the buffer, dispatch,
/// write replies. Handler failures are error replies; a malformed frame gets
/// one final error reply and closes the connection.
async fn handle_connection(mut stream: TcpStream, store: SharedStore) -> io::Result<()> {
    let mut buf = BytesMut::with_capacity(4096);

    loop {
        loop {
            match RespParser::parse(&mut buf) {
                Ok(Some(frame)) => {
                    let reply = process_frame(frame, &store).await;
                    stream.write_all(&reply.serialize()).await?;
                }
                Ok(None) => break,
                Err(e) => {
                    let reply = RespValue::error(RillError::Protocol(e.to_string()).to_string());
                    stream.write_all(&reply.serialize()).await?;
                    return Ok(());
                }
            }
        }

        // EOF means the client is done.
        if stream.read_buf(&mut buf).await? == 0 {
            return Ok(());
        }
    }
}

/// Commands arrive as a non-empty array of bulk strings: element 0 is the
/// command name, the rest are its arguments.
async fn process_frame(frame: RespValue, store: &SharedStore) -> RespValue {
    let items = match frame {
        RespValue::Array(Some(items)) if !items.is_empty() => items,
        _ => return RespValue::error("ERR invalid command format"),
    };

    let cmd_name = match items[0].to_string_lossy() {
        Some(name) => name,
        None => return RespValue::error("ERR invalid command name"),
    };

    command::dispatch(&cmd_name, &items[1..], store).await
}

/// Background reclamation of expired keys. Each tick touches at most
/// `sample_size` entries; lazy expiry on read remains the correctness path.
async fn expiry_sweep_loop(store: SharedStore, sample_size: usize) {
    loop {
        tokio::time::sleep(Duration::from_secs(1)).await;
        let removed = store.write().await.active_expire(sample_size);
        if removed > 0 {
            debug!("expiry sweep removed {removed} keys");
        }
    }
}
