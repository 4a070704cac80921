//! One TCP dialog at a time: connect with retry and backoff, send a
//! selector, read either a line-oriented text response or a raw binary
//! stream to EOF, close. A `Connection` is consumed by the one request
//! it serves, so the socket is released on every exit path.

use std::io;
use std::net::Shutdown;
use std::time::Duration;

use async_std::{
    future,
    io::{prelude::BufReadExt, BufReader, ReadExt, WriteExt},
    net::TcpStream,
    stream::StreamExt,
    task,
};
use thiserror::Error;

/// Deadline for establishing a TCP connection.
pub const CONNECT_TIMEOUT: Duration = Duration::from_millis(2000);
/// Deadline for each read once connected.
pub const READ_TIMEOUT: Duration = Duration::from_millis(5000);
/// Connect attempts before the last error is surfaced.
pub const MAX_CONNECT_ATTEMPTS: u32 = 2;
/// Hard cap on an accumulated text response body.
pub const MAX_TEXT_RESPONSE: usize = 1024 * 1024;

const BACKOFF_UNIT_MS: u64 = 100;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connecting to {addr} timed out")]
    ConnectTimeout { addr: String },

    #[error("connecting to {addr} failed: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("read timed out")]
    ReadTimeout,

    #[error("response too large (over {limit} bytes)")]
    ResponseTooLarge { limit: usize },

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// A single-request connection to a gopher server.
pub struct Connection {
    stream: TcpStream,
}

impl Connection {
    /// Connect to `host:port`, retrying with exponential backoff.
    /// A timed-out attempt drops its half-open socket before the next try;
    /// once every attempt has failed the last error is returned.
    pub async fn open(host: &str, port: u16) -> Result<Connection, TransportError> {
        let addr = format!("{}:{}", host, port);
        let mut last_err = TransportError::ConnectTimeout { addr: addr.clone() };
        for attempt in 0..MAX_CONNECT_ATTEMPTS {
            match future::timeout(CONNECT_TIMEOUT, TcpStream::connect(addr.as_str())).await {
                Ok(Ok(stream)) => return Ok(Connection { stream }),
                Ok(Err(source)) => {
                    last_err = TransportError::Connect {
                        addr: addr.clone(),
                        source,
                    }
                }
                Err(_) => last_err = TransportError::ConnectTimeout { addr: addr.clone() },
            }
            if attempt + 1 < MAX_CONNECT_ATTEMPTS {
                task::sleep(Duration::from_millis(BACKOFF_UNIT_MS << attempt)).await;
            }
        }
        Err(last_err)
    }

    /// Check whether `host:port` accepts a TCP connection at all.
    /// Only the connect phase runs; nothing is sent.
    pub async fn probe(host: &str, port: u16) -> bool {
        match Connection::open(host, port).await {
            Ok(conn) => {
                conn.close();
                true
            }
            Err(err) => {
                log::info!("probe of {}:{} failed: {}", host, port, err);
                false
            }
        }
    }

    /// Send `selector` and read the response as UTF-8 lines until the
    /// server closes the connection. Lines are rejoined with `\n`; the
    /// accumulated body may not exceed [`MAX_TEXT_RESPONSE`] bytes.
    pub async fn send_request(self, selector: &str) -> Result<String, TransportError> {
        let mut stream = &self.stream;
        stream.write_all(format!("{}\r\n", selector).as_bytes()).await?;

        let mut body = String::new();
        {
            let mut lines = BufReader::new(stream).lines();
            loop {
                match future::timeout(READ_TIMEOUT, lines.next()).await {
                    Err(_) => return Err(TransportError::ReadTimeout),
                    Ok(None) => break,
                    Ok(Some(line)) => {
                        let line = line?;
                        let grown = body.len() + line.len() + usize::from(!body.is_empty());
                        if grown > MAX_TEXT_RESPONSE {
                            return Err(TransportError::ResponseTooLarge {
                                limit: MAX_TEXT_RESPONSE,
                            });
                        }
                        if !body.is_empty() {
                            body.push('\n');
                        }
                        body.push_str(&line);
                    }
                }
            }
        }
        self.close();
        Ok(body)
    }

    /// Send `selector` and drain the raw byte stream until EOF.
    /// Binary payloads carry no length and no cap; the upper bound is
    /// whatever the server sends before closing.
    pub async fn read_binary(self, selector: &str) -> Result<Vec<u8>, TransportError> {
        let mut stream = &self.stream;
        stream.write_all(format!("{}\r\n", selector).as_bytes()).await?;

        let mut payload = Vec::new();
        let mut chunk = [0u8; 8192];
        loop {
            match future::timeout(READ_TIMEOUT, stream.read(&mut chunk)).await {
                Err(_) => return Err(TransportError::ReadTimeout),
                Ok(Ok(0)) => break,
                Ok(Ok(n)) => payload.extend_from_slice(&chunk[..n]),
                Ok(Err(err)) => return Err(err.into()),
            }
        }
        self.close();
        Ok(payload)
    }

    /// Shut the socket down. Early-returning paths get the same effect
    /// from dropping the connection.
    pub fn close(self) {
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}
