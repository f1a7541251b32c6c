//! Minimal Tor control-port client: authenticate, request a new identity, and
//! the rotation handler that reopens the identity gate afterwards.

use async_trait::async_trait;
use crawler_core::RotationTicket;
use std::io;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::timeout;

pub const DEFAULT_CONTROL_ADDR: &str = "127.0.0.1:9051";
/// Tor ignores NEWNYM signals that arrive closer together than this.
pub const NEWNYM_RATE_LIMIT: Duration = Duration::from_secs(10);
const IO_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error("failed to connect to control port {addr}: {source}")]
    Connect { addr: String, source: io::Error },
    #[error("control port i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("control port replied {code}: {message}")]
    Rejected { code: String, message: String },
    #[error("control port did not answer within {0:?}")]
    Timeout(Duration),
}

#[async_trait]
pub trait IdentityControl: Send + Sync {
    /// Authenticate and request a fresh circuit. Returns how long to wait
    /// before the new identity is usable.
    async fn new_identity(&self) -> Result<Duration, ControlError>;
}

#[derive(Debug)]
pub struct TorControl {
    addr: String,
    password: String,
    io_timeout: Duration,
    rate_limit: Duration,
    last_newnym: Mutex<Option<Instant>>,
}

impl TorControl {
    pub fn new(addr: impl Into<String>, password: impl Into<String>) -> Self {
        TorControl {
            addr: addr.into(),
            password: password.into(),
            io_timeout: IO_TIMEOUT,
            rate_limit: NEWNYM_RATE_LIMIT,
            last_newnym: Mutex::new(None),
        }
    }

    pub fn with_io_timeout(mut self, t: Duration) -> Self {
        self.io_timeout = t;
        self
    }

    pub fn with_rate_limit(mut self, t: Duration) -> Self {
        self.rate_limit = t;
        self
    }

    /// Time left until Tor accepts another NEWNYM from us.
    pub fn newnym_wait(&self) -> Duration {
        let last = *self.last_newnym.lock().unwrap_or_else(|e| e.into_inner());
        match last {
            Some(at) => self.rate_limit.saturating_sub(at.elapsed()),
            None => Duration::ZERO,
        }
    }

    async fn connect(&self) -> Result<ControlConnection, ControlError> {
        let stream = timeout(self.io_timeout, TcpStream::connect(&self.addr))
            .await
            .map_err(|_| ControlError::Timeout(self.io_timeout))?
            .map_err(|source| ControlError::Connect { addr: self.addr.clone(), source })?;
        let (r, w) = stream.into_split();
        Ok(ControlConnection { reader: BufReader::new(r), writer: w, io_timeout: self.io_timeout })
    }
}

#[async_trait]
impl IdentityControl for TorControl {
    async fn new_identity(&self) -> Result<Duration, ControlError> {
        let mut conn = self.connect().await?;
        conn.authenticate(&self.password).await?;
        conn.command("SIGNAL NEWNYM").await?;
        *self.last_newnym.lock().unwrap_or_else(|e| e.into_inner()) = Some(Instant::now());
        Ok(self.newnym_wait())
    }
}

struct ControlConnection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    io_timeout: Duration,
}

impl ControlConnection {
    async fn authenticate(&mut self, password: &str) -> Result<(), ControlError> {
        if password.is_empty() {
            self.command("AUTHENTICATE").await?;
        } else {
            self.command(&format!("AUTHENTICATE {}", quote(password))).await?;
        }
        Ok(())
    }

    /// Send one command and read its reply. Anything but a 250 is an error.
    async fn command(&mut self, line: &str) -> Result<String, ControlError> {
        let req = format!("{line}\r\n");
        timeout(self.io_timeout, self.writer.write_all(req.as_bytes()))
            .await
            .map_err(|_| ControlError::Timeout(self.io_timeout))??;
        let (code, message) = timeout(self.io_timeout, self.read_reply())
            .await
            .map_err(|_| ControlError::Timeout(self.io_timeout))??;
        if code != "250" {
            return Err(ControlError::Rejected { code, message });
        }
        Ok(message)
    }

    // Replies are "CODE-text" continuation lines ending in a "CODE text" line.
    async fn read_reply(&mut self) -> Result<(String, String), ControlError> {
        let mut message = String::new();
        loop {
            let mut line = String::new();
            if self.reader.read_line(&mut line).await? == 0 {
                return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "control connection closed").into());
            }
            let line = line.trim_end_matches(['\r', '\n']);
            let (Some(code), Some(sep), Some(text)) = (line.get(..3), line.get(3..4), line.get(4..)) else {
                return Err(ControlError::Rejected { code: line.to_string(), message: "malformed reply".into() });
            };
            if !message.is_empty() { message.push('\n'); }
            message.push_str(text);
            if sep == " " {
                return Ok((code.to_string(), message));
            }
        }
    }
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Rotation handler for one timeout: new identity, settle, reopen the gate.
/// A control-channel failure fails the gate so the scan loop stops instead of
/// probing on an unrotated circuit.
pub async fn rotate<C: IdentityControl + ?Sized>(control: &C, ticket: RotationTicket) {
    match control.new_identity().await {
        Ok(wait) => {
            tokio::time::sleep(wait).await;
            tracing::warn!(waited_ms = wait.as_millis() as u64, "switched tor identities");
            ticket.reopen();
        }
        Err(e) => {
            tracing::error!(error = %e, "tor identity rotation failed");
            ticket.fail(e.to_string());
        }
    }
}
