//! # Line-framed TCP transport.
//!
//! One task per connection. Inbound lines decode as control frames
//! (`subscribe|<channel>`, `unsubscribe|<channel>`); outbound payloads are
//! written as lines with a bounded per-payload write window. EOF or an I/O
//! error on the read side detaches the subscriber, purging its interests.
//!
//! ```text
//! TcpRelayServer::serve(listener, cancel)
//!   └─► accept ──► handle_connection (one task per peer)
//!         ├─► relay.attach(LineWriter)            (outbound half)
//!         ├─► FramedRead lines ─► relay.handle_frame(id, line)
//!         └─► EOF / error ─► relay.detach(id)
//! ```
//!
//! Framing is this transport's convention, not the relay's: the relay hands
//! payload bytes over verbatim and the writer emits them as one line.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::Mutex;
use tokio::time;
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec, LinesCodecError};
use tokio_util::sync::CancellationToken;

use crate::core::wait_for_shutdown_signal;
use crate::error::TransportError;
use crate::subscribers::Outbound;
use crate::Relay;

/// TCP front-end for a [`Relay`].
pub struct TcpRelayServer {
    relay: Arc<Relay>,
}

impl TcpRelayServer {
    /// Creates a server over the given relay.
    pub fn new(relay: Arc<Relay>) -> Self {
        Self { relay }
    }

    /// Binds `addr` and serves until the process receives a termination
    /// signal, then drains the relay.
    pub async fn run(&self, addr: impl ToSocketAddrs) -> std::io::Result<()> {
        let listener = TcpListener::bind(addr).await?;
        let cancel = CancellationToken::new();

        let guard = cancel.clone();
        tokio::spawn(async move {
            if wait_for_shutdown_signal().await.is_ok() {
                guard.cancel();
            }
        });

        self.serve(listener, cancel).await
    }

    /// Serves an already-bound listener until `cancel` fires, then shuts the
    /// relay down with its configured grace.
    ///
    /// A grace overrun surfaces as `ErrorKind::TimedOut`.
    pub async fn serve(
        &self,
        listener: TcpListener,
        cancel: CancellationToken,
    ) -> std::io::Result<()> {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                accepted = listener.accept() => {
                    let (stream, peer) = accepted?;
                    let relay = Arc::clone(&self.relay);
                    tokio::spawn(async move {
                        handle_connection(relay, stream, peer.to_string()).await;
                    });
                }
            }
        }

        match self.relay.shutdown().await {
            Ok(()) => Ok(()),
            Err(crate::RelayError::Closed) => Ok(()),
            Err(err) => Err(std::io::Error::new(std::io::ErrorKind::TimedOut, err)),
        }
    }
}

/// Drives one subscriber connection from attach to detach.
async fn handle_connection(relay: Arc<Relay>, stream: TcpStream, peer: String) {
    let (read_half, write_half) = stream.into_split();

    let outbound = Arc::new(LineWriter {
        peer: format!("tcp:{peer}"),
        writer: Mutex::new(FramedWrite::new(write_half, LinesCodec::new())),
        timeout: relay.config().write_bound(),
    });
    let id = relay.attach(outbound).await;

    let mut frames = FramedRead::new(read_half, LinesCodec::new());
    while let Some(next) = frames.next().await {
        match next {
            Ok(line) => relay.handle_frame(id, &line).await,
            Err(_) => break,
        }
    }

    relay.detach(id).await;
}

/// Outbound half of one connection: serialized, bounded line writes.
struct LineWriter {
    peer: String,
    writer: Mutex<FramedWrite<OwnedWriteHalf, LinesCodec>>,
    timeout: Option<Duration>,
}

#[async_trait]
impl Outbound for LineWriter {
    async fn send(&self, payload: Bytes) -> Result<(), TransportError> {
        let line = String::from_utf8_lossy(&payload).into_owned();

        let write = async {
            let mut writer = self.writer.lock().await;
            writer.send(line).await
        };
        let result = match self.timeout {
            Some(bound) => match time::timeout(bound, write).await {
                Ok(res) => res,
                Err(_) => return Err(TransportError::Timeout { timeout: bound }),
            },
            None => write.await,
        };

        result.map_err(|err| match err {
            LinesCodecError::Io(io) if is_gone(io.kind()) => TransportError::Closed,
            LinesCodecError::Io(io) => TransportError::Io {
                error: io.to_string(),
            },
            LinesCodecError::MaxLineLengthExceeded => TransportError::Io {
                error: "max line length exceeded".to_string(),
            },
        })
    }

    fn name(&self) -> &str {
        &self.peer
    }
}

fn is_gone(kind: std::io::ErrorKind) -> bool {
    use std::io::ErrorKind;
    matches!(
        kind,
        ErrorKind::BrokenPipe
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::NotConnected
            | ErrorKind::UnexpectedEof
    )
}
