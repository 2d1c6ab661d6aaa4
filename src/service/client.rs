//! Connection manager for the secure game-server link.
//!
//! [`NetClient`] owns the entire lifecycle of one connection: it opens the
//! TCP stream, runs the key exchange, holds the session key, and drives the
//! receive and heartbeat loops. Upper layers interact with it only through
//! [`TransportEvents`] subscriptions and `send` calls with opaque
//! `(proto_id, payload)` pairs.
//!
//! ## State machine
//! ```text
//! Disconnected --connect()--> Connecting --handshake ok--> Connected
//!        ^                                                     |
//!        +---------------- disconnect()/error -----------------+
//! ```
//! `connect()` while already connected is a success no-op; while a connect
//! is in flight it is rejected, not queued. `disconnect()` is idempotent.
//!
//! ## Concurrency
//! Once connected, two tokio tasks run against a shared cancellation token:
//! the receive loop (owns the read half) and the heartbeat loop. All writes
//! go through one mutex-guarded sink, so every frame hits the wire as a
//! single uninterleaved header+payload sequence.

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::Mutex as AsyncMutex;
use tokio_util::codec::Framed;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::config::ClientConfig;
use crate::core::codec::FrameCodec;
use crate::core::packet::{Frame, HEARTBEAT_PROTO_ID};
use crate::error::{constants, Result, TransportError};
use crate::protocol::dispatcher::{Dispatcher, TransportEvents};
use crate::protocol::handshake::{KeyExchange, SessionKey};
use crate::utils::crypto;
use crate::utils::timeout::with_timeout;

type FrameSink = SplitSink<Framed<TcpStream, FrameCodec>, Frame>;
type FrameStream = SplitStream<Framed<TcpStream, FrameCodec>>;

/// Public view of the connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Live resources of one established session. Dropped as a unit on
/// disconnect: the sink drop closes the socket, the key zeroizes itself.
struct Active {
    sink: AsyncMutex<FrameSink>,
    key: SessionKey,
    cancel: CancellationToken,
}

enum ConnState {
    Disconnected,
    Connecting,
    Connected(Arc<Active>),
}

struct ClientInner {
    config: ClientConfig,
    dispatcher: Dispatcher,
    state: Mutex<ConnState>,
}

/// Client-side connection manager.
///
/// Cheap to clone; all clones share one connection. Construct it explicitly
/// and hand it to whichever component coordinates the application — there is
/// no global instance.
#[derive(Clone)]
pub struct NetClient {
    inner: Arc<ClientInner>,
}

impl NetClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                config,
                dispatcher: Dispatcher::new(),
                state: Mutex::new(ConnState::Disconnected),
            }),
        }
    }

    /// Register a subscriber for connection events and decoded messages.
    pub fn subscribe(&self, subscriber: Arc<dyn TransportEvents>) -> Result<()> {
        self.inner.dispatcher.subscribe(subscriber)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        match self.inner.state.lock() {
            Ok(state) => match &*state {
                ConnState::Disconnected => ConnectionState::Disconnected,
                ConnState::Connecting => ConnectionState::Connecting,
                ConnState::Connected(_) => ConnectionState::Connected,
            },
            Err(_) => ConnectionState::Disconnected,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Open the stream, run the key exchange, and start the receive and
    /// heartbeat loops.
    ///
    /// A call while already connected succeeds without doing anything; a
    /// call while another connect is in flight fails with
    /// `ConnectInProgress` immediately, without starting a second handshake.
    /// Any failure tears down partial state before returning — the stream is
    /// never left half-open.
    #[instrument(skip(self), fields(addr = %self.inner.config.address()))]
    pub async fn connect(&self) -> Result<()> {
        {
            let mut state = self.inner.state_guard()?;
            match &*state {
                ConnState::Connected(_) => {
                    debug!("already connected");
                    return Ok(());
                }
                ConnState::Connecting => {
                    warn!("connect already in progress");
                    return Err(TransportError::ConnectInProgress);
                }
                ConnState::Disconnected => *state = ConnState::Connecting,
            }
        }

        match self.establish().await {
            Ok((active, frames)) => {
                {
                    let mut state = self.inner.state_guard()?;
                    *state = ConnState::Connected(active.clone());
                }

                // Loops hold the inner state weakly so a dropped client does
                // not keep the session alive indefinitely.
                tokio::spawn(recv_loop(Arc::downgrade(&self.inner), active.clone(), frames));
                tokio::spawn(heartbeat_loop(
                    Arc::downgrade(&self.inner),
                    active,
                    self.inner.config.heartbeat_interval,
                ));

                info!("connected");
                self.inner.dispatcher.emit_connected();
                Ok(())
            }
            Err(e) => {
                if let Ok(mut state) = self.inner.state.lock() {
                    *state = ConnState::Disconnected;
                }
                error!(error = %e, "connection failed");
                Err(e)
            }
        }
    }

    /// Dial the server and complete the handshake. The stream (and any
    /// partially derived state) is dropped on the error path.
    async fn establish(&self) -> Result<(Arc<Active>, FrameStream)> {
        let config = &self.inner.config;
        let addr = config.address();

        let mut stream = with_timeout(
            async { Ok(TcpStream::connect(&addr).await?) },
            config.connect_timeout,
        )
        .await?;

        debug!("performing key exchange");
        let key = KeyExchange::new().run(&mut stream).await?;

        let (sink, frames) = Framed::new(stream, FrameCodec).split();

        let active = Arc::new(Active {
            sink: AsyncMutex::new(sink),
            key,
            cancel: CancellationToken::new(),
        });

        Ok((active, frames))
    }

    /// Tear the connection down and notify subscribers with `reason`.
    ///
    /// Idempotent: calling while already disconnected is a no-op. While a
    /// connect is still in flight it is also a no-op; the connect path owns
    /// its own teardown.
    pub fn disconnect(&self, reason: &str) {
        self.inner.disconnect(reason);
    }

    /// Encrypt, frame, and write one application message.
    ///
    /// Heartbeats (`proto_id` 0) are sent unencrypted with an empty payload;
    /// empty payloads skip encryption. A write failure disconnects with the
    /// underlying error as the reason.
    ///
    /// # Errors
    /// `TransportError::NotConnected` when no session is established.
    #[instrument(skip(self, payload), fields(bytes = payload.len()))]
    pub async fn send(&self, proto_id: i32, payload: &[u8]) -> Result<()> {
        let active = {
            let state = self.inner.state_guard()?;
            match &*state {
                ConnState::Connected(active) => active.clone(),
                _ => return Err(TransportError::NotConnected),
            }
        };

        let frame = if proto_id == HEARTBEAT_PROTO_ID {
            Frame::heartbeat()
        } else if payload.is_empty() {
            Frame::new(proto_id, Vec::new())
        } else {
            let sealed = crypto::encrypt(payload, active.key.as_bytes(), None)?;
            Frame::new(proto_id, sealed)
        };

        let result = {
            let mut sink = active.sink.lock().await;
            sink.send(frame).await
        };

        if let Err(e) = result {
            let reason = format!("send error: {e}");
            self.inner.disconnect(&reason);
            return Err(e);
        }

        debug!(proto_id, "frame sent");
        Ok(())
    }

    /// Serialize `message` with bincode and send it under `proto_id`.
    pub async fn send_message<T: Serialize>(&self, proto_id: i32, message: &T) -> Result<()> {
        let payload = bincode::serialize(message)?;
        self.send(proto_id, &payload).await
    }
}

/// Deserialize a dispatched payload into a typed message.
pub fn decode_message<T: DeserializeOwned>(payload: &[u8]) -> Result<T> {
    Ok(bincode::deserialize(payload)?)
}

impl ClientInner {
    fn state_guard(&self) -> Result<MutexGuard<'_, ConnState>> {
        self.state
            .lock()
            .map_err(|_| TransportError::Custom(constants::ERR_STATE_LOCK.to_string()))
    }

    fn disconnect(&self, reason: &str) {
        let active = match self.state.lock() {
            Ok(mut state) => {
                if let ConnState::Connected(active) = &*state {
                    let active = active.clone();
                    *state = ConnState::Disconnected;
                    Some(active)
                } else {
                    None
                }
            }
            Err(_) => {
                warn!("{}", constants::ERR_STATE_LOCK);
                None
            }
        };

        let Some(active) = active else {
            return;
        };

        info!(%reason, "disconnecting");
        active.cancel.cancel();
        self.dispatcher.emit_disconnected(reason);
        // Dropping the last Active reference closes the socket and zeroizes
        // the session key.
    }
}

/// Reads frames in arrival order until cancelled or the stream fails.
///
/// Heartbeat acks are discarded; everything else is decrypted and handed to
/// the dispatcher. A decrypt failure drops that one frame and keeps the
/// connection; a stream failure or remote close tears the connection down.
async fn recv_loop(inner: Weak<ClientInner>, active: Arc<Active>, mut frames: FrameStream) {
    loop {
        let next = tokio::select! {
            _ = active.cancel.cancelled() => break,
            next = frames.next() => next,
        };

        let Some(inner) = inner.upgrade() else {
            // Every client handle is gone; stop the session.
            active.cancel.cancel();
            break;
        };

        let frame = match next {
            Some(Ok(frame)) => frame,
            Some(Err(e)) => {
                inner.disconnect(&format!("receive error: {e}"));
                break;
            }
            None => {
                inner.disconnect(constants::REASON_REMOTE_CLOSED);
                break;
            }
        };

        if frame.is_heartbeat() {
            trace!("heartbeat ack received");
            continue;
        }

        debug!(
            proto_id = frame.proto_id,
            bytes = frame.payload.len(),
            "frame received"
        );

        if frame.payload.is_empty() {
            inner.dispatcher.emit_message(frame.proto_id, &[]);
            continue;
        }

        match crypto::decrypt(&frame.payload, active.key.as_bytes()) {
            Ok(plaintext) => inner.dispatcher.emit_message(frame.proto_id, &plaintext),
            Err(e) => {
                // One bad frame does not cost the session.
                warn!(proto_id = frame.proto_id, error = %e, "dropping undecryptable frame");
            }
        }
    }
}

/// Sends an empty `proto_id` 0 frame at the configured interval until
/// cancelled; a failed send tears the connection down.
async fn heartbeat_loop(inner: Weak<ClientInner>, active: Arc<Active>, interval: Duration) {
    loop {
        tokio::select! {
            _ = active.cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }

        let Some(inner) = inner.upgrade() else {
            active.cancel.cancel();
            break;
        };

        let result = {
            let mut sink = active.sink.lock().await;
            sink.send(Frame::heartbeat()).await
        };

        match result {
            Ok(()) => trace!("heartbeat sent"),
            Err(e) => {
                inner.disconnect(&format!("heartbeat error: {e}"));
                break;
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_disconnected() {
        let client = NetClient::new(ClientConfig::default());
        assert_eq!(client.state(), ConnectionState::Disconnected);
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn test_send_requires_connection() {
        let client = NetClient::new(ClientConfig::default());
        assert!(matches!(
            client.send(1002, b"payload").await,
            Err(TransportError::NotConnected)
        ));
    }

    #[test]
    fn test_disconnect_when_disconnected_is_noop() {
        let client = NetClient::new(ClientConfig::default());
        client.disconnect("nothing to do");
        client.disconnect("still nothing");
        assert_eq!(client.state(), ConnectionState::Disconnected);
    }
}
