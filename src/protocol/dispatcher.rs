//! Subscriber fan-out for decoded transport events.
//!
//! Upper layers register a [`TransportEvents`] implementation and receive
//! connection notifications and decrypted `(proto_id, payload)` pairs. The
//! dispatcher has no knowledge of application message schemas; routing on
//! `proto_id` happens in the subscriber.
//!
//! Zero or more subscribers may be registered; events fire in registration
//! order.

use std::sync::{Arc, RwLock};
use tracing::warn;

use crate::error::{constants, Result, TransportError};

/// Callback surface exposed to upper layers.
///
/// `on_connected` and `on_disconnected` have empty default bodies so
/// subscribers that only care about traffic implement just `on_message`.
pub trait TransportEvents: Send + Sync {
    /// Fired once the handshake completes and the loops are running.
    fn on_connected(&self) {}

    /// Fired exactly once per teardown with a human-readable reason.
    fn on_disconnected(&self, _reason: &str) {}

    /// Fired for every decrypted non-heartbeat frame, in arrival order.
    fn on_message(&self, proto_id: i32, payload: &[u8]);
}

/// Event dispatcher fanning transport events out to registered subscribers.
pub struct Dispatcher {
    subscribers: Arc<RwLock<Vec<Arc<dyn TransportEvents>>>>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Register a subscriber. Subscribers are invoked in registration order
    /// and cannot be removed for the lifetime of the dispatcher.
    pub fn subscribe(&self, subscriber: Arc<dyn TransportEvents>) -> Result<()> {
        let mut subscribers = self
            .subscribers
            .write()
            .map_err(|_| TransportError::Custom(constants::ERR_DISPATCH_WRITE_LOCK.to_string()))?;

        subscribers.push(subscriber);
        Ok(())
    }

    pub fn emit_connected(&self) {
        self.for_each(|subscriber| subscriber.on_connected());
    }

    pub fn emit_disconnected(&self, reason: &str) {
        self.for_each(|subscriber| subscriber.on_disconnected(reason));
    }

    pub fn emit_message(&self, proto_id: i32, payload: &[u8]) {
        self.for_each(|subscriber| subscriber.on_message(proto_id, payload));
    }

    /// Emission is best-effort from the receive loop; a poisoned registry
    /// lock drops the event rather than tearing the connection down.
    fn for_each(&self, f: impl Fn(&Arc<dyn TransportEvents>)) {
        match self.subscribers.read() {
            Ok(subscribers) => {
                for subscriber in subscribers.iter() {
                    f(subscriber);
                }
            }
            Err(_) => warn!("{}", constants::ERR_DISPATCH_READ_LOCK),
        }
    }
}
