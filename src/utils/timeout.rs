//! Async timeout wrappers and shared duration defaults.

use std::future::Future;
use std::time::Duration;

use crate::error::{Result, TransportError};

/// Default timeout for connect and other one-shot operations.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default interval between keep-alive frames.
pub const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(5);

/// Run `fut` with a deadline, mapping expiry to `TransportError::Timeout`.
pub async fn with_timeout<F, T>(fut: F, duration: Duration) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(duration, fut).await {
        Ok(result) => result,
        Err(_) => Err(TransportError::Timeout),
    }
}
