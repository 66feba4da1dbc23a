//! Cooperative cancellation

use tokio_util::sync::CancellationToken;

/// Shared stop request
///
/// Cloning shares the request. Once stopped it stays stopped.
#[derive(Debug, Clone, Default)]
pub struct StopFlag {
    token: CancellationToken,
}

impl StopFlag {
    /// A flag that has not been raised
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop and wake every waiter
    pub fn stop(&self) {
        self.token.cancel();
    }

    /// Whether a stop was requested
    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolve once a stop is requested
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    /// The underlying token, for callers that already speak `tokio_util`
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl From<CancellationToken> for StopFlag {
    fn from(token: CancellationToken) -> Self {
        Self { token }
    }
}
