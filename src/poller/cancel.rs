//! Cooperative cancellation flag shared between a caller and a poller.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

/// Caller-owned cancellation signal.
///
/// Clones share the same flag. Once set it stays set.
#[derive(Debug, Clone)]
pub struct CancelFlag {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for CancelFlag {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelFlag {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Sets the flag and wakes every pending [`CancelFlag::wait`].
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Waits up to `timeout` for cancellation. Returns true as soon as the
    /// flag is set, false if the timeout elapsed first.
    pub async fn wait(&self, timeout: Duration) -> bool {
        let mut rx = self.tx.subscribe();
        matches!(
            tokio::time::timeout(timeout, rx.wait_for(|cancelled| *cancelled)).await,
            Ok(Ok(_))
        )
    }
}
