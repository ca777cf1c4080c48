//! Real-time broadcast hub: fan a text message out to every currently
//! connected listener.
//!
//! This is the unrelated push-notification collaborator that co-resides in
//! the repository; the fan-out executor does not depend on it. One
//! operation, `broadcast(text)`, delivers the message to all live
//! subscriptions. Listeners that subscribe after a broadcast do not see it.

use tokio::sync::broadcast;
use tracing::debug;

/// Default per-listener backlog before the slowest listener starts losing
/// messages.
pub const DEFAULT_CAPACITY: usize = 64;

/// A broadcast hub. Cheap to share behind an `Arc`; `broadcast` takes
/// `&self`.
pub struct Hub {
    tx: broadcast::Sender<String>,
}

impl Hub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Connect a new listener. The listener receives every message
    /// broadcast from this point on.
    pub fn subscribe(&self) -> Listener {
        Listener {
            rx: self.tx.subscribe(),
        }
    }

    /// Fan `text` out to all currently connected listeners. Returns the
    /// number of listeners the message was delivered to; zero listeners is
    /// not an error.
    pub fn broadcast(&self, text: impl Into<String>) -> usize {
        let text = text.into();
        debug!(listeners = self.listener_count(), "hub broadcast");
        self.tx.send(text).unwrap_or(0)
    }

    /// Number of currently connected listeners.
    pub fn listener_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// One connected listener.
pub struct Listener {
    rx: broadcast::Receiver<String>,
}

impl Listener {
    /// Receive the next broadcast message. Returns `None` once the hub is
    /// dropped and the backlog is drained. A listener that lagged past the
    /// hub capacity skips ahead to the oldest retained message.
    pub async fn recv(&mut self) -> Option<String> {
        loop {
            match self.rx.recv().await {
                Ok(text) => return Some(text),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "hub listener lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
