//! Cart change notification.
//!
//! Stores sharing one storage backend (several tabs of one origin) also
//! share one [`ChangeBus`]. After every mutation a store publishes a
//! payload-free [`CartChanged`] signal; listeners may react by re-reading
//! storage.
//!
//! The signal is advisory. There is no locking and no merging: two stores
//! writing the same key overwrite each other and the last write wins.

use tokio::sync::broadcast::{
    self,
    error::{RecvError, TryRecvError},
};
use tracing::{debug, trace};

/// Signals buffered per subscriber before older ones are dropped.
const CHANNEL_CAPACITY: usize = 16;

/// Signal that some store wrote the cart. Carries no data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartChanged;

/// Publisher side of the change notification.
///
/// Cheaply cloneable; clones publish to the same subscribers.
#[derive(Debug, Clone)]
pub struct ChangeBus {
    sender: broadcast::Sender<CartChanged>,
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeBus {
    /// Create a bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Broadcast a change signal.
    ///
    /// Returns the number of subscribers that will see it. Publishing with
    /// no subscribers is not an error.
    pub fn publish(&self) -> usize {
        self.sender.send(CartChanged).unwrap_or_else(|_| {
            trace!("No cart change subscribers");
            0
        })
    }

    /// Start listening for change signals published after this call.
    #[must_use]
    pub fn subscribe(&self) -> CartSubscription {
        CartSubscription {
            receiver: self.sender.subscribe(),
        }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Receiving side of the change notification.
#[derive(Debug)]
pub struct CartSubscription {
    receiver: broadcast::Receiver<CartChanged>,
}

impl CartSubscription {
    /// Drain queued signals without waiting.
    ///
    /// Returns `true` if at least one signal arrived since the last call.
    /// Dropped signals (a lagging subscriber) also count as a change.
    pub fn take_pending(&mut self) -> bool {
        self.take_pending_count() > 0
    }

    /// Drain queued signals without waiting and count them.
    ///
    /// Signals dropped while the subscriber lagged are included, so the
    /// count equals the number published since the last drain.
    pub fn take_pending_count(&mut self) -> usize {
        let mut count = 0usize;
        loop {
            match self.receiver.try_recv() {
                Ok(CartChanged) => count = count.saturating_add(1),
                Err(TryRecvError::Lagged(skipped)) => {
                    debug!(skipped, "Cart change subscriber lagged");
                    count = count.saturating_add(usize::try_from(skipped).unwrap_or(usize::MAX));
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return count,
            }
        }
    }

    /// Wait for the next signal.
    ///
    /// Returns `false` once every publisher has been dropped.
    pub async fn changed(&mut self) -> bool {
        match self.receiver.recv().await {
            Ok(CartChanged) => true,
            Err(RecvError::Lagged(skipped)) => {
                debug!(skipped, "Cart change subscriber lagged");
                true
            }
            Err(RecvError::Closed) => false,
        }
    }
}
