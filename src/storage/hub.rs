use async_channel::{Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use tracing::warn;

use super::StorageChange;

/// Events buffered per subscriber before new ones are dropped.
pub const CHANGE_BUFFER: usize = 64;

/// Fans storage change events out to every live subscriber.
#[derive(Default)]
pub struct ChangeHub {
    subscribers: Mutex<Vec<Sender<StorageChange>>>,
}

impl ChangeHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Receiver<StorageChange> {
        let (tx, rx) = async_channel::bounded(CHANGE_BUFFER);
        self.subscribers.lock().push(tx);
        rx
    }

    /// Deliver `change` to all subscribers, dropping closed ones.
    pub fn emit(&self, change: StorageChange) {
        self.subscribers
            .lock()
            .retain(|tx| match tx.try_send(change.clone()) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    warn!(area = %change.area, key = %change.key, "Change subscriber is lagging, event dropped");
                    true
                }
                Err(TrySendError::Closed(_)) => false,
            });
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{ChangeOrigin, StorageArea};

    fn change(key: &str) -> StorageChange {
        StorageChange {
            area: StorageArea::Sync,
            key: key.to_string(),
            origin: ChangeOrigin::ThisInstance,
        }
    }

    #[test]
    fn every_subscriber_receives_events() {
        let hub = ChangeHub::new();
        let a = hub.subscribe();
        let b = hub.subscribe();
        hub.emit(change("keys"));
        assert_eq!(a.try_recv().unwrap(), change("keys"));
        assert_eq!(b.try_recv().unwrap(), change("keys"));
    }

    #[test]
    fn closed_subscribers_are_dropped() {
        let hub = ChangeHub::new();
        let rx = hub.subscribe();
        drop(rx);
        hub.emit(change("keys"));
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn full_subscriber_is_kept() {
        let hub = ChangeHub::new();
        let rx = hub.subscribe();
        for _ in 0..CHANGE_BUFFER + 5 {
            hub.emit(change("keys"));
        }
        assert_eq!(hub.subscriber_count(), 1);
        assert_eq!(rx.len(), CHANGE_BUFFER);
    }
}
