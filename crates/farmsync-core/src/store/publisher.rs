// ── Snapshot publisher ──
//
// Holds the latest ordered record set and hands every published
// replacement to each subscriber's own queue, in publish order. Every
// publish bumps a version counter so callers can tell "written again with
// equal content" apart from "not written".

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{mpsc, watch};

use crate::stream::RecordStream;

type Subscriber<T> = mpsc::UnboundedSender<Arc<Vec<T>>>;

/// Fan-out point for record-set snapshots.
///
/// Record stores call [`publish()`](Self::publish) once per committed
/// write and hand out subscriptions via [`subscribe()`](Self::subscribe).
/// A subscriber receives every published snapshot exactly once, in order,
/// however far it lags behind.
pub struct SnapshotPublisher<T: Clone + Send + Sync + 'static> {
    /// Version counter, bumped on every publish.
    version: watch::Sender<u64>,

    /// Latest snapshot, for point-in-time reads.
    snapshot: watch::Sender<Arc<Vec<T>>>,

    /// Live subscriber queues. Held while publishing so a new subscriber
    /// either sees a snapshot as its starting point or receives it
    /// queued, never both and never neither.
    subscribers: Mutex<Vec<Subscriber<T>>>,
}

impl<T: Clone + Send + Sync + 'static> SnapshotPublisher<T> {
    pub fn new(initial: Vec<T>) -> Self {
        let (version, _) = watch::channel(0u64);
        let (snapshot, _) = watch::channel(Arc::new(initial));
        Self {
            version,
            snapshot,
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Replace the snapshot and queue it for every live subscriber.
    /// Subscribers that were dropped are forgotten here.
    pub fn publish(&self, values: Vec<T>) {
        let values = Arc::new(values);
        let mut subscribers = self.lock_subscribers();

        // `send_replace` updates unconditionally, even with zero receivers.
        self.snapshot.send_replace(Arc::clone(&values));
        self.version.send_modify(|v| *v += 1);
        subscribers.retain(|tx| tx.send(Arc::clone(&values)).is_ok());
    }

    /// Get the current snapshot (cheap `Arc` clone).
    pub fn snapshot(&self) -> Arc<Vec<T>> {
        self.snapshot.borrow().clone()
    }

    /// Subscribe starting at the current snapshot.
    pub fn subscribe(&self) -> RecordStream<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut subscribers = self.lock_subscribers();
        let current = self.snapshot.borrow().clone();
        subscribers.push(tx);
        RecordStream::new(current, rx)
    }

    /// Number of publishes so far.
    pub fn version(&self) -> u64 {
        *self.version.borrow()
    }

    #[cfg(test)]
    fn subscriber_count(&self) -> usize {
        self.lock_subscribers().len()
    }

    // Nothing panics while the lock is held, so a poisoned list is intact.
    fn lock_subscribers(&self) -> MutexGuard<'_, Vec<Subscriber<T>>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_initial_values() {
        let publisher = SnapshotPublisher::new(vec!["a".to_owned()]);
        assert_eq!(*publisher.snapshot(), vec!["a".to_owned()]);
        assert_eq!(publisher.version(), 0);
    }

    #[test]
    fn publish_replaces_snapshot_and_bumps_version() {
        let publisher: SnapshotPublisher<String> = SnapshotPublisher::new(Vec::new());
        publisher.publish(vec!["x".into(), "y".into()]);
        assert_eq!(publisher.snapshot().len(), 2);
        assert_eq!(publisher.version(), 1);

        publisher.publish(vec!["x".into(), "y".into()]);
        assert_eq!(publisher.version(), 2);
    }

    #[tokio::test]
    async fn subscribers_see_current_then_changes() {
        let publisher: SnapshotPublisher<u32> = SnapshotPublisher::new(vec![1]);
        let mut stream = publisher.subscribe();
        assert_eq!(**stream.current(), vec![1]);

        publisher.publish(vec![1, 2]);
        let next = stream.changed().await.unwrap();
        assert_eq!(*next, vec![1, 2]);
    }

    #[tokio::test]
    async fn equal_content_still_notifies() {
        let publisher: SnapshotPublisher<u32> = SnapshotPublisher::new(vec![7]);
        let mut stream = publisher.subscribe();

        publisher.publish(vec![7]);
        let next = stream.changed().await.unwrap();
        assert_eq!(*next, vec![7]);
    }

    #[tokio::test]
    async fn lagging_subscriber_receives_every_publish_in_order() {
        let publisher: SnapshotPublisher<u32> = SnapshotPublisher::new(vec![0]);
        let mut stream = publisher.subscribe();

        publisher.publish(vec![1]);
        publisher.publish(vec![1, 2]);
        publisher.publish(vec![1, 2, 3]);

        assert_eq!(*stream.changed().await.unwrap(), vec![1]);
        assert_eq!(*stream.changed().await.unwrap(), vec![1, 2]);
        assert_eq!(*stream.changed().await.unwrap(), vec![1, 2, 3]);
        assert!(stream.try_changed().is_none());
    }

    #[test]
    fn late_subscriber_starts_after_earlier_publishes() {
        let publisher: SnapshotPublisher<u32> = SnapshotPublisher::new(Vec::new());
        publisher.publish(vec![1]);

        let mut stream = publisher.subscribe();
        assert_eq!(**stream.current(), vec![1]);
        assert!(stream.try_changed().is_none());
    }

    #[test]
    fn dropped_subscribers_are_pruned_on_publish() {
        let publisher: SnapshotPublisher<u32> = SnapshotPublisher::new(Vec::new());
        let kept = publisher.subscribe();
        drop(publisher.subscribe());
        assert_eq!(publisher.subscriber_count(), 2);

        publisher.publish(vec![1]);
        assert_eq!(publisher.subscriber_count(), 1);
        drop(kept);
    }
}
