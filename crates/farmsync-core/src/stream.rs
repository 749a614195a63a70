// ── Reactive record streams ──
//
// Subscription types for consuming record-set changes from the store.
// Each subscriber owns an ordered queue: it starts at the snapshot current
// when it subscribed and then receives one snapshot per committed write,
// in commit order, exactly once.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::convert::farms_from_stored;
use crate::model::Farm;
use crate::store::StoredFarm;

/// A subscription to an ordered record set.
///
/// Provides both point-in-time snapshot access and reactive change
/// notification via the `changed()` method or by converting to a `Stream`.
/// Obtained from [`SnapshotPublisher::subscribe()`].
///
/// [`SnapshotPublisher::subscribe()`]: crate::store::SnapshotPublisher::subscribe
pub struct RecordStream<T: Clone + Send + Sync + 'static> {
    current: Arc<Vec<T>>,
    receiver: mpsc::UnboundedReceiver<Arc<Vec<T>>>,
}

impl<T: Clone + Send + Sync + 'static> RecordStream<T> {
    pub(crate) fn new(
        current: Arc<Vec<T>>,
        receiver: mpsc::UnboundedReceiver<Arc<Vec<T>>>,
    ) -> Self {
        Self { current, receiver }
    }

    /// The snapshot at subscription time, or the one last returned by
    /// `changed()`.
    pub fn current(&self) -> &Arc<Vec<T>> {
        &self.current
    }

    /// Wait for the next write, returning its snapshot.
    /// Returns `None` if the store has been dropped.
    pub async fn changed(&mut self) -> Option<Arc<Vec<T>>> {
        let snap = self.receiver.recv().await?;
        self.current = Arc::clone(&snap);
        Some(snap)
    }

    /// Take the next queued snapshot without waiting.
    pub fn try_changed(&mut self) -> Option<Arc<Vec<T>>> {
        let snap = self.receiver.try_recv().ok()?;
        self.current = Arc::clone(&snap);
        Some(snap)
    }

    /// Convert into a `Stream` that yields the current snapshot first and
    /// then one snapshot per write.
    pub fn into_stream(self) -> RecordChangeStream<T> {
        RecordChangeStream {
            first: Some(self.current),
            inner: UnboundedReceiverStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter over a [`RecordStream`].
pub struct RecordChangeStream<T: Clone + Send + Sync + 'static> {
    first: Option<Arc<Vec<T>>>,
    inner: UnboundedReceiverStream<Arc<Vec<T>>>,
}

impl<T: Clone + Send + Sync + 'static> Stream for RecordChangeStream<T> {
    type Item = Arc<Vec<T>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if let Some(first) = self.first.take() {
            return Poll::Ready(Some(first));
        }
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

/// The store stream mapped 1:1 to domain [`Farm`] values.
///
/// Same cardinality and ordering as the underlying store stream.
pub struct FarmStream {
    inner: RecordStream<StoredFarm>,
}

impl FarmStream {
    pub(crate) fn new(inner: RecordStream<StoredFarm>) -> Self {
        Self { inner }
    }

    pub fn current(&self) -> Vec<Farm> {
        farms_from_stored(self.inner.current())
    }

    /// Wait for the next store write. `None` once the store is gone.
    pub async fn changed(&mut self) -> Option<Vec<Farm>> {
        let snap = self.inner.changed().await?;
        Some(farms_from_stored(&snap))
    }

    pub fn into_stream(self) -> impl Stream<Item = Vec<Farm>> + Send + Unpin {
        self.inner
            .into_stream()
            .map(|snap| farms_from_stored(&snap))
    }
}
