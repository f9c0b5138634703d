//! Channel-based publish/subscribe.

use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};

use futures_util::Stream;
use parking_lot::Mutex;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};
use vscan_models::Event;

/// Default per-subscriber buffer.
pub const DEFAULT_BUFFER: usize = 256;

/// Identifier handed out on subscribe.
pub type SubscriberId = u64;

struct Sink {
    id: SubscriberId,
    tx: mpsc::Sender<Event>,
}

/// Multi-subscriber broadcast of status events.
///
/// Sinks are kept in registration order behind a single lock, so every
/// subscriber sees events in publish order. There is no replay.
pub struct EventBus {
    sinks: Mutex<Vec<Sink>>,
    next_id: AtomicU64,
    buffer: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER)
    }
}

impl EventBus {
    /// Create a bus whose subscribers each buffer up to `buffer` events.
    pub fn new(buffer: usize) -> Self {
        Self {
            sinks: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            buffer: buffer.max(1),
        }
    }

    /// Register a new subscriber.
    pub fn subscribe(&self) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.buffer);
        let mut sinks = self.sinks.lock();
        sinks.push(Sink { id, tx });
        debug!(subscriber_id = id, subscribers = sinks.len(), "Subscriber registered");
        Subscription { id, rx }
    }

    /// Remove a subscriber. Returns false if it was already gone.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut sinks = self.sinks.lock();
        let before = sinks.len();
        sinks.retain(|sink| sink.id != id);
        before != sinks.len()
    }

    /// Deliver `event` to every current subscriber.
    ///
    /// Closed sinks are pruned; a sink with a full buffer misses this event
    /// but stays registered. Returns the number of sinks that accepted it.
    pub fn publish(&self, event: Event) -> usize {
        let mut sinks = self.sinks.lock();
        let mut delivered = 0;

        sinks.retain(|sink| match sink.tx.try_send(event.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                warn!(
                    subscriber_id = sink.id,
                    event = event.name(),
                    "Subscriber buffer full, dropping event"
                );
                true
            }
            Err(TrySendError::Closed(_)) => {
                debug!(subscriber_id = sink.id, "Pruning closed subscriber");
                false
            }
        });

        delivered
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sinks.lock().len()
    }
}

/// Receiving half of a subscription. Dropping it closes the sink.
pub struct Subscription {
    id: SubscriberId,
    rx: mpsc::Receiver<Event>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Wait for the next event. `None` once the bus has dropped this sink.
    pub async fn recv(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    /// Take an already buffered event without waiting.
    pub fn try_recv(&mut self) -> Option<Event> {
        self.rx.try_recv().ok()
    }
}

impl Stream for Subscription {
    type Item = Event;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
