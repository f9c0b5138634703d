//! Server-Sent Events stream of status events.

use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use futures_util::stream::{self, Stream};
use tracing::debug;
use vscan_events::Subscription;
use vscan_models::Event;

use crate::metrics;
use crate::state::AppState;

/// Keep-alive comment interval.
pub const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Marks the connection closed when the stream is dropped.
struct ConnectionGuard {
    subscriber_id: u64,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        metrics::record_sse_disconnect();
        debug!(subscriber_id = self.subscriber_id, "Event stream closed");
    }
}

/// Render a bus event as an SSE frame (`event: <type>`, `data: <json>`).
pub fn to_sse_event(event: &Event) -> Result<SseEvent, anyhow::Error> {
    Ok(SseEvent::default().event(event.name()).data(event.data()?))
}

/// `GET /api/events`: subscribe this connection to the event bus.
pub async fn events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<SseEvent, anyhow::Error>>> {
    let subscription = state.events.subscribe();
    let guard = ConnectionGuard {
        subscriber_id: subscription.id(),
    };
    metrics::record_sse_connection();
    debug!(subscriber_id = subscription.id(), "Event stream opened");

    event_stream(subscription, guard)
}

fn event_stream(
    subscription: Subscription,
    guard: ConnectionGuard,
) -> Sse<impl Stream<Item = Result<SseEvent, anyhow::Error>>> {
    let stream = stream::unfold(
        (subscription, guard),
        move |(mut subscription, guard)| async move {
            let event = subscription.recv().await?;
            metrics::record_sse_event(event.name());
            Some((to_sse_event(&event), (subscription, guard)))
        },
    );

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(KEEP_ALIVE_INTERVAL)
            .text("keep-alive"),
    )
}
