//! Action event stream
//!
//! Server-Sent Events carrying every action transition as JSON. Streams end
//! once the simulator has shut down so graceful server shutdown can drain.

use std::convert::Infallible;

use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use fleet_core::ActionEvent;
use serde::Deserialize;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::warn;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    /// Only forward events for this device
    pub device_id: Option<String>,
}

/// GET /fleet/v1/events
pub async fn stream_events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> impl IntoResponse {
    let receiver = state.service().subscribe();
    let stopped = state.service().stopped();
    let device_filter = query.device_id;

    let events = BroadcastStream::new(receiver).filter_map(move |result| match result {
        Ok(event) => to_sse_event(&event, device_filter.as_deref()).map(Ok::<_, Infallible>),
        Err(_) => None, // Skip lagged messages
    });
    let stream = futures::StreamExt::take_until(events, stopped);

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Encode one event, or `None` if it is filtered out or cannot be encoded
fn to_sse_event(event: &ActionEvent, device_filter: Option<&str>) -> Option<Event> {
    if device_filter.is_some_and(|id| id != event.device_id) {
        return None;
    }
    match serde_json::to_string(event) {
        Ok(json) => Some(Event::default().event("action").data(json)),
        Err(e) => {
            warn!(action_id = %event.action_id, error = %e, "Dropping unencodable action event");
            None
        }
    }
}
