//! Action event streaming
//!
//! # Example
//!
//! ```no_run
//! use fleet_client::FleetClient;
//! use futures::StreamExt;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = FleetClient::new("http://localhost:50051")?;
//! let mut events = client.events(Some("dev-1")).await?;
//!
//! while let Some(event) = events.next().await {
//!     let event = event?;
//!     println!("{} -> {}", event.action_id, event.status);
//! }
//! # Ok(())
//! # }
//! ```

mod parser;

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use fleet_core::ActionEvent;
use futures::stream::{BoxStream, Stream, StreamExt};
use thiserror::Error;

use parser::SseParser;

/// Errors that can occur while following the event stream
#[derive(Debug, Error)]
pub enum EventError {
    /// HTTP/connection error
    #[error("Connection error: {0}")]
    Connection(#[from] reqwest::Error),

    /// Failed to parse SSE event
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Result type for streaming operations
pub type EventResult<T> = std::result::Result<T, EventError>;

/// Stream of [`ActionEvent`]s read from `GET /fleet/v1/events`
pub struct EventStream {
    bytes: BoxStream<'static, reqwest::Result<Bytes>>,
    parser: SseParser,
    pending: VecDeque<EventResult<ActionEvent>>,
}

impl EventStream {
    pub(crate) fn new<S>(bytes: S) -> Self
    where
        S: Stream<Item = reqwest::Result<Bytes>> + Send + 'static,
    {
        Self {
            bytes: bytes.boxed(),
            parser: SseParser::new(),
            pending: VecDeque::new(),
        }
    }
}

impl Stream for EventStream {
    type Item = EventResult<ActionEvent>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            if let Some(event) = this.pending.pop_front() {
                return Poll::Ready(Some(event));
            }
            match this.bytes.poll_next_unpin(cx) {
                Poll::Ready(Some(Ok(chunk))) => this.pending.extend(this.parser.feed(&chunk)),
                Poll::Ready(Some(Err(e))) => return Poll::Ready(Some(Err(EventError::Connection(e)))),
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
