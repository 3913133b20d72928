//! Bridging engine callbacks to Server-Sent Events.

use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::stream::Stream;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_stream::{StreamExt as _, wrappers::UnboundedReceiverStream};

/// Something the engines emit that has an SSE event name.
pub(crate) trait Named: Serialize {
  fn event_name(&self) -> &'static str;
}

impl Named for tallyroom_core::event::IngestEvent {
  fn event_name(&self) -> &'static str { self.name() }
}

impl Named for tallyroom_core::event::DeleteEvent {
  fn event_name(&self) -> &'static str { self.name() }
}

/// A sender for the engine callback and the SSE response that drains it.
///
/// The stream ends when the sender is dropped, i.e. when the engine's
/// closure has returned.
pub(crate) fn channel<T>() -> (
  mpsc::UnboundedSender<T>,
  Sse<impl Stream<Item = Result<Event, axum::Error>>>,
)
where
  T: Named + Send + 'static,
{
  let (tx, rx) = mpsc::unbounded_channel::<T>();
  let stream = UnboundedReceiverStream::new(rx)
    .map(|event| Event::default().event(event.event_name()).json_data(&event));
  (tx, Sse::new(stream).keep_alive(KeepAlive::default()))
}
