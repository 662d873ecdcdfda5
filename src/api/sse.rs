//! Server-Sent Events support

use crate::runtime::{SessionEvent, SessionSnapshot};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde_json::json;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Stream the current snapshot, then every later session event
pub fn sse_stream(
    init: SessionSnapshot,
    broadcast_rx: broadcast::Receiver<SessionEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let init = futures::stream::once(async move {
        Ok(to_sse_event(
            "init",
            json!({ "type": "init", "session": init }),
        ))
    });

    let events = BroadcastStream::new(broadcast_rx).filter_map(|result| match result {
        Ok(event) => Some(Ok(session_event_to_sse(event))),
        Err(_) => None, // Skip lagged messages
    });

    Sse::new(init.chain(events)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn session_event_to_sse(event: SessionEvent) -> Event {
    match event {
        SessionEvent::StateChange { snapshot } => to_sse_event(
            "state_change",
            json!({ "type": "state_change", "session": snapshot }),
        ),
        SessionEvent::Error { message } => to_sse_event(
            "error",
            json!({ "type": "error", "message": message }),
        ),
    }
}

fn to_sse_event(name: &'static str, data: serde_json::Value) -> Event {
    Event::default().event(name).data(data.to_string())
}
