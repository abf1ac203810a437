use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use super::state::AppState;

/// Live feed of scored posts as they leave the aggregation loop, one JSON
/// `post` event each. Lagged subscribers silently drop the missed entries.
pub async fn sse_handler(
    State(state): State<AppState>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, std::convert::Infallible>>> {
    let rx = state.tx.subscribe();
    let stream = BroadcastStream::new(rx);

    let stream = stream.filter_map(|result| match result {
        Ok(scored) => match serde_json::to_string(&scored) {
            Ok(json) => Some(Ok(Event::default().event("post").data(json))),
            Err(_) => None,
        },
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
