//! Live ledger stream over SSE.
//!
//! The stream opens with one `snapshot` event (the full group view at
//! subscription time), then emits a `ledger` event per committed append.
//! A subscriber that lags past the channel capacity gets a `reset` event
//! and should reconnect, which replays a fresh snapshot.

use std::{convert::Infallible, time::Duration};

use axum::{
    Extension,
    extract::{Path, State},
    response::sse::{Event as SseEvent, KeepAlive, Sse},
};
use tokio_stream::{StreamExt, wrappers::BroadcastStream};
use uuid::Uuid;

use api_types::snapshot::LedgerUpdateView;
use engine::users;

use crate::{
    ServerError,
    groups::{balance_views, snapshot_response},
    ledger::entry_view,
    server::ServerState,
};

pub async fn stream(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<Uuid>,
) -> Result<Sse<impl tokio_stream::Stream<Item = Result<SseEvent, Infallible>>>, ServerError> {
    // Subscribe before reading the snapshot: an append racing with this
    // request lands either in the snapshot or in the live stream, never in
    // neither.
    let rx = state.engine.subscribe(group_id);
    let snapshot = state.engine.group_snapshot(group_id, &user.id).await?;

    // Both event payloads go through the api_types DTOs, so the opening
    // snapshot and the polled GET endpoint share one wire shape.
    let opening = serde_json::to_string(&snapshot_response(snapshot))
        .unwrap_or_else(|_| "{}".to_string());
    let opening = tokio_stream::once(Ok(SseEvent::default().event("snapshot").data(opening)));

    let updates = BroadcastStream::new(rx).map(|msg| match msg {
        Ok(update) => {
            let view = LedgerUpdateView {
                group_id: update.group_id,
                entry: entry_view(&update.entry),
                balances: balance_views(&update.balances),
            };
            let data = serde_json::to_string(&view).unwrap_or_else(|_| "{}".to_string());
            Ok(SseEvent::default().event("ledger").data(data))
        }
        // Lagged past channel capacity: updates were dropped, tell the
        // client to reconnect for a fresh snapshot.
        Err(_) => Ok(SseEvent::default().event("reset").data("{}")),
    });

    Ok(Sse::new(opening.chain(updates))
        .keep_alive(KeepAlive::new().interval(Duration::from_secs(15))))
}
