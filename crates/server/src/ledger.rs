//! Ledger endpoints: record expenses and settlements, list entries.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use api_types::ledger::{EntriesResponse, EntryKind, EntryView, ExpenseNew, SettlementNew};
use engine::{LedgerEntry, MoneyCents, users};

use crate::{ServerError, server::ServerState};

pub(crate) fn entry_view(entry: &LedgerEntry) -> EntryView {
    match &entry.kind {
        engine::EntryKind::Expense {
            description,
            category,
            amount,
            paid_by,
            split_among,
        } => EntryView {
            id: entry.id,
            kind: EntryKind::Expense,
            amount_minor: amount.cents(),
            description: Some(description.clone()),
            category: Some(category.clone()),
            paid_by: Some(paid_by.clone()),
            from: None,
            to: None,
            split_among: split_among.clone(),
            recorded_by: entry.recorded_by.clone(),
            created_at: entry.created_at,
        },
        engine::EntryKind::Settlement { from, to, amount } => EntryView {
            id: entry.id,
            kind: EntryKind::Settlement,
            amount_minor: amount.cents(),
            description: None,
            category: None,
            paid_by: None,
            from: Some(from.clone()),
            to: Some(to.clone()),
            split_among: Vec::new(),
            recorded_by: entry.recorded_by.clone(),
            created_at: entry.created_at,
        },
    }
}

pub async fn expense_new(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<Uuid>,
    Json(payload): Json<ExpenseNew>,
) -> Result<(StatusCode, Json<EntryView>), ServerError> {
    let entry = state
        .engine
        .record_expense(
            group_id,
            MoneyCents::new(payload.amount_minor),
            &payload.description,
            payload.category.as_deref(),
            &payload.paid_by,
            &payload.split_among,
            &user.id,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(entry_view(&entry))))
}

pub async fn settlement_new(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<Uuid>,
    Json(payload): Json<SettlementNew>,
) -> Result<(StatusCode, Json<EntryView>), ServerError> {
    let entry = state
        .engine
        .record_settlement(
            group_id,
            &payload.from,
            &payload.to,
            MoneyCents::new(payload.amount_minor),
            &user.id,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(entry_view(&entry))))
}

pub async fn list(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<Uuid>,
) -> Result<Json<EntriesResponse>, ServerError> {
    let entries = state.engine.list_entries(group_id, &user.id).await?;
    Ok(Json(EntriesResponse {
        entries: entries.iter().map(entry_view).collect(),
    }))
}
