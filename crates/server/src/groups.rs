//! Group endpoints: creation, listing, snapshot and totals reads.

use std::collections::BTreeMap;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use api_types::group::{GroupNew, GroupView};
use api_types::snapshot::{
    BalanceView, CategoryTotal, PayerTotal, SnapshotResponse, TotalsResponse, TransferView,
};
use engine::{Group, GroupSnapshot, MoneyCents, Transfer, users};

use crate::{ServerError, ledger::entry_view, server::ServerState};

pub(crate) fn group_view(group: Group) -> GroupView {
    GroupView {
        id: group.id,
        name: group.name,
        created_by: group.created_by,
        created_at: group.created_at,
        members: group.members.into_iter().collect(),
    }
}

pub(crate) fn balance_views(balances: &BTreeMap<String, MoneyCents>) -> Vec<BalanceView> {
    balances
        .iter()
        .map(|(user_id, balance)| BalanceView {
            user_id: user_id.clone(),
            balance_minor: balance.cents(),
        })
        .collect()
}

fn transfer_views(plan: &[Transfer]) -> Vec<TransferView> {
    plan.iter()
        .map(|transfer| TransferView {
            from: transfer.from.clone(),
            to: transfer.to.clone(),
            amount_minor: transfer.amount.cents(),
        })
        .collect()
}

pub(crate) fn snapshot_response(snapshot: GroupSnapshot) -> SnapshotResponse {
    SnapshotResponse {
        balances: balance_views(&snapshot.balances),
        settlement_plan: transfer_views(&snapshot.settlement_plan),
        entries: snapshot.entries.iter().map(entry_view).collect(),
        group: group_view(snapshot.group),
    }
}

pub async fn create(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<GroupNew>,
) -> Result<(StatusCode, Json<GroupView>), ServerError> {
    let group = state.engine.create_group(&payload.name, &user.id).await?;
    Ok((StatusCode::CREATED, Json(group_view(group))))
}

pub async fn list(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<GroupView>>, ServerError> {
    let groups = state.engine.list_groups_for_member(&user.id).await?;
    Ok(Json(groups.into_iter().map(group_view).collect()))
}

pub async fn get(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<Uuid>,
) -> Result<Json<GroupView>, ServerError> {
    let group = state.engine.group(group_id, &user.id).await?;
    Ok(Json(group_view(group)))
}

pub async fn snapshot(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<Uuid>,
) -> Result<Json<SnapshotResponse>, ServerError> {
    let snapshot = state.engine.group_snapshot(group_id, &user.id).await?;
    Ok(Json(snapshot_response(snapshot)))
}

pub async fn totals(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<Uuid>,
) -> Result<Json<TotalsResponse>, ServerError> {
    let totals = state.engine.group_totals(group_id, &user.id).await?;
    Ok(Json(TotalsResponse {
        by_payer: totals
            .by_payer
            .iter()
            .map(|(user_id, total)| PayerTotal {
                user_id: user_id.clone(),
                total_minor: total.cents(),
            })
            .collect(),
        by_category: totals
            .by_category
            .iter()
            .map(|(category, total)| CategoryTotal {
                category: category.clone(),
                total_minor: total.cents(),
            })
            .collect(),
    }))
}
