//! Membership endpoints: invite by email, list members.

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use uuid::Uuid;

use api_types::group::GroupView;
use api_types::membership::{MemberInvite, MemberView, MembersResponse};
use engine::users;

use crate::{ServerError, groups::group_view, server::ServerState};

pub async fn invite(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<Uuid>,
    Json(payload): Json<MemberInvite>,
) -> Result<Json<GroupView>, ServerError> {
    let group = state
        .engine
        .add_member_by_email(group_id, &payload.email, &user.id)
        .await?;
    Ok(Json(group_view(group)))
}

pub async fn list(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<Uuid>,
) -> Result<Json<MembersResponse>, ServerError> {
    let group = state.engine.group(group_id, &user.id).await?;
    let members = group
        .members
        .into_iter()
        .map(|user_id| MemberView { user_id })
        .collect();
    Ok(Json(MembersResponse { members }))
}
