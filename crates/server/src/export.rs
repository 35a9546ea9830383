//! CSV export of a group's ledger.

use axum::{
    Extension,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use uuid::Uuid;

use engine::users;

use crate::{ServerError, server::ServerState};

pub async fn csv(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServerError> {
    let rows = state.engine.export_rows(group_id, &user.id).await?;

    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in &rows {
        writer
            .serialize(row)
            .map_err(|err| ServerError::Generic(format!("csv serialization failed: {err}")))?;
    }
    let body = writer
        .into_inner()
        .map_err(|err| ServerError::Generic(format!("csv serialization failed: {err}")))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"ledger-{group_id}.csv\""),
            ),
        ],
        body,
    ))
}
