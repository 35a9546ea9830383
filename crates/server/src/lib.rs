use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{run, run_with_listener, spawn_with_listener};

mod events;
mod export;
mod groups;
mod ledger;
mod memberships;
mod server;

pub mod types {
    pub mod group {
        pub use api_types::group::{GroupNew, GroupView};
    }

    pub mod membership {
        pub use api_types::membership::{MemberInvite, MemberView, MembersResponse};
    }

    pub mod ledger {
        pub use api_types::ledger::{
            EntriesResponse, EntryKind, EntryView, ExpenseNew, SettlementNew,
        };
    }

    pub mod snapshot {
        pub use api_types::snapshot::{
            BalanceView, CategoryTotal, LedgerUpdateView, PayerTotal, SnapshotResponse,
            TotalsResponse, TransferView,
        };
    }
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::UnknownGroup(_) | EngineError::UnknownMember(_) | EngineError::NotFound(_) => {
            StatusCode::NOT_FOUND
        }
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::InvalidInput(_)
        | EngineError::InvalidAmount(_)
        | EngineError::InvalidSplit(_)
        | EngineError::SelfSettlement(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => {
                (status_for_engine_error(&err), message_for_engine_error(err))
            }
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}
