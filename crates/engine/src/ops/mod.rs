use std::{future::Future, pin::Pin, sync::Arc};

use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{
    EngineError, InviteNotifier, LedgerBroadcaster, LedgerUpdate, LogNotifier, ResultEngine,
};

mod access;
mod groups;
mod ledger;
mod snapshots;

pub use snapshots::{ExportRow, GroupSnapshot, GroupTotals};

/// Default base for invite join links; overridable via the builder.
const DEFAULT_JOIN_LINK_BASE: &str = "https://splitease.app";

/// The ledger engine: validates commands, appends to the durable store,
/// derives balances and pushes updates to subscribers.
pub struct Engine {
    database: DatabaseConnection,
    broadcaster: Arc<LedgerBroadcaster>,
    notifier: Arc<dyn InviteNotifier>,
    join_link_base: String,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Registers an observer for a group's ledger updates. Dropping the
    /// receiver releases the subscription.
    pub fn subscribe(&self, group_id: Uuid) -> broadcast::Receiver<LedgerUpdate> {
        self.broadcaster.subscribe(group_id)
    }

    /// Run a block inside a DB transaction, committing on success. An error
    /// drops the transaction, which rolls it back; a failed command never
    /// leaves partial state.
    pub(crate) async fn with_tx<T, F>(&self, f: F) -> ResultEngine<T>
    where
        F: for<'c> FnOnce(
            &'c Engine,
            &'c DatabaseTransaction,
        ) -> Pin<Box<dyn Future<Output = ResultEngine<T>> + Send + 'c>>,
    {
        let db_tx = self.database.begin().await?;
        match f(self, &db_tx).await {
            Ok(value) => {
                db_tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }
}

fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidInput(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

/// The builder for `Engine`
pub struct EngineBuilder {
    database: DatabaseConnection,
    notifier: Arc<dyn InviteNotifier>,
    join_link_base: String,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            database: DatabaseConnection::default(),
            notifier: Arc::new(LogNotifier),
            join_link_base: DEFAULT_JOIN_LINK_BASE.to_string(),
        }
    }
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Replace the default log-only invite notifier.
    pub fn notifier(mut self, notifier: Arc<dyn InviteNotifier>) -> EngineBuilder {
        self.notifier = notifier;
        self
    }

    /// Base URL used when building invite join links.
    pub fn join_link_base(mut self, base: &str) -> EngineBuilder {
        self.join_link_base = base.trim_end_matches('/').to_string();
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            broadcaster: Arc::new(LedgerBroadcaster::new()),
            notifier: self.notifier,
            join_link_base: self.join_link_base,
        })
    }
}
