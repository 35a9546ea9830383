//! Read models derived from the ledger: snapshots, totals, export rows.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    EntryKind, Group, LedgerEntry, MoneyCents, ResultEngine, balances,
    settlement::{self, Transfer},
    users,
};

use super::Engine;

/// Everything a client needs to render a group in one read: the group, its
/// ordered ledger, current balances, and a plan that clears them.
#[derive(Clone, Debug, Serialize)]
pub struct GroupSnapshot {
    pub group: Group,
    pub entries: Vec<LedgerEntry>,
    pub balances: BTreeMap<String, MoneyCents>,
    pub settlement_plan: Vec<Transfer>,
}

/// Expense totals sliced two ways; settlements are excluded.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GroupTotals {
    pub by_payer: BTreeMap<String, MoneyCents>,
    pub by_category: BTreeMap<String, MoneyCents>,
}

/// One ledger entry flattened for spreadsheet export. User identifiers are
/// resolved to display labels.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExportRow {
    pub kind: &'static str,
    pub description: String,
    pub category: String,
    pub amount: MoneyCents,
    pub paid_by: String,
    pub participants: String,
    pub recorded_at: DateTime<Utc>,
}

impl Engine {
    /// Consistent point-in-time view of a group; the caller must be a member.
    pub async fn group_snapshot(
        &self,
        group_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<GroupSnapshot> {
        let user_id = user_id.to_string();
        self.with_tx(|engine, db_tx| {
            Box::pin(async move {
                let model = engine.require_group(db_tx, group_id).await?;
                engine.require_member(db_tx, group_id, user_id.as_str()).await?;

                let mut group = Group::try_from(model)?;
                group.members = engine.load_member_set(db_tx, group_id).await?;

                let entries = engine.load_entries(db_tx, group_id).await?;
                let balances = balances::compute(&group.members, &entries);
                let settlement_plan = settlement::plan(&balances);

                Ok(GroupSnapshot {
                    group,
                    entries,
                    balances,
                    settlement_plan,
                })
            })
        })
        .await
    }

    /// Expense totals per payer and per category.
    pub async fn group_totals(&self, group_id: Uuid, user_id: &str) -> ResultEngine<GroupTotals> {
        let entries = self.list_entries(group_id, user_id).await?;

        let mut totals = GroupTotals::default();
        for entry in &entries {
            if let EntryKind::Expense {
                category,
                amount,
                paid_by,
                ..
            } = &entry.kind
            {
                *totals.by_payer.entry(paid_by.clone()).or_default() += *amount;
                *totals.by_category.entry(category.clone()).or_default() += *amount;
            }
        }
        Ok(totals)
    }

    /// The full ledger flattened into export rows, oldest first.
    pub async fn export_rows(&self, group_id: Uuid, user_id: &str) -> ResultEngine<Vec<ExportRow>> {
        let user_id = user_id.to_string();
        self.with_tx(|engine, db_tx| {
            Box::pin(async move {
                engine.require_group(db_tx, group_id).await?;
                engine.require_member(db_tx, group_id, user_id.as_str()).await?;

                let entries = engine.load_entries(db_tx, group_id).await?;
                let labels = engine
                    .load_labels(db_tx, engine.load_member_set(db_tx, group_id).await?)
                    .await?;
                let label = |id: &str| labels.get(id).cloned().unwrap_or_else(|| id.to_string());

                let rows = entries
                    .iter()
                    .map(|entry| match &entry.kind {
                        EntryKind::Expense {
                            description,
                            category,
                            amount,
                            paid_by,
                            split_among,
                        } => ExportRow {
                            kind: "expense",
                            description: description.clone(),
                            category: category.clone(),
                            amount: *amount,
                            paid_by: label(paid_by),
                            participants: split_among
                                .iter()
                                .map(|id| label(id))
                                .collect::<Vec<_>>()
                                .join("; "),
                            recorded_at: entry.created_at,
                        },
                        EntryKind::Settlement { from, to, amount } => ExportRow {
                            kind: "settlement",
                            description: format!("{} paid {}", label(from), label(to)),
                            category: "Settlement".to_string(),
                            amount: *amount,
                            paid_by: label(from),
                            participants: label(to),
                            recorded_at: entry.created_at,
                        },
                    })
                    .collect();
                Ok(rows)
            })
        })
        .await
    }

    /// Display labels for a set of user ids. Departed members and unknown
    /// ids fall back to the raw identifier at the call site.
    async fn load_labels<C: ConnectionTrait>(
        &self,
        db: &C,
        ids: impl IntoIterator<Item = String>,
    ) -> ResultEngine<HashMap<String, String>> {
        let ids: Vec<String> = ids.into_iter().collect();
        let rows = users::Entity::find()
            .filter(users::Column::Id.is_in(ids))
            .all(db)
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let label = row.label().to_string();
                (row.id, label)
            })
            .collect())
    }
}
