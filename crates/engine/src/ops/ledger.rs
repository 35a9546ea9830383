//! Expense ledger operations: appends and ordered reads.
//!
//! Appends validate first, write the entry and its split rows in one
//! transaction, recompute balances from the full sequence inside that
//! transaction, and publish the update after commit. A per-group guard is
//! held across commit+publish so subscribers observe ledger order.

use std::collections::{BTreeMap, HashMap};

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
};
use uuid::Uuid;

use crate::{
    EngineError, EntryKind, LedgerEntry, LedgerUpdate, MoneyCents, ResultEngine, balances,
    entries, splits,
};

use super::Engine;

impl Engine {
    /// Appends an expense entry split evenly among `split_among`.
    ///
    /// The split is an ordered set: duplicates are dropped, first occurrence
    /// wins. The payer does not have to be in the split (paying for others
    /// only), but payer and every split member must be current group members.
    pub async fn record_expense(
        &self,
        group_id: Uuid,
        amount: MoneyCents,
        description: &str,
        category: Option<&str>,
        paid_by: &str,
        split_among: &[String],
        recorded_by: &str,
    ) -> ResultEngine<LedgerEntry> {
        validate_amount(amount)?;
        let split_among = dedup_ordered(split_among);
        if split_among.is_empty() {
            return Err(EngineError::InvalidSplit(
                "split must include at least one member".to_string(),
            ));
        }
        let description = description.trim().to_string();
        if description.is_empty() {
            return Err(EngineError::InvalidInput(
                "description must not be empty".to_string(),
            ));
        }
        let category = category
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or("Uncategorized")
            .to_string();
        let paid_by = paid_by.to_string();
        let recorded_by = recorded_by.to_string();

        let kind = EntryKind::Expense {
            description,
            category,
            amount,
            paid_by,
            split_among,
        };
        self.append(group_id, recorded_by, kind).await
    }

    /// Appends a settlement transfer from one member to another.
    pub async fn record_settlement(
        &self,
        group_id: Uuid,
        from: &str,
        to: &str,
        amount: MoneyCents,
        recorded_by: &str,
    ) -> ResultEngine<LedgerEntry> {
        validate_amount(amount)?;
        if from == to {
            return Err(EngineError::SelfSettlement(from.to_string()));
        }

        let kind = EntryKind::Settlement {
            from: from.to_string(),
            to: to.to_string(),
            amount,
        };
        self.append(group_id, recorded_by.to_string(), kind).await
    }

    /// The full ordered entry sequence of a group. Restartable: callers can
    /// re-read from the start at any time; live extension comes from
    /// [`subscribe`](Engine::subscribe).
    pub async fn list_entries(
        &self,
        group_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<Vec<LedgerEntry>> {
        let user_id = user_id.to_string();
        self.with_tx(|engine, db_tx| {
            Box::pin(async move {
                engine.require_group(db_tx, group_id).await?;
                engine.require_member(db_tx, group_id, user_id.as_str()).await?;
                engine.load_entries(db_tx, group_id).await
            })
        })
        .await
    }

    /// Shared append path for both entry kinds.
    async fn append(
        &self,
        group_id: Uuid,
        recorded_by: String,
        kind: EntryKind,
    ) -> ResultEngine<LedgerEntry> {
        // Serialize appends per group so publish order follows commit order.
        let _guard = self.broadcaster.lock_group(group_id).await;

        let (entry, balances) = self
            .with_tx(|engine, db_tx| {
                Box::pin(async move {
                    engine.require_group(db_tx, group_id).await?;
                    engine
                        .require_member(db_tx, group_id, recorded_by.as_str())
                        .await?;
                    let members = engine.load_member_set(db_tx, group_id).await?;

                    match &kind {
                        EntryKind::Expense {
                            paid_by,
                            split_among,
                            ..
                        } => {
                            if !members.contains(paid_by) {
                                return Err(EngineError::UnknownMember(paid_by.clone()));
                            }
                            if let Some(outsider) =
                                split_among.iter().find(|user| !members.contains(*user))
                            {
                                return Err(EngineError::InvalidSplit(format!(
                                    "\"{outsider}\" is not a member of the group"
                                )));
                            }
                        }
                        EntryKind::Settlement { from, to, .. } => {
                            if !members.contains(from) {
                                return Err(EngineError::UnknownMember(from.clone()));
                            }
                            if !members.contains(to) {
                                return Err(EngineError::UnknownMember(to.clone()));
                            }
                        }
                    }

                    // Server-assigned id and timestamp.
                    let entry = LedgerEntry::new(group_id, recorded_by.as_str(), kind)?;
                    entries::ActiveModel::from(&entry).insert(db_tx).await?;
                    if let EntryKind::Expense { split_among, .. } = &entry.kind {
                        for row in splits::rows_for(entry.id, split_among) {
                            row.insert(db_tx).await?;
                        }
                    }

                    // Recompute from the full sequence including this entry,
                    // while the transaction still sees a stable snapshot.
                    let all_entries = engine.load_entries(db_tx, group_id).await?;
                    let balances = balances::compute(&members, &all_entries);

                    Ok((entry, balances))
                })
            })
            .await?;

        self.broadcaster.publish(LedgerUpdate {
            group_id,
            entry: entry.clone(),
            balances,
        });

        Ok(entry)
    }

    /// Reads a group's entries in ledger order (`created_at`, then id), with
    /// split rows attached in submission order.
    pub(crate) async fn load_entries<C: ConnectionTrait>(
        &self,
        db: &C,
        group_id: Uuid,
    ) -> ResultEngine<Vec<LedgerEntry>> {
        let entry_models = entries::Entity::find()
            .filter(entries::Column::GroupId.eq(group_id.to_string()))
            .order_by_asc(entries::Column::CreatedAt)
            .order_by_asc(entries::Column::Id)
            .all(db)
            .await?;

        let split_models = splits::Entity::find()
            .filter(
                splits::Column::EntryId
                    .is_in(entry_models.iter().map(|m| m.id.clone()).collect::<Vec<_>>()),
            )
            .order_by_asc(splits::Column::Position)
            .all(db)
            .await?;

        let mut splits_by_entry: HashMap<String, Vec<splits::Model>> = HashMap::new();
        for row in split_models {
            splits_by_entry.entry(row.entry_id.clone()).or_default().push(row);
        }

        let mut out = Vec::with_capacity(entry_models.len());
        for model in entry_models {
            let split_rows = splits_by_entry.remove(&model.id).unwrap_or_default();
            out.push(LedgerEntry::from_models(model, split_rows)?);
        }
        Ok(out)
    }

    /// Current balances of a group, derived on demand.
    pub async fn balances(
        &self,
        group_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<BTreeMap<String, MoneyCents>> {
        let user_id = user_id.to_string();
        self.with_tx(|engine, db_tx| {
            Box::pin(async move {
                engine.require_group(db_tx, group_id).await?;
                engine.require_member(db_tx, group_id, user_id.as_str()).await?;
                let members = engine.load_member_set(db_tx, group_id).await?;
                let entries = engine.load_entries(db_tx, group_id).await?;
                Ok(balances::compute(&members, &entries))
            })
        })
        .await
    }
}

/// Entry amounts must be positive and bounded: unbounded wire input would
/// let replayed balance sums overflow `i64`.
fn validate_amount(amount: MoneyCents) -> ResultEngine<()> {
    if amount <= MoneyCents::ZERO {
        return Err(EngineError::InvalidAmount("amount must be > 0".to_string()));
    }
    if amount > MoneyCents::MAX_AMOUNT {
        return Err(EngineError::InvalidAmount(format!(
            "amount exceeds the supported maximum of {}",
            MoneyCents::MAX_AMOUNT
        )));
    }
    Ok(())
}

/// Set semantics with stable order: first occurrence wins.
fn dedup_ordered(users: &[String]) -> Vec<String> {
    let mut seen = std::collections::BTreeSet::new();
    users
        .iter()
        .filter(|user| seen.insert(user.as_str()))
        .cloned()
        .collect()
}
