//! Ledger entry primitives.
//!
//! A [`LedgerEntry`] is one immutable monetary event in a group's
//! append-only ledger: either an expense split among members or a direct
//! settlement transfer. Entries are never edited or deleted; corrections
//! are new entries. The total order of a group's ledger is
//! `(created_at, id)`, both assigned by the engine at append time.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, ResultEngine};

use super::splits;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKindTag {
    Expense,
    Settlement,
}

impl EntryKindTag {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Expense => "expense",
            Self::Settlement => "settlement",
        }
    }
}

impl TryFrom<&str> for EntryKindTag {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "expense" => Ok(Self::Expense),
            "settlement" => Ok(Self::Settlement),
            other => Err(EngineError::InvalidInput(format!(
                "invalid ledger entry kind: {other}"
            ))),
        }
    }
}

/// The two monetary events a ledger records.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntryKind {
    Expense {
        description: String,
        category: String,
        amount: MoneyCents,
        paid_by: String,
        /// Ordered, duplicate-free; the payer may or may not be included.
        split_among: Vec<String>,
    },
    Settlement {
        from: String,
        to: String,
        amount: MoneyCents,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub group_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub recorded_by: String,
    #[serde(flatten)]
    pub kind: EntryKind,
}

impl LedgerEntry {
    pub(crate) fn new(group_id: Uuid, recorded_by: &str, kind: EntryKind) -> ResultEngine<Self> {
        if kind.amount() <= MoneyCents::ZERO {
            return Err(EngineError::InvalidAmount(
                "amount must be > 0".to_string(),
            ));
        }
        if kind.amount() > MoneyCents::MAX_AMOUNT {
            return Err(EngineError::InvalidAmount(format!(
                "amount exceeds the supported maximum of {}",
                MoneyCents::MAX_AMOUNT
            )));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            group_id,
            created_at: Utc::now(),
            recorded_by: recorded_by.to_string(),
            kind,
        })
    }

    pub fn amount(&self) -> MoneyCents {
        self.kind.amount()
    }

    pub fn kind_tag(&self) -> EntryKindTag {
        match self.kind {
            EntryKind::Expense { .. } => EntryKindTag::Expense,
            EntryKind::Settlement { .. } => EntryKindTag::Settlement,
        }
    }
}

impl EntryKind {
    pub fn amount(&self) -> MoneyCents {
        match self {
            Self::Expense { amount, .. } | Self::Settlement { amount, .. } => *amount,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "ledger_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub group_id: String,
    pub kind: String,
    pub amount_minor: i64,
    pub description: Option<String>,
    pub category: Option<String>,
    pub paid_by: Option<String>,
    pub from_user: Option<String>,
    pub to_user: Option<String>,
    pub recorded_by: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::groups::Entity",
        from = "Column::GroupId",
        to = "super::groups::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Groups,
    #[sea_orm(has_many = "super::splits::Entity")]
    Splits,
}

impl Related<super::groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Groups.def()
    }
}

impl Related<super::splits::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Splits.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&LedgerEntry> for ActiveModel {
    fn from(entry: &LedgerEntry) -> Self {
        let (description, category, paid_by, from_user, to_user) = match &entry.kind {
            EntryKind::Expense {
                description,
                category,
                paid_by,
                ..
            } => (
                Some(description.clone()),
                Some(category.clone()),
                Some(paid_by.clone()),
                None,
                None,
            ),
            EntryKind::Settlement { from, to, .. } => {
                (None, None, None, Some(from.clone()), Some(to.clone()))
            }
        };

        Self {
            id: ActiveValue::Set(entry.id.to_string()),
            group_id: ActiveValue::Set(entry.group_id.to_string()),
            kind: ActiveValue::Set(entry.kind_tag().as_str().to_string()),
            amount_minor: ActiveValue::Set(entry.amount().cents()),
            description: ActiveValue::Set(description),
            category: ActiveValue::Set(category),
            paid_by: ActiveValue::Set(paid_by),
            from_user: ActiveValue::Set(from_user),
            to_user: ActiveValue::Set(to_user),
            recorded_by: ActiveValue::Set(entry.recorded_by.clone()),
            created_at: ActiveValue::Set(entry.created_at),
        }
    }
}

impl LedgerEntry {
    /// Rebuilds a domain entry from its row plus its split rows (expenses
    /// only; settlements have none). Split rows must already be ordered by
    /// position.
    pub(crate) fn from_models(model: Model, split_rows: Vec<splits::Model>) -> ResultEngine<Self> {
        let corrupt = |what: &str| {
            EngineError::InvalidInput(format!("corrupt ledger entry {}: missing {what}", model.id))
        };

        let kind = match EntryKindTag::try_from(model.kind.as_str())? {
            EntryKindTag::Expense => EntryKind::Expense {
                description: model.description.clone().ok_or_else(|| corrupt("description"))?,
                category: model.category.clone().ok_or_else(|| corrupt("category"))?,
                amount: MoneyCents::new(model.amount_minor),
                paid_by: model.paid_by.clone().ok_or_else(|| corrupt("paid_by"))?,
                split_among: split_rows.into_iter().map(|row| row.user_id).collect(),
            },
            EntryKindTag::Settlement => EntryKind::Settlement {
                from: model.from_user.clone().ok_or_else(|| corrupt("from"))?,
                to: model.to_user.clone().ok_or_else(|| corrupt("to"))?,
                amount: MoneyCents::new(model.amount_minor),
            },
        };

        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::InvalidInput(format!("invalid entry id: {}", model.id)))?,
            group_id: Uuid::parse_str(&model.group_id)
                .map_err(|_| EngineError::UnknownGroup(model.group_id.clone()))?,
            created_at: model.created_at,
            recorded_by: model.recorded_by,
            kind,
        })
    }
}
