//! The `Group` is a named collection of members sharing one ledger.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

/// A group and its current member set.
///
/// The member set is unique and unordered; a `BTreeSet` keeps iteration
/// deterministic. The creator is always a member and groups are never
/// deleted, only extended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub members: BTreeSet<String>,
}

impl Group {
    pub fn new(name: String, creator_id: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            created_by: creator_id.to_string(),
            created_at: Utc::now(),
            members: BTreeSet::from([creator_id.to_string()]),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "groups")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub created_by: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::group_members::Entity")]
    Members,
    #[sea_orm(has_many = "super::entries::Entity")]
    Entries,
}

impl Related<super::group_members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl Related<super::entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Entries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Group> for ActiveModel {
    fn from(group: &Group) -> Self {
        Self {
            id: ActiveValue::Set(group.id.to_string()),
            name: ActiveValue::Set(group.name.clone()),
            created_by: ActiveValue::Set(group.created_by.clone()),
            created_at: ActiveValue::Set(group.created_at),
        }
    }
}

impl TryFrom<Model> for Group {
    type Error = EngineError;

    /// Builds the domain group from a row; the member set is loaded
    /// separately and starts empty here.
    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::UnknownGroup(model.id.clone()))?,
            name: model.name,
            created_by: model.created_by,
            created_at: model.created_at,
            members: BTreeSet::new(),
        })
    }
}
