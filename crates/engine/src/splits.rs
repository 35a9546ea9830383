//! Expense split rows.
//!
//! One row per `(entry_id, user_id)` pair of an expense, with `position`
//! preserving the order the split was submitted in. Settlements have no
//! split rows.

use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "entry_splits")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub entry_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    pub position: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::entries::Entity",
        from = "Column::EntryId",
        to = "super::entries::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Entries,
}

impl Related<super::entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Entries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Split rows for one expense, in submission order.
pub(crate) fn rows_for(entry_id: Uuid, split_among: &[String]) -> Vec<ActiveModel> {
    split_among
        .iter()
        .enumerate()
        .map(|(position, user_id)| ActiveModel {
            entry_id: ActiveValue::Set(entry_id.to_string()),
            user_id: ActiveValue::Set(user_id.clone()),
            position: ActiveValue::Set(position as i32),
        })
        .collect()
}
