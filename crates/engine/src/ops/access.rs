//! Lookup and authorization helpers shared by the ops modules.

use std::collections::BTreeSet;

use sea_orm::{ConnectionTrait, EntityTrait, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, group_members, groups, users};

use super::Engine;

impl Engine {
    /// Loads a group row or fails with `UnknownGroup`.
    pub(crate) async fn require_group<C: ConnectionTrait>(
        &self,
        db: &C,
        group_id: Uuid,
    ) -> ResultEngine<groups::Model> {
        groups::Entity::find_by_id(group_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::UnknownGroup(group_id.to_string()))
    }

    /// Loads a user row or fails with `NotFound`.
    pub(crate) async fn require_user<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: &str,
    ) -> ResultEngine<users::Model> {
        users::Entity::find_by_id(user_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::NotFound(user_id.to_string()))
    }

    /// Resolves an email through the identity directory.
    pub(crate) async fn find_user_by_email<C: ConnectionTrait>(
        &self,
        db: &C,
        email: &str,
    ) -> ResultEngine<Option<users::Model>> {
        Ok(users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(db)
            .await?)
    }

    /// Current member set of a group.
    pub(crate) async fn load_member_set<C: ConnectionTrait>(
        &self,
        db: &C,
        group_id: Uuid,
    ) -> ResultEngine<BTreeSet<String>> {
        let rows = group_members::Entity::find()
            .filter(group_members::Column::GroupId.eq(group_id.to_string()))
            .all(db)
            .await?;
        Ok(rows.into_iter().map(|row| row.user_id).collect())
    }

    /// Fails with `UnknownMember` unless `user_id` belongs to the group.
    pub(crate) async fn require_member<C: ConnectionTrait>(
        &self,
        db: &C,
        group_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<()> {
        let row = group_members::Entity::find_by_id((group_id.to_string(), user_id.to_string()))
            .one(db)
            .await?;
        match row {
            Some(_) => Ok(()),
            None => Err(EngineError::UnknownMember(user_id.to_string())),
        }
    }
}
