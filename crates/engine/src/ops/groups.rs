//! Group registry operations: creation, membership, listing.

use sea_orm::{ActiveModelTrait, ActiveValue, ColumnTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::{
    EngineError, Group, InviteNotification, ResultEngine, group_members, groups,
};

use super::{Engine, normalize_required_name};

impl Engine {
    /// Creates a group with the creator as its only member.
    pub async fn create_group(&self, name: &str, creator_id: &str) -> ResultEngine<Group> {
        let name = normalize_required_name(name, "group")?;
        let creator_id = creator_id.to_string();
        self.with_tx(|engine, db_tx| {
            Box::pin(async move {
                engine.require_user(db_tx, creator_id.as_str()).await?;

                let group = Group::new(name, creator_id.as_str());
                groups::ActiveModel::from(&group).insert(db_tx).await?;
                group_members::ActiveModel {
                    group_id: ActiveValue::Set(group.id.to_string()),
                    user_id: ActiveValue::Set(creator_id.clone()),
                }
                .insert(db_tx)
                .await?;

                Ok(group)
            })
        })
        .await
    }

    /// Invites a user to a group by email.
    ///
    /// The email is resolved against the identity directory (`NotFound` on a
    /// miss). Adding an existing member is a no-op, not an error. The
    /// membership insert runs as a find-then-insert inside one transaction,
    /// so two racing invites cannot lose an update. A newly added member
    /// triggers an invite notification after commit; dispatch failure is
    /// logged as a warning and never affects the membership change.
    pub async fn add_member_by_email(
        &self,
        group_id: Uuid,
        email: &str,
        inviter_id: &str,
    ) -> ResultEngine<Group> {
        let email = normalize_required_name(email, "email")?;
        let inviter_id = inviter_id.to_string();

        let (group, invite) = self
            .with_tx(|engine, db_tx| {
                Box::pin(async move {
                    let group_model = engine.require_group(db_tx, group_id).await?;
                    engine.require_member(db_tx, group_id, inviter_id.as_str()).await?;
                    let inviter = engine.require_user(db_tx, inviter_id.as_str()).await?;

                    let invited = engine
                        .find_user_by_email(db_tx, email.as_str())
                        .await?
                        .ok_or_else(|| EngineError::NotFound(email.clone()))?;

                    let existing = group_members::Entity::find_by_id((
                        group_id.to_string(),
                        invited.id.clone(),
                    ))
                    .one(db_tx)
                    .await?;

                    let invite = if existing.is_none() {
                        group_members::ActiveModel {
                            group_id: ActiveValue::Set(group_id.to_string()),
                            user_id: ActiveValue::Set(invited.id.clone()),
                        }
                        .insert(db_tx)
                        .await?;

                        Some(InviteNotification {
                            recipient: invited.email.clone(),
                            inviter_name: inviter.label().to_string(),
                            group_name: group_model.name.clone(),
                            join_link: format!(
                                "{}/groups/{}",
                                engine.join_link_base, group_id
                            ),
                        })
                    } else {
                        None
                    };

                    let mut group = Group::try_from(group_model)?;
                    group.members = engine.load_member_set(db_tx, group_id).await?;
                    Ok((group, invite))
                })
            })
            .await?;

        // Dispatch outside the transaction: the membership change is already
        // durable and must survive a delivery failure.
        if let Some(invite) = invite {
            if let Err(err) = self.notifier.notify(&invite) {
                tracing::warn!(
                    recipient = %invite.recipient,
                    group = %invite.group_name,
                    "invite notification failed: {err}"
                );
            }
        }

        Ok(group)
    }

    /// All groups the user belongs to, member sets included.
    pub async fn list_groups_for_member(&self, user_id: &str) -> ResultEngine<Vec<Group>> {
        let user_id = user_id.to_string();
        self.with_tx(|engine, db_tx| {
            Box::pin(async move {
                let memberships = group_members::Entity::find()
                    .filter(group_members::Column::UserId.eq(user_id.clone()))
                    .all(db_tx)
                    .await?;
                let group_ids: Vec<String> =
                    memberships.into_iter().map(|row| row.group_id).collect();

                let models = groups::Entity::find()
                    .filter(groups::Column::Id.is_in(group_ids))
                    .all(db_tx)
                    .await?;

                let mut out = Vec::with_capacity(models.len());
                for model in models {
                    let mut group = Group::try_from(model)?;
                    group.members = engine.load_member_set(db_tx, group.id).await?;
                    out.push(group);
                }
                Ok(out)
            })
        })
        .await
    }

    /// Loads a group with its member set; the caller must be a member.
    pub async fn group(&self, group_id: Uuid, user_id: &str) -> ResultEngine<Group> {
        let user_id = user_id.to_string();
        self.with_tx(|engine, db_tx| {
            Box::pin(async move {
                let model = engine.require_group(db_tx, group_id).await?;
                engine.require_member(db_tx, group_id, user_id.as_str()).await?;
                let mut group = Group::try_from(model)?;
                group.members = engine.load_member_set(db_tx, group_id).await?;
                Ok(group)
            })
        })
        .await
    }
}
