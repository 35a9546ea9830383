//! Invite notification dispatch.
//!
//! Membership changes may trigger an email-style invite through an external
//! notification service. Dispatch is fire-and-forget: a failure is logged
//! and surfaced as a warning, and never rolls back the membership change it
//! accompanied.

use thiserror::Error;

/// Payload handed to the notification service when a member is invited.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InviteNotification {
    /// Email address of the invited user.
    pub recipient: String,
    pub inviter_name: String,
    pub group_name: String,
    pub join_link: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("notification dispatch failed: {0}")]
pub struct NotifyError(pub String);

/// Boundary to the external notification service. `notify` hands the payload
/// off for delivery; it must not block on the actual send.
pub trait InviteNotifier: Send + Sync {
    fn notify(&self, invite: &InviteNotification) -> Result<(), NotifyError>;
}

/// Default notifier: records the dispatch in the log. Deployments wire a
/// real delivery channel through [`EngineBuilder`](crate::EngineBuilder).
#[derive(Debug, Default)]
pub struct LogNotifier;

impl InviteNotifier for LogNotifier {
    fn notify(&self, invite: &InviteNotification) -> Result<(), NotifyError> {
        tracing::info!(
            recipient = %invite.recipient,
            group = %invite.group_name,
            "dispatching group invite"
        );
        Ok(())
    }
}
