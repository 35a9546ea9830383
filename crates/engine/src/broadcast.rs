//! Sync broadcaster.
//!
//! Per-group publish/subscribe of ledger updates. Subscribing hands out a
//! `tokio::sync::broadcast` receiver; dropping the receiver unsubscribes,
//! and senders whose receivers are all gone are pruned on the next publish
//! so dead subscriptions never accumulate.
//!
//! Delivery order across subscribers is unspecified. Within a subscriber it
//! is the channel's FIFO order, and appends to one group are serialized by
//! [`lock_group`](LedgerBroadcaster::lock_group) around commit+publish, so
//! every subscriber observes snapshots in non-decreasing ledger order.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard, broadcast};
use uuid::Uuid;

use crate::{LedgerEntry, MoneyCents};

/// Capacity of each per-group channel; slow subscribers past this lag miss
/// updates and must restart from a full snapshot.
const CHANNEL_CAPACITY: usize = 256;

/// Snapshot pushed to every subscriber of a group after an append: the new
/// entry (the delta) and the balances derived from the ledger including it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LedgerUpdate {
    pub group_id: Uuid,
    pub entry: LedgerEntry,
    pub balances: BTreeMap<String, MoneyCents>,
}

#[derive(Debug, Default)]
pub struct LedgerBroadcaster {
    channels: Mutex<HashMap<Uuid, broadcast::Sender<LedgerUpdate>>>,
    append_guards: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

impl LedgerBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an observer for a group. The returned receiver yields every
    /// update published after this call; drop it to unsubscribe.
    pub fn subscribe(&self, group_id: Uuid) -> broadcast::Receiver<LedgerUpdate> {
        let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        channels
            .entry(group_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Number of live subscribers for a group.
    pub fn subscriber_count(&self, group_id: Uuid) -> usize {
        let channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        channels
            .get(&group_id)
            .map(broadcast::Sender::receiver_count)
            .unwrap_or(0)
    }

    /// Serializes append+publish for one group. Held across the store commit
    /// and the matching [`publish`](Self::publish) so per-subscriber delivery
    /// order follows ledger order.
    pub(crate) async fn lock_group(&self, group_id: Uuid) -> OwnedMutexGuard<()> {
        let guard = {
            let mut guards = self.append_guards.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(guards.entry(group_id).or_default())
        };
        guard.lock_owned().await
    }

    /// Delivers an update to every current subscriber of its group.
    pub(crate) fn publish(&self, update: LedgerUpdate) {
        let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(sender) = channels.get(&update.group_id) {
            // A send error means every receiver is gone; prune the channel.
            if sender.send(update.clone()).is_err() {
                channels.remove(&update.group_id);
            }
        }
        channels.retain(|_, sender| sender.receiver_count() > 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EntryKind;

    fn update(group_id: Uuid, amount: i64) -> LedgerUpdate {
        LedgerUpdate {
            group_id,
            entry: LedgerEntry::new(
                group_id,
                "a",
                EntryKind::Settlement {
                    from: "a".to_string(),
                    to: "b".to_string(),
                    amount: MoneyCents::new(amount),
                },
            )
            .unwrap(),
            balances: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn subscribers_receive_updates_in_order() {
        let broadcaster = LedgerBroadcaster::new();
        let group_id = Uuid::new_v4();
        let mut rx = broadcaster.subscribe(group_id);

        broadcaster.publish(update(group_id, 100));
        broadcaster.publish(update(group_id, 200));

        assert_eq!(rx.recv().await.unwrap().entry.amount().cents(), 100);
        assert_eq!(rx.recv().await.unwrap().entry.amount().cents(), 200);
    }

    #[tokio::test]
    async fn updates_do_not_cross_groups() {
        let broadcaster = LedgerBroadcaster::new();
        let group_a = Uuid::new_v4();
        let group_b = Uuid::new_v4();
        let mut rx = broadcaster.subscribe(group_a);

        broadcaster.publish(update(group_b, 100));
        broadcaster.publish(update(group_a, 200));

        assert_eq!(rx.recv().await.unwrap().entry.amount().cents(), 200);
    }

    #[tokio::test]
    async fn dropped_subscribers_are_pruned() {
        let broadcaster = LedgerBroadcaster::new();
        let group_id = Uuid::new_v4();
        let rx = broadcaster.subscribe(group_id);
        assert_eq!(broadcaster.subscriber_count(group_id), 1);

        drop(rx);
        broadcaster.publish(update(group_id, 100));
        assert_eq!(broadcaster.subscriber_count(group_id), 0);
    }
}
