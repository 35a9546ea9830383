use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod group {
    use super::*;

    /// Request body for creating a group.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupNew {
        pub name: String,
    }

    /// A group with its current member set.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupView {
        pub id: Uuid,
        pub name: String,
        pub created_by: String,
        pub created_at: DateTime<Utc>,
        pub members: Vec<String>,
    }
}

pub mod membership {
    use super::*;

    /// Request body for inviting a member by email.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberInvite {
        pub email: String,
    }

    /// Response body for listing members.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct MembersResponse {
        pub members: Vec<MemberView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberView {
        pub user_id: String,
    }
}

pub mod ledger {
    use super::*;

    /// Request body for recording an expense.
    ///
    /// Amounts are integer minor units (cents). `category` defaults to
    /// `Uncategorized` when omitted.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseNew {
        pub amount_minor: i64,
        pub description: String,
        pub category: Option<String>,
        pub paid_by: String,
        pub split_among: Vec<String>,
    }

    /// Request body for recording a settlement transfer.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettlementNew {
        pub from: String,
        pub to: String,
        pub amount_minor: i64,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum EntryKind {
        Expense,
        Settlement,
    }

    /// One ledger entry as returned by the server. Kind-specific fields are
    /// `None` when they do not apply.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct EntryView {
        pub id: Uuid,
        pub kind: EntryKind,
        pub amount_minor: i64,
        pub description: Option<String>,
        pub category: Option<String>,
        pub paid_by: Option<String>,
        pub from: Option<String>,
        pub to: Option<String>,
        pub split_among: Vec<String>,
        pub recorded_by: String,
        pub created_at: DateTime<Utc>,
    }

    /// Response body for listing a group's entries.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct EntriesResponse {
        pub entries: Vec<EntryView>,
    }
}

pub mod snapshot {
    use super::*;

    /// One member's net position: positive means the group owes them.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalanceView {
        pub user_id: String,
        pub balance_minor: i64,
    }

    /// One proposed transfer of a settlement plan.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferView {
        pub from: String,
        pub to: String,
        pub amount_minor: i64,
    }

    /// Full group view: group, ordered ledger, balances, settlement plan.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct SnapshotResponse {
        pub group: super::group::GroupView,
        pub entries: Vec<super::ledger::EntryView>,
        pub balances: Vec<BalanceView>,
        pub settlement_plan: Vec<TransferView>,
    }

    /// One committed append as pushed to live subscribers: the new entry
    /// and the balances derived from the ledger including it.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct LedgerUpdateView {
        pub group_id: Uuid,
        pub entry: super::ledger::EntryView,
        pub balances: Vec<BalanceView>,
    }

    /// Expense totals per payer and per category; settlements excluded.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TotalsResponse {
        pub by_payer: Vec<PayerTotal>,
        pub by_category: Vec<CategoryTotal>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PayerTotal {
        pub user_id: String,
        pub total_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryTotal {
        pub category: String,
        pub total_minor: i64,
    }
}
