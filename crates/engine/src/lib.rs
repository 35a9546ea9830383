//! Group ledger and settlement engine.
//!
//! The engine owns the durable state of the application: a registry of
//! groups, an append-only ledger of expenses and settlements per group, and
//! the read models derived from it (balances, settlement plans, totals,
//! export rows). Commands validate fully before anything is written, writes
//! run in one transaction each, and every committed append is pushed to the
//! group's live subscribers in ledger order.
//!
//! Money is integer minor units throughout ([`MoneyCents`]); balances are
//! recomputed from the full entry sequence and always sum to zero.

pub mod balances;
mod broadcast;
pub mod entries;
mod error;
pub mod group_members;
pub mod groups;
mod money;
mod notify;
mod ops;
pub mod settlement;
pub mod splits;
pub mod users;

pub use broadcast::{LedgerBroadcaster, LedgerUpdate};
pub use entries::{EntryKind, EntryKindTag, LedgerEntry};
pub use error::EngineError;
pub use groups::Group;
pub use money::MoneyCents;
pub use notify::{InviteNotification, InviteNotifier, LogNotifier, NotifyError};
pub use ops::{Engine, EngineBuilder, ExportRow, GroupSnapshot, GroupTotals};
pub use settlement::Transfer;

type ResultEngine<T> = Result<T, EngineError>;
