//! Balance calculator.
//!
//! A pure replay of a group's entry sequence into a net balance per member.
//! Nothing here touches storage: the ops layer reads the ordered ledger and
//! hands it over, which keeps recomputation trivially testable and lets the
//! broadcaster invoke it speculatively.
//!
//! The central invariant is that the returned map always sums to zero:
//! every expense credits the payer exactly what it debits the other split
//! members, and every settlement moves the same amount out of one balance
//! and into another.

use std::collections::{BTreeMap, BTreeSet};

use crate::{EntryKind, LedgerEntry, MoneyCents};

/// Derives the net balance of every member from the full entry sequence.
///
/// `entries` must already be in ledger order (`created_at`, then id); the
/// replay itself is order-sensitive only in the trivial sense that balances
/// are sums, so any serialization the store picked is authoritative.
///
/// Positive = is owed money, negative = owes money.
///
/// Rounding: an expense split among `n` members gives every **non-payer**
/// split member a floor share of `amount / n`; the payer is credited the sum
/// of those debits. The residual cents of an inexact division therefore
/// always land on the payer (as a slightly higher own share when the payer
/// is in the split, as slightly reduced credit when not), never on an
/// arbitrary member, and the zero-sum invariant holds structurally.
#[must_use]
pub fn compute(
    members: &BTreeSet<String>,
    entries: &[LedgerEntry],
) -> BTreeMap<String, MoneyCents> {
    let mut balances: BTreeMap<String, MoneyCents> = members
        .iter()
        .map(|member| (member.clone(), MoneyCents::ZERO))
        .collect();

    for entry in entries {
        match &entry.kind {
            EntryKind::Expense {
                amount,
                paid_by,
                split_among,
                ..
            } => {
                let (share, _residual) = amount.split_even(split_among.len());
                let mut credited = MoneyCents::ZERO;
                for member in split_among {
                    if member == paid_by {
                        continue;
                    }
                    *balances.entry(member.clone()).or_default() -= share;
                    credited += share;
                }
                *balances.entry(paid_by.clone()).or_default() += credited;
            }
            EntryKind::Settlement { from, to, amount } => {
                *balances.entry(from.clone()).or_default() -= *amount;
                *balances.entry(to.clone()).or_default() += *amount;
            }
        }
    }

    balances
}
