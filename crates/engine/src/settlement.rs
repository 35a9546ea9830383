//! Settlement planner.
//!
//! Given a balance map, proposes the transfers that bring every balance to
//! zero. Greedy largest-debtor-vs-largest-creditor matching: each round
//! settles `min(|debt|, credit)` between the two largest outstanding
//! positions, so at least one of them drops to zero and the plan is bounded
//! by `n - 1` transfers for `n` members. Ties on magnitude are broken
//! toward the lexicographically smaller user id, which makes the output
//! deterministic and testable.
//!
//! This is a pure suggestion: recording a settlement is always a separate,
//! user-chosen ledger append, whether or not it follows the plan.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::MoneyCents;

/// One proposed transfer of a settlement plan.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub from: String,
    pub to: String,
    pub amount: MoneyCents,
}

/// Proposes the transfers that zero out `balances`.
///
/// Members already at zero do not appear. For a zero-sum input the returned
/// plan, applied as settlements, leaves every balance at exactly zero.
#[must_use]
pub fn plan(balances: &BTreeMap<String, MoneyCents>) -> Vec<Transfer> {
    let mut debtors: Vec<(String, MoneyCents)> = balances
        .iter()
        .filter(|(_, balance)| balance.is_negative())
        .map(|(user, balance)| (user.clone(), balance.abs()))
        .collect();
    let mut creditors: Vec<(String, MoneyCents)> = balances
        .iter()
        .filter(|(_, balance)| balance.is_positive())
        .map(|(user, balance)| (user.clone(), *balance))
        .collect();

    let mut transfers = Vec::new();
    while !debtors.is_empty() && !creditors.is_empty() {
        let debtor_idx = pick_largest(&debtors);
        let creditor_idx = pick_largest(&creditors);

        let amount = debtors[debtor_idx].1.min(creditors[creditor_idx].1);
        transfers.push(Transfer {
            from: debtors[debtor_idx].0.clone(),
            to: creditors[creditor_idx].0.clone(),
            amount,
        });

        debtors[debtor_idx].1 -= amount;
        creditors[creditor_idx].1 -= amount;
        if debtors[debtor_idx].1.is_zero() {
            debtors.swap_remove(debtor_idx);
        }
        if creditors[creditor_idx].1.is_zero() {
            creditors.swap_remove(creditor_idx);
        }
    }

    transfers
}

/// Index of the largest magnitude; on ties, the lexicographically smaller id.
fn pick_largest(positions: &[(String, MoneyCents)]) -> usize {
    let mut best = 0;
    for (idx, (user, magnitude)) in positions.iter().enumerate().skip(1) {
        let (best_user, best_magnitude) = &positions[best];
        if magnitude > best_magnitude || (magnitude == best_magnitude && user < best_user) {
            best = idx;
        }
    }
    best
}
