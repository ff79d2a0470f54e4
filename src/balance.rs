use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::debug;

use crate::schemas::{Expense, Member};

/// Balances this close to zero are considered settled.
pub const SETTLED_EPSILON: f64 = 0.01;

/// A member's net position. Positive means the group owes them money.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Balance {
    pub member: Member,
    pub amount: f64,
}

/// Rounds to cents, ties towards positive infinity. Never returns `-0.0`.
pub fn round_to_2_decimals(n: f64) -> f64 {
    let rounded = (n * 100.0 + 0.5).floor() / 100.0;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Who shares the cost of `expense`.
///
/// Expenses recorded before participants were tracked carry an empty list;
/// those are shared by the whole roster.
fn effective_participants<'a>(expense: &'a Expense, members: &'a [Member]) -> Vec<&'a str> {
    if expense.participant_ids.is_empty() {
        members.iter().map(|member| member.id.as_str()).collect()
    } else {
        expense.participant_ids.iter().map(String::as_str).collect()
    }
}

/// Net balance of every member in `members` over `expenses`.
///
/// Payers are credited with what they put in and the paid total (not the
/// nominal amount) is split evenly across the participants. Ids missing from
/// `members` still move money internally but never get an output row.
/// Amounts are accumulated at full precision and rounded once at the end.
/// The result is sorted from largest creditor to largest debtor.
pub fn compute_balances(expenses: &[Expense], members: &[Member]) -> Vec<Balance> {
    if members.is_empty() {
        return Vec::new();
    }

    let mut running: HashMap<&str, f64> = members
        .iter()
        .map(|member| (member.id.as_str(), 0.0))
        .collect();

    for expense in expenses {
        let total_paid = expense.total_paid();

        for payer in &expense.payers {
            *running.entry(payer.member_id.as_str()).or_insert(0.0) += payer.amount;
        }

        let participants = effective_participants(expense, members);
        if !participants.is_empty() && total_paid > 0.0 {
            let share = total_paid / participants.len() as f64;
            for participant in participants {
                *running.entry(participant).or_insert(0.0) -= share;
            }
        }
    }

    let mut emitted = HashSet::new();
    let mut balances: Vec<Balance> = members
        .iter()
        .filter(|member| emitted.insert(member.id.as_str()))
        .map(|member| Balance {
            member: member.clone(),
            amount: round_to_2_decimals(
                running.get(member.id.as_str()).copied().unwrap_or(0.0),
            ),
        })
        .collect();

    balances.sort_by(|a, b| b.amount.partial_cmp(&a.amount).unwrap_or(Ordering::Equal));

    debug!(
        expenses = expenses.len(),
        members = balances.len(),
        "computed balances"
    );
    balances
}
