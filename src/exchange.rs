use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::balance::{compute_balances, round_to_2_decimals, SETTLED_EPSILON};
use crate::schemas::{Expense, ExpenseCategory, Member, Payer};

/// `from` should transfer `amount` to `to`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Debt {
    pub from: Member,
    pub to: Member,
    pub amount: f64,
}

impl Debt {
    /// The expense that records this debt as paid.
    ///
    /// The debtor pays and the creditor is the sole participant, so adding it
    /// to the group moves both balances towards zero by `amount`.
    pub fn into_transfer(
        self,
        id: String,
        group_id: String,
        date: DateTime<Utc>,
        receipt_url: Option<String>,
    ) -> Expense {
        Expense {
            id,
            group_id,
            description: format!("Payment to {}", self.to.name),
            amount: self.amount,
            payers: vec![Payer {
                member_id: self.from.id,
                amount: self.amount,
            }],
            participant_ids: vec![self.to.id],
            date,
            category: ExpenseCategory::Transfer,
            receipt_url,
        }
    }
}

struct Outstanding<'a> {
    member: &'a Member,
    amount: f64,
}

// Smallest magnitudes first; stable, so equal amounts keep balance order.
fn sort_ascending(parties: &mut [Outstanding<'_>]) {
    parties.sort_by(|a, b| {
        a.amount
            .partial_cmp(&b.amount)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Transfers that settle every balance over `expenses`.
///
/// Debtors and creditors are matched greedily, both sorted by ascending
/// magnitude. Each step settles the smaller of the two sides, so the sweep
/// emits at most `debtors + creditors - 1` transfers. That is not always the
/// minimum, but it is deterministic for a given input.
pub fn compute_debts(expenses: &[Expense], members: &[Member]) -> Vec<Debt> {
    let balances = compute_balances(expenses, members);

    let mut debtors = Vec::new();
    let mut creditors = Vec::new();

    for balance in &balances {
        if balance.amount < -SETTLED_EPSILON {
            debtors.push(Outstanding {
                member: &balance.member,
                amount: -balance.amount,
            });
        }
        if balance.amount > SETTLED_EPSILON {
            creditors.push(Outstanding {
                member: &balance.member,
                amount: balance.amount,
            });
        }
    }

    sort_ascending(&mut debtors);
    sort_ascending(&mut creditors);

    let mut debts = Vec::new();
    let mut debtor_index = 0;
    let mut creditor_index = 0;

    while debtor_index < debtors.len() && creditor_index < creditors.len() {
        let debtor = &mut debtors[debtor_index];
        let creditor = &mut creditors[creditor_index];

        let amount = round_to_2_decimals(debtor.amount.min(creditor.amount));
        if amount > 0.0 {
            debts.push(Debt {
                from: debtor.member.clone(),
                to: creditor.member.clone(),
                amount,
            });
        }

        debtor.amount -= amount;
        creditor.amount -= amount;

        if debtor.amount < SETTLED_EPSILON {
            debtor_index += 1;
        }
        if creditor.amount < SETTLED_EPSILON {
            creditor_index += 1;
        }
    }

    debug!(
        debtors = debtors.len(),
        creditors = creditors.len(),
        debts = debts.len(),
        "resolved debts"
    );
    debts
}
