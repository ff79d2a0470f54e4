//! Checks applied to data arriving over HTTP before it is stored.
//!
//! The ledger functions in [`crate::balance`] and [`crate::exchange`] accept
//! anything and degrade gracefully; rejecting malformed input is done here,
//! at the boundary, so those functions stay pure.

use std::collections::HashSet;

use thiserror::Error;

use crate::balance::{Balance, SETTLED_EPSILON};
use crate::schemas::{Expense, MemberId, Payer};

/// How far payers may exceed the expense total before it counts as overpaid.
pub const OVERPAYMENT_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Amount must be a positive number")]
    NonPositiveAmount,

    #[error("Description cannot be empty")]
    EmptyDescription,

    #[error("Name cannot be empty")]
    EmptyName,

    #[error("At least one payer must have paid something")]
    NoPayers,

    #[error("Payer {0} has a negative amount")]
    NegativePayerAmount(MemberId),

    #[error("Member {0} is listed as a payer more than once")]
    DuplicatePayer(MemberId),

    #[error("Payers put in {paid:.2}, more than the total of {amount:.2}")]
    Overpaid { paid: f64, amount: f64 },

    #[error("Member {0} is not part of this group")]
    UnknownMember(MemberId),

    #[error("A member cannot settle a debt with themselves")]
    SelfTransfer,

    #[error("A group needs at least one member")]
    EmptyRoster,

    #[error("Member {member} still has an open balance of {amount:.2}")]
    OpenBalance { member: MemberId, amount: f64 },

    #[error("Member {0} still appears in this group's expenses")]
    StillReferenced(MemberId),

    #[error("Report start date must not be after its end date")]
    InvalidDateRange,
}

pub fn validate_positive_amount(amount: f64) -> Result<(), ValidationError> {
    if amount.is_finite() && amount > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::NonPositiveAmount)
    }
}

pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(())
}

/// Every id in `ids` must belong to `roster`.
pub fn require_members<'a, I>(ids: I, roster: &[MemberId]) -> Result<(), ValidationError>
where
    I: IntoIterator<Item = &'a MemberId>,
{
    for id in ids {
        if !roster.contains(id) {
            return Err(ValidationError::UnknownMember(id.clone()));
        }
    }
    Ok(())
}

/// Payers who put in nothing carry no information, the expense form leaves them out.
pub fn drop_empty_payers(payers: Vec<Payer>) -> Vec<Payer> {
    payers.into_iter().filter(|payer| payer.amount != 0.0).collect()
}

pub fn validate_expense(expense: &Expense, roster: &[MemberId]) -> Result<(), ValidationError> {
    validate_positive_amount(expense.amount)?;

    if expense.description.trim().is_empty() {
        return Err(ValidationError::EmptyDescription);
    }
    if expense.payers.is_empty() {
        return Err(ValidationError::NoPayers);
    }

    let mut seen = HashSet::new();
    for payer in &expense.payers {
        if !payer.amount.is_finite() || payer.amount < 0.0 {
            return Err(ValidationError::NegativePayerAmount(payer.member_id.clone()));
        }
        if !seen.insert(payer.member_id.as_str()) {
            return Err(ValidationError::DuplicatePayer(payer.member_id.clone()));
        }
    }

    let paid = expense.total_paid();
    if paid - expense.amount > OVERPAYMENT_TOLERANCE {
        return Err(ValidationError::Overpaid {
            paid,
            amount: expense.amount,
        });
    }

    require_members(expense.payers.iter().map(|payer| &payer.member_id), roster)?;
    require_members(&expense.participant_ids, roster)?;
    Ok(())
}

pub fn validate_settlement(
    from: &MemberId,
    to: &MemberId,
    amount: f64,
    roster: &[MemberId],
) -> Result<(), ValidationError> {
    validate_positive_amount(amount)?;
    if from == to {
        return Err(ValidationError::SelfTransfer);
    }
    require_members([from, to], roster)
}

/// Whether `member_id` takes part in `expense`, either named explicitly or
/// through the whole-roster fallback.
fn takes_part(expense: &Expense, member_id: &MemberId) -> bool {
    expense.participant_ids.is_empty()
        || expense.participant_ids.contains(member_id)
        || expense.payers.iter().any(|payer| &payer.member_id == member_id)
}

/// Replacing `current` with `proposed` must not leave ids behind in stored
/// expenses, which would silently drop their money from every balance.
///
/// `balances` are those of the current roster.
pub fn validate_roster_change(
    current: &[MemberId],
    proposed: &[MemberId],
    expenses: &[Expense],
    balances: &[Balance],
) -> Result<(), ValidationError> {
    if proposed.is_empty() {
        return Err(ValidationError::EmptyRoster);
    }

    for removed in current.iter().filter(|id| !proposed.contains(id)) {
        if let Some(balance) = balances
            .iter()
            .find(|balance| &balance.member.id == removed)
            .filter(|balance| balance.amount.abs() > SETTLED_EPSILON)
        {
            return Err(ValidationError::OpenBalance {
                member: removed.clone(),
                amount: balance.amount,
            });
        }
        if expenses.iter().any(|expense| takes_part(expense, removed)) {
            return Err(ValidationError::StillReferenced(removed.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balance::compute_balances;
    use crate::balance::tests::{expense, member};
    use rstest::rstest;

    fn roster() -> Vec<MemberId> {
        vec!["a".to_string(), "b".to_string(), "c".to_string()]
    }

    #[test]
    fn accepts_well_formed_expense() {
        let expense = expense(90.0, &[("a", 60.0), ("b", 30.0)], &["a", "b", "c"]);
        assert_eq!(validate_expense(&expense, &roster()), Ok(()));
    }

    #[test]
    fn accepts_partial_payment() {
        let expense = expense(200.0, &[("a", 100.0)], &["a", "b"]);
        assert_eq!(validate_expense(&expense, &roster()), Ok(()));
    }

    #[test]
    fn tolerates_a_cent_of_overpayment() {
        let expense = expense(10.0, &[("a", 10.005)], &["a", "b"]);
        assert_eq!(validate_expense(&expense, &roster()), Ok(()));
    }

    #[rstest]
    #[case::zero_amount(expense(0.0, &[("a", 0.0)], &["a"]), ValidationError::NonPositiveAmount)]
    #[case::negative_amount(expense(-5.0, &[("a", 5.0)], &["a"]), ValidationError::NonPositiveAmount)]
    #[case::nan_amount(expense(f64::NAN, &[("a", 5.0)], &["a"]), ValidationError::NonPositiveAmount)]
    #[case::no_payers(expense(10.0, &[], &["a"]), ValidationError::NoPayers)]
    #[case::negative_payer(
        expense(10.0, &[("a", 15.0), ("b", -5.0)], &["a"]),
        ValidationError::NegativePayerAmount("b".to_string())
    )]
    #[case::duplicate_payer(
        expense(10.0, &[("a", 5.0), ("a", 5.0)], &["a"]),
        ValidationError::DuplicatePayer("a".to_string())
    )]
    #[case::overpaid(
        expense(10.0, &[("a", 8.0), ("b", 8.0)], &["a", "b"]),
        ValidationError::Overpaid { paid: 16.0, amount: 10.0 }
    )]
    #[case::unknown_payer(
        expense(10.0, &[("z", 10.0)], &["a"]),
        ValidationError::UnknownMember("z".to_string())
    )]
    #[case::unknown_participant(
        expense(10.0, &[("a", 10.0)], &["a", "z"]),
        ValidationError::UnknownMember("z".to_string())
    )]
    fn rejects_malformed_expense(#[case] expense: Expense, #[case] expected: ValidationError) {
        assert_eq!(validate_expense(&expense, &roster()), Err(expected));
    }

    #[test]
    fn rejects_blank_description() {
        let mut expense = expense(10.0, &[("a", 10.0)], &["a"]);
        expense.description = "   ".to_string();
        assert_eq!(
            validate_expense(&expense, &roster()),
            Err(ValidationError::EmptyDescription)
        );
    }

    #[test]
    fn drops_only_zero_payers() {
        let payers = expense(10.0, &[("a", 0.0), ("b", 10.0), ("c", -1.0)], &[]).payers;
        let kept: Vec<_> = drop_empty_payers(payers)
            .into_iter()
            .map(|payer| payer.member_id)
            .collect();
        assert_eq!(kept, vec!["b".to_string(), "c".to_string()]);
    }

    #[test]
    fn settlement_rules() {
        let a = "a".to_string();
        let b = "b".to_string();
        let z = "z".to_string();
        assert_eq!(validate_settlement(&a, &b, 12.5, &roster()), Ok(()));
        assert_eq!(
            validate_settlement(&a, &a, 12.5, &roster()),
            Err(ValidationError::SelfTransfer)
        );
        assert_eq!(
            validate_settlement(&a, &b, 0.0, &roster()),
            Err(ValidationError::NonPositiveAmount)
        );
        assert_eq!(
            validate_settlement(&a, &z, 1.0, &roster()),
            Err(ValidationError::UnknownMember("z".to_string()))
        );
    }

    fn ids(ids: &[&str]) -> Vec<MemberId> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn roster_may_grow_and_shed_members_without_history() {
        let expenses = vec![expense(40.0, &[("a", 40.0)], &["a", "b"])];
        let balances = compute_balances(&expenses, &[member("a"), member("b"), member("c")]);
        assert_eq!(
            validate_roster_change(&ids(&["a", "b", "c"]), &ids(&["b", "a", "d"]), &expenses, &balances),
            Ok(())
        );
    }

    #[rstest]
    #[case::emptied(&["a", "b"], &[], ValidationError::EmptyRoster)]
    #[case::creditor_removed(
        &["a", "b"],
        &["b"],
        ValidationError::OpenBalance { member: "a".to_string(), amount: 20.0 }
    )]
    #[case::debtor_removed(
        &["a", "b"],
        &["a"],
        ValidationError::OpenBalance { member: "b".to_string(), amount: -20.0 }
    )]
    fn roster_change_keeps_open_balances(
        #[case] current: &[&str],
        #[case] proposed: &[&str],
        #[case] expected: ValidationError,
    ) {
        let expenses = vec![expense(40.0, &[("a", 40.0)], &["a", "b"])];
        let balances = compute_balances(&expenses, &[member("a"), member("b")]);
        assert_eq!(
            validate_roster_change(&ids(current), &ids(proposed), &expenses, &balances),
            Err(expected)
        );
    }

    #[test]
    fn settled_member_with_history_stays() {
        // b paid their half back, so both are at zero but still named in expenses.
        let expenses = vec![
            expense(40.0, &[("a", 40.0)], &["a", "b"]),
            expense(20.0, &[("b", 20.0)], &["a"]),
        ];
        let balances = compute_balances(&expenses, &[member("a"), member("b")]);
        assert_eq!(
            validate_roster_change(&ids(&["a", "b"]), &ids(&["a"]), &expenses, &balances),
            Err(ValidationError::StillReferenced("b".to_string()))
        );
    }

    #[test]
    fn roster_wide_expenses_pin_every_member() {
        let expenses = vec![expense(30.0, &[("a", 30.0)], &[])];
        assert_eq!(
            validate_roster_change(&ids(&["a", "b", "c"]), &ids(&["a", "b"]), &expenses, &[]),
            Err(ValidationError::StillReferenced("c".to_string()))
        );
    }

    #[test]
    fn names_must_have_content() {
        assert_eq!(validate_name("Trip to Lisbon"), Ok(()));
        assert_eq!(validate_name(" \t"), Err(ValidationError::EmptyName));
    }
}
