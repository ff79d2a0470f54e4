use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;

use crate::schemas::{Goal, Member};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MemberContribution {
    pub member: Member,
    pub total: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GoalProgress {
    pub goal_id: String,
    pub name: String,
    pub target_amount: f64,
    pub total_contributed: f64,
    /// Capped at 100 once the target is reached.
    pub progress_percentage: f64,
    pub is_completed: bool,
    pub by_member: Vec<MemberContribution>,
}

pub fn total_contributed(goal: &Goal) -> f64 {
    goal.contributions.iter().map(|c| c.amount).sum()
}

/// True when adding `amount` takes the goal from below its target to at or above it.
pub fn completes_goal(goal: &Goal, amount: f64) -> bool {
    let before = total_contributed(goal);
    before < goal.target_amount && before + amount >= goal.target_amount
}

pub fn goal_progress(goal: &Goal, members: &[Member]) -> GoalProgress {
    let total = total_contributed(goal);
    let progress_percentage = if goal.target_amount > 0.0 {
        (total / goal.target_amount * 100.0).min(100.0)
    } else {
        100.0
    };

    let mut per_member: HashMap<&str, f64> = HashMap::new();
    for contribution in &goal.contributions {
        *per_member
            .entry(contribution.member_id.as_str())
            .or_insert(0.0) += contribution.amount;
    }

    // Contributions from people who have since left the group are counted in
    // the total but not listed.
    let mut by_member: Vec<MemberContribution> = members
        .iter()
        .filter_map(|member| {
            per_member
                .remove(member.id.as_str())
                .map(|total| MemberContribution {
                    member: member.clone(),
                    total,
                })
        })
        .collect();
    by_member.sort_by(|a, b| b.total.partial_cmp(&a.total).unwrap_or(Ordering::Equal));

    GoalProgress {
        goal_id: goal.id.clone(),
        name: goal.name.clone(),
        target_amount: goal.target_amount,
        total_contributed: total,
        progress_percentage,
        is_completed: total >= goal.target_amount,
        by_member,
    }
}
