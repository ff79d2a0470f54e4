use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::{in_roster_order, LedgerStore};
use crate::error::AppError;
use crate::schemas::{Contribution, Expense, Goal, Group, Member, MemberId, Revenue};

#[derive(Default)]
struct State {
    members: Vec<Member>,
    groups: Vec<Group>,
    revenues: Vec<Revenue>,
}

impl State {
    fn group_mut(&mut self, id: &str) -> Option<&mut Group> {
        self.groups.iter_mut().find(|group| group.id == id)
    }

    fn revenue_mut(&mut self, id: &str) -> Option<&mut Revenue> {
        self.revenues.iter_mut().find(|revenue| revenue.id == id)
    }
}

/// Process-local store. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, AppError> {
        self.state.lock().map_err(|_| AppError::Poisoned)
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn insert_member(&self, member: Member) -> Result<(), AppError> {
        self.lock()?.members.push(member);
        Ok(())
    }

    async fn find_member(&self, id: &str) -> Result<Option<Member>, AppError> {
        Ok(self.lock()?.members.iter().find(|m| m.id == id).cloned())
    }

    async fn find_members(&self, ids: &[MemberId]) -> Result<Vec<Member>, AppError> {
        let found = self
            .lock()?
            .members
            .iter()
            .filter(|member| ids.contains(&member.id))
            .cloned()
            .collect();
        Ok(in_roster_order(ids, found))
    }

    async fn insert_group(&self, group: Group) -> Result<(), AppError> {
        self.lock()?.groups.push(group);
        Ok(())
    }

    async fn find_group(&self, id: &str) -> Result<Option<Group>, AppError> {
        Ok(self.lock()?.groups.iter().find(|g| g.id == id).cloned())
    }

    async fn delete_group(&self, id: &str) -> Result<bool, AppError> {
        let mut state = self.lock()?;
        let before = state.groups.len();
        state.groups.retain(|group| group.id != id);
        Ok(state.groups.len() < before)
    }

    async fn set_group_members(
        &self,
        id: &str,
        member_ids: &[MemberId],
    ) -> Result<bool, AppError> {
        let mut state = self.lock()?;
        Ok(match state.group_mut(id) {
            Some(group) => {
                group.member_ids = member_ids.to_vec();
                true
            }
            None => false,
        })
    }

    async fn push_expense(&self, group_id: &str, expense: Expense) -> Result<bool, AppError> {
        let mut state = self.lock()?;
        Ok(match state.group_mut(group_id) {
            Some(group) => {
                group.expenses.push(expense);
                true
            }
            None => false,
        })
    }

    async fn replace_expense(&self, group_id: &str, expense: Expense) -> Result<bool, AppError> {
        let mut state = self.lock()?;
        let existing = state
            .group_mut(group_id)
            .and_then(|group| group.expenses.iter_mut().find(|e| e.id == expense.id));
        Ok(match existing {
            Some(slot) => {
                *slot = expense;
                true
            }
            None => false,
        })
    }

    async fn remove_expense(&self, group_id: &str, expense_id: &str) -> Result<bool, AppError> {
        let mut state = self.lock()?;
        Ok(match state.group_mut(group_id) {
            Some(group) => {
                let before = group.expenses.len();
                group.expenses.retain(|expense| expense.id != expense_id);
                group.expenses.len() < before
            }
            None => false,
        })
    }

    async fn push_goal(&self, group_id: &str, goal: Goal) -> Result<bool, AppError> {
        let mut state = self.lock()?;
        Ok(match state.group_mut(group_id) {
            Some(group) => {
                group.goals.push(goal);
                true
            }
            None => false,
        })
    }

    async fn push_contribution(
        &self,
        group_id: &str,
        goal_id: &str,
        contribution: Contribution,
    ) -> Result<bool, AppError> {
        let mut state = self.lock()?;
        let goal = state
            .group_mut(group_id)
            .and_then(|group| group.goals.iter_mut().find(|goal| goal.id == goal_id));
        Ok(match goal {
            Some(goal) => {
                goal.contributions.push(contribution);
                true
            }
            None => false,
        })
    }

    async fn insert_revenue(&self, revenue: Revenue) -> Result<(), AppError> {
        self.lock()?.revenues.push(revenue);
        Ok(())
    }

    async fn find_revenue(&self, id: &str) -> Result<Option<Revenue>, AppError> {
        Ok(self.lock()?.revenues.iter().find(|r| r.id == id).cloned())
    }

    async fn find_revenues(&self, member_id: &str) -> Result<Vec<Revenue>, AppError> {
        Ok(self
            .lock()?
            .revenues
            .iter()
            .filter(|revenue| revenue.member_id == member_id)
            .cloned()
            .collect())
    }

    async fn set_revenue_received(&self, id: &str, received: bool) -> Result<bool, AppError> {
        let mut state = self.lock()?;
        Ok(match state.revenue_mut(id) {
            Some(revenue) => {
                revenue.received = received;
                true
            }
            None => false,
        })
    }

    async fn delete_revenue(&self, id: &str) -> Result<bool, AppError> {
        let mut state = self.lock()?;
        let before = state.revenues.len();
        state.revenues.retain(|revenue| revenue.id != id);
        Ok(state.revenues.len() < before)
    }
}
