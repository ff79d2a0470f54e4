use async_trait::async_trait;

use crate::error::AppError;
use crate::schemas::{Contribution, Expense, Goal, Group, Member, MemberId, Revenue};

mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// Persistence used by the HTTP layer.
///
/// Methods returning `bool` report whether the targeted group, expense, goal
/// or revenue existed.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn insert_member(&self, member: Member) -> Result<(), AppError>;
    async fn find_member(&self, id: &str) -> Result<Option<Member>, AppError>;
    /// Members with the given ids, in the order of `ids`. Unknown ids are skipped.
    async fn find_members(&self, ids: &[MemberId]) -> Result<Vec<Member>, AppError>;

    async fn insert_group(&self, group: Group) -> Result<(), AppError>;
    async fn find_group(&self, id: &str) -> Result<Option<Group>, AppError>;
    async fn delete_group(&self, id: &str) -> Result<bool, AppError>;
    async fn set_group_members(&self, id: &str, member_ids: &[MemberId])
        -> Result<bool, AppError>;

    async fn push_expense(&self, group_id: &str, expense: Expense) -> Result<bool, AppError>;
    async fn replace_expense(&self, group_id: &str, expense: Expense) -> Result<bool, AppError>;
    async fn remove_expense(&self, group_id: &str, expense_id: &str) -> Result<bool, AppError>;

    async fn push_goal(&self, group_id: &str, goal: Goal) -> Result<bool, AppError>;
    async fn push_contribution(
        &self,
        group_id: &str,
        goal_id: &str,
        contribution: Contribution,
    ) -> Result<bool, AppError>;

    async fn insert_revenue(&self, revenue: Revenue) -> Result<(), AppError>;
    async fn find_revenue(&self, id: &str) -> Result<Option<Revenue>, AppError>;
    async fn find_revenues(&self, member_id: &str) -> Result<Vec<Revenue>, AppError>;
    async fn set_revenue_received(&self, id: &str, received: bool) -> Result<bool, AppError>;
    async fn delete_revenue(&self, id: &str) -> Result<bool, AppError>;
}

/// Puts `found` in the order of `ids`, dropping ids that matched nothing.
pub(crate) fn in_roster_order(ids: &[MemberId], mut found: Vec<Member>) -> Vec<Member> {
    ids.iter()
        .filter_map(|id| {
            let position = found.iter().position(|member| &member.id == id)?;
            Some(found.swap_remove(position))
        })
        .collect()
}
