use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, Client, Collection, Database};

use super::{in_roster_order, LedgerStore};
use crate::error::AppError;
use crate::schemas::{Contribution, Expense, Goal, Group, Member, MemberId, Revenue};

/// Members, groups and revenues each live in their own collection. Expenses,
/// goals and contributions are embedded in the group document.
#[derive(Clone)]
pub struct MongoStore {
    database: Database,
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        let client = Client::with_uri_str(uri).await?;
        Ok(Self {
            database: client.database(database),
        })
    }

    fn members(&self) -> Collection<Member> {
        self.database.collection("Members")
    }

    fn groups(&self) -> Collection<Group> {
        self.database.collection("Groups")
    }

    fn revenues(&self) -> Collection<Revenue> {
        self.database.collection("Revenues")
    }
}

#[async_trait]
impl LedgerStore for MongoStore {
    async fn insert_member(&self, member: Member) -> Result<(), AppError> {
        self.members().insert_one(member, None).await?;
        Ok(())
    }

    async fn find_member(&self, id: &str) -> Result<Option<Member>, AppError> {
        Ok(self.members().find_one(doc! { "id": id }, None).await?)
    }

    async fn find_members(&self, ids: &[MemberId]) -> Result<Vec<Member>, AppError> {
        let found: Vec<Member> = self
            .members()
            .find(doc! { "id": { "$in": ids.to_vec() } }, None)
            .await?
            .try_collect()
            .await?;
        Ok(in_roster_order(ids, found))
    }

    async fn insert_group(&self, group: Group) -> Result<(), AppError> {
        self.groups().insert_one(group, None).await?;
        Ok(())
    }

    async fn find_group(&self, id: &str) -> Result<Option<Group>, AppError> {
        Ok(self.groups().find_one(doc! { "id": id }, None).await?)
    }

    async fn delete_group(&self, id: &str) -> Result<bool, AppError> {
        let result = self.groups().delete_one(doc! { "id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }

    async fn set_group_members(
        &self,
        id: &str,
        member_ids: &[MemberId],
    ) -> Result<bool, AppError> {
        let result = self
            .groups()
            .update_one(
                doc! { "id": id },
                doc! { "$set": { "member_ids": member_ids.to_vec() } },
                None,
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn push_expense(&self, group_id: &str, expense: Expense) -> Result<bool, AppError> {
        let result = self
            .groups()
            .update_one(
                doc! { "id": group_id },
                doc! { "$push": { "expenses": bson::to_bson(&expense)? } },
                None,
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn replace_expense(&self, group_id: &str, expense: Expense) -> Result<bool, AppError> {
        let result = self
            .groups()
            .update_one(
                doc! { "id": group_id, "expenses.id": expense.id.as_str() },
                doc! { "$set": { "expenses.$": bson::to_bson(&expense)? } },
                None,
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn remove_expense(&self, group_id: &str, expense_id: &str) -> Result<bool, AppError> {
        let result = self
            .groups()
            .update_one(
                doc! { "id": group_id },
                doc! { "$pull": { "expenses": { "id": expense_id } } },
                None,
            )
            .await?;
        Ok(result.modified_count > 0)
    }

    async fn push_goal(&self, group_id: &str, goal: Goal) -> Result<bool, AppError> {
        let result = self
            .groups()
            .update_one(
                doc! { "id": group_id },
                doc! { "$push": { "goals": bson::to_bson(&goal)? } },
                None,
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn push_contribution(
        &self,
        group_id: &str,
        goal_id: &str,
        contribution: Contribution,
    ) -> Result<bool, AppError> {
        let result = self
            .groups()
            .update_one(
                doc! { "id": group_id, "goals.id": goal_id },
                doc! { "$push": { "goals.$.contributions": bson::to_bson(&contribution)? } },
                None,
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn insert_revenue(&self, revenue: Revenue) -> Result<(), AppError> {
        self.revenues().insert_one(revenue, None).await?;
        Ok(())
    }

    async fn find_revenue(&self, id: &str) -> Result<Option<Revenue>, AppError> {
        Ok(self.revenues().find_one(doc! { "id": id }, None).await?)
    }

    async fn find_revenues(&self, member_id: &str) -> Result<Vec<Revenue>, AppError> {
        Ok(self
            .revenues()
            .find(doc! { "member_id": member_id }, None)
            .await?
            .try_collect()
            .await?)
    }

    async fn set_revenue_received(&self, id: &str, received: bool) -> Result<bool, AppError> {
        let result = self
            .revenues()
            .update_one(
                doc! { "id": id },
                doc! { "$set": { "received": received } },
                None,
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_revenue(&self, id: &str) -> Result<bool, AppError> {
        let result = self.revenues().delete_one(doc! { "id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }
}
