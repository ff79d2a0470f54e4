use actix_web::web;

use crate::auth::AuthorizationLevel;
use crate::error::AppError;
use crate::schemas::{Group, Member};
use crate::store::LedgerStore;

mod expenses;
mod goals;
mod groups;
mod members;
mod reports;
mod revenues;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(members::add_member)
        .service(members::get_member)
        .service(revenues::add_revenue)
        .service(revenues::list_revenues)
        .service(revenues::set_received)
        .service(revenues::delete_revenue)
        .service(groups::add_group)
        .service(groups::get_group)
        .service(groups::update_members)
        .service(groups::delete_group)
        .service(groups::get_balance)
        .service(groups::get_debts)
        .service(groups::get_summary)
        .service(reports::get_report)
        .service(expenses::add_expense)
        .service(expenses::update_expense)
        .service(expenses::delete_expense)
        .service(expenses::settle_debt)
        .service(goals::add_goal)
        .service(goals::list_goals)
        .service(goals::add_contribution);
}

async fn load_group(store: &dyn LedgerStore, id: &str) -> Result<Group, AppError> {
    store.find_group(id).await?.ok_or(AppError::NotFound("group"))
}

/// The group's members, in roster order.
async fn load_roster(store: &dyn LedgerStore, group: &Group) -> Result<Vec<Member>, AppError> {
    store.find_members(&group.member_ids).await
}

fn ensure_group_access(level: &AuthorizationLevel, group: &Group) -> Result<(), AppError> {
    match level {
        AuthorizationLevel::Service => Ok(()),
        AuthorizationLevel::Member(id) if group.member_ids.contains(id) => Ok(()),
        AuthorizationLevel::Member(_) => Err(AppError::Forbidden("access this group")),
    }
}
