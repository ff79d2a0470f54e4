use actix_web::{delete, post, put, web, HttpRequest, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use super::{ensure_group_access, load_group, load_roster};
use crate::auth::authorize;
use crate::balance::round_to_2_decimals;
use crate::error::AppError;
use crate::exchange::Debt;
use crate::schemas::{Expense, ExpenseCategory, MemberId, Payer};
use crate::store::LedgerStore;
use crate::validation::{drop_empty_payers, validate_expense, validate_settlement};

#[derive(Deserialize)]
pub struct ExpenseJson {
    description: String,
    amount: f64,
    payers: Vec<Payer>,
    #[serde(default)]
    participant_ids: Vec<MemberId>,
    date: Option<DateTime<Utc>>,
    #[serde(default)]
    category: ExpenseCategory,
    receipt_url: Option<String>,
}

impl ExpenseJson {
    fn into_expense(self, id: String, group_id: String) -> Expense {
        Expense {
            id,
            group_id,
            description: self.description.trim().to_string(),
            amount: self.amount,
            payers: drop_empty_payers(self.payers),
            participant_ids: self.participant_ids,
            date: self.date.unwrap_or_else(Utc::now),
            category: self.category,
            receipt_url: self.receipt_url,
        }
    }
}

#[derive(Deserialize)]
pub struct SettlementJson {
    from: MemberId,
    to: MemberId,
    amount: f64,
    receipt_url: Option<String>,
}

#[post("/groups/{id}/expenses")]
pub async fn add_expense(
    store: web::Data<dyn LedgerStore>,
    request: HttpRequest,
    id: web::Path<String>,
    json: web::Json<ExpenseJson>,
) -> Result<HttpResponse, AppError> {
    let level = authorize(&request)?;
    let group = load_group(store.get_ref(), &id).await?;
    ensure_group_access(&level, &group)?;

    let expense = json
        .into_inner()
        .into_expense(Uuid::new_v4().to_string(), group.id.clone());
    validate_expense(&expense, &group.member_ids)?;

    if !store.push_expense(&group.id, expense.clone()).await? {
        return Err(AppError::NotFound("group"));
    }
    info!(
        group_id = %group.id,
        expense_id = %expense.id,
        amount = expense.amount,
        paid = expense.total_paid(),
        "expense added"
    );
    Ok(HttpResponse::Created().json(expense))
}

#[put("/groups/{id}/expenses/{expense_id}")]
pub async fn update_expense(
    store: web::Data<dyn LedgerStore>,
    request: HttpRequest,
    path: web::Path<(String, String)>,
    json: web::Json<ExpenseJson>,
) -> Result<HttpResponse, AppError> {
    let (group_id, expense_id) = path.into_inner();
    let level = authorize(&request)?;
    let group = load_group(store.get_ref(), &group_id).await?;
    ensure_group_access(&level, &group)?;

    let expense = json.into_inner().into_expense(expense_id, group.id.clone());
    validate_expense(&expense, &group.member_ids)?;

    if !store.replace_expense(&group.id, expense.clone()).await? {
        return Err(AppError::NotFound("expense"));
    }
    info!(group_id = %group.id, expense_id = %expense.id, "expense updated");
    Ok(HttpResponse::Ok().json(expense))
}

#[delete("/groups/{id}/expenses/{expense_id}")]
pub async fn delete_expense(
    store: web::Data<dyn LedgerStore>,
    request: HttpRequest,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, AppError> {
    let (group_id, expense_id) = path.into_inner();
    let level = authorize(&request)?;
    let group = load_group(store.get_ref(), &group_id).await?;
    ensure_group_access(&level, &group)?;

    if !store.remove_expense(&group.id, &expense_id).await? {
        return Err(AppError::NotFound("expense"));
    }
    info!(group_id = %group.id, expense_id = %expense_id, "expense deleted");
    Ok(HttpResponse::NoContent().finish())
}

/// Records that `from` paid `to`, as a transfer expense in the group.
#[post("/groups/{id}/settlements")]
pub async fn settle_debt(
    store: web::Data<dyn LedgerStore>,
    request: HttpRequest,
    id: web::Path<String>,
    json: web::Json<SettlementJson>,
) -> Result<HttpResponse, AppError> {
    let level = authorize(&request)?;
    let group = load_group(store.get_ref(), &id).await?;
    ensure_group_access(&level, &group)?;

    let json = json.into_inner();
    let amount = round_to_2_decimals(json.amount);
    validate_settlement(&json.from, &json.to, amount, &group.member_ids)?;
    if !level.may_act_for(&json.from) {
        return Err(AppError::Forbidden("settle someone else's debt"));
    }

    let roster = load_roster(store.get_ref(), &group).await?;
    let find = |id: &str| {
        roster
            .iter()
            .find(|member| member.id == id)
            .cloned()
            .ok_or(AppError::NotFound("member"))
    };
    let debt = Debt {
        from: find(json.from.as_str())?,
        to: find(json.to.as_str())?,
        amount,
    };

    let transfer = debt.into_transfer(
        Uuid::new_v4().to_string(),
        group.id.clone(),
        Utc::now(),
        json.receipt_url,
    );
    if !store.push_expense(&group.id, transfer.clone()).await? {
        return Err(AppError::NotFound("group"));
    }
    info!(
        group_id = %group.id,
        from = %json.from,
        to = %json.to,
        amount,
        "settlement recorded"
    );
    Ok(HttpResponse::Created().json(transfer))
}
