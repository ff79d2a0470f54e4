use actix_web::{delete, get, post, put, web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::{ensure_group_access, load_group, load_roster};
use crate::auth::{authorize, AuthorizationLevel};
use crate::balance::{compute_balances, Balance};
use crate::error::AppError;
use crate::exchange::{compute_debts, Debt};
use crate::schemas::{Group, Member, MemberId};
use crate::store::LedgerStore;
use crate::validation::{validate_name, validate_roster_change, ValidationError};

#[derive(Deserialize)]
pub struct NewGroupJson {
    name: String,
    #[serde(default)]
    icon: String,
    member_ids: Vec<MemberId>,
}

#[derive(Deserialize, Serialize)]
pub struct MemberIdsJson {
    member_ids: Vec<MemberId>,
}

#[derive(Serialize)]
struct GroupJson {
    group: Group,
    members: Vec<Member>,
}

#[derive(Serialize)]
struct SummaryJson {
    balances: Vec<Balance>,
    debts: Vec<Debt>,
    total_spent: f64,
}

/// Every id must name an existing member. Duplicates are collapsed.
async fn existing_members(
    store: &dyn LedgerStore,
    member_ids: Vec<MemberId>,
) -> Result<Vec<MemberId>, AppError> {
    let mut unique: Vec<MemberId> = Vec::with_capacity(member_ids.len());
    for id in member_ids {
        if !unique.contains(&id) {
            unique.push(id);
        }
    }
    let found = store.find_members(&unique).await?;
    if let Some(missing) = unique
        .iter()
        .find(|id| !found.iter().any(|member| &member.id == *id))
    {
        return Err(ValidationError::UnknownMember(missing.clone()).into());
    }
    Ok(unique)
}

#[post("/groups")]
pub async fn add_group(
    store: web::Data<dyn LedgerStore>,
    request: HttpRequest,
    json: web::Json<NewGroupJson>,
) -> Result<HttpResponse, AppError> {
    let level = authorize(&request)?;
    let json = json.into_inner();
    validate_name(&json.name)?;

    let member_ids = existing_members(store.get_ref(), json.member_ids).await?;
    if let AuthorizationLevel::Member(id) = &level {
        if !member_ids.contains(id) {
            return Err(AppError::Forbidden("create a group you are not part of"));
        }
    }

    let group = Group {
        id: Uuid::new_v4().to_string(),
        name: json.name.trim().to_string(),
        icon: json.icon,
        member_ids,
        expenses: vec![],
        goals: vec![],
    };
    store.insert_group(group.clone()).await?;

    info!(group_id = %group.id, members = group.member_ids.len(), "group added");
    Ok(HttpResponse::Created().json(group))
}

#[get("/groups/{id}")]
pub async fn get_group(
    store: web::Data<dyn LedgerStore>,
    request: HttpRequest,
    id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let level = authorize(&request)?;
    let group = load_group(store.get_ref(), &id).await?;
    ensure_group_access(&level, &group)?;
    let members = load_roster(store.get_ref(), &group).await?;
    Ok(HttpResponse::Ok().json(GroupJson { group, members }))
}

#[put("/groups/{id}/members")]
pub async fn update_members(
    store: web::Data<dyn LedgerStore>,
    request: HttpRequest,
    id: web::Path<String>,
    json: web::Json<MemberIdsJson>,
) -> Result<HttpResponse, AppError> {
    let level = authorize(&request)?;
    let group = load_group(store.get_ref(), &id).await?;
    ensure_group_access(&level, &group)?;

    let member_ids = existing_members(store.get_ref(), json.into_inner().member_ids).await?;
    let members = load_roster(store.get_ref(), &group).await?;
    let balances = compute_balances(&group.expenses, &members);
    validate_roster_change(&group.member_ids, &member_ids, &group.expenses, &balances)?;
    if let AuthorizationLevel::Member(id) = &level {
        if !member_ids.contains(id) {
            return Err(AppError::Forbidden("remove yourself from the group"));
        }
    }

    if !store.set_group_members(&group.id, &member_ids).await? {
        return Err(AppError::NotFound("group"));
    }

    info!(group_id = %group.id, members = member_ids.len(), "group members updated");
    Ok(HttpResponse::Ok().json(MemberIdsJson { member_ids }))
}

#[delete("/groups/{id}")]
pub async fn delete_group(
    store: web::Data<dyn LedgerStore>,
    request: HttpRequest,
    id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let level = authorize(&request)?;
    let group = load_group(store.get_ref(), &id).await?;
    ensure_group_access(&level, &group)?;

    if !store.delete_group(&group.id).await? {
        return Err(AppError::NotFound("group"));
    }
    info!(group_id = %group.id, "group deleted");
    Ok(HttpResponse::NoContent().finish())
}

#[get("/groups/{id}/balance")]
pub async fn get_balance(
    store: web::Data<dyn LedgerStore>,
    request: HttpRequest,
    id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let level = authorize(&request)?;
    let group = load_group(store.get_ref(), &id).await?;
    ensure_group_access(&level, &group)?;
    let members = load_roster(store.get_ref(), &group).await?;
    Ok(HttpResponse::Ok().json(compute_balances(&group.expenses, &members)))
}

#[get("/groups/{id}/debts")]
pub async fn get_debts(
    store: web::Data<dyn LedgerStore>,
    request: HttpRequest,
    id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let level = authorize(&request)?;
    let group = load_group(store.get_ref(), &id).await?;
    ensure_group_access(&level, &group)?;
    let members = load_roster(store.get_ref(), &group).await?;
    Ok(HttpResponse::Ok().json(compute_debts(&group.expenses, &members)))
}

#[get("/groups/{id}/summary")]
pub async fn get_summary(
    store: web::Data<dyn LedgerStore>,
    request: HttpRequest,
    id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let level = authorize(&request)?;
    let group = load_group(store.get_ref(), &id).await?;
    ensure_group_access(&level, &group)?;
    let members = load_roster(store.get_ref(), &group).await?;

    Ok(HttpResponse::Ok().json(SummaryJson {
        balances: compute_balances(&group.expenses, &members),
        debts: compute_debts(&group.expenses, &members),
        total_spent: group.expenses.iter().map(|expense| expense.amount).sum(),
    }))
}
