use actix_web::{delete, get, post, put, web, HttpRequest, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::{authorize, AuthorizationLevel};
use crate::error::AppError;
use crate::revenue::{order_for_listing, summarize, RevenueSummary};
use crate::schemas::{Revenue, RevenueCategory};
use crate::store::LedgerStore;
use crate::validation::{validate_positive_amount, ValidationError};

#[derive(Deserialize)]
pub struct NewRevenueJson {
    description: String,
    amount: f64,
    date: Option<DateTime<Utc>>,
    #[serde(default)]
    category: RevenueCategory,
    #[serde(default)]
    received: bool,
}

#[derive(Deserialize)]
pub struct ReceivedJson {
    received: bool,
}

#[derive(Serialize)]
struct RevenueListJson {
    revenues: Vec<Revenue>,
    summary: RevenueSummary,
}

fn ensure_owner(level: &AuthorizationLevel, member_id: &str) -> Result<(), AppError> {
    if level.may_act_for(member_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden("manage someone else's revenues"))
    }
}

#[post("/members/{id}/revenues")]
pub async fn add_revenue(
    store: web::Data<dyn LedgerStore>,
    request: HttpRequest,
    id: web::Path<String>,
    json: web::Json<NewRevenueJson>,
) -> Result<HttpResponse, AppError> {
    let level = authorize(&request)?;
    ensure_owner(&level, &id)?;
    let member = store
        .find_member(&id)
        .await?
        .ok_or(AppError::NotFound("member"))?;

    let json = json.into_inner();
    validate_positive_amount(json.amount)?;
    if json.description.trim().is_empty() {
        return Err(ValidationError::EmptyDescription.into());
    }

    let revenue = Revenue {
        id: Uuid::new_v4().to_string(),
        member_id: member.id,
        description: json.description.trim().to_string(),
        amount: json.amount,
        date: json.date.unwrap_or_else(Utc::now),
        category: json.category,
        received: json.received,
    };
    store.insert_revenue(revenue.clone()).await?;

    info!(member_id = %revenue.member_id, revenue_id = %revenue.id, received = revenue.received, "revenue added");
    Ok(HttpResponse::Created().json(revenue))
}

#[get("/members/{id}/revenues")]
pub async fn list_revenues(
    store: web::Data<dyn LedgerStore>,
    request: HttpRequest,
    id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let level = authorize(&request)?;
    ensure_owner(&level, &id)?;

    let revenues = store.find_revenues(&id).await?;
    let summary = summarize(&revenues);
    Ok(HttpResponse::Ok().json(RevenueListJson {
        revenues: order_for_listing(revenues),
        summary,
    }))
}

#[put("/revenues/{id}/received")]
pub async fn set_received(
    store: web::Data<dyn LedgerStore>,
    request: HttpRequest,
    id: web::Path<String>,
    json: web::Json<ReceivedJson>,
) -> Result<HttpResponse, AppError> {
    let level = authorize(&request)?;
    let mut revenue = store
        .find_revenue(&id)
        .await?
        .ok_or(AppError::NotFound("revenue"))?;
    ensure_owner(&level, &revenue.member_id)?;

    revenue.received = json.received;
    if !store.set_revenue_received(&revenue.id, revenue.received).await? {
        return Err(AppError::NotFound("revenue"));
    }
    Ok(HttpResponse::Ok().json(revenue))
}

#[delete("/revenues/{id}")]
pub async fn delete_revenue(
    store: web::Data<dyn LedgerStore>,
    request: HttpRequest,
    id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let level = authorize(&request)?;
    let revenue = store
        .find_revenue(&id)
        .await?
        .ok_or(AppError::NotFound("revenue"))?;
    ensure_owner(&level, &revenue.member_id)?;

    if !store.delete_revenue(&revenue.id).await? {
        return Err(AppError::NotFound("revenue"));
    }
    Ok(HttpResponse::NoContent().finish())
}
