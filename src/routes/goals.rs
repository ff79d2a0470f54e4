use actix_web::{get, post, web, HttpRequest, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::{ensure_group_access, load_group, load_roster};
use crate::auth::authorize;
use crate::error::AppError;
use crate::goals::{completes_goal, goal_progress, GoalProgress};
use crate::schemas::{Contribution, Goal, MemberId};
use crate::store::LedgerStore;
use crate::validation::{require_members, validate_name, validate_positive_amount};

#[derive(Deserialize)]
pub struct NewGoalJson {
    name: String,
    target_amount: f64,
}

#[derive(Deserialize)]
pub struct NewContributionJson {
    member_id: MemberId,
    amount: f64,
    date: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
struct ContributionAddedJson {
    contribution: Contribution,
    goal_completed: bool,
}

#[post("/groups/{id}/goals")]
pub async fn add_goal(
    store: web::Data<dyn LedgerStore>,
    request: HttpRequest,
    id: web::Path<String>,
    json: web::Json<NewGoalJson>,
) -> Result<HttpResponse, AppError> {
    let level = authorize(&request)?;
    let group = load_group(store.get_ref(), &id).await?;
    ensure_group_access(&level, &group)?;

    let json = json.into_inner();
    validate_name(&json.name)?;
    validate_positive_amount(json.target_amount)?;

    let goal = Goal {
        id: Uuid::new_v4().to_string(),
        name: json.name.trim().to_string(),
        target_amount: json.target_amount,
        contributions: vec![],
    };
    if !store.push_goal(&group.id, goal.clone()).await? {
        return Err(AppError::NotFound("group"));
    }
    info!(group_id = %group.id, goal_id = %goal.id, target = goal.target_amount, "goal added");
    Ok(HttpResponse::Created().json(goal))
}

#[get("/groups/{id}/goals")]
pub async fn list_goals(
    store: web::Data<dyn LedgerStore>,
    request: HttpRequest,
    id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let level = authorize(&request)?;
    let group = load_group(store.get_ref(), &id).await?;
    ensure_group_access(&level, &group)?;
    let members = load_roster(store.get_ref(), &group).await?;

    let progress: Vec<GoalProgress> = group
        .goals
        .iter()
        .map(|goal| goal_progress(goal, &members))
        .collect();
    Ok(HttpResponse::Ok().json(progress))
}

#[post("/groups/{id}/goals/{goal_id}/contributions")]
pub async fn add_contribution(
    store: web::Data<dyn LedgerStore>,
    request: HttpRequest,
    path: web::Path<(String, String)>,
    json: web::Json<NewContributionJson>,
) -> Result<HttpResponse, AppError> {
    let (group_id, goal_id) = path.into_inner();
    let level = authorize(&request)?;
    let group = load_group(store.get_ref(), &group_id).await?;
    ensure_group_access(&level, &group)?;

    let json = json.into_inner();
    validate_positive_amount(json.amount)?;
    require_members([&json.member_id], &group.member_ids)?;
    if !level.may_act_for(&json.member_id) {
        return Err(AppError::Forbidden("contribute on someone else's behalf"));
    }

    let goal = group
        .goals
        .iter()
        .find(|goal| goal.id == goal_id)
        .ok_or(AppError::NotFound("goal"))?;
    let goal_completed = completes_goal(goal, json.amount);

    let contribution = Contribution {
        id: Uuid::new_v4().to_string(),
        member_id: json.member_id,
        amount: json.amount,
        date: json.date.unwrap_or_else(Utc::now),
    };
    if !store
        .push_contribution(&group.id, &goal.id, contribution.clone())
        .await?
    {
        return Err(AppError::NotFound("goal"));
    }

    if goal_completed {
        info!(group_id = %group.id, goal_id = %goal.id, name = %goal.name, "goal completed");
    } else {
        info!(group_id = %group.id, goal_id = %goal.id, amount = contribution.amount, "contribution added");
    }
    Ok(HttpResponse::Created().json(ContributionAddedJson {
        contribution,
        goal_completed,
    }))
}
