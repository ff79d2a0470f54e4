use actix_web::{get, post, web, HttpRequest, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::{authorize, sign_member_token, ApiToken, AuthorizationLevel};
use crate::error::AppError;
use crate::schemas::Member;
use crate::store::LedgerStore;
use crate::validation::validate_name;

#[derive(Deserialize)]
pub struct NewMemberJson {
    name: String,
    email: Option<String>,
    avatar_url: Option<String>,
    pix_key: Option<String>,
}

#[derive(Serialize)]
struct MemberCreatedJson {
    member: Member,
    token: String,
}

#[post("/members")]
pub async fn add_member(
    store: web::Data<dyn LedgerStore>,
    api_token: web::Data<ApiToken>,
    request: HttpRequest,
    json: web::Json<NewMemberJson>,
) -> Result<HttpResponse, AppError> {
    if authorize(&request)? != AuthorizationLevel::Service {
        return Err(AppError::Forbidden("create members"));
    }
    let json = json.into_inner();
    validate_name(&json.name)?;

    let member = Member {
        id: Uuid::new_v4().to_string(),
        name: json.name.trim().to_string(),
        email: json.email,
        avatar_url: json.avatar_url,
        pix_key: json.pix_key,
    };
    let token = sign_member_token(&member.id, &Utc::now().to_rfc3339(), &api_token.0)
        .ok_or(AppError::Unauthorized)?;
    store.insert_member(member.clone()).await?;

    info!(member_id = %member.id, "member added");
    Ok(HttpResponse::Created().json(MemberCreatedJson { member, token }))
}

#[get("/members/{id}")]
pub async fn get_member(
    store: web::Data<dyn LedgerStore>,
    request: HttpRequest,
    id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    authorize(&request)?;
    match store.find_member(&id).await? {
        Some(member) => Ok(HttpResponse::Ok().json(member)),
        None => Err(AppError::NotFound("member")),
    }
}
