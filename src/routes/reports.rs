use actix_web::{get, web, HttpRequest, HttpResponse};

use super::{ensure_group_access, load_group, load_roster};
use crate::auth::authorize;
use crate::error::AppError;
use crate::reports::{group_report, ReportRange};
use crate::store::LedgerStore;

/// `?start=YYYY-MM-DD&end=YYYY-MM-DD`, both optional and inclusive.
#[get("/groups/{id}/report")]
pub async fn get_report(
    store: web::Data<dyn LedgerStore>,
    request: HttpRequest,
    id: web::Path<String>,
    range: web::Query<ReportRange>,
) -> Result<HttpResponse, AppError> {
    let level = authorize(&request)?;
    let range = range.into_inner();
    range.validate()?;

    let group = load_group(store.get_ref(), &id).await?;
    ensure_group_access(&level, &group)?;
    let members = load_roster(store.get_ref(), &group).await?;
    Ok(HttpResponse::Ok().json(group_report(&group.expenses, &members, range)))
}
