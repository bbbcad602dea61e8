//! Statistics endpoint.

use actix_web::{get, web};

use crate::domain::Stats;
use crate::inbound::http::ApiResult;
use crate::inbound::http::error::ErrorBody;
use crate::inbound::http::state::HttpState;

/// User totals, users created today (server-local day) and uptime.
#[utoipa::path(
    get,
    path = "/api/stats",
    tags = ["stats"],
    responses(
        (status = 200, description = "Current statistics", body = Stats),
        (status = 500, description = "The user store failed", body = ErrorBody)
    ),
    operation_id = "getStats"
)]
#[get("/stats")]
pub async fn stats(state: web::Data<HttpState>) -> ApiResult<web::Json<Stats>> {
    let stats = state.stats.stats().await?;
    Ok(web::Json(stats))
}
