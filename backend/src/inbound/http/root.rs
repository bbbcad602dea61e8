//! Greeting endpoint.
//!
//! ```text
//! GET /
//! ```

use actix_web::{get, web};

use crate::domain::Greeting;
use crate::inbound::http::ApiResult;
use crate::inbound::http::error::ErrorBody;
use crate::inbound::http::state::HttpState;

/// Count a visit and report it alongside the number of users.
///
/// Both stores must answer; a failure in either fails the request.
#[utoipa::path(
    get,
    path = "/",
    tags = ["stats"],
    responses(
        (status = 200, description = "Visit recorded", body = Greeting),
        (status = 500, description = "A store failed", body = ErrorBody)
    ),
    operation_id = "greet"
)]
#[get("/")]
pub async fn index(state: web::Data<HttpState>) -> ApiResult<web::Json<Greeting>> {
    let greeting = state.stats.greet().await?;
    Ok(web::Json(greeting))
}
