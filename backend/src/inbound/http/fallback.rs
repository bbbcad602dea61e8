//! Catch-all for unmatched routes.

use actix_web::{HttpRequest, HttpResponse, ResponseError};

use crate::domain::Error;

/// `404` envelope naming the method and path that matched nothing.
pub async fn not_found(req: HttpRequest) -> HttpResponse {
    Error::not_found(format!("route not found: {} {}", req.method(), req.path())).error_response()
}
