//! Service metadata and runtime status endpoints.

use actix_web::{get, web};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::inbound::http::state::HttpState;

/// Routes registered in every build.
pub const ENDPOINTS: [&str; 13] = [
    "GET /",
    "GET /health",
    "GET /health/live",
    "GET /health/ready",
    "GET /api/info",
    "GET /api/status",
    "GET /api/stats",
    "GET /api/users",
    "POST /api/users",
    "GET /api/load",
    "POST /api/load/jobs",
    "GET /api/load/jobs/{id}",
    "DELETE /api/load/jobs/{id}",
];

/// Routes advertised by `/api/info`, including the ones that depend on build
/// configuration.
pub fn endpoints() -> Vec<&'static str> {
    let mut routes = ENDPOINTS.to_vec();
    if cfg!(feature = "metrics") {
        routes.push("GET /metrics");
    }
    if cfg!(debug_assertions) {
        routes.push("GET /docs");
    }
    routes
}

/// Name, version and environment of the running service.
#[derive(Debug, Serialize, ToSchema)]
pub struct InfoResponse {
    /// Application name.
    #[schema(example = "stats-api")]
    pub app: String,
    /// Application version.
    pub version: String,
    /// `development` or `production`.
    pub environment: String,
    /// Public routes.
    pub endpoints: Vec<String>,
}

/// Describe the service.
#[utoipa::path(
    get,
    path = "/api/info",
    tags = ["info"],
    responses((status = 200, description = "Service metadata", body = InfoResponse)),
    operation_id = "info"
)]
#[get("/info")]
pub async fn info(state: web::Data<HttpState>) -> web::Json<InfoResponse> {
    let app = &state.app;
    web::Json(InfoResponse {
        app: app.name.clone(),
        version: app.version.clone(),
        environment: app.environment.to_string(),
        endpoints: endpoints().into_iter().map(str::to_owned).collect(),
    })
}

/// Runtime status of the process.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatusResponse {
    /// Always `running` while the process serves requests.
    #[schema(example = "running")]
    pub status: String,
    /// `development` or `production`.
    pub environment: String,
    /// Application version.
    pub version: String,
    /// Operating system the binary was built for.
    #[schema(example = "linux")]
    pub platform: String,
    /// CPU architecture the binary was built for.
    #[schema(example = "x86_64")]
    pub arch: String,
    /// Whole seconds since the service started.
    pub uptime: u64,
    /// Time the response was assembled.
    #[schema(value_type = String, format = DateTime)]
    pub timestamp: DateTime<Utc>,
}

/// Report process status without touching either store.
#[utoipa::path(
    get,
    path = "/api/status",
    tags = ["info"],
    responses((status = 200, description = "Process status", body = StatusResponse)),
    operation_id = "status"
)]
#[get("/status")]
pub async fn status(state: web::Data<HttpState>) -> web::Json<StatusResponse> {
    let app = &state.app;
    web::Json(StatusResponse {
        status: "running".to_owned(),
        environment: app.environment.to_string(),
        version: app.version.clone(),
        platform: std::env::consts::OS.to_owned(),
        arch: std::env::consts::ARCH.to_owned(),
        uptime: state.stats.uptime(),
        timestamp: Utc::now(),
    })
}
