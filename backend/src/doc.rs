//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every HTTP endpoint from the inbound layer together
//! with the response and error envelope schemas. The document backs Swagger
//! UI in debug builds and is exported via `cargo run --bin openapi-dump` for
//! external tooling.

use utoipa::OpenApi;

use crate::domain::{
    DependencyStatus, ErrorCode, Greeting, HealthReport, HealthStatus, LoadJobState,
    LoadJobStatus, Stats, User,
};
use crate::inbound::http::error::ErrorBody;
use crate::inbound::http::info::{InfoResponse, StatusResponse};
use crate::inbound::http::load::{LoadJobAccepted, LoadResponse, StartLoadJobRequest};
use crate::inbound::http::users::{CreateUserRequest, UsersResponse};

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only and used by tooling.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Stats and users API",
        description = "Visit counter, user registry, statistics and synthetic CPU load."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::root::index,
        crate::inbound::http::health::health,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
        crate::inbound::http::info::info,
        crate::inbound::http::info::status,
        crate::inbound::http::stats::stats,
        crate::inbound::http::users::list_users,
        crate::inbound::http::users::create_user,
        crate::inbound::http::load::run_load,
        crate::inbound::http::load::start_load_job,
        crate::inbound::http::load::get_load_job,
        crate::inbound::http::load::cancel_load_job,
    ),
    components(schemas(
        ErrorBody,
        ErrorCode,
        Greeting,
        Stats,
        HealthReport,
        HealthStatus,
        DependencyStatus,
        User,
        UsersResponse,
        CreateUserRequest,
        InfoResponse,
        StatusResponse,
        LoadResponse,
        StartLoadJobRequest,
        LoadJobAccepted,
        LoadJobStatus,
        LoadJobState,
    )),
    tags(
        (name = "stats", description = "Visit greeting and statistics"),
        (name = "users", description = "User registry"),
        (name = "load", description = "Synthetic CPU load"),
        (name = "info", description = "Service metadata"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
