//! Load generator endpoints.
//!
//! ```text
//! GET    /api/load?duration=5&intensity=2
//! POST   /api/load/jobs {"duration":30,"intensity":4}
//! GET    /api/load/jobs/{id}
//! DELETE /api/load/jobs/{id}
//! ```

use actix_web::{HttpResponse, delete, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::load::{DEFAULT_DURATION_SECS, DEFAULT_INTENSITY};
use crate::domain::{Error, LoadJobId, LoadJobState, LoadJobStatus, LoadRequest};
use crate::inbound::http::ApiResult;
use crate::inbound::http::error::ErrorBody;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::load_validation_error;

/// Query parameters for the synchronous load run.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LoadQuery {
    /// Run time in seconds. Defaults to 10.
    pub duration: Option<u64>,
    /// Number of busy workers. Defaults to 1.
    pub intensity: Option<u32>,
}

/// Body for `POST /api/load/jobs`. Omitted fields take the same defaults as
/// the synchronous endpoint.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct StartLoadJobRequest {
    /// Run time in seconds.
    #[serde(default)]
    pub duration: Option<u64>,
    /// Number of busy workers.
    #[serde(default)]
    pub intensity: Option<u32>,
}

/// Result of a synchronous load run.
#[derive(Debug, Serialize, ToSchema)]
pub struct LoadResponse {
    /// Always `completed`.
    #[schema(example = "completed")]
    pub message: String,
    /// Requested duration in seconds.
    pub duration: u64,
    /// Requested worker count.
    pub intensity: u32,
    /// Work batches completed across all workers.
    pub iterations: u64,
    /// Wall-clock run time in milliseconds.
    pub elapsed_ms: u64,
}

/// Acknowledgement for a started job.
#[derive(Debug, Serialize, ToSchema)]
pub struct LoadJobAccepted {
    /// Job identifier.
    #[schema(value_type = String, format = Uuid)]
    pub job_id: LoadJobId,
    /// Always `running` at creation.
    pub status: LoadJobState,
    /// Where to poll for progress.
    #[schema(example = "/api/load/jobs/3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub status_url: String,
}

fn validated(
    state: &HttpState,
    duration: Option<u64>,
    intensity: Option<u32>,
) -> ApiResult<LoadRequest> {
    LoadRequest::new(
        duration.unwrap_or(DEFAULT_DURATION_SECS),
        intensity.unwrap_or(DEFAULT_INTENSITY),
        state.load_jobs.limits(),
    )
    .map_err(|err| load_validation_error(&err))
}

fn parse_job_id(raw: &str) -> ApiResult<LoadJobId> {
    raw.parse()
        .map_err(|_| Error::not_found(format!("load job not found: {raw}")))
}

fn millis(elapsed: std::time::Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

/// Burn CPU for the requested time and report when done.
///
/// Counts against the same limit as detached jobs. Dropping the connection
/// stops the workers.
#[utoipa::path(
    get,
    path = "/api/load",
    tags = ["load"],
    params(LoadQuery),
    responses(
        (status = 200, description = "Load run finished", body = LoadResponse),
        (status = 400, description = "Parameters out of range", body = ErrorBody),
        (status = 409, description = "Too many load runs in progress", body = ErrorBody)
    ),
    operation_id = "runLoad"
)]
#[get("/load")]
pub async fn run_load(
    state: web::Data<HttpState>,
    query: web::Query<LoadQuery>,
) -> ApiResult<web::Json<LoadResponse>> {
    let LoadQuery {
        duration,
        intensity,
    } = query.into_inner();
    let request = validated(&state, duration, intensity)?;
    let report = state.load_jobs.run_attached(request).await?;
    Ok(web::Json(LoadResponse {
        message: "completed".to_owned(),
        duration: request.duration_secs(),
        intensity: request.intensity(),
        iterations: report.iterations,
        elapsed_ms: millis(report.elapsed),
    }))
}

/// Start a detached load job.
#[utoipa::path(
    post,
    path = "/api/load/jobs",
    tags = ["load"],
    request_body = StartLoadJobRequest,
    responses(
        (status = 202, description = "Job started", body = LoadJobAccepted),
        (status = 400, description = "Parameters out of range", body = ErrorBody),
        (status = 409, description = "Too many load runs in progress", body = ErrorBody)
    ),
    operation_id = "startLoadJob"
)]
#[post("/load/jobs")]
pub async fn start_load_job(
    state: web::Data<HttpState>,
    payload: web::Json<StartLoadJobRequest>,
) -> ApiResult<HttpResponse> {
    let StartLoadJobRequest {
        duration,
        intensity,
    } = payload.into_inner();
    let request = validated(&state, duration, intensity)?;
    let job = state.load_jobs.start(request)?;
    Ok(HttpResponse::Accepted().json(LoadJobAccepted {
        status_url: format!("/api/load/jobs/{}", job.job_id),
        job_id: job.job_id,
        status: job.status,
    }))
}

/// Fetch a job's status.
#[utoipa::path(
    get,
    path = "/api/load/jobs/{id}",
    tags = ["load"],
    params(("id" = String, Path, description = "Job identifier")),
    responses(
        (status = 200, description = "Job status", body = LoadJobStatus),
        (status = 404, description = "Unknown job", body = ErrorBody)
    ),
    operation_id = "getLoadJob"
)]
#[get("/load/jobs/{id}")]
pub async fn get_load_job(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<LoadJobStatus>> {
    let job_id = parse_job_id(&path)?;
    Ok(web::Json(state.load_jobs.get(&job_id)?))
}

/// Ask a running job to stop.
#[utoipa::path(
    delete,
    path = "/api/load/jobs/{id}",
    tags = ["load"],
    params(("id" = String, Path, description = "Job identifier")),
    responses(
        (status = 202, description = "Cancellation requested", body = LoadJobStatus),
        (status = 404, description = "Unknown job", body = ErrorBody)
    ),
    operation_id = "cancelLoadJob"
)]
#[delete("/load/jobs/{id}")]
pub async fn cancel_load_job(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let job_id = parse_job_id(&path)?;
    let status = state.load_jobs.cancel(&job_id)?;
    Ok(HttpResponse::Accepted().json(status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{MockStatsQuery, MockUserDirectory};
    use crate::inbound::http::test_utils::{test_app, test_state};
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use rstest::rstest;
    use serde_json::{Value, json};

    fn app_state() -> HttpState {
        test_state(MockStatsQuery::new(), MockUserDirectory::new())
    }

    #[rstest]
    #[case("/api/load?duration=1000", "duration")]
    #[case("/api/load?duration=0", "duration")]
    #[case("/api/load?duration=1&intensity=0", "intensity")]
    #[case("/api/load?duration=1&intensity=11", "intensity")]
    #[actix_web::test]
    async fn out_of_range_parameters_are_rejected(#[case] uri: &str, #[case] field: &str) {
        let app = actix_test::init_service(test_app(app_state())).await;

        let response =
            actix_test::call_service(&app, actix_test::TestRequest::get().uri(uri).to_request())
                .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(
            body["details"],
            json!({ "field": field, "code": "out_of_range" })
        );
    }

    #[rstest]
    #[actix_web::test]
    async fn non_numeric_parameters_are_bad_requests() {
        let app = actix_test::init_service(test_app(app_state())).await;

        let request = actix_test::TestRequest::get()
            .uri("/api/load?duration=soon")
            .to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[rstest]
    #[actix_web::test]
    async fn jobs_can_be_started_polled_and_cancelled() {
        let app = actix_test::init_service(test_app(app_state())).await;

        let start = actix_test::TestRequest::post()
            .uri("/api/load/jobs")
            .set_json(json!({ "duration": 30, "intensity": 1 }))
            .to_request();
        let response = actix_test::call_service(&app, start).await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["status"], "running");
        let status_url = body["status_url"].as_str().expect("status url").to_owned();
        let job_id = body["job_id"].as_str().expect("job id");
        assert_eq!(status_url, format!("/api/load/jobs/{job_id}"));

        let poll = actix_test::TestRequest::get().uri(&status_url).to_request();
        let response = actix_test::call_service(&app, poll).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["duration"], 30);

        let cancel = actix_test::TestRequest::delete().uri(&status_url).to_request();
        let response = actix_test::call_service(&app, cancel).await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[rstest]
    #[case("/api/load/jobs/not-a-uuid")]
    #[case("/api/load/jobs/3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    #[actix_web::test]
    async fn unknown_jobs_are_not_found(#[case] uri: &str) {
        let app = actix_test::init_service(test_app(app_state())).await;

        let response =
            actix_test::call_service(&app, actix_test::TestRequest::get().uri(uri).to_request())
                .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["error"], "Not Found");
        assert_eq!(body["code"], "not_found");
    }

    #[rstest]
    #[actix_web::test]
    async fn synchronous_run_is_refused_when_jobs_fill_every_slot() {
        let state = app_state();
        let jobs = state.load_jobs.clone();
        let request = LoadRequest::new(30, 1, jobs.limits()).expect("valid request");
        for _ in 0..jobs.limits().max_running_jobs {
            jobs.start(request).expect("job starts");
        }
        let app = actix_test::init_service(test_app(state)).await;

        let request = actix_test::TestRequest::get()
            .uri("/api/load?duration=1&intensity=1")
            .to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["code"], "conflict");
        jobs.cancel_all();
    }

    #[rstest]
    fn elapsed_is_reported_in_milliseconds() {
        assert_eq!(millis(std::time::Duration::from_millis(1_250)), 1_250);
    }
}
