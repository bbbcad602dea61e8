//! Tests for HTTP error mapping.

use super::*;
use actix_web::ResponseError;
use actix_web::body::to_bytes;
use actix_web::http::StatusCode;
use rstest::{fixture, rstest};
use serde_json::json;

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[fixture]
fn expected_trace_id() -> String {
    TRACE_ID.to_owned()
}

async fn render(error: &Error) -> (StatusCode, Option<String>, Value) {
    let response = ResponseError::error_response(error);
    let status = response.status();
    let header = response
        .headers()
        .get(TRACE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(ToOwned::to_owned);
    let bytes = to_bytes(response.into_body())
        .await
        .expect("reading response body succeeds");
    let body = serde_json::from_slice(&bytes).expect("error envelope is JSON");
    (status, header, body)
}

#[rstest]
#[case(Error::invalid_request("bad"), StatusCode::BAD_REQUEST)]
#[case(Error::not_found("missing"), StatusCode::NOT_FOUND)]
#[case(Error::conflict("busy"), StatusCode::CONFLICT)]
#[case(Error::service_unavailable("down"), StatusCode::INTERNAL_SERVER_ERROR)]
#[case(Error::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR)]
fn status_code_matches_error_code(#[case] error: Error, #[case] expected: StatusCode) {
    assert_eq!(ResponseError::status_code(&error), expected);
}

#[rstest]
#[case(Error::invalid_request("name must not be empty"), "name must not be empty")]
#[case(Error::not_found("load job not found"), "Not Found")]
#[case(Error::conflict("too many jobs"), "Conflict")]
#[case(
    Error::service_unavailable("counter store unavailable: refused"),
    "counter store unavailable: refused"
)]
#[case(Error::internal("boom"), INTERNAL_SERVER_ERROR)]
fn headline_depends_on_category(#[case] error: Error, #[case] expected: &str) {
    let body = ErrorBody::new(&error, Utc::now());
    assert_eq!(body.error, expected);
    assert_eq!(body.message, error.message());
}

#[rstest]
#[actix_web::test]
async fn envelope_carries_trace_id_and_details(expected_trace_id: String) {
    let error = Error::invalid_request("bad")
        .with_trace_id(expected_trace_id.clone())
        .with_details(json!({ "field": "name", "code": "empty_field" }));

    let (status, header, body) = render(&error).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(header.as_deref(), Some(expected_trace_id.as_str()));
    assert_eq!(body["error"], "bad");
    assert_eq!(body["code"], "invalid_request");
    assert_eq!(body["trace_id"], expected_trace_id.as_str());
    assert_eq!(body["details"], json!({ "field": "name", "code": "empty_field" }));
    assert!(body["timestamp"].is_string());
}

#[rstest]
#[actix_web::test]
async fn envelope_omits_absent_fields() {
    let (_, header, body) = render(&Error::not_found("missing")).await;

    assert!(header.is_none());
    assert!(body.get("trace_id").is_none());
    assert!(body.get("details").is_none());
}
