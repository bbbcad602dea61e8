//! HTTP adapter mapping for domain errors.
//!
//! Keeps the domain error type HTTP-agnostic while turning domain failures
//! into one JSON envelope with consistent status codes. Extractor failures
//! (bad JSON, bad query strings, bad path segments) are routed through the
//! same envelope via the handlers registered in [`super::configure`].

use actix_web::error::{JsonPayloadError, PathError, QueryPayloadError};
use actix_web::{HttpRequest, HttpResponse, ResponseError, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::domain::{Error, ErrorCode, TRACE_ID_HEADER};

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, Error>;

/// Headline used for internal errors.
pub const INTERNAL_SERVER_ERROR: &str = "Internal Server Error";

/// JSON error envelope returned for every failed request.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Short description: the validation message for client errors, the
    /// store failure for unavailable stores, otherwise the status phrase.
    #[schema(example = "name must not be empty")]
    pub error: String,
    /// Human-readable detail.
    pub message: String,
    /// Stable machine-readable category.
    pub code: ErrorCode,
    /// When the error was rendered.
    #[schema(value_type = String, format = DateTime)]
    pub timestamp: DateTime<Utc>,
    /// Correlation identifier matching the `trace-id` response header.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    /// Structured context, for example the offending field.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub details: Option<Value>,
}

impl ErrorBody {
    /// Render `error` as an envelope stamped with `timestamp`.
    pub fn new(error: &Error, timestamp: DateTime<Utc>) -> Self {
        Self {
            error: headline(error),
            message: error.message().to_owned(),
            code: error.code(),
            timestamp,
            trace_id: error.trace_id().map(ToOwned::to_owned),
            details: error.details().cloned(),
        }
    }
}

fn headline(error: &Error) -> String {
    match error.code() {
        ErrorCode::InvalidRequest | ErrorCode::ServiceUnavailable => error.message().to_owned(),
        ErrorCode::NotFound => "Not Found".to_owned(),
        ErrorCode::Conflict => "Conflict".to_owned(),
        ErrorCode::InternalError => INTERNAL_SERVER_ERROR.to_owned(),
    }
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::ServiceUnavailable | ErrorCode::InternalError => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        status_for(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        if let Some(id) = self.trace_id() {
            builder.insert_header((TRACE_ID_HEADER, id.to_owned()));
        }
        builder.json(ErrorBody::new(self, Utc::now()))
    }
}

/// Map malformed JSON bodies to `400 invalid_request`.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    Error::invalid_request(format!("invalid JSON body: {err}")).into()
}

/// Map malformed query strings to `400 invalid_request`.
pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    Error::invalid_request(format!("invalid query string: {err}")).into()
}

/// Map malformed path segments to `400 invalid_request`.
pub fn path_error_handler(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    Error::invalid_request(format!("invalid path parameter: {err}")).into()
}

#[cfg(test)]
mod tests;
