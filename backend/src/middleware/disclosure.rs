//! Error disclosure policy for server faults.
//!
//! Every `5xx` leaves through the JSON error envelope. Domain errors keep
//! their own envelope; other framework errors are wrapped as internal
//! errors. In production the message of a server fault is replaced by
//! generic text while client errors pass through untouched.

use std::task::{Context, Poll};

use actix_web::body::EitherBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, ResponseError};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::error;

use crate::domain::Error as DomainError;
use crate::settings::Environment;

/// Middleware rendering server faults according to the deployment
/// environment.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use stats_api::middleware::Disclosure;
/// use stats_api::settings::Environment;
///
/// let app = App::new().wrap(Disclosure::new(Environment::Production));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Disclosure {
    environment: Environment,
}

impl Disclosure {
    /// Apply the policy for `environment`.
    pub fn new(environment: Environment) -> Self {
        Self { environment }
    }
}

impl<S, B> Transform<S, ServiceRequest> for Disclosure
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = DisclosureMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(DisclosureMiddleware {
            service,
            redact: self.environment.is_production(),
        }))
    }
}

/// Service wrapper produced by [`Disclosure`].
pub struct DisclosureMiddleware<S> {
    service: S,
    redact: bool,
}

fn server_fault(error: &Error) -> DomainError {
    error
        .as_error::<DomainError>()
        .cloned()
        .unwrap_or_else(|| DomainError::internal(error.to_string()))
}

impl<S, B> Service<ServiceRequest> for DisclosureMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let redact = self.redact;
        let fut = self.service.call(req);
        Box::pin(async move {
            let res = fut.await?;
            if !res.status().is_server_error() {
                return Ok(res.map_into_left_body());
            }
            let Some(fault) = res.response().error().map(server_fault) else {
                return Ok(res.map_into_left_body());
            };
            error!(
                code = ?fault.code(),
                trace_id = fault.trace_id().unwrap_or_default(),
                message = fault.message(),
                "server fault"
            );
            let fault = if redact { fault.redacted() } else { fault };
            let (req, _) = res.into_parts();
            Ok(ServiceResponse::new(req, fault.error_response()).map_into_right_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test, web};
    use rstest::rstest;
    use serde_json::Value;

    async fn render(environment: Environment, error: DomainError) -> (StatusCode, Value) {
        let app = test::init_service(App::new().wrap(Disclosure::new(environment)).route(
            "/",
            web::get().to(move || {
                let error = error.clone();
                async move { Err::<HttpResponse, _>(error) }
            }),
        ))
        .await;
        let res = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        let status = res.status();
        (status, test::read_body_json(res).await)
    }

    #[rstest]
    #[actix_web::test]
    async fn production_hides_internal_messages() {
        let (status, body) = render(
            Environment::Production,
            DomainError::internal("password authentication failed for user stats"),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal Server Error");
        assert_eq!(body["message"], "An internal error occurred");
    }

    #[rstest]
    #[actix_web::test]
    async fn development_keeps_internal_messages() {
        let (_, body) = render(
            Environment::Development,
            DomainError::internal("password authentication failed for user stats"),
        )
        .await;

        assert_eq!(
            body["message"],
            "password authentication failed for user stats"
        );
    }

    #[rstest]
    #[case(Environment::Development)]
    #[case(Environment::Production)]
    #[actix_web::test]
    async fn client_errors_are_untouched(#[case] environment: Environment) {
        let error = DomainError::invalid_request("name must not be empty");
        let (status, body) = render(environment, error).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "name must not be empty");
    }

    #[rstest]
    #[actix_web::test]
    async fn framework_errors_get_the_envelope() {
        let app = test::init_service(
            App::new()
                .wrap(Disclosure::new(Environment::Development))
                .route(
                    "/",
                    web::get().to(|| async {
                        Err::<HttpResponse, _>(actix_web::error::ErrorInternalServerError("boom"))
                    }),
                ),
        )
        .await;

        let res = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;

        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["code"], "internal_error");
        assert_eq!(body["message"], "boom");
    }
}
