//! HTTP inbound adapter exposing REST endpoints.

pub mod error;
pub mod fallback;
pub mod health;
pub mod info;
pub mod load;
pub mod root;
pub mod state;
pub mod stats;
#[cfg(test)]
pub mod test_utils;
pub mod users;
pub mod validation;

use actix_web::web;

pub use error::ApiResult;

/// Register every route plus the extractor error handlers.
///
/// Callers supply [`state::HttpState`] and [`health::HealthState`] as app
/// data and [`fallback::not_found`] as the default service.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(error::json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(error::query_error_handler))
        .app_data(web::PathConfig::default().error_handler(error::path_error_handler))
        .service(root::index)
        .service(health::health)
        .service(health::ready)
        .service(health::live)
        .service(
            web::scope("/api")
                .service(info::info)
                .service(info::status)
                .service(stats::stats)
                .service(users::list_users)
                .service(users::create_user)
                .service(load::run_load)
                .service(load::start_load_job)
                .service(load::get_load_job)
                .service(load::cancel_load_job),
        );
}
