//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, web};
use mockable::DefaultClock;

use crate::domain::ports::{MockStatsQuery, MockUserDirectory, StatsQuery, UserDirectory};
use crate::domain::{LoadJobs, LoadLimits};
use crate::inbound::http::fallback::not_found;
use crate::inbound::http::health::HealthState;
use crate::inbound::http::state::{AppInfo, HttpState};
use crate::settings::Environment;

/// Build handler state from port doubles.
pub fn test_state(stats: MockStatsQuery, users: MockUserDirectory) -> HttpState {
    let stats: Arc<dyn StatsQuery> = Arc::new(stats);
    let users: Arc<dyn UserDirectory> = Arc::new(users);
    HttpState::new(
        stats,
        users,
        Arc::new(LoadJobs::new(LoadLimits::default(), Arc::new(DefaultClock))),
        AppInfo::current(Environment::Development),
    )
}

/// App with every route registered over `state`.
pub fn test_app(
    state: HttpState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(state))
        .app_data(web::Data::new(HealthState::new()))
        .configure(super::configure)
        .default_service(web::to(not_found))
}
