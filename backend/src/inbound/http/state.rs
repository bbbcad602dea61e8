//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data` so they only depend
//! on domain ports and remain testable without I/O.

use std::sync::Arc;

use crate::domain::LoadJobs;
use crate::domain::ports::{StatsQuery, UserDirectory};
use crate::settings::Environment;

/// Static facts about the running service reported by `/api/info`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppInfo {
    /// Application name.
    pub name: String,
    /// Application version.
    pub version: String,
    /// Deployment environment.
    pub environment: Environment,
}

impl AppInfo {
    /// Describe this crate running in `environment`.
    #[must_use]
    pub fn current(environment: Environment) -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_owned(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
            environment,
        }
    }
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Greeting, statistics and health.
    pub stats: Arc<dyn StatsQuery>,
    /// User listing and registration.
    pub users: Arc<dyn UserDirectory>,
    /// Detached load jobs and the limits applied to every load request.
    pub load_jobs: Arc<LoadJobs>,
    /// Service metadata.
    pub app: AppInfo,
}

impl HttpState {
    /// Bundle the ports used by the handlers.
    pub fn new(
        stats: Arc<dyn StatsQuery>,
        users: Arc<dyn UserDirectory>,
        load_jobs: Arc<LoadJobs>,
        app: AppInfo,
    ) -> Self {
        Self {
            stats,
            users,
            load_jobs,
            app,
        }
    }
}
