//! Driving port for the greeting, statistics and health endpoints.
use async_trait::async_trait;

use crate::domain::{Error, Greeting, HealthReport, Stats};

/// Domain use-case port for visit and user statistics.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatsQuery: Send + Sync {
    /// Record a visit and report it alongside the user count.
    async fn greet(&self) -> Result<Greeting, Error>;

    /// Aggregate user statistics.
    async fn stats(&self) -> Result<Stats, Error>;

    /// Probe both stores. Never fails; unreachable stores are reported.
    async fn health(&self) -> HealthReport;

    /// Whole seconds since the service started.
    fn uptime(&self) -> u64;
}
