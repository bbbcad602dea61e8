//! Visit, user and health statistics.
//!
//! [`StatsService`] implements the [`StatsQuery`] driving port on top of the
//! counter and user stores. Store failures are surfaced as
//! [`ErrorCode::ServiceUnavailable`](crate::domain::ErrorCode) errors whose
//! message is the adapter's own description; no partial result is returned.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, TimeDelta, TimeZone, Utc};
use mockable::Clock;
use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

use crate::domain::ports::{
    CounterStore, CounterStoreError, StatsQuery, UserPersistenceError, UserRepository,
};
use crate::domain::{CounterKey, Error};

/// Greeting returned by the root endpoint.
pub const GREETING: &str = "Hello Docker!";

/// Visit count and user count observed while serving the root endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Greeting {
    /// Fixed greeting text.
    #[schema(example = "Hello Docker!")]
    pub message: String,
    /// Visit counter after this request was counted.
    pub visits: u64,
    /// Number of registered users.
    pub users: u64,
    /// Time the response was assembled.
    #[schema(value_type = String, format = DateTime)]
    pub timestamp: DateTime<Utc>,
}

/// Aggregate user statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Stats {
    /// Number of registered users.
    pub total_users: u64,
    /// Users created since the start of the current local day.
    pub new_users_today: u64,
    /// Whole seconds since the service started.
    pub uptime: u64,
    /// Time the statistics were computed.
    #[schema(value_type = String, format = DateTime)]
    pub timestamp: DateTime<Utc>,
}

/// Overall service health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Both stores answered.
    Healthy,
    /// At least one store did not answer.
    Unhealthy,
}

/// Reachability of a single backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DependencyStatus {
    /// The store answered a ping.
    Connected,
    /// The store failed or timed out.
    Disconnected,
}

impl DependencyStatus {
    fn from_probe<E>(result: &Result<(), E>) -> Self {
        if result.is_ok() {
            Self::Connected
        } else {
            Self::Disconnected
        }
    }
}

/// Health report computed per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct HealthReport {
    /// `healthy` only when every store is connected.
    pub status: HealthStatus,
    /// User store reachability.
    pub database: DependencyStatus,
    /// Counter store reachability.
    pub cache: DependencyStatus,
    /// Time of the probe.
    #[schema(value_type = String, format = DateTime)]
    pub timestamp: DateTime<Utc>,
    /// Whole seconds since the service started.
    pub uptime: u64,
}

impl HealthReport {
    /// Whether every store answered.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

/// Start of the calendar day containing `now`, in the timezone of `now`.
///
/// When local midnight does not exist (a DST gap) the first valid instant of
/// the day is used instead.
///
/// # Examples
/// ```
/// use chrono::{FixedOffset, TimeZone, Utc};
/// use stats_api::domain::start_of_day;
///
/// let tz = FixedOffset::east_opt(2 * 3600).expect("valid offset");
/// let now = tz.with_ymd_and_hms(2025, 6, 1, 1, 30, 0).single().expect("valid time");
/// let start = start_of_day(&now);
/// assert_eq!(start, Utc.with_ymd_and_hms(2025, 5, 31, 22, 0, 0).single().expect("valid time"));
/// ```
pub fn start_of_day<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    let tz = now.timezone();
    let midnight = now.date_naive().and_time(NaiveTime::MIN);
    tz.from_local_datetime(&midnight)
        .earliest()
        .or_else(|| {
            tz.from_local_datetime(&(midnight + TimeDelta::hours(1)))
                .earliest()
        })
        .map_or_else(|| now.with_timezone(&Utc), |start| start.with_timezone(&Utc))
}

fn map_counter_error(error: CounterStoreError) -> Error {
    warn!(error = %error, "counter store call failed");
    Error::service_unavailable(error.to_string())
}

fn map_user_error(error: UserPersistenceError) -> Error {
    warn!(error = %error, "user store call failed");
    match error {
        UserPersistenceError::Connection { .. } => Error::service_unavailable(error.to_string()),
        UserPersistenceError::Query { .. } | UserPersistenceError::DuplicateEmail { .. } => {
            Error::internal(error.to_string())
        }
    }
}

/// Statistics service implementing [`StatsQuery`].
#[derive(Clone)]
pub struct StatsService {
    counters: Arc<dyn CounterStore>,
    users: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
    started_at: DateTime<Utc>,
}

impl StatsService {
    /// Create the service. Uptime is measured from this call.
    pub fn new(
        counters: Arc<dyn CounterStore>,
        users: Arc<dyn UserRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let started_at = clock.utc();
        Self {
            counters,
            users,
            clock,
            started_at,
        }
    }

    /// Override the instant uptime is measured from.
    #[must_use]
    pub fn with_started_at(mut self, started_at: DateTime<Utc>) -> Self {
        self.started_at = started_at;
        self
    }

    fn uptime_at(&self, now: DateTime<Utc>) -> u64 {
        u64::try_from((now - self.started_at).num_seconds()).unwrap_or(0)
    }
}

#[async_trait]
impl StatsQuery for StatsService {
    async fn greet(&self) -> Result<Greeting, Error> {
        let key = CounterKey::visits();
        let (visits, users) = tokio::try_join!(
            async {
                self.counters
                    .increment_and_get(&key)
                    .await
                    .map_err(map_counter_error)
            },
            async { self.users.count().await.map_err(map_user_error) },
        )?;
        Ok(Greeting {
            message: GREETING.to_owned(),
            visits,
            users,
            timestamp: self.clock.utc(),
        })
    }

    async fn stats(&self) -> Result<Stats, Error> {
        let since = start_of_day(&self.clock.local());
        let (total_users, new_users_today) = tokio::try_join!(
            async { self.users.count().await.map_err(map_user_error) },
            async { self.users.count_since(since).await.map_err(map_user_error) },
        )?;
        let now = self.clock.utc();
        Ok(Stats {
            total_users,
            new_users_today,
            uptime: self.uptime_at(now),
            timestamp: now,
        })
    }

    async fn health(&self) -> HealthReport {
        let (cache, database) = tokio::join!(self.counters.ping(), self.users.ping());
        if let Err(error) = &cache {
            warn!(error = %error, "counter store health probe failed");
        }
        if let Err(error) = &database {
            warn!(error = %error, "user store health probe failed");
        }
        let cache = DependencyStatus::from_probe(&cache);
        let database = DependencyStatus::from_probe(&database);
        let status = if cache == DependencyStatus::Connected
            && database == DependencyStatus::Connected
        {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        };
        let now = self.clock.utc();
        HealthReport {
            status,
            database,
            cache,
            timestamp: now,
            uptime: self.uptime_at(now),
        }
    }

    fn uptime(&self) -> u64 {
        self.uptime_at(self.clock.utc())
    }
}
