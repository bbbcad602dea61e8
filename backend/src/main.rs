//! Service entry-point: loads settings, builds the store adapters, serves
//! HTTP and drains gracefully on SIGINT or SIGTERM.

mod server;

use std::io;
use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use stats_api::domain::ports::{CounterStore, StatsQuery, UserDirectory, UserRepository};
use stats_api::domain::{LoadJobs, StatsService, UserDirectoryService};
use stats_api::inbound::http::health::HealthState;
use stats_api::inbound::http::state::{AppInfo, HttpState};
use stats_api::outbound::cache::RedisCounterStore;
use stats_api::outbound::memory::{InMemoryCounterStore, InMemoryUserRepository};
use stats_api::outbound::persistence::{
    DbPool, DieselUserRepository, PoolConfig, run_pending_migrations,
};
use stats_api::settings::{AppSettings, redact_url};

use server::{ServerConfig, create_server};

fn init_tracing() {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }
}

fn build_counter_store(settings: &AppSettings) -> io::Result<Arc<dyn CounterStore>> {
    match settings.redis_url.as_deref() {
        Some(url) => {
            info!(redis_url = %redact_url(url), "using redis counter store");
            let store =
                RedisCounterStore::new(url, settings.store_timeout()).map_err(io::Error::other)?;
            Ok(Arc::new(store))
        }
        None => {
            warn!("no redis url configured; visits are counted in memory");
            Ok(Arc::new(InMemoryCounterStore::new()))
        }
    }
}

async fn build_user_repository(
    settings: &AppSettings,
    clock: Arc<dyn Clock>,
) -> io::Result<Arc<dyn UserRepository>> {
    let Some(url) = settings.database_url.as_deref() else {
        warn!("no database url configured; users are kept in memory");
        return Ok(Arc::new(InMemoryUserRepository::new(clock)));
    };
    info!(database_url = %redact_url(url), "using postgres user repository");
    if settings.run_migrations {
        run_pending_migrations(url)
            .await
            .map_err(io::Error::other)?;
    }
    let pool = DbPool::new(PoolConfig::new(url).with_connection_timeout(settings.store_timeout()));
    Ok(Arc::new(DieselUserRepository::new(pool)))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            warn!(%error, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                warn!(%error, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received SIGINT"),
        () = terminate => info!("received SIGTERM"),
    }
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> io::Result<()> {
    init_tracing();

    let settings = AppSettings::load().map_err(|err| io::Error::other(err.to_string()))?;
    let environment = settings.environment().map_err(io::Error::other)?;
    let limits = settings.load_limits().map_err(io::Error::other)?;

    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let counters = build_counter_store(&settings)?;
    let users = build_user_repository(&settings, clock.clone()).await?;

    let stats: Arc<dyn StatsQuery> = Arc::new(StatsService::new(
        counters,
        users.clone(),
        clock.clone(),
    ));
    let directory: Arc<dyn UserDirectory> = Arc::new(UserDirectoryService::new(users));
    let load_jobs = Arc::new(LoadJobs::new(limits, clock));
    let http_state = web::Data::new(HttpState::new(
        stats,
        directory,
        load_jobs.clone(),
        AppInfo::current(environment),
    ));
    let health_state = web::Data::new(HealthState::new());

    let config = ServerConfig::new(settings.host(), settings.port(), environment)
        .with_shutdown_timeout(settings.shutdown_timeout());
    #[cfg(feature = "metrics")]
    let config = config.with_metrics(server::build_metrics());

    let server = create_server(health_state.clone(), http_state, config)?;
    let handle = server.handle();

    let drain = health_state.clone();
    actix_web::rt::spawn(async move {
        shutdown_signal().await;
        drain.mark_unhealthy();
        info!("draining in-flight requests");
        handle.stop(true).await;
    });

    server.await?;

    let cancelled = load_jobs.cancel_all();
    info!(cancelled_load_jobs = cancelled, "shutdown complete");
    Ok(())
}
