//! Integration tests for `DieselUserRepository` against embedded PostgreSQL.
//!
//! Set `SKIP_TEST_CLUSTER=1` to skip them where the cluster cannot start.

use chrono::{DateTime, Duration, TimeZone, Utc};
use pg_embedded_setup_unpriv::TestCluster;
use postgres::{Client, NoTls};
use rstest::{fixture, rstest};
use tokio::runtime::Runtime;
use uuid::Uuid;

use stats_api::domain::NewUser;
use stats_api::domain::ports::{UserPersistenceError, UserRepository};
use stats_api::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig};

mod support;

use support::pg_embed::test_cluster;
use support::{format_postgres_error, handle_cluster_setup_failure, migrate_schema, reset_database};

struct TestContext {
    runtime: Runtime,
    _cluster: TestCluster,
    repository: DieselUserRepository,
    database_url: String,
}

impl TestContext {
    /// Insert a row directly, bypassing the repository's `created_at` default.
    fn seed(&self, id: Uuid, email: &str, created_at: DateTime<Utc>) -> Result<(), String> {
        let mut client =
            Client::connect(&self.database_url, NoTls).map_err(|err| format_postgres_error(&err))?;
        client
            .execute(
                "INSERT INTO users (id, name, email, created_at) VALUES ($1, $2, $3, $4)",
                &[&id, &"Seeded", &email, &created_at],
            )
            .map_err(|err| format_postgres_error(&err))?;
        Ok(())
    }
}

fn setup_context() -> Result<TestContext, String> {
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let cluster = test_cluster()?;
    let name = format!("users_repo_{}", Uuid::new_v4().simple());
    let database_url = reset_database(&cluster, &name)?;
    migrate_schema(&database_url)?;

    let config = PoolConfig::new(&database_url)
        .with_max_size(2)
        .with_connection_timeout(std::time::Duration::from_secs(10));
    let pool = DbPool::new(config);
    Ok(TestContext {
        runtime,
        _cluster: cluster,
        repository: DieselUserRepository::new(pool),
        database_url,
    })
}

#[fixture]
fn repo_context() -> Option<TestContext> {
    match setup_context() {
        Ok(ctx) => Some(ctx),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

fn at(seconds: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0)
        .single()
        .expect("valid time")
        + Duration::seconds(seconds)
}

fn draft(name: &str, email: &str) -> NewUser {
    NewUser::try_from_strings(name, email).expect("valid draft")
}

#[rstest]
fn insert_assigns_id_and_creation_time(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: insert_assigns_id_and_creation_time skipped");
        return;
    };
    let repository = &context.repository;
    let before = Utc::now() - Duration::seconds(5);

    let created = context
        .runtime
        .block_on(repository.insert(&draft("Ann", "ann@x.com")))
        .expect("insert user");

    assert_eq!(created.name().as_ref(), "Ann");
    assert_eq!(created.email().as_ref(), "ann@x.com");
    assert!(created.created_at() >= before);
    assert!(created.created_at() <= Utc::now() + Duration::seconds(5));
    let listed = context
        .runtime
        .block_on(repository.list())
        .expect("list users");
    assert_eq!(listed, vec![created]);
    assert_eq!(context.runtime.block_on(repository.count()), Ok(1));
}

#[rstest]
fn duplicate_email_ignores_case(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: duplicate_email_ignores_case skipped");
        return;
    };
    let repository = &context.repository;
    context
        .runtime
        .block_on(repository.insert(&draft("Ann", "ann@x.com")))
        .expect("first insert");

    let result = context
        .runtime
        .block_on(repository.insert(&draft("Ann Again", "ANN@x.com")));

    assert_eq!(
        result,
        Err(UserPersistenceError::duplicate_email("ANN@x.com"))
    );
    assert_eq!(context.runtime.block_on(repository.count()), Ok(1));
}

#[rstest]
fn list_orders_by_creation_time_then_id(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: list_orders_by_creation_time_then_id skipped");
        return;
    };
    let low = Uuid::from_u128(1);
    let high = Uuid::from_u128(2);
    let earliest = Uuid::from_u128(3);
    context.seed(high, "high@x.com", at(10)).expect("seed high");
    context.seed(low, "low@x.com", at(10)).expect("seed low");
    context
        .seed(earliest, "earliest@x.com", at(0))
        .expect("seed earliest");

    let listed = context
        .runtime
        .block_on(context.repository.list())
        .expect("list users");

    let ids: Vec<Uuid> = listed.iter().map(|user| *user.id().as_uuid()).collect();
    assert_eq!(ids, vec![earliest, low, high]);
    assert_eq!(listed[0].created_at(), at(0));
}

#[rstest]
fn count_since_includes_the_boundary(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: count_since_includes_the_boundary skipped");
        return;
    };
    for (n, offset) in [-1_i64, 0, 1].into_iter().enumerate() {
        context
            .seed(Uuid::new_v4(), &format!("user{n}@x.com"), at(offset))
            .expect("seed user");
    }
    let repository = &context.repository;

    assert_eq!(context.runtime.block_on(repository.count()), Ok(3));
    assert_eq!(context.runtime.block_on(repository.count_since(at(0))), Ok(2));
    assert_eq!(context.runtime.block_on(repository.count_since(at(2))), Ok(0));
    assert_eq!(context.runtime.block_on(repository.count_since(at(-60))), Ok(3));
}

#[rstest]
fn ping_reaches_the_database(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: ping_reaches_the_database skipped");
        return;
    };

    assert_eq!(context.runtime.block_on(context.repository.ping()), Ok(()));
}
