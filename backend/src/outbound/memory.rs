//! In-process store adapters.
//!
//! Used when no Redis or PostgreSQL URL is configured, and by tests. Both
//! stores can be switched offline to simulate an unreachable backend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::{Clock, DefaultClock};

use crate::domain::ports::{CounterStore, CounterStoreError, UserPersistenceError, UserRepository};
use crate::domain::{CounterKey, NewUser, User, UserId};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Counter store held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryCounterStore {
    counters: Mutex<HashMap<String, u64>>,
    offline: AtomicBool,
}

impl InMemoryCounterStore {
    /// Create an empty, reachable store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the store becoming unreachable (`false`) or recovering.
    pub fn set_available(&self, available: bool) {
        self.offline.store(!available, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), CounterStoreError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(CounterStoreError::unavailable("in-memory counter store is offline"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn increment_and_get(&self, key: &CounterKey) -> Result<u64, CounterStoreError> {
        self.check_available()?;
        let mut counters = lock(&self.counters);
        let value = counters.entry(key.as_ref().to_owned()).or_insert(0);
        *value = value
            .checked_add(1)
            .ok_or_else(|| CounterStoreError::command(format!("counter {key} overflowed")))?;
        Ok(*value)
    }

    async fn ping(&self) -> Result<(), CounterStoreError> {
        self.check_available()
    }
}

/// User repository held in process memory.
///
/// Users are kept ordered by creation time, then id.
pub struct InMemoryUserRepository {
    users: Mutex<Vec<User>>,
    clock: Arc<dyn Clock>,
    offline: AtomicBool,
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new(Arc::new(DefaultClock))
    }
}

impl InMemoryUserRepository {
    /// Create an empty repository stamping users with `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            users: Mutex::new(Vec::new()),
            clock,
            offline: AtomicBool::new(false),
        }
    }

    /// Simulate the store becoming unreachable (`false`) or recovering.
    pub fn set_available(&self, available: bool) {
        self.offline.store(!available, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), UserPersistenceError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(UserPersistenceError::connection(
                "in-memory user store is offline",
            ))
        } else {
            Ok(())
        }
    }
}

fn to_count(count: usize) -> u64 {
    u64::try_from(count).unwrap_or(u64::MAX)
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn count(&self) -> Result<u64, UserPersistenceError> {
        self.check_available()?;
        Ok(to_count(lock(&self.users).len()))
    }

    async fn count_since(&self, since: DateTime<Utc>) -> Result<u64, UserPersistenceError> {
        self.check_available()?;
        let users = lock(&self.users);
        Ok(to_count(
            users.iter().filter(|user| user.created_at() >= since).count(),
        ))
    }

    async fn list(&self) -> Result<Vec<User>, UserPersistenceError> {
        self.check_available()?;
        Ok(lock(&self.users).clone())
    }

    async fn insert(&self, user: &NewUser) -> Result<User, UserPersistenceError> {
        self.check_available()?;
        let email = user.email().normalized();
        let mut users = lock(&self.users);
        if users
            .iter()
            .any(|existing| existing.email().normalized() == email)
        {
            return Err(UserPersistenceError::duplicate_email(user.email().as_ref()));
        }
        let created = User::from_draft(UserId::random(), user.clone(), self.clock.utc());
        users.push(created.clone());
        users.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.id().cmp(b.id()))
        });
        Ok(created)
    }

    async fn ping(&self) -> Result<(), UserPersistenceError> {
        self.check_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mockable::MockClock;
    use rstest::{fixture, rstest};

    #[fixture]
    fn repository() -> InMemoryUserRepository {
        let now = Utc
            .with_ymd_and_hms(2025, 6, 1, 12, 0, 0)
            .single()
            .expect("valid time");
        let mut clock = MockClock::new();
        clock.expect_utc().return_const(now);
        InMemoryUserRepository::new(Arc::new(clock))
    }

    fn draft(name: &str, email: &str) -> NewUser {
        NewUser::try_from_strings(name, email).expect("valid draft")
    }

    #[rstest]
    #[tokio::test]
    async fn first_increment_returns_one() {
        let store = InMemoryCounterStore::new();
        let key = CounterKey::visits();

        assert_eq!(store.increment_and_get(&key).await, Ok(1));
        assert_eq!(store.increment_and_get(&key).await, Ok(2));
    }

    #[rstest]
    #[tokio::test]
    async fn offline_counter_store_fails() {
        let store = InMemoryCounterStore::new();
        store.set_available(false);

        assert!(matches!(
            store.ping().await,
            Err(CounterStoreError::Unavailable { .. })
        ));
        store.set_available(true);
        assert_eq!(store.ping().await, Ok(()));
    }

    #[rstest]
    #[tokio::test]
    async fn duplicate_emails_are_rejected_ignoring_case(repository: InMemoryUserRepository) {
        repository
            .insert(&draft("Ann", "ann@x.com"))
            .await
            .expect("first insert");

        let err = repository
            .insert(&draft("Other Ann", "ANN@X.COM"))
            .await
            .expect_err("duplicate");

        assert_eq!(err, UserPersistenceError::duplicate_email("ANN@X.COM"));
        assert_eq!(repository.count().await, Ok(1));
    }

    #[rstest]
    #[tokio::test]
    async fn list_is_ordered_by_creation_then_id(repository: InMemoryUserRepository) {
        for n in 0..5 {
            repository
                .insert(&draft("User", &format!("user{n}@x.com")))
                .await
                .expect("insert");
        }

        let users = repository.list().await.expect("list");
        let mut ids: Vec<UserId> = users.iter().map(|user| *user.id()).collect();
        let listed = ids.clone();
        ids.sort();
        assert_eq!(listed, ids);
    }

    #[rstest]
    #[tokio::test]
    async fn count_since_filters_by_creation_time(repository: InMemoryUserRepository) {
        repository
            .insert(&draft("Ann", "ann@x.com"))
            .await
            .expect("insert");
        let created = repository.list().await.expect("list")[0].created_at();

        assert_eq!(repository.count_since(created).await, Ok(1));
        assert_eq!(
            repository
                .count_since(created + chrono::TimeDelta::seconds(1))
                .await,
            Ok(0)
        );
    }
}
