//! Bridge between async handlers and the blocking document store.
//!
//! One store handle is opened at startup and shared by every request. Work
//! runs on the blocking pool while holding the connection mutex and is cut
//! off after the configured timeout.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use sitor_shared::constants::STORE_TIMEOUT_SECS;
use sitor_store::DocumentStore;

use crate::error::ServerError;

#[derive(Clone)]
pub struct Store {
    inner: Arc<Mutex<dyn DocumentStore + Send>>,
    timeout: Duration,
}

impl Store {
    pub fn new<S: DocumentStore + Send + 'static>(store: S) -> Self {
        Self::with_timeout(store, Duration::from_secs(STORE_TIMEOUT_SECS))
    }

    pub fn with_timeout<S: DocumentStore + Send + 'static>(store: S, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
            timeout,
        }
    }

    /// Run `f` against the store on the blocking pool.
    ///
    /// The caller sees [`ServerError::Timeout`] once the deadline passes; the
    /// blocking task itself is not cancelled and finishes in the background.
    pub async fn run<T, F>(&self, f: F) -> Result<T, ServerError>
    where
        F: FnOnce(&dyn DocumentStore) -> Result<T, ServerError> + Send + 'static,
        T: Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let task = tokio::task::spawn_blocking(move || {
            // A panic in an earlier closure poisons the lock. Each store write
            // commits or rolls back on its own, so the handle is still usable.
            let guard = inner.lock().unwrap_or_else(PoisonError::into_inner);
            f(&*guard)
        });

        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join)) => Err(ServerError::Internal(format!("store task failed: {join}"))),
            Err(_) => Err(ServerError::Timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitor_shared::ObjectId;
    use sitor_store::{Database, Document, Filter, Result as StoreResult, Update, UpdateOutcome};

    /// Store whose reads block longer than any test timeout.
    struct SlowStore;

    impl DocumentStore for SlowStore {
        fn find(&self, _: &str, _: &Filter) -> StoreResult<Vec<Document>> {
            std::thread::sleep(Duration::from_millis(300));
            Ok(Vec::new())
        }
        fn find_one(&self, _: &str, _: &Filter) -> StoreResult<Option<Document>> {
            Ok(None)
        }
        fn insert_one(&self, _: &str, _: Document) -> StoreResult<ObjectId> {
            Ok(ObjectId::new())
        }
        fn update_one(&self, _: &str, _: &Filter, _: &Update, _: bool) -> StoreResult<UpdateOutcome> {
            Ok(UpdateOutcome::default())
        }
        fn update_many(&self, _: &str, _: &Filter, _: &Update) -> StoreResult<u64> {
            Ok(0)
        }
        fn delete_one(&self, _: &str, _: &Filter) -> StoreResult<u64> {
            Ok(0)
        }
        fn delete_many(&self, _: &str, _: &Filter) -> StoreResult<u64> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn test_run_returns_closure_result() {
        let store = Store::new(Database::open_in_memory().unwrap());
        let count = store
            .run(|db| Ok(db.count("users", &Filter::all())?))
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_slow_store_times_out() {
        let store = Store::with_timeout(SlowStore, Duration::from_millis(20));
        let err = store
            .run(|db| Ok(db.find("users", &Filter::all())?))
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::Timeout));
    }

    #[tokio::test]
    async fn test_panic_only_fails_its_own_request() {
        let store = Store::new(Database::open_in_memory().unwrap());

        let err = store
            .run(|_| -> Result<(), ServerError> { panic!("boom") })
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::Internal(_)));

        let count = store
            .run(|db| Ok(db.count("users", &Filter::all())?))
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
