//! Snapshot store: repository registration, snapshot creation, completion
//! polling and restore.

use std::sync::Arc;
use std::time::{Duration, Instant};

use backoff::{backoff::Backoff, ExponentialBackoff};
use tracing::{debug, info, warn};

use wikis_types::{SnapshotCompletion, SnapshotState};

use crate::error::StoreError;
use crate::store::IndexStore;

/// How long and how often to poll for snapshot completion.
#[derive(Debug, Clone)]
pub struct WaitPolicy {
    /// Delay before the second poll
    pub initial_interval: Duration,
    /// Cap on the delay between polls
    pub max_interval: Duration,
    /// Growth factor applied to the delay after each poll
    pub multiplier: f64,
    /// Give up once this much time has passed
    pub deadline: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(10),
            multiplier: 1.5,
            deadline: Duration::from_secs(3600),
        }
    }
}

impl WaitPolicy {
    /// Poll at a constant interval until `deadline`.
    pub fn fixed(interval: Duration, deadline: Duration) -> Self {
        Self {
            initial_interval: interval,
            max_interval: interval,
            multiplier: 1.0,
            deadline,
        }
    }

    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            current_interval: self.initial_interval,
            initial_interval: self.initial_interval,
            max_interval: self.max_interval,
            multiplier: self.multiplier,
            randomization_factor: 0.0,
            max_elapsed_time: Some(self.deadline),
            ..Default::default()
        }
    }
}

/// Snapshot operations over an [`IndexStore`].
#[derive(Clone)]
pub struct SnapshotStore {
    store: Arc<dyn IndexStore>,
}

impl SnapshotStore {
    pub fn new(store: Arc<dyn IndexStore>) -> Self {
        Self { store }
    }

    /// Declare a filesystem-backed repository at `location`.
    ///
    /// Registering the same repository twice with the same settings is
    /// accepted by the store, so this is safe to call on every start.
    pub async fn register_repository(&self, name: &str, location: &str) -> Result<(), StoreError> {
        info!(repository = name, location, "Registering snapshot repository");
        self.store.register_repository(name, location).await
    }

    /// Start a snapshot. Use [`await_completion`](Self::await_completion)
    /// to wait for it.
    pub async fn create_snapshot(&self, repository: &str, name: &str) -> Result<(), StoreError> {
        info!(repository, snapshot = name, "Creating snapshot");
        self.store.create_snapshot(repository, name).await
    }

    /// Poll until the snapshot reports success.
    ///
    /// An empty status list means the snapshot has not started yet and
    /// polling continues. Failed snapshots end the wait early; otherwise the
    /// wait ends with [`StoreError::SnapshotTimeout`] at the policy deadline.
    pub async fn await_completion(
        &self,
        repository: &str,
        name: &str,
        policy: &WaitPolicy,
    ) -> Result<(), StoreError> {
        let started = Instant::now();
        let mut backoff = policy.backoff();
        let mut polls = 0u32;

        loop {
            polls += 1;
            match self.store.snapshot_status(repository, name).await? {
                Some(SnapshotCompletion::Success) => {
                    info!(snapshot = name, polls, "Snapshot complete");
                    return Ok(());
                }
                Some(SnapshotCompletion::Failed) => {
                    warn!(snapshot = name, polls, "Snapshot failed");
                    return Err(StoreError::SnapshotFailed {
                        snapshot: name.to_string(),
                        state: SnapshotCompletion::Failed.to_string(),
                    });
                }
                Some(SnapshotCompletion::Pending) => {
                    info!(snapshot = name, "Waiting for snapshot to complete");
                }
                None => {
                    info!(snapshot = name, "Waiting for snapshot to start");
                }
            }

            match backoff.next_backoff() {
                Some(delay) => {
                    debug!(delay_ms = delay.as_millis() as u64, "Next snapshot poll");
                    tokio::time::sleep(delay).await;
                }
                None => {
                    return Err(StoreError::SnapshotTimeout {
                        snapshot: name.to_string(),
                        elapsed_secs: started.elapsed().as_secs(),
                    });
                }
            }
        }
    }

    /// Current state of a snapshot, from a single status poll.
    ///
    /// An empty status list and a 404 both mean the store holds no such
    /// snapshot.
    pub async fn state(&self, repository: &str, name: &str) -> Result<SnapshotState, StoreError> {
        match self.store.snapshot_status(repository, name).await {
            Ok(Some(completion)) => Ok(SnapshotState::reported(completion)),
            Ok(None) => Ok(SnapshotState::missing()),
            Err(StoreError::Api { status: 404, .. }) => Ok(SnapshotState::missing()),
            Err(e) => Err(e),
        }
    }

    /// Trigger a restore.
    ///
    /// A restore onto an already-open index returns
    /// [`StoreError::RestoreConflict`]; the caller decides whether that is
    /// acceptable.
    pub async fn restore(&self, repository: &str, name: &str) -> Result<(), StoreError> {
        info!(repository, snapshot = name, "Restoring snapshot");
        self.store.restore(repository, name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{OPEN_INDEX_CONFLICT_REASON, RESTORE_EXCEPTION_TYPE};
    use crate::mock::{MockIndexStore, StoreCall};

    fn fast_policy() -> WaitPolicy {
        WaitPolicy::fixed(Duration::from_millis(5), Duration::from_secs(5))
    }

    fn status_polls(store: &MockIndexStore) -> usize {
        store.count(|c| matches!(c, StoreCall::SnapshotStatus { .. }))
    }

    #[tokio::test]
    async fn test_await_stops_on_first_success() {
        let store = Arc::new(MockIndexStore::new().with_status_sequence(vec![
            None,
            None,
            Some(SnapshotCompletion::Pending),
            Some(SnapshotCompletion::Success),
            Some(SnapshotCompletion::Pending),
        ]));
        let snapshots = SnapshotStore::new(store.clone());

        snapshots
            .await_completion("repo", "wikis", &fast_policy())
            .await
            .unwrap();

        assert_eq!(status_polls(&store), 4);
    }

    #[tokio::test]
    async fn test_await_immediate_success() {
        let store = Arc::new(MockIndexStore::new());
        let snapshots = SnapshotStore::new(store.clone());

        snapshots
            .await_completion("repo", "wikis", &fast_policy())
            .await
            .unwrap();

        assert_eq!(status_polls(&store), 1);
    }

    #[tokio::test]
    async fn test_await_times_out() {
        let store = Arc::new(
            MockIndexStore::new().with_status_sequence(vec![Some(SnapshotCompletion::Pending)]),
        );
        let snapshots = SnapshotStore::new(store.clone());
        let policy = WaitPolicy::fixed(Duration::from_millis(5), Duration::from_millis(60));

        let err = snapshots
            .await_completion("repo", "wikis", &policy)
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::SnapshotTimeout { .. }));
        assert!(status_polls(&store) > 1);
    }

    #[tokio::test]
    async fn test_await_failed_snapshot() {
        let store = Arc::new(MockIndexStore::new().with_status_sequence(vec![
            Some(SnapshotCompletion::Pending),
            Some(SnapshotCompletion::Failed),
        ]));
        let snapshots = SnapshotStore::new(store.clone());

        let err = snapshots
            .await_completion("repo", "wikis", &fast_policy())
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::SnapshotFailed { .. }));
        assert_eq!(status_polls(&store), 2);
    }

    #[tokio::test]
    async fn test_restore_conflict_surfaces_typed() {
        let reason = format!("cannot restore index [wikis] because {}", OPEN_INDEX_CONFLICT_REASON);
        let store = Arc::new(MockIndexStore::new().with_restore_error(
            500,
            RESTORE_EXCEPTION_TYPE,
            &reason,
        ));
        let snapshots = SnapshotStore::new(store);

        let err = snapshots.restore("repo", "wikis").await.unwrap_err();
        assert!(err.is_restore_conflict());
    }

    #[tokio::test]
    async fn test_state() {
        let store = Arc::new(
            MockIndexStore::new().with_status_sequence(vec![Some(SnapshotCompletion::Success)]),
        );
        let snapshots = SnapshotStore::new(store);

        let state = snapshots.state("repo", "wikis").await.unwrap();
        assert!(state.is_complete());
    }

    #[tokio::test]
    async fn test_state_empty_status_list_is_missing() {
        let store = Arc::new(MockIndexStore::new().with_status_sequence(vec![None]));
        let snapshots = SnapshotStore::new(store);

        let state = snapshots.state("repo", "wikis").await.unwrap();
        assert!(!state.exists);
        assert!(!state.is_complete());
    }

    #[tokio::test]
    async fn test_state_pending() {
        let store = Arc::new(
            MockIndexStore::new().with_status_sequence(vec![Some(SnapshotCompletion::Pending)]),
        );
        let snapshots = SnapshotStore::new(store);

        let state = snapshots.state("repo", "wikis").await.unwrap();
        assert!(state.exists);
        assert_eq!(state.completion, SnapshotCompletion::Pending);
    }

    #[test]
    fn test_default_policy_starts_at_one_second() {
        let policy = WaitPolicy::default();
        assert_eq!(policy.initial_interval, Duration::from_secs(1));
        assert!(policy.max_interval >= policy.initial_interval);
    }
}
