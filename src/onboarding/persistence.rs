//! Save/load protocol between the session and the storage gateway.

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::error::PersistenceError;
use crate::store::KeyValueStore;

use super::format::format_profile;
use super::model::{PersistedProfile, storage_keys};
use super::state::OnboardingSession;

/// Runs save and load against a [`KeyValueStore`], tracking the outcome in
/// the session's `is_loading` / `error` / `is_completed` flags.
pub struct PersistenceOrchestrator {
    store: Arc<dyn KeyValueStore>,
    session: Arc<RwLock<OnboardingSession>>,
    /// One save at a time; a second request waits for the first to finish.
    save_lock: Mutex<()>,
}

impl PersistenceOrchestrator {
    pub fn new(store: Arc<dyn KeyValueStore>, session: Arc<RwLock<OnboardingSession>>) -> Self {
        Self {
            store,
            session,
            save_lock: Mutex::new(()),
        }
    }

    /// Format the current session and write it under `ONBOARDING_DATA`.
    ///
    /// A session with unanswered lifestyle questions is rejected up front
    /// with `Rejected(IncompleteAnswers)`: nothing is written and the
    /// session is left as it was. Otherwise `is_loading` is set for the
    /// duration of the attempt. Success sets `is_completed`; failure records
    /// the message in `error` and leaves `is_completed` alone. There is no
    /// retry.
    pub async fn save(&self) -> Result<PersistedProfile, PersistenceError> {
        let _guard = self.save_lock.lock().await;

        let snapshot = {
            let mut session = self.session.write().await;
            session.validate_lifestyle()?;
            *session = session.with_loading(true).with_error(None);
            session.clone()
        };

        let result = self.write_profile(&snapshot).await;

        {
            let mut session = self.session.write().await;
            let next = match &result {
                Ok(_) => session.with_completed(true),
                Err(e) => {
                    warn!(error = %e, "Error saving onboarding data");
                    session.with_error(Some(e.to_string()))
                }
            };
            *session = next.with_loading(false);
        }

        result
    }

    async fn write_profile(
        &self,
        snapshot: &OnboardingSession,
    ) -> Result<PersistedProfile, PersistenceError> {
        let profile = format_profile(snapshot)?;
        let json = serde_json::to_string(&profile)
            .map_err(|e| PersistenceError::Serialization(e.to_string()))?;

        self.store
            .set(storage_keys::ONBOARDING_DATA, &json)
            .await
            .map_err(|e| PersistenceError::WriteFailure(e.into_message()))?;

        info!(
            concerns = profile.health_concerns.len(),
            diets = profile.diets.len(),
            allergies = profile.allergies.len(),
            "Onboarding data saved"
        );
        debug!(record = %json, "Saved onboarding record");
        Ok(profile)
    }

    /// Read back the stored record.
    ///
    /// Absence (first run) and failures both yield `None`; failures are
    /// logged. The session is never touched.
    pub async fn load(&self) -> Option<PersistedProfile> {
        match self.try_load().await {
            Ok(Some(profile)) => {
                info!(timestamp = %profile.timestamp, "Loaded onboarding data");
                Some(profile)
            }
            Ok(None) => {
                debug!("No stored onboarding data");
                None
            }
            Err(e) => {
                warn!(error = %e, "Error loading onboarding data");
                None
            }
        }
    }

    /// Like [`load`](Self::load) but surfaces read and parse failures.
    pub async fn try_load(&self) -> Result<Option<PersistedProfile>, PersistenceError> {
        let raw = self
            .store
            .get(storage_keys::ONBOARDING_DATA)
            .await
            .map_err(|e| PersistenceError::ReadFailure(e.into_message()))?;

        raw.map(|json| {
            serde_json::from_str(&json)
                .map_err(|e| PersistenceError::ReadFailure(format!("malformed record: {e}")))
        })
        .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::onboarding::model::{AlcoholIntake, Item};
    use crate::error::OnboardingError;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct RejectingStore;

    #[async_trait]
    impl KeyValueStore for RejectingStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Query("Load failed".to_string()))
        }

        async fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::WriteRejected("Save failed".to_string()))
        }
    }

    /// Holds each write open for a while and tracks how many overlap.
    #[derive(Default)]
    struct SlowStore {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        writes: AtomicUsize,
    }

    #[async_trait]
    impl KeyValueStore for SlowStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        async fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn answered_session() -> OnboardingSession {
        OnboardingSession::default()
            .toggle_health_concern(Item::new(1, "Sleep"))
            .unwrap()
            .set_daily_exposure(true)
            .set_smoke(false)
            .set_alcohol(AlcoholIntake::Low)
    }

    fn orchestrator(
        store: Arc<dyn KeyValueStore>,
    ) -> (PersistenceOrchestrator, Arc<RwLock<OnboardingSession>>) {
        let session = Arc::new(RwLock::new(answered_session()));
        (
            PersistenceOrchestrator::new(store, Arc::clone(&session)),
            session,
        )
    }

    #[tokio::test]
    async fn save_writes_record_and_completes() {
        let store = Arc::new(MemoryStore::new());
        let (orch, session) = orchestrator(store.clone());

        let profile = orch.save().await.unwrap();
        assert_eq!(profile.health_concerns[0].priority, 1);

        let s = session.read().await;
        assert!(s.is_completed());
        assert!(!s.is_loading());
        assert_eq!(s.error(), None);

        let raw = store.get(storage_keys::ONBOARDING_DATA).await.unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["alcohol"], "0-1");
        assert_eq!(json["health_concerns"][0]["name"], "Sleep");
    }

    #[tokio::test]
    async fn failed_save_sets_error_only() {
        let (orch, session) = orchestrator(Arc::new(RejectingStore));

        let err = orch.save().await.unwrap_err();
        assert!(matches!(err, PersistenceError::WriteFailure(_)));

        let s = session.read().await;
        assert!(!s.is_loading());
        assert!(!s.is_completed());
        assert_eq!(s.error(), Some("Save failed"));
    }

    #[tokio::test]
    async fn save_rejects_unanswered_lifestyle() {
        let store = Arc::new(MemoryStore::new());
        let session = Arc::new(RwLock::new(
            OnboardingSession::default()
                .toggle_health_concern(Item::new(1, "Sleep"))
                .unwrap()
                .set_smoke(false),
        ));
        let orch = PersistenceOrchestrator::new(store.clone(), Arc::clone(&session));
        let before = session.read().await.clone();

        let err = orch.save().await.unwrap_err();
        assert!(matches!(
            err,
            PersistenceError::Rejected(OnboardingError::IncompleteAnswers { .. })
        ));
        assert_eq!(*session.read().await, before);
        assert!(!session.read().await.is_completed());
        assert!(store.get(storage_keys::ONBOARDING_DATA).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn concurrent_saves_do_not_interleave() {
        let store = Arc::new(SlowStore::default());
        let (orch, session) = orchestrator(store.clone());

        let (first, second) = tokio::join!(orch.save(), orch.save());
        assert!(first.is_ok());
        assert!(second.is_ok());

        assert_eq!(store.writes.load(Ordering::SeqCst), 2);
        assert_eq!(store.max_in_flight.load(Ordering::SeqCst), 1);
        let s = session.read().await;
        assert!(!s.is_loading());
        assert!(s.is_completed());
        assert_eq!(s.error(), None);
    }

    #[tokio::test]
    async fn load_absent_is_none() {
        let (orch, _) = orchestrator(Arc::new(MemoryStore::new()));
        assert!(orch.load().await.is_none());
        assert!(orch.try_load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn load_round_trips_saved_record() {
        let (orch, _) = orchestrator(Arc::new(MemoryStore::new()));
        let saved = orch.save().await.unwrap();
        assert_eq!(orch.load().await, Some(saved));
    }

    #[tokio::test]
    async fn load_failures_are_swallowed_and_do_not_touch_session() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(storage_keys::ONBOARDING_DATA, r#"{"alcohol":"0-1","timestamp":"2024-01-01"}"#)
            .await
            .unwrap();
        let (orch, session) = orchestrator(store);
        let before = session.read().await.clone();

        assert!(orch.load().await.is_none());
        assert!(matches!(
            orch.try_load().await,
            Err(PersistenceError::ReadFailure(_))
        ));
        assert_eq!(*session.read().await, before);

        let (failing, _) = orchestrator(Arc::new(RejectingStore));
        assert!(failing.load().await.is_none());
    }
}
