//! OnboardingManager — owns the session, applies intents, and hands save
//! and load requests to the persistence orchestrator.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::error::{OnboardingError, PersistenceError};
use crate::store::KeyValueStore;

use super::drafts::{AllergiesDraft, DietChoice, DietsDraft, HealthConcernsDraft, LifestyleDraft};
use super::model::{Item, PersistedProfile};
use super::persistence::PersistenceOrchestrator;
use super::state::OnboardingSession;

/// Default broadcast channel capacity.
const DEFAULT_BROADCAST_CAPACITY: usize = 64;

/// A user action or lifecycle request from the UI layer.
#[derive(Debug, Clone)]
pub enum OnboardingIntent {
    /// "Get Started" on the welcome screen.
    GetStarted,
    Back,
    ToggleHealthConcern(Item),
    ReorderConcerns(Vec<Item>),
    ToggleDiet(DietChoice),
    CommitHealthConcerns(HealthConcernsDraft),
    CommitDiets(DietsDraft),
    CommitAllergies(AllergiesDraft),
    /// Validate and record lifestyle answers, then save.
    SubmitLifestyle(LifestyleDraft),
    Save,
    Load,
    Reset,
}

impl OnboardingIntent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::GetStarted => "get_started",
            Self::Back => "back",
            Self::ToggleHealthConcern(_) => "toggle_health_concern",
            Self::ReorderConcerns(_) => "reorder_concerns",
            Self::ToggleDiet(_) => "toggle_diet",
            Self::CommitHealthConcerns(_) => "commit_health_concerns",
            Self::CommitDiets(_) => "commit_diets",
            Self::CommitAllergies(_) => "commit_allergies",
            Self::SubmitLifestyle(_) => "submit_lifestyle",
            Self::Save => "save",
            Self::Load => "load",
            Self::Reset => "reset",
        }
    }
}

/// Notifications for the UI layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OnboardingEvent {
    AdvanceRequested { step: usize },
    RetreatRequested { step: usize },
    SaveRequested,
    LoadRequested,
    Saved { profile: PersistedProfile },
    SaveFailed { error: String },
    Loaded { profile: Option<PersistedProfile> },
    Reset,
}

/// Coordinates the wizard: one session, intent dispatch, event fan-out.
pub struct OnboardingManager {
    session: Arc<RwLock<OnboardingSession>>,
    persistence: PersistenceOrchestrator,
    catalog: Arc<Catalog>,
    tx: broadcast::Sender<OnboardingEvent>,
}

impl OnboardingManager {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        catalog: Arc<Catalog>,
        session: OnboardingSession,
    ) -> Self {
        let session = Arc::new(RwLock::new(session));
        let (tx, _rx) = broadcast::channel(DEFAULT_BROADCAST_CAPACITY);
        Self {
            persistence: PersistenceOrchestrator::new(store, Arc::clone(&session)),
            session,
            catalog,
            tx,
        }
    }

    /// Subscribe to onboarding events.
    pub fn subscribe(&self) -> broadcast::Receiver<OnboardingEvent> {
        self.tx.subscribe()
    }

    /// A copy of the current session.
    pub async fn snapshot(&self) -> OnboardingSession {
        self.session.read().await.clone()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Apply an intent.
    ///
    /// Selection and validation failures are returned and leave the session
    /// unchanged. Persistence outcomes are reported through the session
    /// flags and events, never as an `Err`.
    pub async fn dispatch(&self, intent: OnboardingIntent) -> Result<(), OnboardingError> {
        debug!(intent = intent.name(), "Dispatching onboarding intent");

        match intent {
            OnboardingIntent::GetStarted => {
                let next = self.apply(|s| Ok(s.get_started())).await?;
                self.advanced(&next);
            }
            OnboardingIntent::Back => {
                let next = self.apply(|s| Ok(s.prev_step())).await?;
                self.emit(OnboardingEvent::RetreatRequested {
                    step: next.current_step(),
                });
            }
            OnboardingIntent::ToggleHealthConcern(concern) => {
                self.apply(|s| s.toggle_health_concern(concern)).await?;
            }
            OnboardingIntent::ReorderConcerns(order) => {
                self.apply(|s| s.reorder_concerns(order)).await?;
            }
            OnboardingIntent::ToggleDiet(choice) => {
                self.apply(|s| s.toggle_diet(choice)).await?;
            }
            OnboardingIntent::CommitHealthConcerns(draft) => {
                let next = self.apply(|s| s.commit_health_concerns(draft)).await?;
                self.advanced(&next);
            }
            OnboardingIntent::CommitDiets(draft) => {
                let next = self.apply(|s| Ok(s.commit_diets(draft))).await?;
                self.advanced(&next);
            }
            OnboardingIntent::CommitAllergies(draft) => {
                let next = self.apply(|s| Ok(s.commit_allergies(draft))).await?;
                self.advanced(&next);
            }
            OnboardingIntent::SubmitLifestyle(draft) => {
                self.apply(|s| s.commit_lifestyle(draft)).await?;
                self.save().await?;
            }
            OnboardingIntent::Save => self.save().await?,
            OnboardingIntent::Load => {
                self.load().await;
            }
            OnboardingIntent::Reset => {
                self.apply(|s| Ok(s.reset())).await?;
                info!("Onboarding reset");
                self.emit(OnboardingEvent::Reset);
            }
        }
        Ok(())
    }

    /// Run the save protocol and publish its outcome.
    ///
    /// Unanswered lifestyle questions reject the request with
    /// `IncompleteAnswers` before anything is emitted or written. Write
    /// failures are reported through the session and `SaveFailed`.
    pub async fn save(&self) -> Result<(), OnboardingError> {
        self.session.read().await.validate_lifestyle()?;

        self.emit(OnboardingEvent::SaveRequested);
        match self.persistence.save().await {
            Ok(profile) => self.emit(OnboardingEvent::Saved { profile }),
            Err(PersistenceError::Rejected(e)) => return Err(e),
            Err(e) => self.emit(OnboardingEvent::SaveFailed {
                error: e.to_string(),
            }),
        }
        Ok(())
    }

    /// Read the stored record. Diagnostic only: the session is not updated.
    pub async fn load(&self) -> Option<PersistedProfile> {
        self.emit(OnboardingEvent::LoadRequested);
        let profile = self.persistence.load().await;
        self.emit(OnboardingEvent::Loaded {
            profile: profile.clone(),
        });
        profile
    }

    /// Swap in the next snapshot produced by `f`, or keep the current one
    /// if `f` fails.
    async fn apply<F>(&self, f: F) -> Result<OnboardingSession, OnboardingError>
    where
        F: FnOnce(&OnboardingSession) -> Result<OnboardingSession, OnboardingError>,
    {
        let mut session = self.session.write().await;
        let next = f(&session)?;
        *session = next.clone();
        Ok(next)
    }

    fn advanced(&self, session: &OnboardingSession) {
        self.emit(OnboardingEvent::AdvanceRequested {
            step: session.current_step(),
        });
    }

    fn emit(&self, event: OnboardingEvent) {
        // ok if nobody is listening
        let _ = self.tx.send(event);
    }
}
