//! Onboarding system — the multi-step health intake wizard.
//!
//! The user walks through health concerns, diets, allergies and lifestyle
//! screens. Each screen edits a draft of its part of the
//! `OnboardingSession`; the session accepts the draft only when the step's
//! rules hold. The finished session is formatted into a `PersistedProfile`
//! and written to the key-value store.

pub mod drafts;
pub mod format;
pub mod manager;
pub mod model;
pub mod persistence;
pub mod selection;
pub mod state;

pub use drafts::{
    AllergiesDraft, AllergyChoice, AllergyOrigin, DietChoice, DietsDraft, HealthConcernsDraft,
    LifestyleAnswers, LifestyleDraft,
};
pub use format::{format_profile, format_profile_at};
pub use manager::{OnboardingEvent, OnboardingIntent, OnboardingManager};
pub use model::{AlcoholIntake, Item, ItemId, PersistedProfile, RankedConcern, storage_keys};
pub use persistence::PersistenceOrchestrator;
pub use selection::{Identifiable, SelectionSet};
pub use state::{OnboardingSession, StepSequence, WizardStep};
