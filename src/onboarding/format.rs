//! Session → persisted record transform.

use chrono::{DateTime, Utc};

use crate::error::OnboardingError;

use super::model::{PersistedProfile, RankedConcern};
use super::state::OnboardingSession;

/// Format the session as a [`PersistedProfile`] stamped with the current time.
pub fn format_profile(session: &OnboardingSession) -> Result<PersistedProfile, OnboardingError> {
    format_profile_at(session, Utc::now())
}

/// Format the session with an explicit timestamp.
///
/// Priority is the 1-based position in `prioritized_concerns`. Everything
/// else is copied verbatim. Fails with `IncompleteAnswers` while any
/// lifestyle question is unanswered.
pub fn format_profile_at(
    session: &OnboardingSession,
    at: DateTime<Utc>,
) -> Result<PersistedProfile, OnboardingError> {
    let lifestyle = session.lifestyle_draft().validate()?;
    let health_concerns = session
        .prioritized_concerns()
        .iter()
        .zip(1u32..)
        .map(|(concern, priority)| RankedConcern {
            id: concern.id.clone(),
            name: concern.name.clone(),
            priority,
        })
        .collect();

    Ok(PersistedProfile {
        health_concerns,
        diets: session.selected_diets().to_vec(),
        is_daily_exposure: lifestyle.is_daily_exposure,
        is_smoke: lifestyle.is_smoke,
        alcohol: lifestyle.alcohol,
        allergies: session.allergies().to_vec(),
        custom_allergies: session.custom_allergies().to_string(),
        timestamp: at,
    })
}
