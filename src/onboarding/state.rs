//! Onboarding state machine: the step cursor and the session aggregate.
//!
//! `OnboardingSession` is an immutable snapshot. Every operation takes
//! `&self` and returns the next snapshot (or an error, leaving the current
//! one untouched), so callers can only change state through the declared
//! transitions.

use serde::{Deserialize, Serialize};

use crate::config::IntakeConfig;
use crate::error::OnboardingError;

use super::drafts::{
    AllergiesDraft, AllergyChoice, DietChoice, DietsDraft, HealthConcernsDraft, LifestyleDraft,
};
use super::model::{AlcoholIntake, Item};
use super::selection::SelectionSet;

/// Default number of progress steps.
pub const DEFAULT_TOTAL_STEPS: usize = 4;

/// Default cap on selected health concerns.
pub const MAX_HEALTH_CONCERNS: usize = 5;

/// Progress cursor in `[0, total - 1]`.
///
/// Tracks position only; it does not know which screen is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepSequence {
    current: usize,
    total: usize,
}

impl StepSequence {
    pub fn new(total: usize) -> Self {
        Self { current: 0, total }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Step forward, saturating at the last step.
    pub fn advance(&mut self) {
        if self.current.saturating_add(1) < self.total {
            self.current += 1;
        }
    }

    /// Step back, saturating at zero.
    pub fn retreat(&mut self) {
        if self.current > 0 {
            self.current -= 1;
        }
    }

    /// Explicit navigation. The caller owns the range check.
    pub fn jump_to(&mut self, step: usize) {
        self.current = step;
    }
}

/// The screens of the wizard, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Welcome,
    HealthConcerns,
    Diets,
    Allergies,
    Lifestyle,
}

impl WizardStep {
    pub fn next(&self) -> Option<WizardStep> {
        use WizardStep::*;
        match self {
            Welcome => Some(HealthConcerns),
            HealthConcerns => Some(Diets),
            Diets => Some(Allergies),
            Allergies => Some(Lifestyle),
            Lifestyle => None,
        }
    }

    pub fn previous(&self) -> Option<WizardStep> {
        use WizardStep::*;
        match self {
            Welcome => None,
            HealthConcerns => Some(Welcome),
            Diets => Some(HealthConcerns),
            Allergies => Some(Diets),
            Lifestyle => Some(Allergies),
        }
    }
}

impl std::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Welcome => "welcome",
            Self::HealthConcerns => "health_concerns",
            Self::Diets => "diets",
            Self::Allergies => "allergies",
            Self::Lifestyle => "lifestyle",
        };
        write!(f, "{s}")
    }
}

/// All answers collected so far, the step cursor, and save lifecycle flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnboardingSession {
    steps: StepSequence,
    health_concerns: SelectionSet<Item>,
    prioritized_concerns: Vec<Item>,
    selected_diets: SelectionSet<Item>,
    is_daily_exposure: Option<bool>,
    is_smoke: Option<bool>,
    alcohol: Option<AlcoholIntake>,
    allergies: SelectionSet<Item>,
    custom_allergies: String,
    is_loading: bool,
    error: Option<String>,
    is_completed: bool,
}

impl Default for OnboardingSession {
    fn default() -> Self {
        Self::new(DEFAULT_TOTAL_STEPS, MAX_HEALTH_CONCERNS)
    }
}

impl OnboardingSession {
    pub fn new(total_steps: usize, max_health_concerns: usize) -> Self {
        Self {
            steps: StepSequence::new(total_steps),
            health_concerns: SelectionSet::with_max(max_health_concerns),
            prioritized_concerns: Vec::new(),
            selected_diets: SelectionSet::new(),
            is_daily_exposure: None,
            is_smoke: None,
            alcohol: None,
            allergies: SelectionSet::new(),
            custom_allergies: String::new(),
            is_loading: false,
            error: None,
            is_completed: false,
        }
    }

    pub fn from_config(config: &IntakeConfig) -> Self {
        Self::new(config.total_steps, config.max_health_concerns)
    }

    // ── Accessors ───────────────────────────────────────────────────

    pub fn current_step(&self) -> usize {
        self.steps.current()
    }

    pub fn total_steps(&self) -> usize {
        self.steps.total()
    }

    pub fn health_concerns(&self) -> &[Item] {
        self.health_concerns.as_slice()
    }

    pub fn max_health_concerns(&self) -> Option<usize> {
        self.health_concerns.max()
    }

    pub fn prioritized_concerns(&self) -> &[Item] {
        &self.prioritized_concerns
    }

    pub fn selected_diets(&self) -> &[Item] {
        self.selected_diets.as_slice()
    }

    /// The "None" diet state is derived, never stored.
    pub fn no_diet_selected(&self) -> bool {
        self.selected_diets.is_empty()
    }

    pub fn is_daily_exposure(&self) -> Option<bool> {
        self.is_daily_exposure
    }

    pub fn is_smoke(&self) -> Option<bool> {
        self.is_smoke
    }

    pub fn alcohol(&self) -> Option<AlcoholIntake> {
        self.alcohol
    }

    pub fn allergies(&self) -> &[Item] {
        self.allergies.as_slice()
    }

    pub fn custom_allergies(&self) -> &str {
        &self.custom_allergies
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    // ── Navigation ──────────────────────────────────────────────────

    pub fn next_step(&self) -> Self {
        let mut next = self.clone();
        next.steps.advance();
        next
    }

    pub fn prev_step(&self) -> Self {
        let mut next = self.clone();
        next.steps.retreat();
        next
    }

    pub fn jump_to(&self, step: usize) -> Self {
        let mut next = self.clone();
        next.steps.jump_to(step);
        next
    }

    /// The welcome screen's "Get Started" lands on the first question.
    pub fn get_started(&self) -> Self {
        self.jump_to(1)
    }

    /// Advance past `step` if its required selections hold.
    ///
    /// Health concerns need at least one selection and lifestyle needs all
    /// three answers; the other steps accept empty selections.
    pub fn advance_from(&self, step: WizardStep) -> Result<Self, OnboardingError> {
        match step {
            WizardStep::HealthConcerns if self.health_concerns.is_empty() => {
                return Err(OnboardingError::SelectionRequired {
                    step: "health concerns",
                });
            }
            WizardStep::Lifestyle => self.validate_lifestyle()?,
            _ => {}
        }
        Ok(self.next_step())
    }

    // ── Health concerns ─────────────────────────────────────────────

    pub fn health_concerns_draft(&self) -> HealthConcernsDraft {
        HealthConcernsDraft::new(
            self.health_concerns.clone(),
            self.prioritized_concerns.clone(),
        )
    }

    /// Toggle a concern. At the cap this fails with `LimitExceeded`.
    pub fn toggle_health_concern(&self, concern: Item) -> Result<Self, OnboardingError> {
        let mut draft = self.health_concerns_draft();
        draft.toggle(concern)?;
        Ok(self.with_concerns(draft))
    }

    /// Replace the priority order; must be a permutation of the selection.
    pub fn reorder_concerns(&self, new_order: Vec<Item>) -> Result<Self, OnboardingError> {
        let mut draft = self.health_concerns_draft();
        draft.reorder(new_order)?;
        Ok(self.with_concerns(draft))
    }

    /// Write the draft back and move to the next step.
    pub fn commit_health_concerns(
        &self,
        draft: HealthConcernsDraft,
    ) -> Result<Self, OnboardingError> {
        draft.validate()?;
        Ok(self.with_concerns(draft).next_step())
    }

    fn with_concerns(&self, draft: HealthConcernsDraft) -> Self {
        let (selected, prioritized) = draft.into_parts();
        let mut next = self.clone();
        next.health_concerns = selected;
        next.prioritized_concerns = prioritized;
        next
    }

    // ── Diets ───────────────────────────────────────────────────────

    pub fn diets_draft(&self) -> DietsDraft {
        DietsDraft::new(self.selected_diets.clone())
    }

    pub fn toggle_diet(&self, choice: DietChoice) -> Result<Self, OnboardingError> {
        let mut draft = self.diets_draft();
        draft.toggle(choice)?;
        Ok(self.with_diets(draft))
    }

    pub fn commit_diets(&self, draft: DietsDraft) -> Self {
        self.with_diets(draft).next_step()
    }

    fn with_diets(&self, draft: DietsDraft) -> Self {
        let mut next = self.clone();
        next.selected_diets = draft.into_selection();
        next
    }

    // ── Allergies ───────────────────────────────────────────────────

    pub fn allergies_draft(&self) -> AllergiesDraft {
        AllergiesDraft::new(&self.allergies, &self.custom_allergies)
    }

    /// Catalog and previously declared custom allergies matching `input`
    /// that are not selected yet.
    pub fn allergy_suggestions(&self, input: &str, catalog: &[Item]) -> Vec<AllergyChoice> {
        self.allergies_draft().suggestions(input, catalog).collect()
    }

    /// Split the draft into catalog selections and the custom-name list,
    /// then move to the next step.
    pub fn commit_allergies(&self, draft: AllergiesDraft) -> Self {
        let (catalog, custom) = draft.into_parts();
        let mut next = self.clone();
        next.allergies.replace_all(catalog);
        next.custom_allergies = custom;
        next.next_step()
    }

    // ── Lifestyle ───────────────────────────────────────────────────

    pub fn lifestyle_draft(&self) -> LifestyleDraft {
        LifestyleDraft {
            is_daily_exposure: self.is_daily_exposure,
            is_smoke: self.is_smoke,
            alcohol: self.alcohol,
        }
    }

    pub fn set_daily_exposure(&self, value: bool) -> Self {
        let mut next = self.clone();
        next.is_daily_exposure = Some(value);
        next
    }

    pub fn set_smoke(&self, value: bool) -> Self {
        let mut next = self.clone();
        next.is_smoke = Some(value);
        next
    }

    pub fn set_alcohol(&self, value: AlcoholIntake) -> Self {
        let mut next = self.clone();
        next.alcohol = Some(value);
        next
    }

    /// The "proceed" check: every lifestyle question must be answered.
    pub fn validate_lifestyle(&self) -> Result<(), OnboardingError> {
        self.lifestyle_draft().validate().map(|_| ())
    }

    /// Record validated answers. Lifestyle is the last screen, so the step
    /// cursor stays put; the caller follows up with a save request.
    pub fn commit_lifestyle(&self, draft: LifestyleDraft) -> Result<Self, OnboardingError> {
        let answers = draft.validate()?;
        let mut next = self.clone();
        next.is_daily_exposure = Some(answers.is_daily_exposure);
        next.is_smoke = Some(answers.is_smoke);
        next.alcohol = Some(answers.alcohol);
        Ok(next)
    }

    // ── Lifecycle ───────────────────────────────────────────────────

    /// Back to defaults, keeping the configured step total and cap.
    pub fn reset(&self) -> Self {
        Self::new(
            self.steps.total(),
            self.health_concerns.max().unwrap_or(MAX_HEALTH_CONCERNS),
        )
    }

    pub(crate) fn with_loading(&self, is_loading: bool) -> Self {
        let mut next = self.clone();
        next.is_loading = is_loading;
        next
    }

    pub(crate) fn with_error(&self, error: Option<String>) -> Self {
        let mut next = self.clone();
        next.error = error;
        next
    }

    pub(crate) fn with_completed(&self, is_completed: bool) -> Self {
        let mut next = self.clone();
        next.is_completed = is_completed;
        next
    }
}
