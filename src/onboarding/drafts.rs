//! Per-step drafts.
//!
//! Each wizard screen checks out a draft of the sub-state it edits, mutates
//! it freely, and hands it back to the session on "Next". The session only
//! accepts a draft that passes that step's validation, so half-finished
//! edits never leak into the aggregate.

use uuid::Uuid;

use crate::error::OnboardingError;

use super::model::{AlcoholIntake, Item, ItemId};
use super::selection::{Identifiable, SelectionSet};

// ── Health concerns ─────────────────────────────────────────────────

/// Draft of the health-concern selection and its priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthConcernsDraft {
    selected: SelectionSet<Item>,
    prioritized: Vec<Item>,
}

impl HealthConcernsDraft {
    pub(crate) fn new(selected: SelectionSet<Item>, prioritized: Vec<Item>) -> Self {
        let mut draft = Self {
            selected,
            prioritized: Vec::new(),
        };
        // Fall back to natural order if the stored order drifted.
        if draft.reorder(prioritized).is_err() {
            draft.prioritized = draft.selected.as_slice().to_vec();
        }
        draft
    }

    /// Toggle a concern. Any membership change resets the priority order
    /// to selection order.
    pub fn toggle(&mut self, concern: Item) -> Result<(), OnboardingError> {
        self.selected.toggle(concern)?;
        self.prioritized = self.selected.as_slice().to_vec();
        Ok(())
    }

    /// Replace the priority order with a permutation of the current selection.
    pub fn reorder(&mut self, new_order: Vec<Item>) -> Result<(), OnboardingError> {
        check_permutation(self.selected.as_slice(), &new_order)?;
        self.prioritized = new_order;
        Ok(())
    }

    /// Move the concern at `from` to position `to`, as a drag gesture ends.
    pub fn move_concern(&mut self, from: usize, to: usize) -> Result<(), OnboardingError> {
        let len = self.prioritized.len();
        if from >= len || to >= len {
            return Err(OnboardingError::InvalidReorder {
                reason: format!("position out of range (from {from}, to {to}, len {len})"),
            });
        }
        let mut order = self.prioritized.clone();
        let moved = order.remove(from);
        order.insert(to, moved);
        self.reorder(order)
    }

    pub fn is_selected(&self, id: &ItemId) -> bool {
        self.selected.contains(id)
    }

    pub fn selected(&self) -> &[Item] {
        self.selected.as_slice()
    }

    pub fn prioritized(&self) -> &[Item] {
        &self.prioritized
    }

    /// At least one concern is required to continue.
    pub fn validate(&self) -> Result<(), OnboardingError> {
        if self.selected.is_empty() {
            return Err(OnboardingError::SelectionRequired {
                step: "health concerns",
            });
        }
        Ok(())
    }

    pub(crate) fn into_parts(self) -> (SelectionSet<Item>, Vec<Item>) {
        (self.selected, self.prioritized)
    }
}

/// Same ids, same count, no repeats.
fn check_permutation(members: &[Item], order: &[Item]) -> Result<(), OnboardingError> {
    if members.len() != order.len() {
        return Err(OnboardingError::InvalidReorder {
            reason: format!("expected {} concerns, got {}", members.len(), order.len()),
        });
    }
    for (idx, item) in order.iter().enumerate() {
        if !members.iter().any(|m| m.id == item.id) {
            return Err(OnboardingError::InvalidReorder {
                reason: format!("concern {} is not selected", item.id),
            });
        }
        if order[..idx].iter().any(|prev| prev.id == item.id) {
            return Err(OnboardingError::InvalidReorder {
                reason: format!("concern {} appears twice", item.id),
            });
        }
    }
    Ok(())
}

// ── Diets ───────────────────────────────────────────────────────────

/// A tap on the diets screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DietChoice {
    /// The "None" row. Clears every diet; it is never stored.
    None,
    Diet(Item),
}

/// Draft of the diet selection. An empty selection means "None".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DietsDraft {
    selected: SelectionSet<Item>,
}

impl DietsDraft {
    pub(crate) fn new(selected: SelectionSet<Item>) -> Self {
        Self { selected }
    }

    pub fn toggle(&mut self, choice: DietChoice) -> Result<(), OnboardingError> {
        match choice {
            DietChoice::None => {
                self.selected.clear();
                Ok(())
            }
            DietChoice::Diet(diet) => self.selected.toggle(diet),
        }
    }

    pub fn is_none_selected(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn selected(&self) -> &[Item] {
        self.selected.as_slice()
    }

    pub(crate) fn into_selection(self) -> SelectionSet<Item> {
        self.selected
    }
}

// ── Allergies ───────────────────────────────────────────────────────

/// Where an allergy entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AllergyOrigin {
    Catalog,
    Custom,
}

/// An allergy entry tagged with its origin.
///
/// Identity is `(origin, id)`: a custom id can never shadow a catalog id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllergyChoice {
    pub item: Item,
    pub origin: AllergyOrigin,
}

impl AllergyChoice {
    pub fn catalog(item: Item) -> Self {
        Self {
            item,
            origin: AllergyOrigin::Catalog,
        }
    }

    /// A user-typed allergy with a freshly minted id.
    pub fn custom(name: impl Into<String>) -> Self {
        Self {
            item: Item::new(Uuid::new_v4().to_string(), name),
            origin: AllergyOrigin::Custom,
        }
    }

    pub fn name(&self) -> &str {
        &self.item.name
    }
}

impl Identifiable for AllergyChoice {
    type Id = (AllergyOrigin, ItemId);

    fn id(&self) -> Self::Id {
        (self.origin, self.item.id.clone())
    }
}

/// Draft of the allergies screen.
#[derive(Debug, Clone)]
pub struct AllergiesDraft {
    selected: SelectionSet<AllergyChoice>,
    /// Custom names the user declared on a previous visit; offered as
    /// suggestions alongside the catalog.
    declared: Vec<AllergyChoice>,
}

impl AllergiesDraft {
    /// Seed from persisted catalog selections and the comma-joined custom list.
    pub(crate) fn new(catalog_selected: &SelectionSet<Item>, custom_allergies: &str) -> Self {
        let declared: Vec<AllergyChoice> = split_custom(custom_allergies)
            .map(AllergyChoice::custom)
            .collect();
        let mut selected = SelectionSet::new();
        selected.replace_all(
            catalog_selected
                .iter()
                .cloned()
                .map(AllergyChoice::catalog)
                .chain(declared.iter().cloned()),
        );
        Self { selected, declared }
    }

    /// Catalog and declared-custom entries whose name contains `input`
    /// (case-insensitive) and that are not already selected.
    ///
    /// Blank input suggests nothing. The iterator is lazy and borrows the
    /// draft, so it has to be recomputed after every edit.
    pub fn suggestions<'a>(
        &'a self,
        input: &str,
        catalog: &'a [Item],
    ) -> impl Iterator<Item = AllergyChoice> + use<'a> {
        let needle = input.trim().to_lowercase();
        catalog
            .iter()
            .cloned()
            .map(AllergyChoice::catalog)
            .chain(self.declared.iter().cloned())
            .filter(move |choice| {
                !needle.is_empty()
                    && choice.item.name.to_lowercase().contains(&needle)
                    && !self.selected.contains(&choice.id())
            })
    }

    /// Select an entry (typically a suggestion). Already selected entries are left alone.
    pub fn select(&mut self, choice: AllergyChoice) {
        if !self.selected.contains(&choice.id()) {
            // Unbounded set: toggling an absent entry always appends.
            let _ = self.selected.toggle(choice);
        }
    }

    pub fn remove(&mut self, origin: AllergyOrigin, id: &ItemId) -> bool {
        self.selected.remove(&(origin, id.clone()))
    }

    /// Add free text as a custom allergy.
    ///
    /// Returns `None` when the trimmed text is empty or matches (ignoring
    /// case) a catalog entry, a declared custom entry or a current selection.
    pub fn add_custom(&mut self, text: &str, catalog: &[Item]) -> Option<AllergyChoice> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        let lowered = trimmed.to_lowercase();
        let exists = catalog
            .iter()
            .map(|item| item.name.as_str())
            .chain(self.declared.iter().map(AllergyChoice::name))
            .chain(self.selected.iter().map(AllergyChoice::name))
            .any(|name| name.to_lowercase() == lowered);
        if exists {
            return None;
        }
        let choice = AllergyChoice::custom(trimmed);
        self.select(choice.clone());
        Some(choice)
    }

    pub fn selected(&self) -> &[AllergyChoice] {
        self.selected.as_slice()
    }

    /// Split into catalog selections and the `", "`-joined custom names.
    pub(crate) fn into_parts(self) -> (Vec<Item>, String) {
        let mut catalog = Vec::new();
        let mut custom = Vec::new();
        for choice in self.selected.iter() {
            match choice.origin {
                AllergyOrigin::Catalog => catalog.push(choice.item.clone()),
                AllergyOrigin::Custom => custom.push(choice.item.name.clone()),
            }
        }
        (catalog, custom.join(", "))
    }
}

fn split_custom(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|name| !name.is_empty())
}

// ── Lifestyle ───────────────────────────────────────────────────────

/// Answers to the three lifestyle questions. `None` means unanswered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LifestyleDraft {
    pub is_daily_exposure: Option<bool>,
    pub is_smoke: Option<bool>,
    pub alcohol: Option<AlcoholIntake>,
}

/// Validated lifestyle answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifestyleAnswers {
    pub is_daily_exposure: bool,
    pub is_smoke: bool,
    pub alcohol: AlcoholIntake,
}

impl LifestyleDraft {
    pub fn set_daily_exposure(&mut self, value: bool) {
        self.is_daily_exposure = Some(value);
    }

    pub fn set_smoke(&mut self, value: bool) {
        self.is_smoke = Some(value);
    }

    pub fn set_alcohol(&mut self, value: AlcoholIntake) {
        self.alcohol = Some(value);
    }

    /// Schema names of the unanswered questions.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.is_daily_exposure.is_none() {
            missing.push("is_daily_exposure");
        }
        if self.is_smoke.is_none() {
            missing.push("is_smoke");
        }
        if self.alcohol.is_none() {
            missing.push("alcohol");
        }
        missing
    }

    pub fn validate(&self) -> Result<LifestyleAnswers, OnboardingError> {
        match (self.is_daily_exposure, self.is_smoke, self.alcohol) {
            (Some(is_daily_exposure), Some(is_smoke), Some(alcohol)) => Ok(LifestyleAnswers {
                is_daily_exposure,
                is_smoke,
                alcohol,
            }),
            _ => Err(OnboardingError::IncompleteAnswers {
                missing: self.missing(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn concern(id: i64, name: &str) -> Item {
        Item::new(id, name)
    }

    fn concerns_draft() -> HealthConcernsDraft {
        HealthConcernsDraft::new(SelectionSet::with_max(5), Vec::new())
    }

    #[test]
    fn toggle_resets_priority_to_selection_order() {
        let mut draft = concerns_draft();
        draft.toggle(concern(1, "Sleep")).unwrap();
        draft.toggle(concern(2, "Stress")).unwrap();
        draft.toggle(concern(3, "Energy")).unwrap();
        draft.move_concern(2, 0).unwrap();
        assert_eq!(draft.prioritized()[0].name, "Energy");

        draft.toggle(concern(2, "Stress")).unwrap();
        let names: Vec<_> = draft.prioritized().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Sleep", "Energy"]);
    }

    #[test]
    fn reorder_rejects_non_permutations() {
        let mut draft = concerns_draft();
        draft.toggle(concern(1, "Sleep")).unwrap();
        draft.toggle(concern(2, "Stress")).unwrap();

        let short = draft.reorder(vec![concern(1, "Sleep")]);
        assert!(matches!(short, Err(OnboardingError::InvalidReorder { .. })));

        let stranger = draft.reorder(vec![concern(1, "Sleep"), concern(9, "Gut")]);
        assert!(matches!(stranger, Err(OnboardingError::InvalidReorder { .. })));

        let twice = draft.reorder(vec![concern(1, "Sleep"), concern(1, "Sleep")]);
        assert!(matches!(twice, Err(OnboardingError::InvalidReorder { .. })));

        assert_eq!(draft.prioritized(), draft.selected());

        draft
            .reorder(vec![concern(2, "Stress"), concern(1, "Sleep")])
            .unwrap();
        assert_eq!(draft.prioritized()[0].id, ItemId::Number(2));
    }

    #[test]
    fn move_concern_out_of_range() {
        let mut draft = concerns_draft();
        draft.toggle(concern(1, "Sleep")).unwrap();
        assert!(draft.move_concern(0, 3).is_err());
    }

    #[test]
    fn empty_concerns_fail_validation() {
        let draft = concerns_draft();
        assert_eq!(
            draft.validate(),
            Err(OnboardingError::SelectionRequired {
                step: "health concerns"
            })
        );
    }

    #[test]
    fn diet_none_clears_then_diet_adds() {
        let mut draft = DietsDraft::default();
        assert!(draft.is_none_selected());
        draft.toggle(DietChoice::Diet(Item::new(1, "Vegan"))).unwrap();
        draft.toggle(DietChoice::Diet(Item::new(2, "Keto"))).unwrap();
        assert_eq!(draft.selected().len(), 2);

        draft.toggle(DietChoice::None).unwrap();
        assert!(draft.is_none_selected());

        draft.toggle(DietChoice::Diet(Item::new(2, "Keto"))).unwrap();
        assert_eq!(draft.selected(), &[Item::new(2, "Keto")]);
    }

    fn allergy_catalog() -> Vec<Item> {
        vec![
            Item::new(1, "Peanuts"),
            Item::new(2, "Pecans"),
            Item::new(3, "Shellfish"),
        ]
    }

    #[test]
    fn suggestions_filter_by_substring_and_selection() {
        let catalog = allergy_catalog();
        let mut draft = AllergiesDraft::new(&SelectionSet::new(), "");

        let names: Vec<_> = draft
            .suggestions("PE", &catalog)
            .map(|c| c.item.name)
            .collect();
        assert_eq!(names, ["Peanuts", "Pecans"]);

        draft.select(AllergyChoice::catalog(Item::new(1, "Peanuts")));
        let names: Vec<_> = draft
            .suggestions(" pe ", &catalog)
            .map(|c| c.item.name)
            .collect();
        assert_eq!(names, ["Pecans"]);

        assert_eq!(draft.suggestions("   ", &catalog).count(), 0);
    }

    #[test]
    fn suggestions_include_declared_customs() {
        let catalog = allergy_catalog();
        let mut draft = AllergiesDraft::new(&SelectionSet::new(), "Dust, Pollen");
        let dust = draft.selected()[0].clone();
        assert!(draft.remove(AllergyOrigin::Custom, &dust.item.id));

        let hits: Vec<_> = draft.suggestions("dus", &catalog).collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].origin, AllergyOrigin::Custom);
        assert_eq!(hits[0].item.name, "Dust");
    }

    #[test]
    fn add_custom_trims_and_rejects_duplicates() {
        let catalog = allergy_catalog();
        let mut draft = AllergiesDraft::new(&SelectionSet::new(), "");

        assert!(draft.add_custom("   ", &catalog).is_none());
        assert!(draft.add_custom("peanuts", &catalog).is_none());

        let added = draft.add_custom("  Latex ", &catalog).unwrap();
        assert_eq!(added.item.name, "Latex");
        assert_eq!(added.origin, AllergyOrigin::Custom);
        assert!(draft.add_custom("LATEX", &catalog).is_none());
        assert_eq!(draft.selected().len(), 1);
    }

    #[test]
    fn custom_ids_never_collide_with_catalog_ids() {
        let mut draft = AllergiesDraft::new(&SelectionSet::new(), "");
        let mut custom = AllergyChoice::custom("Mold");
        custom.item.id = ItemId::Number(1);
        draft.select(AllergyChoice::catalog(Item::new(1, "Peanuts")));
        draft.select(custom);
        assert_eq!(draft.selected().len(), 2);
    }

    #[test]
    fn into_parts_splits_by_origin() {
        let mut draft = AllergiesDraft::new(&SelectionSet::new(), "");
        draft.select(AllergyChoice::catalog(Item::new(1, "Peanuts")));
        draft.add_custom("Dust", &[]).unwrap();
        draft.add_custom("Mold", &[]).unwrap();

        let (catalog, custom) = draft.into_parts();
        assert_eq!(catalog, vec![Item::new(1, "Peanuts")]);
        assert_eq!(custom, "Dust, Mold");
    }

    #[test]
    fn seeding_restores_custom_entries() {
        let mut catalog_selected = SelectionSet::new();
        catalog_selected.replace_all(vec![Item::new(3, "Shellfish")]);
        let draft = AllergiesDraft::new(&catalog_selected, "Dust, , Mold");

        let origins: Vec<_> = draft.selected().iter().map(|c| c.origin).collect();
        assert_eq!(
            origins,
            [AllergyOrigin::Catalog, AllergyOrigin::Custom, AllergyOrigin::Custom]
        );
        let (_, custom) = draft.into_parts();
        assert_eq!(custom, "Dust, Mold");
    }

    #[test]
    fn lifestyle_requires_all_answers() {
        let mut draft = LifestyleDraft::default();
        draft.set_daily_exposure(true);
        assert_eq!(
            draft.validate(),
            Err(OnboardingError::IncompleteAnswers {
                missing: vec!["is_smoke", "alcohol"]
            })
        );

        draft.set_smoke(false);
        draft.set_alcohol(AlcoholIntake::High);
        let answers = draft.validate().unwrap();
        assert!(answers.is_daily_exposure);
        assert!(!answers.is_smoke);
        assert_eq!(answers.alcohol, AlcoholIntake::High);
    }
}
