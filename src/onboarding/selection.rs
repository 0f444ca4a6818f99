//! Ordered, unique-by-id selection with an optional size cap.

use crate::error::OnboardingError;

use super::model::{Item, ItemId};

/// Anything that can be selected exactly once.
pub trait Identifiable {
    type Id: PartialEq + Clone + std::fmt::Debug;

    fn id(&self) -> Self::Id;
}

impl Identifiable for Item {
    type Id = ItemId;

    fn id(&self) -> ItemId {
        self.id.clone()
    }
}

/// Insertion-ordered set of items, unique by [`Identifiable::id`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionSet<T> {
    items: Vec<T>,
    max: Option<usize>,
}

impl<T> Default for SelectionSet<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            max: None,
        }
    }
}

impl<T: Identifiable> SelectionSet<T> {
    /// An unbounded empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty set holding at most `max` items.
    pub fn with_max(max: usize) -> Self {
        Self {
            items: Vec::new(),
            max: Some(max),
        }
    }

    /// Remove the item if its id is present, otherwise append it.
    ///
    /// Appending into a full set fails with `LimitExceeded` and leaves the
    /// set unchanged.
    pub fn toggle(&mut self, item: T) -> Result<(), OnboardingError> {
        let id = item.id();
        if let Some(pos) = self.position(&id) {
            self.items.remove(pos);
            return Ok(());
        }
        if let Some(max) = self.max {
            if self.items.len() >= max {
                return Err(OnboardingError::LimitExceeded { max });
            }
        }
        self.items.push(item);
        Ok(())
    }

    /// Remove the item with `id`. Returns whether anything was removed.
    pub fn remove(&mut self, id: &T::Id) -> bool {
        match self.position(id) {
            Some(pos) => {
                self.items.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Replace the whole selection.
    ///
    /// Later duplicates of an id are dropped and the cap is applied by
    /// truncation, so seeding from stale data can never break the invariants.
    pub fn replace_all(&mut self, items: impl IntoIterator<Item = T>) {
        self.items.clear();
        for item in items {
            if self.max.is_some_and(|max| self.items.len() >= max) {
                break;
            }
            if self.position(&item.id()).is_none() {
                self.items.push(item);
            }
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn contains(&self, id: &T::Id) -> bool {
        self.position(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn max(&self) -> Option<usize> {
        self.max
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    fn position(&self, id: &T::Id) -> Option<usize> {
        self.items.iter().position(|item| item.id() == *id)
    }
}

impl<'a, T> IntoIterator for &'a SelectionSet<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
