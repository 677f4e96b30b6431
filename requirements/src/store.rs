//! Ordered in-memory collection of requirement items.

use crate::item::{IllegalTransition, ItemId, ItemStatus, RequirementItem};

/// Insertion-ordered list of requirement items.
#[derive(Debug, Clone, Default)]
pub struct ItemStore {
    items: Vec<RequirementItem>,
}

impl ItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one `Pending` item per requirement line; returns the new ids.
    pub fn add_requirements<I, S>(&mut self, lines: I) -> Vec<ItemId>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let start = self.items.len();
        self.items
            .extend(lines.into_iter().map(RequirementItem::new));
        self.items[start..].iter().map(RequirementItem::id).collect()
    }

    pub fn get(&self, id: ItemId) -> Option<&RequirementItem> {
        self.items.iter().find(|i| i.id() == id)
    }

    /// Apply a status transition to one item. Unknown ids are a no-op returning `Ok(false)`.
    pub fn update<F>(&mut self, id: ItemId, f: F) -> Result<bool, IllegalTransition>
    where
        F: FnOnce(&mut RequirementItem) -> Result<(), IllegalTransition>,
    {
        match self.items.iter_mut().find(|i| i.id() == id) {
            Some(item) => f(item).map(|()| true),
            None => Ok(false),
        }
    }

    /// Ids of every `Pending` or `Error` item, in list order.
    pub fn eligible_ids(&self) -> Vec<ItemId> {
        self.items
            .iter()
            .filter(|i| i.status().is_eligible())
            .map(RequirementItem::id)
            .collect()
    }

    pub fn count_status(&self, status: ItemStatus) -> usize {
        self.items.iter().filter(|i| i.status() == status).count()
    }

    pub fn items(&self) -> &[RequirementItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
