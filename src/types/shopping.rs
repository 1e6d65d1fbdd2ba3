//! Categorised shopping list.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Shopping list grouped by grocery store section.
///
/// Categories are kept sorted so output is stable across runs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShoppingList {
    pub categories: BTreeMap<String, Vec<String>>,
}

impl ShoppingList {
    /// Total number of items across all categories.
    pub fn item_count(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.item_count() == 0
    }

    /// Items in a category, or an empty slice.
    pub fn items(&self, category: &str) -> &[String] {
        self.categories
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}
