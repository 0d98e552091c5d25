//! Order data structures.

use serde::{Deserialize, Serialize};

/// The in-progress order composed from the current form state.
///
/// Created fresh for every submission attempt and discarded afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderDraft {
    pub name_on_order: String,
    /// Selected ingredient names, in selection order.
    pub ingredients: Vec<String>,
}

impl OrderDraft {
    /// Creates a new draft.
    ///
    /// # Arguments
    /// * `name_on_order` - Display name as typed by the user
    /// * `ingredients` - Selected ingredients, in the order they were picked
    pub fn new(name_on_order: impl Into<String>, ingredients: Vec<String>) -> Self {
        Self {
            name_on_order: name_on_order.into(),
            ingredients,
        }
    }

    pub fn trimmed_name(&self) -> &str {
        self.name_on_order.trim()
    }

    /// Selected ingredients joined with single spaces, then trimmed.
    pub fn ingredients_string(&self) -> String {
        self.ingredients.join(" ").trim().to_string()
    }
}

/// A persisted order row. Never mutated once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub ingredients: String,
    pub name_on_order: String,
}

impl From<&OrderDraft> for OrderRecord {
    fn from(draft: &OrderDraft) -> Self {
        Self {
            ingredients: draft.ingredients_string(),
            name_on_order: draft.trimmed_name().to_string(),
        }
    }
}
