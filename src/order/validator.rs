//! Order Validator: decides whether a draft may be submitted.

use thiserror::Error;

use super::OrderDraft;

/// Reasons a draft is rejected, in precedence order.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Not connected to the order store.")]
    NotConnected,

    #[error("Please enter a name for your smoothie.")]
    MissingName,

    #[error("Please choose at least one ingredient.")]
    NoIngredients,
}

/// Checks a draft; the first failing rule wins.
///
/// Connectivity is checked before any user input.
pub fn validate(draft: &OrderDraft, connection_ok: bool) -> Result<(), ValidationError> {
    if !connection_ok {
        Err(ValidationError::NotConnected)
    } else if draft.trimmed_name().is_empty() {
        Err(ValidationError::MissingName)
    } else if draft.ingredients.is_empty() {
        Err(ValidationError::NoIngredients)
    } else {
        Ok(())
    }
}
