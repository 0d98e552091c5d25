//! Decoding of the order form body.

use url::form_urlencoded;

/// Field carrying the display name.
pub const NAME_FIELD: &str = "name_on_order";
/// Repeated field, one per ingredient slot, in slot order.
pub const INGREDIENT_FIELD: &str = "ingredients";

/// Raw form state as posted by the browser.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderForm {
    pub name_on_order: String,
    pub ingredients: Vec<String>,
}

impl OrderForm {
    /// Decodes an `application/x-www-form-urlencoded` body.
    ///
    /// Empty ingredient slots are skipped; unknown fields are ignored.
    pub fn parse(body: &[u8]) -> Self {
        let mut form = Self::default();
        for (key, value) in form_urlencoded::parse(body) {
            match key.as_ref() {
                NAME_FIELD => form.name_on_order = value.into_owned(),
                INGREDIENT_FIELD if !value.is_empty() => form.ingredients.push(value.into_owned()),
                _ => {}
            }
        }
        form
    }
}
