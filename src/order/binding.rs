//! Input binding checks applied to a selection before it becomes a draft.

use std::collections::HashSet;

use thiserror::Error;

use crate::catalog::IngredientCatalog;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BindError {
    #[error("Choose at most {max} ingredients ({selected} selected).")]
    TooManyIngredients { max: usize, selected: usize },

    #[error("{0:?} was chosen more than once.")]
    DuplicateIngredient(String),

    #[error("{0:?} is not on the ingredient list.")]
    UnknownIngredient(String),

    #[error("The ingredient list is unavailable. Reload the page and try again.")]
    CatalogUnavailable,
}

/// Rejects selections longer than `max`.
pub fn check_selection_len(selection: &[String], max: usize) -> Result<(), BindError> {
    if selection.len() > max {
        return Err(BindError::TooManyIngredients {
            max,
            selected: selection.len(),
        });
    }
    Ok(())
}

/// Rejects selections naming the same ingredient twice.
pub fn check_distinct(selection: &[String]) -> Result<(), BindError> {
    let mut seen = HashSet::with_capacity(selection.len());
    match selection.iter().find(|name| !seen.insert(name.as_str())) {
        Some(repeated) => Err(BindError::DuplicateIngredient(repeated.clone())),
        None => Ok(()),
    }
}

/// Rejects selections naming anything outside `catalog`.
///
/// `None` means the catalog could not be loaded, so nothing can be checked.
pub fn check_membership(selection: &[String], catalog: Option<&IngredientCatalog>) -> Result<(), BindError> {
    let catalog = catalog.ok_or(BindError::CatalogUnavailable)?;
    match selection.iter().find(|name| !catalog.contains(name)) {
        Some(unknown) => Err(BindError::UnknownIngredient(unknown.clone())),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::Value;
    use proptest::prelude::*;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_five_is_allowed_six_is_not() {
        let five = names(&["a", "b", "c", "d", "e"]);
        assert_eq!(check_selection_len(&five, 5), Ok(()));

        let six = names(&["a", "b", "c", "d", "e", "f"]);
        assert_eq!(
            check_selection_len(&six, 5),
            Err(BindError::TooManyIngredients { max: 5, selected: 6 })
        );
    }

    #[test]
    fn test_repeated_pick_is_rejected() {
        assert_eq!(check_distinct(&names(&["Kiwi", "Apple"])), Ok(()));
        assert_eq!(
            check_distinct(&names(&["Kiwi", "Apple", "Kiwi"])),
            Err(BindError::DuplicateIngredient("Kiwi".into()))
        );
        assert_eq!(
            check_distinct(&vec!["Kiwi".to_string(); 5]).unwrap_err().to_string(),
            "\"Kiwi\" was chosen more than once."
        );
    }

    #[test]
    fn test_membership() {
        let catalog = IngredientCatalog::from_values(vec![Value::from("Apple"), Value::from("Kiwi")]);
        assert_eq!(check_membership(&names(&["Kiwi", "Apple"]), Some(&catalog)), Ok(()));
        assert_eq!(
            check_membership(&names(&["Kiwi", "Durian"]), Some(&catalog)),
            Err(BindError::UnknownIngredient("Durian".into()))
        );
    }

    #[test]
    fn test_membership_without_catalog() {
        assert_eq!(
            check_membership(&names(&["Kiwi"]), None),
            Err(BindError::CatalogUnavailable)
        );
    }

    proptest! {
        #[test]
        fn prop_selection_len_boundary(
            max in 1..10usize,
            selection in proptest::collection::vec("[A-Za-z]{1,8}", 0..20)
        ) {
            let result = check_selection_len(&selection, max);
            if selection.len() > max {
                prop_assert_eq!(
                    result,
                    Err(BindError::TooManyIngredients { max, selected: selection.len() })
                );
            } else {
                prop_assert_eq!(result, Ok(()));
            }
        }

        #[test]
        fn prop_distinct_selection_is_accepted(
            set in proptest::collection::btree_set("[A-Za-z ]{1,8}", 0..8)
        ) {
            let selection: Vec<String> = set.into_iter().collect();
            prop_assert_eq!(check_distinct(&selection), Ok(()));
        }
    }
}
