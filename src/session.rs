//! # Session Context
//!
//! The one object holding the session-wide mutable state: the store
//! connection and the cached catalog. Each page load or submit runs exactly
//! one pass through it.
//!
//! ## State Machine
//!
//! ```text
//! Disconnected --connect+probe ok--> Idle --submit--> Submitting --done--> Idle
//!      |  ^                                                 |
//!      +--+ connect failed (retried on next page load)      +--connection lost--> Disconnected
//! ```
//!
//! Errors never escape this module; every failure is turned into a
//! [`Feedback`] message for the page.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::catalog::{CatalogCache, IngredientCatalog};
use crate::config::AppConfig;
use crate::gateway::{Connector, StoreClient};
use crate::order::{
    check_distinct, check_membership, check_selection_len, validate, InsertMode, OrderDraft,
    OrderSubmitter,
};

/// Values the session needs from configuration.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub catalog_table: String,
    pub orders_table: String,
    pub insert_mode: InsertMode,
    pub max_ingredients: usize,
    pub catalog_ttl: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for SessionSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            catalog_table: config.store.catalog_table.clone(),
            orders_table: config.store.orders_table.clone(),
            insert_mode: config.store.insert_mode,
            max_ingredients: config.catalog.max_ingredients,
            catalog_ttl: config.catalog.ttl(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// No usable connection; carries the last connection error.
    Disconnected(String),
    Idle,
    Submitting,
}

/// A user-visible message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "lowercase")]
pub enum Feedback {
    Error(String),
    Warning(String),
    Success(String),
}

impl Feedback {
    pub fn message(&self) -> &str {
        match self {
            Feedback::Error(m) | Feedback::Warning(m) | Feedback::Success(m) => m,
        }
    }
}

/// Everything the presentation layer needs to render one page.
#[derive(Debug, Clone, Serialize)]
pub struct PageView {
    pub connected: bool,
    pub ingredients: IngredientCatalog,
    pub max_ingredients: usize,
    pub feedback: Vec<Feedback>,
    /// Form values to show again (cleared after a successful order).
    pub name_on_order: String,
    pub selected: Vec<String>,
}

pub struct SessionContext {
    connector: Box<dyn Connector>,
    client: Option<StoreClient>,
    catalog: CatalogCache,
    state: SessionState,
    settings: SessionSettings,
}

impl SessionContext {
    pub fn new(connector: impl Connector + 'static, settings: SessionSettings) -> Self {
        Self {
            connector: Box::new(connector),
            client: None,
            catalog: CatalogCache::new(settings.catalog_ttl),
            state: SessionState::Disconnected("not connected yet".to_string()),
            settings,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn is_connected(&self) -> bool {
        self.client.as_ref().is_some_and(|client| !client.is_closed())
    }

    /// Cached catalog size, without touching the store.
    pub fn cached_ingredients(&self) -> usize {
        self.catalog
            .get(std::time::Instant::now())
            .map_or(0, IngredientCatalog::len)
    }

    fn transition(&mut self, next: SessionState) {
        if self.state != next {
            info!(from = ?self.state, to = ?next, "Session state changed");
            self.state = next;
        }
    }

    /// Returns the live connection, establishing it first if needed.
    async fn ensure_connected(&mut self) -> Result<StoreClient, String> {
        if let Some(client) = self.client.as_ref().filter(|c| !c.is_closed()) {
            return Ok(client.clone());
        }
        self.client = None;

        match self.connector.connect().await {
            Ok(client) => {
                self.client = Some(client.clone());
                self.transition(SessionState::Idle);
                Ok(client)
            }
            Err(e) => {
                let message = e.to_string();
                warn!(error = %message, "Could not connect");
                self.transition(SessionState::Disconnected(message.clone()));
                Err(message)
            }
        }
    }

    /// Page-load pass: connect if needed, then load the catalog.
    #[instrument(skip(self))]
    pub async fn refresh(&mut self) -> PageView {
        let mut view = PageView {
            connected: false,
            ingredients: IngredientCatalog::default(),
            max_ingredients: self.settings.max_ingredients,
            feedback: Vec::new(),
            name_on_order: String::new(),
            selected: Vec::new(),
        };

        let client = match self.ensure_connected().await {
            Ok(client) => client,
            Err(message) => {
                view.feedback.push(Feedback::Error(format!(
                    "Could not connect to the order store: {message}"
                )));
                return view;
            }
        };
        view.connected = true;

        match self
            .catalog
            .get_or_load(&client, &self.settings.catalog_table)
            .await
        {
            Ok(catalog) => view.ingredients = catalog,
            Err(e) => view
                .feedback
                .push(Feedback::Warning(format!("Could not load ingredients: {e}"))),
        }
        view
    }

    /// Submit pass: refresh, bind, validate, then persist.
    #[instrument(skip(self, selection))]
    pub async fn submit(&mut self, name_on_order: String, selection: Vec<String>) -> PageView {
        let mut view = self.refresh().await;
        let draft = OrderDraft::new(name_on_order, selection);
        view.name_on_order = draft.name_on_order.clone();
        view.selected = draft.ingredients.clone();

        let catalog_loaded = !view.feedback.iter().any(|f| matches!(f, Feedback::Warning(_)));
        let catalog = catalog_loaded.then_some(&view.ingredients);
        let feedback = self.submit_draft(&draft, catalog, view.connected).await;
        if matches!(feedback, Feedback::Success(_)) {
            view.name_on_order.clear();
            view.selected.clear();
        }
        if !self.is_connected() {
            view.connected = false;
        }
        view.feedback.push(feedback);
        view
    }

    async fn submit_draft(
        &mut self,
        draft: &OrderDraft,
        catalog: Option<&IngredientCatalog>,
        connected: bool,
    ) -> Feedback {
        let bound = check_selection_len(&draft.ingredients, self.settings.max_ingredients)
            .and_then(|()| check_distinct(&draft.ingredients));
        if let Err(e) = bound {
            return Feedback::Error(e.to_string());
        }
        if let Err(e) = validate(draft, connected) {
            debug!(reason = ?e, "Order rejected");
            return Feedback::Error(e.to_string());
        }
        if let Err(e) = check_membership(&draft.ingredients, catalog) {
            return Feedback::Error(e.to_string());
        }
        let Some(client) = self.client.clone() else {
            return Feedback::Error(crate::order::ValidationError::NotConnected.to_string());
        };

        self.transition(SessionState::Submitting);
        let result = OrderSubmitter::new(&client, &self.settings.orders_table, self.settings.insert_mode)
            .submit(draft)
            .await;

        match result {
            Ok(record) => {
                self.transition(SessionState::Idle);
                Feedback::Success(format!("Your Smoothie is ordered, {}! ✅", record.name_on_order))
            }
            Err(e) => {
                if e.is_disconnect() {
                    self.client = None;
                    self.transition(SessionState::Disconnected(e.to_string()));
                } else {
                    self.transition(SessionState::Idle);
                }
                Feedback::Error(format!("Order failed: {e}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::mock::MockStore;
    use crate::gateway::Value;

    fn rows(names: &[&str]) -> Vec<Vec<Value>> {
        names.iter().map(|n| vec![Value::from(*n)]).collect()
    }

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn session(mock: &MockStore) -> SessionContext {
        SessionContext::new(mock.clone(), SessionSettings::default())
    }

    #[tokio::test]
    async fn test_refresh_connects_once_and_caches_catalog() {
        let mock = MockStore::new();
        mock.expect_probe();
        mock.expect_query("FRUIT_NAME").return_rows(rows(&["Mango", "Apple", "Kiwi"]));

        let mut session = session(&mock);
        let first = session.refresh().await;
        let second = session.refresh().await;

        assert!(first.connected);
        assert_eq!(first.ingredients.names(), ["Apple", "Kiwi", "Mango"]);
        assert_eq!(second.ingredients, first.ingredients);
        assert!(first.feedback.is_empty());
        assert_eq!(session.state(), &SessionState::Idle);
        assert_eq!(mock.connects(), 1);
        mock.verify();
    }

    #[tokio::test]
    async fn test_connect_failure_shows_raw_error_and_blocks_submit() {
        let mock = MockStore::new();
        mock.refuse_connections("Incorrect username or password was specified.");

        let mut session = session(&mock);
        let view = session.submit("Sam".into(), names(&["Apple"])).await;

        assert!(!view.connected);
        assert!(view.ingredients.is_empty());
        assert_eq!(
            view.feedback,
            vec![
                Feedback::Error(
                    "Could not connect to the order store: Incorrect username or password was specified."
                        .into()
                ),
                Feedback::Error("Not connected to the order store.".into()),
            ]
        );
        assert!(matches!(session.state(), SessionState::Disconnected(_)));
        assert!(mock.statements().is_empty());
    }

    #[tokio::test]
    async fn test_reload_retries_failed_connection() {
        let mock = MockStore::new();
        mock.refuse_connections("warehouse suspended");
        let mut session = session(&mock);
        assert!(!session.refresh().await.connected);

        mock.accept_connections();
        mock.expect_probe();
        mock.expect_query("FRUIT_NAME").return_rows(rows(&["Apple"]));
        let view = session.refresh().await;

        assert!(view.connected);
        assert_eq!(mock.connects(), 2);
        mock.verify();
    }

    #[tokio::test]
    async fn test_catalog_failure_is_a_visible_warning() {
        let mock = MockStore::new();
        mock.expect_probe();
        mock.expect_query("FRUIT_NAME").return_err("no such table: FRUIT_OPTIONS");

        let mut session = session(&mock);
        let view = session.refresh().await;

        assert!(view.connected);
        assert!(view.ingredients.is_empty());
        assert_eq!(
            view.feedback,
            vec![Feedback::Warning("Could not load ingredients: no such table: FRUIT_OPTIONS".into())]
        );
        mock.verify();
    }

    #[tokio::test]
    async fn test_validation_errors_keep_form_values() {
        let mock = MockStore::new();
        mock.expect_probe();
        mock.expect_query("FRUIT_NAME").return_rows(rows(&["Apple"]));

        let mut session = session(&mock);
        let view = session.submit("   ".into(), names(&["Apple"])).await;
        assert_eq!(view.feedback, vec![Feedback::Error("Please enter a name for your smoothie.".into())]);
        assert_eq!(view.selected, names(&["Apple"]));

        let view = session.submit("Sam".into(), Vec::new()).await;
        assert_eq!(view.feedback, vec![Feedback::Error("Please choose at least one ingredient.".into())]);
        assert_eq!(view.name_on_order, "Sam");
        mock.verify();
    }

    #[tokio::test]
    async fn test_too_many_and_unknown_ingredients_never_reach_store() {
        let mock = MockStore::new();
        mock.expect_probe();
        mock.expect_query("FRUIT_NAME").return_rows(rows(&["A", "B", "C", "D", "E", "F"]));

        let mut session = session(&mock);
        let view = session.submit("Sam".into(), names(&["A", "B", "C", "D", "E", "F"])).await;
        assert_eq!(view.feedback, vec![Feedback::Error("Choose at most 5 ingredients (6 selected).".into())]);

        let view = session.submit("Sam".into(), names(&["A", "Z"])).await;
        assert_eq!(view.feedback, vec![Feedback::Error("\"Z\" is not on the ingredient list.".into())]);

        assert_eq!(mock.statements().len(), 2);
        mock.verify();
    }

    #[tokio::test]
    async fn test_repeated_ingredient_never_reaches_store() {
        let mock = MockStore::new();
        mock.expect_probe();
        mock.expect_query("FRUIT_NAME").return_rows(rows(&["Kiwi"]));

        let mut session = session(&mock);
        let view = session.submit("Jo".into(), vec!["Kiwi".to_string(); 5]).await;

        assert_eq!(view.feedback, vec![Feedback::Error("\"Kiwi\" was chosen more than once.".into())]);
        assert_eq!(view.selected, vec!["Kiwi".to_string(); 5]);
        assert!(mock.statements().iter().all(|s| !s.sql.contains("INSERT")));
        assert_eq!(session.state(), &SessionState::Idle);
        mock.verify();
    }

    #[tokio::test]
    async fn test_submit_without_catalog_says_list_is_unavailable() {
        let mock = MockStore::new();
        mock.expect_probe();
        mock.expect_query("FRUIT_NAME").return_err("no such table: FRUIT_OPTIONS");

        let mut session = session(&mock);
        let view = session.submit("Jo".into(), names(&["Kiwi"])).await;

        assert_eq!(
            view.feedback,
            vec![
                Feedback::Warning("Could not load ingredients: no such table: FRUIT_OPTIONS".into()),
                Feedback::Error("The ingredient list is unavailable. Reload the page and try again.".into()),
            ]
        );
        assert!(mock.statements().iter().all(|s| !s.sql.contains("INSERT")));
        mock.verify();
    }

    #[tokio::test]
    async fn test_successful_submit_persists_and_clears_form() {
        let mock = MockStore::new();
        mock.expect_probe();
        mock.expect_query("FRUIT_NAME").return_rows(rows(&["Apple", "Kiwi", "Mango"]));
        mock.expect_execute("INSERT INTO ORDERS").return_ok(1);

        let mut session = session(&mock);
        let view = session.submit("Jo".into(), names(&["Kiwi", "Apple"])).await;

        assert_eq!(view.feedback, vec![Feedback::Success("Your Smoothie is ordered, Jo! ✅".into())]);
        assert!(view.name_on_order.is_empty());
        assert!(view.selected.is_empty());
        assert_eq!(session.state(), &SessionState::Idle);

        let insert = mock.statements().pop().unwrap();
        assert_eq!(insert.params, vec![Value::from("Kiwi Apple"), Value::from("Jo")]);
        mock.verify();
    }

    #[tokio::test]
    async fn test_store_failure_is_reported_without_retry() {
        let mock = MockStore::new();
        mock.expect_probe();
        mock.expect_query("FRUIT_NAME").return_rows(rows(&["Apple"]));
        mock.expect_execute("INSERT").return_err("Object 'ORDERS' does not exist");

        let mut session = session(&mock);
        let view = session.submit("Sam".into(), names(&["Apple"])).await;

        assert_eq!(
            view.feedback,
            vec![Feedback::Error("Order failed: Object 'ORDERS' does not exist".into())]
        );
        assert_eq!(view.name_on_order, "Sam");
        assert_eq!(session.state(), &SessionState::Idle);
        mock.verify();
    }
}
