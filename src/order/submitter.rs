//! Order Submitter: persists a validated draft as one insert statement.

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use super::{OrderDraft, OrderRecord};
use crate::gateway::{GatewayError, StoreClient, Value};

/// How order values reach the insert statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsertMode {
    /// Values are bound as statement parameters.
    #[default]
    Bound,
    /// Values are embedded as quoted literals via [`escape_literal`].
    Literal,
}

/// Persistence failed; carries the raw store message.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SubmissionError {
    #[error("{0}")]
    Execution(#[from] GatewayError),
}

impl SubmissionError {
    pub fn is_disconnect(&self) -> bool {
        match self {
            SubmissionError::Execution(e) => e.is_disconnect(),
        }
    }
}

/// Doubles every single quote so `s` is safe inside a `'...'` literal.
pub fn escape_literal(s: &str) -> String {
    s.replace('\'', "''")
}

/// Builds the insert statement and its parameters for `record`.
pub fn insert_statement(table: &str, record: &OrderRecord, mode: InsertMode) -> (String, Vec<Value>) {
    match mode {
        InsertMode::Bound => (
            format!("INSERT INTO {table} (INGREDIENTS, NAME_ON_ORDER) VALUES (?1, ?2)"),
            vec![
                Value::Text(record.ingredients.clone()),
                Value::Text(record.name_on_order.clone()),
            ],
        ),
        InsertMode::Literal => (
            format!(
                "INSERT INTO {table} (INGREDIENTS, NAME_ON_ORDER) VALUES ('{}', '{}')",
                escape_literal(&record.ingredients),
                escape_literal(&record.name_on_order),
            ),
            Vec::new(),
        ),
    }
}

pub struct OrderSubmitter<'a> {
    client: &'a StoreClient,
    orders_table: &'a str,
    mode: InsertMode,
}

impl<'a> OrderSubmitter<'a> {
    pub fn new(client: &'a StoreClient, orders_table: &'a str, mode: InsertMode) -> Self {
        Self { client, orders_table, mode }
    }

    /// Writes one order row. No retry on failure.
    #[instrument(skip(self, draft), fields(mode = ?self.mode))]
    pub async fn submit(&self, draft: &OrderDraft) -> Result<OrderRecord, SubmissionError> {
        let record = OrderRecord::from(draft);
        debug!(?record, "submit called");

        let (sql, params) = insert_statement(self.orders_table, &record, self.mode);
        match self.client.execute(&sql, params).await {
            Ok(_) => {
                info!(name_on_order = %record.name_on_order, "Order persisted");
                Ok(record)
            }
            Err(e) => {
                warn!(error = %e, "Order insert failed");
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::mock::MockStore;

    fn record(ingredients: &str, name: &str) -> OrderRecord {
        OrderRecord {
            ingredients: ingredients.to_string(),
            name_on_order: name.to_string(),
        }
    }

    #[test]
    fn test_escape_doubles_quotes() {
        assert_eq!(escape_literal("O'Brien"), "O''Brien");
        assert_eq!(escape_literal("''"), "''''");
        assert_eq!(escape_literal("Kiwi"), "Kiwi");
    }

    #[test]
    fn test_literal_statement_embeds_escaped_values() {
        let (sql, params) = insert_statement("ORDERS", &record("Apple", "O'Brien"), InsertMode::Literal);
        assert_eq!(
            sql,
            "INSERT INTO ORDERS (INGREDIENTS, NAME_ON_ORDER) VALUES ('Apple', 'O''Brien')"
        );
        assert!(params.is_empty());
    }

    #[test]
    fn test_bound_statement_keeps_values_out_of_sql() {
        let (sql, params) = insert_statement("ORDERS", &record("Apple", "O'Brien"), InsertMode::Bound);
        assert!(!sql.contains("O'Brien"));
        assert_eq!(params, vec![Value::Text("Apple".into()), Value::Text("O'Brien".into())]);
    }

    #[tokio::test]
    async fn test_submit_persists_joined_ingredients() {
        let mock = MockStore::new();
        mock.expect_execute("INSERT INTO ORDERS").return_ok(1);
        let client = mock.client().await.unwrap();

        let draft = OrderDraft::new(" Sam ", vec!["Apple".into(), "Banana".into()]);
        let persisted = OrderSubmitter::new(&client, "ORDERS", InsertMode::Bound)
            .submit(&draft)
            .await
            .unwrap();

        assert_eq!(persisted, record("Apple Banana", "Sam"));
        assert_eq!(
            mock.statements()[0].params,
            vec![Value::Text("Apple Banana".into()), Value::Text("Sam".into())]
        );
        mock.verify();
    }

    #[tokio::test]
    async fn test_submit_failure_carries_store_message() {
        let mock = MockStore::new();
        mock.expect_execute("INSERT").return_err("insufficient privileges on ORDERS");
        let client = mock.client().await.unwrap();

        let draft = OrderDraft::new("Sam", vec!["Apple".into()]);
        let err = OrderSubmitter::new(&client, "ORDERS", InsertMode::Literal)
            .submit(&draft)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "insufficient privileges on ORDERS");
        assert!(!err.is_disconnect());
        mock.verify();
    }
}
