//! # Mock Store
//!
//! Utilities for testing catalog, submission and session logic without a
//! database.
//!
//! A [`MockStore`] holds an ordered queue of expected statements. Each
//! expectation names a SQL fragment the incoming statement must contain and
//! the response to hand back. Every statement the backend sees is recorded
//! so tests can assert on generated SQL and bound parameters.
//!
//! ```ignore
//! let mock = MockStore::new();
//! mock.expect_probe();
//! mock.expect_query("FRUIT_NAME").return_rows(vec![vec!["Kiwi".into()]]);
//!
//! let client = mock.connect().await?;
//! // Use client in tests...
//! mock.verify(); // Ensures all expectations were met
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::core::{connect_backend, Backend, GatewayError, Row, StoreActor, StoreClient, Value, LIVENESS_PROBE};
use super::Connector;

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

enum Expectation {
    Query {
        fragment: String,
        response: Result<Vec<Row>, String>,
    },
    Execute {
        fragment: String,
        response: Result<usize, String>,
    },
}

/// A statement observed by the mock backend.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedStatement {
    pub sql: String,
    pub params: Vec<Value>,
}

#[derive(Default)]
struct MockState {
    expectations: VecDeque<Expectation>,
    statements: Vec<RecordedStatement>,
    mismatches: Vec<String>,
    refuse_with: Option<String>,
    connects: usize,
}

/// A scripted store with expectation tracking.
#[derive(Clone, Default)]
pub struct MockStore {
    state: Arc<Mutex<MockState>>,
}

impl MockStore {
    /// Creates a new mock store with no expectations.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Expects a read statement containing `fragment`.
    pub fn expect_query(&self, fragment: &str) -> QueryExpectationBuilder {
        QueryExpectationBuilder {
            fragment: fragment.to_string(),
            store: self.clone(),
        }
    }

    /// Expects a write statement containing `fragment`.
    pub fn expect_execute(&self, fragment: &str) -> ExecuteExpectationBuilder {
        ExecuteExpectationBuilder {
            fragment: fragment.to_string(),
            store: self.clone(),
        }
    }

    /// Expects a successful liveness probe.
    pub fn expect_probe(&self) {
        self.expect_query(LIVENESS_PROBE)
            .return_rows(vec![vec![Value::Integer(1)]]);
    }

    /// Makes subsequent [`Connector::connect`] calls fail with `message`.
    pub fn refuse_connections(&self, message: &str) {
        self.lock().refuse_with = Some(message.to_string());
    }

    /// Lets connections through again.
    pub fn accept_connections(&self) {
        self.lock().refuse_with = None;
    }

    /// Number of connection attempts seen, successful or not.
    pub fn connects(&self) -> usize {
        self.lock().connects
    }

    /// A backend sharing this store's script.
    pub fn backend(&self) -> MockBackend {
        MockBackend { store: self.clone() }
    }

    /// Starts a store actor over this script without running the probe.
    pub async fn client(&self) -> Result<StoreClient, GatewayError> {
        let backend = self.backend();
        StoreActor::spawn(move || Ok(backend)).await
    }

    /// Every statement seen so far, in order.
    pub fn statements(&self) -> Vec<RecordedStatement> {
        self.lock().statements.clone()
    }

    /// Verifies that all expectations were met and no statement was unexpected.
    pub fn verify(&self) {
        let state = self.lock();
        if !state.mismatches.is_empty() {
            panic!("Unexpected statements: {:?}", state.mismatches);
        }
        if !state.expectations.is_empty() {
            panic!("Not all expectations were met. {} remaining", state.expectations.len());
        }
    }

    fn push(&self, expectation: Expectation) {
        self.lock().expectations.push_back(expectation);
    }
}

#[async_trait]
impl Connector for MockStore {
    async fn connect(&self) -> Result<StoreClient, GatewayError> {
        let refused = {
            let mut state = self.lock();
            state.connects += 1;
            state.refuse_with.clone()
        };
        if let Some(message) = refused {
            return Err(GatewayError::Connectivity(message));
        }
        let backend = self.backend();
        connect_backend(move || Ok(backend)).await
    }
}

/// Builder for query expectations.
pub struct QueryExpectationBuilder {
    fragment: String,
    store: MockStore,
}

impl QueryExpectationBuilder {
    /// Sets the expectation to return rows.
    pub fn return_rows(self, rows: Vec<Row>) {
        self.store.push(Expectation::Query {
            fragment: self.fragment,
            response: Ok(rows),
        });
    }

    /// Sets the expectation to fail with a driver message.
    pub fn return_err(self, message: &str) {
        self.store.push(Expectation::Query {
            fragment: self.fragment,
            response: Err(message.to_string()),
        });
    }
}

/// Builder for execute expectations.
pub struct ExecuteExpectationBuilder {
    fragment: String,
    store: MockStore,
}

impl ExecuteExpectationBuilder {
    /// Sets the expectation to report `affected` rows.
    pub fn return_ok(self, affected: usize) {
        self.store.push(Expectation::Execute {
            fragment: self.fragment,
            response: Ok(affected),
        });
    }

    /// Sets the expectation to fail with a driver message.
    pub fn return_err(self, message: &str) {
        self.store.push(Expectation::Execute {
            fragment: self.fragment,
            response: Err(message.to_string()),
        });
    }
}

// =============================================================================
// BACKEND
// =============================================================================

/// [`Backend`] answering from a [`MockStore`] script.
pub struct MockBackend {
    store: MockStore,
}

impl MockBackend {
    fn answer<T>(
        &mut self,
        sql: &str,
        params: &[Value],
        pick: impl FnOnce(Expectation) -> Result<(String, Result<T, String>), Expectation>,
    ) -> Result<T, String> {
        let mut state = self.store.lock();
        state.statements.push(RecordedStatement {
            sql: sql.to_string(),
            params: params.to_vec(),
        });

        let Some(next) = state.expectations.pop_front() else {
            state.mismatches.push(sql.to_string());
            return Err(format!("unexpected statement: {sql}"));
        };

        match pick(next) {
            Ok((fragment, response)) if sql.contains(&fragment) => response,
            Ok((fragment, _)) => {
                state.mismatches.push(format!("expected {fragment:?}, got {sql:?}"));
                Err(format!("unexpected statement: {sql}"))
            }
            Err(other) => {
                state.expectations.push_front(other);
                state.mismatches.push(format!("wrong statement kind: {sql}"));
                Err(format!("unexpected statement: {sql}"))
            }
        }
    }
}

impl Backend for MockBackend {
    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>, String> {
        self.answer(sql, params, |exp| match exp {
            Expectation::Query { fragment, response } => Ok((fragment, response)),
            other => Err(other),
        })
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<usize, String> {
        self.answer(sql, params, |exp| match exp {
            Expectation::Execute { fragment, response } => Ok((fragment, response)),
            other => Err(other),
        })
    }
}
