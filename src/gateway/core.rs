//! # Store Actor
//!
//! This module defines the building blocks of the DataStore Gateway.
//!
//! ## Key Types
//!
//! - [`Backend`]: The synchronous driver contract (SQLite, mock, ...).
//! - [`StoreActor`]: The task that owns the one live connection.
//! - [`StoreClient`]: The cloneable handle used by the rest of the service.
//! - [`GatewayError`]: Connectivity, query and execution failures.

use std::fmt;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, instrument, warn};

/// Trivial statement used to confirm a fresh connection is usable.
pub const LIVENESS_PROBE: &str = "SELECT 1";

/// Default channel capacity between clients and the store actor.
const STORE_BUFFER: usize = 32;

// =============================================================================
// 1. THE ABSTRACTION (Values, Rows, Backend)
// =============================================================================

/// A single cell returned by (or bound into) a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Real(r) => write!(f, "{r}"),
            Value::Text(s) => write!(f, "{s}"),
        }
    }
}

/// One tabular result row, in projection order.
pub type Row = Vec<Value>;

/// Driver contract for a relational store.
///
/// # Architecture Note
/// Store drivers are blocking and their connections are usually not `Sync`.
/// Rather than wrapping the connection in a `Mutex`, the backend is *moved*
/// into a [`StoreActor`] running on a blocking thread, and every caller talks
/// to it through messages. The actor is the only owner of the connection.
///
/// Errors are reported as the raw driver message so they can be shown to the
/// user verbatim.
pub trait Backend: Send + 'static {
    /// Read-only execution returning tabular rows.
    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>, String>;

    /// Write execution returning the number of affected rows.
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<usize, String>;
}

// =============================================================================
// 2. THE MESSAGES & ERRORS
// =============================================================================

/// Errors surfaced by the gateway.
///
/// The display form of the driver-backed variants is the raw driver message.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum GatewayError {
    /// Opening the connection or the liveness probe failed.
    #[error("{0}")]
    Connectivity(String),
    #[error("{0}")]
    Query(String),
    #[error("{0}")]
    Execution(String),
    #[error("store connection closed")]
    ActorClosed,
    #[error("store connection dropped the response")]
    ActorDropped,
}

impl GatewayError {
    /// True when the connection handle itself is gone and must be re-created.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, GatewayError::ActorClosed | GatewayError::ActorDropped)
    }
}

/// Type alias for the one-shot response channel used by the store actor.
pub type Response<T> = oneshot::Sender<Result<T, GatewayError>>;

/// Requests understood by the store actor.
#[derive(Debug)]
pub enum StoreRequest {
    Query {
        sql: String,
        params: Vec<Value>,
        respond_to: Response<Vec<Row>>,
    },
    Execute {
        sql: String,
        params: Vec<Value>,
        respond_to: Response<usize>,
    },
}

// =============================================================================
// 3. THE ACTOR SERVER
// =============================================================================

/// The actor owning the single live connection.
///
/// **Concurrency Model**:
/// Messages are processed strictly one at a time on a dedicated blocking
/// thread, so each statement runs to completion before the next starts.
pub struct StoreActor<B: Backend> {
    receiver: mpsc::Receiver<StoreRequest>,
    backend: B,
}

impl<B: Backend> StoreActor<B> {
    /// Opens a backend on a blocking thread and starts the actor there.
    ///
    /// `open` runs on the actor thread, so the backend never crosses threads
    /// after construction. An `open` failure is reported as
    /// [`GatewayError::Connectivity`].
    pub async fn spawn<F>(open: F) -> Result<StoreClient, GatewayError>
    where
        F: FnOnce() -> Result<B, String> + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel(STORE_BUFFER);
        let (ready_tx, ready_rx) = oneshot::channel();

        tokio::task::spawn_blocking(move || match open() {
            Ok(backend) => {
                let _ = ready_tx.send(Ok(()));
                StoreActor { receiver, backend }.run();
            }
            Err(e) => {
                let _ = ready_tx.send(Err(GatewayError::Connectivity(e)));
            }
        });

        ready_rx.await.map_err(|_| GatewayError::ActorDropped)??;
        Ok(StoreClient::new(sender))
    }

    /// Runs the actor's loop, processing messages until every client is dropped.
    fn run(mut self) {
        let backend_type = std::any::type_name::<B>()
            .split("::")
            .last()
            .unwrap_or("Unknown");
        info!(backend_type, "Store actor started");

        let mut statements = 0usize;
        while let Some(msg) = self.receiver.blocking_recv() {
            statements += 1;
            match msg {
                StoreRequest::Query { sql, params, respond_to } => {
                    debug!(backend_type, %sql, params = params.len(), "Query");
                    let result = self
                        .backend
                        .query(&sql, &params)
                        .map_err(GatewayError::Query);
                    match &result {
                        Ok(rows) => debug!(backend_type, rows = rows.len(), "Query ok"),
                        Err(e) => warn!(backend_type, error = %e, "Query failed"),
                    }
                    let _ = respond_to.send(result);
                }
                StoreRequest::Execute { sql, params, respond_to } => {
                    debug!(backend_type, %sql, params = params.len(), "Execute");
                    let result = self
                        .backend
                        .execute(&sql, &params)
                        .map_err(GatewayError::Execution);
                    match &result {
                        Ok(affected) => info!(backend_type, affected, "Execute ok"),
                        Err(e) => warn!(backend_type, error = %e, "Execute failed"),
                    }
                    let _ = respond_to.send(result);
                }
            }
        }

        info!(backend_type, statements, "Shutdown");
    }
}

/// Spawns a store actor over `open` and runs the liveness probe against it.
///
/// Bad credentials or an unusable target therefore fail here rather than on
/// first real use.
pub async fn connect_backend<B, F>(open: F) -> Result<StoreClient, GatewayError>
where
    B: Backend,
    F: FnOnce() -> Result<B, String> + Send + 'static,
{
    let client = StoreActor::spawn(open).await?;
    client.ping().await?;
    info!("Store connection established");
    Ok(client)
}

// =============================================================================
// 4. THE CLIENT
// =============================================================================

/// A cloneable handle to the store actor.
#[derive(Debug, Clone)]
pub struct StoreClient {
    sender: mpsc::Sender<StoreRequest>,
}

impl StoreClient {
    pub fn new(sender: mpsc::Sender<StoreRequest>) -> Self {
        Self { sender }
    }

    /// Read-only execution returning tabular rows.
    #[instrument(skip(self, params))]
    pub async fn query(&self, sql: &str, params: Vec<Value>) -> Result<Vec<Row>, GatewayError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(StoreRequest::Query { sql: sql.to_string(), params, respond_to })
            .await
            .map_err(|_| GatewayError::ActorClosed)?;
        response.await.map_err(|_| GatewayError::ActorDropped)?
    }

    /// Single-statement write execution.
    #[instrument(skip(self, params))]
    pub async fn execute(&self, sql: &str, params: Vec<Value>) -> Result<usize, GatewayError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(StoreRequest::Execute { sql: sql.to_string(), params, respond_to })
            .await
            .map_err(|_| GatewayError::ActorClosed)?;
        response.await.map_err(|_| GatewayError::ActorDropped)?
    }

    /// Runs the liveness probe; any failure is a connectivity error.
    pub async fn ping(&self) -> Result<(), GatewayError> {
        self.query(LIVENESS_PROBE, Vec::new())
            .await
            .map(|_| ())
            .map_err(|e| match e {
                GatewayError::Connectivity(msg) => GatewayError::Connectivity(msg),
                other => GatewayError::Connectivity(other.to_string()),
            })
    }

    /// True once the actor has stopped accepting requests.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}
