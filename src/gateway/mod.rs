//! DataStore Gateway: one shared connection to the backing relational store.
//!
//! # Main Components
//!
//! - [`Backend`] - Synchronous driver contract
//! - [`StoreActor`] - Task owning the live connection
//! - [`StoreClient`] - Cloneable handle exposing `query` and `execute`
//! - [`Connector`] - Seam used by the session to (re-)establish connections
//!
//! # Testing
//!
//! See [`mock`] module for a scripted store that needs no database.

pub mod core;
pub mod mock;
pub mod sqlite;

pub use self::core::*;
pub use self::sqlite::{SqliteBackend, CATALOG_COLUMN};

use async_trait::async_trait;
use tracing::instrument;

use crate::config::StoreConfig;

/// Something that can produce a live, probed [`StoreClient`].
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<StoreClient, GatewayError>;
}

/// Opens the configured SQLite store and probes it.
#[instrument(skip(config), fields(path = %config.path))]
pub async fn connect(config: &StoreConfig) -> Result<StoreClient, GatewayError> {
    let config = config.clone();
    connect_backend(move || SqliteBackend::open(&config)).await
}

#[async_trait]
impl Connector for StoreConfig {
    async fn connect(&self) -> Result<StoreClient, GatewayError> {
        connect(self).await
    }
}
