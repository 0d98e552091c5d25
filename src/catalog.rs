//! # Catalog Loader
//!
//! Reads the set of selectable ingredient names and keeps a snapshot for a
//! bounded time.
//!
//! The snapshot is normalised on load: null and empty cells are dropped,
//! numbers are rendered as text (reals keep their fractional part), duplicates are removed and the result is
//! sorted ascending. A failed load is never cached.

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::gateway::{GatewayError, StoreClient, Value, CATALOG_COLUMN};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CatalogError {
    #[error("{0}")]
    Load(#[from] GatewayError),
}

/// Ordered, deduplicated ingredient names.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngredientCatalog(Vec<String>);

impl IngredientCatalog {
    /// Normalises raw cells into a catalog.
    pub fn from_values(values: impl IntoIterator<Item = Value>) -> Self {
        let names: BTreeSet<String> = values
            .into_iter()
            .filter_map(|value| match value {
                Value::Null => None,
                Value::Text(s) => Some(s),
                Value::Integer(i) => Some(i.to_string()),
                Value::Real(r) => Some(format!("{r:?}")),
            })
            .filter(|name| !name.is_empty())
            .collect();
        Self(names.into_iter().collect())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.binary_search_by(|probe| probe.as_str().cmp(name)).is_ok()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }
}

/// Queries the catalog table once, bypassing any cache.
#[instrument(skip(client))]
pub async fn load_ingredients(client: &StoreClient, table: &str) -> Result<IngredientCatalog, CatalogError> {
    let sql = format!("SELECT {CATALOG_COLUMN} FROM {table}");
    let rows = client.query(&sql, Vec::new()).await?;
    let raw = rows.len();
    let catalog = IngredientCatalog::from_values(rows.into_iter().filter_map(|row| row.into_iter().next()));
    info!(raw, ingredients = catalog.len(), "Loaded ingredient catalog");
    Ok(catalog)
}

struct Snapshot {
    catalog: IngredientCatalog,
    expires_at: Instant,
}

/// Time-bounded cache in front of [`load_ingredients`].
pub struct CatalogCache {
    ttl: Duration,
    snapshot: Option<Snapshot>,
}

impl CatalogCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, snapshot: None }
    }

    /// The cached catalog if it is still fresh at `now`.
    pub fn get(&self, now: Instant) -> Option<&IngredientCatalog> {
        self.snapshot
            .as_ref()
            .filter(|snapshot| now < snapshot.expires_at)
            .map(|snapshot| &snapshot.catalog)
    }

    pub async fn get_or_load(&mut self, client: &StoreClient, table: &str) -> Result<IngredientCatalog, CatalogError> {
        self.get_or_load_at(client, table, Instant::now()).await
    }

    /// Returns the snapshot fresh at `now`, reloading it when expired.
    pub async fn get_or_load_at(
        &mut self,
        client: &StoreClient,
        table: &str,
        now: Instant,
    ) -> Result<IngredientCatalog, CatalogError> {
        if let Some(catalog) = self.get(now) {
            debug!(ingredients = catalog.len(), "Catalog cache hit");
            return Ok(catalog.clone());
        }

        match load_ingredients(client, table).await {
            Ok(catalog) => {
                self.snapshot = Some(Snapshot {
                    catalog: catalog.clone(),
                    expires_at: now + self.ttl,
                });
                Ok(catalog)
            }
            Err(e) => {
                warn!(error = %e, "Catalog load failed");
                self.snapshot = None;
                Err(e)
            }
        }
    }

    pub fn invalidate(&mut self) {
        self.snapshot = None;
    }
}
