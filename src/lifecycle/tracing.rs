//! # Observability & Tracing
//!
//! [`setup_tracing`] initializes structured logging with the `tracing` crate.
//! Verbosity is controlled by `RUST_LOG`:
//!
//! ```bash
//! RUST_LOG=info cargo run      # connections, catalog loads, orders
//! RUST_LOG=debug cargo run     # every statement and form payload
//! RUST_LOG=smoothie_order::gateway=debug cargo run
//! ```
//!
//! A typical order at `info` level:
//!
//! ```text
//! INFO Store actor started backend_type="SqliteBackend"
//! INFO Store connection established
//! INFO Session state changed from=Disconnected("not connected yet") to=Idle
//! INFO refresh: Loaded ingredient catalog raw=3 ingredients=3
//! INFO Session state changed from=Idle to=Submitting
//! INFO Execute ok backend_type="SqliteBackend" affected=1
//! INFO submit: Order persisted name_on_order=Jo
//! ```
//!
//! Store credentials are never logged; [`StoreConfig`](crate::config::StoreConfig)
//! redacts the password in its `Debug` output.

/// Initializes the global subscriber.
///
/// Uses the compact format without module paths and an `EnvFilter` read
/// from `RUST_LOG` (default `info`).
pub fn setup_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
