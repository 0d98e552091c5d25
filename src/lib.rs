#![doc(html_logo_url = "https://www.rust-lang.org/logos/rust-logo-128x128.png")]
#![doc(html_favicon_url = "https://www.rust-lang.org/favicon.ico")]
//! # Smoothie Order
//!
//! > **A single-page smoothie order form backed by a relational store.**
//!
//! A user picks a display name and up to five ingredients from a catalog,
//! submits, and one row is appended to the orders table.
//!
//! ## 🏗️ Design
//!
//! ### One connection, owned by an actor
//! Store drivers are blocking and their connections are rarely `Sync`. The
//! connection is moved into a [`StoreActor`](gateway::StoreActor) running on
//! a blocking thread; everything else talks to it through a cloneable
//! [`StoreClient`](gateway::StoreClient). No locks around the connection.
//!
//! ### Explicit session state
//! The live connection and the catalog cache are fields of a single
//! [`SessionContext`](session::SessionContext), not globals. Each page load
//! or submit is one pass through it, behind one async mutex.
//!
//! ### Errors become messages
//! Each component has its own `thiserror` enum. The session turns every
//! failure into a [`Feedback`](session::Feedback) for the page; nothing is
//! fatal and nothing is retried automatically.
//!
//! ## 🗺️ Module Tour
//!
//! - [`gateway`]: DataStore Gateway (`connect`, `query`, `execute`, liveness probe).
//! - [`catalog`]: Catalog Loader with a TTL cache.
//! - [`order`]: Draft/record model, input binding, Order Validator, Order Submitter.
//! - [`session`]: Session context and state machine.
//! - [`web`]: Presentation Layer (axum routes, tera page).
//! - [`config`]: TOML configuration.
//! - [`lifecycle`]: Tracing setup and the service runner.
//!
//! ## 🚀 Running
//!
//! ```bash
//! SMOOTHIE_CONFIG=smoothie.toml RUST_LOG=info cargo run
//! ```
//!
//! ### Running Tests
//!
//! ```bash
//! cargo test
//! ```

pub mod catalog;
pub mod config;
pub mod gateway;
pub mod lifecycle;
pub mod order;
pub mod session;
pub mod web;
