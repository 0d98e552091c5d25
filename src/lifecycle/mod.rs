//! # Service Lifecycle
//!
//! Starting, serving and stopping the order form.
//!
//! ```rust,ignore
//! setup_tracing();
//! let config = AppConfig::load()?;
//! let service = OrderService::new(&config)?;
//! service.warm_up().await;
//! service.run().await?; // until Ctrl-C
//! ```
//!
//! The store actor is not tied to a task handle: it lives exactly as long
//! as a [`StoreClient`](crate::gateway::StoreClient) does, so dropping the
//! session in [`OrderService::shutdown`] is enough to close the connection.

pub mod service;
pub mod tracing;

pub use self::service::*;
pub use self::tracing::*;
