//! tasker-core: the data and query engine behind `tk`.
//!
//! # Conventions
//!
//! - **Errors**: internals return `anyhow::Result`; the store boundary logs
//!   faults and returns `None`/`false`/empty. Only opening the database
//!   yields a typed [`error::StoreError`].
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `error!`, `debug!`).

pub mod analytics;
pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod query;
pub mod report;
pub mod store;
pub mod tracker;

pub use tracker::Tracker;
