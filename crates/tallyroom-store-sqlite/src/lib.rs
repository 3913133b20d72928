//! SQLite backend for the Tallyroom results store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Ingestion and rollback each run as a
//! single closure on that thread, inside one `rusqlite` transaction.

mod encode;
mod ingest;
mod query;
mod rollback;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
