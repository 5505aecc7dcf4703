//! Deptsync - catalog taxonomy sync
//!
//! Fetches the department tree from the catalog taxonomy API, flattens it
//! in pre-order and inserts every department that is not stored yet.

pub mod config;
pub mod db;
pub mod department;
pub mod entity;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod store;
pub mod taxonomy;

// Re-export commonly used types
pub use config::Config;
pub use department::{Department, DepartmentUpdate};
pub use error::{AppError, AppResult};
pub use store::{DepartmentStore, InsertOutcome};
pub use taxonomy::TaxonomyClient;
