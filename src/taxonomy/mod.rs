//! Catalog taxonomy retrieval
//!
//! Fetches the department tree from the catalog API and flattens it into a
//! pre-order stream of departments.

mod client;
mod parser;

pub use client::TaxonomyClient;
pub use parser::{parse_taxonomy, parse_taxonomy_value, DepartmentIter};
