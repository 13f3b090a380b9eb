//! PostgreSQL dialect: native type table and metadata fetch strategy.

pub mod meta;
pub mod types;

pub use meta::{PgMetadata, MIN_VERSION};
