//! MySQL dialect: native type table and metadata fetch strategies.

pub mod meta;
pub mod types;

pub use meta::{MySqlMetadata, MIN_SINGLE_PASS};
