//! Metadata reconstruction for SQL statements.
//!
//! Database wire protocols that do not ship column metadata with their
//! result sets leave clients to rebuild it themselves. This crate does
//! that rebuild: it decomposes a statement's text into the tables and
//! columns it references, introspects the server's catalog through a
//! caller-supplied [`Executor`], and returns one [`FieldDescriptor`] per
//! result column or `?` parameter, in the order the statement asked for
//! them.
//!
//! The decomposer is heuristic by design. It understands ordinary
//! SELECT/INSERT/UPDATE/DELETE shapes and degrades gracefully on the
//! rest; it is not a SQL grammar.

use std::fmt;

mod assemble;

pub mod error;
pub mod executor;
pub mod field;
pub mod mock;
pub mod mysql;
pub mod normalize;
pub mod parse;
pub mod placeholders;
pub mod postgres;
pub mod registry;
pub mod types;

pub use error::{Error, Result};
pub use executor::{BatchResults, Executor, RowSet};
pub use field::{FieldDescriptor, FieldFlags, FieldKind, ParamMode};
pub use parse::{decompose, ParsedStatement, StatementKind};
pub use types::PortableType;

/// The SQL dialects the pipeline can introspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    MySql,
    Postgres,
}

/// A server version, ordered component-wise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ServerVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl ServerVersion {
    /// Parse a reported version string, tolerating vendor suffixes
    /// (`5.1.45-community-log`, `8.0.32-0ubuntu0.22.04.1`). Missing
    /// components read as zero.
    pub fn parse(raw: &str) -> Self {
        let mut parts = raw
            .split(|c: char| !c.is_ascii_digit())
            .filter(|s| !s.is_empty())
            .map(|s| s.parse().unwrap_or(0));

        Self {
            major: parts.next().unwrap_or(0),
            minor: parts.next().unwrap_or(0),
            patch: parts.next().unwrap_or(0),
        }
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Dialect-dispatched entry point, its strategy fixed at construction.
///
/// Construct one per connection once the server's version is known, then
/// reuse it for every statement on that connection.
#[derive(Debug, Clone)]
pub struct MetadataFetcher {
    inner: Inner,
}

#[derive(Debug, Clone)]
enum Inner {
    MySql(mysql::MySqlMetadata),
    Postgres(postgres::PgMetadata),
}

impl MetadataFetcher {
    pub fn new(dialect: Dialect, server_version: &str) -> Result<Self> {
        let version = ServerVersion::parse(server_version);
        let inner = match dialect {
            Dialect::MySql => Inner::MySql(mysql::MySqlMetadata::new(version)),
            Dialect::Postgres => Inner::Postgres(postgres::PgMetadata::new(version)?),
        };
        Ok(Self { inner })
    }

    /// Describe the result columns of `sql`, in the statement's order.
    pub fn result_fields(
        &self,
        executor: &mut dyn Executor,
        sql: &str,
    ) -> Result<Vec<FieldDescriptor>> {
        match &self.inner {
            Inner::MySql(m) => m.result_fields(executor, sql),
            Inner::Postgres(p) => p.result_fields(executor, sql),
        }
    }

    /// Describe the column behind each `?` marker of `sql`, in marker
    /// order.
    pub fn param_fields(
        &self,
        executor: &mut dyn Executor,
        sql: &str,
    ) -> Result<Vec<FieldDescriptor>> {
        match &self.inner {
            Inner::MySql(m) => m.param_fields(executor, sql),
            Inner::Postgres(p) => p.param_fields(executor, sql),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_parsing_tolerates_suffixes() {
        let v = ServerVersion::parse("5.1.45-community-log");
        assert_eq!((v.major, v.minor, v.patch), (5, 1, 45));

        let v = ServerVersion::parse("8.0.32-0ubuntu0.22.04.1");
        assert_eq!((v.major, v.minor, v.patch), (8, 0, 32));

        let v = ServerVersion::parse("7.4");
        assert_eq!((v.major, v.minor, v.patch), (7, 4, 0));
    }

    #[test]
    fn versions_order_component_wise() {
        assert!(ServerVersion::parse("5.0.0") > ServerVersion::parse("4.99.99"));
        assert!(ServerVersion::parse("7.4.0") > ServerVersion::parse("7.3.20"));
        assert_eq!(ServerVersion::parse("5.0"), ServerVersion::parse("5.0.0"));
    }

    #[test]
    fn postgres_version_gate_applies_at_construction() {
        assert!(MetadataFetcher::new(Dialect::Postgres, "7.3.2").is_err());
        assert!(MetadataFetcher::new(Dialect::Postgres, "9.2.4").is_ok());
        // mysql has no hard minimum, only a strategy split
        assert!(MetadataFetcher::new(Dialect::MySql, "3.23.58").is_ok());
    }
}
