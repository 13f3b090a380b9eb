//! PostgreSQL metadata fetch strategy.
//!
//! A single batched round trip carries three catalog queries: key
//! membership, index membership and column facts. Servers are free to
//! answer with anywhere from zero to three result sets (a query matching
//! nothing may come back empty or not at all), so the reply is classified
//! by shape, never by position.

use tracing::{debug, warn};

use crate::assemble::{claim_slots, reconcile};
use crate::error::Error;
use crate::executor::{BatchResults, Executor, RowSet};
use crate::field::{FieldDescriptor, FieldFlags, FieldKind};
use crate::parse::{decompose, StatementKind, StatementRefs};
use crate::{Result, ServerVersion};

use super::types;

/// The catalog layout this strategy depends on first appeared in 7.4.
pub const MIN_VERSION: ServerVersion = ServerVersion { major: 7, minor: 4, patch: 0 };

/// PostgreSQL metadata fetcher.
#[derive(Debug, Clone)]
pub struct PgMetadata;

impl PgMetadata {
    pub fn new(server_version: ServerVersion) -> Result<Self> {
        if server_version < MIN_VERSION {
            return Err(Error::UnsupportedServerVersion {
                required: MIN_VERSION.to_string(),
                actual: server_version.to_string(),
            });
        }
        debug!(%server_version, "postgres metadata strategy ready");
        Ok(Self)
    }

    /// Describe the result columns of `sql`, in the statement's own order.
    pub fn result_fields(
        &self,
        executor: &mut dyn Executor,
        sql: &str,
    ) -> Result<Vec<FieldDescriptor>> {
        let stmt = decompose(sql)?;
        if stmt.kind != StatementKind::Select {
            let verb = stmt.sql.split_whitespace().next().unwrap_or_default();
            return Err(Error::UnsupportedStatement(verb.to_owned()));
        }

        let refs = StatementRefs::for_results(&stmt);
        if refs.tables.is_empty() {
            return Err(Error::NoTableFound);
        }

        let fetched = self.fetch_catalog(executor, &refs)?;
        Ok(reconcile(fetched, &refs.request_order))
    }

    /// Describe the columns behind each `?` marker of `sql`, in marker
    /// order.
    pub fn param_fields(
        &self,
        executor: &mut dyn Executor,
        sql: &str,
    ) -> Result<Vec<FieldDescriptor>> {
        let stmt = decompose(sql)?;
        let refs = StatementRefs::for_params(&stmt);
        if refs.tables.is_empty() {
            return Err(Error::NoTableFound);
        }

        let batch: Vec<String> = refs
            .tables
            .iter()
            .map(|(name, _)| attribute_query(name))
            .collect();

        let mut results = executor.execute_batch(&batch)?;
        let mut fields = Vec::new();

        for (table, _) in refs.tables.iter() {
            let attrs = results
                .next_result_set()
                .map(attribute_rows)
                .unwrap_or_default();
            let names: Vec<String> = attrs.iter().map(|a| a.name.clone()).collect();

            let wanted = wanted_for(&refs, table);
            for (idx, name, alias) in claim_slots(&wanted, &names, FieldKind::Parameter) {
                let a = &attrs[idx];
                let mut field = FieldDescriptor::new(FieldKind::Parameter);
                field.set_location("", "", table);
                field.set_names(&a.name, &alias);
                field.set_field_name(&name);

                let mut resolved = types::resolve(&a.type_name);
                let (precision, scale) = decode_typmod(resolved.portable, a.typmod);
                resolved.precision = precision;
                resolved.scale = scale;
                field.set_type(&resolved);

                if !a.not_null {
                    field.set_flags(FieldFlags::NULLABLE);
                }

                fields.push(field);
            }
        }

        Ok(reconcile(fields, &refs.request_order))
    }

    fn fetch_catalog(
        &self,
        executor: &mut dyn Executor,
        refs: &StatementRefs,
    ) -> Result<Vec<FieldDescriptor>> {
        let names: Vec<&str> = refs.tables.iter().map(|(name, _)| name).collect();
        let in_list = quoted_list(&names);

        let batch = vec![
            format!(
                "SELECT tc.table_name, kcu.column_name, tc.constraint_type \
                 FROM information_schema.table_constraints tc \
                 JOIN information_schema.key_column_usage kcu \
                 ON tc.constraint_name = kcu.constraint_name \
                 WHERE tc.table_name IN ({in_list})"
            ),
            format!(
                "SELECT t.relname AS table_name, a.attname AS column_name, \
                 ix.indisunique AS is_unique \
                 FROM pg_class t \
                 JOIN pg_index ix ON t.oid = ix.indrelid \
                 JOIN pg_attribute a ON a.attrelid = t.oid \
                 AND a.attnum = ANY(ix.indkey) \
                 WHERE t.relname IN ({in_list})"
            ),
            format!(
                "SELECT table_schema, table_name, column_name, column_default, \
                 is_nullable, data_type, character_maximum_length, \
                 numeric_precision, numeric_scale \
                 FROM information_schema.columns \
                 WHERE table_name IN ({in_list}) \
                 ORDER BY table_name, ordinal_position"
            ),
        ];

        let results = executor.execute_batch(&batch)?;
        let mut reply = classify_reply(results);

        let Some(mut columns) = reply.columns.take() else {
            warn!("catalog reply held no column facts");
            return Ok(Vec::new());
        };

        // per-table column facts, keyed for the walk below
        let mut by_table: Vec<(String, Vec<ColumnFact>)> = Vec::new();
        while columns.next() {
            let table = columns.get("table_name").unwrap_or_default().to_owned();
            let fact = ColumnFact {
                schema: columns.get("table_schema").unwrap_or_default().to_owned(),
                name: columns.get("column_name").unwrap_or_default().to_owned(),
                default: columns.get("column_default").map(ToOwned::to_owned),
                nullable: columns
                    .get("is_nullable")
                    .is_some_and(|v| v.eq_ignore_ascii_case("YES")),
                declared: columns.get("data_type").unwrap_or_default().to_owned(),
                char_len: columns
                    .get("character_maximum_length")
                    .and_then(|v| v.parse().ok()),
                precision: columns.get("numeric_precision").and_then(|v| v.parse().ok()),
                scale: columns.get("numeric_scale").and_then(|v| v.parse().ok()),
            };
            match by_table.iter_mut().find(|(t, _)| *t == table) {
                Some((_, facts)) => facts.push(fact),
                None => by_table.push((table, vec![fact])),
            }
        }

        let mut fields = Vec::new();
        for (table, _) in refs.tables.iter() {
            let (_, bare) = match table.split_once('.') {
                Some((schema, bare)) => (schema, bare),
                None => ("", table),
            };
            let facts = by_table
                .iter()
                .find(|(t, _)| t.eq_ignore_ascii_case(bare))
                .map(|(_, f)| f.as_slice())
                .unwrap_or_default();
            let names: Vec<String> = facts.iter().map(|f| f.name.clone()).collect();

            let wanted = wanted_for(refs, table);
            for (idx, _, alias) in claim_slots(&wanted, &names, FieldKind::Result) {
                let f = &facts[idx];
                let mut field = FieldDescriptor::new(FieldKind::Result);
                field.set_location("", &f.schema, bare);
                field.set_names(&f.name, &alias);

                let mut resolved = types::resolve(&f.declared);
                if let (Some(p), s) = (f.precision, f.scale.unwrap_or(0)) {
                    resolved.precision = p;
                    resolved.scale = s;
                } else if let Some(len) = f.char_len {
                    resolved.precision = len;
                }
                field.set_type(&resolved);
                if let Some(len) = f.char_len {
                    field.set_length(len);
                }

                field.set_default(f.default.clone());

                let mut flags = FieldFlags::empty();
                if f.nullable {
                    flags |= FieldFlags::NULLABLE;
                }
                flags |= reply.key_flags(bare, &f.name);
                flags |= reply.index_flags(bare, &f.name);
                field.set_flags(flags);

                fields.push(field);
            }
        }

        Ok(fields)
    }
}

/// The classified halves of the batched catalog reply.
#[derive(Debug, Default)]
struct CatalogReply {
    /// (table, column, constraint type)
    keys: Vec<(String, String, String)>,
    /// (table, column, unique)
    indexes: Vec<(String, String, bool)>,
    columns: Option<RowSet>,
}

impl CatalogReply {
    fn key_flags(&self, table: &str, column: &str) -> FieldFlags {
        let mut flags = FieldFlags::empty();
        for (t, c, kind) in &self.keys {
            if t.eq_ignore_ascii_case(table) && c.eq_ignore_ascii_case(column) {
                match kind.to_ascii_uppercase().as_str() {
                    "PRIMARY KEY" => flags |= FieldFlags::PRIMARY_KEY | FieldFlags::INDEXED,
                    "UNIQUE" => flags |= FieldFlags::UNIQUE_KEY | FieldFlags::INDEXED,
                    _ => flags |= FieldFlags::INDEXED,
                }
            }
        }
        flags
    }

    fn index_flags(&self, table: &str, column: &str) -> FieldFlags {
        let mut flags = FieldFlags::empty();
        for (t, c, unique) in &self.indexes {
            if t.eq_ignore_ascii_case(table) && c.eq_ignore_ascii_case(column) {
                flags |= FieldFlags::INDEXED;
                if *unique {
                    flags |= FieldFlags::UNIQUE_KEY;
                }
            }
        }
        flags
    }
}

/// Sort the reply's result sets by shape. Position is meaningless: empty
/// matches may drop a set entirely.
fn classify_reply(mut results: BatchResults) -> CatalogReply {
    let mut reply = CatalogReply::default();

    while let Some(mut set) = results.next_result_set() {
        if set.has_column("data_type") {
            reply.columns = Some(set);
        } else if set.has_column("constraint_type") {
            while set.next() {
                reply.keys.push((
                    set.get("table_name").unwrap_or_default().to_owned(),
                    set.get("column_name").unwrap_or_default().to_owned(),
                    set.get("constraint_type").unwrap_or_default().to_owned(),
                ));
            }
        } else if set.has_column("is_unique") {
            while set.next() {
                reply.indexes.push((
                    set.get("table_name").unwrap_or_default().to_owned(),
                    set.get("column_name").unwrap_or_default().to_owned(),
                    set.get("is_unique")
                        .is_some_and(|v| v == "t" || v.eq_ignore_ascii_case("true")),
                ));
            }
        }
        // column-less sets (no matches anywhere) carry nothing to classify
    }

    reply
}

/// One `information_schema.columns` row for the result walk.
#[derive(Debug, Clone)]
struct ColumnFact {
    schema: String,
    name: String,
    default: Option<String>,
    nullable: bool,
    declared: String,
    char_len: Option<u32>,
    precision: Option<u32>,
    scale: Option<u32>,
}

/// One `pg_attribute` row for the parameter walk.
#[derive(Debug, Clone)]
struct AttributeRow {
    name: String,
    type_name: String,
    not_null: bool,
    typmod: i32,
}

fn attribute_query(table: &str) -> String {
    let bare = table.split_once('.').map_or(table, |(_, t)| t);
    format!(
        "SELECT a.attname, t.typname, a.attnotnull, a.atttypmod \
         FROM pg_class c \
         JOIN pg_attribute a ON a.attrelid = c.oid \
         JOIN pg_type t ON a.atttypid = t.oid \
         WHERE c.relname = '{bare}' AND a.attnum > 0 \
         ORDER BY a.attnum"
    )
}

fn attribute_rows(mut set: RowSet) -> Vec<AttributeRow> {
    let mut out = Vec::with_capacity(set.row_count());
    while set.next() {
        out.push(AttributeRow {
            name: set.get("attname").unwrap_or_default().to_owned(),
            type_name: set.get("typname").unwrap_or_default().to_owned(),
            not_null: set
                .get("attnotnull")
                .is_some_and(|v| v == "t" || v.eq_ignore_ascii_case("true")),
            typmod: set.get("atttypmod").and_then(|v| v.parse().ok()).unwrap_or(-1),
        });
    }
    out
}

/// Decode `pg_attribute.atttypmod` into (precision, scale).
///
/// For character types the modifier is length plus the 4-byte varlena
/// header; for numerics it packs precision and scale into the high and
/// low halves. -1 means unconstrained.
fn decode_typmod(portable: crate::types::PortableType, typmod: i32) -> (u32, u32) {
    use crate::types::PortableType as P;

    if typmod < 4 {
        return (0, 0);
    }
    let body = (typmod - 4) as u32;
    match portable {
        P::Numeric | P::Decimal => ((body >> 16) & 0xffff, body & 0xffff),
        _ => (body, 0),
    }
}

/// The (name, alias) pairs this table owes descriptors for.
fn wanted_for(refs: &StatementRefs, table: &str) -> Vec<(String, String)> {
    (0..refs.columns.len())
        .filter(|&i| refs.columns.value_at(i) == Some(table))
        .map(|i| {
            (
                refs.columns.key_at(i).unwrap_or_default().to_owned(),
                refs.aliases.value_at(i).unwrap_or_default().to_owned(),
            )
        })
        .collect()
}

fn quoted_list(names: &[&str]) -> String {
    names
        .iter()
        .map(|n| {
            let bare = n.split_once('.').map_or(*n, |(_, t)| t);
            format!("'{bare}'")
        })
        .collect::<Vec<_>>()
        .join(", ")
}
