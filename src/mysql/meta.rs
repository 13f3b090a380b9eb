//! MySQL metadata fetch strategies.
//!
//! Two strategies exist, chosen once from the server version at setup:
//!
//! * **Single pass** (5.0.0 and later): materialize the statement as a
//!   temporary view, introspect the view through
//!   `information_schema.columns`, drop the view. One round trip covers
//!   every table the statement touches.
//! * **Legacy two pass** (pre-5.0.0): `SHOW TABLE STATUS` for coarse
//!   table facts, then `SHOW COLLATION LIKE` + `DESCRIBE` per table and a
//!   bidirectional walk over the described columns.
//!
//! Parameter metadata always uses the per-table `DESCRIBE` walk; a view
//! cannot describe the columns behind `?` markers.

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::assemble::{claim_slots, reconcile};
use crate::error::Error;
use crate::executor::{BatchResults, Executor, RowSet};
use crate::field::{FieldDescriptor, FieldFlags, FieldKind};
use crate::parse::{decompose, StatementKind, StatementRefs};
use crate::placeholders::{bind_placeholders, count_placeholders};
use crate::{Result, ServerVersion};

use super::types;

/// First version whose `information_schema` makes the view strategy viable.
pub const MIN_SINGLE_PASS: ServerVersion = ServerVersion { major: 5, minor: 0, patch: 0 };

/// Reported when the server gives no collation for a table.
const COLLATION_FALLBACK: &str = "ascii_general_ci";

/// MySQL metadata fetcher with its strategy fixed at construction.
#[derive(Debug, Clone)]
pub struct MySqlMetadata {
    single_pass: bool,
}

impl MySqlMetadata {
    pub fn new(server_version: ServerVersion) -> Self {
        let single_pass = server_version >= MIN_SINGLE_PASS;
        debug!(%server_version, single_pass, "selected mysql metadata strategy");
        Self { single_pass }
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

        let fetched = if self.single_pass {
            self.fetch_via_view(executor, &stmt.sql, &refs)?
        } else {
            self.fetch_legacy(executor, &refs)?
        };

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

        let fetched = self.describe_walk(executor, &refs, FieldKind::Parameter)?;
        Ok(reconcile(fetched, &refs.request_order))
    }

    // -- single pass ------------------------------------------------------

    fn fetch_via_view(
        &self,
        executor: &mut dyn Executor,
        sql: &str,
        refs: &StatementRefs,
    ) -> Result<Vec<FieldDescriptor>> {
        let view = view_name(sql);

        // a view definition cannot hold placeholders; NULL keeps the
        // column list and types intact
        let markers = count_placeholders(sql);
        let body = bind_placeholders(sql, &vec!["NULL".to_owned(); markers])?;
        let body = body.trim_end_matches(';').to_owned();

        // on a failure between CREATE and the final DROP the view leaks
        // until the next fetch of the same statement drops it
        let batch = vec![
            format!("DROP VIEW IF EXISTS {view}"),
            format!("CREATE VIEW {view} AS {body}"),
            format!(
                "SELECT table_schema, column_name, column_default, is_nullable, \
                 column_type, character_maximum_length, collation_name, column_key, extra \
                 FROM information_schema.columns \
                 WHERE table_name = '{view}' ORDER BY ordinal_position"
            ),
            format!("DROP VIEW {view}"),
        ];

        let mut results = executor.execute_batch(&batch)?;
        let Some(mut rows) = take_set_with(&mut results, "column_name") else {
            warn!(%view, "view introspection returned no column rows");
            return Ok(Vec::new());
        };

        let mut fields = Vec::with_capacity(rows.row_count());
        while rows.next() {
            let view_col = rows.get("column_name").unwrap_or_default().to_owned();

            // the view's column name is the display alias; map it back to
            // the statement's column and owning table where we can
            let (column, alias, table) = match refs
                .aliases
                .iter()
                .position(|(k, v)| v.eq_ignore_ascii_case(&view_col) || k.eq_ignore_ascii_case(&view_col))
            {
                Some(i) => (
                    refs.columns.key_at(i).unwrap_or(&view_col).to_owned(),
                    refs.aliases.value_at(i).unwrap_or_default().to_owned(),
                    refs.columns.value_at(i).unwrap_or_default().to_owned(),
                ),
                None => (view_col.clone(), String::new(), String::new()),
            };

            let mut field = FieldDescriptor::new(FieldKind::Result);
            let schema = rows.get("table_schema").unwrap_or_default().to_owned();
            let (schema_override, table) = split_qualified(&table);
            field.set_location(
                "",
                if schema_override.is_empty() { &schema } else { &schema_override },
                &table,
            );
            field.set_names(&column, &alias);

            let declared = rows.get("column_type").unwrap_or_default().to_owned();
            field.set_type(&types::resolve(&declared));

            if let Some(len) = rows.get("character_maximum_length").and_then(|v| v.parse().ok()) {
                field.set_length(len);
            }

            field.set_default(rows.get("column_default").map(ToOwned::to_owned));
            let collation = rows.get("collation_name").unwrap_or("");
            field.set_collation(if collation.is_empty() { COLLATION_FALLBACK } else { collation });

            let mut flags = FieldFlags::empty();
            if rows.get("is_nullable").is_some_and(|v| v.eq_ignore_ascii_case("YES")) {
                flags |= FieldFlags::NULLABLE;
            }
            flags |= key_flags(rows.get("column_key").unwrap_or(""));
            if rows
                .get("extra")
                .is_some_and(|v| v.to_ascii_lowercase().contains("auto_increment"))
            {
                flags |= FieldFlags::AUTO_INCREMENT;
            }
            field.set_flags(flags);

            fields.push(field);
        }

        Ok(fields)
    }

    // -- legacy two pass --------------------------------------------------

    fn fetch_legacy(
        &self,
        executor: &mut dyn Executor,
        refs: &StatementRefs,
    ) -> Result<Vec<FieldDescriptor>> {
        // coarse pass: one SHOW TABLE STATUS per table, one batch
        let status_batch: Vec<String> = refs
            .tables
            .iter()
            .map(|(name, _)| {
                let (schema, table) = split_qualified(name);
                if schema.is_empty() {
                    format!("SHOW TABLE STATUS LIKE '{table}'")
                } else {
                    format!("SHOW TABLE STATUS FROM {schema} LIKE '{table}'")
                }
            })
            .collect();

        let mut status_results = executor.execute_batch(&status_batch)?;
        let facts: Vec<TableFacts> = refs
            .tables
            .iter()
            .map(|_| table_facts(status_results.next_result_set()))
            .collect();

        // fine pass: SHOW COLLATION + DESCRIBE per table, one batch
        let mut fine_batch = Vec::with_capacity(refs.tables.len() * 2);
        for ((name, _), fact) in refs.tables.iter().zip(&facts) {
            fine_batch.push(format!("SHOW COLLATION LIKE '{}'", fact.collation));
            fine_batch.push(format!("DESCRIBE {name}"));
        }

        let mut fine_results = executor.execute_batch(&fine_batch)?;
        let mut fields = Vec::new();

        for ((table, _), fact) in refs.tables.iter().zip(&facts) {
            let maxlen = fine_results
                .next_result_set()
                .map_or(1, |mut rs| collation_maxlen(&mut rs));
            let described = fine_results
                .next_result_set()
                .map(described_columns)
                .unwrap_or_default();

            let wanted = wanted_for(refs, table);
            for (desc_idx, _, alias) in match_wanted(&wanted, &described, FieldKind::Result) {
                let d = &described[desc_idx];
                let mut field = FieldDescriptor::new(FieldKind::Result);

                let (schema, bare) = split_qualified(table);
                field.set_location("", &schema, &bare);
                field.set_names(&d.field, &alias);

                let resolved = types::resolve(&d.declared);
                field.set_type(&resolved);
                if resolved.portable.is_character() {
                    field.set_length(resolved.precision.saturating_mul(maxlen));
                }

                field.set_default(d.default.clone());
                field.set_collation(&fact.collation);
                field.set_table_facts(&fact.engine, fact.auto_increment);

                let mut flags = key_flags(&d.key);
                if d.nullable {
                    flags |= FieldFlags::NULLABLE;
                }
                if d.extra.to_ascii_lowercase().contains("auto_increment") {
                    flags |= FieldFlags::AUTO_INCREMENT;
                }
                field.set_flags(flags);

                fields.push(field);
            }
        }

        Ok(fields)
    }

    /// Per-table DESCRIBE walk shared by parameter fetches on both
    /// strategies.
    fn describe_walk(
        &self,
        executor: &mut dyn Executor,
        refs: &StatementRefs,
        kind: FieldKind,
    ) -> Result<Vec<FieldDescriptor>> {
        let batch: Vec<String> = refs
            .tables
            .iter()
            .map(|(name, _)| format!("DESCRIBE {name}"))
            .collect();

        let mut results = executor.execute_batch(&batch)?;
        let mut fields = Vec::new();

        for (table, _) in refs.tables.iter() {
            let described = results
                .next_result_set()
                .map(described_columns)
                .unwrap_or_default();

            let wanted = wanted_for(refs, table);
            for (desc_idx, name, alias) in match_wanted(&wanted, &described, kind) {
                let d = &described[desc_idx];
                let mut field = FieldDescriptor::new(kind);

                let (schema, bare) = split_qualified(table);
                field.set_location("", &schema, &bare);
                field.set_names(&d.field, &alias);
                field.set_field_name(&name);
                field.set_type(&types::resolve(&d.declared));
                field.set_default(d.default.clone());

                let mut flags = key_flags(&d.key);
                if d.nullable {
                    flags |= FieldFlags::NULLABLE;
                }
                if d.extra.to_ascii_lowercase().contains("auto_increment") {
                    flags |= FieldFlags::AUTO_INCREMENT;
                }
                field.set_flags(flags);

                fields.push(field);
            }
        }

        Ok(fields)
    }
}

/// Derived view name, stable per statement text.
///
/// The digest is truncated so the identifier stays inside MySQL's 64
/// character limit.
pub fn view_name(sql: &str) -> String {
    let digest = Sha256::digest(sql.as_bytes());
    format!("sqlmeta_v_{}", hex::encode(&digest[..24]))
}

/// `db.table` splits into (schema, table); unqualified names yield an
/// empty schema.
fn split_qualified(name: &str) -> (String, String) {
    match name.split_once('.') {
        Some((schema, table)) => (schema.to_owned(), table.to_owned()),
        None => (String::new(), name.to_owned()),
    }
}

fn key_flags(key: &str) -> FieldFlags {
    match key.to_ascii_uppercase().as_str() {
        "PRI" => FieldFlags::PRIMARY_KEY | FieldFlags::INDEXED,
        "UNI" => FieldFlags::UNIQUE_KEY | FieldFlags::INDEXED,
        "MUL" => FieldFlags::INDEXED,
        _ => FieldFlags::empty(),
    }
}

/// Pull the first result set whose shape carries `column`, dropping
/// whatever precedes it (DDL statements in the batch answer with empty
/// sets).
fn take_set_with(results: &mut BatchResults, column: &str) -> Option<RowSet> {
    while let Some(set) = results.next_result_set() {
        if set.has_column(column) {
            return Some(set);
        }
    }
    None
}

/// Coarse facts from one `SHOW TABLE STATUS` row.
#[derive(Debug, Clone)]
struct TableFacts {
    engine: String,
    collation: String,
    auto_increment: Option<u64>,
}

fn table_facts(set: Option<RowSet>) -> TableFacts {
    let mut facts = TableFacts {
        engine: String::new(),
        collation: COLLATION_FALLBACK.to_owned(),
        auto_increment: None,
    };

    let Some(mut rows) = set else { return facts };
    if !rows.next() {
        return facts;
    }

    // pre-4.1 servers report the engine under `Type`
    if let Some(engine) = rows.get("Engine").or_else(|| rows.get("Type")) {
        facts.engine = engine.to_owned();
    }
    if let Some(collation) = rows.get("Collation").filter(|c| !c.is_empty()) {
        facts.collation = collation.to_owned();
    }
    facts.auto_increment = rows.get("Auto_increment").and_then(|v| v.parse().ok());

    facts
}

fn collation_maxlen(rows: &mut RowSet) -> u32 {
    if rows.next() {
        rows.get("Maxlen").and_then(|v| v.parse().ok()).unwrap_or(1)
    } else {
        1
    }
}

/// One `DESCRIBE` row.
#[derive(Debug, Clone)]
struct DescribedColumn {
    field: String,
    declared: String,
    nullable: bool,
    key: String,
    default: Option<String>,
    extra: String,
}

fn described_columns(mut rows: RowSet) -> Vec<DescribedColumn> {
    let mut out = Vec::with_capacity(rows.row_count());
    while rows.next() {
        out.push(DescribedColumn {
            field: rows.get("Field").unwrap_or_default().to_owned(),
            declared: rows.get("Type").unwrap_or_default().to_owned(),
            nullable: rows.get("Null").is_some_and(|v| v.eq_ignore_ascii_case("YES")),
            key: rows.get("Key").unwrap_or_default().to_owned(),
            default: rows.get("Default").map(ToOwned::to_owned),
            extra: rows.get("Extra").unwrap_or_default().to_owned(),
        });
    }
    out
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

/// Resolve wanted names against described columns via the shared
/// bidirectional walk.
fn match_wanted(
    wanted: &[(String, String)],
    described: &[DescribedColumn],
    kind: FieldKind,
) -> Vec<(usize, String, String)> {
    let names: Vec<String> = described.iter().map(|d| d.field.clone()).collect();
    claim_slots(wanted, &names, kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{row_set, MockExecutor};
    use crate::parse::{COLUMN_WILDCARD, PARAM_WILDCARD};

    fn describe_set(rows: &[(&str, &str, &str, &str)]) -> RowSet {
        let rows: Vec<Vec<Option<String>>> = rows
            .iter()
            .map(|(f, t, n, k)| {
                vec![
                    Some((*f).to_owned()),
                    Some((*t).to_owned()),
                    Some((*n).to_owned()),
                    Some((*k).to_owned()),
                    None,
                    Some(String::new()),
                ]
            })
            .collect();
        RowSet::new(
            vec!["Field", "Type", "Null", "Key", "Default", "Extra"]
                .into_iter()
                .map(ToOwned::to_owned)
                .collect(),
            rows,
        )
    }

    #[test]
    fn view_name_is_stable_and_short_enough() {
        let a = view_name("SELECT a FROM t");
        let b = view_name("SELECT a FROM t");
        let c = view_name("SELECT b FROM t");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("sqlmeta_v_"));
        assert!(a.len() <= 64);
    }

    #[test]
    fn strategy_follows_version() {
        assert!(MySqlMetadata::new(ServerVersion::parse("5.1.45-community")).single_pass);
        assert!(!MySqlMetadata::new(ServerVersion::parse("4.1.22")).single_pass);
    }

    #[test]
    fn single_pass_builds_and_drops_a_view() {
        let meta = MySqlMetadata::new(ServerVersion::parse("5.5.0"));
        let mut exec = MockExecutor::new();
        exec.push_batch(vec![
            RowSet::empty(),
            RowSet::empty(),
            row_set(
                &[
                    "table_schema",
                    "column_name",
                    "column_default",
                    "is_nullable",
                    "column_type",
                    "character_maximum_length",
                    "collation_name",
                    "column_key",
                    "extra",
                ],
                &[
                    &[
                        Some("shop"),
                        Some("id"),
                        None,
                        Some("NO"),
                        Some("int(11) unsigned"),
                        None,
                        None,
                        Some("PRI"),
                        Some("auto_increment"),
                    ],
                    &[
                        Some("shop"),
                        Some("name"),
                        Some("anon"),
                        Some("YES"),
                        Some("varchar(64)"),
                        Some("64"),
                        Some("utf8_general_ci"),
                        Some(""),
                        Some(""),
                    ],
                ],
            ),
            RowSet::empty(),
        ]);

        let fields = meta
            .result_fields(&mut exec, "SELECT id, name FROM customers")
            .unwrap();

        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].name(), "id");
        assert!(fields[0].is_primary_key());
        assert!(fields[0].is_auto_increment());
        assert_eq!(fields[0].table(), "customers");
        assert_eq!(fields[0].collation(), COLLATION_FALLBACK);

        assert_eq!(fields[1].name(), "name");
        assert!(fields[1].is_nullable());
        assert_eq!(fields[1].length(), 64);
        assert_eq!(fields[1].default_value(), Some("anon"));

        let stmts = exec.statements();
        assert_eq!(stmts.len(), 4);
        assert!(stmts[0].starts_with("DROP VIEW IF EXISTS sqlmeta_v_"));
        assert!(stmts[1].starts_with("CREATE VIEW sqlmeta_v_"));
        assert!(stmts[3].starts_with("DROP VIEW sqlmeta_v_"));
    }

    #[test]
    fn single_pass_replaces_markers_with_null() {
        let meta = MySqlMetadata::new(ServerVersion::parse("5.5.0"));
        let mut exec = MockExecutor::new();
        exec.push_batch(vec![RowSet::empty(); 4]);

        let _ = meta.result_fields(&mut exec, "SELECT a FROM t WHERE b = ?");
        let create = exec.statements()[1].to_owned();
        assert!(create.contains("b = NULL"));
        assert!(!create.contains('?'));
    }

    #[test]
    fn non_select_result_fetch_is_unsupported() {
        let meta = MySqlMetadata::new(ServerVersion::parse("5.5.0"));
        let mut exec = MockExecutor::new();
        let err = meta
            .result_fields(&mut exec, "UPDATE t SET a = 1")
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedStatement(_)));
        assert!(exec.executed().is_empty());
    }

    #[test]
    fn legacy_walk_matches_forward_then_backward() {
        let wanted = vec![
            ("id".to_owned(), String::new()),
            ("id".to_owned(), "again".to_owned()),
        ];
        let described = described_columns(describe_set(&[
            ("id", "int(11)", "NO", "PRI"),
            ("name", "varchar(32)", "YES", ""),
        ]));

        let matched = match_wanted(&wanted, &described, FieldKind::Result);
        assert_eq!(matched.len(), 2);
        assert_eq!(matched[0].0, 0);
        // duplicate request reuses the same described column, found backward
        assert_eq!(matched[1].0, 0);
        assert_eq!(matched[1].2, "again");
    }

    #[test]
    fn legacy_two_pass_carries_table_facts() {
        let meta = MySqlMetadata::new(ServerVersion::parse("4.1.22"));
        let mut exec = MockExecutor::new();

        exec.push_batch(vec![row_set(
            &["Name", "Engine", "Auto_increment", "Collation"],
            &[&[Some("orders"), Some("MyISAM"), Some("17"), Some("latin1_swedish_ci")]],
        )]);
        exec.push_batch(vec![
            row_set(
                &["Collation", "Charset", "Id", "Default", "Compiled", "Sortlen", "Maxlen"],
                &[&[Some("latin1_swedish_ci"), Some("latin1"), Some("8"), Some("Yes"), Some("Yes"), Some("1"), Some("1")]],
            ),
            describe_set(&[
                ("id", "int(11)", "NO", "PRI"),
                ("total", "decimal(10,2)", "YES", ""),
            ]),
        ]);

        let fields = meta
            .result_fields(&mut exec, "SELECT total FROM orders")
            .unwrap();

        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name(), "total");
        assert_eq!(fields[0].engine(), "MyISAM");
        assert_eq!(fields[0].auto_index(), Some(17));
        assert_eq!(fields[0].collation(), "latin1_swedish_ci");
        assert_eq!(fields[0].precision(), 9);

        let stmts = exec.statements();
        assert_eq!(stmts[0], "SHOW TABLE STATUS LIKE 'orders'");
        assert_eq!(stmts[1], "SHOW COLLATION LIKE 'latin1_swedish_ci'");
        assert_eq!(stmts[2], "DESCRIBE orders");
    }

    #[test]
    fn wildcard_result_request_expands_every_column() {
        let wanted = vec![(COLUMN_WILDCARD.to_owned(), String::new())];
        let described = described_columns(describe_set(&[
            ("a", "int(11)", "NO", ""),
            ("b", "text", "YES", ""),
        ]));
        let matched = match_wanted(&wanted, &described, FieldKind::Result);
        assert_eq!(matched.len(), 2);
    }

    #[test]
    fn param_wildcard_claims_unclaimed_columns_once() {
        let wanted = vec![
            (PARAM_WILDCARD.to_owned(), String::new()),
            (PARAM_WILDCARD.to_owned(), String::new()),
        ];
        let described = described_columns(describe_set(&[
            ("x", "int(11)", "NO", ""),
            ("y", "int(11)", "NO", ""),
            ("z", "int(11)", "NO", ""),
        ]));
        let matched = match_wanted(&wanted, &described, FieldKind::Parameter);
        assert_eq!(matched[0].0, 0);
        assert_eq!(matched[1].0, 1);
    }

    #[test]
    fn params_describe_each_table() {
        let meta = MySqlMetadata::new(ServerVersion::parse("5.5.0"));
        let mut exec = MockExecutor::new();
        exec.push_batch(vec![describe_set(&[
            ("id", "int(11)", "NO", "PRI"),
            ("name", "varchar(32)", "YES", ""),
        ])]);

        let fields = meta
            .param_fields(&mut exec, "SELECT name FROM t WHERE id = ?")
            .unwrap();

        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].field_name(), "id");
        assert_eq!(fields[0].name(), "id");
        assert!(fields[0].is_primary_key());
        assert_eq!(exec.statements(), ["DESCRIBE t"]);
    }
}
