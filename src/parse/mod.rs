//! Structural decomposition of statement text.
//!
//! The decomposer is deliberately heuristic: it classifies a statement by
//! its leading keyword and slices it into a table list, a column/parameter
//! list and leftover clause text using keyword and depth scanning, not a
//! grammar. Best effort on ordinary SQL; pathological statements degrade
//! rather than error wherever possible.

mod columns;
mod tables;

pub use columns::{column_ref, function_column_name, split_entries, ColumnRef};
pub use tables::{split_tables, TableRef};

use tracing::debug;

use crate::error::Error;
use crate::normalize::{collapse_whitespace, find_keyword, strip_comments};
use crate::placeholders::count_placeholders;
use crate::registry::{CaseFold, Registry};
use crate::Result;

/// Sentinel column name meaning "every column of the table".
pub const COLUMN_WILDCARD: &str = "*";

/// Sentinel parameter name meaning "any unclaimed column".
pub const PARAM_WILDCARD: &str = "?";

/// Keywords that end the table-list segment of a statement.
const TERMINATORS: &[&str] = &["WHERE", "AND", "OR", "LIMIT", "UNION"];

/// The statement shapes the decomposer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Delete,
    Insert,
    Update,
}

impl StatementKind {
    /// Classify by leading keyword; anything unrecognized is fatal.
    pub fn classify(sql: &str) -> Result<StatementKind> {
        let s = sql.trim_start();
        if starts_with_ci(s, "SELECT ") {
            Ok(StatementKind::Select)
        } else if starts_with_ci(s, "DELETE FROM ") {
            Ok(StatementKind::Delete)
        } else if starts_with_ci(s, "INSERT INTO ") {
            Ok(StatementKind::Insert)
        } else if starts_with_ci(s, "UPDATE ") {
            Ok(StatementKind::Update)
        } else {
            let verb = s.split_whitespace().next().unwrap_or_default();
            Err(Error::UnsupportedStatement(verb.to_owned()))
        }
    }
}

fn starts_with_ci(s: &str, prefix: &str) -> bool {
    s.len() >= prefix.len() && s[..prefix.len()].eq_ignore_ascii_case(prefix)
}

/// A statement decomposed into its referenced names.
///
/// `columns` and `params` hold their entries in request order, exactly as
/// written left to right; per-table regrouping happens later, in the fetch
/// strategies.
#[derive(Debug, Clone)]
pub struct ParsedStatement {
    pub kind: StatementKind,
    /// Comment-free, whitespace-collapsed statement text.
    pub sql: String,
    pub placeholder_count: usize,
    pub tables: Vec<TableRef>,
    pub columns: Vec<ColumnRef>,
    pub params: Vec<ColumnRef>,
}

/// Decompose one statement.
pub fn decompose(sql: &str) -> Result<ParsedStatement> {
    let cleaned = collapse_whitespace(&strip_comments(sql));
    let kind = StatementKind::classify(&cleaned)?;

    let work = remove_noise_keywords(&cleaned);
    let placeholder_count = count_placeholders(&work);

    let (table_segment, column_entries, candidates) = match kind {
        StatementKind::Select => split_select(after_tokens(&work, 1)),
        StatementKind::Delete => split_delete(after_tokens(&work, 2)),
        StatementKind::Insert => split_insert(after_tokens(&work, 2))?,
        StatementKind::Update => split_update(after_tokens(&work, 1)),
    };

    let tables = split_tables(&table_segment);
    let columns: Vec<ColumnRef> = column_entries.iter().map(|e| column_ref(e)).collect();
    let params = params_from_candidates(&candidates);

    debug!(
        ?kind,
        tables = tables.len(),
        columns = columns.len(),
        params = params.len(),
        placeholders = placeholder_count,
        "decomposed statement"
    );

    Ok(ParsedStatement {
        kind,
        sql: cleaned,
        placeholder_count,
        tables,
        columns,
        params,
    })
}

/// Drop DISTINCT/NOT tokens; they carry no name information and confuse
/// the keyword scans.
fn remove_noise_keywords(sql: &str) -> String {
    sql.split_whitespace()
        .filter(|t| !t.eq_ignore_ascii_case("DISTINCT") && !t.eq_ignore_ascii_case("NOT"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Remainder of `s` after its first `n` whitespace-separated tokens.
fn after_tokens(s: &str, n: usize) -> &str {
    let mut rest = s.trim_start();
    for _ in 0..n {
        rest = match rest.split_once(' ') {
            Some((_, tail)) => tail.trim_start(),
            None => "",
        };
    }
    rest
}

/// (table segment, column entries, parameter-candidate entries)
type SplitParts = (String, Vec<String>, Vec<String>);

fn split_select(rest: &str) -> SplitParts {
    match find_keyword(rest, "FROM") {
        Some(at) => {
            let cols = rest[..at].trim();
            let after = rest[at + "FROM".len()..].trim();
            let pieces = split_at_terminators(after);
            let table_segment = pieces.first().cloned().unwrap_or_default();
            (table_segment, split_entries(cols), candidate_entries(&pieces[1..]))
        }
        // SELECT without FROM: expressions only, nothing to introspect
        None => (String::new(), split_entries(rest), Vec::new()),
    }
}

fn split_delete(rest: &str) -> SplitParts {
    let pieces = split_at_terminators(rest);
    let table_segment = pieces.first().cloned().unwrap_or_default();
    (
        table_segment,
        vec![COLUMN_WILDCARD.to_owned()],
        candidate_entries(&pieces[1..]),
    )
}

fn split_insert(rest: &str) -> Result<SplitParts> {
    let (head, tail) = match rest.to_ascii_uppercase().find("VALUES") {
        Some(at) => (rest[..at].trim(), rest[at + "VALUES".len()..].trim()),
        None => (rest.trim(), ""),
    };

    if head.is_empty() {
        return Err(Error::NoTableFound);
    }

    let (table_segment, column_entries) = match head.find('(') {
        Some(0) => return Err(Error::NoTableFound),
        Some(open) => {
            let close = head.find(')').unwrap_or(head.len());
            let inner = if close > open { &head[open + 1..close] } else { "" };
            (head[..open].trim().to_owned(), split_entries(inner))
        }
        None => (head.to_owned(), vec![COLUMN_WILDCARD.to_owned()]),
    };

    let named = column_entries.first().is_some_and(|c| c != COLUMN_WILDCARD);
    let mut candidates = Vec::new();
    for tuple in value_tuples(tail) {
        if named {
            for (col, val) in column_entries.iter().zip(&tuple) {
                if count_placeholders(val) > 0 {
                    candidates.push(format!("{}={}", col.trim(), val.trim()));
                } else {
                    candidates.push(val.clone());
                }
            }
        } else {
            candidates.extend(tuple);
        }
    }

    Ok((table_segment, column_entries, candidates))
}

fn split_update(rest: &str) -> SplitParts {
    let Some(at) = find_keyword(rest, "SET") else {
        return (rest.trim().to_owned(), Vec::new(), Vec::new());
    };
    let table_segment = rest[..at].trim().to_owned();
    let after = rest[at + "SET".len()..].trim();

    let pieces = split_at_terminators(after);
    let mut column_entries = Vec::new();
    let mut candidates = Vec::new();

    if let Some(assignments) = pieces.first() {
        for assignment in split_entries(assignments) {
            match assignment.split_once('=') {
                Some((col, val)) => {
                    let col = col.trim();
                    column_entries.push(col.to_owned());
                    if count_placeholders(val) > 0 {
                        candidates.push(format!("{}={}", col, val.trim()));
                    }
                }
                None => column_entries.push(assignment),
            }
        }
    }
    candidates.extend(candidate_entries(&pieces[1..]));

    (table_segment, column_entries, candidates)
}

/// Top-level value tuples of an INSERT, one entry list per `( ... )` group.
fn value_tuples(tail: &str) -> Vec<Vec<String>> {
    let mut tuples = Vec::new();
    let mut depth = 0u32;
    let mut current = String::new();

    for c in tail.chars() {
        match c {
            '(' => {
                if depth == 0 {
                    current.clear();
                } else {
                    current.push(c);
                }
                depth += 1;
            }
            ')' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    tuples.push(split_entries(&current));
                } else {
                    current.push(c);
                }
            }
            _ if depth > 0 => current.push(c),
            _ => {}
        }
    }
    tuples
}

/// Split clause text at the first-level terminator keywords. The piece
/// before any terminator is the table segment; later pieces are parameter
/// candidates.
fn split_at_terminators(text: &str) -> Vec<String> {
    let mut pieces: Vec<String> = vec![String::new()];
    let mut tokens = text.split_whitespace().peekable();

    fn append(pieces: &mut [String], tok: &str) {
        if tok.is_empty() {
            return;
        }
        let piece = pieces.last_mut().unwrap();
        if !piece.is_empty() {
            piece.push(' ');
        }
        piece.push_str(tok);
    }

    while let Some(tok) = tokens.next() {
        let upper = tok.to_ascii_uppercase();
        if TERMINATORS.contains(&upper.as_str()) {
            pieces.push(String::new());
            continue;
        }
        if (upper == "ORDER" || upper == "GROUP")
            && tokens.peek().is_some_and(|t| t.eq_ignore_ascii_case("BY"))
        {
            tokens.next();
            pieces.push(String::new());
            continue;
        }
        if let Some(semi) = tok.find(';') {
            append(&mut pieces, &tok[..semi]);
            pieces.push(String::new());
            append(&mut pieces, &tok[semi + 1..]);
            continue;
        }
        append(&mut pieces, tok);
    }

    pieces
}

/// Flatten terminator-split pieces into individual comma-separated
/// candidate entries.
fn candidate_entries(pieces: &[String]) -> Vec<String> {
    pieces
        .join(",")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

/// Keep candidates that actually carry a `?` marker and reduce each to its
/// column reference (the text left of the first comparison operator).
fn params_from_candidates(candidates: &[String]) -> Vec<ColumnRef> {
    candidates
        .iter()
        .filter(|c| count_placeholders(c) > 0)
        .map(|c| column_ref(split_comparison(c)))
        .collect()
}

fn split_comparison(s: &str) -> &str {
    let mut cut = s.len();
    for op in ["<=", ">=", "<>", "!=", "=", "<", ">"] {
        if let Some(at) = s.find(op) {
            cut = cut.min(at);
        }
    }
    if let Some(at) = find_keyword(s, "LIKE") {
        cut = cut.min(at);
    }
    &s[..cut]
}

/// The registries a fetch strategy consumes, plus the request-order record
/// taken before columns were regrouped per table.
#[derive(Debug, Clone)]
pub struct StatementRefs {
    /// table name -> table alias
    pub tables: Registry,
    /// column name -> owning table name, grouped per table
    pub columns: Registry,
    /// column name -> display alias, parallel to `columns`
    pub aliases: Registry,
    /// parameter name -> mode, in request order
    pub params: Registry,
    /// left-to-right names exactly as the statement requested them
    pub request_order: Vec<String>,
}

impl StatementRefs {
    /// Registries for a result-column metadata fetch; request order is the
    /// display alias of each selected column.
    pub fn for_results(stmt: &ParsedStatement) -> Self {
        let order = stmt
            .columns
            .iter()
            .map(|c| c.alias_or_name().to_owned())
            .collect();
        Self::build(stmt, &stmt.columns, order)
    }

    /// Registries for a parameter metadata fetch; request order is each
    /// placeholder's column name (`?` when unnamed).
    pub fn for_params(stmt: &ParsedStatement) -> Self {
        let order = stmt.params.iter().map(|p| p.name.clone()).collect();
        Self::build(stmt, &stmt.params, order)
    }

    fn build(stmt: &ParsedStatement, refs: &[ColumnRef], request_order: Vec<String>) -> Self {
        let mut tables = Registry::new(CaseFold::Preserve);
        let mut columns = Registry::new(CaseFold::Preserve);
        let mut aliases = Registry::new(CaseFold::Preserve);
        let mut params = Registry::new(CaseFold::Preserve);

        for p in &stmt.params {
            params.push(&p.name, "IN");
        }

        // regroup per table: a column attaches to the table whose alias (or
        // name) matches its qualifier; unqualified columns attach to
        // alias-less tables
        for t in &stmt.tables {
            tables.push(&t.name, &t.alias);
            for c in refs {
                let owned = c.table_alias == t.alias
                    || (!c.table_alias.is_empty() && c.table_alias == t.name);
                if owned {
                    columns.push(&c.name, &t.name);
                    aliases.push(&c.name, &c.alias);
                }
            }
        }

        Self { tables, columns, aliases, params, request_order }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_with_alias() {
        let stmt = decompose("SELECT a, b AS x FROM t").unwrap();
        assert_eq!(stmt.kind, StatementKind::Select);
        assert_eq!(stmt.tables, vec![TableRef { name: "t".into(), alias: String::new() }]);
        assert_eq!(stmt.columns.len(), 2);
        assert_eq!(stmt.columns[0].name, "a");
        assert_eq!(stmt.columns[0].alias, "");
        assert_eq!(stmt.columns[1].name, "b");
        assert_eq!(stmt.columns[1].alias, "x");
    }

    #[test]
    fn select_where_parameters() {
        let stmt = decompose("SELECT a FROM t WHERE b = ? AND c LIKE ? LIMIT 5").unwrap();
        assert_eq!(stmt.placeholder_count, 2);
        let names: Vec<_> = stmt.params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["b", "c"]);
    }

    #[test]
    fn select_join_tables() {
        let stmt =
            decompose("SELECT c.name, o.total FROM customers c INNER JOIN orders o ON o.cid = c.id")
                .unwrap();
        let names: Vec<_> = stmt.tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["customers", "orders"]);
        assert_eq!(stmt.columns[0].table_alias, "c");
        assert_eq!(stmt.columns[1].table_alias, "o");
    }

    #[test]
    fn insert_tuples_pair_with_columns() {
        let stmt = decompose("INSERT INTO t (c1,c2) VALUES (?,?),(?,?)").unwrap();
        assert_eq!(stmt.placeholder_count, 4);
        let names: Vec<_> = stmt.params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["c1", "c2", "c1", "c2"]);
    }

    #[test]
    fn insert_without_column_list_is_unnamed() {
        let stmt = decompose("INSERT INTO t VALUES (?, 2, ?)").unwrap();
        assert_eq!(stmt.columns, vec![column_ref(COLUMN_WILDCARD)]);
        let names: Vec<_> = stmt.params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, [PARAM_WILDCARD, PARAM_WILDCARD]);
    }

    #[test]
    fn insert_without_table_is_fatal() {
        let err = decompose("INSERT INTO (a) VALUES (?)").unwrap_err();
        assert!(matches!(err, Error::NoTableFound));
    }

    #[test]
    fn update_assignments() {
        let stmt = decompose("UPDATE t SET a = ?, b = 2 WHERE id = ?").unwrap();
        assert_eq!(stmt.tables[0].name, "t");
        let cols: Vec<_> = stmt.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(cols, ["a", "b"]);
        let names: Vec<_> = stmt.params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["a", "id"]);
    }

    #[test]
    fn delete_defaults_to_wildcard_columns() {
        let stmt = decompose("DELETE FROM t WHERE id = ?").unwrap();
        assert_eq!(stmt.columns[0].name, COLUMN_WILDCARD);
        assert_eq!(stmt.params[0].name, "id");
    }

    #[test]
    fn unsupported_statement_kind() {
        let err = decompose("TRUNCATE TABLE t").unwrap_err();
        assert!(matches!(err, Error::UnsupportedStatement(v) if v == "TRUNCATE"));
    }

    #[test]
    fn refs_regroup_by_table_and_record_order() {
        let stmt = decompose("SELECT o.total, c.name AS who FROM customers c, orders o").unwrap();
        let refs = StatementRefs::for_results(&stmt);

        assert_eq!(refs.request_order, vec!["total".to_owned(), "who".to_owned()]);
        // regrouped: customers first, so `name` precedes `total`
        assert_eq!(refs.columns.key_at(0), Some("name"));
        assert_eq!(refs.columns.value_at(0), Some("customers"));
        assert_eq!(refs.columns.key_at(1), Some("total"));
        assert_eq!(refs.columns.value_at(1), Some("orders"));
    }

    #[test]
    fn comments_stripped_before_decomposition() {
        let stmt = decompose("SELECT a, /* b, */ c\nFROM t -- trailing").unwrap();
        let cols: Vec<_> = stmt.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(cols, ["a", "c"]);
    }
}
