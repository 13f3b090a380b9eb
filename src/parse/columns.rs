//! Column-list splitting and column-name extraction.

use smallvec::SmallVec;

use crate::normalize::find_keyword;

/// One column (or parameter prospect) named by a statement.
///
/// `table_alias` is the dotted qualifier as written, blank when the column
/// was unqualified or the qualifier was ambiguous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub name: String,
    pub alias: String,
    pub table_alias: String,
}

impl ColumnRef {
    /// The display alias, falling back to the column name.
    pub fn alias_or_name(&self) -> &str {
        if self.alias.is_empty() {
            &self.name
        } else {
            &self.alias
        }
    }
}

const QUOTE_CHARS: &[char] = &['\'', '"', '`'];

/// Split a column-list segment on top-level commas.
///
/// Function calls carry commas of their own, so fragments are accumulated
/// until the parenthesis depth returns to zero before an entry is emitted.
pub fn split_entries(segment: &str) -> Vec<String> {
    let mut entries = Vec::new();
    let mut fragments: SmallVec<[&str; 4]> = SmallVec::new();
    let mut depth = 0i32;

    for fragment in segment.split(',') {
        depth += fragment.matches('(').count() as i32;
        depth -= fragment.matches(')').count() as i32;
        fragments.push(fragment);

        if depth <= 0 {
            let entry = fragments.join(",").trim().to_owned();
            if !entry.is_empty() {
                entries.push(entry);
            }
            fragments.clear();
            depth = 0;
        }
    }

    // unbalanced tail, keep whatever we collected
    if !fragments.is_empty() {
        let entry = fragments.join(",").trim().to_owned();
        if !entry.is_empty() {
            entries.push(entry);
        }
    }

    entries
}

/// Extract name, alias and table qualifier from one column-list entry.
///
/// Quote characters are removed outright, an ` AS ` suffix becomes the
/// alias, function expressions go through [`function_column_name`], and a
/// remaining dotted form splits into qualifier and column.
pub fn column_ref(entry: &str) -> ColumnRef {
    let unquoted: String = entry
        .trim()
        .chars()
        .filter(|c| !QUOTE_CHARS.contains(c))
        .collect();

    let (mut name, alias) = match find_keyword(&unquoted, "AS") {
        Some(at) => {
            let alias = unquoted[at + 2..].trim().to_owned();
            (unquoted[..at].trim().to_owned(), alias)
        }
        None => (unquoted.trim().to_owned(), String::new()),
    };

    if name.contains('(') {
        name = function_column_name(&name);
    }

    let (table_alias, name) = match name.split_once('.') {
        Some((qualifier, column)) => (qualifier.trim().to_owned(), column.trim().to_owned()),
        None => (String::new(), name),
    };

    ColumnRef { name, alias, table_alias }
}

/// Best-effort column name for a function expression.
///
/// Strips one level of wrapping parentheses at a time until none remain,
/// then picks the first comma-separated argument that is not a numeric
/// literal. Known to guess wrong for genuinely ambiguous expressions
/// (string-literal arguments, arithmetic); callers depend on this exact
/// behavior, so it stays as is.
pub fn function_column_name(expr: &str) -> String {
    let mut inner = expr.trim();
    loop {
        match (inner.find('('), inner.rfind(')')) {
            (Some(open), Some(close)) if open < close => inner = inner[open + 1..close].trim(),
            _ => break,
        }
    }

    inner
        .split(',')
        .map(str::trim)
        .find(|arg| !arg.is_empty() && !is_numeric_literal(arg))
        .unwrap_or(inner)
        .to_owned()
}

fn is_numeric_literal(s: &str) -> bool {
    s.parse::<i64>().is_ok() || s.parse::<f64>().is_ok()
}
