use std::collections::VecDeque;

use crate::Result;

/// The transport collaborator the metadata pipeline issues its introspection
/// batches through.
///
/// The engine never talks to the database directly; everything goes through
/// an implementation of this trait, one logical batch at a time, blocking
/// until the full reply is available. Cancellation and timeouts belong to
/// the implementor; any failure surfaced here is terminal for the current
/// metadata fetch.
pub trait Executor {
    /// Execute `statements` as one logical batch and return every result
    /// set the server produced, in order.
    fn execute_batch(&mut self, statements: &[String]) -> Result<BatchResults>;
}

/// The ordered result sets produced by one call to
/// [`Executor::execute_batch`].
#[derive(Debug, Default)]
pub struct BatchResults {
    sets: VecDeque<RowSet>,
}

impl BatchResults {
    pub fn new(sets: Vec<RowSet>) -> Self {
        Self { sets: sets.into() }
    }

    /// Returns `true` while at least one unconsumed result set remains.
    pub fn has_more_results(&self) -> bool {
        !self.sets.is_empty()
    }

    /// Takes the next result set, if any.
    pub fn next_result_set(&mut self) -> Option<RowSet> {
        self.sets.pop_front()
    }

    /// Peek at the next result set without consuming it.
    pub fn peek_result_set(&self) -> Option<&RowSet> {
        self.sets.front()
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

/// One tabular reply, exposed as a scrollable cursor.
///
/// The cursor starts positioned before the first row; [`RowSet::next`]
/// advances and [`RowSet::previous`] backs up, each reporting whether a row
/// is under the cursor afterwards. Values are read from the current row by
/// column name (case-insensitive) or 1-based position, as `Option<String>`
/// so SQL NULL stays distinguishable from an empty string.
#[derive(Debug, Clone)]
pub struct RowSet {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
    // -1 = before first, rows.len() = after last
    pos: isize,
}

impl RowSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self { columns, rows, pos: -1 }
    }

    /// An empty, column-less reply (what DDL statements in a batch produce).
    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.eq_ignore_ascii_case(name))
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Advance the cursor; returns `true` if it now rests on a row.
    pub fn next(&mut self) -> bool {
        if self.pos < self.rows.len() as isize {
            self.pos += 1;
        }
        (self.pos as usize) < self.rows.len()
    }

    /// Back the cursor up; returns `true` if it now rests on a row.
    pub fn previous(&mut self) -> bool {
        if self.pos >= 0 {
            self.pos -= 1;
        }
        self.pos >= 0
    }

    /// Reposition before the first row.
    pub fn rewind(&mut self) {
        self.pos = -1;
    }

    fn current_row(&self) -> Option<&Vec<Option<String>>> {
        if self.pos < 0 {
            return None;
        }
        self.rows.get(self.pos as usize)
    }

    /// Value of `name` in the current row; `None` when the cursor is off
    /// the rows, the column is unknown, or the value is SQL NULL.
    pub fn get(&self, name: &str) -> Option<&str> {
        let idx = self.columns.iter().position(|c| c.eq_ignore_ascii_case(name))?;
        self.current_row()?.get(idx)?.as_deref()
    }

    /// Value at 1-based `position` in the current row.
    pub fn get_at(&self, position: usize) -> Option<&str> {
        if position == 0 {
            return None;
        }
        self.current_row()?.get(position - 1)?.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_row_set() -> RowSet {
        RowSet::new(
            vec!["Field".into(), "Type".into()],
            vec![
                vec![Some("id".into()), Some("int(11)".into())],
                vec![Some("name".into()), None],
            ],
        )
    }

    #[test]
    fn cursor_scrolls_both_directions() {
        let mut rs = two_row_set();
        assert!(rs.get("Field").is_none());

        assert!(rs.next());
        assert_eq!(rs.get("Field"), Some("id"));
        assert!(rs.next());
        assert_eq!(rs.get("field"), Some("name"));
        assert_eq!(rs.get("Type"), None); // SQL NULL

        assert!(!rs.next());
        assert!(rs.previous());
        assert_eq!(rs.get("Field"), Some("name"));
        assert!(rs.previous());
        assert_eq!(rs.get_at(1), Some("id"));
        assert!(!rs.previous());
    }

    #[test]
    fn batch_results_drain_in_order() {
        let mut batch = BatchResults::new(vec![RowSet::empty(), two_row_set()]);
        assert!(batch.has_more_results());
        assert_eq!(batch.next_result_set().unwrap().column_count(), 0);
        assert_eq!(batch.next_result_set().unwrap().row_count(), 2);
        assert!(!batch.has_more_results());
    }
}
