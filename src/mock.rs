//! A scripted in-memory [`Executor`] for driving the pipeline in tests.

use std::collections::VecDeque;
use std::io;

use crate::error::Error;
use crate::executor::{BatchResults, Executor, RowSet};
use crate::Result;

/// Replays pre-scripted result sets in FIFO order and records every batch
/// it was asked to execute for later assertions.
#[derive(Debug, Default)]
pub struct MockExecutor {
    scripted: VecDeque<BatchResults>,
    executed: Vec<Vec<String>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the reply for the next unscripted batch.
    pub fn push_batch(&mut self, sets: Vec<RowSet>) {
        self.scripted.push_back(BatchResults::new(sets));
    }

    /// Every batch executed so far, in execution order.
    pub fn executed(&self) -> &[Vec<String>] {
        &self.executed
    }

    /// Flattened view of all statements sent, across batches.
    pub fn statements(&self) -> Vec<&str> {
        self.executed
            .iter()
            .flatten()
            .map(String::as_str)
            .collect()
    }
}

/// Build a [`RowSet`] from string literals.
pub fn row_set(columns: &[&str], rows: &[&[Option<&str>]]) -> RowSet {
    RowSet::new(
        columns.iter().map(|c| (*c).to_owned()).collect(),
        rows.iter()
            .map(|r| r.iter().map(|v| v.map(ToOwned::to_owned)).collect())
            .collect(),
    )
}

impl Executor for MockExecutor {
    fn execute_batch(&mut self, statements: &[String]) -> Result<BatchResults> {
        self.executed.push(statements.to_vec());
        self.scripted.pop_front().ok_or_else(|| {
            Error::executor(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "no scripted reply for this batch",
            ))
        })
    }
}
