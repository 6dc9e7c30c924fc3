//! Positional windows over a stream.

use crate::error::HoseResult;
use crate::types::Row;

use super::Transformer;

/// Drop the first `n` rows, pass the rest through.
#[derive(Debug, Clone)]
pub struct Skip {
    n: usize,
    seen: usize,
}

impl Skip {
    pub fn new(n: usize) -> Self {
        Self { n, seen: 0 }
    }

    /// Rows dropped so far.
    pub fn skipped(&self) -> usize {
        self.seen.min(self.n)
    }
}

impl Transformer for Skip {
    fn name(&self) -> &'static str {
        "skip"
    }

    fn apply(&mut self, row: Row) -> HoseResult<Option<Row>> {
        if self.seen < self.n {
            self.seen += 1;
            return Ok(None);
        }
        Ok(Some(row))
    }
}

/// Pass the first `n` rows through, then stop.
#[derive(Debug, Clone)]
pub struct Limit {
    n: usize,
    emitted: usize,
}

impl Limit {
    pub fn new(n: usize) -> Self {
        Self { n, emitted: 0 }
    }
}

impl Transformer for Limit {
    fn name(&self) -> &'static str {
        "limit"
    }

    fn apply(&mut self, row: Row) -> HoseResult<Option<Row>> {
        if self.emitted >= self.n {
            return Ok(None);
        }
        self.emitted += 1;
        Ok(Some(row))
    }

    fn is_exhausted(&self) -> bool {
        self.emitted >= self.n
    }
}
