//! Equality filter.

use crate::error::{HoseError, HoseResult};
use crate::types::Row;

use super::Transformer;

/// Keep rows whose `column` equals `value` (string equality after trimming).
///
/// Built from an expression of the form `<column>=<value>`. The column is resolved against the
/// first row's names; rows where the column is absent are dropped.
#[derive(Debug, Clone)]
pub struct Predicate {
    column: String,
    value: String,
    position: Option<usize>,
}

impl Predicate {
    pub fn new(expr: &str) -> HoseResult<Self> {
        let invalid = || HoseError::InvalidPredicate {
            expr: expr.to_string(),
        };
        let (column, value) = expr.split_once('=').ok_or_else(invalid)?;
        let column = column.trim();
        if column.is_empty() {
            return Err(invalid());
        }
        Ok(Self {
            column: column.to_string(),
            value: value.trim().to_string(),
            position: None,
        })
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    fn resolve(&self, row: &Row) -> HoseResult<usize> {
        let names = row.names.as_ref().ok_or(HoseError::MissingNames)?;
        names
            .index_of(&self.column)
            .ok_or_else(|| HoseError::UnknownColumn {
                name: self.column.clone(),
            })
    }
}

impl Transformer for Predicate {
    fn name(&self) -> &'static str {
        "predicate"
    }

    fn apply(&mut self, row: Row) -> HoseResult<Option<Row>> {
        let position = match self.position {
            Some(p) => p,
            None => {
                let p = self.resolve(&row)?;
                self.position = Some(p);
                p
            }
        };
        let keep = row.get(position).map(str::trim) == Some(self.value.as_str());
        Ok(keep.then_some(row))
    }
}
