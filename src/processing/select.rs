//! Column projection.

use std::str::FromStr;

use crate::error::{HoseError, HoseResult};
use crate::types::{ColumnNames, Row};

use super::Transformer;

/// Columns to keep, in output order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSpec {
    /// Zero-based column positions.
    Positions(Vec<usize>),
    /// Column names, resolved against the stream's [`ColumnNames`].
    Names(Vec<String>),
}

impl FromStr for ColumnSpec {
    type Err = HoseError;

    /// Parse a comma-separated list. A list made only of integers is positional; anything else
    /// is a list of names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let items: Vec<&str> = s.split(',').map(str::trim).collect();
        if items.iter().any(|i| i.is_empty()) {
            return Err(HoseError::usage(format!("invalid column list '{s}'")));
        }
        let positions: Option<Vec<usize>> = items.iter().map(|i| i.parse().ok()).collect();
        Ok(match positions {
            Some(p) => Self::Positions(p),
            None => Self::Names(items.into_iter().map(String::from).collect()),
        })
    }
}

#[derive(Debug, Clone)]
struct Resolved {
    columns: Vec<usize>,
    names: Option<ColumnNames>,
}

/// Project every row onto the columns named by a [`ColumnSpec`].
///
/// Positions are resolved on the first row and reused for the rest of the stream. Output
/// column `k` holds selected column `k`; absent inputs stay absent. When the stream has names,
/// every output row shares one new, narrower [`ColumnNames`].
#[derive(Debug, Clone)]
pub struct ColumnSelect {
    spec: ColumnSpec,
    resolved: Option<Resolved>,
}

impl ColumnSelect {
    pub fn new(spec: ColumnSpec) -> Self {
        Self {
            spec,
            resolved: None,
        }
    }

    fn resolve(&self, names: Option<&ColumnNames>) -> HoseResult<Resolved> {
        let columns = match (&self.spec, names) {
            (ColumnSpec::Names(_), None) => return Err(HoseError::MissingNames),
            (ColumnSpec::Names(wanted), Some(names)) => wanted
                .iter()
                .map(|w| {
                    names
                        .index_of(w)
                        .ok_or_else(|| HoseError::UnknownColumn { name: w.clone() })
                })
                .collect::<HoseResult<Vec<_>>>()?,
            (ColumnSpec::Positions(p), Some(names)) => {
                if let Some(&bad) = p.iter().find(|&&c| c >= names.len()) {
                    return Err(HoseError::ColumnOutOfRange {
                        index: bad,
                        width: names.len(),
                    });
                }
                p.clone()
            }
            (ColumnSpec::Positions(p), None) => p.clone(),
        };
        let names = names.and_then(|n| n.project(&columns));
        tracing::debug!(?columns, "column selection resolved");
        Ok(Resolved { columns, names })
    }
}

impl Transformer for ColumnSelect {
    fn name(&self) -> &'static str {
        "select"
    }

    fn apply(&mut self, row: Row) -> HoseResult<Option<Row>> {
        if self.resolved.is_none() {
            self.resolved = Some(self.resolve(row.names.as_ref())?);
        }
        let Some(resolved) = &self.resolved else {
            return Ok(None);
        };

        let mut schema = Vec::with_capacity(resolved.columns.len());
        let mut values = Vec::with_capacity(resolved.columns.len());
        for (k, &col) in resolved.columns.iter().enumerate() {
            if let Some(v) = row.get(col) {
                schema.push(k);
                values.push(v.to_string());
            }
        }
        Ok(Some(Row::new(schema, values, resolved.names.clone())))
    }
}
