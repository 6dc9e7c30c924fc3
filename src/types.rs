//! Core row model shared by every codec and transformer.
//!
//! A [`Row`] is sparse by index: `schema[i]` is the absolute column that `values[i]` occupies,
//! and any column not listed is absent (a blank CSV cell, an omitted libSVM feature). Absence is
//! never turned into zero or an empty string after construction.
//!
//! Rows of one stream share a single [`ColumnNames`] handle. It is created once by the codec
//! that opened the stream and never mutated; transformers that change the visible columns build
//! a new one with [`ColumnNames::project`].

use std::fmt;
use std::ops::Index;
use std::sync::Arc;

/// Ordered column labels of one stream, shared by reference across its rows.
///
/// Cloning is cheap (reference count bump). Two handles compare equal when their labels are
/// equal, whether or not they point at the same allocation.
#[derive(Clone, PartialEq, Eq)]
pub struct ColumnNames(Arc<[String]>);

impl ColumnNames {
    /// Create a new, immutable set of column names.
    pub fn new(names: Vec<String>) -> Self {
        Self(names.into())
    }

    /// Number of columns (the dense width of the stream).
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Label of column `index`, if present.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    /// Iterate labels in column order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Returns the column index of `name`, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|n| n == name)
    }

    /// Build a new set of names holding only `columns`, in the given order.
    ///
    /// Returns `None` if any index is out of range.
    pub fn project(&self, columns: &[usize]) -> Option<Self> {
        columns
            .iter()
            .map(|&c| self.0.get(c).cloned())
            .collect::<Option<Vec<_>>>()
            .map(Self::new)
    }

    /// True when both handles share the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.to_vec()
    }
}

impl fmt::Debug for ColumnNames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

impl Index<usize> for ColumnNames {
    type Output = str;

    fn index(&self, index: usize) -> &str {
        &self.0[index]
    }
}

impl<S: Into<String>> FromIterator<S> for ColumnNames {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

/// One data record.
///
/// Invariants:
///
/// - `schema.len() == values.len()`
/// - `schema` is strictly increasing
///
/// A row whose schema is `0..n` with `n == names.len()` is dense; any gap is an absent value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Absolute column index of each entry in `values`.
    pub schema: Vec<usize>,
    /// String-encoded values, parallel to `schema`.
    pub values: Vec<String>,
    /// Shared column names of the stream, if the format carries any.
    pub names: Option<ColumnNames>,
}

impl Row {
    /// Create a sparse row. Callers must uphold the schema invariants.
    pub fn new(schema: Vec<usize>, values: Vec<String>, names: Option<ColumnNames>) -> Self {
        debug_assert_eq!(schema.len(), values.len());
        debug_assert!(schema.windows(2).all(|w| w[0] < w[1]));
        Self {
            schema,
            values,
            names,
        }
    }

    /// Create a dense row: one value per column name, in order.
    pub fn dense(names: ColumnNames, values: Vec<String>) -> Self {
        Self {
            schema: (0..values.len()).collect(),
            values,
            names: Some(names),
        }
    }

    /// Number of present values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value stored for absolute column `column`, or `None` when absent.
    pub fn get(&self, column: usize) -> Option<&str> {
        self.schema
            .binary_search(&column)
            .ok()
            .map(|i| self.values[i].as_str())
    }

    /// Value stored under column `name`, resolved through the row's column names.
    pub fn get_by_name(&self, name: &str) -> Option<&str> {
        let column = self.names.as_ref()?.index_of(name)?;
        self.get(column)
    }

    /// True when every column named by the stream is present.
    pub fn is_dense(&self) -> bool {
        match &self.names {
            Some(names) => self.schema.len() == names.len() && self.schema.iter().enumerate().all(|(i, &c)| i == c),
            None => self.schema.iter().enumerate().all(|(i, &c)| i == c),
        }
    }

    /// Pairs of `(column name, value)` for every present value.
    ///
    /// Returns `None` when the row has no names, or a column index is not covered by them.
    pub fn named_values(&self) -> Option<Vec<(&str, &str)>> {
        let names = self.names.as_ref()?;
        self.schema
            .iter()
            .zip(&self.values)
            .map(|(&c, v)| names.get(c).map(|n| (n, v.as_str())))
            .collect()
    }
}

/// An ordered, growable run of rows read from (a bounded part of) one stream.
///
/// Used by the collected read path ([`crate::formats::read_section`]); the streaming pipeline
/// never materializes one.
pub type Section = Vec<Row>;

/// Options consumed by readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReadOptions {
    /// Number of leading data rows to discard.
    pub skip_rows: usize,
    /// Maximum number of rows to return after skipping. `None` reads to the end.
    pub max_rows: Option<usize>,
}

/// Options consumed by writers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// Column holding the libSVM label.
    pub target_column: usize,
    /// Maximum number of rows to write. `None` writes everything.
    pub max_rows: Option<usize>,
    /// Whether formats with a header line (CSV) write one.
    pub header: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            target_column: 0,
            max_rows: None,
            header: true,
        }
    }
}

/// Convert a command-line style row bound (`-1` = unbounded) into an optional count.
pub fn bound_from_signed(n: i64) -> Option<usize> {
    usize::try_from(n).ok()
}

#[cfg(test)]
mod tests {
    use super::{ColumnNames, Row, bound_from_signed};

    fn abcd() -> ColumnNames {
        ColumnNames::from_iter(["a", "b", "c", "d"])
    }

    #[test]
    fn column_names_index_of_and_project() {
        let names = abcd();
        assert_eq!(names.index_of("c"), Some(2));
        assert_eq!(names.index_of("missing"), None);

        let projected = names.project(&[3, 1]).unwrap();
        assert_eq!(projected.to_vec(), vec!["d".to_string(), "b".to_string()]);
        assert!(!projected.ptr_eq(&names));
        // Original unchanged
        assert_eq!(names.len(), 4);

        assert!(names.project(&[4]).is_none());
    }

    #[test]
    fn clones_share_allocation() {
        let names = abcd();
        let other = names.clone();
        assert!(names.ptr_eq(&other));
        assert_eq!(names, ColumnNames::from_iter(["a", "b", "c", "d"]));
    }

    #[test]
    fn sparse_lookup_keeps_absence_explicit() {
        let row = Row::new(
            vec![0, 1, 3],
            vec!["1.5".into(), "2.5".into(), "3.5".into()],
            Some(abcd()),
        );
        assert_eq!(row.get(1), Some("2.5"));
        assert_eq!(row.get(2), None);
        assert_eq!(row.get_by_name("d"), Some("3.5"));
        assert_eq!(row.get_by_name("c"), None);
        assert!(!row.is_dense());
        assert_eq!(
            row.named_values().unwrap(),
            vec![("a", "1.5"), ("b", "2.5"), ("d", "3.5")]
        );
    }

    #[test]
    fn dense_rows_cover_every_column() {
        let row = Row::dense(abcd(), vec!["1".into(), "2".into(), "3".into(), "4".into()]);
        assert_eq!(row.schema, vec![0, 1, 2, 3]);
        assert!(row.is_dense());
    }

    #[test]
    fn negative_bound_is_unbounded() {
        assert_eq!(bound_from_signed(-1), None);
        assert_eq!(bound_from_signed(5), Some(5));
    }
}
