//! Row transformers: the stages of a [`crate::execution::Pipeline`].
//!
//! A [`Transformer`] sees one row at a time, in stream order, and returns zero or one rows for
//! it. The engine runs each transformer on its own worker thread and takes care of the
//! channels; transformers themselves hold only their own per-stream state (counters, resolved
//! column positions).
//!
//! Currently implemented:
//!
//! - [`Identity`]: pass everything through
//! - [`Skip`] / [`Limit`]: positional windows
//! - [`ColumnSelect`]: project rows onto a list of columns, by position or by name
//! - [`Predicate`]: keep rows where `<column>=<value>`
//!
//! ## Example
//!
//! ```rust
//! use hose::processing::{ColumnSelect, Predicate, Transformer};
//! use hose::types::{ColumnNames, Row};
//!
//! let names = ColumnNames::from_iter(["a", "b", "c", "d"]);
//! let row = Row::dense(names, vec!["1".into(), "2".into(), "3".into(), "4".into()]);
//!
//! let mut keep = Predicate::new("b = 2").unwrap();
//! let row = keep.apply(row).unwrap().unwrap();
//!
//! let mut select = ColumnSelect::new("b,d".parse().unwrap());
//! let row = select.apply(row).unwrap().unwrap();
//! assert_eq!(row.values, vec!["2", "4"]);
//! assert_eq!(row.names.unwrap().to_vec(), vec!["b", "d"]);
//! ```

pub mod filter;
pub mod select;
pub mod window;

use crate::error::HoseResult;
use crate::types::Row;

pub use filter::Predicate;
pub use select::{ColumnSelect, ColumnSpec};
pub use window::{Limit, Skip};

/// One stage of a row pipeline.
pub trait Transformer: Send {
    /// Short stage name used in logs and events.
    fn name(&self) -> &'static str;

    /// Process one row. `Ok(None)` drops it; an error aborts the whole run.
    fn apply(&mut self, row: Row) -> HoseResult<Option<Row>>;

    /// True once the stage will never emit another row.
    ///
    /// The engine stops reading input for an exhausted stage and closes its output, which lets
    /// upstream stages shut down without draining the rest of the stream.
    fn is_exhausted(&self) -> bool {
        false
    }
}

impl<T: Transformer + ?Sized> Transformer for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn apply(&mut self, row: Row) -> HoseResult<Option<Row>> {
        (**self).apply(row)
    }

    fn is_exhausted(&self) -> bool {
        (**self).is_exhausted()
    }
}

/// Pass-through stage.
#[derive(Debug, Default, Clone, Copy)]
pub struct Identity;

impl Transformer for Identity {
    fn name(&self) -> &'static str {
        "identity"
    }

    fn apply(&mut self, row: Row) -> HoseResult<Option<Row>> {
        Ok(Some(row))
    }
}
