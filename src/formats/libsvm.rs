//! libSVM codec.
//!
//! Line format: `<label> <index>:<value> <index>:<value> ...`
//!
//! Column convention (both directions):
//!
//! - the label is column 0 when reading; the writer takes it from
//!   [`WriteOptions::target_column`]
//! - feature `k` on disk is column `k`, with no offset
//!
//! Feature indices must therefore start at 1 and be strictly increasing, and every feature has a
//! non-empty value. libSVM streams carry no column names.
//!
//! When the label comes from a column other than 0, the remaining columns keep their index and
//! reading the line back moves the label to column 0. A present, non-zero column 0 has no
//! feature index in that case and fails the write with [`HoseError::FeatureIndexZero`].

use std::io::{BufRead, Write};

use crate::error::{HoseError, HoseResult};
use crate::types::{ReadOptions, Row, WriteOptions};

use super::{RowReader, RowWriter, read_line};

/// Column that holds the label of rows read from libSVM.
pub const LABEL_COLUMN: usize = 0;

pub struct LibSvmReader<R> {
    input: R,
    line: String,
    line_no: usize,
}

impl<R: BufRead> LibSvmReader<R> {
    pub fn new(input: R) -> Self {
        Self {
            input,
            line: String::new(),
            line_no: 0,
        }
    }

    fn parse_line(&self) -> HoseResult<Row> {
        let mut tokens = self.line.split_whitespace();
        let label = tokens
            .next()
            .ok_or_else(|| HoseError::parse(self.line_no, "missing label"))?;

        let mut schema = vec![LABEL_COLUMN];
        let mut values = vec![label.to_string()];
        for token in tokens {
            let (index, value) = token.split_once(':').ok_or_else(|| {
                HoseError::parse(self.line_no, format!("expected <index>:<value>, found '{token}'"))
            })?;
            let column: usize = index.parse().map_err(|_| {
                HoseError::parse(self.line_no, format!("invalid feature index '{index}'"))
            })?;
            if value.is_empty() {
                return Err(HoseError::parse(
                    self.line_no,
                    format!("feature {column} has no value"),
                ));
            }
            let last = schema[schema.len() - 1];
            if column <= last {
                let message = if column == LABEL_COLUMN {
                    "feature index 0 collides with the label column".to_string()
                } else {
                    format!("feature index {column} is not greater than {last}")
                };
                return Err(HoseError::parse(self.line_no, message));
            }
            schema.push(column);
            values.push(value.to_string());
        }
        Ok(Row::new(schema, values, None))
    }
}

impl<R: BufRead + Send> RowReader for LibSvmReader<R> {
    fn read_row(&mut self, _options: &ReadOptions) -> HoseResult<Option<Row>> {
        loop {
            self.line.clear();
            if read_line(&mut self.input, &mut self.line, self.line_no + 1)? == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            if !self.line.trim().is_empty() {
                return self.parse_line().map(Some);
            }
        }
    }
}

/// Writes rows as libSVM lines.
///
/// Features that are zero or not numeric are dropped; this is lossy by design of the format.
pub struct LibSvmWriter<W> {
    out: W,
    line: String,
}

impl<W: Write> LibSvmWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            line: String::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

fn is_written_feature(value: &str) -> bool {
    matches!(value.trim().parse::<f64>(), Ok(x) if x != 0.0 && !x.is_nan())
}

impl<W: Write> RowWriter for LibSvmWriter<W> {
    fn write_row(&mut self, row: &Row, options: &WriteOptions) -> HoseResult<()> {
        let target = options.target_column;
        let label = row
            .get(target)
            .ok_or(HoseError::TargetColumnMissing { column: target })?;

        self.line.clear();
        self.line.push_str(label);
        for (&col, value) in row.schema.iter().zip(&row.values) {
            if col == target || !is_written_feature(value) {
                continue;
            }
            if col == LABEL_COLUMN {
                return Err(HoseError::FeatureIndexZero { target });
            }
            self.line.push(' ');
            self.line.push_str(&col.to_string());
            self.line.push(':');
            self.line.push_str(value);
        }
        self.line.push('\n');
        self.out.write_all(self.line.as_bytes())?;
        Ok(())
    }

    fn flush(&mut self) -> HoseResult<()> {
        self.out.flush()?;
        Ok(())
    }
}
