//! Format codecs and the read/write capability traits they implement.
//!
//! Every format exposes up to two narrow capabilities:
//!
//! - [`RowReader`]: produce rows one at a time (`read_row`)
//! - [`RowWriter`]: consume rows (`write_row`), with an optional header step (`init`) and a
//!   finalizing `flush`
//!
//! A format only implements what it supports; JSON, for instance, is write-only.
//!
//! | name              | reader | writer |
//! |-------------------|--------|--------|
//! | `csv`             | yes    | yes    |
//! | `svm` / `libsvm`  | yes    | yes    |
//! | `json`            | no     | yes    |
//! | `txt` / `text`    | yes    | yes    |
//!
//! Most callers resolve a codec by name with [`get_reader`] / [`get_writer`] (from
//! [`unified`]) and then either stream rows through [`crate::ops`] or collect a bounded
//! [`Section`] with [`read_section`].

pub mod csv;
pub mod json;
pub mod libsvm;
pub mod text;
pub mod unified;

use std::io::BufRead;

use crate::error::{HoseError, HoseResult};
use crate::types::{ColumnNames, ReadOptions, Row, Section, WriteOptions};

pub use self::csv::{CsvReader, CsvWriter};
pub use json::JsonWriter;
pub use libsvm::{LibSvmReader, LibSvmWriter};
pub use text::{TextReader, TextWriter};
pub use unified::{Format, get_reader, get_writer, reader_for, writer_for};

/// Readable capability of a format.
pub trait RowReader: Send {
    /// Column names established by the stream's header, if the format has one.
    ///
    /// Reading the header is lazy: the first call (or the first `read_row`) consumes it.
    fn column_names(&mut self) -> HoseResult<Option<ColumnNames>> {
        Ok(None)
    }

    /// Read the next row. `Ok(None)` signals a normal end of stream.
    fn read_row(&mut self, options: &ReadOptions) -> HoseResult<Option<Row>>;
}

/// Writable capability of a format.
pub trait RowWriter {
    /// Write a leading header line. Formats without a header ignore it.
    fn init(&mut self, _names: &ColumnNames) -> HoseResult<()> {
        Ok(())
    }

    fn write_row(&mut self, row: &Row, options: &WriteOptions) -> HoseResult<()>;

    /// Finalize and flush buffered output.
    fn flush(&mut self) -> HoseResult<()>;
}

impl<T: RowReader + ?Sized> RowReader for Box<T> {
    fn column_names(&mut self) -> HoseResult<Option<ColumnNames>> {
        (**self).column_names()
    }

    fn read_row(&mut self, options: &ReadOptions) -> HoseResult<Option<Row>> {
        (**self).read_row(options)
    }
}

impl<T: RowWriter + ?Sized> RowWriter for Box<T> {
    fn init(&mut self, names: &ColumnNames) -> HoseResult<()> {
        (**self).init(names)
    }

    fn write_row(&mut self, row: &Row, options: &WriteOptions) -> HoseResult<()> {
        (**self).write_row(row, options)
    }

    fn flush(&mut self) -> HoseResult<()> {
        (**self).flush()
    }
}

/// Append the next line of `input` to `buf`; `line` is its 1-based number, used in errors.
///
/// Returns the number of bytes read, `0` at end of input.
pub(crate) fn read_line<R: BufRead + ?Sized>(
    input: &mut R,
    buf: &mut String,
    line: usize,
) -> HoseResult<usize> {
    input
        .read_line(buf)
        .map_err(|source| HoseError::Read { line, source })
}

/// Iterator over a reader's rows that applies [`ReadOptions`] (skip, then limit).
///
/// Created by [`rows`]. Stops after the first error.
pub struct Rows<'a, R: ?Sized> {
    reader: &'a mut R,
    options: ReadOptions,
    skipped: bool,
    emitted: usize,
    done: bool,
}

impl<R: RowReader + ?Sized> Rows<'_, R> {
    fn next_raw(&mut self) -> Option<HoseResult<Row>> {
        match self.reader.read_row(&self.options) {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<R: RowReader + ?Sized> Iterator for Rows<'_, R> {
    type Item = HoseResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if !self.skipped {
            self.skipped = true;
            for _ in 0..self.options.skip_rows {
                match self.next_raw()? {
                    Ok(_) => {}
                    Err(e) => return Some(Err(e)),
                }
            }
        }
        if self.options.max_rows.is_some_and(|max| self.emitted >= max) {
            self.done = true;
            return None;
        }
        let item = self.next_raw()?;
        self.emitted += 1;
        Some(item)
    }
}

/// Iterate the rows of `reader`, skipping and limiting according to `options`.
pub fn rows<R: RowReader + ?Sized>(reader: &mut R, options: ReadOptions) -> Rows<'_, R> {
    Rows {
        reader,
        options,
        skipped: false,
        emitted: 0,
        done: false,
    }
}

/// Read a bounded part of a stream into memory: skip `options.skip_rows` rows, then collect up
/// to `options.max_rows` rows (or everything when unbounded).
///
/// Blank CSV lines are skipped by the codec and never count toward either quota.
pub fn read_section<R: RowReader + ?Sized>(reader: &mut R, options: &ReadOptions) -> HoseResult<Section> {
    let mut section = Section::with_capacity(options.max_rows.unwrap_or(10));
    for row in rows(reader, *options) {
        section.push(row?);
    }
    Ok(section)
}
