//! Plain-text codec: one row per line, one value per row.
//!
//! The reader keeps each line verbatim, including its terminating newline, so writing a row back
//! reproduces the input exactly. A last line without a newline is still a row.

use std::io::{BufRead, Write};

use crate::error::HoseResult;
use crate::types::{ReadOptions, Row, WriteOptions};

use super::{RowReader, RowWriter, read_line};

pub struct TextReader<R> {
    input: R,
    line_no: usize,
}

impl<R: BufRead> TextReader<R> {
    pub fn new(input: R) -> Self {
        Self { input, line_no: 0 }
    }
}

impl<R: BufRead + Send> RowReader for TextReader<R> {
    fn read_row(&mut self, _options: &ReadOptions) -> HoseResult<Option<Row>> {
        let mut line = String::new();
        if read_line(&mut self.input, &mut line, self.line_no + 1)? == 0 {
            return Ok(None);
        }
        self.line_no += 1;
        Ok(Some(Row::new(vec![0], vec![line], None)))
    }
}

/// Writes every value of a row back to back, with no separators.
pub struct TextWriter<W> {
    out: W,
}

impl<W: Write> TextWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RowWriter for TextWriter<W> {
    fn write_row(&mut self, row: &Row, _options: &WriteOptions) -> HoseResult<()> {
        for value in &row.values {
            self.out.write_all(value.as_bytes())?;
        }
        Ok(())
    }

    fn flush(&mut self) -> HoseResult<()> {
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{TextReader, TextWriter};
    use crate::error::{ErrorClass, HoseError};
    use crate::formats::{RowReader, RowWriter, read_section};
    use crate::types::{ReadOptions, WriteOptions};

    #[test]
    fn lines_are_kept_verbatim() {
        let input = "first\n\nlast without newline";
        let mut r = TextReader::new(input.as_bytes());
        let section = read_section(&mut r, &ReadOptions::default()).unwrap();
        let values: Vec<&str> = section.iter().map(|r| r.values[0].as_str()).collect();
        assert_eq!(values, vec!["first\n", "\n", "last without newline"]);
        assert!(section.iter().all(|r| r.schema == vec![0] && r.names.is_none()));
    }

    #[test]
    fn read_then_write_is_identity() {
        let input = "a,b\r\n  c  \nd";
        let mut r = TextReader::new(input.as_bytes());
        let mut w = TextWriter::new(Vec::new());
        while let Some(row) = r.read_row(&ReadOptions::default()).unwrap() {
            w.write_row(&row, &WriteOptions::default()).unwrap();
        }
        w.flush().unwrap();
        assert_eq!(String::from_utf8(w.into_inner()).unwrap(), input);
    }

    #[test]
    fn invalid_utf8_is_a_read_error() {
        let input: &[u8] = b"ok\ncaf\xe9\nmore\n";
        let mut r = TextReader::new(input);
        let opts = ReadOptions::default();
        assert_eq!(r.read_row(&opts).unwrap().unwrap().values, vec!["ok\n"]);

        let err = r.read_row(&opts).unwrap_err();
        assert!(matches!(err, HoseError::Read { line: 2, .. }));
        assert_eq!(err.class(), ErrorClass::Parse);
        assert_eq!(err.exit_code(), 2);
    }
}
