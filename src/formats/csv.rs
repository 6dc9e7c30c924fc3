//! CSV codec.
//!
//! Reading is line based and sparse:
//!
//! - the first non-blank line is the header and defines the stream's [`ColumnNames`]
//! - fields are split on commas outside quotes (see [`split_fields`]) and trimmed
//! - a field that trims to the empty string is omitted from the row's schema
//! - blank lines are skipped and never count as rows
//!
//! Quote characters are kept in the value; nothing is unescaped. Writing walks the full header
//! width and leaves an empty field for every absent column, so a line read and written back
//! against the same header is reproduced byte for byte (modulo whitespace trimmed around
//! fields).

use std::io::{BufRead, Write};

use ::csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::error::{HoseError, HoseResult};
use crate::types::{ColumnNames, ReadOptions, Row, WriteOptions};

use super::{RowReader, RowWriter, read_line};

/// Maximum nesting of `"` / `'` quotes inside one field.
pub const MAX_QUOTE_DEPTH: usize = 3;

const FIELD_TRIM: &[char] = &[' ', '\t', '\r', '\n'];

/// Split one line into raw (untrimmed) fields.
///
/// A quote character (`"` or `'`) equal to the innermost open quote closes it; any other quote
/// character opens a new level. Commas separate fields only when no quote is open. Opening a
/// fourth level is an error.
pub fn split_fields(line: &str) -> Result<Vec<&str>, String> {
    let line = line.trim_end_matches(['\r', '\n']);
    let mut stack = [0u8; MAX_QUOTE_DEPTH];
    let mut depth = 0usize;
    let mut fields = Vec::new();
    let mut start = 0usize;

    for (i, b) in line.bytes().enumerate() {
        match b {
            b'"' | b'\'' => {
                if depth > 0 && stack[depth - 1] == b {
                    depth -= 1;
                } else if depth < MAX_QUOTE_DEPTH {
                    stack[depth] = b;
                    depth += 1;
                } else {
                    return Err(format!(
                        "quote nesting deeper than {MAX_QUOTE_DEPTH} at byte {i}"
                    ));
                }
            }
            b',' if depth == 0 => {
                fields.push(&line[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    fields.push(&line[start..]);
    Ok(fields)
}

fn is_blank(line: &str) -> bool {
    line.trim_matches(FIELD_TRIM).is_empty()
}

/// Streaming CSV reader over any buffered input.
pub struct CsvReader<R> {
    input: R,
    line: String,
    line_no: usize,
    header_read: bool,
    names: Option<ColumnNames>,
}

impl<R: BufRead> CsvReader<R> {
    pub fn new(input: R) -> Self {
        Self {
            input,
            line: String::new(),
            line_no: 0,
            header_read: false,
            names: None,
        }
    }

    /// Load the next non-blank line into `self.line`. Returns `false` at end of input.
    fn next_line(&mut self) -> HoseResult<bool> {
        loop {
            self.line.clear();
            if read_line(&mut self.input, &mut self.line, self.line_no + 1)? == 0 {
                return Ok(false);
            }
            self.line_no += 1;
            if !is_blank(&self.line) {
                return Ok(true);
            }
        }
    }

    fn read_header(&mut self) -> HoseResult<()> {
        if self.header_read {
            return Ok(());
        }
        self.header_read = true;
        if !self.next_line()? {
            return Ok(());
        }
        let fields = split_fields(&self.line).map_err(|m| HoseError::parse(self.line_no, m))?;
        let names = fields
            .into_iter()
            .map(|f| f.trim_matches(FIELD_TRIM).to_string())
            .collect::<Vec<_>>();
        tracing::debug!(columns = names.len(), "csv header read");
        self.names = Some(ColumnNames::new(names));
        Ok(())
    }

    fn parse_line(&self) -> HoseResult<Row> {
        let fields = split_fields(&self.line).map_err(|m| HoseError::parse(self.line_no, m))?;
        if let Some(names) = &self.names
            && fields.len() > names.len()
        {
            return Err(HoseError::ColumnCountMismatch {
                line: self.line_no,
                expected: names.len(),
                found: fields.len(),
            });
        }

        let mut schema = Vec::with_capacity(fields.len());
        let mut values = Vec::with_capacity(fields.len());
        for (col, field) in fields.into_iter().enumerate() {
            let value = field.trim_matches(FIELD_TRIM);
            if !value.is_empty() {
                schema.push(col);
                values.push(value.to_string());
            }
        }
        Ok(Row::new(schema, values, self.names.clone()))
    }
}

impl<R: BufRead + Send> RowReader for CsvReader<R> {
    fn column_names(&mut self) -> HoseResult<Option<ColumnNames>> {
        self.read_header()?;
        Ok(self.names.clone())
    }

    fn read_row(&mut self, _options: &ReadOptions) -> HoseResult<Option<Row>> {
        self.read_header()?;
        if !self.next_line()? {
            return Ok(None);
        }
        self.parse_line().map(Some)
    }
}

fn record_writer<W: Write>(output: W) -> ::csv::Writer<W> {
    WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quote_style(QuoteStyle::Never)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(output)
}

/// CSV writer that re-densifies sparse rows against their column names.
pub struct CsvWriter<W: Write> {
    // Only `None` after a failed blank-line write.
    inner: Option<::csv::Writer<W>>,
}

impl<W: Write> CsvWriter<W> {
    pub fn new(output: W) -> Self {
        Self {
            inner: Some(record_writer(output)),
        }
    }

    /// Flush and return the underlying output.
    pub fn into_inner(self) -> HoseResult<W> {
        self.inner
            .ok_or_else(closed)?
            .into_inner()
            .map_err(|e| HoseError::Io(e.into_error()))
    }

    fn write_fields(&mut self, fields: &[&str]) -> HoseResult<()> {
        if fields.iter().all(|f| f.is_empty()) && fields.len() <= 1 {
            return self.write_blank_line();
        }
        self.inner.as_mut().ok_or_else(closed)?.write_record(fields)?;
        Ok(())
    }

    /// Write a bare terminator. The `csv` crate writes `""` for a record made of one empty
    /// field, which would read back as a present value.
    fn write_blank_line(&mut self) -> HoseResult<()> {
        let inner = self.inner.take().ok_or_else(closed)?;
        let mut out = inner.into_inner().map_err(|e| HoseError::Io(e.into_error()))?;
        out.write_all(b"\n")?;
        self.inner = Some(record_writer(out));
        Ok(())
    }
}

fn closed() -> HoseError {
    HoseError::usage("csv output closed after a failed write")
}

impl<W: Write> RowWriter for CsvWriter<W> {
    fn init(&mut self, names: &ColumnNames) -> HoseResult<()> {
        let header: Vec<&str> = names.iter().collect();
        self.write_fields(&header)
    }

    fn write_row(&mut self, row: &Row, _options: &WriteOptions) -> HoseResult<()> {
        let names = row.names.as_ref().ok_or(HoseError::MissingNames)?;
        let width = names.len();
        let mut fields = vec![""; width];
        for (&col, value) in row.schema.iter().zip(&row.values) {
            let slot = fields
                .get_mut(col)
                .ok_or(HoseError::ColumnOutOfRange { index: col, width })?;
            *slot = value.as_str();
        }
        self.write_fields(&fields)
    }

    fn flush(&mut self) -> HoseResult<()> {
        self.inner.as_mut().ok_or_else(closed)?.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{CsvReader, CsvWriter, split_fields};
    use crate::error::HoseError;
    use crate::formats::{RowReader, RowWriter};
    use crate::types::{ColumnNames, ReadOptions, Row, WriteOptions};

    fn write_one(row: &Row) -> String {
        let mut w = CsvWriter::new(Vec::new());
        w.write_row(row, &WriteOptions::default()).unwrap();
        String::from_utf8(w.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn split_respects_quotes() {
        assert_eq!(split_fields("a,b,c\n").unwrap(), vec!["a", "b", "c"]);
        assert_eq!(
            split_fields("\"x,y\",z").unwrap(),
            vec!["\"x,y\"", "z"]
        );
        assert_eq!(
            split_fields("'say \"hi\", ok',2").unwrap(),
            vec!["'say \"hi\", ok'", "2"]
        );
        assert_eq!(split_fields(",,").unwrap(), vec!["", "", ""]);
    }

    #[test]
    fn split_rejects_fourth_quote_level() {
        assert!(split_fields("\"'\"x").is_ok());
        let err = split_fields("\"'\"'x").unwrap_err();
        assert!(err.contains("quote nesting"));
    }

    #[test]
    fn write_dense_row() {
        let names = ColumnNames::from_iter(["a", "b", "c"]);
        let row = Row::dense(names, vec!["1.5".into(), "2.5".into(), "3.5".into()]);
        assert_eq!(write_one(&row), "1.5,2.5,3.5\n");
    }

    #[test]
    fn write_sparse_row_leaves_blanks() {
        let names = ColumnNames::from_iter(["a", "b", "c", "d"]);
        let row = Row::new(
            vec![0, 1, 3],
            vec!["1.5".into(), "2.5".into(), "3.5".into()],
            Some(names),
        );
        assert_eq!(write_one(&row), "1.5,2.5,,3.5\n");
    }

    #[test]
    fn write_without_names_fails() {
        let row = Row::new(vec![0], vec!["1".into()], None);
        let mut w = CsvWriter::new(Vec::new());
        let err = w.write_row(&row, &WriteOptions::default()).unwrap_err();
        assert!(matches!(err, HoseError::MissingNames));
    }

    #[test]
    fn write_wider_than_names_fails() {
        let names = ColumnNames::from_iter(["a"]);
        let row = Row::new(vec![0, 2], vec!["1".into(), "2".into()], Some(names));
        let mut w = CsvWriter::new(Vec::new());
        let err = w.write_row(&row, &WriteOptions::default()).unwrap_err();
        assert!(matches!(err, HoseError::ColumnOutOfRange { index: 2, width: 1 }));
    }

    #[test]
    fn header_then_rows_share_names() {
        let input = "a,b,c\n1,2,3\n4,,6\n";
        let mut r = CsvReader::new(input.as_bytes());
        let names = r.column_names().unwrap().unwrap();
        assert_eq!(names.to_vec(), vec!["a", "b", "c"]);

        let first = r.read_row(&ReadOptions::default()).unwrap().unwrap();
        assert_eq!(first.schema, vec![0, 1, 2]);
        assert!(first.names.as_ref().unwrap().ptr_eq(&names));

        let second = r.read_row(&ReadOptions::default()).unwrap().unwrap();
        assert_eq!(second.schema, vec![0, 2]);
        assert_eq!(second.values, vec!["4", "6"]);

        assert!(r.read_row(&ReadOptions::default()).unwrap().is_none());
    }

    #[test]
    fn blank_lines_are_skipped() {
        let input = "a,b\n\n1,2\n   \n3,4\n";
        let mut r = CsvReader::new(input.as_bytes());
        let opts = ReadOptions::default();
        assert_eq!(r.read_row(&opts).unwrap().unwrap().values, vec!["1", "2"]);
        assert_eq!(r.read_row(&opts).unwrap().unwrap().values, vec!["3", "4"]);
        assert!(r.read_row(&opts).unwrap().is_none());
    }

    #[test]
    fn rows_wider_than_header_are_rejected() {
        let input = "a,b\n1,2,3\n";
        let mut r = CsvReader::new(input.as_bytes());
        let err = r.read_row(&ReadOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            HoseError::ColumnCountMismatch {
                line: 2,
                expected: 2,
                found: 3
            }
        ));
    }

    #[test]
    fn sparse_line_round_trips() {
        let line = "1,,0.25,,-3\n";
        let input = format!("a,b,c,d,e\n{line}");
        let mut r = CsvReader::new(input.as_bytes());
        let row = r.read_row(&ReadOptions::default()).unwrap().unwrap();
        assert_eq!(row.schema, vec![0, 2, 4]);
        assert_eq!(write_one(&row), line);
    }

    #[test]
    fn quoted_values_keep_their_quotes() {
        let input = "name,note\n\"Smith, J\",'ok'\n";
        let mut r = CsvReader::new(input.as_bytes());
        let row = r.read_row(&ReadOptions::default()).unwrap().unwrap();
        assert_eq!(row.values, vec!["\"Smith, J\"", "'ok'"]);
        assert_eq!(write_one(&row), "\"Smith, J\",'ok'\n");
    }

    #[test]
    fn single_absent_column_writes_an_empty_line() {
        let names = ColumnNames::from_iter(["b"]);
        let mut w = CsvWriter::new(Vec::new());
        w.init(&names).unwrap();
        w.write_row(&Row::new(vec![], vec![], Some(names.clone())), &WriteOptions::default())
            .unwrap();
        w.write_row(&Row::new(vec![0], vec!["3".into()], Some(names)), &WriteOptions::default())
            .unwrap();
        w.flush().unwrap();
        let out = String::from_utf8(w.into_inner().unwrap()).unwrap();
        assert_eq!(out, "b\n\n3\n");

        // The blank line is skipped on the way back in; it never becomes a value.
        let mut r = CsvReader::new(out.as_bytes());
        let row = r.read_row(&ReadOptions::default()).unwrap().unwrap();
        assert_eq!(row.values, vec!["3"]);
        assert!(r.read_row(&ReadOptions::default()).unwrap().is_none());
    }

    #[test]
    fn single_empty_header_name_is_not_quoted() {
        let mut w = CsvWriter::new(Vec::new());
        w.init(&ColumnNames::from_iter([""])).unwrap();
        assert_eq!(String::from_utf8(w.into_inner().unwrap()).unwrap(), "\n");
    }

    #[test]
    fn invalid_utf8_reports_its_line() {
        let input: &[u8] = b"a,b\n1,2\n\xff,3\n";
        let mut r = CsvReader::new(input);
        assert!(r.read_row(&ReadOptions::default()).unwrap().is_some());
        let err = r.read_row(&ReadOptions::default()).unwrap_err();
        assert!(matches!(err, HoseError::Read { line: 3, .. }));
        assert_eq!(err.exit_code(), 2);
    }
}
