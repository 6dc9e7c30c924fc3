//! JSON writer.
//!
//! Output is a single array of objects, one object per row, keyed by column name. Values that
//! parse as numbers are emitted as JSON numbers exactly as written in the input; everything else
//! becomes a JSON string. Absent columns are left out of the object.
//!
//! The opening `[` is written with the first row and the closing `]` by [`RowWriter::flush`], so
//! an empty stream still produces a valid `[]`.

use std::io::Write;

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::value::RawValue;

use crate::error::{HoseError, HoseResult};
use crate::types::{ColumnNames, Row, WriteOptions};

use super::RowWriter;

pub struct JsonWriter<W: Write> {
    out: W,
    rows: usize,
    finished: bool,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            rows: 0,
            finished: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// One row viewed as a JSON object.
struct JsonRecord<'a> {
    row: &'a Row,
    names: &'a ColumnNames,
}

impl Serialize for JsonRecord<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.row.len()))?;
        for (&col, value) in self.row.schema.iter().zip(&self.row.values) {
            // Width is checked before serializing.
            let key = self.names.get(col).unwrap_or_default();
            map.serialize_entry(key, &JsonScalar(value))?;
        }
        map.end()
    }
}

struct JsonScalar<'a>(&'a str);

impl Serialize for JsonScalar<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let v = self.0;
        if v.parse::<f64>().is_ok()
            && let Ok(raw) = RawValue::from_string(v.to_string())
        {
            return raw.serialize(serializer);
        }
        serializer.serialize_str(v)
    }
}

impl<W: Write> RowWriter for JsonWriter<W> {
    fn write_row(&mut self, row: &Row, _options: &WriteOptions) -> HoseResult<()> {
        if self.finished {
            return Err(HoseError::usage("json output already finalized"));
        }
        let names = row.names.as_ref().ok_or(HoseError::MissingNames)?;
        if let Some(&col) = row.schema.iter().find(|&&c| c >= names.len()) {
            return Err(HoseError::ColumnOutOfRange {
                index: col,
                width: names.len(),
            });
        }

        self.out.write_all(if self.rows == 0 { b"[" } else { b"," })?;
        serde_json::to_writer(&mut self.out, &JsonRecord { row, names })?;
        self.rows += 1;
        Ok(())
    }

    fn flush(&mut self) -> HoseResult<()> {
        if !self.finished {
            self.finished = true;
            if self.rows == 0 {
                self.out.write_all(b"[")?;
            }
            self.out.write_all(b"]")?;
        }
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::JsonWriter;
    use crate::error::HoseError;
    use crate::formats::RowWriter;
    use crate::types::{ColumnNames, Row, WriteOptions};

    fn write_all(rows: &[Row]) -> String {
        let mut w = JsonWriter::new(Vec::new());
        for row in rows {
            w.write_row(row, &WriteOptions::default()).unwrap();
        }
        w.flush().unwrap();
        String::from_utf8(w.into_inner()).unwrap()
    }

    fn names() -> ColumnNames {
        ColumnNames::from_iter(["col1", "col2", "col3"])
    }

    #[test]
    fn numbers_stay_verbatim_and_text_is_quoted() {
        let row = Row::dense(names(), vec!["1".into(), "2.0".into(), "three".into()]);
        assert_eq!(
            write_all(&[row]),
            r#"[{"col1":1,"col2":2.0,"col3":"three"}]"#
        );
    }

    #[test]
    fn rows_are_comma_separated() {
        let rows = vec![
            Row::dense(names(), vec!["1".into(), "2".into(), "3".into()]),
            Row::new(vec![0, 2], vec!["4".into(), "x".into()], Some(names())),
            Row::dense(names(), vec!["7".into(), "8".into(), "9".into()]),
        ];
        assert_eq!(
            write_all(&rows),
            r#"[{"col1":1,"col2":2,"col3":3},{"col1":4,"col3":"x"},{"col1":7,"col2":8,"col3":9}]"#
        );
    }

    #[test]
    fn empty_stream_is_empty_array() {
        assert_eq!(write_all(&[]), "[]");
    }

    #[test]
    fn non_json_numbers_are_strings() {
        let names = ColumnNames::from_iter(["a", "b", "c"]);
        let row = Row::dense(names, vec!["NaN".into(), "+1".into(), "say \"hi\"".into()]);
        assert_eq!(
            write_all(&[row]),
            r#"[{"a":"NaN","b":"+1","c":"say \"hi\""}]"#
        );
    }

    #[test]
    fn write_after_flush_fails() {
        let mut w = JsonWriter::new(Vec::new());
        w.flush().unwrap();
        let row = Row::dense(names(), vec!["1".into(), "2".into(), "3".into()]);
        let err = w.write_row(&row, &WriteOptions::default()).unwrap_err();
        assert!(matches!(err, HoseError::Usage { .. }));
    }

    #[test]
    fn rows_need_names() {
        let mut w = JsonWriter::new(Vec::new());
        let row = Row::new(vec![0], vec!["1".into()], None);
        let err = w.write_row(&row, &WriteOptions::default()).unwrap_err();
        assert!(matches!(err, HoseError::MissingNames));
    }
}
