//! Format lookup by name or path.
//!
//! - [`Format::from_name`] and [`get_reader`] / [`get_writer`] resolve the names used on the
//!   command line (`csv`, `svm`, `json`, `txt`)
//! - [`Format::from_path`] infers a format from a file extension

use std::fmt;
use std::io::{BufRead, Write};
use std::path::Path;
use std::str::FromStr;

use crate::error::{HoseError, HoseResult};

use super::{
    CsvReader, CsvWriter, JsonWriter, LibSvmReader, LibSvmWriter, RowReader, RowWriter,
    TextReader, TextWriter,
};

/// Supported row formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// Comma-separated values with a header line.
    Csv,
    /// libSVM sparse feature lines.
    LibSvm,
    /// Array of JSON objects (write-only).
    Json,
    /// One value per line.
    Text,
}

impl Format {
    /// Parse a format name (case-insensitive). Also accepts the usual file extensions.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "svm" | "libsvm" => Some(Self::LibSvm),
            "json" => Some(Self::Json),
            "txt" | "text" => Some(Self::Text),
            _ => None,
        }
    }

    /// Infer the format from a path's extension.
    pub fn from_path(path: &Path) -> HoseResult<Self> {
        let ext = path.extension().and_then(|s| s.to_str()).ok_or_else(|| {
            HoseError::usage(format!(
                "cannot infer format: path has no extension ({})",
                path.display()
            ))
        })?;
        Self::from_name(ext).ok_or_else(|| HoseError::UnknownFormat {
            name: ext.to_string(),
        })
    }

    /// Canonical name, as accepted by [`Format::from_name`].
    pub fn name(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::LibSvm => "svm",
            Self::Json => "json",
            Self::Text => "txt",
        }
    }

    pub fn can_read(self) -> bool {
        !matches!(self, Self::Json)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Format {
    type Err = HoseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| HoseError::UnknownFormat {
            name: s.to_string(),
        })
    }
}

/// Build a reader for `format` over `input`.
pub fn reader_for<R>(format: Format, input: R) -> HoseResult<Box<dyn RowReader>>
where
    R: BufRead + Send + 'static,
{
    Ok(match format {
        Format::Csv => Box::new(CsvReader::new(input)),
        Format::LibSvm => Box::new(LibSvmReader::new(input)),
        Format::Text => Box::new(TextReader::new(input)),
        Format::Json => {
            return Err(HoseError::UnsupportedDirection {
                name: "json",
                direction: "reading",
            });
        }
    })
}

/// Build a writer for `format` over `out`.
pub fn writer_for<'a, W>(format: Format, out: W) -> HoseResult<Box<dyn RowWriter + 'a>>
where
    W: Write + 'a,
{
    Ok(match format {
        Format::Csv => Box::new(CsvWriter::new(out)),
        Format::LibSvm => Box::new(LibSvmWriter::new(out)),
        Format::Json => Box::new(JsonWriter::new(out)),
        Format::Text => Box::new(TextWriter::new(out)),
    })
}

/// Resolve a reader by format name.
pub fn get_reader<R>(name: &str, input: R) -> HoseResult<Box<dyn RowReader>>
where
    R: BufRead + Send + 'static,
{
    reader_for(name.parse()?, input)
}

/// Resolve a writer by format name.
pub fn get_writer<'a, W>(name: &str, out: W) -> HoseResult<Box<dyn RowWriter + 'a>>
where
    W: Write + 'a,
{
    writer_for(name.parse()?, out)
}
