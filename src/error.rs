use thiserror::Error;

/// Convenience result type used across the crate.
pub type HoseResult<T> = Result<T, HoseError>;

/// Broad classification of a [`HoseError`].
///
/// Used for log severity and exit-code selection at the command-line boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorClass {
    /// Bad flag combination, bad window, unknown format name. Raised before any I/O.
    Usage,
    /// Missing file, open or create failure.
    Resource,
    /// Malformed input row.
    Parse,
    /// Configuration that cannot be satisfied by the data (unknown column, missing target).
    Semantic,
    /// Output could not be written.
    Write,
    /// A worker thread died.
    Internal,
}

/// Error type shared by codecs, transformers, the execution engine and orchestration.
#[derive(Debug, Error)]
pub enum HoseError {
    /// Underlying I/O error while reading or writing a stream.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV output error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON output error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid combination of options.
    #[error("invalid usage: {message}")]
    Usage { message: String },

    /// Format name not recognized at all.
    #[error("format not known: '{name}'")]
    UnknownFormat { name: String },

    /// Format is known but cannot be used in the requested direction (e.g. reading JSON).
    #[error("format '{name}' does not support {direction}")]
    UnsupportedDirection {
        name: &'static str,
        direction: &'static str,
    },

    /// Input file does not exist.
    #[error("input file not found: {path}")]
    MissingInput { path: String },

    /// Input file exists but could not be opened.
    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Output file could not be created.
    #[error("failed to create {path}: {source}")]
    Create {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// An input stream could not be read: an OS read failure or bytes that are not UTF-8.
    #[error("read error at line {line}: {source}")]
    Read {
        line: usize,
        #[source]
        source: std::io::Error,
    },

    /// A row could not be parsed.
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// A CSV row is wider than the header that established the stream's columns.
    #[error("line {line} has {found} fields but the header has {expected}")]
    ColumnCountMismatch {
        line: usize,
        expected: usize,
        found: usize,
    },

    /// A writer that aligns against column names received a row without them.
    #[error("missing names record")]
    MissingNames,

    /// A row references a column index that the column names cannot cover.
    #[error("column index {index} out of range for {width} columns")]
    ColumnOutOfRange { index: usize, width: usize },

    /// A column name could not be resolved against the stream's column names.
    #[error("unknown column '{name}'")]
    UnknownColumn { name: String },

    /// A predicate expression is not of the form `<column>=<value>`.
    #[error("invalid predicate '{expr}': expected <column>=<value>")]
    InvalidPredicate { expr: String },

    /// A present, non-zero column 0 would be written as libSVM feature index 0, which readers
    /// take for the label position.
    #[error("column 0 cannot be written as a libSVM feature while the label is column {target}")]
    FeatureIndexZero { target: usize },

    /// The libSVM label column is absent from a row.
    #[error("target column missing: column {column} not present in row")]
    TargetColumnMissing { column: usize },

    /// Inputs being merged disagree on their column names.
    #[error("column names of input {input} ({found:?}) do not match {expected:?}")]
    ColumnMismatch {
        input: usize,
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// The stream ended before the slice start offset was consumed.
    #[error("slice beginning not reached: wanted to skip {from} rows, input has {rows}")]
    SliceStartNotReached { from: usize, rows: usize },

    /// A command exists on the surface but has no implementation.
    #[error("not implemented: {command}")]
    NotImplemented { command: &'static str },

    /// A worker thread panicked.
    #[error("worker '{worker}' panicked")]
    WorkerPanicked { worker: String },
}

impl HoseError {
    /// Build a [`HoseError::Usage`].
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
        }
    }

    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }

    /// Classify this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Usage { .. }
            | Self::UnknownFormat { .. }
            | Self::UnsupportedDirection { .. }
            | Self::InvalidPredicate { .. } => ErrorClass::Usage,
            Self::MissingInput { .. } | Self::Open { .. } | Self::Create { .. } => {
                ErrorClass::Resource
            }
            Self::Read { .. }
            | Self::Parse { .. }
            | Self::ColumnCountMismatch { .. }
            | Self::SliceStartNotReached { .. } => ErrorClass::Parse,
            Self::MissingNames
            | Self::ColumnOutOfRange { .. }
            | Self::UnknownColumn { .. }
            | Self::TargetColumnMissing { .. }
            | Self::FeatureIndexZero { .. }
            | Self::ColumnMismatch { .. } => ErrorClass::Semantic,
            Self::Io(_) | Self::Csv(_) | Self::Json(_) => ErrorClass::Write,
            Self::NotImplemented { .. } | Self::WorkerPanicked { .. } => ErrorClass::Internal,
        }
    }

    /// Process exit code used by the command-line front end.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Open { .. }
            | Self::Read { .. }
            | Self::Parse { .. }
            | Self::ColumnCountMismatch { .. }
            | Self::SliceStartNotReached { .. } => 2,
            Self::Create { .. } | Self::NotImplemented { .. } => 3,
            _ => 1,
        }
    }
}
