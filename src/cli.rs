//! CLI argument definitions for `hose`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};

#[derive(Parser)]
#[command(
    name = "hose",
    version,
    about = "Utility for managing big row-based datasets",
    long_about = "Stream row-based datasets between CSV, libSVM, JSON and plain text.\n\n\
                  Rows are processed one at a time by a chain of concurrent stages, so\n\
                  inputs never have to fit in memory."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Concatenate inputs, one after another, into a single output.
    #[command(visible_alias = "cat")]
    Merge(MergeArgs),

    /// Copy the rows [start, end) of one input.
    Slice(SliceArgs),

    /// Convert inputs between formats (not implemented).
    Convert(ConvertArgs),
}

/// Output, format and filtering flags shared by every command.
#[derive(Args, Clone, Debug)]
pub struct IoArgs {
    /// PATH to direct output to (if not given, writes to stdout).
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Input FORMAT (if not given, guessed from extension).
    #[arg(short = 'f', long = "from", visible_alias = "format", value_name = "FORMAT")]
    pub from: Option<String>,

    /// Output FORMAT (if not given, guessed from the output extension).
    #[arg(short = 't', long = "to", value_name = "FORMAT")]
    pub to: Option<String>,

    /// Comma-separated column names or zero-based positions to keep, in output order.
    #[arg(short = 'c', long = "columns", value_name = "LIST")]
    pub columns: Option<String>,

    /// Keep only rows where COLUMN equals VALUE.
    #[arg(short = 'p', long = "predicate", value_name = "COLUMN=VALUE")]
    pub predicate: Option<String>,

    /// Column written as the label of libSVM output.
    #[arg(long = "libsvm-label", value_name = "COLUMN", default_value_t = 0)]
    pub libsvm_label: usize,

    /// Do not write a header line to CSV output.
    #[arg(long = "no-header")]
    pub no_header: bool,

    /// Print a JSON run summary to stderr when done.
    #[arg(long = "summary")]
    pub summary: bool,
}

/// Row window flags. `-1` as end means "to the end of the input".
#[derive(Args, Clone, Copy, Debug)]
pub struct WindowArgs {
    /// ROW to start from (zero-based).
    #[arg(
        short = 's',
        long = "start",
        value_name = "ROW",
        default_value_t = 0,
        allow_negative_numbers = true
    )]
    pub start: i64,

    /// ROW to stop before (-1 for no limit).
    #[arg(
        short = 'e',
        long = "end",
        value_name = "ROW",
        default_value_t = -1,
        allow_negative_numbers = true
    )]
    pub end: i64,
}

#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Input files or glob patterns, merged in the order given.
    #[arg(value_name = "INPUT", required = true)]
    pub inputs: Vec<String>,

    /// Applied to each input separately.
    #[command(flatten)]
    pub window: WindowArgs,

    #[command(flatten)]
    pub io: IoArgs,
}

#[derive(Args, Debug)]
pub struct SliceArgs {
    /// Input file.
    #[arg(value_name = "INPUT")]
    pub input: String,

    #[command(flatten)]
    pub window: WindowArgs,

    #[command(flatten)]
    pub io: IoArgs,
}

#[derive(Args, Debug)]
pub struct ConvertArgs {
    #[arg(value_name = "INPUT")]
    pub inputs: Vec<String>,

    #[command(flatten)]
    pub io: IoArgs,
}

/// CLI log format choices.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
