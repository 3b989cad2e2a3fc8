//! CLI argument definitions for the excel decoder.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "excel-decoder",
    version,
    about = "Recover canonical field names of re-obfuscated excel dumps",
    long_about = "Recover canonical field names of re-obfuscated excel dumps.\n\n\
                  Master schemas are generated offline from trusted plaintext dumps;\n\
                  obfuscated dumps are then decoded against them and indexed."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Config file (default: ./excel-decoder.toml when present).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Extra anchors TOML file, appended to the built-in anchors.
    #[arg(long = "anchors", value_name = "PATH", global = true)]
    pub anchors: Option<PathBuf>,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

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
    /// Regenerate master schemas from already decoded (plaintext) dumps.
    Generate(GenerateArgs),

    /// Decode obfuscated dumps against their master schemas.
    Decode(DecodeArgs),

    /// List datasets that have a master schema.
    Datasets,
}

#[derive(Parser)]
pub struct GenerateArgs {
    /// Dataset to generate (repeatable; default: every dump in the source directory).
    #[arg(long = "target", value_name = "DATASET")]
    pub targets: Vec<String>,

    /// Overwrite existing master files.
    #[arg(long = "force")]
    pub force: bool,

    /// Directory of plaintext dumps (default: the configured dump directory).
    #[arg(long = "source", value_name = "DIR")]
    pub source: Option<PathBuf>,
}

#[derive(Parser)]
pub struct DecodeArgs {
    /// Decode a single dataset.
    #[arg(long = "dataset", value_name = "DATASET")]
    pub dataset: Option<String>,

    /// Accept decodes between the pattern-mismatch floor and the acceptance
    /// threshold, listing the unmatched fields.
    #[arg(long = "accept-partial")]
    pub accept_partial: bool,

    /// Print the summary as JSON instead of a table.
    #[arg(long = "json")]
    pub json: bool,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
