//! excel-decoder CLI.

use std::io::{self, IsTerminal};
use std::process::ExitCode;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use tracing::level_filters::LevelFilter;

use excel_cache::DecoderConfig;
use excel_cli::cli::{Cli, Command, LogFormatArg, LogLevelArg};
use excel_cli::commands::{resolve_anchors, run_datasets, run_decode, run_generate};
use excel_cli::logging::{LogConfig, LogFormat, init_logging};
use excel_cli::summary::{
    decode_summaries, print_datasets, print_decode_summary, print_generate_summary,
};

fn main() -> ExitCode {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        return ExitCode::FAILURE;
    }
    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

/// Runs the selected command; `Ok(false)` when some dataset failed.
fn run(cli: &Cli) -> Result<bool> {
    let config = DecoderConfig::discover(cli.config.as_deref())?;
    match &cli.command {
        Command::Generate(args) => {
            let anchors = resolve_anchors(&config, cli.anchors.as_deref())?;
            let report = run_generate(&config, &anchors, args)?;
            print_generate_summary(&report);
            Ok(!report.has_failures())
        }
        Command::Decode(args) => {
            let anchors = resolve_anchors(&config, cli.anchors.as_deref())?;
            let report = run_decode(&config, &anchors, args)?;
            if args.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&decode_summaries(&report))?
                );
            } else {
                print_decode_summary(&report, &config.thresholds());
            }
            Ok(!report.has_failures())
        }
        Command::Datasets => {
            print_datasets(&run_datasets(&config)?);
            Ok(true)
        }
    }
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
