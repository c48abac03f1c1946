mod cli_args;
mod commands;
mod output;
mod watch;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use colored::*;
use std::env;
use std::io;
use std::path::Path;
use std::process;

use cli_args::{Cli, Commands, ConfigFileOpts, InputOpts};
use xbundle_core::{AppError, Config, Document};

fn main() {
    let cli_args = Cli::parse();

    setup_logging(cli_args.quiet, cli_args.verbose);

    let quiet = cli_args.quiet;
    let verbose = cli_args.verbose;

    log::debug!("CLI args parsed: {:?}", cli_args);

    let exit_code = match run_app(cli_args, quiet, verbose) {
        Ok(_) => {
            log::info!("Application finished successfully.");
            0
        }
        Err(e) => {
            let exit_code = exit_code_for(e.downcast_ref::<AppError>());

            // Fatal outcomes still reach stderr when quiet.
            if !quiet || matches!(exit_code, 1 | 3 | 4 | 5) {
                eprintln!("{} {:#}", "Error:".red().bold(), e);
            } else {
                log::error!("Application failed: {:#}", e);
            }

            exit_code
        }
    };
    log::debug!("Exiting with code {}", exit_code);
    process::exit(exit_code);
}

fn exit_code_for(error: Option<&AppError>) -> i32 {
    match error {
        Some(AppError::Config(_)) => 1,
        Some(AppError::TomlParse(_)) => 1,
        Some(AppError::TomlSerialize(_)) => 1,
        Some(AppError::Io(_)) => 2,
        Some(AppError::FileRead { .. }) => 2,
        Some(AppError::FileWrite { .. }) => 2,
        Some(AppError::DirCreation { .. }) => 2,
        Some(AppError::CompressionUnavailable(_)) => 3,
        Some(AppError::CompressionFailure(_)) => 3,
        Some(AppError::PathConflict { .. }) => 3,
        Some(AppError::DownloadFailure(_)) => 4,
        Some(AppError::InvalidArgument(_)) => 5,
        Some(AppError::DurationParse(_)) => 5,
        Some(AppError::Glob(_)) => 5,
        Some(AppError::EmptySelection) => 5,
        Some(AppError::JsonSerialize(_)) => 6,
        Some(AppError::YamlError(_)) => 6,
        Some(AppError::XmlSerialize(_)) => 6,
        Some(_) => 1,
        None => 1,
    }
}

fn setup_logging(quiet: bool, verbose: u8) {
    let log_level = if quiet {
        log::LevelFilter::Off
    } else {
        match verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();
    log::trace!("Logger initialized with level: {:?}", log_level);
}

fn run_app(cli: Cli, quiet: bool, verbose: u8) -> Result<()> {
    match cli.command {
        None => {
            Cli::command().print_help()?;
        }
        Some(command) => match command {
            Commands::Scan(args) => {
                log::debug!("Executing 'scan' command...");
                commands::scan::handle_scan_command(&args, quiet)?;
            }
            Commands::Bundle(args) => {
                log::debug!("Executing 'bundle' command...");
                commands::bundle::handle_bundle_command(&args, quiet)?;
            }
            Commands::Preview(args) => {
                log::debug!("Executing 'preview' command...");
                commands::preview::handle_preview_command(&args, quiet)?;
            }
            Commands::Watch(args) => {
                log::debug!("Executing 'watch' command...");
                watch::run_watch_mode(args, quiet, verbose)?;
            }
            Commands::Completion(args) => {
                log::debug!("Executing 'completion' command...");
                commands::completion::handle_completion_command(&args, quiet)?;
            }
            Commands::Config(args) => {
                log::debug!("Executing 'config' command...");
                let base_dir = env::current_dir().context("Failed to read current directory")?;
                commands::config::handle_config_command(&args, &base_dir, quiet)?;
            }
        },
    }
    Ok(())
}

/// Loads the config file (if any) and applies the input-level CLI overrides.
pub fn load_config_for_command(config_opts: &ConfigFileOpts, input: &InputOpts) -> Result<Config> {
    let base_dir = env::current_dir().context("Failed to read current directory")?;
    let config_path = Config::resolve_config_path(
        &base_dir,
        config_opts.config.as_ref(),
        config_opts.no_config,
    )
    .context("Failed to resolve configuration path")?;

    let mut config = match &config_path {
        Some(path) => Config::load_from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    if !input.heading_levels.is_empty() {
        config.detect.heading_levels = input.heading_levels.clone();
    }
    log::trace!("Effective config: {:?}", config);
    Ok(config)
}

/// Reads the document named on the command line; `-` is standard input.
pub fn load_document(input: &str) -> Result<Document> {
    if input == "-" {
        Document::from_reader(io::stdin().lock()).context("Failed to read document from stdin")
    } else {
        Document::load(Path::new(input))
            .with_context(|| format!("Failed to load document {}", input))
    }
}
