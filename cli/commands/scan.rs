use anyhow::{Context, Result};
use xbundle_core::{OutputFormat, ScanListing, detect_with_report};

use crate::cli_args::ScanArgs;
use crate::output;
use crate::{load_config_for_command, load_document};

pub fn handle_scan_command(args: &ScanArgs, _quiet: bool) -> Result<()> {
    let config = load_config_for_command(&args.config_file, &args.input)?;
    let format_name = args
        .format_output
        .format
        .as_deref()
        .unwrap_or(&config.output.format);
    let format = OutputFormat::parse(format_name)?;

    let document = load_document(&args.input.input)?;
    let report = detect_with_report(&document, &config.detect)
        .context("Failed to scan document for code files")?;

    if report.records.is_empty() {
        log::info!("No headings in {} named a file", args.input.input);
    }

    let listing = ScanListing::from_report(&args.input.input, &report, args.explain);
    output::print_listing(&listing, format)
}
