use anyhow::{Context, Result};
use xbundle_core::detect;

use crate::cli_args::PreviewArgs;
use crate::commands::selection_from_opts;
use crate::output;
use crate::{load_config_for_command, load_document};

pub fn handle_preview_command(args: &PreviewArgs, _quiet: bool) -> Result<()> {
    let config = load_config_for_command(&args.config_file, &args.input)?;
    let document = load_document(&args.input.input)?;
    let records = detect(&document, &config.detect)
        .context("Failed to scan document for code files")?;

    for (index, record) in selection_from_opts(&args.selection)?.pick(&records)? {
        output::print_preview(index, record);
    }
    Ok(())
}
