pub mod bundle;
pub mod completion;
pub mod config;
pub mod preview;
pub mod scan;

use crate::cli_args::SelectionOpts;
use xbundle_core::{Result, Selection};

/// Turns the `--select/--include/--exclude` flags into a [`Selection`].
pub fn selection_from_opts(opts: &SelectionOpts) -> Result<Selection> {
    let mut selection = Selection::all()
        .with_include(&opts.include)?
        .with_exclude(&opts.exclude)?;
    if let Some(spec) = &opts.select {
        selection = selection.with_indices(spec)?;
    }
    Ok(selection)
}
