use anyhow::{Context, Result};
use colored::*;
use std::io::{self, Write};
use xbundle_core::{
    AppError, ArchiveBuilder, CollisionPolicy, CompressionSetting, Config, DirectorySink, deliver,
    detect,
};

use crate::cli_args::BundleArgs;
use crate::commands::selection_from_opts;
use crate::{load_config_for_command, load_document};

pub fn handle_bundle_command(args: &BundleArgs, quiet: bool) -> Result<()> {
    let mut config = load_config_for_command(&args.config_file, &args.input)?;
    apply_bundle_overrides(&mut config, args)?;

    let document = load_document(&args.input.input)?;
    let records = detect(&document, &config.detect)
        .context("Failed to scan document for code files")?;
    if records.is_empty() {
        anyhow::bail!(AppError::InvalidArgument(format!(
            "No code files found in {}",
            args.input.input
        )));
    }

    let selected = selection_from_opts(&args.selection)?.apply(&records)?;
    if !quiet {
        eprintln!(
            "{} Preparing {} of {} files...",
            "📦".blue(),
            selected.len(),
            records.len()
        );
    }

    let builder = ArchiveBuilder::new(&config.archive);
    let mut progress = ProgressLine::new(io::stderr(), quiet);
    let built = builder.build(&selected, |percent| progress.update(percent));
    // The progress line must be closed before any error is printed.
    progress.finish();
    let artifact = built.context("Failed to build archive")?;

    for path in &artifact.overwritten {
        if !quiet {
            eprintln!(
                "{} Two selected files share the path '{}'; the later one was kept.",
                "⚠️".yellow(),
                path.yellow()
            );
        }
    }

    let output_dir = config.get_effective_output_dir()?;
    let mut sink = DirectorySink::new(&output_dir);
    let id = deliver(&artifact, &mut sink)?;

    if !quiet {
        println!(
            "{} Saved {} files ({}) to: {}",
            "✅".green(),
            artifact.file_count,
            artifact.size_readable(),
            id.to_string().blue()
        );
    }
    Ok(())
}

/// Single `\r`-rewritten status line for compression progress.
struct ProgressLine<W: Write> {
    out: W,
    quiet: bool,
    last_shown: Option<i64>,
}

impl<W: Write> ProgressLine<W> {
    fn new(out: W, quiet: bool) -> Self {
        Self {
            out,
            quiet,
            last_shown: None,
        }
    }

    fn update(&mut self, percent: f64) {
        let shown = percent.round() as i64;
        if self.quiet || self.last_shown == Some(shown) {
            return;
        }
        self.last_shown = Some(shown);
        let _ = write!(self.out, "\r{} Compressing... {:>3}%", "⏳".blue(), shown);
        let _ = self.out.flush();
    }

    fn finish(&mut self) {
        if self.last_shown.take().is_some() {
            let _ = writeln!(self.out);
        }
    }
}

fn apply_bundle_overrides(config: &mut Config, args: &BundleArgs) -> Result<()> {
    if let Some(dir) = &args.output_dir {
        config.save.output_dir = dir.clone();
    }
    if let Some(method) = &args.compression {
        config.archive.compression = parse_compression(method)?;
    }
    if args.strict_paths {
        config.archive.on_collision = CollisionPolicy::Error;
    }
    Ok(())
}

fn parse_compression(method: &str) -> Result<CompressionSetting> {
    match method.to_lowercase().as_str() {
        "deflate" => Ok(CompressionSetting::Deflate),
        "bzip2" => Ok(CompressionSetting::Bzip2),
        "zstd" => Ok(CompressionSetting::Zstd),
        other => Err(AppError::InvalidArgument(format!(
            "Unknown compression method '{}'",
            other
        ))
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli_args::{Cli, Commands};
    use clap::Parser;

    fn bundle_args(argv: &[&str]) -> BundleArgs {
        let mut full = vec!["xbundle", "bundle", "page.html"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            Some(Commands::Bundle(args)) => args,
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn flags_override_config() {
        let args = bundle_args(&["-o", "dist", "--compression", "zstd", "--strict-paths"]);
        let mut config = Config::default();
        apply_bundle_overrides(&mut config, &args).unwrap();
        assert_eq!(config.save.output_dir, std::path::PathBuf::from("dist"));
        assert_eq!(config.archive.compression, CompressionSetting::Zstd);
        assert_eq!(config.archive.on_collision, CollisionPolicy::Error);
    }

    #[test]
    fn progress_line_is_closed_once_started() {
        let mut out = Vec::new();
        let mut progress = ProgressLine::new(&mut out, false);
        progress.update(0.0);
        progress.update(0.2);
        progress.update(42.0);
        progress.finish();
        progress.finish();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("Compressing").count(), 2);
        assert!(text.ends_with("42%\n"));

        let mut untouched = Vec::new();
        let mut progress = ProgressLine::new(&mut untouched, false);
        progress.finish();
        let mut silent = ProgressLine::new(Vec::new(), true);
        silent.update(50.0);
        silent.finish();
        assert!(untouched.is_empty());
        assert!(silent.out.is_empty());
    }

    #[test]
    fn no_flags_keep_config() {
        let args = bundle_args(&[]);
        let mut config = Config::default();
        apply_bundle_overrides(&mut config, &args).unwrap();
        assert_eq!(config, Config::default());
    }
}
