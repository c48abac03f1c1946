use anyhow::{Context, Result};
use colored::*;
use notify::{Event, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Instant;
use xbundle_core::{
    AppError, Config, Reconciliation, RescanScheduler, Trigger, detect, reconcile,
};

use crate::cli_args::WatchArgs;
use crate::{load_config_for_command, load_document};

pub fn run_watch_mode(watch_args: WatchArgs, quiet: bool, verbose: u8) -> Result<()> {
    let input = &watch_args.input.input;
    if input == "-" {
        anyhow::bail!(AppError::InvalidArgument(
            "Watch mode needs a file path, not standard input".to_string()
        ));
    }
    let target = PathBuf::from(input)
        .canonicalize()
        .with_context(|| format!("Cannot watch {}", input))?;
    let watch_dir = target
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| anyhow::anyhow!("{} has no parent directory", target.display()))?;

    let mut config = load_config_for_command(&watch_args.config_file, &watch_args.input)
        .context("Failed to load initial configuration for watch mode")?;
    if let Some(delay) = &watch_args.watch_delay {
        config.watch.delay = delay.clone();
    }
    let delay = config
        .get_watch_delay()
        .context("Invalid watch delay duration")?;

    if !quiet {
        println!(
            "👀 Watching '{}' (quiet window {:?}). Press Ctrl+C to exit.",
            target.display(),
            delay
        );
    }

    let mut trigger = rescan(&target, &config, None, &watch_args, quiet);

    // Watch the directory: editors often save by replacing the file.
    let (tx, rx) = mpsc::channel::<notify::Result<Event>>();
    let mut watcher =
        notify::recommended_watcher(tx).context("Failed to create file watcher")?;
    watcher
        .watch(&watch_dir, RecursiveMode::NonRecursive)
        .with_context(|| format!("Failed to watch {}", watch_dir.display()))?;

    let mut scheduler = RescanScheduler::new(delay);
    loop {
        let received = match scheduler.time_until_due(Instant::now()) {
            Some(wait) => rx.recv_timeout(wait),
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match received {
            Ok(Ok(event)) => {
                if concerns_target(&event, &target) {
                    log::trace!("Relevant event: {:?}", event);
                    scheduler.notify_mutation(Instant::now());
                }
            }
            Ok(Err(error)) => {
                if !quiet {
                    eprintln!("{} {:#}", "⚠️ Watch error:".yellow(), error);
                }
                log::error!("Notify error received: {:?}", error);
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                eprintln!("{}", "⛔ Watcher channel closed.".red());
                break Ok(());
            }
        }

        if scheduler.poll(Instant::now()) {
            if !quiet && verbose > 0 {
                eprintln!("{}", "🔄 Change settled, rescanning...".blue());
            }
            trigger = rescan(&target, &config, trigger, &watch_args, quiet);
        }
    }
}

fn concerns_target(event: &Event, target: &Path) -> bool {
    if event.kind.is_access() {
        return false;
    }
    event
        .paths
        .iter()
        .any(|path| path == target || path.file_name() == target.file_name())
}

/// One detector pass plus reconciliation. Failures are reported and the previous trigger kept.
fn rescan(
    target: &Path,
    config: &Config,
    previous: Option<Trigger>,
    watch_args: &WatchArgs,
    quiet: bool,
) -> Option<Trigger> {
    if watch_args.clear {
        if let Err(e) = clearscreen::clear() {
            log::warn!("Failed to clear screen: {}", e);
        }
    }

    let records = match load_document(&target.to_string_lossy())
        .and_then(|doc| detect(&doc, &config.detect).map_err(anyhow::Error::from))
    {
        Ok(records) => records,
        Err(e) => {
            if !quiet {
                eprintln!("{} {:#}", "⚠️ Error during rescan:".yellow(), e);
            }
            return previous;
        }
    };

    let (trigger, outcome) = reconcile(previous, &records);
    if !quiet {
        match (outcome, trigger) {
            (Reconciliation::Created, Some(t)) => println!(
                "{} Found {} code files. Run `xbundle bundle {}` to save them.",
                "✨".green(),
                t.count.to_string().cyan(),
                target.display()
            ),
            (Reconciliation::Updated { previous }, Some(t)) if previous != t.count => println!(
                "{} Code files: {} (was {})",
                "🔄".blue(),
                t.count.to_string().cyan(),
                previous
            ),
            (Reconciliation::Updated { .. }, Some(t)) => {
                log::info!("Rescan found the same {} files", t.count)
            }
            _ => log::debug!("Rescan found no code files; status left as is"),
        }
    }
    trigger
}
