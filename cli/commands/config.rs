use anyhow::{Context, Result};
use colored::*;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use xbundle_core::Config;
use xbundle_core::config::{DEFAULT_CONFIG_DIR, DEFAULT_CONFIG_FILENAME};

use crate::cli_args::ConfigArgs;
use crate::output::write_to_stdout;

pub fn handle_config_command(args: &ConfigArgs, base_dir: &Path, quiet: bool) -> Result<()> {
    let content = Config::default()
        .to_toml_string()
        .context("Failed to render default configuration")?;

    if !args.save {
        return write_to_stdout(&content);
    }

    let save_dir = base_dir.join(DEFAULT_CONFIG_DIR);
    let save_path = save_dir.join(DEFAULT_CONFIG_FILENAME);

    if save_path.exists() {
        if quiet {
            anyhow::bail!(
                "Target file '{}' exists. Overwrite prevented in quiet mode.",
                save_path.display()
            );
        }
        print!(
            "{} Config file already exists at '{}'. Overwrite? [{}/{}] ",
            "⚠️".yellow(),
            save_path.display().to_string().cyan(),
            "y".green(),
            "N".red()
        );
        io::stdout().flush().context("Failed to flush stdout")?;
        let mut response = String::new();
        io::stdin()
            .read_line(&mut response)
            .context("Failed to read user input")?;
        if !response.trim().eq_ignore_ascii_case("y") {
            println!("Save cancelled.");
            return Ok(());
        }
    }

    fs::create_dir_all(&save_dir)
        .with_context(|| format!("Failed to create directory {}", save_dir.display()))?;
    fs::write(&save_path, content)
        .with_context(|| format!("Failed to write config file {}", save_path.display()))?;

    if !quiet {
        println!(
            "{} Default config saved to: {}",
            "✅".green(),
            save_path.display().to_string().blue()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saves_loadable_default_config() {
        let dir = tempfile::tempdir().unwrap();
        handle_config_command(&ConfigArgs { save: true }, dir.path(), true).unwrap();

        let path = dir.path().join(DEFAULT_CONFIG_DIR).join(DEFAULT_CONFIG_FILENAME);
        assert_eq!(Config::load_from_path(&path).unwrap(), Config::default());

        let again = handle_config_command(&ConfigArgs { save: true }, dir.path(), true);
        assert!(again.is_err());
    }
}
