use crate::block_locator::DEFAULT_SIBLING_SEARCH_BUDGET;
use crate::document::DEFAULT_HEADING_LEVELS;
use crate::error::{AppError, Result};
use parse_duration::parse;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_DIR: &str = ".xbundle";
pub const DEFAULT_CONFIG_FILENAME: &str = "xbundle.toml";
pub const DEFAULT_OUTPUT_DIR: &str = ".";
pub const DEFAULT_WATCH_DELAY: &str = "500ms";
pub const DEFAULT_MANIFEST_NAME: &str = "README.md";
pub const DEFAULT_FILENAME_PREFIX: &str = "code-files";
pub const MAX_COMPRESSION_LEVEL: i64 = 9;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub detect: DetectConfig,
    #[serde(default)]
    pub archive: ArchiveConfig,
    #[serde(default)]
    pub save: SaveConfig,
    #[serde(default)]
    pub watch: WatchConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DetectConfig {
    #[serde(default = "default_heading_levels")]
    pub heading_levels: Vec<u8>,
    #[serde(default = "default_sibling_search_budget")]
    pub sibling_search_budget: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ArchiveConfig {
    #[serde(default = "default_filename_prefix")]
    pub filename_prefix: String,
    #[serde(default = "default_manifest_name")]
    pub manifest_name: String,
    #[serde(default)]
    pub compression: CompressionSetting,
    #[serde(default = "default_compression_level")]
    pub compression_level: i64,
    #[serde(default)]
    pub on_collision: CollisionPolicy,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SaveConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct WatchConfig {
    #[serde(default = "default_watch_delay_string")]
    pub delay: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// "table" for the pretty listing, otherwise json/yaml/xml.
    #[serde(default = "default_format")]
    pub format: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CompressionSetting {
    #[default]
    Deflate,
    Bzip2,
    Zstd,
}

/// What to do when two selected files normalize to the same archive path.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Last selected file wins; the entry keeps the first file's position.
    #[default]
    Overwrite,
    Error,
}

fn default_heading_levels() -> Vec<u8> {
    DEFAULT_HEADING_LEVELS.to_vec()
}
fn default_sibling_search_budget() -> usize {
    DEFAULT_SIBLING_SEARCH_BUDGET
}
fn default_filename_prefix() -> String {
    DEFAULT_FILENAME_PREFIX.to_string()
}
fn default_manifest_name() -> String {
    DEFAULT_MANIFEST_NAME.to_string()
}
fn default_compression_level() -> i64 {
    MAX_COMPRESSION_LEVEL
}
fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}
fn default_watch_delay_string() -> String {
    DEFAULT_WATCH_DELAY.to_string()
}
fn default_format() -> String {
    "table".to_string()
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            heading_levels: default_heading_levels(),
            sibling_search_budget: default_sibling_search_budget(),
        }
    }
}
impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            filename_prefix: default_filename_prefix(),
            manifest_name: default_manifest_name(),
            compression: CompressionSetting::default(),
            compression_level: default_compression_level(),
            on_collision: CollisionPolicy::default(),
        }
    }
}
impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}
impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            delay: default_watch_delay_string(),
        }
    }
}
impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
        }
    }
}

impl Config {
    pub fn resolve_config_path(
        base_dir: &Path,
        cli_config_file: Option<&String>,
        cli_disable_config: bool,
    ) -> Result<Option<PathBuf>> {
        if cli_disable_config {
            log::debug!("Config file loading disabled via CLI flag.");
            return Ok(None);
        }

        match cli_config_file {
            Some(p_str) => {
                let mut path = expand_path(p_str);
                if !path.exists() && path.extension().is_none() {
                    path.set_extension("toml");
                }
                if !path.exists() {
                    return Err(AppError::Config(format!(
                        "Specified config file not found at path: {}",
                        path.display()
                    )));
                }
                log::debug!("Using specified config file path: {}", path.display());
                Ok(Some(path))
            }
            None => {
                let default_path = base_dir
                    .join(DEFAULT_CONFIG_DIR)
                    .join(DEFAULT_CONFIG_FILENAME);
                if default_path.exists() {
                    log::debug!("Using default config file path: {}", default_path.display());
                    Ok(Some(default_path))
                } else {
                    log::debug!(
                        "No config file specified and default not found at: {}",
                        default_path.display()
                    );
                    Ok(None)
                }
            }
        }
    }

    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        log::info!("Loading configuration from: {}", config_path.display());
        let toml_content = fs::read_to_string(config_path).map_err(|e| AppError::FileRead {
            path: config_path.to_path_buf(),
            source: e,
        })?;
        let config = toml::from_str::<Config>(&toml_content).map_err(|e| {
            AppError::TomlParse(format!(
                "Error parsing config file '{}': {}. Check TOML syntax and structure.",
                config_path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.archive.manifest_name.trim().is_empty() {
            return Err(AppError::Config(
                "[archive].manifest_name must not be empty".to_string(),
            ));
        }
        if !(0..=MAX_COMPRESSION_LEVEL).contains(&self.archive.compression_level) {
            return Err(AppError::Config(format!(
                "[archive].compression_level {} is out of range 0-{}",
                self.archive.compression_level, MAX_COMPRESSION_LEVEL
            )));
        }
        self.get_watch_delay()?;
        Ok(())
    }

    pub fn get_watch_delay(&self) -> Result<Duration> {
        parse(&self.watch.delay).map_err(|e| {
            AppError::InvalidArgument(format!(
                "Invalid watch delay duration '{}': {}. Use format like '500ms', '2s'.",
                self.watch.delay, e
            ))
        })
    }

    /// Output directory, relative paths resolved against the current directory.
    pub fn get_effective_output_dir(&self) -> Result<PathBuf> {
        let dir = expand_path(&self.save.output_dir.to_string_lossy());
        if dir.is_absolute() {
            Ok(dir)
        } else {
            Ok(env::current_dir()?.join(dir))
        }
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

pub fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.detect.heading_levels, vec![1, 2, 3, 4]);
        assert_eq!(config.detect.sibling_search_budget, 5);
        assert_eq!(config.archive.manifest_name, "README.md");
        assert_eq!(config.archive.compression_level, 9);
        assert_eq!(config.archive.on_collision, CollisionPolicy::Overwrite);
        assert_eq!(config.get_watch_delay().unwrap(), Duration::from_millis(500));
    }

    #[test]
    fn parses_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [archive]
            on_collision = "error"
            compression = "zstd"

            [watch]
            delay = "2s"
            "#,
        )
        .unwrap();
        assert_eq!(config.archive.on_collision, CollisionPolicy::Error);
        assert_eq!(config.archive.compression, CompressionSetting::Zstd);
        assert_eq!(config.archive.filename_prefix, "code-files");
        assert_eq!(config.get_watch_delay().unwrap(), Duration::from_secs(2));
    }

    #[test]
    fn rejects_unknown_fields() {
        let parsed = toml::from_str::<Config>("[detect]\nlevels = [1]\n");
        assert!(parsed.is_err());
    }

    #[test]
    fn validate_catches_bad_values() {
        let mut config = Config::default();
        config.archive.compression_level = 12;
        assert!(matches!(config.validate(), Err(AppError::Config(_))));

        let mut config = Config::default();
        config.watch.delay = "soon".to_string();
        assert!(matches!(config.validate(), Err(AppError::InvalidArgument(_))));
    }

    #[test]
    fn default_config_round_trips_through_toml() {
        let text = Config::default().to_toml_string().unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn loads_and_resolves_default_location() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Config::resolve_config_path(dir.path(), None, false).unwrap(), None);

        let config_dir = dir.path().join(DEFAULT_CONFIG_DIR);
        fs::create_dir_all(&config_dir).unwrap();
        let path = config_dir.join(DEFAULT_CONFIG_FILENAME);
        fs::write(&path, "[save]\noutput_dir = \"out\"\n").unwrap();

        let resolved = Config::resolve_config_path(dir.path(), None, false)
            .unwrap()
            .unwrap();
        let config = Config::load_from_path(&resolved).unwrap();
        assert_eq!(config.save.output_dir, PathBuf::from("out"));
        assert_eq!(Config::resolve_config_path(dir.path(), None, true).unwrap(), None);
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let missing = "/nope/xbundle-config".to_string();
        assert!(matches!(
            Config::resolve_config_path(Path::new("."), Some(&missing), false),
            Err(AppError::Config(_))
        ));
    }
}
