use crate::config::{ArchiveConfig, CollisionPolicy, CompressionSetting};
use crate::detector::{FileRecord, human_size};
use crate::error::{AppError, Result};
use chrono::{DateTime, Datelike, Timelike, Utc};
use indexmap::IndexMap;
use indexmap::map::Entry;
use std::borrow::Cow;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const ARCHIVE_EXTENSION: &str = "zip";

/// A finished archive, ready to hand to a [`crate::download::DownloadSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub file_count: usize,
    /// Normalized paths that were written more than once (last write kept).
    pub overwritten: Vec<String>,
}

impl Artifact {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn size_readable(&self) -> String {
        human_size(self.bytes.len() as u64)
    }
}

pub struct ArchiveBuilder<'a> {
    config: &'a ArchiveConfig,
}

impl<'a> ArchiveBuilder<'a> {
    pub fn new(config: &'a ArchiveConfig) -> Self {
        Self { config }
    }

    pub fn build(&self, selected: &[FileRecord], progress: impl FnMut(f64)) -> Result<Artifact> {
        self.build_at(selected, Utc::now(), progress)
    }

    /// Builds the archive as if it were generated at `now`.
    ///
    /// The manifest goes in first, then one entry per record in selection order. `progress`
    /// receives percentages from 0 to 100.
    pub fn build_at(
        &self,
        selected: &[FileRecord],
        now: DateTime<Utc>,
        mut progress: impl FnMut(f64),
    ) -> Result<Artifact> {
        if selected.is_empty() {
            return Err(AppError::EmptySelection);
        }
        let method = compression_method(self.config.compression)?;
        let options = SimpleFileOptions::default()
            .compression_method(method)
            .compression_level(Some(self.config.compression_level))
            .last_modified_time(zip_timestamp(now)?);

        let (entries, overwritten) = self.collect_entries(selected, now)?;
        let total = entries.len();
        log::debug!(
            "Compressing {} entries with {:?} level {}",
            total,
            method,
            self.config.compression_level
        );

        progress(0.0);
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (done, (path, content)) in entries.iter().enumerate() {
            writer.start_file(path.as_str(), options)?;
            writer
                .write_all(content.as_bytes())
                .map_err(|e| AppError::CompressionFailure(format!("{}: {}", path, e)))?;
            progress((done + 1) as f64 * 100.0 / total as f64);
        }
        let bytes = writer.finish()?.into_inner();

        log::info!(
            "Built archive with {} files ({} bytes)",
            selected.len(),
            bytes.len()
        );
        Ok(Artifact {
            filename: artifact_filename(&self.config.filename_prefix, now),
            bytes,
            file_count: selected.len(),
            overwritten,
        })
    }

    fn collect_entries<'r>(
        &self,
        selected: &'r [FileRecord],
        now: DateTime<Utc>,
    ) -> Result<(IndexMap<String, Cow<'r, str>>, Vec<String>)> {
        let mut entries: IndexMap<String, Cow<'r, str>> = IndexMap::new();
        entries.insert(
            self.config.manifest_name.clone(),
            render_manifest(selected, now).into(),
        );

        let mut overwritten = Vec::new();
        for record in selected {
            let path = normalize_entry_path(record.path());
            match entries.entry(path) {
                Entry::Vacant(slot) => {
                    slot.insert(record.content().into());
                }
                Entry::Occupied(mut slot) => {
                    if self.config.on_collision == CollisionPolicy::Error {
                        return Err(AppError::PathConflict {
                            path: slot.key().clone(),
                        });
                    }
                    log::debug!("Archive path '{}' written twice; keeping the later file", slot.key());
                    overwritten.push(slot.key().clone());
                    slot.insert(record.content().into());
                }
            }
        }
        Ok((entries, overwritten))
    }
}

/// Forward slashes only, so `a\b.py` and `a/b.py` land in the same directory entry.
/// Leading `/` and `..` segments are kept as written.
pub fn normalize_entry_path(path: &str) -> String {
    path.replace('\\', "/")
}

pub fn artifact_filename(prefix: &str, now: DateTime<Utc>) -> String {
    format!(
        "{}-{}.{}",
        prefix,
        now.format("%Y-%m-%dT%H-%M-%S"),
        ARCHIVE_EXTENSION
    )
}

pub fn render_manifest(selected: &[FileRecord], now: DateTime<Utc>) -> String {
    let listing = selected
        .iter()
        .enumerate()
        .map(|(i, record)| format!("{}. {} ({})", i + 1, record.path(), record.size_readable()))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "# Saved Code Files\n\nSaved at: {}\nTotal files: {}\n\n## Files\n\n{}\n\n---\nGenerated by xbundle\n",
        now.format("%Y-%m-%d %H:%M:%S UTC"),
        selected.len(),
        listing
    )
}

fn compression_method(setting: CompressionSetting) -> Result<CompressionMethod> {
    match setting {
        CompressionSetting::Deflate => Ok(CompressionMethod::Deflated),
        #[cfg(feature = "bzip2")]
        CompressionSetting::Bzip2 => Ok(CompressionMethod::Bzip2),
        #[cfg(not(feature = "bzip2"))]
        CompressionSetting::Bzip2 => Err(AppError::CompressionUnavailable(
            "bzip2 support is not compiled in (enable the `bzip2` feature)".to_string(),
        )),
        #[cfg(feature = "zstd")]
        CompressionSetting::Zstd => Ok(CompressionMethod::Zstd),
        #[cfg(not(feature = "zstd"))]
        CompressionSetting::Zstd => Err(AppError::CompressionUnavailable(
            "zstd support is not compiled in (enable the `zstd` feature)".to_string(),
        )),
    }
}

// Zip timestamps cover 1980-2107 at two-second resolution.
fn zip_timestamp(now: DateTime<Utc>) -> Result<zip::DateTime> {
    let year = u16::try_from(now.year()).unwrap_or(0);
    zip::DateTime::from_date_and_time(
        year,
        now.month() as u8,
        now.day() as u8,
        now.hour() as u8,
        now.minute() as u8,
        now.second() as u8,
    )
    .map_err(|_| {
        AppError::CompressionFailure(format!(
            "Timestamp {} cannot be stored in a zip archive",
            now
        ))
    })
}
