use crate::archive::Artifact;
use crate::error::{AppError, Result};
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const PARTIAL_SUFFIX: &str = ".part";

/// Identifier a sink hands back for a completed save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadId(String);

impl DownloadId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DownloadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Anything that can persist a finished archive.
///
/// Errors are plain human-readable messages; they reach the user unchanged.
pub trait DownloadSink {
    fn save(&mut self, filename: &str, bytes: &[u8]) -> std::result::Result<DownloadId, String>;
}

/// Saves into a directory. Data is written to `<name>.part` and renamed on success.
///
/// Existing files are never replaced; a taken name gets a `-1`, `-2`, ... suffix.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write_atomically(&self, filename: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let final_path = self.free_path(filename);
        let partial_path = self.dir.join(format!("{}{}", filename, PARTIAL_SUFFIX));

        let written = fs::File::create(&partial_path).and_then(|mut file| {
            file.write_all(bytes)?;
            file.sync_all()
        });
        if let Err(e) = written.and_then(|_| fs::rename(&partial_path, &final_path)) {
            let _ = fs::remove_file(&partial_path);
            return Err(e);
        }
        Ok(final_path)
    }

    fn free_path(&self, filename: &str) -> PathBuf {
        let candidate = self.dir.join(filename);
        if !candidate.exists() {
            return candidate;
        }
        let (stem, extension) = match filename.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem, format!(".{}", ext)),
            _ => (filename, String::new()),
        };
        (1..)
            .map(|n| self.dir.join(format!("{}-{}{}", stem, n, extension)))
            .find(|path| !path.exists())
            .unwrap_or(candidate)
    }
}

impl DownloadSink for DirectorySink {
    fn save(&mut self, filename: &str, bytes: &[u8]) -> std::result::Result<DownloadId, String> {
        if filename.is_empty() || filename.contains(['/', '\\']) {
            return Err(format!("Invalid archive file name '{}'", filename));
        }
        self.write_atomically(filename, bytes)
            .map(|path| DownloadId::new(path.display().to_string()))
            .map_err(|e| format!("Could not write {} into {}: {}", filename, self.dir.display(), e))
    }
}

/// Hands the artifact to `sink`, surfacing its failure message verbatim.
pub fn deliver(artifact: &Artifact, sink: &mut dyn DownloadSink) -> Result<DownloadId> {
    log::debug!(
        "Delivering {} ({} bytes)",
        artifact.filename,
        artifact.bytes.len()
    );
    match sink.save(&artifact.filename, &artifact.bytes) {
        Ok(id) => {
            log::info!("Saved archive as {}", id);
            Ok(id)
        }
        Err(message) => {
            log::debug!("Save failed: {}", message);
            Err(AppError::DownloadFailure(message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact() -> Artifact {
        Artifact {
            filename: "code-files-2024-01-01T00-00-00.zip".to_string(),
            bytes: b"PK\x05\x06 not really".to_vec(),
            file_count: 1,
            overwritten: Vec::new(),
        }
    }

    struct RefusingSink;

    impl DownloadSink for RefusingSink {
        fn save(&mut self, _: &str, _: &[u8]) -> std::result::Result<DownloadId, String> {
            Err("Download blocked by policy".to_string())
        }
    }

    #[test]
    fn directory_sink_writes_final_file_only() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = DirectorySink::new(dir.path().join("nested"));
        let id = deliver(&artifact(), &mut sink).unwrap();

        let saved = PathBuf::from(id.as_str());
        assert_eq!(fs::read(&saved).unwrap(), artifact().bytes);
        let names: Vec<String> = fs::read_dir(sink.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![artifact().filename]);
    }

    #[test]
    fn same_name_saves_do_not_replace_earlier_archives() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = DirectorySink::new(dir.path());
        let first = deliver(&artifact(), &mut sink).unwrap();
        let mut second_artifact = artifact();
        second_artifact.bytes = b"second".to_vec();
        let second = deliver(&second_artifact, &mut sink).unwrap();
        let third = deliver(&artifact(), &mut sink).unwrap();

        assert_ne!(first, second);
        assert_eq!(fs::read(first.as_str()).unwrap(), artifact().bytes);
        assert_eq!(fs::read(second.as_str()).unwrap(), b"second");
        assert!(second.as_str().ends_with("code-files-2024-01-01T00-00-00-1.zip"));
        assert!(third.as_str().ends_with("code-files-2024-01-01T00-00-00-2.zip"));
    }

    #[test]
    fn sink_errors_are_reported_verbatim() {
        let err = deliver(&artifact(), &mut RefusingSink).unwrap_err();
        match err {
            AppError::DownloadFailure(message) => assert_eq!(message, "Download blocked by policy"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_filenames_with_separators() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = DirectorySink::new(dir.path());
        assert!(sink.save("../escape.zip", b"x").is_err());
        assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[test]
    fn unwritable_target_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("taken");
        fs::write(&blocker, b"file, not a directory").unwrap();
        let mut sink = DirectorySink::new(&blocker);
        assert!(matches!(
            deliver(&artifact(), &mut sink),
            Err(AppError::DownloadFailure(_))
        ));
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
