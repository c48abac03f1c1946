use crate::archive::normalize_entry_path;
use crate::detector::FileRecord;
use crate::error::{AppError, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::ops::RangeInclusive;

/// Which detected files go into an archive.
///
/// Starts with everything selected. Index and glob filters narrow it down; the detector
/// order is always kept.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    indices: Option<Vec<RangeInclusive<usize>>>,
    include: Option<GlobSet>,
    exclude: Option<GlobSet>,
}

impl Selection {
    pub fn all() -> Self {
        Self::default()
    }

    /// Restricts to 1-based indices, e.g. `"1,3-5"`.
    pub fn with_indices(mut self, spec: &str) -> Result<Self> {
        self.indices = Some(parse_index_list(spec)?);
        Ok(self)
    }

    pub fn with_include(mut self, patterns: &[String]) -> Result<Self> {
        self.include = build_globset(patterns)?;
        Ok(self)
    }

    pub fn with_exclude(mut self, patterns: &[String]) -> Result<Self> {
        self.exclude = build_globset(patterns)?;
        Ok(self)
    }

    pub fn is_all(&self) -> bool {
        self.indices.is_none() && self.include.is_none() && self.exclude.is_none()
    }

    /// Selected records paired with their 1-based index in `records`.
    pub fn pick<'a>(&self, records: &'a [FileRecord]) -> Result<Vec<(usize, &'a FileRecord)>> {
        if let Some(indices) = &self.indices {
            if let Some(out_of_range) = indices
                .iter()
                .map(|range| *range.end())
                .find(|&end| end > records.len())
            {
                return Err(AppError::InvalidArgument(format!(
                    "File index {} is out of range (detected {} files)",
                    out_of_range,
                    records.len()
                )));
            }
        }

        let picked: Vec<_> = records
            .iter()
            .enumerate()
            .map(|(i, record)| (i + 1, record))
            .filter(|(index, record)| self.accepts(*index, record))
            .collect();

        log::debug!("Selected {} of {} files", picked.len(), records.len());
        if picked.is_empty() {
            return Err(AppError::EmptySelection);
        }
        Ok(picked)
    }

    pub fn apply(&self, records: &[FileRecord]) -> Result<Vec<FileRecord>> {
        Ok(self
            .pick(records)?
            .into_iter()
            .map(|(_, record)| record.clone())
            .collect())
    }

    fn accepts(&self, index: usize, record: &FileRecord) -> bool {
        if let Some(indices) = &self.indices {
            if !indices.iter().any(|range| range.contains(&index)) {
                return false;
            }
        }
        let path = normalize_entry_path(record.path());
        if let Some(include) = &self.include {
            if !include.is_match(&path) {
                return false;
            }
        }
        if let Some(exclude) = &self.exclude {
            if exclude.is_match(&path) {
                log::trace!("Excluded by pattern: {}", path);
                return false;
            }
        }
        true
    }
}

fn build_globset(patterns: &[String]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| AppError::Glob(format!("Invalid pattern '{}': {}", pattern, e)))?;
        builder.add(glob);
    }
    Ok(Some(builder.build()?))
}

/// Ranges are kept as written; they are never expanded.
fn parse_index_list(spec: &str) -> Result<Vec<RangeInclusive<usize>>> {
    let mut indices = Vec::new();
    for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.split_once('-') {
            Some((start, end)) => {
                let start = parse_index(start)?;
                let end = parse_index(end)?;
                if start > end {
                    return Err(AppError::InvalidArgument(format!(
                        "Invalid index range '{}': start is after end",
                        part
                    )));
                }
                indices.push(start..=end);
            }
            None => {
                let index = parse_index(part)?;
                indices.push(index..=index);
            }
        }
    }
    if indices.is_empty() {
        return Err(AppError::EmptySelection);
    }
    Ok(indices)
}

fn parse_index(raw: &str) -> Result<usize> {
    let raw = raw.trim();
    match raw.parse::<usize>() {
        Ok(0) | Err(_) => Err(AppError::InvalidArgument(format!(
            "Invalid file index '{}': expected a number starting at 1",
            raw
        ))),
        Ok(n) => Ok(n),
    }
}
