use crate::block_locator::locate_code_block;
use crate::config::DetectConfig;
use crate::document::{Document, element_text};
use crate::error::Result;
use crate::mime;
use crate::path_extractor::{self, HeadingRejection};
use crate::text_cleaner::extract_clean_code;
use byte_unit::{Byte, UnitType};
use serde::Serialize;

/// Opaque handle to the heading that produced a record: its ordinal among the headings
/// scanned in that pass. Carried into [`FileSummary::heading`] so listings can point back
/// at the source heading; stale once the document changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceAnchor(usize);

impl SourceAnchor {
    pub fn heading_ordinal(self) -> usize {
        self.0
    }
}

/// One file reconstructed from a heading/code-block pair.
///
/// `mime_type` and `size` are derived from `path` and `content` on every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    path: String,
    content: String,
    source_anchor: Option<SourceAnchor>,
}

impl FileRecord {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            source_anchor: None,
        }
    }

    fn anchored(path: String, content: String, anchor: SourceAnchor) -> Self {
        Self {
            path,
            content,
            source_anchor: Some(anchor),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn source_anchor(&self) -> Option<SourceAnchor> {
        self.source_anchor
    }

    pub fn mime_type(&self) -> &'static str {
        mime::mime_type_for(&self.path)
    }

    pub fn icon(&self) -> &'static str {
        mime::icon_for(&self.path)
    }

    /// UTF-8 byte length of the content.
    pub fn size(&self) -> usize {
        self.content.len()
    }

    pub fn line_count(&self) -> usize {
        self.content.split('\n').count()
    }

    pub fn size_readable(&self) -> String {
        human_size(self.size() as u64)
    }

    pub fn summary(&self, index: usize) -> FileSummary {
        FileSummary {
            index,
            path: self.path.clone(),
            mime_type: self.mime_type().to_string(),
            size: self.size(),
            size_readable: self.size_readable(),
            lines: self.line_count(),
            icon: self.icon().to_string(),
            heading: self.source_anchor.map(SourceAnchor::heading_ordinal),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileSummary {
    pub index: usize,
    pub path: String,
    pub mime_type: String,
    pub size: usize,
    pub size_readable: String,
    pub lines: usize,
    pub icon: String,
    /// Ordinal of the heading this file came from, matching `HeadingOutcome::ordinal`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<usize>,
}

pub fn human_size(bytes: u64) -> String {
    let adjusted = Byte::from_u64(bytes).get_appropriate_unit(UnitType::Binary);
    format!("{:.2}", adjusted)
}

/// Why a heading produced no record. These are filter outcomes, never surfaced as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    InvalidHeading,
    NoCodeBlockFound,
    EmptyContent,
}

impl From<HeadingRejection> for RejectReason {
    fn from(_: HeadingRejection) -> Self {
        RejectReason::InvalidHeading
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadingOutcome {
    pub ordinal: usize,
    pub heading: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected: Option<RejectReason>,
}

#[derive(Debug, Clone, Default)]
pub struct DetectionReport {
    pub records: Vec<FileRecord>,
    pub outcomes: Vec<HeadingOutcome>,
}

/// Runs the full pass and returns records in heading order.
pub fn detect(document: &Document, config: &DetectConfig) -> Result<Vec<FileRecord>> {
    Ok(detect_with_report(document, config)?.records)
}

/// Like [`detect`], also recording what happened to every heading.
pub fn detect_with_report(document: &Document, config: &DetectConfig) -> Result<DetectionReport> {
    let headings = document.headings(&config.heading_levels)?;
    log::debug!("Scanning {} headings for file names", headings.len());

    let mut report = DetectionReport::default();
    for (ordinal, heading) in headings.into_iter().enumerate() {
        let text = element_text(&heading);
        let outcome = match scan_heading(heading, &text, ordinal, config) {
            Ok(record) => {
                let path = record.path().to_string();
                log::trace!("Heading #{} -> {} ({} bytes)", ordinal, path, record.size());
                report.records.push(record);
                HeadingOutcome {
                    ordinal,
                    heading: text,
                    path: Some(path),
                    rejected: None,
                }
            }
            Err((path, reason)) => {
                log::trace!("Heading #{} '{}' skipped: {:?}", ordinal, text, reason);
                HeadingOutcome {
                    ordinal,
                    heading: text,
                    path,
                    rejected: Some(reason),
                }
            }
        };
        report.outcomes.push(outcome);
    }

    log::debug!("Detected {} files", report.records.len());
    Ok(report)
}

fn scan_heading(
    heading: scraper::ElementRef<'_>,
    text: &str,
    ordinal: usize,
    config: &DetectConfig,
) -> std::result::Result<FileRecord, (Option<String>, RejectReason)> {
    let path = match path_extractor::parse_heading(text) {
        Ok(path) => path,
        Err(rejection) => return Err((None, rejection.into())),
    };

    let Some(container) = locate_code_block(heading, config.sibling_search_budget) else {
        return Err((Some(path), RejectReason::NoCodeBlockFound));
    };

    let content = extract_clean_code(container);
    if content.trim().is_empty() {
        return Err((Some(path), RejectReason::EmptyContent));
    }

    Ok(FileRecord::anchored(path, content, SourceAnchor(ordinal)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(html: &str) -> DetectionReport {
        detect_with_report(&Document::parse(html), &DetectConfig::default()).unwrap()
    }

    #[test]
    fn records_follow_heading_order() {
        let report = run(
            "<h2>1. b.rs</h2><pre>b</pre><h3>Intro</h3><p>x</p><h2>2. a.rs</h2><pre>a</pre>",
        );
        let paths: Vec<&str> = report.records.iter().map(|r| r.path()).collect();
        assert_eq!(paths, vec!["b.rs", "a.rs"]);
        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(report.outcomes[1].rejected, Some(RejectReason::InvalidHeading));
    }

    #[test]
    fn classifies_filter_outcomes() {
        let report = run("<h1>a.rs</h1><p>none</p><h1>b.rs</h1><pre>  Copy  </pre><h1>c.rs</h1><pre>ok</pre>");
        let reasons: Vec<Option<RejectReason>> =
            report.outcomes.iter().map(|o| o.rejected).collect();
        // The forward search from a.rs runs past the next heading into b.rs's block.
        assert_eq!(
            reasons,
            vec![
                Some(RejectReason::EmptyContent),
                Some(RejectReason::EmptyContent),
                None
            ]
        );
        assert_eq!(report.records.last().unwrap().content(), "ok");
    }

    #[test]
    fn reports_missing_code_block() {
        let report = run("<h1>a.rs</h1><p>no code</p>");
        assert!(report.records.is_empty());
        assert_eq!(report.outcomes[0].rejected, Some(RejectReason::NoCodeBlockFound));
        assert_eq!(report.outcomes[0].path.as_deref(), Some("a.rs"));
    }

    #[test]
    fn ignores_deeper_headings() {
        let report = run("<h5>deep.rs</h5><pre>x</pre>");
        assert!(report.records.is_empty());
        assert!(report.outcomes.is_empty());
    }

    #[test]
    fn respects_configured_levels() {
        let config = DetectConfig {
            heading_levels: vec![5],
            ..DetectConfig::default()
        };
        let records = detect(&Document::parse("<h5>deep.rs</h5><pre>x</pre>"), &config).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn derived_fields_track_content() {
        let record = FileRecord::new("src/ü.rs", "é\nb");
        assert_eq!(record.size(), 4);
        assert_eq!(record.line_count(), 2);
        assert_eq!(record.mime_type(), "text/x-rustsrc");
        assert_eq!(record.source_anchor(), None);
    }

    #[test]
    fn anchors_point_at_heading_ordinals() {
        let report = run("<h1>x</h1><h1>a.rs</h1><pre>a</pre>");
        assert_eq!(
            report.records[0].source_anchor().map(SourceAnchor::heading_ordinal),
            Some(1)
        );
        let summary = report.records[0].summary(1);
        assert_eq!(summary.heading, Some(report.outcomes[1].ordinal));
    }

    #[test]
    fn summary_serializes_camel_case() {
        let summary = FileRecord::new("a.ts", "x").summary(1);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["mimeType"], "text/typescript");
        assert_eq!(json["lines"], 1);
        assert!(json.get("heading").is_none());
    }
}
