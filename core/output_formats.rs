use crate::detector::{DetectionReport, FileRecord, FileSummary, HeadingOutcome, human_size};
use crate::error::{AppError, Result};
use serde::Serialize;

/// Structured form of a scan, shared by the json/yaml/xml renderers.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScanListing {
    pub source: String,
    pub total_files: usize,
    pub total_size: usize,
    pub total_size_readable: String,
    pub files: Vec<FileSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headings: Option<Vec<HeadingOutcome>>,
}

impl ScanListing {
    pub fn new(source: &str, records: &[FileRecord]) -> Self {
        let total_size = records.iter().map(FileRecord::size).sum::<usize>();
        Self {
            source: source.to_string(),
            total_files: records.len(),
            total_size,
            total_size_readable: human_size(total_size as u64),
            files: records
                .iter()
                .enumerate()
                .map(|(i, record)| record.summary(i + 1))
                .collect(),
            headings: None,
        }
    }

    pub fn from_report(source: &str, report: &DetectionReport, explain: bool) -> Self {
        let mut listing = Self::new(source, &report.records);
        if explain {
            listing.headings = Some(report.outcomes.clone());
        }
        listing
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
    Xml,
}

impl OutputFormat {
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "table" | "text" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "xml" => Ok(Self::Xml),
            other => Err(AppError::InvalidArgument(format!(
                "Unknown output format '{}': expected table, json, yaml or xml",
                other
            ))),
        }
    }
}

pub fn serialize_to_json<T: Serialize>(data: &T, pretty: bool) -> Result<String> {
    if pretty {
        serde_json::to_string_pretty(data).map_err(AppError::JsonSerialize)
    } else {
        serde_json::to_string(data).map_err(AppError::JsonSerialize)
    }
}

pub fn serialize_to_yaml<T: Serialize>(data: &T) -> Result<String> {
    serde_yml::to_string(data).map_err(AppError::YamlError)
}

pub fn serialize_to_xml<T: Serialize>(data: &T, root_name: &str) -> Result<String> {
    quick_xml::se::to_string_with_root(root_name, data)
        .map_err(|e| AppError::XmlSerialize(e.to_string()))
}

/// Renders `data` in a structured format. `Table` has no structured form and is rejected.
pub fn serialize_structured<T: Serialize>(
    data: &T,
    format: OutputFormat,
    xml_root: &str,
) -> Result<String> {
    match format {
        OutputFormat::Json => serialize_to_json(data, true),
        OutputFormat::Yaml => serialize_to_yaml(data),
        OutputFormat::Xml => serialize_to_xml(data, xml_root),
        OutputFormat::Table => Err(AppError::InvalidArgument(
            "Table output has no structured serialization".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing() -> ScanListing {
        ScanListing::new(
            "page.html",
            &[FileRecord::new("src/a.rs", "fn a() {}"), FileRecord::new("b.py", "x = 1\ny = 2")],
        )
    }

    #[test]
    fn listing_totals_and_indices() {
        let listing = listing();
        assert_eq!(listing.total_files, 2);
        assert_eq!(listing.total_size, 9 + 11);
        assert_eq!(listing.files[1].index, 2);
        assert_eq!(listing.files[1].lines, 2);
    }

    #[test]
    fn json_uses_camel_case_and_skips_headings() {
        let json = serialize_structured(&listing(), OutputFormat::Json, "scan").unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["totalFiles"], 2);
        assert!(value.get("headings").is_none());
    }

    #[test]
    fn yaml_and_xml_render() {
        let yaml = serialize_structured(&listing(), OutputFormat::Yaml, "scan").unwrap();
        assert!(yaml.contains("totalFiles: 2"));
        let xml = serialize_structured(&listing(), OutputFormat::Xml, "scan").unwrap();
        assert!(xml.starts_with("<scan>"));
        assert!(xml.contains("<path>src/a.rs</path>"));
    }

    #[test]
    fn parses_format_names() {
        assert_eq!(OutputFormat::parse("YML").unwrap(), OutputFormat::Yaml);
        assert_eq!(OutputFormat::parse("table").unwrap(), OutputFormat::Table);
        assert!(matches!(OutputFormat::parse("csv"), Err(AppError::InvalidArgument(_))));
        assert!(serialize_structured(&listing(), OutputFormat::Table, "scan").is_err());
    }
}
