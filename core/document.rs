use crate::error::{AppError, Result};
use scraper::{ElementRef, Html, Selector};
use std::fs;
use std::io::Read;
use std::path::Path;

pub const DEFAULT_HEADING_LEVELS: [u8; 4] = [1, 2, 3, 4];

/// A parsed, read-only HTML document.
///
/// Detection never mutates the tree; every scan works on borrowed `ElementRef`s.
pub struct Document {
    html: Html,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("parse_errors", &self.html.errors.len())
            .finish_non_exhaustive()
    }
}

impl Document {
    pub fn parse(source: &str) -> Self {
        let html = Html::parse_document(source);
        if !html.errors.is_empty() {
            log::trace!("HTML parser reported {} recoverable errors", html.errors.len());
        }
        Self { html }
    }

    pub fn load(path: &Path) -> Result<Self> {
        log::debug!("Loading document from: {}", path.display());
        let bytes = fs::read(path).map_err(|e| AppError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Self::parse(&decode_lossy(bytes, &path.display().to_string())))
    }

    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Ok(Self::parse(&decode_lossy(bytes, "<stdin>")))
    }

    /// Headings of the requested levels, in document order.
    pub fn headings(&self, levels: &[u8]) -> Result<Vec<ElementRef<'_>>> {
        let selector = heading_selector(levels)?;
        Ok(self.html.select(&selector).collect())
    }
}

/// Rendered text of an element, whitespace-trimmed.
pub fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn heading_selector(levels: &[u8]) -> Result<Selector> {
    if levels.is_empty() {
        return Err(AppError::Config(
            "At least one heading level must be configured".to_string(),
        ));
    }
    if let Some(bad) = levels.iter().find(|l| !(1..=6).contains(*l)) {
        return Err(AppError::Config(format!(
            "Invalid heading level {}: expected 1-6",
            bad
        )));
    }
    let css = levels
        .iter()
        .map(|l| format!("h{}", l))
        .collect::<Vec<_>>()
        .join(", ");
    Selector::parse(&css).map_err(|e| AppError::Config(format!("Bad heading selector '{}': {}", css, e)))
}

fn decode_lossy(bytes: Vec<u8>, origin: &str) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            log::warn!("Document {} is not valid UTF-8; decoding lossily", origin);
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    }
}
