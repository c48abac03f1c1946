use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Node};

/// Stray decoration text that copy buttons leave behind as a line of its own.
const DECORATION_ARTIFACT_LINES: [&str; 3] = ["::after", "Copy", "Copied!"];

/// Class-name fragments marking copy controls and line-number gutters.
const DECORATION_CLASS_MARKERS: [&str; 2] = ["copy", "line-num"];

const NON_RENDERED_TAGS: [&str; 4] = ["script", "style", "template", "noscript"];

// Elements whose boundaries render as line breaks even without newline text.
const BLOCK_TAGS: [&str; 6] = ["div", "p", "li", "tr", "table", "section"];

// Four or more line feeds are three or more blank lines.
static EXCESS_BLANK_LINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{4,}").expect("blank line pattern is valid"));

/// Extracts the file content held by a code-block container.
///
/// Prefers an inner `<code>` element. Copy buttons and line-number gutters are skipped
/// during the walk, so the document itself is never touched.
pub fn extract_clean_code(container: ElementRef<'_>) -> String {
    let target = container
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "code")
        .unwrap_or(container);

    let mut raw = String::new();
    collect_rendered_text(target, &mut raw);
    clean_text(&raw)
}

/// Normalizes extracted text into file content.
///
/// Idempotent: `clean_text(&clean_text(x)) == clean_text(x)`.
pub fn clean_text(raw: &str) -> String {
    let trimmed = raw.trim();
    let spaced = trimmed.replace('\u{00A0}', " ");
    let unified = normalize_line_endings(&spaced);
    let without_artifacts = drop_artifact_lines(&unified);
    let collapsed = EXCESS_BLANK_LINES.replace_all(&without_artifacts, "\n\n\n");
    collapsed.trim().to_string()
}

pub fn is_decoration(element: &ElementRef<'_>) -> bool {
    element
        .value()
        .attr("class")
        .is_some_and(|class| DECORATION_CLASS_MARKERS.iter().any(|m| class.contains(m)))
}

fn collect_rendered_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let Some(child_ref) = ElementRef::wrap(child) else {
                    continue;
                };
                let name = el.name();
                if NON_RENDERED_TAGS.contains(&name) || is_decoration(&child_ref) {
                    log::trace!("Skipping non-code element <{}>", name);
                    continue;
                }
                if name == "br" {
                    out.push('\n');
                    continue;
                }
                let is_block = BLOCK_TAGS.contains(&name);
                if is_block {
                    break_line(out);
                }
                collect_rendered_text(child_ref, out);
                if is_block {
                    break_line(out);
                }
            }
            _ => {}
        }
    }
}

fn break_line(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

fn drop_artifact_lines(text: &str) -> String {
    text.split('\n')
        .filter(|line| !DECORATION_ARTIFACT_LINES.contains(&line.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}
