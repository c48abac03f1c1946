use once_cell::sync::Lazy;
use regex::Regex;

// "1. ", "1、", "1) ", "1: ", "(1) ", "Step 1: ", "文件1："
static ORDINAL_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:[0-9]+[.、):：]|\([0-9]+\)|Step\s+[0-9]+[:：]|文件[0-9]+[:：])\s*")
        .expect("ordinal prefix pattern is valid")
});

// "File: ", "Path：", "代码: " ...
static LABEL_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:文件|File|Path|代码|Code)[:：]\s*").expect("label prefix pattern is valid")
});

// A dot followed by 1-6 ASCII word characters at the very end.
static EXTENSION_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.[A-Za-z0-9_]{1,6}$").expect("extension pattern is valid"));

/// Why a heading did not produce a path. Not an error: most headings in a mixed
/// document are prose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingRejection {
    Empty,
    MissingExtension,
}

/// Turns heading text into a candidate relative file path.
///
/// At most one ordinal token and one label word are stripped, in that order. The rest is
/// returned trimmed, separators and all, provided it ends in a file extension.
pub fn extract_path(heading_text: &str) -> Option<String> {
    parse_heading(heading_text).ok()
}

pub fn parse_heading(heading_text: &str) -> Result<String, HeadingRejection> {
    let text = heading_text.trim();
    if text.is_empty() {
        return Err(HeadingRejection::Empty);
    }

    let without_ordinal = ORDINAL_PREFIX.replace(text, "");
    let without_label = LABEL_PREFIX.replace(&without_ordinal, "");
    let candidate = without_label.trim();

    if candidate.is_empty() {
        return Err(HeadingRejection::Empty);
    }
    if !has_file_extension(candidate) {
        log::trace!("Heading '{}' has no trailing file extension", text);
        return Err(HeadingRejection::MissingExtension);
    }
    Ok(candidate.to_string())
}

pub fn has_file_extension(candidate: &str) -> bool {
    EXTENSION_SUFFIX.is_match(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_numeric_ordinals() {
        let cases = [
            ("1. src/app.ts", "src/app.ts"),
            ("2、main.py", "main.py"),
            ("3) lib.rs", "lib.rs"),
            ("4: index.html", "index.html"),
            ("5：style.css", "style.css"),
            ("(6) config.yaml", "config.yaml"),
            ("12.   spaced.go", "spaced.go"),
        ];
        for (heading, expected) in cases {
            assert_eq!(extract_path(heading).as_deref(), Some(expected), "{}", heading);
        }
    }

    #[test]
    fn strips_step_and_file_ordinals() {
        assert_eq!(extract_path("Step 1: setup.sh").as_deref(), Some("setup.sh"));
        assert_eq!(extract_path("step 12：a/b.c").as_deref(), Some("a/b.c"));
        assert_eq!(
            extract_path("文件2：utils\\helpers.py").as_deref(),
            Some("utils\\helpers.py")
        );
    }

    #[test]
    fn strips_label_words() {
        assert_eq!(extract_path("File: src/lib.rs").as_deref(), Some("src/lib.rs"));
        assert_eq!(extract_path("path：docs/a.md").as_deref(), Some("docs/a.md"));
        assert_eq!(extract_path("代码: run.sh").as_deref(), Some("run.sh"));
        assert_eq!(extract_path("CODE:x.json").as_deref(), Some("x.json"));
    }

    #[test]
    fn strips_ordinal_then_label() {
        assert_eq!(
            extract_path("1. File: src/main.rs").as_deref(),
            Some("src/main.rs")
        );
    }

    #[test]
    fn only_first_ordinal_is_stripped() {
        assert_eq!(extract_path("1. 2. a.rs").as_deref(), Some("2. a.rs"));
    }

    #[test]
    fn rejects_headings_without_extension() {
        assert_eq!(parse_heading("Notes"), Err(HeadingRejection::MissingExtension));
        assert_eq!(parse_heading("1. Notes"), Err(HeadingRejection::MissingExtension));
        assert_eq!(parse_heading("Step 3: Install"), Err(HeadingRejection::MissingExtension));
        assert_eq!(
            parse_heading("archive.tar.gzipped"),
            Err(HeadingRejection::MissingExtension)
        );
        assert_eq!(parse_heading("The end."), Err(HeadingRejection::MissingExtension));
    }

    #[test]
    fn rejects_blank_headings() {
        assert_eq!(parse_heading("   "), Err(HeadingRejection::Empty));
        assert_eq!(parse_heading("1. "), Err(HeadingRejection::Empty));
    }

    #[test]
    fn accepted_paths_end_with_extension() {
        let headings = [
            "1. a.b",
            "(2) deep/dir/file.jsonc",
            "File: x.y_z",
            "Step 9: run.ps1",
        ];
        for heading in headings {
            let path = extract_path(heading).expect("accepted");
            assert!(has_file_extension(&path), "{}", path);
            assert!(!ORDINAL_PREFIX.is_match(&path), "{}", path);
        }
    }

    #[test]
    fn keeps_prose_with_extension_like_suffix() {
        // Heuristic accepts it; the block locator decides whether code follows.
        assert_eq!(extract_path("See v1.2").as_deref(), Some("See v1.2"));
    }
}
