// Extension -> content type / display icon lookups.
//
// Both lookups are total: anything not in the tables falls back to a plain-text default.

pub const DEFAULT_MIME_TYPE: &str = "text/plain";
pub const DEFAULT_ICON: &str = "📄";

/// Lower-cased extension of the final path segment, if it has one.
///
/// Both `/` and `\` count as separators, so `a\b.c\file.rs` yields `rs` and `dir.v2/Makefile`
/// yields nothing.
pub fn extension_of(path: &str) -> Option<String> {
    let file_name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    let (_, ext) = file_name.rsplit_once('.')?;
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_lowercase())
    }
}

pub fn mime_type_for(path: &str) -> &'static str {
    extension_of(path)
        .map(|ext| mime_type_for_extension(&ext))
        .unwrap_or(DEFAULT_MIME_TYPE)
}

pub fn icon_for(path: &str) -> &'static str {
    extension_of(path)
        .map(|ext| icon_for_extension(&ext))
        .unwrap_or(DEFAULT_ICON)
}

// Expects a lower-cased extension without the leading dot.
pub fn mime_type_for_extension(ext: &str) -> &'static str {
    match ext {
        // Scripts and web
        "js" | "jsx" | "mjs" | "cjs" => "text/javascript",
        "ts" | "tsx" | "mts" | "cts" => "text/typescript",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "scss" => "text/x-scss",
        "less" => "text/x-less",
        "vue" => "text/x-vue",
        "svelte" => "text/x-svelte",
        "svg" => "image/svg+xml",

        // Data and config
        "json" => "application/json",
        "xml" => "application/xml",
        "yaml" | "yml" => "text/yaml",
        "toml" => "application/toml",
        "ini" | "cfg" | "conf" => "text/plain",
        "csv" => "text/csv",
        "sql" => "application/sql",
        "graphql" | "gql" => "application/graphql",
        "proto" => "text/x-protobuf",

        // Docs
        "md" | "markdown" => "text/markdown",
        "txt" => "text/plain",
        "rst" => "text/x-rst",
        "tex" => "text/x-tex",

        // Compiled and systems languages
        "rs" => "text/x-rustsrc",
        "c" | "h" => "text/x-csrc",
        "cpp" | "cc" | "cxx" | "hpp" | "hh" => "text/x-c++src",
        "cs" => "text/x-csharp",
        "go" => "text/x-go",
        "java" => "text/x-java",
        "kt" | "kts" => "text/x-kotlin",
        "swift" => "text/x-swift",
        "scala" => "text/x-scala",
        "zig" => "text/x-zig",

        // Dynamic languages and shells
        "py" => "text/x-python",
        "rb" => "text/x-ruby",
        "php" => "text/x-php",
        "pl" => "text/x-perl",
        "lua" => "text/x-lua",
        "r" => "text/x-r",
        "dart" => "text/x-dart",
        "sh" | "bash" | "zsh" => "text/x-shellscript",
        "ps1" => "text/x-powershell",
        "bat" | "cmd" => "text/x-msdos-batch",

        _ => DEFAULT_MIME_TYPE,
    }
}

pub fn icon_for_extension(ext: &str) -> &'static str {
    match ext {
        "js" | "mjs" | "cjs" => "📜",
        "ts" => "📘",
        "jsx" | "tsx" => "⚛️",
        "json" => "📋",
        "html" | "htm" => "🌐",
        "css" | "scss" | "less" => "🎨",
        "md" | "markdown" => "📝",
        "txt" => "📄",
        "py" => "🐍",
        "java" => "☕",
        "c" | "h" | "cpp" | "cc" | "hpp" => "⚙️",
        "go" => "🐹",
        "rs" => "🦀",
        "php" => "🐘",
        "rb" => "💎",
        "sh" | "bash" | "zsh" => "🐚",
        "xml" => "📰",
        "yaml" | "yml" | "toml" => "⚙️",
        _ => DEFAULT_ICON,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_extensions() {
        let cases = [
            ("src/app.ts", "text/typescript"),
            ("index.html", "text/html"),
            ("main.rs", "text/x-rustsrc"),
            ("config.yml", "text/yaml"),
            ("package.json", "application/json"),
            ("script.py", "text/x-python"),
        ];
        for (path, expected) in cases {
            assert_eq!(mime_type_for(path), expected, "failed for {}", path);
        }
    }

    #[test]
    fn uses_final_extension_only() {
        assert_eq!(mime_type_for("a/b/c.test.tsx"), "text/typescript");
        assert_eq!(extension_of("a/b/c.test.tsx").as_deref(), Some("tsx"));
    }

    #[test]
    fn is_case_insensitive() {
        assert_eq!(mime_type_for("README.MD"), "text/markdown");
        assert_eq!(icon_for("Main.RS"), "🦀");
    }

    #[test]
    fn unknown_or_missing_extension_falls_back() {
        assert_eq!(mime_type_for("data.qwerty"), DEFAULT_MIME_TYPE);
        assert_eq!(mime_type_for("Makefile"), DEFAULT_MIME_TYPE);
        assert_eq!(mime_type_for("dir.v2/Makefile"), DEFAULT_MIME_TYPE);
        assert_eq!(mime_type_for("trailing."), DEFAULT_MIME_TYPE);
        assert_eq!(icon_for("data.qwerty"), DEFAULT_ICON);
    }

    #[test]
    fn backslash_separated_paths_resolve() {
        assert_eq!(mime_type_for("utils\\helpers.py"), "text/x-python");
        assert_eq!(extension_of("dir.d\\file"), None);
    }

    #[test]
    fn lookup_is_deterministic() {
        for _ in 0..3 {
            assert_eq!(mime_type_for("x.go"), "text/x-go");
        }
    }
}
