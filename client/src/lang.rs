use std::collections::HashMap;

use maplit::hashmap;
use once_cell::sync::Lazy;

pub const FALLBACK_FILENAME: &str = "main.txt";

static FILENAMES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    hashmap! {
        "python" => "main.py",
        "python3" => "main.py",
        "cpp" => "main.cpp",
        "c++" => "main.cpp",
        "c" => "main.c",
        "java" => "Main.java",
        "rust" => "main.rs",
        "javascript" => "main.js",
        "js" => "main.js",
        "go" => "main.go",
        "ruby" => "main.rb",
        "php" => "main.php",
        "swift" => "main.swift",
        "kotlin" => "Main.kt",
        "scala" => "main.scala",
        "r" => "main.R",
        "bash" => "main.sh",
        "sh" => "main.sh",
    }
});

/// Source file name the service expects for `language` (case-insensitive).
pub fn filename_for(language: &str) -> &'static str {
    FILENAMES
        .get(language.to_lowercase().as_str())
        .copied()
        .unwrap_or(FALLBACK_FILENAME)
}

/// Guess a language tag from a file extension, e.g. `"cpp"` -> `"cpp"`, `"py"` -> `"python"`.
pub fn language_from_extension(ext: &str) -> Option<&'static str> {
    let lang = match ext.to_lowercase().as_str() {
        "py" => "python",
        "cpp" | "cc" | "cxx" => "cpp",
        "c" => "c",
        "java" => "java",
        "rs" => "rust",
        "js" | "mjs" => "javascript",
        "go" => "go",
        "rb" => "ruby",
        "php" => "php",
        "swift" => "swift",
        "kt" => "kotlin",
        "scala" => "scala",
        "r" => "r",
        "sh" => "bash",
        _ => return None,
    };
    Some(lang)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn known_languages() {
        assert_eq!(filename_for("cpp"), "main.cpp");
        assert_eq!(filename_for("c++"), "main.cpp");
        assert_eq!(filename_for("java"), "Main.java");
        assert_eq!(filename_for("kotlin"), "Main.kt");
        assert_eq!(filename_for("r"), "main.R");
    }

    #[test]
    fn lookup_ignores_case() {
        assert_eq!(filename_for("Python3"), "main.py");
        assert_eq!(filename_for("RUST"), "main.rs");
    }

    #[test]
    fn unknown_language_falls_back() {
        assert_eq!(filename_for("brainfuck"), FALLBACK_FILENAME);
        assert_eq!(filename_for(""), FALLBACK_FILENAME);
    }

    #[test]
    fn extension_guess() {
        assert_eq!(language_from_extension("py"), Some("python"));
        assert_eq!(language_from_extension("CPP"), Some("cpp"));
        assert_eq!(language_from_extension("txt"), None);
    }
}
