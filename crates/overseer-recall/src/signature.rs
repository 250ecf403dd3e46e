//! Error message normalization.
//!
//! Volatile tokens are replaced with placeholders in a fixed order:
//! addresses, quoted literals, paths, line references, bare numbers.
//! No placeholder can be matched by a later rule, so normalizing a
//! signature again returns it unchanged.

use std::sync::LazyLock;

use regex::Regex;

use overseer_core::config::defaults::DEFAULT_SIGNATURE_MAX_LEN;

macro_rules! signature_pattern {
    ($name:ident, $regex_str:expr) => {
        static $name: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new($regex_str).ok());
    };
}

signature_pattern!(RE_ADDRESS, r"\b0[xX][0-9a-fA-F]+\b");
signature_pattern!(RE_QUOTED, r#""[^"\n]*"|'[^'\n]*'|`[^`\n]*`"#);
signature_pattern!(
    RE_PATH,
    r"(?:[A-Za-z]:)?(?:[\w.~\-]*[/\\])+[\w.\-]+|\b[\w\-]+\.(?:py|pyi|rs|js|jsx|ts|tsx|go|java|rb|c|cc|cpp|h|hpp|json|toml|ya?ml|sh|ipynb)\b"
);
signature_pattern!(RE_LINE, r"(?i)\bline\s+\d+");
signature_pattern!(RE_NUMBER, r"\b\d+(?:\.\d+)?\b");
signature_pattern!(RE_WHITESPACE, r"\s+");

/// Ordered `(pattern, placeholder)` rules.
static RULES: [(&LazyLock<Option<Regex>>, &str); 5] = [
    (&RE_ADDRESS, "<ADDR>"),
    (&RE_QUOTED, "<STR>"),
    (&RE_PATH, "<PATH>"),
    (&RE_LINE, "line <N>"),
    (&RE_NUMBER, "<N>"),
];

/// Reduces error messages to bounded-length signatures.
#[derive(Debug, Clone, Copy)]
pub struct SignatureNormalizer {
    max_len: usize,
}

impl SignatureNormalizer {
    pub fn new(max_len: usize) -> Self {
        Self {
            max_len: max_len.max(1),
        }
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn normalize(&self, message: &str) -> String {
        let mut text = message.to_string();
        for (regex, placeholder) in RULES.iter() {
            if let Some(re) = regex.as_ref() {
                text = re.replace_all(&text, *placeholder).into_owned();
            }
        }
        if let Some(ws) = RE_WHITESPACE.as_ref() {
            text = ws.replace_all(&text, " ").into_owned();
        }
        truncate_chars(text.trim(), self.max_len)
    }
}

impl Default for SignatureNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_SIGNATURE_MAX_LEN)
    }
}

/// Normalize with the default length bound.
pub fn normalize(message: &str) -> String {
    SignatureNormalizer::default().normalize(message)
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].trim_end().to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_module_names_collapse() {
        assert_eq!(
            normalize("ModuleNotFoundError: No module named 'requests'"),
            normalize("ModuleNotFoundError: No module named 'numpy'"),
        );
    }

    #[test]
    fn paths_and_lines_are_replaced() {
        let a = normalize(r#"File "/home/a/project/main.py", line 12, in <module>"#);
        let b = normalize(r#"File "/tmp/other/app.py", line 98, in <module>"#);
        assert_eq!(a, b);
        assert!(!a.contains("12"));
    }

    #[test]
    fn bare_paths_and_addresses_are_replaced() {
        let sig = normalize("segfault at 0x7ffd5e8c in src/engine/core.rs:42:7");
        assert_eq!(sig, "segfault at <ADDR> in <PATH>:<N>:<N>");
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let n = SignatureNormalizer::new(5);
        assert_eq!(n.normalize("héllo wörld"), "héllo");
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = normalize("TypeError: 'NoneType' object at 0xdeadbeef in lib/x.py line 3");
        assert_eq!(normalize(&once), once);
    }
}
