//! Built-in rule set and location extraction.

use std::sync::LazyLock;

use regex::Regex;

use overseer_core::models::Severity;

/// `(regex, error_type, severity)`. Order matters: the first match wins,
/// so specific exception names come before the generic fallbacks.
pub const DEFAULT_RULES: &[(&str, &str, Severity)] = &[
    (r"\bModuleNotFoundError\b", "ModuleNotFoundError", Severity::High),
    (r"\bImportError\b", "ImportError", Severity::High),
    (r"\b(?:SyntaxError|IndentationError)\b", "SyntaxError", Severity::High),
    (r"\bTypeError\b", "TypeError", Severity::Medium),
    (r"\bNameError\b", "NameError", Severity::Medium),
    (r"\bAttributeError\b", "AttributeError", Severity::Medium),
    (r"\bAssertionError\b", "AssertionError", Severity::Medium),
    (r"\bKeyError\b", "KeyError", Severity::Medium),
    (
        r"(?i)\bMemoryError\b|\bout of memory\b|\bOOM\b|\bKilled process\b",
        "OutOfMemory",
        Severity::Critical,
    ),
    (
        r"(?i)\bsegmentation fault\b|\bsegfault\b|\bSIGSEGV\b",
        "Segfault",
        Severity::Critical,
    ),
    (r"\bpanicked at\b", "Panic", Severity::Critical),
    (r"\berror\[E\d{4}\]", "RustCompileError", Severity::High),
    (r"\bnpm ERR!", "NpmError", Severity::Medium),
    (r"(?i)\bpermission denied\b", "PermissionDenied", Severity::High),
    (r"(?i)\bcommand not found\b", "CommandNotFound", Severity::Medium),
    (
        r"(?i)\btimed out\b|\btimeout expired\b|\bdeadline exceeded\b",
        "Timeout",
        Severity::Medium,
    ),
    (
        r"^(?:FAILED|FAIL)\b|\btest result: FAILED\b|\b\d+ failed\b",
        "TestFailure",
        Severity::Medium,
    ),
    (r"^Traceback \(most recent call last\)", "Traceback", Severity::Low),
    (r"(?i)^\s*(?:fatal|error):", "GenericError", Severity::Medium),
];

macro_rules! location_pattern {
    ($name:ident, $regex_str:expr) => {
        static $name: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new($regex_str).ok());
    };
}

location_pattern!(RE_PY_FRAME, r#"File "([^"]+)", line (\d+)"#);
location_pattern!(RE_PAREN_LINE, r"\(([^,()\s]+\.\w{1,6}), line (\d+)\)");
location_pattern!(
    RE_PATH_LINE,
    r"((?:[A-Za-z]:)?[\w./\\~\-]*[\w\-]\.[A-Za-z]{1,6}):(\d+)(?::\d+)?"
);

/// Pull a `(file, line)` pair out of a matched line, if it names one.
///
/// Recognises `File "x", line N`, `(x.py, line N)` and `path:line[:col]`.
pub fn extract_location(line: &str) -> (Option<String>, Option<u32>) {
    for pattern in [&RE_PY_FRAME, &RE_PAREN_LINE, &RE_PATH_LINE] {
        let Some(re) = pattern.as_ref() else { continue };
        if let Some(caps) = re.captures(line) {
            let file = caps.get(1).map(|m| m.as_str().to_string());
            let number = caps.get(2).and_then(|m| m.as_str().parse::<u32>().ok());
            return (file, number);
        }
    }
    (None, None)
}
