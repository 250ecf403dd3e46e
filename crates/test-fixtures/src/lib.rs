//! Test fixture loader for overseer golden datasets and sample agent logs.
//!
//! Fixture files live next to this crate's manifest and are located from
//! whichever workspace crate the test runs in.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::PathBuf;

/// Root directory of the test-fixtures folder.
fn fixtures_root() -> PathBuf {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let mut path = PathBuf::from(&manifest_dir);

    if path.join("golden").exists() {
        return path;
    }
    // From a sibling crate: climb until `test-fixtures/` appears.
    while !path.join("test-fixtures").join("golden").exists() {
        if !path.pop() {
            panic!(
                "Could not find test-fixtures directory from CARGO_MANIFEST_DIR={}",
                manifest_dir
            );
        }
    }
    path.join("test-fixtures")
}

/// Load and deserialize a JSON fixture file.
///
/// # Panics
/// Panics if the file doesn't exist or can't be deserialized.
pub fn load_fixture<T: DeserializeOwned>(relative_path: &str) -> T {
    let path = fixtures_root().join(relative_path);
    let content = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse fixture {}: {}", path.display(), e))
}

/// Load a non-JSON fixture (e.g. a captured log) as text.
pub fn load_text(relative_path: &str) -> String {
    let path = fixtures_root().join(relative_path);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e))
}

pub fn fixture_exists(relative_path: &str) -> bool {
    fixtures_root().join(relative_path).exists()
}

pub fn fixture_path(relative_path: &str) -> PathBuf {
    fixtures_root().join(relative_path)
}

/// One raw message and the signature it must normalize to.
#[derive(Debug, Clone, Deserialize)]
pub struct SignatureCase {
    pub name: String,
    pub input: String,
    pub expected: String,
}

/// Messages that differ only in volatile tokens and must share a signature.
#[derive(Debug, Clone, Deserialize)]
pub struct EquivalenceGroup {
    pub name: String,
    pub messages: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignatureGolden {
    pub cases: Vec<SignatureCase>,
    pub equivalent: Vec<EquivalenceGroup>,
}

pub fn load_signature_golden() -> SignatureGolden {
    load_fixture("golden/signatures.json")
}

/// Expected watchdog matches for a sample log.
#[derive(Debug, Clone, Deserialize)]
pub struct ExpectedDetection {
    pub line: u64,
    pub error_type: String,
    pub file_path: Option<String>,
    pub line_number: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogScenario {
    pub log_file: String,
    pub total_lines: u64,
    pub detections: Vec<ExpectedDetection>,
}

pub fn load_log_scenario(name: &str) -> LogScenario {
    load_fixture(&format!("golden/{name}.json"))
}
