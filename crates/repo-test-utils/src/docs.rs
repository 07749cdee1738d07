//! [`TestDocs`] for writing policy and target documents to a temp directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Value, json};
use tempfile::TempDir;

/// A temporary directory of policy and repository documents.
///
/// # Example
///
/// ```rust,no_run
/// use repo_test_utils::docs::TestDocs;
/// use serde_json::json;
///
/// let docs = TestDocs::new();
/// let policy = docs.write_json("policy.json", &json!([{"file": {"state": "absent", "path": "a"}}]));
/// let repos = docs.write_repositories("repos.json", &["github.com/octo/widgets"]);
/// ```
pub struct TestDocs {
    temp_dir: TempDir,
}

impl Default for TestDocs {
    fn default() -> Self {
        Self::new()
    }
}

impl TestDocs {
    /// Create an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap_or_else(|e| panic!("TestDocs: {e}")),
        }
    }

    /// Root of the temporary directory.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write `text` verbatim to `name`.
    ///
    /// # Panics
    /// Panics if the file cannot be written.
    pub fn write_raw(&self, name: &str, text: &str) -> PathBuf {
        let path = self.root().join(name);
        fs::write(&path, text)
            .unwrap_or_else(|e| panic!("TestDocs: failed to write {}: {e}", path.display()));
        path
    }

    /// Write `value` as pretty JSON to `name`.
    pub fn write_json(&self, name: &str, value: &Value) -> PathBuf {
        let text = serde_json::to_string_pretty(value)
            .unwrap_or_else(|e| panic!("TestDocs: failed to serialise {name}: {e}"));
        self.write_raw(name, &text)
    }

    /// Write a target list of `{ "url": ... }` records to `name`.
    pub fn write_repositories(&self, name: &str, urls: &[&str]) -> PathBuf {
        let records: Vec<Value> = urls.iter().map(|url| json!({ "url": url })).collect();
        self.write_json(name, &Value::Array(records))
    }
}
