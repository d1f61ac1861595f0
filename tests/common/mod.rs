//! Common test utilities for sqlmeta tests

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

/// Test context with temporary directory for isolated test execution
pub struct TestContext {
    /// Kept to prevent temp directory cleanup until TestContext is dropped
    _temp_dir: TempDir,
    pub root: PathBuf,
}

impl TestContext {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path().to_path_buf();
        Self {
            _temp_dir: temp_dir,
            root,
        }
    }

    /// Write `content` to `relative_path`, creating parent directories.
    pub fn write_file(&self, relative_path: &str, content: impl AsRef<[u8]>) -> PathBuf {
        let path = self.root.join(relative_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&path, content).expect("Failed to write test file");
        path
    }

    pub fn analyze(&self, paths: Vec<PathBuf>) -> Vec<sqlmeta::QueryReport> {
        sqlmeta::analyze(sqlmeta::AnalyzeOptions {
            paths,
            ..Default::default()
        })
        .expect("Analysis failed")
    }
}
