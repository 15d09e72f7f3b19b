//! Test harness for split integration tests.
//!
//! Copies a fixture project into a temp dir and loads its `.classplit.toml`,
//! so every test can rewrite files freely.

use classplit_core::config::{load_config, SplitConfig};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct TestProject {
    pub config: SplitConfig,
    _temp_dir: TempDir,
}

impl TestProject {
    /// Create a project from a named fixture directory.
    pub fn from_fixture(name: &str) -> Self {
        let fixture_src =
            Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name);
        assert!(fixture_src.exists(), "Fixture '{name}' not found at {}", fixture_src.display());

        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let copied = copy_project_files(&fixture_src, temp_dir.path())
            .unwrap_or_else(|e| panic!("Failed to copy fixture '{name}': {e}"));
        assert!(copied > 0, "Fixture '{name}' is empty");

        let config = load_config(temp_dir.path()).expect("Failed to load fixture config");
        TestProject { config, _temp_dir: temp_dir }
    }

    pub fn root(&self) -> &Path {
        &self.config.root
    }

    pub fn source(&self) -> String {
        std::fs::read_to_string(self.config.source_path()).expect("Failed to read source")
    }

    pub fn unit_path(&self, class: &str) -> PathBuf {
        self.config.output_path().join(format!("{class}.cpp"))
    }

    pub fn unit(&self, class: &str) -> String {
        std::fs::read_to_string(self.unit_path(class)).expect("Failed to read unit")
    }
}

/// Copy the source and config files of a fixture project. Fixture projects
/// are flat, so subdirectories are not copied; generated `services/` output
/// must not exist before a run anyway.
fn copy_project_files(src: &Path, dst: &Path) -> std::io::Result<usize> {
    let mut copied = 0;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            std::fs::copy(entry.path(), dst.join(entry.file_name()))?;
            copied += 1;
        }
    }
    Ok(copied)
}
