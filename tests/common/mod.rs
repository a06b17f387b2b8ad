#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use csv_colmatch::{
    FileProfile,
    classify::TypeClassifier,
    profile::{ProfileOptions, build_profile},
    rows::MemoryRowSource,
};
use tempfile::{TempDir, tempdir};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}

/// Profiles column-major data with the default classifier, collecting values.
pub fn profile(identity: &str, columns: &[(&str, Vec<&str>)]) -> FileProfile {
    let mut source = MemoryRowSource::from_columns(identity, columns);
    build_profile(
        &mut source,
        &TypeClassifier::default(),
        &ProfileOptions::default(),
    )
    .expect("profile")
}

/// The two-file example used throughout: `{id, name}` against `{id, code}`.
pub fn customers_and_orders() -> (FileProfile, FileProfile) {
    let left = profile(
        "customers.csv",
        &[("id", vec!["1", "2", "3"]), ("name", vec!["x", "y", "z"])],
    );
    let right = profile(
        "orders.csv",
        &[("id", vec!["2", "3", "4"]), ("code", vec!["2", "3"])],
    );
    (left, right)
}
