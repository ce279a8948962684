//! Locating real plotfiles for optional tests.
//!
//! Synthetic fixtures cover the test suite; these helpers let a developer
//! point the tests at plotfiles written by an actual AMReX run as well.

use std::path::PathBuf;

/// Returns the workspace root directory.
pub fn workspace_root() -> PathBuf {
    // Start from the test-utils crate manifest dir
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    PathBuf::from(manifest_dir)
        .parent() // crates/
        .and_then(|p| p.parent()) // workspace root
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from(manifest_dir))
}

/// Returns `crates/{crate_name}/testdata/`.
pub fn crate_testdata_dir(crate_name: &str) -> PathBuf {
    workspace_root()
        .join("crates")
        .join(crate_name)
        .join("testdata")
}

/// Searches for a plotfile directory named `name`.
///
/// Checks, in order:
/// 1. `$PLOTFILE_TEST_DATA/{name}`
/// 2. `crates/plotfile-reader/testdata/{name}`
/// 3. `testdata/{name}` at the workspace root
///
/// A candidate counts only if it contains a `Header` file.
pub fn find_test_plotfile(name: &str) -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(dir) = std::env::var("PLOTFILE_TEST_DATA") {
        candidates.push(PathBuf::from(dir).join(name));
    }

    let root = workspace_root();
    candidates.extend([
        crate_testdata_dir("plotfile-reader").join(name),
        root.join("testdata").join(name),
    ]);

    candidates.into_iter().find(|p| p.join("Header").is_file())
}
