//! Station file discovery.

use crate::error::{PipelineError, Result, ResultExt};
use std::path::{Path, PathBuf};
use tracing::debug;

/// List the files in `dir` whose names match `pattern`, sorted by path.
///
/// Fails with `Configuration` when `dir` is missing or not a directory and
/// with `NoData` when nothing matches. Nothing is opened or parsed here.
pub fn discover_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Err(PipelineError::Configuration(format!(
            "data directory {} does not exist",
            dir.display()
        )));
    }
    if !dir.is_dir() {
        return Err(PipelineError::Configuration(format!(
            "{} is not a directory",
            dir.display()
        )));
    }

    let matcher = glob::Pattern::new(pattern).map_err(|e| {
        PipelineError::Configuration(format!("invalid file pattern '{}': {}", pattern, e))
    })?;

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).context(format!("Listing {}", dir.display()))? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| matcher.matches(name));
        if matches {
            files.push(path);
        }
    }

    if files.is_empty() {
        return Err(PipelineError::NoData {
            dir: dir.to_path_buf(),
            pattern: pattern.to_string(),
        });
    }

    files.sort();
    debug!("Discovered {} station files in {}", files.len(), dir.display());
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_directory_is_configuration_error() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope");

        let err = discover_files(&missing, "*.csv").unwrap_err();
        assert_eq!(err.error_code(), "CONFIGURATION_ERROR");
    }

    #[test]
    fn test_file_instead_of_directory() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("data.csv");
        fs::write(&file, "x").unwrap();

        let err = discover_files(&file, "*.csv").unwrap_err();
        assert_eq!(err.error_code(), "CONFIGURATION_ERROR");
    }

    #[test]
    fn test_empty_directory_is_no_data() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("notes.txt"), "not a station").unwrap();

        let err = discover_files(tmp.path(), "*.csv").unwrap_err();
        assert!(matches!(err, PipelineError::NoData { .. }));
    }

    #[test]
    fn test_matches_sorted_and_skips_subdirectories() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("b_station.csv"), "").unwrap();
        fs::write(tmp.path().join("a_station.csv"), "").unwrap();
        fs::write(tmp.path().join("readme.md"), "").unwrap();
        fs::create_dir(tmp.path().join("nested.csv")).unwrap();

        let files = discover_files(tmp.path(), "*.csv").unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a_station.csv", "b_station.csv"]);
    }
}
