//! Input discovery: saved broker review pages on the local filesystem.

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::error::PipelineError;

/// All `*.html`/`*.htm` files directly under `dir`, sorted so runs are
/// deterministic.
pub fn discover_html_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(vec![]);
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_html = path
            .extension()
            .map(|e| e == "html" || e == "htm")
            .unwrap_or(false);
        if path.is_file() && is_html {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

pub fn read_page(path: &Path) -> Result<String, PipelineError> {
    std::fs::read_to_string(path).map_err(|source| PipelineError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// File name used for log attribution and report detail rows.
pub fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_filters_and_sorts() {
        let dir = std::env::temp_dir().join("fxbroker-etl-loader-test");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();

        std::fs::write(dir.join("b.html"), "<html></html>").unwrap();
        std::fs::write(dir.join("a.html"), "<html></html>").unwrap();
        std::fs::write(dir.join("notes.txt"), "skip me").unwrap();

        let files = discover_html_files(&dir).unwrap();
        let names: Vec<String> = files.iter().map(|p| source_name(p)).collect();
        assert_eq!(names, vec!["a.html", "b.html"]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_dir_is_empty() {
        let files = discover_html_files(Path::new("/nonexistent/fxbroker-etl")).unwrap();
        assert!(files.is_empty());
    }
}
