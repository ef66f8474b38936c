//! Local filesystem search for packaged model directories.
//!
//! A directory counts as a packaged model when its direct contents include
//! the manifest sentinel file. Packaging sometimes wraps the model in a
//! named subfolder, so each root's immediate subdirectories are checked too.

use std::path::{Path, PathBuf};

use tracing::debug;

/// Searches ordered roots for a directory containing the manifest file.
///
/// Traversal is read-only and deterministic: roots in caller order, then the
/// root itself before its subdirectories, subdirectories in lexicographic
/// order. Missing or unreadable roots are skipped, never an error.
#[derive(Debug, Clone)]
pub struct ManifestScanner {
    manifest_name: String,
}

impl ManifestScanner {
    pub fn new(manifest_name: &str) -> Self {
        Self {
            manifest_name: manifest_name.to_string(),
        }
    }

    /// Return the first directory under `roots` holding the manifest.
    pub fn scan(&self, roots: &[PathBuf]) -> Option<PathBuf> {
        for root in roots {
            if let Some(found) = self.scan_root(root) {
                debug!(path = %found.display(), "manifest found during local scan");
                return Some(found);
            }
        }
        None
    }

    fn scan_root(&self, root: &Path) -> Option<PathBuf> {
        if root.join(&self.manifest_name).is_file() {
            return Some(root.to_path_buf());
        }

        let entries = std::fs::read_dir(root).ok()?;
        let mut subdirs: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect();
        subdirs.sort();

        subdirs
            .into_iter()
            .find(|dir| dir.join(&self.manifest_name).is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        std::fs::write(path, b"{}").unwrap();
    }

    #[test]
    fn test_manifest_directly_in_root() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("MLmodel"));

        let scanner = ManifestScanner::new("MLmodel");
        let found = scanner.scan(&[dir.path().to_path_buf()]);
        assert_eq!(found, Some(dir.path().to_path_buf()));
    }

    #[test]
    fn test_manifest_one_level_deep() {
        let dir = tempfile::tempdir().unwrap();
        let wrapped = dir.path().join("sklearn-model");
        std::fs::create_dir(&wrapped).unwrap();
        touch(&wrapped.join("MLmodel"));

        let scanner = ManifestScanner::new("MLmodel");
        let found = scanner.scan(&[dir.path().to_path_buf()]);
        assert_eq!(found, Some(wrapped));
    }

    #[test]
    fn test_two_levels_deep_is_not_a_match() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("outer").join("inner");
        std::fs::create_dir_all(&nested).unwrap();
        touch(&nested.join("MLmodel"));

        let scanner = ManifestScanner::new("MLmodel");
        assert_eq!(scanner.scan(&[dir.path().to_path_buf()]), None);
    }

    #[test]
    fn test_roots_searched_in_caller_order() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        touch(&first.path().join("MLmodel"));
        touch(&second.path().join("MLmodel"));

        let scanner = ManifestScanner::new("MLmodel");
        let found = scanner.scan(&[
            first.path().to_path_buf(),
            second.path().to_path_buf(),
        ]);
        assert_eq!(found, Some(first.path().to_path_buf()));
    }

    #[test]
    fn test_subdirectories_checked_lexicographically() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["zebra", "alpha"] {
            let sub = dir.path().join(name);
            std::fs::create_dir(&sub).unwrap();
            touch(&sub.join("MLmodel"));
        }

        let scanner = ManifestScanner::new("MLmodel");
        let found = scanner.scan(&[dir.path().to_path_buf()]);
        assert_eq!(found, Some(dir.path().join("alpha")));
    }

    #[test]
    fn test_missing_root_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("MLmodel"));

        let scanner = ManifestScanner::new("MLmodel");
        let found = scanner.scan(&[
            PathBuf::from("/does/not/exist"),
            dir.path().to_path_buf(),
        ]);
        assert_eq!(found, Some(dir.path().to_path_buf()));
    }

    #[test]
    fn test_manifest_name_must_match_exactly() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("MLmodel.bak"));

        let scanner = ManifestScanner::new("MLmodel");
        assert_eq!(scanner.scan(&[dir.path().to_path_buf()]), None);
    }

    #[test]
    fn test_manifest_must_be_a_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("MLmodel")).unwrap();

        let scanner = ManifestScanner::new("MLmodel");
        assert_eq!(scanner.scan(&[dir.path().to_path_buf()]), None);
    }
}
