use std::path::Path;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

/// SHA-256 digest over a source tree, returned as a lowercase hex string.
///
/// Only files whose name matches one of `patterns` contribute (`*.ext`
/// suffix patterns or exact names); any path containing a component from
/// `ignore_dirs` is skipped. Files are hashed in sorted relative-path
/// order with `/`-normalized separators, so the digest is stable across
/// platforms and repeated runs.
pub fn source_tree_digest(dir: &Path, patterns: &[&str], ignore_dirs: &[&str]) -> Result<String> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.with_context(|| format!("walking source tree {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(dir)
            .context("entry outside the walked tree")?;
        if rel
            .components()
            .any(|c| ignore_dirs.contains(&c.as_os_str().to_string_lossy().as_ref()))
        {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy();
        if !matches_any(patterns, &file_name) {
            continue;
        }
        let rel = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        files.push((rel, entry.path().to_path_buf()));
    }
    files.sort();

    let mut hasher = Sha256::new();
    for (rel, path) in files {
        let content =
            std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
        hasher.update(rel.as_bytes());
        hasher.update([0]);
        hasher.update(&content);
        hasher.update([0]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

fn matches_any(patterns: &[&str], file_name: &str) -> bool {
    patterns.iter().any(|pattern| match pattern.strip_prefix('*') {
        Some(suffix) => file_name.ends_with(suffix),
        None => *pattern == file_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkg_constants::build::{DIGEST_IGNORE_DIRS, DIGEST_PATTERNS};
    use std::fs;

    fn digest(dir: &Path) -> String {
        source_tree_digest(dir, DIGEST_PATTERNS, DIGEST_IGNORE_DIRS).unwrap()
    }

    #[test]
    fn digest_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("main.py"), "print('hi')\n").unwrap();
        fs::write(dir.path().join("Dockerfile"), "FROM python:3.12\n").unwrap();
        assert_eq!(digest(dir.path()), digest(dir.path()));
    }

    #[test]
    fn content_changes_change_the_digest() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("main.py"), "print('hi')\n").unwrap();
        let before = digest(dir.path());
        fs::write(dir.path().join("main.py"), "print('bye')\n").unwrap();
        assert_ne!(before, digest(dir.path()));
    }

    #[test]
    fn unmatched_files_do_not_contribute() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("main.py"), "print('hi')\n").unwrap();
        let before = digest(dir.path());
        fs::write(dir.path().join("notes.txt"), "scratch\n").unwrap();
        assert_eq!(before, digest(dir.path()));
    }

    #[test]
    fn ignored_directories_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("main.py"), "print('hi')\n").unwrap();
        let before = digest(dir.path());
        fs::create_dir(dir.path().join(".venv")).unwrap();
        fs::write(dir.path().join(".venv").join("dep.py"), "x = 1\n").unwrap();
        assert_eq!(before, digest(dir.path()));
    }

    #[test]
    fn renaming_a_file_changes_the_digest() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.py"), "x = 1\n").unwrap();
        let before = digest(dir.path());
        fs::rename(dir.path().join("a.py"), dir.path().join("b.py")).unwrap();
        assert_ne!(before, digest(dir.path()));
    }

    #[test]
    fn exact_name_pattern_matches_dockerfile_only() {
        assert!(matches_any(&["Dockerfile"], "Dockerfile"));
        assert!(!matches_any(&["Dockerfile"], "Dockerfile.dev"));
        assert!(matches_any(&["*.toml"], "Cargo.toml"));
        assert!(!matches_any(&["*.toml"], "Cargo.lock"));
    }
}
