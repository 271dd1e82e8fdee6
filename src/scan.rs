//! Discovery of nested archives in an extracted tree.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Whether `path` has one of `extensions` (lowercase, no dot).
pub fn is_archive_name(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .is_some_and(|ext| extensions.iter().any(|e| *e == ext))
}

/// Regular files under `root` that look like archives, in file-name order.
///
/// Symlinks are not followed. Unreadable entries are logged and skipped.
pub fn find_nested_archives(root: &Path, extensions: &[String]) -> Vec<PathBuf> {
    WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(root = %root.display(), "skipping unreadable entry: {e}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| is_archive_name(entry.path(), extensions))
        .map(|entry| entry.into_path())
        .collect()
}

/// Directory a nested archive expands into: its sibling named after the
/// archive with the extension removed.
pub fn nested_target(archive: &Path) -> PathBuf {
    let stem = archive
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| "extracted".into());
    archive.with_file_name(stem)
}
