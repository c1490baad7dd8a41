// src/watch/path_utils.rs

//! Utility functions for path handling.

use std::path::{Component, Path, PathBuf};

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// - First we try a direct `strip_prefix(root)`.
/// - If that fails (e.g. due to symlinks or different absolute prefixes),
///   we canonicalize both paths and try again. This helps on platforms
///   (notably macOS) where `/var/...` and `/private/var/...` name the same
///   directory.
///
/// Returns `None` if the path cannot be related to `root`. A removed file
/// cannot be canonicalized, so the fast path is the one that matters there.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(to_slash(rel));
    }

    if let (Ok(root_canon), Ok(path_canon)) = (root.canonicalize(), path.canonicalize()) {
        if let Ok(rel) = path_canon.strip_prefix(&root_canon) {
            return Some(to_slash(rel));
        }
    }

    None
}

fn to_slash(rel: &Path) -> String {
    rel.to_string_lossy().replace('\\', "/")
}

/// Make `path` absolute against `cwd` and resolve `.` / `..` lexically.
///
/// Symlinks are left alone so that names derived from the path (the artifact
/// name) are the ones the user typed.
pub fn absolutize(cwd: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// True if `descendant` is `ancestor` or lies below it (component-wise).
pub fn is_within(ancestor: &Path, descendant: &Path) -> bool {
    descendant.starts_with(ancestor)
}
