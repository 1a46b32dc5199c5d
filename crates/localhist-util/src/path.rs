//! Path utilities.
//!
//! This module provides utilities for working with file paths.

use std::path::{Component, Path, PathBuf};

/// Get the localhist data directory.
///
/// This follows XDG conventions:
/// - `$XDG_DATA_HOME/localhist` if set
/// - `~/.local/share/localhist` otherwise
pub fn data_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|p| p.join("localhist"))
}

/// Get the conventional history store root.
///
/// Hosts are free to pass any other directory when constructing a service.
pub fn history_dir() -> Option<PathBuf> {
    data_dir().map(|p| p.join("history"))
}

/// Normalize a path by removing `.` and `..` components.
///
/// Unlike `canonicalize`, this doesn't require the path to exist.
pub fn normalize(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();

    for component in path.components() {
        match component {
            Component::ParentDir => match result.components().next_back() {
                Some(Component::Normal(_)) => {
                    result.pop();
                }
                // `..` above the root is the root
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                // Leading `..` of a relative path cannot be resolved
                Some(Component::ParentDir) | Some(Component::CurDir) | None => {
                    result.push(Component::ParentDir);
                }
            },
            Component::CurDir => {}
            _ => {
                result.push(component);
            }
        }
    }

    result
}

/// Render a path with forward slashes regardless of platform.
pub fn to_slash(path: &Path) -> String {
    let mut out = String::new();
    for (i, component) in path.components().enumerate() {
        match component {
            Component::RootDir => {
                if !out.ends_with('/') {
                    out.push('/');
                }
            }
            Component::Prefix(prefix) => out.push_str(&prefix.as_os_str().to_string_lossy()),
            other => {
                if i > 0 && !out.ends_with('/') {
                    out.push('/');
                }
                out.push_str(&other.as_os_str().to_string_lossy());
            }
        }
    }
    out
}

/// Return the extension of a path including the leading dot, or an empty string.
pub fn dotted_extension(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_dir() {
        if let Some(dir) = history_dir() {
            assert!(dir.ends_with("localhist/history"));
        }
    }

    #[test]
    fn test_normalize() {
        let path = Path::new("/home/user/./project/../project/src");
        let normalized = normalize(path);
        assert_eq!(normalized, PathBuf::from("/home/user/project/src"));
    }

    #[test]
    fn test_normalize_relative() {
        assert_eq!(normalize(Path::new("a/./b/../c")), PathBuf::from("a/c"));
    }

    #[test]
    fn test_normalize_keeps_leading_parent_dirs() {
        assert_eq!(normalize(Path::new("../b")), PathBuf::from("../b"));
        assert_eq!(normalize(Path::new("a/../../b")), PathBuf::from("../b"));
        assert_eq!(normalize(Path::new("../../a/./b/..")), PathBuf::from("../../a"));
        assert_ne!(normalize(Path::new("../b")), normalize(Path::new("b")));
    }

    #[cfg(unix)]
    #[test]
    fn test_normalize_parent_of_root_is_root() {
        assert_eq!(normalize(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(normalize(Path::new("/..")), PathBuf::from("/"));
    }

    #[cfg(unix)]
    #[test]
    fn test_to_slash() {
        assert_eq!(to_slash(Path::new("/home/user/foo.txt")), "/home/user/foo.txt");
        assert_eq!(to_slash(Path::new("rel/dir/file")), "rel/dir/file");
        assert_eq!(to_slash(Path::new("/")), "/");
    }

    #[test]
    fn test_dotted_extension() {
        assert_eq!(dotted_extension(Path::new("/a/foo.txt")), ".txt");
        assert_eq!(dotted_extension(Path::new("/a/archive.tar.gz")), ".gz");
        assert_eq!(dotted_extension(Path::new("/a/Makefile")), "");
    }
}
