//! Source-file matching and directory keys.

use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Normalized key naming the directory whose tests should run.
///
/// Absolute paths and paths already starting with `.` are kept as-is,
/// anything else is prefixed with `./` so the test command sees a local path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DirKey(String);

impl DirKey {
    /// Wrap an already-normalized key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Build the key for a directory path.
    pub fn from_dir(dir: &Path) -> Self {
        let raw = dir.to_string_lossy();
        if raw.is_empty() {
            return Self(".".to_string());
        }
        if dir.is_absolute() || raw.starts_with('.') {
            Self(raw.into_owned())
        } else {
            Self(format!("./{raw}"))
        }
    }

    /// Key of the directory containing `file`.
    pub fn for_file(file: &Path) -> Self {
        Self::from_dir(file.parent().unwrap_or_else(|| Path::new("")))
    }

    /// Key of the directory containing a file reported by the OS watcher.
    ///
    /// Event paths are absolute even when the tree was walked from a relative
    /// root. Paths under `base` are made relative to it again, with `.`
    /// components dropped, so `/work/./pkg/a.go` under `/work` keys as `./pkg`.
    pub fn for_event_path(file: &Path, base: Option<&Path>) -> Self {
        let Some(relative) = base.and_then(|base| file.strip_prefix(base).ok()) else {
            return Self::for_file(file);
        };

        let relative: PathBuf = relative
            .components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect();
        Self::for_file(&relative)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DirKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DirKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DirKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for DirKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// Matches files by their extension, ignoring ASCII case.
#[derive(Debug, Clone)]
pub struct SourceFilter {
    extension: String,
}

impl SourceFilter {
    /// Accepts `"go"` as well as `".go"`.
    pub fn new(extension: &str) -> Self {
        Self {
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Check if a path has the tracked extension.
    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.extension))
    }

    /// A directory qualifies when one of its direct children is a matching file.
    ///
    /// Unreadable directories never qualify.
    pub fn dir_qualifies(&self, dir: &Path) -> bool {
        let Ok(entries) = fs::read_dir(dir) else {
            return false;
        };

        entries.flatten().any(|entry| {
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            !is_dir && self.matches(&entry.path())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_matches_extension_case_insensitive() {
        let filter = SourceFilter::new("go");

        let test_cases = vec![
            ("main.go", true),
            ("pkg/util.go", true),
            ("MAIN.GO", true),
            ("main.go.swp", false),
            ("main.rs", false),
            ("go", false),
            ("Makefile", false),
        ];

        for (filename, expected) in test_cases {
            assert_eq!(
                filter.matches(&PathBuf::from(filename)),
                expected,
                "Failed for filename: {filename}"
            );
        }
    }

    #[test]
    fn test_leading_dot_in_extension() {
        let filter = SourceFilter::new(".rs");
        assert_eq!(filter.extension(), "rs");
        assert!(filter.matches(Path::new("lib.rs")));
    }

    #[test]
    fn test_dir_qualifies_only_on_direct_children() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let nested = root.join("nested");
        fs::create_dir(&nested).unwrap();
        fs::write(nested.join("a.go"), b"package nested").unwrap();
        fs::write(root.join("README.md"), b"docs").unwrap();

        let filter = SourceFilter::new("go");
        assert!(!filter.dir_qualifies(root));
        assert!(filter.dir_qualifies(&nested));
    }

    #[test]
    fn test_dir_named_like_source_does_not_qualify() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("vendor.go")).unwrap();

        let filter = SourceFilter::new("go");
        assert!(!filter.dir_qualifies(temp_dir.path()));
    }

    #[test]
    fn test_missing_dir_does_not_qualify() {
        let filter = SourceFilter::new("go");
        assert!(!filter.dir_qualifies(Path::new("/definitely/not/here")));
    }

    #[test]
    fn test_dir_key_normalization() {
        assert_eq!(DirKey::from_dir(Path::new("pkg/api")).as_str(), "./pkg/api");
        assert_eq!(DirKey::from_dir(Path::new("./pkg")).as_str(), "./pkg");
        assert_eq!(DirKey::from_dir(Path::new("../other")).as_str(), "../other");
        assert_eq!(DirKey::from_dir(Path::new("")).as_str(), ".");
        assert_eq!(DirKey::for_file(Path::new("main.go")).as_str(), ".");
        assert_eq!(DirKey::for_file(Path::new("cmd/app/main.go")).as_str(), "./cmd/app");
    }

    #[cfg(unix)]
    #[test]
    fn test_event_path_relative_to_base() {
        let base = Some(Path::new("/tmp/work"));

        assert_eq!(
            DirKey::for_event_path(Path::new("/tmp/work/./proj/pkg/a.go"), base).as_str(),
            "./proj/pkg"
        );
        assert_eq!(
            DirKey::for_event_path(Path::new("/tmp/work/./top.go"), base).as_str(),
            "."
        );
        assert_eq!(
            DirKey::for_event_path(Path::new("/tmp/work/top.go"), None).as_str(),
            "/tmp/work"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_dir_key_keeps_absolute_paths() {
        assert_eq!(
            DirKey::for_file(Path::new("/src/project/main.go")).as_str(),
            "/src/project"
        );
    }
}
