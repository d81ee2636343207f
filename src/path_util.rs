//! Path normalization helpers shared by the history and backup modules.

use std::path::{Path, PathBuf};

/// Normalize `path` to a forward-slashed string relative to `cwd`.
///
/// Accepts both absolute and relative paths; both forms normalize to the
/// same entry so that tracking a file via its absolute path and its
/// relative path are idempotent.
pub fn normalize_relative(cwd: &Path, path: &Path) -> String {
    let relative = if path.is_absolute() {
        path.strip_prefix(cwd).unwrap_or(path).to_path_buf()
    } else {
        path.to_path_buf()
    };

    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Resolve a normalized relative path back to an absolute path under `cwd`.
pub fn to_absolute(cwd: &Path, relative: &str) -> PathBuf {
    cwd.join(relative)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_path_passes_through() {
        let cwd = Path::new("/workspace");
        assert_eq!(normalize_relative(cwd, Path::new("src/main.rs")), "src/main.rs");
    }

    #[test]
    fn absolute_path_strips_cwd_prefix() {
        let cwd = Path::new("/workspace");
        assert_eq!(
            normalize_relative(cwd, Path::new("/workspace/src/main.rs")),
            "src/main.rs"
        );
    }

    #[test]
    fn absolute_and_relative_forms_match() {
        let cwd = Path::new("/workspace");
        let a = normalize_relative(cwd, Path::new("/workspace/test.txt"));
        let b = normalize_relative(cwd, Path::new("test.txt"));
        assert_eq!(a, b);
    }

    #[test]
    fn nested_directories_use_forward_slashes() {
        let cwd = Path::new("/workspace");
        let normalized = normalize_relative(cwd, Path::new("a/b/c.txt"));
        assert_eq!(normalized, "a/b/c.txt");
    }
}
