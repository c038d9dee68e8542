//! Input discovery: expand a glob pattern into the ordered list of files a
//! batch will process, and derive the label each file's artifacts are tagged
//! with.

use std::path::{is_separator, Path, PathBuf};

use crate::error::DiscoverError;
use crate::executor::types::InputFile;

/// Expand `pattern` into every matching regular file, sorted by path.
///
/// Directory components are expanded with `glob`. The last component is
/// matched against each directory listing by hand so file names that are
/// not valid UTF-8 are kept (matched on their lossy form, returned with the
/// original bytes). Unreadable directories are treated as non-matches.
pub fn discover(pattern: &str) -> Result<Vec<InputFile>, DiscoverError> {
    let invalid = |source| DiscoverError::Pattern {
        pattern: pattern.to_string(),
        source,
    };

    let (dir_pattern, name_pattern) = split_pattern(pattern);
    let matcher = glob::Pattern::new(name_pattern).map_err(invalid)?;

    let dirs: Vec<PathBuf> = match dir_pattern {
        None => vec![PathBuf::new()],
        Some(dir) if has_wildcard(dir) => glob::glob(dir)
            .map_err(invalid)?
            .filter_map(|entry| match entry {
                Ok(path) if path.is_dir() => Some(path),
                Ok(_) => None,
                Err(e) => {
                    tracing::debug!("Unreadable entry while expanding '{}': {}", pattern, e);
                    None
                }
            })
            .collect(),
        Some(dir) => vec![PathBuf::from(dir)],
    };

    let mut files = Vec::new();
    for dir in dirs {
        let listing = if dir.as_os_str().is_empty() {
            Path::new(".")
        } else {
            dir.as_path()
        };
        let entries = match std::fs::read_dir(listing) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!("Cannot list {}: {}", listing.display(), e);
                continue;
            }
        };

        for entry in entries.flatten() {
            let name = entry.file_name();
            if !matcher.matches(&name.to_string_lossy()) {
                continue;
            }
            let path = dir.join(&name);
            if path.is_file() {
                files.push(path);
            } else {
                tracing::debug!("Skipping non-file match: {}", path.display());
            }
        }
    }

    files.sort();
    files.dedup();

    tracing::debug!("Pattern '{}' matched {} file(s)", pattern, files.len());

    Ok(files.into_iter().map(InputFile::new).collect())
}

// Split at the last separator: ("dir/part", "name*"). A leading "/" stays
// with the directory.
fn split_pattern(pattern: &str) -> (Option<&str>, &str) {
    match pattern.rfind(is_separator) {
        Some(0) => (Some(&pattern[..1]), &pattern[1..]),
        Some(idx) => (Some(&pattern[..idx]), &pattern[idx + 1..]),
        None => (None, pattern),
    }
}

fn has_wildcard(s: &str) -> bool {
    s.contains(['*', '?', '['])
}

/// Base name of `path` with exactly one trailing extension removed.
pub fn label(path: impl AsRef<Path>) -> String {
    path.as_ref()
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
