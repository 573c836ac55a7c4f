//! Glob splitting, matching and local filesystem resolution.

use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{DriverError, DriverResult};

pub fn is_glob(location: &str) -> bool {
    location.contains(['*', '?', '[', ']'])
}

/// A glob location split at its first wildcard segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobSplit {
    /// Literal directory prefix; `.` when the first segment already has wildcards.
    pub base: String,
    /// Remaining segments joined with `/`.
    pub pattern: String,
}

/// Split "/data/2024/**/*.csv" into base "/data/2024" and pattern "**/*.csv".
pub fn split_base_pattern(location: &str) -> GlobSplit {
    let normalized = location.replace('\\', "/");
    let absolute = normalized.starts_with('/');
    let segments: Vec<&str> = normalized.trim_start_matches("./").split('/').filter(|s| !s.is_empty()).collect();
    let first_glob = segments.iter().position(|s| is_glob(s)).unwrap_or(segments.len());
    let base = segments[..first_glob].join("/");
    let base = match (absolute, base.is_empty()) {
        (true, _) => format!("/{}", base),
        (false, true) => ".".to_string(),
        (false, false) => base,
    };
    GlobSplit { base, pattern: segments[first_glob..].join("/") }
}

/// Shell semantics: `**` crosses separators, `*` and `?` do not.
pub fn compile(pattern: &str) -> DriverResult<GlobMatcher> {
    let glob = GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|e| DriverError::discovery("invalid_glob", format!("invalid glob pattern '{}': {}", pattern, e)))?;
    Ok(glob.compile_matcher())
}

/// A candidate matches on its path relative to the base, or on its bare file name.
pub fn matches(matcher: &GlobMatcher, relative: &str, file_name: &str) -> bool {
    matcher.is_match(relative) || matcher.is_match(file_name)
}

/// Regular files under `base` matching `pattern`, in file-name walk order.
/// A missing base is an empty result; any other failure is logged and also empty.
pub fn resolve_local(base: &Path, pattern: &str) -> Vec<PathBuf> {
    match try_resolve_local(base, pattern) {
        Ok(found) => found,
        Err(e) => {
            warn!(target: "filedriver::discovery", base = %base.display(), pattern, error = %e, "local glob resolution failed");
            Vec::new()
        }
    }
}

pub fn try_resolve_local(base: &Path, pattern: &str) -> DriverResult<Vec<PathBuf>> {
    let matcher = compile(pattern)?;
    if !base.is_dir() {
        debug!(target: "filedriver::discovery", base = %base.display(), "glob base does not exist");
        return Ok(Vec::new());
    }
    let mut found = Vec::new();
    for entry in WalkDir::new(base).min_depth(1).follow_links(false).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                debug!(target: "filedriver::discovery", error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = match entry.path().strip_prefix(base) {
            Ok(r) => r.to_string_lossy().replace('\\', "/"),
            Err(_) => continue,
        };
        let file_name = entry.file_name().to_string_lossy();
        if matches(&matcher, &relative, &file_name) {
            found.push(entry.into_path());
        }
    }
    debug!(target: "filedriver::discovery", base = %base.display(), pattern, matched = found.len(), "resolved local glob");
    Ok(found)
}

#[cfg(test)]
#[path = "glob_tests.rs"]
mod glob_tests;
