//! Scope resolution for weft agents.
//!
//! Answers whether an agent may read or modify a file path under its scope's
//! glob patterns. Glob semantics: `**` matches any depth, `*` stays within a
//! single path segment. All functions here are pure; enforcement is the
//! caller's job.

#[cfg(test)]
mod tests;

use crate::agent::Scope;
use globset::GlobBuilder;

/// True iff `path` matches at least one of the scope's patterns.
///
/// Patterns that fail to compile as globs match nothing rather than failing
/// the whole query.
pub fn can_access(path: &str, scope: &Scope) -> bool {
    let normalized = normalize_path(path);
    scope
        .patterns
        .iter()
        .any(|pattern| glob_matches(pattern, &normalized))
}

/// True iff the agent may modify `path`: never for read-only scopes,
/// otherwise the same as [`can_access`].
pub fn can_modify(path: &str, scope: &Scope) -> bool {
    if scope.read_only {
        return false;
    }
    can_access(path, scope)
}

/// Among the patterns matching `path`, return the one with the greatest
/// path-segment count. Ties go to the first occurrence; `None` when no
/// pattern matches.
pub fn most_specific_pattern<'a>(path: &str, patterns: &'a [String]) -> Option<&'a str> {
    let normalized = normalize_path(path);

    let mut best: Option<&str> = None;
    let mut best_segments = 0usize;

    for pattern in patterns {
        if !glob_matches(pattern, &normalized) {
            continue;
        }
        let segments = pattern.split('/').count();
        if best.is_none() || segments > best_segments {
            best = Some(pattern);
            best_segments = segments;
        }
    }

    best
}

/// Compile and match a single pattern against a normalized path.
fn glob_matches(pattern: &str, path: &str) -> bool {
    let normalized_pattern = normalize_path(pattern);
    GlobBuilder::new(&normalized_pattern)
        .literal_separator(true)
        .build()
        .map(|glob| glob.compile_matcher().is_match(path))
        .unwrap_or(false)
}

/// Normalize a path to forward slashes for matching.
fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}
