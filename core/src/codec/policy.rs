//! codec/policy.rs
//! Which entries stay verbatim, and which scope (root or subpack) an entry belongs to.

use crate::constants::{EXCLUDED_FILES, SUBPACKS_DIR};

/// Whether `scope_relative` names a file that is always stored verbatim.
pub fn is_excluded(scope_relative: &str) -> bool {
    EXCLUDED_FILES.contains(&scope_relative)
}

/// Subpack root (`subpacks/<name>/`) containing `path`, if any.
///
/// Works for both directory entries and files, so roots are found even when the
/// archive carries no explicit directory entries.
pub fn subpack_root(path: &str) -> Option<&str> {
    let rest = path.strip_prefix(SUBPACKS_DIR)?.strip_prefix('/')?;
    let name_len = rest.find('/')?;
    if name_len == 0 {
        return None;
    }
    // "subpacks/" + name + "/"
    Some(&path[..SUBPACKS_DIR.len() + 1 + name_len + 1])
}

/// Split `path` into its scope prefix (`""` for the pack root) and the path relative to it.
pub fn split_scope(path: &str) -> (&str, &str) {
    match subpack_root(path) {
        Some(root) => (root, &path[root.len()..]),
        None => ("", path),
    }
}
