//! Path cleaning and segment-anchored prefix matching.
//!
//! Keys in the record store are cleaned, root-relative strings joined with
//! `/`: `"/a//b/./c/"` and `"a/b/c"` name the same record. The root is `"."`
//! and is never persisted.

use std::path::{Component, Path};

use super::error::{VfsError, VfsResult};

/// Key of the implicit root directory.
pub const ROOT: &str = ".";

/// Segment separator used in keys.
pub const SEPARATOR: char = '/';

/// Normalize a path into a record key.
///
/// Drops leading `/` and `.`, resolves `..` lexically (never above the
/// root), collapses repeated separators and strips trailing ones.
pub fn clean(path: &Path) -> VfsResult<String> {
    let mut segments: Vec<&str> = Vec::new();
    for component in path.components() {
        match component {
            Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
            Component::ParentDir => {
                segments.pop();
            }
            Component::Normal(s) => {
                let s = s
                    .to_str()
                    .ok_or_else(|| VfsError::invalid_path(path.display().to_string()))?;
                segments.push(s);
            }
        }
    }

    if segments.is_empty() {
        Ok(ROOT.to_string())
    } else {
        Ok(segments.join("/"))
    }
}

pub fn is_root(key: &str) -> bool {
    key == ROOT
}

/// Parent key; the root is its own parent.
pub fn parent(key: &str) -> &str {
    match key.rsplit_once(SEPARATOR) {
        Some((parent, _)) => parent,
        None => ROOT,
    }
}

/// Last segment of a key.
pub fn base_name(key: &str) -> &str {
    match key.rsplit_once(SEPARATOR) {
        Some((_, name)) => name,
        None => key,
    }
}

/// `"dir/"` for the string prefix shared by everything under `dir`, or
/// `None` for the root (everything is under it).
pub fn subtree_prefix(dir: &str) -> Option<String> {
    if is_root(dir) {
        None
    } else {
        Some(format!("{dir}{SEPARATOR}"))
    }
}

/// True when `candidate` lies strictly under `ancestor`.
///
/// Matching is anchored on a segment boundary: `foo/bar` is under `foo`,
/// `foobar` is not.
pub fn is_descendant(candidate: &str, ancestor: &str) -> bool {
    if is_root(candidate) {
        return false;
    }
    if is_root(ancestor) {
        return true;
    }
    candidate.len() > ancestor.len() + 1
        && candidate.starts_with(ancestor)
        && candidate.as_bytes()[ancestor.len()] == SEPARATOR as u8
}

/// True when `candidate` is an immediate child of `dir`.
pub fn is_child(candidate: &str, dir: &str) -> bool {
    if !is_descendant(candidate, dir) {
        return false;
    }
    let rest = if is_root(dir) {
        candidate
    } else {
        &candidate[dir.len() + 1..]
    };
    !rest.contains(SEPARATOR)
}

/// Every ancestor of `key` plus `key` itself, root-most first.
///
/// The root is not included.
pub fn ancestors(key: &str) -> Vec<&str> {
    if is_root(key) {
        return Vec::new();
    }
    let mut result: Vec<&str> = key
        .match_indices(SEPARATOR)
        .map(|(idx, _)| &key[..idx])
        .collect();
    result.push(key);
    result
}

/// Replace the `from` prefix of `key` with `to`.
///
/// `key` must be `from` itself or lie under it; neither `from` nor `to` may
/// be the root.
pub fn rebase(key: &str, from: &str, to: &str) -> String {
    debug_assert!(key == from || is_descendant(key, from));
    format!("{to}{}", &key[from.len()..])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(p: &str) -> String {
        clean(Path::new(p)).unwrap()
    }

    #[test]
    fn test_clean() {
        assert_eq!(c("a/b/c"), "a/b/c");
        assert_eq!(c("/a/b/c"), "a/b/c");
        assert_eq!(c("a//b/./c/"), "a/b/c");
        assert_eq!(c("a/b/../b/c"), "a/b/c");
        assert_eq!(c("./a"), "a");
        assert_eq!(c("../../a"), "a");
    }

    #[test]
    fn test_clean_root_forms() {
        assert_eq!(c(""), ROOT);
        assert_eq!(c("."), ROOT);
        assert_eq!(c("/"), ROOT);
        assert_eq!(c("a/.."), ROOT);
        assert!(is_root(&c("//")));
    }

    #[test]
    fn test_parent_and_base_name() {
        assert_eq!(parent("a/b/c"), "a/b");
        assert_eq!(parent("a"), ROOT);
        assert_eq!(parent(ROOT), ROOT);
        assert_eq!(base_name("a/b/c.txt"), "c.txt");
        assert_eq!(base_name("top"), "top");
    }

    #[test]
    fn test_descendant_is_segment_anchored() {
        assert!(is_descendant("foo/bar", "foo"));
        assert!(is_descendant("foo/a/b/c", "foo"));
        assert!(!is_descendant("foobar", "foo"));
        assert!(!is_descendant("foo", "foo"));
        assert!(!is_descendant("fo", "foo"));
        assert!(is_descendant("anything", ROOT));
        assert!(!is_descendant(ROOT, ROOT));
    }

    #[test]
    fn test_is_child() {
        assert!(is_child("a/b", "a"));
        assert!(!is_child("a/b/c", "a"));
        assert!(!is_child("ab", "a"));
        assert!(is_child("a", ROOT));
        assert!(!is_child("a/b", ROOT));
    }

    #[test]
    fn test_ancestors() {
        assert_eq!(ancestors("a/b/c"), vec!["a", "a/b", "a/b/c"]);
        assert_eq!(ancestors("a"), vec!["a"]);
        assert!(ancestors(ROOT).is_empty());
    }

    #[test]
    fn test_rebase() {
        assert_eq!(rebase("foo", "foo", "bar"), "bar");
        assert_eq!(rebase("foo/a/b", "foo", "bar"), "bar/a/b");
        assert_eq!(rebase("foo/a", "foo", "x/y"), "x/y/a");
    }

    #[test]
    fn test_subtree_prefix() {
        assert_eq!(subtree_prefix("a/b").as_deref(), Some("a/b/"));
        assert_eq!(subtree_prefix(ROOT), None);
    }
}
