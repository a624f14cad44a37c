//! Path sandbox guard — keeps every tool operation inside one allowed root.

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use tracing::warn;

use crate::error::{FilebotError, FilebotResult};

/// Decides whether candidate paths lie inside the allowed root.
///
/// The root is canonicalized once at construction. Candidates are resolved
/// relative to the root, normalized lexically (`.`/`..`), then have symlinks
/// resolved through their deepest existing ancestor, and are finally compared
/// component-wise against the root.
#[derive(Debug, Clone)]
pub struct PathGuard {
    root: PathBuf,
}

impl PathGuard {
    /// Create a guard for `root`, which must exist.
    pub fn new(root: impl AsRef<Path>) -> FilebotResult<Self> {
        let root = root.as_ref();
        let root = root.canonicalize().map_err(|source| FilebotError::Io {
            path: root.to_path_buf(),
            source,
        })?;
        Ok(Self { root })
    }

    /// The canonical allowed root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// True if `candidate` resolves inside the allowed root.
    pub fn is_allowed(&self, candidate: &str) -> bool {
        self.resolve(candidate).is_ok()
    }

    /// Resolve `candidate` to an absolute path inside the root.
    ///
    /// Rejects null bytes, `..` escapes, and symlinks (including dangling
    /// ones) that lead outside the root.
    pub fn resolve(&self, candidate: &str) -> FilebotResult<PathBuf> {
        let violation = || {
            warn!(path = candidate, root = %self.root.display(), "sandbox violation");
            FilebotError::SandboxViolation {
                path: candidate.to_owned(),
            }
        };

        // Null bytes can bypass C-based path APIs.
        if candidate.contains('\0') {
            return Err(violation());
        }

        let raw = if Path::new(candidate).is_absolute() {
            PathBuf::from(candidate)
        } else {
            self.root.join(candidate)
        };

        let normalized = normalize(&raw);
        if !normalized.starts_with(&self.root) {
            return Err(violation());
        }

        let resolved = resolve_existing_prefix(&normalized).ok_or_else(violation)?;
        if !resolved.starts_with(&self.root) {
            return Err(violation());
        }

        Ok(resolved)
    }
}

/// Lexically collapse `.` and `..` without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
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

/// Canonicalize the deepest existing ancestor of a normalized path and
/// re-append the missing tail. Returns `None` when an existing entry cannot
/// be canonicalized (dangling symlink, permission error).
fn resolve_existing_prefix(path: &Path) -> Option<PathBuf> {
    let mut ancestor = path.to_path_buf();
    let mut tail: Vec<OsString> = Vec::new();

    // symlink_metadata so that a dangling symlink counts as existing and
    // fails canonicalization instead of being treated as a fresh name.
    while ancestor.symlink_metadata().is_err() {
        let name = ancestor.file_name()?.to_os_string();
        tail.push(name);
        if !ancestor.pop() {
            return None;
        }
    }

    let mut resolved = ancestor.canonicalize().ok()?;
    for part in tail.iter().rev() {
        resolved.push(part);
    }
    Some(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard() -> (tempfile::TempDir, PathGuard) {
        let dir = tempfile::tempdir().expect("tempdir");
        let guard = PathGuard::new(dir.path()).expect("guard");
        (dir, guard)
    }

    #[test]
    fn test_relative_paths_inside_root() {
        let (_dir, guard) = guard();
        assert!(guard.is_allowed("."));
        assert!(guard.is_allowed("notes.txt"));
        assert!(guard.is_allowed("a/b/../c.txt"));
        assert_eq!(guard.resolve(".").expect("root"), guard.root());
    }

    #[test]
    fn test_traversal_rejected() {
        let (_dir, guard) = guard();
        assert!(!guard.is_allowed(".."));
        assert!(!guard.is_allowed("../etc/passwd"));
        assert!(!guard.is_allowed("sub/../../outside"));
        assert!(!guard.is_allowed("missing/../../../etc"));
    }

    #[test]
    fn test_absolute_paths() {
        let (_dir, guard) = guard();
        let inside = guard.root().join("x.txt");
        assert!(guard.is_allowed(inside.to_str().expect("utf8")));
        assert!(!guard.is_allowed("/etc/passwd"));
    }

    #[test]
    fn test_sibling_prefix_not_allowed() {
        let parent = tempfile::tempdir().expect("tempdir");
        let root = parent.path().join("allowed-root");
        let evil = parent.path().join("allowed-root-evil");
        std::fs::create_dir(&root).expect("mkdir root");
        std::fs::create_dir(&evil).expect("mkdir evil");

        let guard = PathGuard::new(&root).expect("guard");
        let evil_file = evil.canonicalize().expect("canon").join("f.txt");
        assert!(!guard.is_allowed(evil_file.to_str().expect("utf8")));
    }

    #[test]
    fn test_null_byte_rejected() {
        let (_dir, guard) = guard();
        assert!(!guard.is_allowed("a\0b"));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_escape_rejected() {
        let (dir, guard) = guard();
        let outside = tempfile::tempdir().expect("outside");
        std::os::unix::fs::symlink(outside.path(), dir.path().join("link")).expect("symlink");

        assert!(!guard.is_allowed("link"));
        assert!(!guard.is_allowed("link/new.txt"));
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_rejected() {
        let (dir, guard) = guard();
        std::os::unix::fs::symlink("/nonexistent/filebot-target", dir.path().join("dangling"))
            .expect("symlink");
        assert!(!guard.is_allowed("dangling"));
    }

    #[test]
    fn test_missing_root_is_error() {
        let err = PathGuard::new("/nonexistent/filebot-root").expect_err("missing root");
        assert!(matches!(err, FilebotError::Io { .. }));
    }
}
