//! Atomic file writing via tempfile + rename.
//!
//! The content goes to a temp file in the target's own directory and is then
//! persisted over the target, so readers never see a half-written file. The
//! replacement keeps the target's permissions; a new file gets the same
//! umask-default mode a plain create would.

use std::fs::Permissions;
use std::io::{ErrorKind, Write};
use std::path::Path;

use crate::error::{FilebotError, FilebotResult};

/// Atomically replace (or create) `path` with `content`.
///
/// The parent directory must already exist. A read-only target is refused
/// with [`ErrorKind::PermissionDenied`] rather than renamed over.
pub fn atomic_write(path: &Path, content: &str) -> FilebotResult<()> {
    let io_err = |source: std::io::Error| FilebotError::Io {
        path: path.to_path_buf(),
        source,
    };

    let parent = path
        .parent()
        .ok_or_else(|| io_err(std::io::Error::other("no parent directory")))?;

    let existing = match std::fs::metadata(path) {
        Ok(meta) => Some(meta.permissions()),
        Err(e) if e.kind() == ErrorKind::NotFound => None,
        Err(e) => return Err(io_err(e)),
    };
    if existing.as_ref().is_some_and(Permissions::readonly) {
        return Err(io_err(std::io::Error::new(
            ErrorKind::PermissionDenied,
            "file is read-only",
        )));
    }

    let mut builder = tempfile::Builder::new();
    builder.prefix(".filebot-");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // Masked by the process umask, like any other create.
        builder.permissions(Permissions::from_mode(0o666));
    }

    let mut tmp = builder.tempfile_in(parent).map_err(io_err)?;
    tmp.write_all(content.as_bytes()).map_err(io_err)?;
    tmp.flush().map_err(io_err)?;
    if let Some(perms) = existing {
        tmp.as_file().set_permissions(perms).map_err(io_err)?;
    }
    tmp.persist(path).map_err(|e| io_err(e.error))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creates_and_replaces() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("out.txt");

        atomic_write(&target, "first").expect("create");
        atomic_write(&target, "second").expect("replace");

        assert_eq!(std::fs::read_to_string(&target).expect("read"), "second");
        // Only the target remains; the temp file was renamed over it.
        assert_eq!(std::fs::read_dir(dir.path()).expect("readdir").count(), 1);
    }

    #[test]
    fn test_missing_parent_is_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = atomic_write(&dir.path().join("missing/out.txt"), "x").expect_err("no parent");
        assert!(matches!(err, FilebotError::Io { .. }));
    }

    #[test]
    fn test_read_only_target_is_permission_denied() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("locked.txt");
        std::fs::write(&target, "keep").expect("write");
        let mut perms = std::fs::metadata(&target).expect("metadata").permissions();
        perms.set_readonly(true);
        std::fs::set_permissions(&target, perms).expect("chmod");

        match atomic_write(&target, "new").expect_err("read-only") {
            FilebotError::Io { source, .. } => assert_eq!(source.kind(), ErrorKind::PermissionDenied),
            other => panic!("expected io error, got {other:?}"),
        }
        assert_eq!(std::fs::read_to_string(&target).expect("read"), "keep");
        assert_eq!(std::fs::read_dir(dir.path()).expect("readdir").count(), 1);
    }
}
