//! Atomic file mutation.
//!
//! Every write goes to a `NamedTempFile` in the destination directory and is
//! then persisted over the final path. If anything fails before the persist,
//! dropping the temp file discards it and the destination is left untouched.

use crate::domain::errors::{GraftError, Result};
use std::io::Write;
use std::path::Path;
use tempfile::{Builder, NamedTempFile};
use tracing::debug;

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

/// Stages `contents` next to `path`. A `fresh` file is opened with mode 0666
/// so that the umask decides its final permissions, as for any new file.
fn stage(path: &Path, contents: &[u8], fresh: bool) -> Result<NamedTempFile> {
    let mut builder = Builder::new();
    #[cfg(unix)]
    if fresh {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    #[cfg(not(unix))]
    let _ = fresh;
    let mut tmp = builder
        .tempfile_in(parent_dir(path))
        .map_err(|e| GraftError::write(path, e))?;
    tmp.write_all(contents)
        .map_err(|e| GraftError::write(path, e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| GraftError::write(path, e))?;
    debug!(target = %path.display(), staged = %tmp.path().display(), "staged write");
    Ok(tmp)
}

/// Replaces `path` (which may or may not exist) with `contents`.
///
/// An existing file keeps its permissions.
pub fn replace_file(path: &Path, contents: &[u8]) -> Result<()> {
    let existing = std::fs::metadata(path).ok();
    let tmp = stage(path, contents, existing.is_none())?;
    if let Some(meta) = existing {
        std::fs::set_permissions(tmp.path(), meta.permissions())
            .map_err(|e| GraftError::write(path, e))?;
    }
    tmp.persist(path)
        .map_err(|e| GraftError::write(path, e.error))?;
    Ok(())
}

/// Creates `path` with `contents`, failing with `AlreadyExists` if something
/// is already there. Missing parent directories are created.
pub fn create_file(path: &Path, contents: &[u8]) -> Result<()> {
    std::fs::create_dir_all(parent_dir(path)).map_err(|e| GraftError::write(path, e))?;
    let tmp = stage(path, contents, true)?;
    tmp.persist_noclobber(path)
        .map_err(|e| GraftError::write(path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn replace_file_overwrites_and_leaves_no_temp_files() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("mod.py");
        std::fs::write(&path, "old\n").unwrap();

        replace_file(&path, b"new\n").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new\n");
        let entries: Vec<_> = std::fs::read_dir(tmp.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn replace_file_keeps_existing_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("tool.py");
        std::fs::write(&path, "x = 1\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();

        replace_file(&path, b"x = 2\n").unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[test]
    fn failed_replace_leaves_destination_and_no_temp_files() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("pkg");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("__init__.py"), "x = 1\n").unwrap();

        let err = replace_file(&target, b"clobbered\n").unwrap_err();

        assert!(matches!(err, GraftError::Write { .. }));
        assert!(target.is_dir());
        assert_eq!(
            std::fs::read_to_string(target.join("__init__.py")).unwrap(),
            "x = 1\n"
        );
        let entries: Vec<_> = std::fs::read_dir(tmp.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn new_files_follow_the_umask() {
        use std::os::unix::fs::PermissionsExt;
        let tmp = TempDir::new().unwrap();
        let reference = tmp.path().join("plain.py");
        std::fs::write(&reference, "").unwrap();
        let expected = std::fs::metadata(&reference).unwrap().permissions().mode() & 0o777;

        create_file(&tmp.path().join("created.py"), b"").unwrap();
        replace_file(&tmp.path().join("replaced.py"), b"").unwrap();

        for name in ["created.py", "replaced.py"] {
            let mode = std::fs::metadata(tmp.path().join(name))
                .unwrap()
                .permissions()
                .mode();
            assert_eq!(mode & 0o777, expected, "{name}");
        }
    }

    #[test]
    fn create_file_refuses_to_clobber() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("report.py");
        std::fs::write(&path, "keep me\n").unwrap();

        let err = create_file(&path, b"replacement\n").unwrap_err();
        match err {
            GraftError::Write { source, .. } => {
                assert_eq!(source.kind(), std::io::ErrorKind::AlreadyExists)
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "keep me\n");
    }

    #[test]
    fn create_file_makes_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("telemetry/report.py");

        create_file(&path, b"x = 1\n").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "x = 1\n");
    }
}
