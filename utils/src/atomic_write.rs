//! Atomic file write helpers.
//!
//! Uses a temp file + rename pattern so a crash never leaves a half-written
//! token file behind. On platforms where rename-over-existing fails, the old
//! file is moved to `.bak` first and restored if the second rename fails.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

#[cfg(unix)]
const OWNER_ONLY_FILE: u32 = 0o600;
#[cfg(unix)]
const OWNER_ONLY_DIR: u32 = 0o700;

fn parent_of(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Restore `path` from `path.bak` when a previous write was interrupted
/// between the backup rename and the final persist.
pub fn recover_bak_file(path: &Path) {
    let backup = path.with_extension("bak");
    if !path.exists() && backup.exists() {
        match fs::rename(&backup, path) {
            Ok(()) => {
                tracing::warn!(path = %path.display(), "Recovered .bak file from interrupted write");
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "Failed to recover .bak file: {e}");
            }
        }
    }
}

/// Create `dir` and any missing parents as owner-only on Unix. A directory
/// that already exists keeps its permissions.
pub fn ensure_private_dir(dir: &Path) -> io::Result<()> {
    if dir.is_dir() {
        return Ok(());
    }
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(OWNER_ONLY_DIR);
    }
    builder.create(dir)
}

/// Remove a file, treating "already gone" as success.
pub fn remove_if_exists(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Replace `path` with `bytes`, readable by the owner only.
///
/// The data is synced to disk before the rename. If the platform refuses to
/// rename over an existing file, the old file is parked at `.bak` for the
/// duration of the swap and restored on failure.
pub fn atomic_write(path: impl AsRef<Path>, bytes: &[u8]) -> io::Result<()> {
    let path = path.as_ref();

    let mut tmp = NamedTempFile::new_in(parent_of(path))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(tmp.path(), fs::Permissions::from_mode(OWNER_ONLY_FILE))?;
    }
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;

    let Err(first) = tmp.persist(path) else {
        return Ok(());
    };
    if !path.exists() {
        return Err(first.error);
    }

    let backup = path.with_extension("bak");
    let _ = fs::remove_file(&backup);
    fs::rename(path, &backup)?;
    if let Err(retry) = first.file.persist(path) {
        let _ = fs::rename(&backup, path);
        return Err(retry.error);
    }
    if let Err(e) = fs::remove_file(&backup) {
        tracing::warn!(path = %backup.display(), "Failed to remove .bak after swap: {e}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn overwrite_replaces_content_and_leaves_no_backup() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("session.json");

        atomic_write(&path, b"one").expect("write one");
        atomic_write(&path, b"two").expect("write two");

        assert_eq!(fs::read_to_string(&path).expect("read"), "two");
        assert!(!path.with_extension("bak").exists());
    }

    #[cfg(unix)]
    #[test]
    fn written_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("session.json");
        atomic_write(&path, b"secret").expect("write");

        let mode = fs::metadata(&path).expect("metadata").permissions().mode() & 0o777;
        assert_eq!(mode, OWNER_ONLY_FILE);
    }

    #[test]
    fn recover_restores_backup_when_target_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("session.json");
        fs::write(path.with_extension("bak"), b"saved").expect("write bak");

        recover_bak_file(&path);

        assert_eq!(fs::read_to_string(&path).expect("read"), "saved");
    }

    #[test]
    fn remove_if_exists_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("gone.json");
        fs::write(&path, b"x").expect("write");

        assert!(remove_if_exists(&path).expect("first remove"));
        assert!(!remove_if_exists(&path).expect("second remove"));
    }

    #[cfg(unix)]
    #[test]
    fn private_dir_leaves_existing_directories_alone() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let shared = dir.path().join("home");
        fs::create_dir(&shared).expect("mkdir");
        fs::set_permissions(&shared, fs::Permissions::from_mode(0o755)).expect("chmod");

        ensure_private_dir(&shared).expect("existing dir");
        let mode = fs::metadata(&shared).expect("metadata").permissions().mode() & 0o777;
        assert_eq!(mode, 0o755);

        let created = shared.join(".visitdesk").join("state");
        ensure_private_dir(&created).expect("new dir");
        let mode = fs::metadata(&created).expect("metadata").permissions().mode() & 0o777;
        assert_eq!(mode & 0o077, 0);
    }
}
