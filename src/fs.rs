//! Shared filesystem permission checks.

use camino::Utf8Path;
use color_eyre::eyre::{Context, Result};

#[cfg(unix)]
use nix::unistd::{AccessFlags, access};

/// Ensures the current process may list and enter `path`.
pub(crate) fn ensure_readable_dir(path: &Utf8Path) -> Result<()> {
    #[cfg(unix)]
    {
        check_access(path, AccessFlags::R_OK | AccessFlags::X_OK)
            .with_context(|| format!("directory is not readable: {path}"))
    }

    #[cfg(not(unix))]
    {
        std::fs::read_dir(path)
            .map(drop)
            .with_context(|| format!("directory is not readable: {path}"))
    }
}

/// Ensures the current process may create entries in `path`.
pub(crate) fn ensure_writable_dir(path: &Utf8Path) -> Result<()> {
    #[cfg(unix)]
    {
        check_access(path, AccessFlags::W_OK | AccessFlags::X_OK)
            .with_context(|| format!("directory is not writable: {path}"))
    }

    #[cfg(not(unix))]
    {
        let metadata =
            std::fs::metadata(path).with_context(|| format!("stat {}", path.as_str()))?;
        if metadata.permissions().readonly() {
            return Err(color_eyre::eyre::eyre!("directory is not writable: {path}"));
        }
        Ok(())
    }
}

/// Ensures the current process may read the file at `path`.
pub(crate) fn ensure_readable_file(path: &Utf8Path) -> Result<()> {
    #[cfg(unix)]
    {
        check_access(path, AccessFlags::R_OK)
            .with_context(|| format!("file is not readable: {path}"))
    }

    #[cfg(not(unix))]
    {
        std::fs::File::open(path)
            .map(drop)
            .with_context(|| format!("file is not readable: {path}"))
    }
}

#[cfg(unix)]
fn check_access(path: &Utf8Path, mode: AccessFlags) -> std::io::Result<()> {
    access(path.as_std_path(), mode).map_err(std::io::Error::from)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use nix::unistd::geteuid;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::tempdir;

    #[test]
    fn accepts_accessible_paths() {
        let temp = tempdir().expect("tempdir");
        let dir = Utf8Path::from_path(temp.path()).expect("utf8 path");
        let file = dir.join("asset.png");
        fs::write(&file, "pixels").expect("write file");

        ensure_readable_dir(dir).expect("readable dir");
        ensure_writable_dir(dir).expect("writable dir");
        ensure_readable_file(&file).expect("readable file");
    }

    #[test]
    fn rejects_missing_paths() {
        let temp = tempdir().expect("tempdir");
        let missing = Utf8Path::from_path(temp.path()).expect("utf8 path").join("absent");

        let err = ensure_readable_dir(&missing).expect_err("missing dir");
        assert!(err.to_string().contains("not readable"));
        assert!(ensure_writable_dir(&missing).is_err());
        assert!(ensure_readable_file(&missing).is_err());
    }

    #[test]
    fn rejects_read_only_directory_for_writing() {
        if geteuid().is_root() {
            return;
        }
        let temp = tempdir().expect("tempdir");
        let dir = Utf8Path::from_path(temp.path()).expect("utf8 path").join("locked");
        fs::create_dir(&dir).expect("create dir");
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o555)).expect("chmod");

        let err = ensure_writable_dir(&dir).expect_err("read-only dir");
        assert!(err.to_string().contains("not writable"));

        fs::set_permissions(&dir, fs::Permissions::from_mode(0o755)).expect("restore");
    }
}
