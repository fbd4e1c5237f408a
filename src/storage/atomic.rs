//! Atomic file replacement.
//!
//! Content is written to a temp file in the target's own directory and then
//! renamed over the target, so readers only ever see the old file or the new
//! one. Same-directory placement keeps both on one filesystem, which is what
//! makes the rename atomic.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::{NamedTempFile, PersistError};

use crate::error::{AppError, Result};

/// Prefix for temp files created next to the target.
const TEMP_PREFIX: &str = "sess_";

/// Serializes `value` as pretty JSON and atomically replaces `path` with it.
///
/// Refuses to write anywhere at or below `web_root`.
pub fn write_atomic<T: Serialize>(path: &Path, value: &T, web_root: &Path) -> Result<()> {
    let content = sonic_rs::to_vec_pretty(value)
        .map_err(|e| AppError::Internal(format!("Session serialization failed: {}", e)))?;

    write_bytes_atomic(path, &content, web_root, |file, target| {
        file.persist(target).map(|_| ())
    })
}

/// Core of [`write_atomic`] with the final rename injected.
pub(crate) fn write_bytes_atomic<F>(
    path: &Path,
    content: &[u8],
    web_root: &Path,
    rename: F,
) -> Result<()>
where
    F: FnOnce(NamedTempFile, &Path) -> std::result::Result<(), PersistError>,
{
    let dir = parent_dir(path);

    if !dir.is_dir() {
        return Err(AppError::Storage(format!(
            "Directory does not exist: {}",
            dir.display()
        )));
    }

    ensure_outside_web_root(&dir, web_root)?;

    let mut temp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .tempfile_in(&dir)
        .map_err(|e| match e.kind() {
            io::ErrorKind::PermissionDenied => {
                AppError::Storage(format!("Directory not writable: {}", dir.display()))
            }
            _ => AppError::Storage(format!(
                "Cannot create temp file in {}: {}",
                dir.display(),
                e
            )),
        })?;

    // On every early return below, dropping `temp` deletes it.
    temp.write_all(content)
        .and_then(|_| temp.as_file().sync_all())
        .map_err(|e| AppError::Storage(format!("Failed to write temp session file: {}", e)))?;

    restrict_permissions(&temp);

    rename(temp, path).map_err(|err| {
        let PersistError { error, file } = err;
        if let Err(e) = file.close() {
            tracing::warn!("⚠️ Could not remove temp session file: {}", e);
        }
        AppError::Storage(format!(
            "Failed to rename temp session file to {}: {}",
            path.display(),
            error
        ))
    })?;

    tracing::debug!("💾 Atomically wrote {}", path.display());
    Ok(())
}

/// The directory a file lives in; `.` for bare file names.
pub fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Fails if `dir` resolves to `web_root` or anything beneath it.
///
/// A web root that does not exist cannot serve anything, so it is not checked.
pub fn ensure_outside_web_root(dir: &Path, web_root: &Path) -> Result<()> {
    let (Ok(real_dir), Ok(real_root)) = (dir.canonicalize(), web_root.canonicalize()) else {
        return Ok(());
    };

    if real_dir.starts_with(&real_root) {
        return Err(AppError::Storage(
            "Refusing to write session file inside webroot. Use storage path outside webroot."
                .to_string(),
        ));
    }

    Ok(())
}

#[cfg(unix)]
fn restrict_permissions(temp: &NamedTempFile) {
    use std::os::unix::fs::PermissionsExt;

    if let Err(e) = temp
        .as_file()
        .set_permissions(std::fs::Permissions::from_mode(0o640))
    {
        tracing::warn!("⚠️ Could not chmod temp session file: {}", e);
    }
}

#[cfg(not(unix))]
fn restrict_permissions(_temp: &NamedTempFile) {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[derive(Serialize)]
    struct Payload {
        token: &'static str,
    }

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn writes_and_replaces_whole_file() {
        let storage = TempDir::new().unwrap();
        let web_root = TempDir::new().unwrap();
        let target = storage.path().join("session.json");

        write_atomic(&target, &Payload { token: "first" }, web_root.path()).unwrap();
        write_atomic(&target, &Payload { token: "second" }, web_root.path()).unwrap();

        let json: serde_json::Value =
            serde_json::from_slice(&fs::read(&target).unwrap()).unwrap();
        assert_eq!(json["token"], "second");
        assert_eq!(entries(storage.path()), vec!["session.json"]);
    }

    #[cfg(unix)]
    #[test]
    fn written_file_is_not_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let storage = TempDir::new().unwrap();
        let target = storage.path().join("session.json");
        write_atomic(&target, &Payload { token: "t" }, Path::new("/nonexistent-web-root")).unwrap();

        let mode = fs::metadata(&target).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
    }

    #[test]
    fn failed_rename_leaves_original_untouched() {
        let storage = TempDir::new().unwrap();
        let web_root = TempDir::new().unwrap();
        let target = storage.path().join("session.json");
        fs::write(&target, b"{\"jwtToken\":\"old\"}").unwrap();
        let before = fs::read(&target).unwrap();

        let result = write_bytes_atomic(&target, b"{\"jwtToken\":\"new\"}", web_root.path(), |file, _| {
            Err(PersistError {
                error: io::Error::other("simulated rename failure"),
                file,
            })
        });

        match result {
            Err(AppError::Storage(msg)) => assert!(msg.contains("Failed to rename")),
            other => panic!("expected storage error, got {:?}", other),
        }
        assert_eq!(fs::read(&target).unwrap(), before);
        assert_eq!(entries(storage.path()), vec!["session.json"]);
    }

    #[cfg(unix)]
    #[test]
    fn read_only_directory_is_reported_as_not_writable() {
        use std::os::unix::fs::PermissionsExt;

        let storage = TempDir::new().unwrap();
        let locked = storage.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o500)).unwrap();

        // Root ignores directory permissions.
        if fs::write(locked.join("canary"), b"").is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o700)).unwrap();
            return;
        }

        let target = locked.join("session.json");
        let result = write_atomic(&target, &Payload { token: "t" }, Path::new("/nonexistent-web-root"));

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o700)).unwrap();
        assert!(matches!(result, Err(AppError::Storage(msg)) if msg.starts_with("Directory not writable")));
        assert!(!target.exists());
    }

    #[test]
    fn missing_directory_is_a_storage_error() {
        let storage = TempDir::new().unwrap();
        let target = storage.path().join("missing").join("session.json");

        let result = write_atomic(&target, &Payload { token: "t" }, Path::new("/nonexistent-web-root"));
        assert!(matches!(result, Err(AppError::Storage(msg)) if msg.starts_with("Directory does not exist")));
    }

    #[test]
    fn refuses_to_write_inside_web_root() {
        let web_root = TempDir::new().unwrap();
        let nested = web_root.path().join("assets");
        fs::create_dir(&nested).unwrap();

        for target in [web_root.path().join("session.json"), nested.join("session.json")] {
            let result = write_atomic(&target, &Payload { token: "t" }, web_root.path());
            assert!(matches!(result, Err(AppError::Storage(msg)) if msg.contains("inside webroot")));
            assert!(!target.exists());
        }
    }

    #[test]
    fn relative_paths_into_web_root_are_caught() {
        let web_root = TempDir::new().unwrap();
        let sneaky = web_root.path().join("assets").join("..").join("session.json");
        fs::create_dir(web_root.path().join("assets")).unwrap();

        let result = write_atomic(&sneaky, &Payload { token: "t" }, web_root.path());
        assert!(matches!(result, Err(AppError::Storage(_))));
    }

    #[test]
    fn sibling_with_shared_prefix_is_allowed() {
        let base = TempDir::new().unwrap();
        let web_root = base.path().join("public");
        let storage = base.path().join("public_storage");
        fs::create_dir(&web_root).unwrap();
        fs::create_dir(&storage).unwrap();

        write_atomic(&storage.join("session.json"), &Payload { token: "t" }, &web_root).unwrap();
    }

    #[test]
    fn bare_file_name_lives_in_current_dir() {
        assert_eq!(parent_dir(Path::new("session.json")), PathBuf::from("."));
        assert_eq!(parent_dir(Path::new("a/session.json")), PathBuf::from("a"));
    }
}
