//! Download directory management.
//!
//! The browser writes every download into one directory. It is reset before
//! each run so a stale invoice from a previous run can never satisfy the
//! invoice check.

use crate::result::{FlowError, FlowResult};
use crate::wait::{not_found, wait_for, WaitOptions};
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

/// Reset `dir` to an empty directory.
///
/// Removes it recursively when present, then recreates it. Calling this on a
/// missing directory just creates it.
pub fn clear_downloads(dir: impl AsRef<Path>) -> FlowResult<()> {
    let dir = dir.as_ref();
    match std::fs::remove_dir_all(dir) {
        Ok(()) => tracing::debug!(dir = %dir.display(), "removed downloads directory"),
        Err(e) if e.kind() == IoErrorKind::NotFound => {}
        Err(e) => return Err(FlowError::environment(dir, format!("cannot remove: {e}"))),
    }
    std::fs::create_dir_all(dir)
        .map_err(|e| FlowError::environment(dir, format!("cannot create: {e}")))?;
    tracing::info!(dir = %dir.display(), "downloads directory reset");
    Ok(())
}

/// Wait for `name` to appear under `dir` and return its content.
///
/// An empty file counts as not yet written (the browser creates the file
/// before streaming into it). Running out of time is [`FlowError::NotFound`].
pub async fn read_download(
    dir: impl AsRef<Path>,
    name: &str,
    options: &WaitOptions,
) -> FlowResult<String> {
    let path: PathBuf = dir.as_ref().join(name);
    let probe_path = &path;
    let result = wait_for(
        format!("download {}", path.display()),
        options,
        || async move {
            match tokio::fs::read_to_string(probe_path).await {
                Ok(content) if content.is_empty() => Ok(None),
                Ok(content) => Ok(Some(content)),
                Err(e) if e.kind() == IoErrorKind::NotFound => Ok(None),
                Err(e) => Err(FlowError::environment(probe_path, format!("cannot read: {e}"))),
            }
        },
    )
    .await
    .map_err(not_found)?;
    tracing::debug!(path = %path.display(), elapsed = ?result.elapsed, "download ready");
    Ok(result.value)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod clear_tests {
        use super::*;

        #[test]
        fn test_creates_missing_directory() {
            let root = tempfile::tempdir().unwrap();
            let dir = root.path().join("downloads");
            clear_downloads(&dir).unwrap();
            assert!(dir.is_dir());
        }

        #[test]
        fn test_removes_existing_content() {
            let root = tempfile::tempdir().unwrap();
            let dir = root.path().join("downloads");
            std::fs::create_dir_all(dir.join("nested")).unwrap();
            std::fs::write(dir.join("invoice.txt"), "stale").unwrap();
            std::fs::write(dir.join("nested").join("x.bin"), [1, 2, 3]).unwrap();

            clear_downloads(&dir).unwrap();
            assert!(dir.is_dir());
            assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);
        }

        #[test]
        fn test_path_through_file_is_environment_error() {
            let root = tempfile::tempdir().unwrap();
            let file = root.path().join("plain");
            std::fs::write(&file, "not a directory").unwrap();
            let err = clear_downloads(file.join("downloads")).unwrap_err();
            assert_eq!(err.kind(), crate::ErrorKind::Environment);
        }
    }

    mod read_tests {
        use super::*;

        fn fast() -> WaitOptions {
            WaitOptions::new().with_timeout(100).with_poll_interval(10)
        }

        #[tokio::test]
        async fn test_reads_existing_file() {
            let dir = tempfile::tempdir().unwrap();
            std::fs::write(dir.path().join("invoice.txt"), "Hi there").unwrap();
            let content = read_download(dir.path(), "invoice.txt", &fast()).await.unwrap();
            assert_eq!(content, "Hi there");
        }

        #[tokio::test]
        async fn test_missing_file_is_not_found() {
            let dir = tempfile::tempdir().unwrap();
            let err = read_download(dir.path(), "invoice.txt", &fast())
                .await
                .unwrap_err();
            assert_eq!(err.kind(), crate::ErrorKind::NotFound);
        }

        #[tokio::test]
        async fn test_waits_for_late_file() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("invoice.txt");
            let writer = tokio::spawn(async move {
                tokio::time::sleep(std::time::Duration::from_millis(30)).await;
                tokio::fs::write(path, "late invoice").await.unwrap();
            });
            let options = WaitOptions::new().with_timeout(2_000).with_poll_interval(10);
            let content = read_download(dir.path(), "invoice.txt", &options)
                .await
                .unwrap();
            writer.await.unwrap();
            assert_eq!(content, "late invoice");
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(16))]

            #[test]
            fn prop_clear_is_idempotent(files in prop::collection::vec("[a-z]{1,8}", 0..5), repeats in 1usize..4) {
                let root = tempfile::tempdir().unwrap();
                let dir = root.path().join("downloads");
                std::fs::create_dir_all(&dir).unwrap();
                for name in &files {
                    std::fs::write(dir.join(name), name.as_bytes()).unwrap();
                }
                for _ in 0..repeats {
                    prop_assert!(clear_downloads(&dir).is_ok());
                }
                prop_assert!(dir.is_dir());
                prop_assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);
            }
        }
    }
}
