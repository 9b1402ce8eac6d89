// Scratch directory for generated speech files

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, SystemTime};
use tokio::task::JoinHandle;

const FILE_PREFIX: &str = "speech_";
const FILE_EXTENSION: &str = "mp3";

/// Owns the directory that generated audio is written to
#[derive(Debug)]
pub struct ScratchDir {
    dir: PathBuf,
    /// Last timestamp handed out, so two calls in the same millisecond still differ
    last_stamp: AtomicI64,
}

impl ScratchDir {
    /// Create the directory (and parents) if needed
    pub async fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create temporary directory: {}", dir.display()))?;

        Ok(Self {
            dir,
            last_stamp: AtomicI64::new(0),
        })
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// A fresh `speech_<millis>.mp3` path; the stamp only ever moves forward
    pub fn allocate_path(&self) -> PathBuf {
        let now = chrono::Utc::now().timestamp_millis();
        let previous = self
            .last_stamp
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        let stamp = now.max(previous + 1);

        self.dir
            .join(format!("{}{}.{}", FILE_PREFIX, stamp, FILE_EXTENSION))
    }

    /// Delete `path` after `delay`. The file may still be open by the player, so
    /// failure is only logged.
    pub fn schedule_cleanup(&self, path: PathBuf, delay: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match tokio::fs::remove_file(&path).await {
                Ok(()) => log::debug!("Cleaned up audio file: {}", path.display()),
                Err(e) => log::debug!(
                    "Could not clean up {} (might still be playing): {}",
                    path.display(),
                    e
                ),
            }
        })
    }

    /// Remove speech files left behind by earlier runs. Returns how many were deleted.
    pub async fn sweep_stale(&self, max_age: Duration) -> usize {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) => {
                log::debug!("Cleanup error (non-critical): {}", e);
                return 0;
            }
        };

        let now = SystemTime::now();
        let mut removed = 0;

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    log::debug!("Cleanup error (non-critical): {}", e);
                    break;
                }
            };

            let path = entry.path();
            if !is_speech_file(&path) {
                continue;
            }

            let age = match entry.metadata().await.and_then(|m| m.modified()) {
                Ok(modified) => now.duration_since(modified).unwrap_or_default(),
                Err(_) => continue,
            };

            if age > max_age && tokio::fs::remove_file(&path).await.is_ok() {
                log::debug!("Cleaned up old file: {}", path.display());
                removed += 1;
            }
        }

        removed
    }
}

fn is_speech_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.starts_with(FILE_PREFIX) && path.extension().is_some_and(|ext| ext == FILE_EXTENSION)
}
