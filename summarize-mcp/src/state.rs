//! Saved voice and tone preferences
//!
//! The preferences live in a small JSON document in the user's home
//! directory. Loading never fails: a missing file, unparsable content or an
//! unknown voice all fall back to the defaults, field by field where
//! possible. Saving failures are logged and otherwise ignored so a
//! preference change still takes effect for the running process.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::voice::Voice;

pub const DEFAULT_TONE: &str =
    "Keep the summary as short and concise as possible. Speak in a clear and informative tone.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preferences {
    pub voice: Voice,
    pub tone: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            voice: Voice::default(),
            tone: DEFAULT_TONE.to_string(),
        }
    }
}

/// On-disk shape; kept loose so each field can be validated on its own
#[derive(Debug, Default, Deserialize)]
struct StoredPreferences {
    #[serde(default)]
    voice: Option<String>,
    #[serde(default)]
    tone: Option<String>,
}

impl From<StoredPreferences> for Preferences {
    fn from(stored: StoredPreferences) -> Self {
        let defaults = Preferences::default();

        let voice = match stored.voice.as_deref().map(str::parse::<Voice>) {
            Some(Ok(voice)) => voice,
            Some(Err(e)) => {
                log::debug!("Ignoring saved voice {:?}: {}", e.0, e);
                defaults.voice
            }
            None => defaults.voice,
        };

        let tone = stored
            .tone
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(defaults.tone);

        Self { voice, tone }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PreferenceError {
    #[error("tone must not be blank")]
    EmptyTone,
}

/// Process-wide preference state backed by a JSON file
#[derive(Debug)]
pub struct PreferenceStore {
    path: PathBuf,
    current: Mutex<Preferences>,
}

impl PreferenceStore {
    /// Create a store holding the defaults; call `load` to read saved values
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            current: Mutex::new(Preferences::default()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of the in-memory preferences
    pub fn current(&self) -> Preferences {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the in-memory state with the saved file, or the defaults if it can't be used
    pub async fn load(&self) {
        let loaded = match read_preferences(&self.path).await {
            Ok(prefs) => {
                log::debug!("Loaded preferences from {}: {:?}", self.path.display(), prefs);
                prefs
            }
            Err(e) => {
                log::debug!("No usable preferences file, using defaults: {:#}", e);
                Preferences::default()
            }
        };
        self.replace(loaded);
    }

    /// Write the in-memory state to disk, logging rather than returning failures
    pub async fn save(&self) {
        let snapshot = self.current();
        match write_preferences(&self.path, &snapshot).await {
            Ok(()) => log::debug!("Saved preferences: {:?}", snapshot),
            Err(e) => log::error!("Failed to save preferences: {:#}", e),
        }
    }

    pub async fn set_voice(&self, voice: Voice) {
        self.update(|prefs| prefs.voice = voice);
        self.save().await;
    }

    pub async fn set_tone(&self, tone: &str) -> Result<(), PreferenceError> {
        if tone.trim().is_empty() {
            return Err(PreferenceError::EmptyTone);
        }
        self.update(|prefs| prefs.tone = tone.to_string());
        self.save().await;
        Ok(())
    }

    fn replace(&self, prefs: Preferences) {
        self.update(|current| *current = prefs);
    }

    fn update(&self, f: impl FnOnce(&mut Preferences)) {
        let mut guard = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard);
    }
}

async fn read_preferences(path: &Path) -> Result<Preferences> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read preferences file: {}", path.display()))?;
    let stored: StoredPreferences = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse preferences file: {}", path.display()))?;
    Ok(stored.into())
}

async fn write_preferences(path: &Path, prefs: &Preferences) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
    }

    let content = serde_json::to_string_pretty(prefs).context("Failed to serialize preferences")?;
    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write preferences file: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> PreferenceStore {
        PreferenceStore::new(dir.path().join("state.json"))
    }

    #[tokio::test]
    async fn test_load_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.load().await;
        assert_eq!(store.current(), Preferences::default());
    }

    #[tokio::test]
    async fn test_set_voice_survives_reload() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.set_voice(Voice::Nova).await;

        let reloaded = store_in(&dir);
        reloaded.load().await;
        assert_eq!(reloaded.current().voice, Voice::Nova);
        assert_eq!(reloaded.current().tone, DEFAULT_TONE);
    }

    #[tokio::test]
    async fn test_set_tone_survives_reload() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.set_tone("Speak quickly").await.unwrap();

        let reloaded = store_in(&dir);
        reloaded.load().await;
        assert_eq!(reloaded.current().tone, "Speak quickly");
    }

    #[tokio::test]
    async fn test_set_tone_rejects_empty() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert!(matches!(
            store.set_tone("   ").await,
            Err(PreferenceError::EmptyTone)
        ));
        assert_eq!(store.current().tone, DEFAULT_TONE);
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_invalid_voice_falls_back_but_keeps_tone() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::write(
            store.path(),
            r#"{"voice": "not-a-voice", "tone": "Whisper"}"#,
        )
        .unwrap();

        store.load().await;
        assert_eq!(store.current().voice, Voice::Coral);
        assert_eq!(store.current().tone, "Whisper");
    }

    #[tokio::test]
    async fn test_corrupt_file_resets_to_defaults() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.set_voice(Voice::Echo).await;

        std::fs::write(store.path(), "{ this is not json").unwrap();
        store.load().await;
        assert_eq!(store.current(), Preferences::default());
    }

    #[tokio::test]
    async fn test_empty_saved_tone_uses_default() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), r#"{"voice": "sage", "tone": ""}"#).unwrap();

        store.load().await;
        assert_eq!(store.current().voice, Voice::Sage);
        assert_eq!(store.current().tone, DEFAULT_TONE);
    }

    #[tokio::test]
    async fn test_save_failure_keeps_in_memory_value() {
        let dir = TempDir::new().unwrap();
        // The state path is a directory, so the write fails
        let store = PreferenceStore::new(dir.path());
        store.set_voice(Voice::Ballad).await;
        assert_eq!(store.current().voice, Voice::Ballad);
    }

    #[tokio::test]
    async fn test_saved_file_format() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.set_voice(Voice::Fable).await;

        let content = std::fs::read_to_string(store.path()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(json["voice"], "fable");
        assert_eq!(json["tone"], DEFAULT_TONE);
    }
}
