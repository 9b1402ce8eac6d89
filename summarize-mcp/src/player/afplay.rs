// macOS afplay audio player

use super::{AudioPlayer, spawn_detached};
use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

/// Plays audio with the `afplay` command that ships with macOS
pub struct AfplayPlayer;

impl AfplayPlayer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AfplayPlayer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioPlayer for AfplayPlayer {
    fn name(&self) -> &str {
        "afplay (macOS)"
    }

    async fn is_available(&self) -> bool {
        cfg!(target_os = "macos") && which::which("afplay").is_ok()
    }

    async fn play(&self, path: &Path) -> Result<()> {
        spawn_detached("afplay", [path])
    }
}
