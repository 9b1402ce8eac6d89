// Last-resort player: hand the file to the system's default application

use super::{AudioPlayer, spawn_detached};
use anyhow::Result;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;

pub struct FallbackPlayer;

impl FallbackPlayer {
    pub const NAME: &'static str = "Fallback (open with default app)";

    pub fn new() -> Self {
        Self
    }
}

impl Default for FallbackPlayer {
    fn default() -> Self {
        Self::new()
    }
}

/// Opener command and arguments for the current platform
fn open_command(path: &Path) -> (&'static str, Vec<OsString>) {
    if cfg!(target_os = "macos") {
        ("open", vec![path.into()])
    } else if cfg!(windows) {
        // `start` is a cmd builtin; the empty string is the window title
        (
            "cmd",
            vec!["/C".into(), "start".into(), "".into(), path.into()],
        )
    } else {
        ("xdg-open", vec![path.into()])
    }
}

#[async_trait]
impl AudioPlayer for FallbackPlayer {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn play(&self, path: &Path) -> Result<()> {
        let (program, args) = open_command(path);
        spawn_detached(program, args)
    }
}
