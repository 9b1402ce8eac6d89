// Audio player trait and backend selection

pub mod afplay;
pub mod cli;
pub mod fallback;
pub mod windows;

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// A way of playing an audio file on this machine
#[async_trait]
pub trait AudioPlayer: Send + Sync {
    /// Human-readable name, used in logs
    fn name(&self) -> &str;

    /// Whether this player can be used here. Must not fail: a missing tool or
    /// the wrong platform is simply `false`.
    async fn is_available(&self) -> bool;

    /// Start playing `path` in the background and return without waiting for it to finish
    async fn play(&self, path: &Path) -> Result<()>;
}

/// Every player in priority order: native players first, then command-line
/// tools, then the system default handler.
pub fn default_players() -> Vec<Box<dyn AudioPlayer>> {
    vec![
        Box::new(afplay::AfplayPlayer::new()),
        Box::new(windows::WindowsMediaPlayer::new()),
        Box::new(cli::CommandLinePlayer::new()),
        Box::new(fallback::FallbackPlayer::new()),
    ]
}

/// Probe `candidates` in order and keep the first one that is available
pub async fn select_player(candidates: Vec<Box<dyn AudioPlayer>>) -> Option<Box<dyn AudioPlayer>> {
    for player in candidates {
        if player.is_available().await {
            log::info!("Using audio player: {}", player.name());
            return Some(player);
        }
        log::debug!("Audio player not available: {}", player.name());
    }
    None
}

/// Launch `program` with its output discarded. The child gets its own process
/// group so it keeps playing if the server exits; it is reaped in the background.
pub(crate) fn spawn_detached<I, S>(program: impl AsRef<OsStr>, args: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let program = program.as_ref();
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    #[cfg(unix)]
    cmd.process_group(0);

    #[cfg(windows)]
    {
        const DETACHED_PROCESS: u32 = 0x0000_0008;
        const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
        cmd.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
    }

    let mut child = cmd
        .spawn()
        .with_context(|| format!("Failed to start {}", program.to_string_lossy()))?;

    let label = program.to_string_lossy().into_owned();
    tokio::spawn(async move {
        match child.wait().await {
            Ok(status) if status.success() => log::debug!("{} finished", label),
            Ok(status) => log::debug!("{} exited with {}", label, status),
            Err(e) => log::debug!("Failed to wait for {}: {}", label, e),
        }
    });

    Ok(())
}
