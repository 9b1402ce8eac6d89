// Windows audio player driven through PowerShell

use super::{AudioPlayer, spawn_detached};
use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

/// Plays audio through the WPF `MediaPlayer` class from a PowerShell process.
/// `System.Media.SoundPlayer` only handles WAV, and the speech API returns MP3.
pub struct WindowsMediaPlayer;

impl WindowsMediaPlayer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WindowsMediaPlayer {
    fn default() -> Self {
        Self::new()
    }
}

/// PowerShell script that plays `path` and stays alive until playback ends
fn powershell_script(path: &Path) -> String {
    let quoted = path.to_string_lossy().replace('\'', "''");
    format!(
        "Add-Type -AssemblyName presentationCore; \
         $player = New-Object System.Windows.Media.MediaPlayer; \
         $player.Open([Uri]'{quoted}'); \
         $player.Play(); \
         while (-not $player.NaturalDuration.HasTimeSpan) {{ Start-Sleep -Milliseconds 100 }}; \
         Start-Sleep -Seconds ([math]::Ceiling($player.NaturalDuration.TimeSpan.TotalSeconds)); \
         $player.Close()"
    )
}

#[async_trait]
impl AudioPlayer for WindowsMediaPlayer {
    fn name(&self) -> &str {
        "Windows Media Player"
    }

    async fn is_available(&self) -> bool {
        cfg!(windows) && which::which("powershell").is_ok()
    }

    async fn play(&self, path: &Path) -> Result<()> {
        let script = powershell_script(path);
        spawn_detached(
            "powershell",
            ["-NoProfile", "-NonInteractive", "-Command", script.as_str()],
        )
    }
}
