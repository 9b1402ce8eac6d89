// Command-line audio players found on PATH

use super::{AudioPlayer, spawn_detached};
use anyhow::{Result, bail};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Tools to look for, in order of preference
pub const DEFAULT_TOOLS: &[&str] = &["mpg123", "play", "aplay", "ffplay", "cvlc"];

#[derive(Debug, Clone)]
struct DetectedTool {
    command: String,
    path: PathBuf,
    label: String,
}

/// Uses the first of several command-line players found on the search path
pub struct CommandLinePlayer {
    tools: Vec<String>,
    /// Search path override; `None` means the process PATH
    search_path: Option<OsString>,
    detected: OnceLock<Option<DetectedTool>>,
}

impl CommandLinePlayer {
    pub fn new() -> Self {
        Self::with_tools(DEFAULT_TOOLS.iter().map(|t| t.to_string()).collect())
    }

    pub fn with_tools(tools: Vec<String>) -> Self {
        Self {
            tools,
            search_path: None,
            detected: OnceLock::new(),
        }
    }

    /// Look for tools in `search_path` instead of PATH
    pub fn with_search_path(mut self, search_path: impl Into<OsString>) -> Self {
        self.search_path = Some(search_path.into());
        self
    }

    /// First configured tool found on the search path. The lookup blocks on
    /// filesystem probes, so it runs once (at player selection) and is cached.
    fn detect(&self) -> Option<&DetectedTool> {
        self.detected
            .get_or_init(|| {
                self.tools.iter().find_map(|tool| {
                    let found = match &self.search_path {
                        Some(paths) => which::which_in(tool, Some(paths), "."),
                        None => which::which(tool),
                    };
                    found.ok().map(|path| {
                        log::debug!("Found command-line audio player: {}", path.display());
                        DetectedTool {
                            command: tool.clone(),
                            path,
                            label: format!("{} (command line)", tool),
                        }
                    })
                })
            })
            .as_ref()
    }
}

impl Default for CommandLinePlayer {
    fn default() -> Self {
        Self::new()
    }
}

/// Arguments for `command` to play `file` once and exit without a window
fn player_args(command: &str, file: &Path) -> Vec<OsString> {
    let leading: &[&str] = match command {
        "cvlc" => &["--play-and-exit", "--intf", "dummy"],
        "ffplay" => &["-nodisp", "-autoexit"],
        _ => &[],
    };
    leading
        .iter()
        .map(OsString::from)
        .chain(std::iter::once(file.as_os_str().to_os_string()))
        .collect()
}

#[async_trait]
impl AudioPlayer for CommandLinePlayer {
    fn name(&self) -> &str {
        self.detected
            .get()
            .and_then(Option::as_ref)
            .map(|tool| tool.label.as_str())
            .unwrap_or("command-line player")
    }

    async fn is_available(&self) -> bool {
        self.detect().is_some()
    }

    async fn play(&self, path: &Path) -> Result<()> {
        let Some(tool) = self.detect() else {
            bail!("No command-line audio player available");
        };
        spawn_detached(&tool.path, player_args(&tool.command, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[cfg(unix)]
    fn fake_tool(dir: &Path, name: &str) {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        std::fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    fn test_args_for_cvlc() {
        let args = player_args("cvlc", Path::new("/tmp/a.mp3"));
        assert_eq!(
            args,
            vec!["--play-and-exit", "--intf", "dummy", "/tmp/a.mp3"]
        );
    }

    #[test]
    fn test_args_for_ffplay() {
        let args = player_args("ffplay", Path::new("/tmp/a.mp3"));
        assert_eq!(args, vec!["-nodisp", "-autoexit", "/tmp/a.mp3"]);
    }

    #[test]
    fn test_args_default_to_file_only() {
        let args = player_args("mpg123", Path::new("/tmp/a.mp3"));
        assert_eq!(args, vec!["/tmp/a.mp3"]);
    }

    #[tokio::test]
    async fn test_unavailable_with_empty_search_path() {
        let dir = TempDir::new().unwrap();
        let player = CommandLinePlayer::new().with_search_path(dir.path());
        assert!(!player.is_available().await);
        assert_eq!(player.name(), "command-line player");
        assert!(player.play(Path::new("/tmp/a.mp3")).await.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_detects_first_preferred_tool() {
        let dir = TempDir::new().unwrap();
        fake_tool(dir.path(), "ffplay");
        fake_tool(dir.path(), "aplay");

        let player = CommandLinePlayer::new().with_search_path(dir.path());
        assert!(player.is_available().await);
        assert_eq!(player.name(), "aplay (command line)");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_detection_is_cached() {
        let dir = TempDir::new().unwrap();
        fake_tool(dir.path(), "mpg123");

        let player = CommandLinePlayer::new().with_search_path(dir.path());
        assert!(player.is_available().await);
        std::fs::remove_file(dir.path().join("mpg123")).unwrap();
        assert!(player.is_available().await);
        assert_eq!(player.name(), "mpg123 (command line)");
    }
}
