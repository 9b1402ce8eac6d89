use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Command isolated from the real home directory, temp dir and credentials
fn summarize_cmd(home: &TempDir) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("summarize-mcp").into();
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env("TMPDIR", home.path())
        .env_remove("OPENAI_API_KEY")
        .env_remove("DEBUG")
        .env_remove("RUST_LOG");
    cmd
}

// ============================================================================
// CLI Help and Version Tests
// ============================================================================

#[test]
fn test_help_displays_usage() {
    let home = TempDir::new().unwrap();
    summarize_cmd(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("speaks text summaries aloud"))
        .stdout(predicate::str::contains("config"))
        .stdout(predicate::str::contains("voices"));
}

#[test]
fn test_version_displays() {
    let home = TempDir::new().unwrap();
    summarize_cmd(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("summarize-mcp"));
}

#[test]
fn test_voices_lists_all_ten() {
    let home = TempDir::new().unwrap();
    let output = summarize_cmd(&home).arg("voices").assert().success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();

    for voice in [
        "alloy", "ash", "ballad", "coral", "echo", "fable", "nova", "onyx", "sage", "shimmer",
    ] {
        assert!(stdout.contains(voice), "missing voice {}", voice);
    }
    assert!(stdout.contains("coral (default)"));
}

// ============================================================================
// Config Command Tests
// ============================================================================

#[test]
fn test_config_show_defaults() {
    let home = TempDir::new().unwrap();
    summarize_cmd(&home)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("model = \"gpt-4o-mini-tts\""))
        .stdout(predicate::str::contains("voice = \"coral\""));
}

#[test]
fn test_config_set_persists() {
    let home = TempDir::new().unwrap();
    summarize_cmd(&home)
        .args(["config", "set", "cleanup_delay_secs", "30"])
        .assert()
        .success();

    let path = home
        .path()
        .join(".config")
        .join("cli-programs")
        .join("summarize-mcp.toml");
    let content = fs::read_to_string(path).unwrap();
    assert!(content.contains("cleanup_delay_secs = 30"));

    summarize_cmd(&home)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cleanup_delay_secs = 30"));
}

#[test]
fn test_config_set_unknown_key_fails() {
    let home = TempDir::new().unwrap();
    summarize_cmd(&home)
        .args(["config", "set", "volume", "11"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown config key"));
}

#[test]
fn test_config_show_reports_saved_voice() {
    let home = TempDir::new().unwrap();
    fs::write(
        home.path().join(".summarize-mcp-state.json"),
        r#"{"voice": "not-a-voice", "tone": "Whisper"}"#,
    )
    .unwrap();

    summarize_cmd(&home)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("voice = \"coral\""))
        .stdout(predicate::str::contains("tone = \"Whisper\""));
}

// ============================================================================
// Server Tests
// ============================================================================

#[test]
fn test_server_requires_api_key() {
    let home = TempDir::new().unwrap();
    summarize_cmd(&home)
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("OPENAI_API_KEY"));
}

#[test]
fn test_server_handshake_and_set_voice() {
    let home = TempDir::new().unwrap();
    let input = [
        r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05","capabilities":{},"clientInfo":{"name":"test-client","version":"1.0.0"}}}"#,
        r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
        r#"{"jsonrpc":"2.0","id":2,"method":"tools/list","params":{}}"#,
        r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"set_voice","arguments":{"voice":"nova"}}}"#,
    ]
    .join("\n");

    summarize_cmd(&home)
        .env("OPENAI_API_KEY", "test-key")
        .write_stdin(input + "\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""protocolVersion":"2024-11-05""#))
        .stdout(predicate::str::contains("play_summary"))
        .stdout(predicate::str::contains("Default voice set to: nova"));

    let state = fs::read_to_string(home.path().join(".summarize-mcp-state.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&state).unwrap();
    assert_eq!(json["voice"], "nova");
    assert!(home.path().join("summarize-mcp").is_dir());
}

#[test]
fn test_server_rejects_blank_summary() {
    let home = TempDir::new().unwrap();
    let input = r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"play_summary","arguments":{"summary":"  "}}}"#;

    summarize_cmd(&home)
        .env("OPENAI_API_KEY", "test-key")
        .write_stdin(format!("{}\n", input))
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""isError":true"#))
        .stdout(predicate::str::contains("summary: must not be blank"));
}

#[test]
fn test_server_sweeps_stale_files_on_startup() {
    let home = TempDir::new().unwrap();
    let scratch = home.path().join("summarize-mcp");
    fs::create_dir_all(&scratch).unwrap();

    let old = scratch.join("speech_1.mp3");
    let fresh = scratch.join("speech_2.mp3");
    fs::write(&old, b"audio").unwrap();
    fs::write(&fresh, b"audio").unwrap();
    let file = fs::File::options().write(true).open(&old).unwrap();
    file.set_modified(std::time::SystemTime::now() - std::time::Duration::from_secs(7200))
        .unwrap();
    drop(file);

    summarize_cmd(&home)
        .env("OPENAI_API_KEY", "test-key")
        .write_stdin("")
        .assert()
        .success();

    assert!(!old.exists());
    assert!(fresh.exists());
}
