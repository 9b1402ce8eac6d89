//! Tool handlers: `play_summary`, `set_voice` and `set_tone`
//!
//! Every handler returns a [`ToolResult`]; failures are reported in the
//! result rather than propagated, so the transport always has something to
//! send back.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::player::AudioPlayer;
use crate::scratch::ScratchDir;
use crate::state::{PreferenceError, PreferenceStore};
use crate::tts::{SpeechRequest, SpeechSynthesizer, TtsError};
use crate::voice::Voice;

pub const PLAY_SUMMARY: &str = "play_summary";
pub const SET_VOICE: &str = "set_voice";
pub const SET_TONE: &str = "set_tone";

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("{provider} TTS request failed: {source}")]
    Tts { provider: String, source: TtsError },

    #[error("Failed to write audio file {}: {source}", path.display())]
    WriteAudio {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to start playback with {player}: {message}")]
    Playback { player: String, message: String },
}

impl ToolError {
    /// Short code naming the stage that failed
    pub fn code(&self) -> &'static str {
        match self {
            ToolError::InvalidArguments(_) => "INVALID_ARGUMENTS",
            ToolError::UnknownTool(_) => "UNKNOWN_TOOL",
            ToolError::Tts { .. } => "TTS_ERROR",
            ToolError::WriteAudio { .. } => "FILE_WRITE_ERROR",
            ToolError::Playback { .. } => "PLAYBACK_ERROR",
        }
    }
}

impl From<PreferenceError> for ToolError {
    fn from(e: PreferenceError) -> Self {
        match e {
            PreferenceError::EmptyTone => {
                ToolError::InvalidArguments("tone: must not be blank".to_string())
            }
        }
    }
}

/// Outcome of a tool call: human-readable text plus an error flag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    pub text: String,
    pub is_error: bool,
}

impl ToolResult {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn error(err: &ToolError) -> Self {
        Self {
            text: format!("❌ {} [{}]", err, err.code()),
            is_error: true,
        }
    }
}

impl From<Result<String, ToolError>> for ToolResult {
    fn from(result: Result<String, ToolError>) -> Self {
        match result {
            Ok(text) => ToolResult::success(text),
            Err(e) => ToolResult::error(&e),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaySummaryArgs {
    pub summary: String,
    #[serde(default)]
    pub voice: Option<String>,
    #[serde(default)]
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetVoiceArgs {
    pub voice: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetToneArgs {
    pub tone: String,
}

/// Advertised shape of a tool
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

pub fn tool_definitions() -> Vec<ToolDefinition> {
    let voices: Vec<&str> = Voice::ALL.iter().map(|v| v.as_str()).collect();

    vec![
        ToolDefinition {
            name: PLAY_SUMMARY,
            description: "**IMPORTANT TO KEEP THE SUMMARY AS SHORT AND CONCISE AS POSSIBLE** \
                Convert text summary to speech using OpenAI TTS and play it in the background. \
                Keeps summaries under 100 words unless otherwise requested. \
                Uses the saved voice and tone preferences unless overridden."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "summary": {
                        "type": "string",
                        "minLength": 1,
                        "description": "The text summary to convert to speech and play"
                    },
                    "voice": {
                        "type": "string",
                        "enum": voices,
                        "description": "The voice to use for TTS (optional, uses saved preference if not specified)"
                    },
                    "instructions": {
                        "type": "string",
                        "description": "Instructions for how the text should be spoken (optional, uses saved tone if not specified)"
                    }
                },
                "required": ["summary"]
            }),
        },
        ToolDefinition {
            name: SET_VOICE,
            description: format!(
                "Set the default voice for all future text-to-speech conversions. Choose from: {}.",
                Voice::names()
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "voice": {
                        "type": "string",
                        "enum": voices,
                        "description": "The voice to use for all future TTS requests"
                    }
                },
                "required": ["voice"]
            }),
        },
        ToolDefinition {
            name: SET_TONE,
            description: "Set the default tone/instructions for how text should be spoken in all future TTS requests."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "tone": {
                        "type": "string",
                        "minLength": 1,
                        "description": "The tone/instructions to use for all future TTS requests (e.g., 'Speak slowly and calmly', 'Be enthusiastic and energetic')"
                    }
                },
                "required": ["tone"]
            }),
        },
    ]
}

fn parse_args<T: DeserializeOwned>(arguments: Value) -> Result<T, ToolError> {
    let arguments = if arguments.is_null() {
        Value::Object(Default::default())
    } else {
        arguments
    };
    serde_json::from_value(arguments).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

fn parse_voice(voice: &str) -> Result<Voice, ToolError> {
    voice
        .parse()
        .map_err(|e| ToolError::InvalidArguments(format!("voice: {}", e)))
}

/// Everything a tool call needs, built once at startup
pub struct SpeechTools {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    player: Arc<dyn AudioPlayer>,
    scratch: ScratchDir,
    preferences: PreferenceStore,
    cleanup_delay: Duration,
}

impl SpeechTools {
    pub fn new(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        player: Arc<dyn AudioPlayer>,
        scratch: ScratchDir,
        preferences: PreferenceStore,
        cleanup_delay: Duration,
    ) -> Self {
        Self {
            synthesizer,
            player,
            scratch,
            preferences,
            cleanup_delay,
        }
    }

    pub fn preferences(&self) -> &PreferenceStore {
        &self.preferences
    }

    pub fn player_name(&self) -> &str {
        self.player.name()
    }

    /// Dispatch a call by tool name with raw JSON arguments
    pub async fn call(&self, name: &str, arguments: Value) -> ToolResult {
        let result = match name {
            PLAY_SUMMARY => match parse_args(arguments) {
                Ok(args) => self.try_play_summary(args).await,
                Err(e) => Err(e),
            },
            SET_VOICE => match parse_args(arguments) {
                Ok(args) => self.try_set_voice(args).await,
                Err(e) => Err(e),
            },
            SET_TONE => match parse_args(arguments) {
                Ok(args) => self.try_set_tone(args).await,
                Err(e) => Err(e),
            },
            other => Err(ToolError::UnknownTool(other.to_string())),
        };

        if let Err(e) = &result {
            log::error!("Error in {}: {}", name, e);
        }
        result.into()
    }

    pub async fn play_summary(&self, args: PlaySummaryArgs) -> ToolResult {
        self.try_play_summary(args).await.into()
    }

    pub async fn set_voice(&self, args: SetVoiceArgs) -> ToolResult {
        self.try_set_voice(args).await.into()
    }

    pub async fn set_tone(&self, args: SetToneArgs) -> ToolResult {
        self.try_set_tone(args).await.into()
    }

    async fn try_play_summary(&self, args: PlaySummaryArgs) -> Result<String, ToolError> {
        if args.summary.trim().is_empty() {
            return Err(ToolError::InvalidArguments(
                "summary: must not be blank".to_string(),
            ));
        }
        let voice_override = args.voice.as_deref().map(parse_voice).transpose()?;

        // Overrides apply to this call only and are never saved
        let saved = self.preferences.current();
        let request = SpeechRequest {
            voice: voice_override.unwrap_or(saved.voice),
            instructions: args
                .instructions
                .filter(|i| !i.trim().is_empty())
                .unwrap_or(saved.tone),
            input: args.summary,
        };
        let length = request.input.chars().count();

        log::info!(
            "Generating TTS for summary ({} chars) with voice: {} via {}",
            length,
            request.voice,
            self.synthesizer.name()
        );

        let audio = self
            .synthesizer
            .synthesize(&request)
            .await
            .map_err(|source| ToolError::Tts {
                provider: self.synthesizer.name().to_string(),
                source,
            })?;

        let path = self.scratch.allocate_path();
        tokio::fs::write(&path, &audio)
            .await
            .map_err(|source| ToolError::WriteAudio {
                path: path.clone(),
                source,
            })?;
        log::info!("Audio file created: {}", path.display());

        if let Err(e) = self.player.play(&path).await {
            let _ = tokio::fs::remove_file(&path).await;
            return Err(ToolError::Playback {
                player: self.player.name().to_string(),
                message: format!("{:#}", e),
            });
        }
        log::debug!("Audio playback started with {}", self.player.name());

        self.scratch.schedule_cleanup(path, self.cleanup_delay);

        Ok(format!(
            "✅ Summary converted to speech and playing in the background\nVoice: {}\nLength: {} characters",
            request.voice, length
        ))
    }

    async fn try_set_voice(&self, args: SetVoiceArgs) -> Result<String, ToolError> {
        let voice = parse_voice(&args.voice)?;
        self.preferences.set_voice(voice).await;
        log::info!("Default voice changed to: {}", voice);

        Ok(format!(
            "✅ Default voice set to: {}\n\nAll future audio summaries will use this voice unless specifically overridden.",
            voice
        ))
    }

    async fn try_set_tone(&self, args: SetToneArgs) -> Result<String, ToolError> {
        self.preferences.set_tone(&args.tone).await?;
        log::info!("Default tone changed");

        Ok(format!(
            "✅ Default tone set to: \"{}\"\n\nAll future audio summaries will use this tone unless specifically overridden.",
            args.tone
        ))
    }
}
