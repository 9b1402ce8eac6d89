//! OpenAI speech API client
//!
//! Calls `POST {base_url}/audio/speech` and returns the MP3 body.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{SpeechRequest, SpeechSynthesizer, TtsError};

pub struct OpenAISpeechClient {
    model: String,
    base_url: String,
    api_key: String,
    client: Client,
}

impl OpenAISpeechClient {
    pub fn new(model: &str, base_url: &str, api_key: String) -> Self {
        Self {
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client: Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/audio/speech", self.base_url)
    }
}

#[derive(Debug, Serialize)]
struct SpeechBody<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
    instructions: &'a str,
    response_format: &'a str,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Pull `error.message` out of an API error body, or fall back to the raw text
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(parsed) => parsed.error.message,
        Err(_) => body.to_string(),
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAISpeechClient {
    async fn synthesize(&self, request: &SpeechRequest) -> Result<Vec<u8>, TtsError> {
        let body = SpeechBody {
            model: &self.model,
            voice: request.voice.as_str(),
            input: &request.input,
            instructions: &request.instructions,
            response_format: "mp3",
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| TtsError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TtsError::Api {
                message: error_message(&error_text),
                status_code: Some(status.as_u16()),
            });
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| TtsError::Request(format!("Failed to read audio: {}", e)))?;

        if audio.is_empty() {
            return Err(TtsError::EmptyAudio);
        }

        Ok(audio.to_vec())
    }

    fn name(&self) -> &str {
        "OpenAI"
    }
}
