// Text-to-speech client trait and types

pub mod openai;

use async_trait::async_trait;
use thiserror::Error;

use crate::voice::Voice;

/// One synthesis request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechRequest {
    /// Text to speak
    pub input: String,
    pub voice: Voice,
    /// How the text should be spoken
    pub instructions: String,
}

#[derive(Debug, Error)]
pub enum TtsError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("API error{}: {message}", status_code.map(|c| format!(" ({})", c)).unwrap_or_default())]
    Api {
        message: String,
        status_code: Option<u16>,
    },

    #[error("Empty audio response")]
    EmptyAudio,
}

/// Turns text into encoded audio bytes (MP3)
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, request: &SpeechRequest) -> Result<Vec<u8>, TtsError>;

    /// Provider name
    fn name(&self) -> &str;
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Synthesizer that records requests and returns canned bytes or an error
    pub struct MockSynthesizer {
        pub requests: Mutex<Vec<SpeechRequest>>,
        fail_with: Option<u16>,
    }

    impl MockSynthesizer {
        pub fn succeeding() -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                fail_with: None,
            }
        }

        pub fn failing(status_code: u16) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                fail_with: Some(status_code),
            }
        }

        pub fn calls(&self) -> Vec<SpeechRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SpeechSynthesizer for MockSynthesizer {
        async fn synthesize(&self, request: &SpeechRequest) -> Result<Vec<u8>, TtsError> {
            self.requests.lock().unwrap().push(request.clone());
            // Give concurrent callers a chance to interleave
            tokio::task::yield_now().await;
            match self.fail_with {
                Some(code) => Err(TtsError::Api {
                    message: "quota exceeded".to_string(),
                    status_code: Some(code),
                }),
                None => Ok(b"ID3fake-mp3".to_vec()),
            }
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    #[test]
    fn test_api_error_display() {
        let err = TtsError::Api {
            message: "Invalid API key".to_string(),
            status_code: Some(401),
        };
        assert_eq!(err.to_string(), "API error (401): Invalid API key");

        let err = TtsError::Api {
            message: "boom".to_string(),
            status_code: None,
        };
        assert_eq!(err.to_string(), "API error: boom");
    }
}
