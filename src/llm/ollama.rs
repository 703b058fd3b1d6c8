//! Blocking Ollama HTTP client used for requirement text normalization.
//!
//! Only the `/api/chat` endpoint is used — it is the most stable across
//! Ollama versions. Calls are deterministic (temperature 0), which matters
//! for a normalizer: the same artifact must repair the same way every run.

use serde::{Deserialize, Serialize};

use super::LlmError;

/// Ollama chat client abstraction (allows mocking for tests).
///
/// `chat` sends one system + one user message and returns the assistant
/// text, which may legitimately be empty ("no changes").
pub trait LlmClient {
    fn chat(&self, model: &str, system: &str, user: &str) -> Result<String, LlmError>;
}

/// Ollama HTTP client for local LLM inference.
pub struct OllamaClient {
    base_url: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OllamaClient {
    /// Create a new OllamaClient pointing at an Ollama instance.
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
        }
    }

    /// Client for the configured Ollama instance with a 10-minute timeout
    /// (normalization calls on CPU-only hosts are slow).
    pub fn from_config() -> Self {
        Self::new(&crate::config::ollama_url(), 600)
    }
}

/// Request body for Ollama /api/chat
#[derive(Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaChatMessage<'a>>,
    stream: bool,
    options: OllamaChatOptions,
}

#[derive(Serialize)]
struct OllamaChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct OllamaChatOptions {
    temperature: f32,
}

/// Response body from Ollama /api/chat
#[derive(Deserialize)]
struct OllamaChatResponse {
    message: Option<OllamaResponseMessage>,
}

#[derive(Deserialize)]
struct OllamaResponseMessage {
    content: Option<String>,
}

impl LlmClient for OllamaClient {
    fn chat(&self, model: &str, system: &str, user: &str) -> Result<String, LlmError> {
        let url = format!("{}/api/chat", self.base_url);
        let body = OllamaChatRequest {
            model,
            messages: vec![
                OllamaChatMessage {
                    role: "system",
                    content: system,
                },
                OllamaChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            stream: false,
            options: OllamaChatOptions { temperature: 0.0 },
        };

        let response = self.client.post(&url).json(&body).send().map_err(|e| {
            if e.is_connect() {
                LlmError::OllamaConnection(self.base_url.clone())
            } else if e.is_timeout() {
                LlmError::HttpClient(format!("Request timed out after {}s", self.timeout_secs))
            } else {
                LlmError::HttpClient(e.to_string())
            }
        })?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Err(LlmError::EndpointNotFound);
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(LlmError::OllamaError {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OllamaChatResponse = response
            .json()
            .map_err(|e| LlmError::ResponseParsing(e.to_string()))?;

        let content = parsed
            .message
            .and_then(|m| m.content)
            .ok_or_else(|| LlmError::ResponseParsing("no message content in response".into()))?;

        // Empty string is a valid answer ("no changes")
        Ok(content.trim().to_string())
    }
}

/// Mock LLM client for testing — returns a configurable response or error.
pub struct MockLlmClient {
    response: Result<String, String>,
}

impl MockLlmClient {
    pub fn new(response: &str) -> Self {
        Self {
            response: Ok(response.to_string()),
        }
    }

    /// Mock that fails every call, as if Ollama were unreachable.
    pub fn failing() -> Self {
        Self {
            response: Err("connection refused".to_string()),
        }
    }

    /// Mock that echoes back a well-formed tagged answer built from the
    /// user content it receives. Handy default for normalizer tests.
    pub fn tagged(title: &str, description: &str) -> Self {
        Self::new(&format!(
            "<TITLE>\n{title}\n</TITLE>\n<DESCRIPTION>\n{description}\n</DESCRIPTION>"
        ))
    }
}

impl LlmClient for MockLlmClient {
    fn chat(&self, _model: &str, _system: &str, _user: &str) -> Result<String, LlmError> {
        match &self.response {
            Ok(text) => Ok(text.clone()),
            Err(reason) => Err(LlmError::OllamaConnection(reason.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_client_returns_configured_response() {
        let client = MockLlmClient::new("test response");
        let result = client.chat("model", "system", "user").unwrap();
        assert_eq!(result, "test response");
    }

    #[test]
    fn mock_client_failing_errors() {
        let client = MockLlmClient::failing();
        assert!(client.chat("model", "system", "user").is_err());
    }

    #[test]
    fn mock_tagged_answer_is_well_formed() {
        let client = MockLlmClient::tagged("Titel", "Beschreibung");
        let out = client.chat("m", "s", "u").unwrap();
        assert!(out.starts_with("<TITLE>"));
        assert!(out.contains("</DESCRIPTION>"));
    }

    #[test]
    fn ollama_client_constructor() {
        let client = OllamaClient::new("http://localhost:11434", 120);
        assert_eq!(client.base_url, "http://localhost:11434");
        assert_eq!(client.timeout_secs, 120);
    }

    #[test]
    fn ollama_client_trims_trailing_slash() {
        let client = OllamaClient::new("http://localhost:11434/", 60);
        assert_eq!(client.base_url, "http://localhost:11434");
    }
}
