//! Chat-completion client for OpenAI-compatible endpoints
//!
//! Synchronous by design: the chat loop waits on each reply, and the
//! summarizer runs inside an append. Uses `reqwest::blocking`.

use std::time::Duration;

use reqwest::blocking::{Client, Response};

use super::error::{ProviderError, Result};
use super::types::{ApiErrorResponse, ChatRequest, ChatResponse};
use super::CompletionBackend;
use crate::config::ChatConfig;

/// User agent for API requests
const USER_AGENT: &str = concat!("parley/", env!("CARGO_PKG_VERSION"));

/// Client for a `POST {base_url}/chat/completions` endpoint
pub struct ChatClient {
    /// HTTP client with configured timeout and headers
    http_client: Client,
    /// Base API URL, without trailing slash
    base_url: String,
    api_key: String,
}

impl ChatClient {
    /// Create a client from chat settings, reading the key from the environment
    pub fn from_config(config: &ChatConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ProviderError::MissingApiKey(config.api_key_env.clone()))?;

        Self::new(
            &config.base_url,
            api_key,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn new(base_url: &str, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(ProviderError::HttpError)?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// Get the configured base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a chat-completion request
    ///
    /// Endpoint: POST /chat/completions
    pub fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let url = format!("{}/chat/completions", self.base_url);
        log::debug!(
            "POST {} model={} messages={}",
            url,
            request.model,
            request.messages.len()
        );

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()?;

        let parsed: ChatResponse = self.handle_response(response)?;
        if parsed.choices.is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(parsed)
    }

    /// Map HTTP status codes to typed errors and parse successful bodies
    fn handle_response(&self, response: Response) -> Result<ChatResponse> {
        let status = response.status();

        if status.is_success() {
            response
                .json::<ChatResponse>()
                .map_err(|e| ProviderError::ParseError(e.to_string()))
        } else {
            let status_code = status.as_u16();
            let error_body = response.text().unwrap_or_default();
            let error_message = serde_json::from_str::<ApiErrorResponse>(&error_body)
                .map(|e| e.get_message())
                .unwrap_or_else(|_| error_body.clone());

            match status_code {
                401 | 403 => Err(ProviderError::Unauthorized(error_message)),
                429 => Err(ProviderError::RateLimited),
                500..=599 => Err(ProviderError::ServerError {
                    status: status_code,
                    message: error_message,
                }),
                _ => Err(ProviderError::ApiError {
                    status: status_code,
                    message: error_message,
                }),
            }
        }
    }
}

impl CompletionBackend for ChatClient {
    fn complete(&self, request: &ChatRequest) -> Result<ChatResponse> {
        self.chat(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::message::{ApiMessage, Role};
    use mockito::Matcher;

    fn client_for(server: &mockito::Server) -> ChatClient {
        ChatClient::new(&server.url(), "test-key", Duration::from_secs(5)).unwrap()
    }

    fn request() -> ChatRequest {
        ChatRequest::new("sonar-pro", vec![ApiMessage::new(Role::User, "ping")])
            .temperature(Some(0.7))
    }

    #[test]
    fn test_base_url_is_normalized() {
        let client = ChatClient::new("https://api.example.com/", "k", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "https://api.example.com");
    }

    #[test]
    fn test_chat_success() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "sonar-pro",
                "messages": [{"role": "user", "content": "ping"}]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"choices":[{"message":{"role":"assistant","content":"pong"}}],
                    "usage":{"prompt_tokens":7,"completion_tokens":1,"total_tokens":8}}"#,
            )
            .create();

        let response = client_for(&server).chat(&request()).unwrap();
        assert_eq!(response.content(), Some("pong"));
        assert_eq!(response.usage().total(), 8);
        mock.assert();
    }

    #[test]
    fn test_chat_error_status_mapping() {
        let mut server = mockito::Server::new();
        let _unauthorized = server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_body(r#"{"error":{"message":"invalid api key"}}"#)
            .create();

        let err = client_for(&server).chat(&request()).unwrap_err();
        match err {
            ProviderError::Unauthorized(message) => assert_eq!(message, "invalid api key"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_chat_without_choices_is_empty_response() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[]}"#)
            .create();

        let err = client_for(&server).chat(&request()).unwrap_err();
        assert!(matches!(err, ProviderError::EmptyResponse));
    }

    #[test]
    fn test_missing_api_key() {
        let config = ChatConfig {
            api_key_env: "PARLEY_TEST_KEY_THAT_IS_NOT_SET".to_string(),
            ..ChatConfig::default()
        };
        let err = ChatClient::from_config(&config).err().unwrap();
        assert!(matches!(err, ProviderError::MissingApiKey(_)));
    }
}
