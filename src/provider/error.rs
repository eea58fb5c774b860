//! Error types for the chat-completion client

use thiserror::Error;

/// Errors that can occur when calling a chat-completion endpoint
#[derive(Debug, Error)]
pub enum ProviderError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// API returned an error response
    #[error("API error ({status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Failed to parse the API response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// API key rejected by the endpoint
    #[error("Unauthorized - check your API key: {0}")]
    Unauthorized(String),

    /// API key environment variable is not set
    #[error("API key not found - set the {0} environment variable")]
    MissingApiKey(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded - please try again later")]
    RateLimited,

    /// Server error
    #[error("Server error ({status}): {message}")]
    ServerError {
        /// HTTP status code (5xx)
        status: u16,
        /// Error message
        message: String,
    },

    /// The response carried no choices
    #[error("Response contained no choices")]
    EmptyResponse,
}

/// Result type alias for chat-completion operations
pub type Result<T> = std::result::Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let api_error = ProviderError::ApiError {
            status: 400,
            message: "Bad request".to_string(),
        };
        assert!(api_error.to_string().contains("400"));
        assert!(api_error.to_string().contains("Bad request"));

        let missing = ProviderError::MissingApiKey("API_KEY".to_string());
        assert!(missing.to_string().contains("API_KEY"));
    }
}
