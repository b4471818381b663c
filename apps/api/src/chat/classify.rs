//! Maps backend failures onto a fixed set of user-facing messages.
//! Raw error text never reaches the chat log.

use serde::Serialize;

use crate::remote::RemoteError;

pub const OUT_OF_CREDITS_MESSAGE: &str =
    "You've run out of credits! Please purchase more credits to continue using AI features.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Network,
    Timeout,
    AuthRequired,
    RateLimited,
    ServerFault,
    Generic,
}

impl ErrorCategory {
    pub fn template(&self) -> &'static str {
        match self {
            ErrorCategory::Network => {
                "Network error: Please check your internet connection and try again."
            }
            ErrorCategory::Timeout => {
                "The request timed out. The server might be busy, please try again in a moment."
            }
            ErrorCategory::AuthRequired => "Authentication error: You may need to log in again.",
            ErrorCategory::RateLimited => {
                "You have made too many requests. Please wait a moment before trying again."
            }
            ErrorCategory::ServerFault => {
                "The server encountered an error. Our team has been notified and is working on it."
            }
            ErrorCategory::Generic => {
                "I apologize, but I encountered an error processing your request. Please try again."
            }
        }
    }
}

/// Message text is inspected first; a numeric status (429, 5xx) then takes
/// precedence over whatever the text suggested.
pub fn classify(error: &RemoteError) -> ErrorCategory {
    let text = error.to_string().to_lowercase();

    let mut category = if text.contains("network") || text.contains("fetch") {
        ErrorCategory::Network
    } else if text.contains("timeout") || text.contains("timed out") {
        ErrorCategory::Timeout
    } else if text.contains("auth") || text.contains("401") {
        ErrorCategory::AuthRequired
    } else {
        ErrorCategory::Generic
    };

    match error.status() {
        Some(429) => category = ErrorCategory::RateLimited,
        Some(status) if status >= 500 => category = ErrorCategory::ServerFault,
        _ => {}
    }

    category
}

pub fn friendly_message(error: &RemoteError) -> &'static str {
    classify(error).template()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(status: u16, message: &str) -> RemoteError {
        RemoteError::Status {
            status,
            message: message.to_string(),
        }
    }

    #[test]
    fn test_network_error() {
        let err = RemoteError::Network("connection refused".to_string());
        assert_eq!(classify(&err), ErrorCategory::Network);
        assert!(friendly_message(&err).starts_with("Network error"));
    }

    #[test]
    fn test_timeout() {
        assert_eq!(classify(&RemoteError::Timeout), ErrorCategory::Timeout);
    }

    #[test]
    fn test_unauthorized_status() {
        assert_eq!(
            classify(&status(401, "Unauthorized")),
            ErrorCategory::AuthRequired
        );
    }

    #[test]
    fn test_rate_limit_overrides_message() {
        assert_eq!(
            classify(&status(429, "auth quota exceeded")),
            ErrorCategory::RateLimited
        );
    }

    #[test]
    fn test_server_fault() {
        assert_eq!(
            classify(&status(503, "Service Unavailable")),
            ErrorCategory::ServerFault
        );
        assert_eq!(
            classify(&status(502, "upstream network failure")),
            ErrorCategory::ServerFault
        );
    }

    #[test]
    fn test_unrecognized_falls_back_to_generic() {
        assert_eq!(classify(&status(400, "Bad Request")), ErrorCategory::Generic);
        assert_eq!(
            classify(&RemoteError::Parse("expected value".to_string())),
            ErrorCategory::Generic
        );
        assert_eq!(classify(&RemoteError::Empty), ErrorCategory::Generic);
    }
}
