use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Non-2xx response. `message` is taken from the body when possible.
    #[error("{message}")]
    Http { status: StatusCode, message: String },

    /// The backend answered 200 with an error envelope.
    #[error("{message}")]
    Backend { message: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response shape: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid backend url: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    /// Builds the error for a non-OK response from its status and raw body.
    pub fn from_response_body(status: StatusCode, body: &str) -> Self {
        Self::Http {
            status,
            message: error_message_from_body(status, body),
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Transport(e) => e.status(),
            _ => None,
        }
    }
}

/// Picks the user-facing message out of an error response body.
///
/// `{"error": "X"}` gives `X`, then `{"message": "X"}`; any other non-empty
/// body is returned as text; an empty body falls back to the status.
pub fn error_message_from_body(status: StatusCode, body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return format!("Request failed with status {}", status.as_u16());
    }

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
        for key in ["error", "message"] {
            if let Some(Value::String(msg)) = map.get(key)
                && !msg.is_empty()
            {
                return msg.clone();
            }
        }
    }

    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_error_field() {
        let msg = error_message_from_body(StatusCode::BAD_REQUEST, r#"{"error":"X"}"#);
        assert_eq!(msg, "X");
    }

    #[test]
    fn test_json_message_field() {
        let msg = error_message_from_body(StatusCode::FORBIDDEN, r#"{"message":"limit reached"}"#);
        assert_eq!(msg, "limit reached");
    }

    #[test]
    fn test_plain_text_body() {
        let msg = error_message_from_body(StatusCode::BAD_GATEWAY, "upstream exploded\n");
        assert_eq!(msg, "upstream exploded");
    }

    #[test]
    fn test_json_without_known_fields_is_raw() {
        let msg = error_message_from_body(StatusCode::INTERNAL_SERVER_ERROR, r#"{"code":7}"#);
        assert_eq!(msg, r#"{"code":7}"#);
    }

    #[test]
    fn test_empty_body_uses_status() {
        let msg = error_message_from_body(StatusCode::INTERNAL_SERVER_ERROR, "");
        assert_eq!(msg, "Request failed with status 500");
        let err = ClientError::from_response_body(StatusCode::TOO_MANY_REQUESTS, "  ");
        assert_eq!(err.to_string(), "Request failed with status 429");
        assert_eq!(err.status(), Some(StatusCode::TOO_MANY_REQUESTS));
    }
}
