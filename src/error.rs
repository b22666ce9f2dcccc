//! Error types for the library client and the normalization of any
//! failure into a single user-facing message

use serde_json::Value;
use thiserror::Error;

/// Message used when nothing better can be extracted from a failure
pub const GENERIC_ERROR_MESSAGE: &str = "An unexpected error occurred.";

/// Status label for requests that never got a response
pub const FETCH_ERROR: &str = "FETCH_ERROR";

/// Status label for 2xx responses whose body could not be decoded
pub const PARSING_ERROR: &str = "PARSING_ERROR";

/// Main client error type
#[derive(Error, Debug)]
pub enum AppError {
    /// No response reached the client (connection refused, DNS, timeout)
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response; `body` holds the parsed JSON body when there was one
    #[error("Server error: {status}")]
    Server { status: u16, body: Option<Value> },

    /// 2xx response whose payload does not match the envelope
    #[error("Decode error: {0}")]
    Decode(String),

    /// 2xx envelope that reports `success: false`
    #[error("Request unsuccessful: {0}")]
    Unsuccessful(String),

    /// Client-side validation failure, never sent to the server
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl AppError {
    /// Build a server error from a status code and the raw response body
    pub fn from_status(status: u16, raw_body: &str) -> Self {
        AppError::Server {
            status,
            body: serde_json::from_str(raw_body).ok(),
        }
    }

    /// True when the failure was caught locally before any request
    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::Validation(_))
    }

    /// Human-readable message for this error. Never empty.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Server { status, body } => {
                let status = Value::from(*status);
                error_message(&status_error(status, body.clone()))
            }
            AppError::Transport(_) => {
                error_message(&status_error(Value::from(FETCH_ERROR), None))
            }
            AppError::Decode(_) => {
                error_message(&status_error(Value::from(PARSING_ERROR), None))
            }
            AppError::Unsuccessful(msg) | AppError::Validation(msg) => {
                error_message(&serde_json::json!({ "message": msg }))
            }
            AppError::Config(e) => error_message(&serde_json::json!({ "message": e.to_string() })),
        }
    }
}

fn status_error(status: Value, data: Option<Value>) -> Value {
    let mut obj = serde_json::Map::new();
    obj.insert("status".into(), status);
    if let Some(data) = data {
        obj.insert("data".into(), data);
    }
    Value::Object(obj)
}

fn non_empty_str<'a>(value: Option<&'a Value>) -> Option<&'a str> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

/// Extract one display string from an arbitrary error value.
///
/// Resolution order:
/// 1. a status-bearing error whose `data` body has `message` or `error`
/// 2. a status-bearing error otherwise renders `API Error: <status>`
/// 3. an object with a string `message`
/// 4. [`GENERIC_ERROR_MESSAGE`]
///
/// Total over every JSON value and never returns an empty string.
pub fn error_message(err: &Value) -> String {
    let Some(obj) = err.as_object() else {
        return GENERIC_ERROR_MESSAGE.to_string();
    };

    if let Some(status) = obj.get("status") {
        if let Some(body) = obj.get("data").and_then(Value::as_object) {
            if let Some(msg) = non_empty_str(body.get("message")).or(non_empty_str(body.get("error"))) {
                return msg.to_string();
            }
        }
        let status = match status {
            Value::String(s) if s.trim().is_empty() => "unknown".to_string(),
            Value::String(s) => s.clone(),
            Value::Null => "unknown".to_string(),
            other => other.to_string(),
        };
        return format!("API Error: {}", status);
    }

    match non_empty_str(obj.get("message")) {
        Some(msg) => msg.to_string(),
        None => GENERIC_ERROR_MESSAGE.to_string(),
    }
}

/// Result type alias for client operations
pub type AppResult<T> = Result<T, AppError>;
