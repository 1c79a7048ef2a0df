// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Errors surfaced by the admin API client.
///
/// `Clone` so a single refresh failure can be handed to every request that
/// was queued behind it.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("Not logged in. Run `vidadmin login` first.")]
    NotLoggedIn,

    #[error("{}", describe_status(*status, message.as_deref()))]
    Http { status: u16, message: Option<String> },

    #[error("{0}")]
    AuthRejected(String),

    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Session storage error: {0}")]
    Session(String),

    #[error("Failed to read {path}: {reason}")]
    Io { path: String, reason: String },
}

fn describe_status(status: u16, message: Option<&str>) -> String {
    let label = match status {
        401 => "Unauthorized".to_string(),
        403 => "Forbidden".to_string(),
        404 => "Not found".to_string(),
        _ => StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("HTTP error")
            .to_string(),
    };

    match message {
        Some(msg) => format!("{} ({}): {}", label, status, msg),
        None => format!("{} ({})", label, status),
    }
}

impl ApiError {
    /// Build an HTTP error from a status code and the raw response body.
    ///
    /// A JSON body with a `message` field wins; otherwise a non-empty text
    /// body is used as-is.
    pub fn from_response(status: StatusCode, body: &[u8]) -> Self {
        let message = serde_json::from_slice::<Value>(body)
            .ok()
            .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
            .or_else(|| {
                let text = String::from_utf8_lossy(body).trim().to_string();
                (!text.is_empty()).then_some(text)
            });

        Self::Http {
            status: status.as_u16(),
            message,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Http { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Collapse a rejected auth call into the server's message, or `fallback`.
    pub(crate) fn into_auth_rejection(self, fallback: &str) -> Self {
        match self {
            Self::Http { message, .. } => {
                Self::AuthRejected(message.unwrap_or_else(|| fallback.to_string()))
            }
            other => other,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}
