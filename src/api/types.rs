// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use super::error::ApiError;

pub type Id = i64;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokens {
    pub token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeriesStatus {
    #[default]
    ComingSoon,
    Published,
    Unlisted,
    Archived,
    Draft,
    Removed,
}

impl SeriesStatus {
    pub const ALL: [SeriesStatus; 6] = [
        Self::ComingSoon,
        Self::Published,
        Self::Unlisted,
        Self::Archived,
        Self::Draft,
        Self::Removed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ComingSoon => "COMING_SOON",
            Self::Published => "PUBLISHED",
            Self::Unlisted => "UNLISTED",
            Self::Archived => "ARCHIVED",
            Self::Draft => "DRAFT",
            Self::Removed => "REMOVED",
        }
    }
}

impl fmt::Display for SeriesStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SeriesStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| {
                format!(
                    "Invalid status: {}. Use one of: {}",
                    s,
                    Self::ALL.map(|st| st.as_str()).join(", ")
                )
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    pub id: Id,
    pub title: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, alias = "image")]
    pub image_path: Option<String>,
}

impl fmt::Display for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    pub id: Id,
    pub title: String,
    #[serde(default)]
    pub episode_number: Option<i64>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default, alias = "image", alias = "thumbnailPath")]
    pub image_path: Option<String>,
    #[serde(default)]
    pub series_id: Option<Id>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    pub id: Id,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub series_id: Option<Id>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Id,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub subscription: bool,
    #[serde(default)]
    pub role: Option<String>,
}

/// Permission for one user to watch one series outside of a subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessGrant {
    #[serde(rename = "id")]
    pub series_id: Id,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessGrant {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|expiry| expiry > now).unwrap_or(true)
    }
}

/// An image upload held in memory so the request can be replayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub async fn read<P: AsRef<Path>>(path: P) -> Result<Self, ApiError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| ApiError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "image".to_string());
        Ok(Self { file_name, bytes })
    }
}

pub(crate) fn require(value: &str, field: &'static str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        Err(ApiError::MissingField(field))
    } else {
        Ok(())
    }
}

/// Decode a list that the backend may return bare or wrapped in an object
/// under one of `keys`. An object without any of the keys is an empty list;
/// an empty body or a scalar is not a list at all.
pub(crate) fn decode_list<T: DeserializeOwned>(value: Value, keys: &[&str]) -> Result<Vec<T>, ApiError> {
    match value {
        Value::Array(_) => Ok(serde_json::from_value(value)?),
        Value::Object(mut map) => {
            for key in keys {
                if let Some(inner @ Value::Array(_)) = map.remove(*key) {
                    return Ok(serde_json::from_value(inner)?);
                }
            }
            Ok(Vec::new())
        }
        Value::Null => Err(ApiError::InvalidResponse(
            "empty body where a list was expected".to_string(),
        )),
        other => Err(ApiError::InvalidResponse(format!(
            "expected a list, got {}",
            other
        ))),
    }
}
