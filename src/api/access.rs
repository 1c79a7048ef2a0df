// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

//! Per-user access to series.
//!
//! A user can watch a series when they hold a subscription, or when an
//! individual grant for that series exists and has not expired. Subscribers
//! see everything; grants only matter for everyone else.

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::de::IgnoredAny;
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use super::client::{AdminClient, ApiRequest};
use super::error::ApiError;
use super::types::{AccessGrant, Id, Series, User};

/// Grants per user id.
pub type AccessMap = BTreeMap<Id, Vec<AccessGrant>>;

pub fn can_view(user: &User, grants: &[AccessGrant], series_id: Id, now: DateTime<Utc>) -> bool {
    user.subscription
        || grants
            .iter()
            .any(|grant| grant.series_id == series_id && grant.is_active(now))
}

/// Series ids the grants still cover at `now`.
pub fn active_series(grants: &[AccessGrant], now: DateTime<Utc>) -> BTreeSet<Id> {
    grants
        .iter()
        .filter(|grant| grant.is_active(now))
        .map(|grant| grant.series_id)
        .collect()
}

/// Series whose title contains `term`, ignoring case.
pub fn filter_series<'a>(series: &'a [Series], term: &str) -> Vec<&'a Series> {
    let term = term.trim().to_lowercase();
    series
        .iter()
        .filter(|s| term.is_empty() || s.title.to_lowercase().contains(&term))
        .collect()
}

impl AdminClient {
    pub async fn list_access(&self) -> Result<AccessMap, ApiError> {
        self.get("/admin/access").await
    }

    pub async fn user_access(&self, user_id: Id) -> Result<Vec<AccessGrant>, ApiError> {
        let grants: Option<Vec<AccessGrant>> =
            self.get(&format!("/admin/access/{}", user_id)).await?;
        Ok(grants.unwrap_or_default())
    }

    /// Replace the user's individual grants with exactly `series_ids`.
    pub async fn set_user_access(&self, user_id: Id, series_ids: &BTreeSet<Id>) -> Result<(), ApiError> {
        let ids: Vec<Id> = series_ids.iter().copied().collect();
        debug!("Setting access for user {} to {:?}", user_id, ids);

        let _: IgnoredAny = self
            .send(ApiRequest::new(Method::PUT, format!("/admin/access/{}", user_id)).json(json!(ids)))
            .await?;
        Ok(())
    }

    /// Add one series to the user's grants. Returns false if already granted.
    pub async fn grant_access(&self, user_id: Id, series_id: Id) -> Result<bool, ApiError> {
        let mut ids: BTreeSet<Id> = self
            .user_access(user_id)
            .await?
            .iter()
            .map(|grant| grant.series_id)
            .collect();

        if !ids.insert(series_id) {
            return Ok(false);
        }

        self.set_user_access(user_id, &ids).await?;
        Ok(true)
    }

    /// Drop one series from the user's grants. Returns false if not granted.
    pub async fn revoke_access(&self, user_id: Id, series_id: Id) -> Result<bool, ApiError> {
        let mut ids: BTreeSet<Id> = self
            .user_access(user_id)
            .await?
            .iter()
            .map(|grant| grant.series_id)
            .collect();

        if !ids.remove(&series_id) {
            return Ok(false);
        }

        self.set_user_access(user_id, &ids).await?;
        Ok(true)
    }
}
