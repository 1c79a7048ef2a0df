// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use reqwest::Method;
use serde::Serialize;

use super::client::{AdminClient, ApiRequest};
use super::error::ApiError;
use super::types::{Id, User, require};

#[derive(Debug, Clone, Serialize)]
pub struct UserUpdate {
    pub username: String,
    pub email: String,
    pub subscription: bool,
}

impl From<&User> for UserUpdate {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            email: user.email.clone(),
            subscription: user.subscription,
        }
    }
}

impl AdminClient {
    pub async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        self.get("/users").await
    }

    pub async fn update_user(&self, id: Id, update: &UserUpdate) -> Result<User, ApiError> {
        require(&update.username, "username")?;
        require(&update.email, "email")?;

        let body = serde_json::to_value(update)?;
        self.send(ApiRequest::new(Method::PUT, format!("/users/{}", id)).json(body))
            .await
    }
}

/// Users whose username or email contains `term`, ignoring case.
pub fn filter_users<'a>(users: &'a [User], term: &str) -> Vec<&'a User> {
    let term = term.trim().to_lowercase();
    users
        .iter()
        .filter(|user| {
            term.is_empty()
                || user.username.to_lowercase().contains(&term)
                || user.email.to_lowercase().contains(&term)
        })
        .collect()
}
