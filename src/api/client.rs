// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::error::ApiError;
use super::refresh::RefreshCoordinator;
use super::types::{AuthTokens, ImageFile};
use crate::config::ServerConfig;
use crate::session::{Session, SessionStore};

const AUTH_PREFIX: &str = "/auth/";
const REFRESH_PATH: &str = "/auth/refresh";

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self::from(&ServerConfig::default())
    }
}

impl From<&ServerConfig> for ClientOptions {
    fn from(server: &ServerConfig) -> Self {
        Self {
            timeout: Duration::from_secs(server.timeout_secs),
            user_agent: server.user_agent.clone(),
        }
    }
}

/// One field of a multipart form.
#[derive(Debug, Clone)]
pub enum FormField {
    Text { name: &'static str, value: String },
    File { name: &'static str, image: ImageFile },
}

/// Request body kept in rebuildable form: a replay after a token refresh
/// needs a fresh `reqwest` body.
#[derive(Debug, Clone)]
pub enum Body {
    Empty,
    Json(Value),
    Multipart(Vec<FormField>),
}

#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Body,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: Body::Empty,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Body::Json(body);
        self
    }

    pub fn multipart(mut self, fields: Vec<FormField>) -> Self {
        self.body = Body::Multipart(fields);
        self
    }

    fn is_auth_request(&self) -> bool {
        self.path.starts_with(AUTH_PREFIX)
    }
}

fn is_auth_failure(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}

/// HTTP client for the admin backend.
///
/// Attaches the bearer token to every non-`/auth/` request and, on a 401 or
/// 403, renews the token once and replays the request.
#[derive(Debug)]
pub struct AdminClient {
    client: Client,
    base_url: String,
    session: SessionStore,
    refresher: RefreshCoordinator,
}

impl AdminClient {
    pub fn new(base_url: &str, options: ClientOptions, session: SessionStore) -> Result<Self, ApiError> {
        let url = url::Url::parse(base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ApiError::InvalidUrl(format!(
                "{}: scheme must be http or https",
                base_url
            )));
        }

        let client = Client::builder()
            .timeout(options.timeout)
            .user_agent(options.user_agent)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
            refresher: RefreshCoordinator::new(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Absolute URL for a media path returned by the backend.
    pub fn media_url(&self, path: &str) -> Option<String> {
        media_url(&self.base_url, path)
    }

    /// Persist a fresh sign-in. Each CLI run is a new process, so a session
    /// that only lives in memory is as good as none.
    pub(crate) fn store_tokens(&self, tokens: &AuthTokens, email: Option<&str>) -> Result<(), ApiError> {
        let session = Session::new(
            tokens.token.clone(),
            tokens.refresh_token.clone(),
            email.map(str::to_string),
        );
        self.session.save(&session).map_err(|e| {
            warn!("Failed to store session: {:#}", e);
            ApiError::Session(format!("{:#}", e))
        })
    }

    pub(crate) fn forget_session(&self) {
        if let Err(e) = self.session.clear() {
            warn!("Failed to remove stored session: {:#}", e);
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(ApiRequest::get(path)).await
    }

    pub async fn send<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let body = self.execute(&request).await?;
        decode(&request, &body)
    }

    async fn execute(&self, request: &ApiRequest) -> Result<Vec<u8>, ApiError> {
        let token = if request.is_auth_request() {
            None
        } else {
            self.session.access_token()
        };

        let response = self.dispatch(request, token.as_deref()).await?;
        let status = response.status();

        if !is_auth_failure(status) || request.is_auth_request() {
            return read_body(response).await;
        }

        let rejected = match response.bytes().await {
            Ok(body) => body.to_vec(),
            Err(e) => {
                debug!("{} {} -> {}, body unreadable: {}", request.method, request.path, status, e);
                Vec::new()
            }
        };
        if self.session.refresh_token().is_none() {
            debug!("{} {} -> {} with no refresh token", request.method, request.path, status);
            return Err(ApiError::from_response(status, &rejected));
        }

        debug!(
            "{} {} -> {}, refreshing token before retry",
            request.method, request.path, status
        );

        let fresh = self
            .refresher
            .refresh(token.as_deref(), || self.session.access_token(), || self.renew())
            .await?;

        let retry = self.dispatch(request, Some(&fresh)).await?;
        read_body(retry).await
    }

    async fn dispatch(&self, request: &ApiRequest, token: Option<&str>) -> Result<Response, ApiError> {
        let url = format!("{}{}", self.base_url, request.path);
        debug!("{} {}", request.method, url);

        let mut builder = self.client.request(request.method.clone(), &url);

        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }

        builder = match &request.body {
            Body::Empty => builder,
            Body::Json(value) => builder.json(value),
            Body::Multipart(fields) => builder.multipart(build_form(fields)),
        };

        Ok(builder.send().await?)
    }

    /// Exchange the stored refresh token for a new pair. Any failure logs the
    /// admin out.
    async fn renew(&self) -> Result<String, ApiError> {
        let Some(refresh_token) = self.session.refresh_token() else {
            self.forget_session();
            return Err(ApiError::NotLoggedIn);
        };

        let request = ApiRequest::new(Method::POST, REFRESH_PATH)
            .json(json!({ "refreshToken": refresh_token }));

        // Sent without a bearer token and never intercepted
        let outcome = match self.dispatch(&request, None).await {
            Ok(response) => match read_body(response).await {
                Ok(body) => decode::<AuthTokens>(&request, &body),
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };

        match outcome {
            Ok(tokens) => {
                if let Err(e) = self.session.rotate(tokens.token.clone(), tokens.refresh_token) {
                    warn!("Renewed session kept in memory only: {:#}", e);
                }
                info!("Access token renewed");
                Ok(tokens.token)
            }
            Err(e) => {
                warn!("Token refresh failed, logging out: {}", e);
                self.forget_session();
                Err(ApiError::RefreshFailed(e.to_string()))
            }
        }
    }
}

fn build_form(fields: &[FormField]) -> Form {
    fields.iter().fold(Form::new(), |form, field| match field {
        FormField::Text { name, value } => form.text(*name, value.clone()),
        FormField::File { name, image } => form.part(
            *name,
            Part::bytes(image.bytes.clone()).file_name(image.file_name.clone()),
        ),
    })
}

async fn read_body(response: Response) -> Result<Vec<u8>, ApiError> {
    let status = response.status();
    let body = response.bytes().await?.to_vec();

    if status.is_success() {
        Ok(body)
    } else {
        Err(ApiError::from_response(status, &body))
    }
}

fn decode<T: DeserializeOwned>(request: &ApiRequest, body: &[u8]) -> Result<T, ApiError> {
    // Empty bodies decode as JSON null so `()` and `Option<_>` targets work
    let body: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
        b"null"
    } else {
        body
    };

    serde_json::from_slice(body).map_err(|e| {
        ApiError::InvalidResponse(format!("{} {}: {}", request.method, request.path, e))
    })
}

pub fn media_url(base_url: &str, path: &str) -> Option<String> {
    let path = path.trim();
    if path.is_empty() {
        return None;
    }
    if path.starts_with("http://") || path.starts_with("https://") {
        return Some(path.to_string());
    }

    Some(format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    ))
}
