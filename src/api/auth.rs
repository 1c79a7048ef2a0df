// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use reqwest::Method;
use serde_json::json;
use tracing::info;

use super::client::{AdminClient, ApiRequest};
use super::error::ApiError;
use super::types::{AuthTokens, require};
use crate::session::Session;

impl AdminClient {
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthTokens, ApiError> {
        require(email, "email")?;
        require(password, "password")?;

        let request = ApiRequest::new(Method::POST, "/auth/sign-in")
            .json(json!({ "email": email, "password": password }));

        let tokens: AuthTokens = self
            .send(request)
            .await
            .map_err(|e| e.into_auth_rejection("Invalid email or password"))?;

        self.store_tokens(&tokens, Some(email))?;
        info!("Signed in as {}", email);
        Ok(tokens)
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        username: &str,
    ) -> Result<AuthTokens, ApiError> {
        require(email, "email")?;
        require(password, "password")?;
        require(username, "username")?;

        let request = ApiRequest::new(Method::POST, "/auth/sign-up").json(json!({
            "email": email,
            "password": password,
            "username": username,
        }));

        let tokens: AuthTokens = self
            .send(request)
            .await
            .map_err(|e| e.into_auth_rejection("Registration failed"))?;

        self.store_tokens(&tokens, Some(email))?;
        info!("Registered {} ({})", username, email);
        Ok(tokens)
    }

    /// Trade a Google ID-token credential for backend tokens.
    pub async fn google_sign_in(&self, credential: &str) -> Result<AuthTokens, ApiError> {
        require(credential, "credential")?;

        let request =
            ApiRequest::new(Method::POST, "/auth/google").json(json!({ "token": credential }));

        let tokens: AuthTokens = self
            .send(request)
            .await
            .map_err(|e| e.into_auth_rejection("Google login failed"))?;

        self.store_tokens(&tokens, None)?;
        info!("Signed in with Google");
        Ok(tokens)
    }

    pub fn sign_out(&self) {
        self.forget_session();
        info!("Signed out");
    }

    pub fn current_session(&self) -> Option<Session> {
        self.session().load()
    }
}

#[cfg(test)]
mod tests {
    use crate::api::client::{AdminClient, ClientOptions};
    use crate::api::error::ApiError;
    use crate::session::{Session, SessionStore};
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> AdminClient {
        AdminClient::new(&server.uri(), ClientOptions::default(), SessionStore::in_memory()).unwrap()
    }

    #[tokio::test]
    async fn test_sign_in_stores_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/sign-in"))
            .and(body_json(json!({"email": "admin@example.com", "password": "secret"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"token": "access-1", "refreshToken": "refresh-1"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let api = client(&server);
        api.sign_in("admin@example.com", "secret").await.unwrap();

        let session = api.current_session().unwrap();
        assert_eq!(session.token, "access-1");
        assert_eq!(session.refresh_token.as_deref(), Some("refresh-1"));
        assert_eq!(session.email.as_deref(), Some("admin@example.com"));
    }

    #[tokio::test]
    async fn test_sign_in_rejection_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/sign-in"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let api = client(&server);
        let err = api.sign_in("admin@example.com", "wrong").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid email or password");
        assert!(api.current_session().is_none());
    }

    #[tokio::test]
    async fn test_sign_in_requires_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let api = client(&server);
        let err = api.sign_in("", "secret").await.unwrap_err();
        assert!(matches!(err, ApiError::MissingField("email")));
    }

    #[tokio::test]
    async fn test_sign_up_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/sign-up"))
            .respond_with(
                ResponseTemplate::new(409).set_body_json(json!({"message": "Email already in use"})),
            )
            .mount(&server)
            .await;

        let api = client(&server);
        let err = api
            .sign_up("admin@example.com", "secret", "admin")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Email already in use");
    }

    #[tokio::test]
    async fn test_google_sign_in() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/google"))
            .and(body_json(json!({"token": "google-jwt"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"token": "access-g", "refreshToken": "refresh-g"})),
            )
            .mount(&server)
            .await;

        let api = client(&server);
        api.google_sign_in("google-jwt").await.unwrap();
        assert_eq!(api.session().refresh_token().as_deref(), Some("refresh-g"));
    }

    #[tokio::test]
    async fn test_sign_out_clears_session() {
        let server = MockServer::start().await;
        let api = AdminClient::new(
            &server.uri(),
            ClientOptions::default(),
            SessionStore::with_session(Session::new("t".into(), Some("r".into()), None)),
        )
        .unwrap();

        api.sign_out();
        assert!(api.current_session().is_none());
    }

    fn tokens_response(server_path: &'static str) -> Mock {
        Mock::given(method("POST")).and(path(server_path)).respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"token": "access-1", "refreshToken": "refresh-1"})),
        )
    }

    #[tokio::test]
    async fn test_sign_in_fails_when_session_cannot_be_stored() {
        let server = MockServer::start().await;
        tokens_response("/auth/sign-in").mount(&server).await;

        // The session file's parent is a regular file, so it can never be written
        let dir = tempfile::TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();
        let session_path = blocker.join("s.json");

        let api = AdminClient::new(
            &server.uri(),
            ClientOptions::default(),
            SessionStore::at(&session_path).unwrap(),
        )
        .unwrap();

        let err = api.sign_in("admin@example.com", "secret").await.unwrap_err();
        assert!(matches!(err, ApiError::Session(_)), "got {:?}", err);
        assert!(!session_path.exists());
    }

    #[tokio::test]
    async fn test_google_sign_in_fails_when_session_cannot_be_stored() {
        let server = MockServer::start().await;
        tokens_response("/auth/google").mount(&server).await;

        let dir = tempfile::TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();

        let api = AdminClient::new(
            &server.uri(),
            ClientOptions::default(),
            SessionStore::at(blocker.join("s.json")).unwrap(),
        )
        .unwrap();

        let err = api.google_sign_in("google-jwt").await.unwrap_err();
        assert!(matches!(err, ApiError::Session(_)), "got {:?}", err);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_sign_in_session_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let server = MockServer::start().await;
        tokens_response("/auth/sign-in").mount(&server).await;

        let dir = tempfile::TempDir::new().unwrap();
        let session_path = dir.path().join("sessions").join("s.json");
        let api = AdminClient::new(
            &server.uri(),
            ClientOptions::default(),
            SessionStore::at(&session_path).unwrap(),
        )
        .unwrap();

        api.sign_in("admin@example.com", "secret").await.unwrap();

        let mode = std::fs::metadata(&session_path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
