// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
#[cfg(unix)]
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::config::Config;

/// Tokens issued by the backend for one signed-in admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub saved_at: DateTime<Utc>,
}

impl Session {
    pub fn new(token: String, refresh_token: Option<String>, email: Option<String>) -> Self {
        Self {
            token,
            refresh_token,
            email,
            saved_at: Utc::now(),
        }
    }
}

/// Holds the current session in memory and, unless built with
/// [`SessionStore::in_memory`], mirrors it to a JSON file.
///
/// Sessions are keyed by server so switching `--server` does not reuse
/// another backend's tokens.
#[derive(Debug)]
pub struct SessionStore {
    path: Option<PathBuf>,
    current: Mutex<Option<Session>>,
}

/// Short stable key for a server base URL.
pub fn server_key(base_url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(base_url.trim_end_matches('/').as_bytes());
    format!("{:x}", hasher.finalize())[..16].to_string()
}

impl SessionStore {
    /// Store under `<config_dir>/vidadmin/sessions/` for `base_url`.
    pub fn for_server(base_url: &str) -> Result<Self> {
        let sessions_dir = Config::ensure_config_dir()?.join("sessions");
        Self::at(sessions_dir.join(format!("{}.json", server_key(base_url))))
    }

    /// Store backed by an explicit file. A missing file means signed out.
    pub fn at<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let current = read_session(&path)?;
        Ok(Self {
            path: Some(path),
            current: Mutex::new(current),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            path: None,
            current: Mutex::new(None),
        }
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            path: None,
            current: Mutex::new(Some(session)),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Session>> {
        // A panic while holding the lock cannot leave a half-written session
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn load(&self) -> Option<Session> {
        self.lock().clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.lock().as_ref().map(|s| s.token.clone())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.lock().as_ref().and_then(|s| s.refresh_token.clone())
    }

    /// Replace the session. Memory is updated even if writing the file fails.
    pub fn save(&self, session: &Session) -> Result<()> {
        *self.lock() = Some(session.clone());

        if let Some(path) = &self.path {
            if let Some(parent) = path.parent() {
                create_private_dir(parent).with_context(|| {
                    format!("Failed to create session directory: {}", parent.display())
                })?;
            }

            let content = serde_json::to_string_pretty(session)
                .with_context(|| "Failed to serialize session")?;
            write_private(path, content.as_bytes())
                .with_context(|| format!("Failed to write session file: {}", path.display()))?;
        }

        Ok(())
    }

    /// Swap in a renewed access token, keeping the old refresh token when the
    /// server does not rotate it.
    pub fn rotate(&self, token: String, refresh_token: Option<String>) -> Result<Session> {
        let previous = self.load();
        let session = Session::new(
            token,
            refresh_token.or_else(|| previous.as_ref().and_then(|s| s.refresh_token.clone())),
            previous.and_then(|s| s.email),
        );
        self.save(&session)?;
        Ok(session)
    }

    pub fn clear(&self) -> Result<()> {
        *self.lock() = None;

        if let Some(path) = &self.path {
            if path.exists() {
                fs::remove_file(path).with_context(|| {
                    format!("Failed to remove session file: {}", path.display())
                })?;
            }
        }

        Ok(())
    }
}

// Sessions hold bearer and refresh tokens: owner-only on unix.
#[cfg(unix)]
fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().recursive(true).mode(0o700).create(dir)
}

#[cfg(not(unix))]
fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dir)
}

#[cfg(unix)]
fn write_private(path: &Path, content: &[u8]) -> std::io::Result<()> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // `mode` only applies on creation; tighten files left by older versions
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    file.write_all(content)
}

#[cfg(not(unix))]
fn write_private(path: &Path, content: &[u8]) -> std::io::Result<()> {
    fs::write(path, content)
}

fn read_session(path: &Path) -> Result<Option<Session>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read session file: {}", path.display()))?;

    match serde_json::from_str(&content) {
        Ok(session) => Ok(Some(session)),
        Err(e) => {
            tracing::warn!(
                "Ignoring unreadable session file {}: {}",
                path.display(),
                e
            );
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_server_key_ignores_trailing_slash() {
        assert_eq!(
            server_key("http://localhost:8080/"),
            server_key("http://localhost:8080")
        );
        assert_ne!(
            server_key("http://localhost:8080"),
            server_key("http://localhost:9090")
        );
        assert_eq!(server_key("http://localhost:8080").len(), 16);
    }

    #[test]
    fn test_missing_file_is_signed_out() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::at(dir.path().join("s.json")).unwrap();
        assert!(store.load().is_none());
        assert!(store.access_token().is_none());
    }

    #[test]
    fn test_save_persists_across_instances() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("s.json");

        let store = SessionStore::at(&path).unwrap();
        store
            .save(&Session::new(
                "access-1".into(),
                Some("refresh-1".into()),
                Some("admin@example.com".into()),
            ))
            .unwrap();

        let reopened = SessionStore::at(&path).unwrap();
        assert_eq!(reopened.access_token().as_deref(), Some("access-1"));
        assert_eq!(reopened.refresh_token().as_deref(), Some("refresh-1"));
    }

    #[cfg(unix)]
    #[test]
    fn test_session_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let sessions = dir.path().join("sessions");
        let path = sessions.join("s.json");

        // A pre-existing world-readable file gets tightened on save
        fs::create_dir_all(&sessions).unwrap();
        fs::write(&path, "{}").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        let store = SessionStore::at(&path).unwrap();
        store
            .save(&Session::new("access-1".into(), Some("refresh-1".into()), None))
            .unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        let fresh_dir = dir.path().join("fresh").join("sessions");
        let fresh = SessionStore::at(fresh_dir.join("s.json")).unwrap();
        fresh.save(&Session::new("t".into(), None, None)).unwrap();
        let dir_mode = fs::metadata(&fresh_dir).unwrap().permissions().mode();
        assert_eq!(dir_mode & 0o777, 0o700);
        let file_mode = fs::metadata(fresh_dir.join("s.json")).unwrap().permissions().mode();
        assert_eq!(file_mode & 0o777, 0o600);
    }

    #[test]
    fn test_rotate_keeps_refresh_token_when_absent() {
        let store = SessionStore::with_session(Session::new(
            "old".into(),
            Some("refresh-1".into()),
            Some("admin@example.com".into()),
        ));

        let session = store.rotate("new".into(), None).unwrap();
        assert_eq!(session.token, "new");
        assert_eq!(session.refresh_token.as_deref(), Some("refresh-1"));
        assert_eq!(session.email.as_deref(), Some("admin@example.com"));

        let session = store.rotate("newer".into(), Some("refresh-2".into())).unwrap();
        assert_eq!(session.refresh_token.as_deref(), Some("refresh-2"));
    }

    #[test]
    fn test_clear_removes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("s.json");
        let store = SessionStore::at(&path).unwrap();
        store.save(&Session::new("t".into(), None, None)).unwrap();
        assert!(path.exists());

        store.clear().unwrap();
        assert!(!path.exists());
        assert!(store.load().is_none());

        // Clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_corrupt_file_is_ignored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("s.json");
        fs::write(&path, "{not json").unwrap();
        let store = SessionStore::at(&path).unwrap();
        assert!(store.load().is_none());
    }
}
