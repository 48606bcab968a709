//! Cookie-file login session for the music service

use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;

use crate::model::NeteaseClient;
use crate::player::{AuthStatus, Session};

/// Session backed by a `Cookie` header value stored on disk.
///
/// The file is written by whatever performed the login (for instance the
/// API server's QR flow); logging in here means picking it up again.
pub struct CookieSession {
    path: PathBuf,
    client: NeteaseClient,
}

impl CookieSession {
    pub fn new(path: impl Into<PathBuf>, client: NeteaseClient) -> Self {
        Self {
            path: path.into(),
            client,
        }
    }

    /// Reads the stored cookie, treating a missing or blank file as absent.
    pub fn load_cookie(path: &Path) -> Result<Option<String>> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cookie = content.trim();
                Ok((!cookie.is_empty()).then(|| cookie.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl Session for CookieSession {
    async fn status(&self) -> AuthStatus {
        match Self::load_cookie(&self.path) {
            Ok(Some(_)) => AuthStatus::LoggedIn,
            Ok(None) => AuthStatus::NeedLogin,
            Err(e) => {
                tracing::warn!(error = %e, path = %self.path.display(), "Could not read cookie file");
                AuthStatus::NeedLogin
            }
        }
    }

    async fn login(&self) -> bool {
        tracing::info!(path = %self.path.display(), "Reloading session cookie");
        match Self::load_cookie(&self.path) {
            Ok(Some(cookie)) => {
                self.client.set_cookie(Some(cookie)).await;
                tracing::info!("Session cookie loaded");
                true
            }
            Ok(None) => {
                tracing::warn!(path = %self.path.display(), "No session cookie saved");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load session cookie");
                false
            }
        }
    }
}
