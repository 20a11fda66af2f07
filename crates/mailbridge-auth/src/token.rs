//! Token-pair persistence and on-demand refresh
//!
//! One JSON token file per provider. The file is the only credential state
//! Mailbridge owns; if it is absent the client cannot be constructed and the
//! interactive consent flow has to run first.

use std::fs;
use std::path::{Path, PathBuf};

use oauth2::basic::{BasicClient, BasicTokenResponse};
use oauth2::{RefreshToken, TokenResponse};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::OAuth2Config;
use crate::error::{AuthError, AuthResult};

/// Access/refresh token pair as persisted on disk
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TokenPair {
    /// Access token for API calls
    pub access_token: String,
    /// Refresh token for obtaining new access tokens
    pub refresh_token: Option<String>,
    /// Access token expiration (Unix seconds)
    pub expires_at: Option<i64>,
}

impl TokenPair {
    /// Whether the access token is expired or within the 5-minute renewal
    /// window
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at - chrono::Utc::now().timestamp() < 300,
            None => false,
        }
    }

    /// Read a token pair from its JSON file
    pub fn load(path: &Path) -> AuthResult<Self> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(AuthError::ConsentRequired(path.to_path_buf()));
            }
            Err(err) => return Err(err.into()),
        };
        serde_json::from_str(&raw).map_err(|e| AuthError::TokenInvalid(e.to_string()))
    }

    /// Write the token pair to its JSON file
    pub fn save(&self, path: &Path) -> AuthResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| AuthError::TokenInvalid(e.to_string()))?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Build a pair from a token-endpoint response, keeping the previous
    /// refresh token when the provider does not rotate it
    pub(crate) fn from_response(
        response: &BasicTokenResponse,
        previous_refresh: Option<String>,
    ) -> Self {
        let expires_at = response
            .expires_in()
            .map(|d| chrono::Utc::now().timestamp() + d.as_secs() as i64);
        Self {
            access_token: response.access_token().secret().clone(),
            refresh_token: response
                .refresh_token()
                .map(|t| t.secret().clone())
                .or(previous_refresh),
            expires_at,
        }
    }
}

/// Loads a provider's token file once and hands out valid access tokens,
/// refreshing and re-persisting the pair when it nears expiry
pub struct TokenStore {
    client: BasicClient,
    path: PathBuf,
    cached: RwLock<TokenPair>,
}

impl TokenStore {
    /// Open the token file for a provider
    ///
    /// Fails with [`AuthError::ConsentRequired`] when the file does not
    /// exist: the caller cannot be used until the login flow has run.
    pub fn open(config: &OAuth2Config, path: impl Into<PathBuf>) -> AuthResult<Self> {
        let path = path.into();
        let pair = TokenPair::load(&path)?;
        debug!("loaded token file {:?}", path);
        Ok(Self {
            client: config.build_client()?,
            path,
            cached: RwLock::new(pair),
        })
    }

    pub fn token_path(&self) -> &Path {
        &self.path
    }

    /// Return a currently valid access token, refreshing through the token
    /// endpoint when needed
    pub async fn access_token(&self) -> AuthResult<String> {
        {
            let pair = self.cached.read().await;
            if !pair.is_expired() {
                return Ok(pair.access_token.clone());
            }
        }

        let mut pair = self.cached.write().await;
        // another request may have refreshed while we waited for the lock
        if !pair.is_expired() {
            return Ok(pair.access_token.clone());
        }

        let refresh = pair
            .refresh_token
            .clone()
            .ok_or(AuthError::RefreshUnavailable)?;

        info!("access token expired, refreshing");
        let response = self
            .client
            .exchange_refresh_token(&RefreshToken::new(refresh.clone()))
            .request_async(oauth2::reqwest::async_http_client)
            .await
            .map_err(|e| AuthError::TokenExchangeFailed(e.to_string()))?;

        *pair = TokenPair::from_response(&response, Some(refresh));
        pair.save(&self.path)?;
        Ok(pair.access_token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_pair_expiry_window() {
        let fresh = TokenPair {
            access_token: "t".to_string(),
            refresh_token: None,
            expires_at: Some(chrono::Utc::now().timestamp() + 3600),
        };
        assert!(!fresh.is_expired());

        let nearly = TokenPair {
            access_token: "t".to_string(),
            refresh_token: None,
            expires_at: Some(chrono::Utc::now().timestamp() + 120),
        };
        assert!(nearly.is_expired());

        let unbounded = TokenPair {
            access_token: "t".to_string(),
            refresh_token: None,
            expires_at: None,
        };
        assert!(!unbounded.is_expired());
    }

    #[test]
    fn load_missing_file_demands_consent() {
        let dir = tempfile::tempdir().unwrap();
        let err = TokenPair::load(&dir.path().join("token.json")).unwrap_err();
        assert!(matches!(err, AuthError::ConsentRequired(_)));
    }

    #[test]
    fn load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        fs::write(&path, "not json").unwrap();
        let err = TokenPair::load(&path).unwrap_err();
        assert!(matches!(err, AuthError::TokenInvalid(_)));
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("token.json");
        let pair = TokenPair {
            access_token: "access".to_string(),
            refresh_token: Some("refresh".to_string()),
            expires_at: Some(1_900_000_000),
        };
        pair.save(&path).unwrap();

        let loaded = TokenPair::load(&path).unwrap();
        assert_eq!(loaded.access_token, "access");
        assert_eq!(loaded.refresh_token.as_deref(), Some("refresh"));
        assert_eq!(loaded.expires_at, Some(1_900_000_000));
    }
}
