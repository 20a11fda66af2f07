//! Error types for the auth module

use std::path::PathBuf;

use thiserror::Error;

/// Result type for auth operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Errors that can occur during authentication
#[derive(Debug, Error)]
pub enum AuthError {
    /// No token file exists; the interactive consent flow must run first
    #[error("no token file at {0}; run the login flow for this provider first")]
    ConsentRequired(PathBuf),

    /// Token file exists but cannot be parsed
    #[error("token file is not valid: {0}")]
    TokenInvalid(String),

    /// Access token expired and no refresh token is available
    #[error("access token expired and no refresh token is stored")]
    RefreshUnavailable,

    /// Token endpoint rejected the exchange or refresh
    #[error("token exchange failed: {0}")]
    TokenExchangeFailed(String),

    /// Authorization step failed or was denied
    #[error("authorization failed: {0}")]
    AuthorizationFailed(String),

    /// Local consent callback listener failed
    #[error("consent callback failed: {0}")]
    CallbackFailed(String),

    /// Invalid endpoint or redirect configuration
    #[error("invalid auth configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
