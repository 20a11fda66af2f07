use mailbridge_auth::AuthError;
use mailbridge_core::FilterDateError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GmailError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Gmail API error {status}: {body}")]
    ApiError { status: u16, body: String },

    #[error("failed to parse response: {0}")]
    ParseError(String),

    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error(transparent)]
    InvalidDate(#[from] FilterDateError),

    /// Operation-level rejection reported verbatim to the caller
    /// (unknown label, no-op toggle, ...)
    #[error("{0}")]
    Operation(String),
}

pub type GmailResult<T> = Result<T, GmailError>;
