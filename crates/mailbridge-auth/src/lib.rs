//! Authentication for Mailbridge providers
//!
//! OAuth2 authorization-code flow with PKCE for interactive consent, plus a
//! token store that persists access/refresh token pairs to a JSON file and
//! refreshes them on demand. Configuration failures (absent token file,
//! consent never granted) surface here, at construction time, before any
//! provider operation runs.

mod config;
mod error;
mod flow;
mod token;

pub use config::{google_config, microsoft_config, OAuth2Config};
pub use error::{AuthError, AuthResult};
pub use flow::ConsentFlow;
pub use token::{TokenPair, TokenStore};
