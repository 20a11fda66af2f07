//! Environment-supplied server configuration
//!
//! Each provider is optional: it becomes usable when its client id and
//! token-file path are present. Missing configuration surfaces when a
//! request first selects that provider, not at startup.

use std::env;
use std::path::PathBuf;

use mailbridge_auth::{google_config, microsoft_config, OAuth2Config};
use mailbridge_core::Provider;

/// OAuth client identity and token-file location for one provider
#[derive(Debug, Clone)]
pub struct ProviderCredentials {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub token_file: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP facade listens on
    pub listen_addr: String,
    /// Path of the persisted email settings document
    pub settings_file: PathBuf,
    /// Loopback port for the interactive consent flow
    pub redirect_port: u16,
    pub google: Option<ProviderCredentials>,
    pub microsoft: Option<ProviderCredentials>,
}

impl ServerConfig {
    /// Assemble the configuration from `MAILBRIDGE_*` environment variables
    pub fn from_env() -> Self {
        Self {
            listen_addr: env::var("MAILBRIDGE_LISTEN_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            settings_file: env::var("MAILBRIDGE_SETTINGS_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("email_settings.json")),
            redirect_port: env::var("MAILBRIDGE_REDIRECT_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8765),
            google: provider_credentials("MAILBRIDGE_GOOGLE"),
            microsoft: provider_credentials("MAILBRIDGE_MS"),
        }
    }

    pub fn credentials(&self, provider: Provider) -> Option<&ProviderCredentials> {
        match provider {
            Provider::Google => self.google.as_ref(),
            Provider::Outlook => self.microsoft.as_ref(),
        }
    }

    /// OAuth endpoint configuration for a configured provider
    pub fn oauth_config(&self, provider: Provider) -> Option<OAuth2Config> {
        let credentials = self.credentials(provider)?;
        let config = match provider {
            Provider::Google => google_config(
                &credentials.client_id,
                credentials.client_secret.as_deref(),
                self.redirect_port,
            ),
            Provider::Outlook => microsoft_config(
                &credentials.client_id,
                credentials.client_secret.as_deref(),
                self.redirect_port,
            ),
        };
        Some(config)
    }
}

fn provider_credentials(prefix: &str) -> Option<ProviderCredentials> {
    let client_id = env::var(format!("{prefix}_CLIENT_ID")).ok()?;
    let token_file = env::var(format!("{prefix}_TOKEN_FILE")).ok()?;
    Some(ProviderCredentials {
        client_id,
        client_secret: env::var(format!("{prefix}_CLIENT_SECRET")).ok(),
        token_file: PathBuf::from(token_file),
    })
}
