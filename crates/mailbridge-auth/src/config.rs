//! OAuth2 endpoint configuration and provider presets

use oauth2::basic::BasicClient;
use oauth2::{AuthUrl, ClientId, ClientSecret, RedirectUrl, TokenUrl};

use crate::error::{AuthError, AuthResult};

/// OAuth2 provider configuration
#[derive(Debug, Clone)]
pub struct OAuth2Config {
    /// OAuth2 client ID
    pub client_id: String,
    /// OAuth2 client secret (optional for native apps using PKCE)
    pub client_secret: Option<String>,
    /// Authorization endpoint URL
    pub auth_url: String,
    /// Token endpoint URL
    pub token_url: String,
    /// Requested scopes
    pub scopes: Vec<String>,
    /// Local port for the consent callback listener
    pub redirect_port: u16,
}

impl OAuth2Config {
    /// Redirect URI registered with the provider for the loopback callback
    pub fn redirect_uri(&self) -> String {
        format!("http://127.0.0.1:{}/callback", self.redirect_port)
    }

    /// Build the oauth2 client for this configuration
    pub(crate) fn build_client(&self) -> AuthResult<BasicClient> {
        let auth_url = AuthUrl::new(self.auth_url.clone())
            .map_err(|e| AuthError::InvalidConfig(format!("invalid auth URL: {e}")))?;
        let token_url = TokenUrl::new(self.token_url.clone())
            .map_err(|e| AuthError::InvalidConfig(format!("invalid token URL: {e}")))?;
        let redirect_url = RedirectUrl::new(self.redirect_uri())
            .map_err(|e| AuthError::InvalidConfig(format!("invalid redirect URL: {e}")))?;

        Ok(BasicClient::new(
            ClientId::new(self.client_id.clone()),
            self.client_secret.clone().map(ClientSecret::new),
            auth_url,
            Some(token_url),
        )
        .set_redirect_uri(redirect_url))
    }
}

/// Google endpoints and Gmail scopes
pub fn google_config(
    client_id: &str,
    client_secret: Option<&str>,
    redirect_port: u16,
) -> OAuth2Config {
    OAuth2Config {
        client_id: client_id.to_string(),
        client_secret: client_secret.map(str::to_string),
        auth_url: "https://accounts.google.com/o/oauth2/auth".to_string(),
        token_url: "https://oauth2.googleapis.com/token".to_string(),
        scopes: vec![
            "https://mail.google.com/".to_string(),
            "https://www.googleapis.com/auth/gmail.send".to_string(),
            "https://www.googleapis.com/auth/gmail.labels".to_string(),
            "https://www.googleapis.com/auth/gmail.modify".to_string(),
        ],
        redirect_port,
    }
}

/// Microsoft identity platform endpoints and Graph mail scopes
pub fn microsoft_config(
    client_id: &str,
    client_secret: Option<&str>,
    redirect_port: u16,
) -> OAuth2Config {
    OAuth2Config {
        client_id: client_id.to_string(),
        client_secret: client_secret.map(str::to_string),
        auth_url: "https://login.microsoftonline.com/common/oauth2/v2.0/authorize".to_string(),
        token_url: "https://login.microsoftonline.com/common/oauth2/v2.0/token".to_string(),
        scopes: vec![
            "https://graph.microsoft.com/Mail.ReadWrite".to_string(),
            "https://graph.microsoft.com/Mail.Send".to_string(),
            "offline_access".to_string(),
        ],
        redirect_port,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_uri_uses_loopback_and_port() {
        let config = google_config("id", None, 18923);
        assert_eq!(config.redirect_uri(), "http://127.0.0.1:18923/callback");
    }

    #[test]
    fn presets_request_mail_scopes() {
        let google = google_config("id", Some("secret"), 1);
        assert!(google.scopes.iter().any(|s| s.contains("gmail.modify")));

        let microsoft = microsoft_config("id", None, 1);
        assert!(microsoft.scopes.iter().any(|s| s.ends_with("Mail.Send")));
        assert!(microsoft.scopes.contains(&"offline_access".to_string()));
    }
}
