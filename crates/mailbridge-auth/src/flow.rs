//! Interactive OAuth2 consent flow (authorization code + PKCE)
//!
//! Used by the `login` subcommand to mint the initial token file for a
//! provider. The flow prints an authorization URL, listens on a loopback
//! port for the provider's redirect, verifies the CSRF state, and exchanges
//! the code for a token pair.

use oauth2::basic::BasicClient;
use oauth2::{AuthorizationCode, CsrfToken, PkceCodeChallenge, PkceCodeVerifier, Scope};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::config::OAuth2Config;
use crate::error::{AuthError, AuthResult};
use crate::token::TokenPair;

/// One interactive authorization attempt
pub struct ConsentFlow {
    client: BasicClient,
    scopes: Vec<String>,
    redirect_port: u16,
    pkce_verifier: Option<PkceCodeVerifier>,
    csrf_token: Option<CsrfToken>,
}

impl ConsentFlow {
    pub fn new(config: &OAuth2Config) -> AuthResult<Self> {
        Ok(Self {
            client: config.build_client()?,
            scopes: config.scopes.clone(),
            redirect_port: config.redirect_port,
            pkce_verifier: None,
            csrf_token: None,
        })
    }

    /// Generate the URL the user must open to grant consent
    pub fn authorize_url(&mut self) -> String {
        let (challenge, verifier) = PkceCodeChallenge::new_random_sha256();

        let mut request = self
            .client
            .authorize_url(CsrfToken::new_random)
            .set_pkce_challenge(challenge);
        for scope in &self.scopes {
            request = request.add_scope(Scope::new(scope.clone()));
        }
        let (url, csrf) = request.url();

        self.pkce_verifier = Some(verifier);
        self.csrf_token = Some(csrf);
        url.to_string()
    }

    /// Wait for the provider redirect on the loopback port and exchange the
    /// authorization code for a token pair
    pub async fn wait_for_grant(&mut self) -> AuthResult<TokenPair> {
        let verifier = self
            .pkce_verifier
            .take()
            .ok_or_else(|| AuthError::InvalidConfig("authorize_url was not called".into()))?;
        let csrf = self
            .csrf_token
            .take()
            .ok_or_else(|| AuthError::InvalidConfig("authorize_url was not called".into()))?;

        let listener = TcpListener::bind(("127.0.0.1", self.redirect_port))
            .await
            .map_err(|e| AuthError::CallbackFailed(e.to_string()))?;
        info!("waiting for consent callback on port {}", self.redirect_port);

        let (stream, _) = listener
            .accept()
            .await
            .map_err(|e| AuthError::CallbackFailed(e.to_string()))?;

        let mut stream = BufReader::new(stream);
        let mut request_line = String::new();
        stream
            .read_line(&mut request_line)
            .await
            .map_err(|e| AuthError::CallbackFailed(e.to_string()))?;
        debug!("consent callback: {}", request_line.trim());

        let (code, state) = match parse_callback(&request_line) {
            Ok(parsed) => parsed,
            Err(err) => {
                respond(stream.get_mut(), "Authorization failed").await;
                return Err(err);
            }
        };

        if state != *csrf.secret() {
            respond(stream.get_mut(), "Authorization failed").await;
            return Err(AuthError::AuthorizationFailed("state mismatch".into()));
        }

        respond(
            stream.get_mut(),
            "Authorization complete. You can close this tab.",
        )
        .await;

        let response = self
            .client
            .exchange_code(AuthorizationCode::new(code))
            .set_pkce_verifier(verifier)
            .request_async(oauth2::reqwest::async_http_client)
            .await
            .map_err(|e| AuthError::TokenExchangeFailed(e.to_string()))?;

        Ok(TokenPair::from_response(&response, None))
    }
}

/// Extract the code and state parameters from the callback request line
/// ("GET /callback?code=...&state=... HTTP/1.1")
fn parse_callback(request_line: &str) -> AuthResult<(String, String)> {
    let path = request_line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| AuthError::AuthorizationFailed("malformed callback request".into()))?;
    let url = url::Url::parse(&format!("http://127.0.0.1{path}"))
        .map_err(|e| AuthError::AuthorizationFailed(format!("malformed callback URL: {e}")))?;

    let mut code = None;
    let mut state = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => {
                let description = url
                    .query_pairs()
                    .find(|(k, _)| k == "error_description")
                    .map(|(_, v)| v.into_owned())
                    .unwrap_or_else(|| value.into_owned());
                return Err(AuthError::AuthorizationFailed(description));
            }
            _ => {}
        }
    }

    code.zip(state)
        .ok_or_else(|| AuthError::AuthorizationFailed("callback missing code or state".into()))
}

async fn respond(stream: &mut tokio::net::TcpStream, message: &str) {
    let body = format!("<html><body><p>{message}</p></body></html>");
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\n\r\n{}",
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.flush().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_code_and_state() {
        let (code, state) =
            parse_callback("GET /callback?code=abc&state=xyz HTTP/1.1").unwrap();
        assert_eq!(code, "abc");
        assert_eq!(state, "xyz");
    }

    #[test]
    fn surfaces_provider_error_description() {
        let err = parse_callback(
            "GET /callback?error=access_denied&error_description=user+said+no HTTP/1.1",
        )
        .unwrap_err();
        assert!(err.to_string().contains("user said no"));
    }

    #[test]
    fn rejects_callback_without_code() {
        let err = parse_callback("GET /callback?state=xyz HTTP/1.1").unwrap_err();
        assert!(matches!(err, AuthError::AuthorizationFailed(_)));
    }
}
