//! Provider client construction and lifecycle
//!
//! The two provider clients form a closed variant set behind the shared
//! capability trait, selected by provider identifier per request. The
//! factory builds a client the first time its provider is requested and
//! caches it for the life of the process; construction failures (missing
//! configuration, absent token file) surface to the caller outside the
//! envelope contract.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use mailbridge_auth::{AuthError, TokenStore};
use mailbridge_core::{EmailProvider, Envelope, LabelAction, Provider, SearchFilters};
use mailbridge_gmail::GmailClient;
use mailbridge_graph::OutlookClient;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;

use crate::config::ServerConfig;

/// The closed set of provider clients
pub enum MailClient {
    Gmail(GmailClient),
    Outlook(OutlookClient),
}

impl std::fmt::Debug for MailClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MailClient::Gmail(_) => f.write_str("MailClient::Gmail"),
            MailClient::Outlook(_) => f.write_str("MailClient::Outlook"),
        }
    }
}

#[async_trait]
impl EmailProvider for MailClient {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Envelope {
        match self {
            MailClient::Gmail(client) => client.send_email(to, subject, body).await,
            MailClient::Outlook(client) => client.send_email(to, subject, body).await,
        }
    }

    async fn draft_email(&self, to: &str, subject: &str, body: &str) -> Envelope {
        match self {
            MailClient::Gmail(client) => client.draft_email(to, subject, body).await,
            MailClient::Outlook(client) => client.draft_email(to, subject, body).await,
        }
    }

    async fn send_draft(&self, draft_id: &str) -> Envelope {
        match self {
            MailClient::Gmail(client) => client.send_draft(draft_id).await,
            MailClient::Outlook(client) => client.send_draft(draft_id).await,
        }
    }

    async fn search_emails(&self, filters: &SearchFilters) -> Envelope {
        match self {
            MailClient::Gmail(client) => client.search_emails(filters).await,
            MailClient::Outlook(client) => client.search_emails(filters).await,
        }
    }

    async fn read_emails(&self, max_results: u32, days_back: i64) -> Envelope {
        match self {
            MailClient::Gmail(client) => client.read_emails(max_results, days_back).await,
            MailClient::Outlook(client) => client.read_emails(max_results, days_back).await,
        }
    }

    async fn reply_to_email(&self, msg_id: &str, body: &str) -> Envelope {
        match self {
            MailClient::Gmail(client) => client.reply_to_email(msg_id, body).await,
            MailClient::Outlook(client) => client.reply_to_email(msg_id, body).await,
        }
    }

    async fn delete_email(&self, msg_id: &str) -> Envelope {
        match self {
            MailClient::Gmail(client) => client.delete_email(msg_id).await,
            MailClient::Outlook(client) => client.delete_email(msg_id).await,
        }
    }

    async fn archive_email(&self, msg_id: &str) -> Envelope {
        match self {
            MailClient::Gmail(client) => client.archive_email(msg_id).await,
            MailClient::Outlook(client) => client.archive_email(msg_id).await,
        }
    }

    async fn toggle_label(&self, msg_id: &str, label: &str, action: LabelAction) -> Envelope {
        match self {
            MailClient::Gmail(client) => client.toggle_label(msg_id, label, action).await,
            MailClient::Outlook(client) => client.toggle_label(msg_id, label, action).await,
        }
    }
}

/// Client construction failures, reported outside the envelope contract
#[derive(Debug, Error)]
pub enum FactoryError {
    #[error("provider '{0}' is not configured; set its client id and token file")]
    NotConfigured(Provider),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Builds provider clients on demand and caches them per provider
pub struct ClientFactory {
    config: ServerConfig,
    cache: RwLock<HashMap<Provider, Arc<MailClient>>>,
}

impl ClientFactory {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve the client for a provider, constructing it on first use
    pub async fn client(&self, provider: Provider) -> Result<Arc<MailClient>, FactoryError> {
        if let Some(client) = self.cache.read().await.get(&provider) {
            return Ok(client.clone());
        }

        let mut cache = self.cache.write().await;
        // another request may have built the client while we waited
        if let Some(client) = cache.get(&provider) {
            return Ok(client.clone());
        }

        let client = Arc::new(self.build(provider)?);
        cache.insert(provider, client.clone());
        info!("constructed {} client", provider);
        Ok(client)
    }

    fn build(&self, provider: Provider) -> Result<MailClient, FactoryError> {
        let oauth = self
            .config
            .oauth_config(provider)
            .ok_or(FactoryError::NotConfigured(provider))?;
        let credentials = self
            .config
            .credentials(provider)
            .ok_or(FactoryError::NotConfigured(provider))?;
        let tokens = TokenStore::open(&oauth, &credentials.token_file)?;

        Ok(match provider {
            Provider::Google => MailClient::Gmail(GmailClient::new(tokens)),
            Provider::Outlook => MailClient::Outlook(OutlookClient::new(tokens)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn bare_config() -> ServerConfig {
        ServerConfig {
            listen_addr: "127.0.0.1:0".to_string(),
            settings_file: PathBuf::from("settings.json"),
            redirect_port: 1,
            google: None,
            microsoft: None,
        }
    }

    #[tokio::test]
    async fn unconfigured_provider_is_rejected() {
        let factory = ClientFactory::new(bare_config());
        let err = factory.client(Provider::Google).await.unwrap_err();
        assert!(matches!(err, FactoryError::NotConfigured(Provider::Google)));
    }

    #[tokio::test]
    async fn configured_provider_without_token_file_demands_consent() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = bare_config();
        config.microsoft = Some(crate::config::ProviderCredentials {
            client_id: "client".to_string(),
            client_secret: None,
            token_file: dir.path().join("missing-token.json"),
        });

        let factory = ClientFactory::new(config);
        let err = factory.client(Provider::Outlook).await.unwrap_err();
        assert!(matches!(
            err,
            FactoryError::Auth(AuthError::ConsentRequired(_))
        ));
    }
}
