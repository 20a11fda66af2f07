//! Mailbridge - unified email provider API over HTTP/MCP
//!
//! Serves the nine-operation mail surface and the settings endpoints, with
//! provider clients selected per request. `mailbridge-server login <provider>`
//! runs the interactive consent flow and writes the provider's token file.

mod config;
mod factory;
mod mcp;
mod routes;

use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;
use mailbridge_auth::ConsentFlow;
use mailbridge_core::{Provider, SettingsStore};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::ServerConfig;
use crate::factory::ClientFactory;
use crate::routes::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("mailbridge=info".parse()?))
        .init();

    let config = ServerConfig::from_env();
    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("login") => {
            let provider = args
                .get(2)
                .context("usage: mailbridge-server login <google|outlook>")?;
            let provider = Provider::from_str(provider).map_err(anyhow::Error::msg)?;
            login(&config, provider).await
        }
        _ => serve(config).await,
    }
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let listen_addr = config.listen_addr.clone();
    let settings = SettingsStore::new(config.settings_file.clone());
    let state = Arc::new(AppState {
        factory: ClientFactory::new(config),
        settings,
    });

    let app = routes::router(state);
    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("cannot bind {listen_addr}"))?;
    tracing::info!("mailbridge listening on http://{listen_addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

/// Run the interactive consent flow and persist the provider's token file
async fn login(config: &ServerConfig, provider: Provider) -> anyhow::Result<()> {
    let oauth = config
        .oauth_config(provider)
        .with_context(|| format!("provider '{provider}' is not configured"))?;
    let token_file = config
        .credentials(provider)
        .map(|c| c.token_file.clone())
        .with_context(|| format!("provider '{provider}' is not configured"))?;

    let mut flow = ConsentFlow::new(&oauth)?;
    println!("Open this URL to authorize {provider}:\n\n{}\n", flow.authorize_url());
    println!("Waiting for the provider to redirect back...");

    let pair = flow.wait_for_grant().await?;
    pair.save(&token_file)?;
    println!("Token saved to {}", token_file.display());
    Ok(())
}
