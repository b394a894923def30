use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use kairos_datasource::config::DatasourceConfig;
use kairos_datasource::datasource::Datasource;
use kairos_datasource::kairos_client::HttpKairosClient;
use kairos_datasource::{AppState, router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("kairos_datasource=debug,tower_http=debug")
        }))
        .init();

    let config_path = std::env::var("KAIROS_DATASOURCE_CONFIG")
        .unwrap_or_else(|_| "./kairos-datasource.toml".to_string());
    let mut config = DatasourceConfig::load(&config_path)?;
    config.apply_env();

    let client = HttpKairosClient::new(&config.kairosdb)?;
    let kairosdb_endpoint = client.endpoint().to_string();
    tracing::info!("forwarding queries to {kairosdb_endpoint}");

    let datasource =
        Datasource::new(Arc::new(client)).with_deadline(config.dispatch.deadline());

    let state = AppState {
        datasource,
        kairosdb_endpoint,
    };

    let addr: SocketAddr = config.server.listen_addr.parse()?;
    tracing::info!("kairos-datasource listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}
