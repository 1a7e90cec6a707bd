use anyhow::Result;
use reno_config::Config;
use reno_server::ApiServer;
use std::sync::Arc;

pub async fn handle(config: &Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    let market = super::marketplace(config).await?;

    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    println!("Starting API server on {}:{}", host, port);
    ApiServer::serve(Arc::new(market), &host, port).await
}
