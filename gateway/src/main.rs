//! Vaultonic Gateway

mod config;
mod error;
mod middleware;
mod routing;
mod secrets;
mod shutdown;
#[cfg(test)]
mod test_support;

use anyhow::Context;
use vaultonic_telemetry::{init_metrics, init_tracing};
use tracing::info;

use crate::config::{config_dir, GatewayConfig};
use crate::middleware::VaultLayer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // 加载配置
    let config = GatewayConfig::load(&config_dir()).context("Failed to load configuration")?;

    // 初始化 tracing
    init_tracing(&config.telemetry.log_level, config.json_logs());
    info!(
        app_name = %config.app_name,
        app_env = %config.app_env,
        "Runtime initialized"
    );

    let metrics = init_metrics().context("Failed to install Prometheus recorder")?;

    // 登录失败直接终止启动
    let vault = VaultLayer::connect(config.vault.clone())
        .await
        .context("Failed to establish Vault session")?;

    let app = routing::app(vault, Some(metrics));

    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!(%addr, "Starting gateway");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown::shutdown_signal())
        .await?;

    Ok(())
}
