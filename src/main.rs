use std::sync::Arc;

use anyhow::Context;

use inbox_tasks::config::ServiceConfig;
use inbox_tasks::server::{build_handler, routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = ServiceConfig::from_env().context("failed to load configuration")?;

    eprintln!("📬 Inbox Tasks v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", config.llm.model);
    eprintln!("   Task service: {}", config.sink.base_url);
    eprintln!("   Mapped addresses: {}", config.credentials.len());
    eprintln!("   Request timeout: {}s", config.request_timeout.as_secs());
    eprintln!("   Inbound: http://{}/inbound\n", config.bind_addr);

    let handler = Arc::new(build_handler(&config)?);
    let app = routes(handler);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!(addr = %config.bind_addr, "Inbound webhook server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutting down");
        })
        .await?;

    Ok(())
}
