use anyhow::Context;

use showcase_api::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    showcase_observability::init();

    let config = AppConfig::from_env().context("failed to load configuration")?;
    tracing::info!(token = ?config.token, upload_dir = %config.upload_dir.display(), "configuration loaded");

    let app = showcase_api::app::build_app(&config)
        .await
        .context("failed to initialize services")?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
