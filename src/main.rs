use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use promptrelay::config::Config;
use promptrelay::provider::{AnyProvider, Provider};
use promptrelay::relay::Relay;
use promptrelay::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before the subscriber so RUST_LOG from the file is honored.
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // A missing .env is normal in production; real env vars still apply.
    if let Some(e) = dotenv.err().filter(|e| !e.not_found()) {
        tracing::warn!("failed to load .env: {e}");
    }

    let config = Config::load()
        .inspect_err(|e| tracing::error!("startup aborted: {e}"))?;

    let provider = AnyProvider::from_config(&config)?;
    let provider_name = provider.name();
    let relay = Arc::new(Relay::new(provider, config.sampling.clone(), config.retry));

    let frontend_dir = config.production.then_some(config.frontend_dir.as_path());
    let app = server::router(relay, frontend_dir);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;

    tracing::info!("server is running at http://localhost:{}", config.port);
    tracing::info!("environment: {}", config.environment);
    tracing::info!("provider: {provider_name} ({})", config.sampling.model);
    tracing::info!("api key configured: {}", !config.api_key.is_empty());
    match frontend_dir {
        Some(dir) => tracing::info!("frontend path: {}", dir.display()),
        None => tracing::info!("frontend path: development mode (not served)"),
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(server::shutdown_signal())
        .await?;

    tracing::info!("promptrelay shutting down");
    Ok(())
}
