use anyhow::Context;
use tracing_subscriber::EnvFilter;

use agro_recommender::{artifacts, config::ServerConfig, server, session::SessionStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = ServerConfig::from_env().context("invalid configuration")?;

    // Any missing artifact halts here, before the listener is bound.
    let facade = artifacts::load_facade(&cfg.artifact_dir)
        .with_context(|| {
            format!(
                "failed to load model artifacts from {}; regenerate them with the training notebook",
                cfg.artifact_dir.display()
            )
        })?
        .with_feature_logging(cfg.log_predictions);

    tracing::info!(
        "crop options[{}]: {:?}",
        facade.crop_options().len(),
        facade.crop_options()
    );

    let sessions = SessionStore::new(cfg.session_idle(), cfg.max_sessions);
    tracing::info!(
        "sessions expire after {}s idle (max {})",
        cfg.session_idle_secs,
        cfg.max_sessions
    );
    let app = server::router(server::AppState::with_sessions(facade, sessions));

    let addr = cfg.socket_addr();
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
