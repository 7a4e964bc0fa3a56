use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use petition_api::auth::{AppState, AppStateInner};
use petition_server::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "petition=debug,petition_server=info,petition_api=debug,petition_db=info,tower_http=debug".into()),
        )
        .init();

    let config = Config::load()?;

    // Init database
    let db = petition_db::Database::open(&config.db_path)?;

    // Shared state
    let state: AppState = Arc::new(AppStateInner {
        db,
        login_ttl: config.sessions.ttl,
    });

    let app = petition_api::router(state, &config.sessions);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Server running at http://{}/", addr);
    info!("Sign-ins last {} from login", config.sessions.ttl);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
