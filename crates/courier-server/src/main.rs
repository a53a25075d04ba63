use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use courier_api::{AppState, AppStateInner};
use courier_store::{AuthConfig, MessageStore, SessionIssuer, UserStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "courier=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let signing_secret =
        std::env::var("COURIER_SIGNING_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("COURIER_DB_PATH").unwrap_or_else(|_| "courier.db".into());
    let host = std::env::var("COURIER_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("COURIER_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let work_factor: u32 = match std::env::var("COURIER_WORK_FACTOR") {
        Ok(raw) => raw.parse()?,
        Err(_) => courier_store::password::DEFAULT_WORK_FACTOR,
    };
    // Tokens are issued without an expiry unless a TTL is configured
    let token_ttl = match std::env::var("COURIER_TOKEN_TTL_SECS") {
        Ok(raw) => Some(chrono::Duration::seconds(raw.parse()?)),
        Err(_) => None,
    };

    let config = AuthConfig {
        work_factor,
        signing_secret,
        token_ttl,
    };

    // Init database
    let db = Arc::new(courier_db::Database::open(&PathBuf::from(&db_path))?);

    // Shared state
    let state: AppState = Arc::new(AppStateInner {
        users: UserStore::new(db.clone(), &config)?,
        messages: MessageStore::new(db),
        issuer: SessionIssuer::new(&config),
    });

    let app = courier_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Courier server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
