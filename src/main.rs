use std::sync::Arc;

use sqlx::sqlite::SqlitePoolOptions;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use opsclad::api::router;
use opsclad::config::AppConfig;
use opsclad::services::SessionRefresher;
use opsclad::state::AppState;
use opsclad::supabase::{SupabaseClient, SupabaseHttpClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "opsclad=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let config = AppConfig::new_from_env()?;

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let backend: Arc<dyn SupabaseClient> = Arc::new(SupabaseHttpClient::new(config.supabase.clone())?);
    let state = AppState::new(pool.clone(), backend);

    match state.session.restore().await {
        Ok(Some(session)) => info!("Restored session for {}", session.user.email),
        Ok(None) => info!("No stored session, sign in required"),
        Err(e) => warn!("Failed to restore session: {}", e),
    }

    let refresher = SessionRefresher::new(state.session.clone(), config.session_refresh_secs);
    tokio::spawn(refresher.start());

    let app = router(state);

    info!("listening on http://{}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
