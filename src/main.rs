use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use salon_booking::config::AppConfig;
use salon_booking::db;
use salon_booking::handlers;
use salon_booking::services::accounts;
use salon_booking::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env()?;

    let conn = db::init_db(&config.database_url)?;

    if config.seed_services {
        db::seed::seed_services(&conn)?;
    }

    match (&config.admin_email, &config.admin_password) {
        (Some(email), Some(password)) => {
            accounts::ensure_admin(&conn, email, password, config.bcrypt_cost)
                .map_err(|e| anyhow::anyhow!("failed to bootstrap admin account: {e}"))?;
        }
        (Some(_), None) | (None, Some(_)) => {
            tracing::warn!("ADMIN_EMAIL and ADMIN_PASSWORD must both be set; skipping admin bootstrap");
        }
        (None, None) => {}
    }

    tracing::info!(
        open_hour = config.salon_hours.open_hour,
        close_hour = config.salon_hours.close_hour,
        granularity = config.salon_hours.slot_granularity_minutes,
        policy = ?config.overlap_policy,
        "salon hours configured"
    );

    let addr = format!("0.0.0.0:{}", config.port);
    let state = Arc::new(AppState::new(conn, config));
    let app = handlers::router(state);

    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
