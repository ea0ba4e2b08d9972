pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod invoices;
pub mod models;
pub mod patients;
pub mod prescriptions;

use tracing_subscriber::EnvFilter;

use crate::api::ApiContext;

/// Start the clinic API server. Blocks until shutdown.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    std::fs::create_dir_all(config::app_data_dir())?;
    let db_path = config::database_path();
    let conn = db::open_database(&db_path)?;
    tracing::info!(path = %db_path.display(), "database open");

    let auth_cfg = auth::AuthConfig::new(config::token_secret());
    auth::seed_admin(&conn, &auth_cfg)?;

    let ctx = ApiContext::new(conn, auth_cfg);
    api::server::serve(config::bind_addr(), ctx).await?;

    Ok(())
}
