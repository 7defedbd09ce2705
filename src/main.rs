use dotenvy::dotenv;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use wallet_point::{
    config::{
        database::{create_connection, create_tables},
        settings::load_default_settings,
    },
    core::report::reconcile_all,
    errors::Result,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal since env vars can be set externally
    dotenv().ok();

    // 3. Ledger policy
    let settings = load_default_settings()
        .inspect_err(|e| error!("Failed to load settings: {}", e))?;
    info!(
        ttl_minutes = settings.tokens.ttl_minutes,
        fallback = ?settings.tokens.fallback_recipient,
        "Token policy loaded"
    );

    // 4. Connect and make sure every table exists
    let db = create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Audit: every balance must equal its ledger
    let reports = reconcile_all(&db).await?;
    let drifted = reports.iter().filter(|r| !r.is_consistent()).count();
    if drifted == 0 {
        info!(wallets = reports.len(), "Ledger reconciled");
    } else {
        warn!(
            wallets = reports.len(),
            drifted, "Ledger reconciliation found inconsistent wallets"
        );
    }

    Ok(())
}
