//! Applies the ticketing schema to the configured Postgres database.

use std::process::ExitCode;

use booking::BookingConfig;
use ticket_store::PostgresTicketStore;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> ExitCode {
    let config = BookingConfig::from_env();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let Some(url) = config.database_url.as_deref() else {
        tracing::error!("DATABASE_URL is not set");
        return ExitCode::FAILURE;
    };

    let store = match PostgresTicketStore::connect(url, config.max_connections).await {
        Ok(store) => store,
        Err(err) => {
            tracing::error!(error = %err, "failed to connect");
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = store.run_migrations().await {
        tracing::error!(error = %err, "migration failed");
        return ExitCode::FAILURE;
    }

    tracing::info!("migrations applied");
    ExitCode::SUCCESS
}
