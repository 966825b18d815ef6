//! Engine configuration loaded from environment variables.

use std::sync::Arc;

use ticket_store::{InMemoryTicketStore, PostgresTicketStore, TicketStore};

/// What happens to an order's total when one of its tickets is rebooked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RebookTotalPolicy {
    /// The total stays at what was originally charged.
    #[default]
    KeepOriginal,
    /// The total becomes the sum of the order's ACTIVE ticket prices.
    Recompute,
}

impl RebookTotalPolicy {
    /// Parses `keep` or `recompute`, ignoring case.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "keep" | "keep_original" => Some(RebookTotalPolicy::KeepOriginal),
            "recompute" => Some(RebookTotalPolicy::Recompute),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RebookTotalPolicy::KeepOriginal => "keep",
            RebookTotalPolicy::Recompute => "recompute",
        }
    }
}

/// Engine configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `DATABASE_URL`: Postgres connection string (default: none, in-memory store)
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: `5`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `REBOOK_TOTAL_POLICY`: `keep` or `recompute` (default: `keep`)
#[derive(Debug, Clone)]
pub struct BookingConfig {
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub log_level: String,
    pub rebook_total_policy: RebookTotalPolicy,
}

impl BookingConfig {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    ///
    /// Missing or unparsable values fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            max_connections: lookup("DATABASE_MAX_CONNECTIONS")
                .and_then(|n| n.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_connections),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            rebook_total_policy: lookup("REBOOK_TOTAL_POLICY")
                .and_then(|policy| RebookTotalPolicy::parse(&policy))
                .unwrap_or(defaults.rebook_total_policy),
        }
    }

    /// Opens the configured store: Postgres when a URL is set, memory otherwise.
    ///
    /// Migrations are applied to a freshly connected Postgres store.
    pub async fn open_store(&self) -> ticket_store::Result<Arc<dyn TicketStore>> {
        match &self.database_url {
            Some(url) => {
                let store = PostgresTicketStore::connect(url, self.max_connections).await?;
                store.run_migrations().await?;
                tracing::info!(max_connections = self.max_connections, "using postgres store");
                Ok(Arc::new(store))
            }
            None => {
                tracing::info!("DATABASE_URL not set, using in-memory store");
                Ok(Arc::new(InMemoryTicketStore::new()))
            }
        }
    }
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            max_connections: 5,
            log_level: "info".to_string(),
            rebook_total_policy: RebookTotalPolicy::KeepOriginal,
        }
    }
}
