//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::catalog::QuerySession;
use crate::config::StorefrontConfig;
use crate::marketplace::MarketplaceClient;

/// How long an idle catalog query session survives before eviction.
const CATALOG_SESSION_IDLE: Duration = Duration::from_secs(30 * 60);

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the API client and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    marketplace: MarketplaceClient,
    /// One catalog query session per visitor, keyed by the session-scoped
    /// id. Eviction drops the session, which aborts its timers and any
    /// in-flight request.
    catalog_sessions: Cache<Uuid, Arc<Mutex<QuerySession>>>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let marketplace = MarketplaceClient::new(&config.marketplace);
        let catalog_sessions = Cache::builder()
            .max_capacity(10_000)
            .time_to_idle(CATALOG_SESSION_IDLE)
            .build();

        Self {
            inner: Arc::new(AppStateInner {
                config,
                marketplace,
                catalog_sessions,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the marketplace API client.
    #[must_use]
    pub fn marketplace(&self) -> &MarketplaceClient {
        &self.inner.marketplace
    }

    /// Get (or create) the catalog query session for a visitor.
    pub async fn catalog_session(&self, key: Uuid) -> Arc<Mutex<QuerySession>> {
        let client = self.inner.marketplace.clone();
        self.inner
            .catalog_sessions
            .get_with(key, async move {
                Arc::new(Mutex::new(QuerySession::new(client)))
            })
            .await
    }
}
