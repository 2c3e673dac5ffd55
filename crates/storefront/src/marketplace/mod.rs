//! Marketplace REST API client.
//!
//! Plain REST over `reqwest`: JSON in, JSON out. Stable reads (monture
//! detail, opticien profiles, filter facets, stats) are cached with `moka`
//! (5-minute TTL); the catalog list endpoint is never cached because the
//! query engine already suppresses redundant fetches.
//!
//! # Example
//!
//! ```rust,ignore
//! use lunetier_storefront::marketplace::MarketplaceClient;
//!
//! let client = MarketplaceClient::new(&config.marketplace);
//!
//! let monture = client.monture(MontureId::new(3)).await?;
//! let page = client.list_montures(&ListParams::default()).await?;
//! ```

mod cache;
pub mod params;
pub mod types;

pub use params::{ListParams, PAGE_SIZE, SortKey, SortOrder};
pub use types::*;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use lunetier_core::{MontureId, OpticienId};

use crate::config::MarketplaceConfig;
use cache::CacheValue;

/// Fallback message when the backend gives us nothing usable.
const GENERIC_ERROR: &str = "Une erreur est survenue lors de la communication avec le serveur.";

/// Errors that can occur when talking to the marketplace API.
#[derive(Debug, thiserror::Error)]
pub enum MarketplaceError {
    /// HTTP transport failed (connection refused, timeout, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api {
        status: StatusCode,
        message: String,
    },

    /// JSON decoding of a success response failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or rejected bearer token.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

impl MarketplaceError {
    /// Human-readable message for the UI.
    ///
    /// Prefers whatever the backend put in its error body; transport and
    /// decode failures fall back to generic wording.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Http(_) => "Impossible de contacter le serveur. Veuillez réessayer.".to_owned(),
            Self::Api { message, .. } | Self::Unauthorized(message) => message.clone(),
            Self::Parse(_) => GENERIC_ERROR.to_owned(),
            Self::NotFound(_) => "Cette ressource n'existe pas ou n'est plus disponible.".to_owned(),
        }
    }
}

/// Extract a readable message from an error response body.
///
/// The backend answers errors as `{"message": "..."}` (sometimes `"error"`);
/// anything else falls back to the generic wording.
fn extract_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("message")
                .or_else(|| value.get("error"))
                .and_then(|m| m.as_str())
                .map(ToOwned::to_owned)
        })
        .unwrap_or_else(|| GENERIC_ERROR.to_owned())
}

// =============================================================================
// MarketplaceClient
// =============================================================================

/// Client for the marketplace REST API.
///
/// Cheap to clone; all clones share one connection pool and one cache.
#[derive(Clone)]
pub struct MarketplaceClient {
    inner: Arc<MarketplaceClientInner>,
}

struct MarketplaceClientInner {
    http: reqwest::Client,
    base_url: String,
    cache: Cache<String, CacheValue>,
}

impl MarketplaceClient {
    /// Create a new marketplace API client.
    #[must_use]
    pub fn new(config: &MarketplaceConfig) -> Self {
        Self::with_base_url(config.api_url.clone())
    }

    /// Create a client against an explicit base URL (used by tests).
    #[must_use]
    pub fn with_base_url(base_url: String) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(MarketplaceClientInner {
                http: reqwest::Client::new(),
                base_url: base_url.trim_end_matches('/').to_owned(),
                cache,
            }),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    /// Execute a request and decode the JSON response.
    ///
    /// The body is read as text first so that decode failures can be logged
    /// with the offending payload.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        path: &str,
    ) -> Result<T, MarketplaceError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::NOT_FOUND {
            return Err(MarketplaceError::NotFound(path.to_owned()));
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(MarketplaceError::Unauthorized(extract_message(&body)));
        }

        if !status.is_success() {
            tracing::error!(
                status = %status,
                path = %path,
                body = %body.chars().take(500).collect::<String>(),
                "marketplace API returned non-success status"
            );
            return Err(MarketplaceError::Api {
                status,
                message: extract_message(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                path = %path,
                body = %body.chars().take(500).collect::<String>(),
                "failed to parse marketplace API response"
            );
            MarketplaceError::Parse(e)
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<T, MarketplaceError> {
        let request = self.inner.http.get(self.url(path)).query(query);
        self.execute(request, path).await
    }

    async fn send_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        token: Option<&str>,
    ) -> Result<T, MarketplaceError> {
        let mut request = self.inner.http.request(method, self.url(path)).json(body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        self.execute(request, path).await
    }

    // =========================================================================
    // Catalog Reads
    // =========================================================================

    /// Fetch one page of the catalog.
    ///
    /// Never cached: the caller decides what counts as a redundant fetch.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(page = params.page))]
    pub async fn list_montures(&self, params: &ListParams) -> Result<MonturePage, MarketplaceError> {
        self.get_json("/marketplace/montures", &params.to_query())
            .await
    }

    /// Get a monture by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the monture is not found or the API request fails.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn monture(&self, id: MontureId) -> Result<Monture, MarketplaceError> {
        let cache_key = format!("monture:{id}");

        if let Some(CacheValue::Monture(monture)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for monture");
            return Ok(*monture);
        }

        let path = format!("/marketplace/montures/{}", id.as_i32());
        let monture: Monture = self.get_json(&path, &[]).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Monture(Box::new(monture.clone())))
            .await;

        Ok(monture)
    }

    /// Get montures similar to the given one.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn similar_montures(&self, id: MontureId) -> Result<Vec<Monture>, MarketplaceError> {
        let cache_key = format!("similar:{id}");

        if let Some(CacheValue::Similar(montures)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for similar montures");
            return Ok(montures);
        }

        let path = format!("/marketplace/montures/{}/similar", id.as_i32());
        let montures: Vec<Monture> = self.get_json(&path, &[]).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Similar(montures.clone()))
            .await;

        Ok(montures)
    }

    /// Get the filter facets used to populate the catalog sidebar.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn filter_options(&self) -> Result<FilterOptions, MarketplaceError> {
        let cache_key = "facets".to_owned();

        if let Some(CacheValue::Facets(facets)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for filter facets");
            return Ok(facets);
        }

        let facets: FilterOptions = self.get_json("/marketplace/filters/options", &[]).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Facets(facets.clone()))
            .await;

        Ok(facets)
    }

    /// Get aggregate marketplace statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn stats(&self) -> Result<MarketplaceStats, MarketplaceError> {
        let cache_key = "stats".to_owned();

        if let Some(CacheValue::Stats(stats)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for stats");
            return Ok(stats);
        }

        let stats: MarketplaceStats = self.get_json("/marketplace/stats", &[]).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Stats(stats.clone()))
            .await;

        Ok(stats)
    }

    // =========================================================================
    // Opticiens
    // =========================================================================

    /// List all opticien profiles.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn opticiens(&self) -> Result<Vec<Opticien>, MarketplaceError> {
        let cache_key = "opticiens".to_owned();

        if let Some(CacheValue::Opticiens(opticiens)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for opticiens");
            return Ok(opticiens);
        }

        let opticiens: Vec<Opticien> = self.get_json("/opticiens", &[]).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Opticiens(opticiens.clone()))
            .await;

        Ok(opticiens)
    }

    /// Get an opticien profile by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the opticien is not found or the API request fails.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn opticien(&self, id: OpticienId) -> Result<Opticien, MarketplaceError> {
        let cache_key = format!("opticien:{id}");

        if let Some(CacheValue::Opticien(opticien)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for opticien");
            return Ok(*opticien);
        }

        let path = format!("/opticiens/{}", id.as_i32());
        let opticien: Opticien = self.get_json(&path, &[]).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Opticien(Box::new(opticien.clone())))
            .await;

        Ok(opticien)
    }

    // =========================================================================
    // Orders & Contact (never cached - user state)
    // =========================================================================

    /// Place an order from the current cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the order is rejected or the API request fails.
    #[instrument(skip(self, input, token), fields(lignes = input.lignes.len()))]
    pub async fn create_order(
        &self,
        input: &OrderInput,
        token: Option<&str>,
    ) -> Result<OrderConfirmation, MarketplaceError> {
        self.send_json(Method::POST, "/orders/create", input, token)
            .await
    }

    /// Forward a contact-form submission to the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, message), fields(email = %message.email))]
    pub async fn submit_contact(&self, message: &ContactMessage) -> Result<(), MarketplaceError> {
        let _: serde_json::Value = self
            .send_json(Method::POST, "/contact", message, None)
            .await?;
        Ok(())
    }

    // =========================================================================
    // Admin CRUD (bearer token required)
    // =========================================================================

    /// Create a monture record.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is rejected or the API request fails.
    #[instrument(skip(self, input, token), fields(nom = %input.nom))]
    pub async fn create_monture(
        &self,
        input: &MontureInput,
        token: &str,
    ) -> Result<Monture, MarketplaceError> {
        self.send_json(Method::POST, "/montures", input, Some(token))
            .await
    }

    /// Update a monture record.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is rejected or the API request fails.
    #[instrument(skip(self, input, token), fields(id = %id))]
    pub async fn update_monture(
        &self,
        id: MontureId,
        input: &MontureInput,
        token: &str,
    ) -> Result<Monture, MarketplaceError> {
        let path = format!("/montures/{}", id.as_i32());
        let monture: Monture = self
            .send_json(Method::PUT, &path, input, Some(token))
            .await?;
        self.invalidate_monture(id).await;
        Ok(monture)
    }

    /// Delete a monture record.
    ///
    /// # Errors
    ///
    /// Returns an error if the deletion is rejected or the API request fails.
    #[instrument(skip(self, token), fields(id = %id))]
    pub async fn delete_monture(
        &self,
        id: MontureId,
        token: &str,
    ) -> Result<(), MarketplaceError> {
        let path = format!("/montures/{}", id.as_i32());
        let request = self
            .inner
            .http
            .delete(self.url(&path))
            .bearer_auth(token);

        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(MarketplaceError::NotFound(path));
        }
        if !status.is_success() {
            let body = response.text().await?;
            return Err(MarketplaceError::Api {
                status,
                message: extract_message(&body),
            });
        }

        self.invalidate_monture(id).await;
        Ok(())
    }

    // =========================================================================
    // Cache Management
    // =========================================================================

    /// Invalidate the cached detail and similar-montures entries for a monture.
    pub async fn invalidate_monture(&self, id: MontureId) {
        self.inner.cache.invalidate(&format!("monture:{id}")).await;
        self.inner.cache.invalidate(&format!("similar:{id}")).await;
    }

    /// Invalidate all cached data.
    pub async fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_message_from_message_field() {
        assert_eq!(
            extract_message(r#"{"message": "Stock insuffisant"}"#),
            "Stock insuffisant"
        );
    }

    #[test]
    fn test_extract_message_from_error_field() {
        assert_eq!(
            extract_message(r#"{"error": "Jeton invalide"}"#),
            "Jeton invalide"
        );
    }

    #[test]
    fn test_extract_message_fallback_on_garbage() {
        assert_eq!(extract_message("<html>502</html>"), GENERIC_ERROR);
        assert_eq!(extract_message(""), GENERIC_ERROR);
        assert_eq!(extract_message(r#"{"message": 42}"#), GENERIC_ERROR);
    }

    #[test]
    fn test_user_message_prefers_api_body() {
        let err = MarketplaceError::Api {
            status: StatusCode::CONFLICT,
            message: "Stock insuffisant".to_owned(),
        };
        assert_eq!(err.user_message(), "Stock insuffisant");
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = MarketplaceClient::with_base_url("http://localhost:4000/".to_owned());
        assert_eq!(
            client.url("/marketplace/stats"),
            "http://localhost:4000/marketplace/stats"
        );
    }
}
