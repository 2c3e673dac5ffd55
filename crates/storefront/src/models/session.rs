//! Session-related types.
//!
//! Everything the storefront keeps per visitor lives in the session: the
//! cart snapshot, the marketplace API credentials (written by the login
//! flow, read-only here), and the key of the visitor's catalog query
//! session.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use uuid::Uuid;

use lunetier_core::UserRole;

/// Marketplace API credentials stored in the session.
///
/// Written elsewhere (the auth flow lives on the backend); the storefront
/// only reads them to attach bearer tokens and render role-aware views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiCredentials {
    /// Bearer token for authenticated API calls.
    pub token: String,
    /// Account role driving which views are reachable.
    pub role: UserRole,
    /// Account email, shown in the header.
    pub email: String,
}

/// Session keys for visitor data.
pub mod session_keys {
    /// Key for the serialized cart snapshot.
    pub const CART: &str = "cart";

    /// Key for the marketplace API credentials.
    pub const API_CREDENTIALS: &str = "api_credentials";

    /// Key for the visitor's catalog query-session id.
    pub const CATALOG_SESSION: &str = "catalog_session";
}

/// Get (or mint) the visitor's catalog query-session key.
///
/// Best-effort: if the session cannot be written the key is still returned,
/// the visitor just loses query-session stickiness across requests.
pub async fn catalog_key(session: &Session) -> Uuid {
    if let Ok(Some(key)) = session.get::<Uuid>(session_keys::CATALOG_SESSION).await {
        return key;
    }

    let key = Uuid::new_v4();
    if let Err(e) = session.insert(session_keys::CATALOG_SESSION, key).await {
        tracing::warn!(error = %e, "failed to persist catalog session key");
    }
    key
}
