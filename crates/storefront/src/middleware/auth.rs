//! Authentication extractors.
//!
//! The storefront never authenticates anyone itself: the backend's login
//! flow writes `ApiCredentials` into the session, and these extractors only
//! read them back out.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use tower_sessions::Session;

use crate::models::{ApiCredentials, session_keys};

/// Extractor that requires marketplace API credentials in the session.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(credentials): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Bonjour, {}!", credentials.email)
/// }
/// ```
pub struct RequireAuth(pub ApiCredentials);

/// Extractor that reads credentials when present, without requiring them.
pub struct OptionalAuth(pub Option<ApiCredentials>);

/// Error returned when authentication is required but absent.
pub struct AuthRejection;

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            "Veuillez vous connecter pour continuer.",
        )
            .into_response()
    }
}

async fn credentials_from_parts(parts: &mut Parts) -> Option<ApiCredentials> {
    let session = parts.extensions.get::<Session>()?;
    session
        .get::<ApiCredentials>(session_keys::API_CREDENTIALS)
        .await
        .ok()
        .flatten()
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        credentials_from_parts(parts)
            .await
            .map(Self)
            .ok_or(AuthRejection)
    }
}

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(credentials_from_parts(parts).await))
    }
}
