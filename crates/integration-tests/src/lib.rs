//! Shared test harness for Lunetier integration tests.
//!
//! Provides [`StubBackend`], an in-process marketplace API serving canned
//! JSON on an ephemeral port. Tests point a real `MarketplaceClient` at it
//! and observe request counts, received query parameters, and injected
//! failures.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;

/// Observable state of the stub backend.
#[derive(Clone, Default)]
pub struct StubState {
    list_hits: Arc<AtomicUsize>,
    detail_hits: Arc<AtomicUsize>,
    last_query: Arc<Mutex<Option<HashMap<String, String>>>>,
    fail_list: Arc<AtomicBool>,
    list_delay_ms: Arc<AtomicUsize>,
}

/// An in-process marketplace API stub on an ephemeral port.
pub struct StubBackend {
    pub addr: SocketAddr,
    state: StubState,
}

impl StubBackend {
    /// Bind and serve the stub in the background.
    pub async fn spawn() -> Self {
        let state = StubState::default();

        let app = Router::new()
            .route("/marketplace/montures", get(list_montures))
            .route("/marketplace/montures/{id}", get(monture_detail))
            .route("/marketplace/filters/options", get(filter_options))
            .route("/marketplace/stats", get(stats))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(axum::serve(listener, app).into_future());

        Self { addr, state }
    }

    /// Base URL for a `MarketplaceClient`.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Requests seen by the list endpoint.
    #[must_use]
    pub fn list_hits(&self) -> usize {
        self.state.list_hits.load(Ordering::SeqCst)
    }

    /// Requests seen by the detail endpoint.
    #[must_use]
    pub fn detail_hits(&self) -> usize {
        self.state.detail_hits.load(Ordering::SeqCst)
    }

    /// Query parameters of the most recent list request.
    #[must_use]
    pub fn last_query(&self) -> HashMap<String, String> {
        self.state.last_query.lock().unwrap().clone().unwrap_or_default()
    }

    /// Make the list endpoint answer 500 with a readable message.
    pub fn set_fail_list(&self, fail: bool) {
        self.state.fail_list.store(fail, Ordering::SeqCst);
    }

    /// Delay list responses, to let tests cancel requests mid-flight.
    pub fn set_list_delay(&self, delay: Duration) {
        self.state
            .list_delay_ms
            .store(usize::try_from(delay.as_millis()).unwrap(), Ordering::SeqCst);
    }
}

/// Canned monture payload.
#[must_use]
pub fn monture_json(id: i32) -> serde_json::Value {
    json!({
        "id": id,
        "nom": format!("Monture {id}"),
        "marque": "Lafont",
        "prix": "249.00",
        "stock": 4,
        "type": "optique",
        "genre": "mixte",
        "forme": "ronde",
        "couleur": "écaille",
        "matiere": "acétate",
        "images": [format!("monture-{id}.jpg")],
        "statut": "disponible"
    })
}

async fn list_montures(
    State(state): State<StubState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    state.list_hits.fetch_add(1, Ordering::SeqCst);
    *state.last_query.lock().unwrap() = Some(params.clone());

    let delay_ms = state.list_delay_ms.load(Ordering::SeqCst);
    if delay_ms > 0 {
        tokio::time::sleep(Duration::from_millis(delay_ms as u64)).await;
    }

    if state.fail_list.load(Ordering::SeqCst) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "Panne générale du catalogue" })),
        )
            .into_response();
    }

    let page = params
        .get("page")
        .and_then(|p| p.parse::<u32>().ok())
        .unwrap_or(1);

    Json(json!({
        "montures": [monture_json(1)],
        "pagination": { "total": 25, "page": page, "limit": 12, "totalPages": 3 }
    }))
    .into_response()
}

async fn monture_detail(State(state): State<StubState>, Path(id): Path<i32>) -> Response {
    state.detail_hits.fetch_add(1, Ordering::SeqCst);

    if id == 404 {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "Monture introuvable" })),
        )
            .into_response();
    }

    Json(monture_json(id)).into_response()
}

async fn filter_options() -> Json<serde_json::Value> {
    Json(json!({
        "marques": ["Lafont", "Ray-Ban"],
        "types": ["optique", "solaire"],
        "genres": ["homme", "femme", "mixte"],
        "formes": ["ronde", "carrée"],
        "couleurs": ["écaille", "noir"],
        "matieres": ["acétate", "métal"]
    }))
}

async fn stats() -> Json<serde_json::Value> {
    Json(json!({
        "totalMontures": 25,
        "totalOpticiens": 4,
        "totalMarques": 2,
        "prixMoyen": "218.50"
    }))
}
