//! Catalog route handlers.
//!
//! Every catalog render goes through the visitor's [`QuerySession`]: the
//! incoming query parameters are reconciled against the session's filter
//! state, which debounces, dedupes, and cancels as needed. The grid is
//! swapped via HTMX on filter changes and page navigation.

use std::time::Duration;

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::catalog::{CatalogFilters, CatalogState, FetchOutcome};
use crate::config::MarketplaceConfig;
use crate::filters;
use crate::marketplace::{FilterOptions, Monture, Pagination, SortKey, SortOrder};
use crate::models;
use crate::routes::monture_image_url;
use crate::state::AppState;

/// How long a render waits for a scheduled fetch to settle before falling
/// back to the last snapshot.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

// =============================================================================
// Query Parameters
// =============================================================================

/// Raw catalog query parameters as sent by the filter sidebar.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogueQuery {
    pub search: Option<String>,
    pub marque: Option<String>,
    #[serde(rename = "type")]
    pub type_monture: Option<String>,
    pub genre: Option<String>,
    pub forme: Option<String>,
    pub couleur: Option<String>,
    pub matiere: Option<String>,
    pub prix_min: Option<String>,
    pub prix_max: Option<String>,
    pub tri: Option<String>,
    pub ordre: Option<String>,
    pub page: Option<u32>,
}

/// Empty select values mean "not filtered".
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Accept both "299.50" and the French "299,50"; garbage is ignored.
fn parse_price(value: Option<String>) -> Option<Decimal> {
    non_empty(value).and_then(|s| s.trim().replace(',', ".").parse::<Decimal>().ok())
}

impl CatalogueQuery {
    /// Resolve into the engine's filter state plus the requested page.
    fn into_parts(self) -> (CatalogFilters, u32) {
        let filters = CatalogFilters {
            search: self.search.unwrap_or_default().trim().to_owned(),
            marque: non_empty(self.marque),
            type_monture: non_empty(self.type_monture),
            genre: non_empty(self.genre),
            forme: non_empty(self.forme),
            couleur: non_empty(self.couleur),
            matiere: non_empty(self.matiere),
            prix_min: parse_price(self.prix_min),
            prix_max: parse_price(self.prix_max),
            sort_by: self
                .tri
                .as_deref()
                .map_or_else(SortKey::default, SortKey::from_param),
            sort_order: self
                .ordre
                .as_deref()
                .map_or_else(SortOrder::default, SortOrder::from_param),
        };
        (filters, self.page.unwrap_or(1).max(1))
    }
}

// =============================================================================
// Display Data
// =============================================================================

/// Monture card display data for templates.
#[derive(Clone)]
pub struct MontureCardView {
    pub id: i32,
    pub nom: String,
    pub marque: String,
    pub prix: String,
    pub image: String,
    pub disponible: bool,
}

impl MontureCardView {
    pub fn from_monture(monture: &Monture, marketplace: &MarketplaceConfig) -> Self {
        Self {
            id: monture.id.as_i32(),
            nom: monture.nom.clone(),
            marque: monture.marque.clone(),
            prix: filters::format_eur(monture.prix),
            image: monture_image_url(monture, marketplace),
            disponible: monture.statut.is_purchasable() && monture.stock > 0,
        }
    }
}

/// Pagination display data for templates.
#[derive(Clone)]
pub struct PaginationView {
    pub page: u32,
    pub total_pages: u32,
    pub total: u64,
    pub has_prev: bool,
    pub has_next: bool,
    pub prev: u32,
    pub next: u32,
}

impl From<&Pagination> for PaginationView {
    fn from(pagination: &Pagination) -> Self {
        Self {
            page: pagination.page,
            total_pages: pagination.total_pages,
            total: pagination.total,
            has_prev: pagination.page > 1,
            has_next: pagination.page < pagination.total_pages,
            prev: pagination.page.saturating_sub(1).max(1),
            next: pagination.page + 1,
        }
    }
}

/// Facet lists for the filter sidebar.
#[derive(Clone, Default)]
pub struct FacetsView {
    pub marques: Vec<String>,
    pub types: Vec<String>,
    pub genres: Vec<String>,
    pub formes: Vec<String>,
    pub couleurs: Vec<String>,
    pub matieres: Vec<String>,
}

impl From<FilterOptions> for FacetsView {
    fn from(options: FilterOptions) -> Self {
        Self {
            marques: options.marques,
            types: options.types,
            genres: options.genres,
            formes: options.formes,
            couleurs: options.couleurs,
            matieres: options.matieres,
        }
    }
}

/// Current filter values echoed back into the sidebar form.
///
/// Plain strings so templates never deal with options; empty means unset.
#[derive(Clone, Default)]
pub struct SelectedFilters {
    pub search: String,
    pub marque: String,
    pub type_monture: String,
    pub genre: String,
    pub forme: String,
    pub couleur: String,
    pub matiere: String,
    pub prix_min: String,
    pub prix_max: String,
    pub tri: String,
    pub ordre: String,
}

impl From<&CatalogFilters> for SelectedFilters {
    fn from(filters: &CatalogFilters) -> Self {
        Self {
            search: filters.search.clone(),
            marque: filters.marque.clone().unwrap_or_default(),
            type_monture: filters.type_monture.clone().unwrap_or_default(),
            genre: filters.genre.clone().unwrap_or_default(),
            forme: filters.forme.clone().unwrap_or_default(),
            couleur: filters.couleur.clone().unwrap_or_default(),
            matiere: filters.matiere.clone().unwrap_or_default(),
            prix_min: filters.prix_min.map(|p| p.to_string()).unwrap_or_default(),
            prix_max: filters.prix_max.map(|p| p.to_string()).unwrap_or_default(),
            tri: filters.sort_by.as_str().to_owned(),
            ordre: filters.sort_order.as_str().to_owned(),
        }
    }
}

/// Query string carrying the current filters (without the page pointer),
/// used to build pagination links.
fn base_query(filters: &CatalogFilters) -> String {
    let mut pairs: Vec<(&str, String)> = Vec::new();
    if !filters.search.is_empty() {
        pairs.push(("search", filters.search.clone()));
    }
    let text_fields = [
        ("marque", &filters.marque),
        ("type", &filters.type_monture),
        ("genre", &filters.genre),
        ("forme", &filters.forme),
        ("couleur", &filters.couleur),
        ("matiere", &filters.matiere),
    ];
    for (key, value) in text_fields {
        if let Some(value) = value {
            pairs.push((key, value.clone()));
        }
    }
    if let Some(min) = filters.prix_min {
        pairs.push(("prix_min", min.to_string()));
    }
    if let Some(max) = filters.prix_max {
        pairs.push(("prix_max", max.to_string()));
    }
    pairs.push(("tri", filters.sort_by.as_str().to_owned()));
    pairs.push(("ordre", filters.sort_order.as_str().to_owned()));

    pairs
        .iter()
        .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

// =============================================================================
// Templates
// =============================================================================

/// Catalog page template.
#[derive(Template, WebTemplate)]
#[template(path = "catalogue/index.html")]
pub struct CatalogueIndexTemplate {
    pub montures: Vec<MontureCardView>,
    pub pagination: PaginationView,
    pub facets: FacetsView,
    pub selected: SelectedFilters,
    pub error: String,
    pub base_query: String,
}

/// Catalog grid fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/catalogue_grid.html")]
pub struct CatalogueGridTemplate {
    pub montures: Vec<MontureCardView>,
    pub pagination: PaginationView,
    pub error: String,
    pub base_query: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Reconcile the request against the visitor's query session and wait for
/// the resulting fetch (if any) to settle.
async fn drive(
    state: &AppState,
    session: &Session,
    query: CatalogueQuery,
) -> (CatalogState, CatalogFilters) {
    let (filters, page) = query.into_parts();
    let key = models::catalog_key(session).await;
    let handle = state.catalog_session(key).await;
    let mut query_session = handle.lock().await;

    let snapshot = match query_session.apply(filters, page) {
        FetchOutcome::Scheduled(generation) => {
            match tokio::time::timeout(FETCH_TIMEOUT, query_session.settled(generation)).await {
                Ok(settled) => settled,
                Err(_) => {
                    tracing::warn!("catalog fetch timed out, rendering last snapshot");
                    query_session.snapshot()
                }
            }
        }
        FetchOutcome::Skipped => query_session.snapshot(),
    };

    let filters = query_session.filters().clone();
    (snapshot, filters)
}

fn cards(state: &AppState, snapshot: &CatalogState) -> Vec<MontureCardView> {
    snapshot
        .montures
        .iter()
        .map(|m| MontureCardView::from_monture(m, &state.config().marketplace))
        .collect()
}

/// Display the catalog page.
#[instrument(skip(state, session))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CatalogueQuery>,
) -> CatalogueIndexTemplate {
    let (snapshot, filters) = drive(&state, &session, query).await;

    CatalogueIndexTemplate {
        montures: cards(&state, &snapshot),
        pagination: PaginationView::from(&snapshot.pagination),
        facets: snapshot.facets.clone().map(FacetsView::from).unwrap_or_default(),
        selected: SelectedFilters::from(&filters),
        error: snapshot.error.clone().unwrap_or_default(),
        base_query: base_query(&filters),
    }
}

/// Display the catalog grid fragment (for HTMX).
#[instrument(skip(state, session))]
pub async fn grid(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CatalogueQuery>,
) -> CatalogueGridTemplate {
    let (snapshot, filters) = drive(&state, &session, query).await;

    CatalogueGridTemplate {
        montures: cards(&state, &snapshot),
        pagination: PaginationView::from(&snapshot.pagination),
        error: snapshot.error.clone().unwrap_or_default(),
        base_query: base_query(&filters),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_normalizes_empty_selects() {
        let query = CatalogueQuery {
            search: Some("  aviateur ".to_owned()),
            marque: Some(String::new()),
            genre: Some("homme".to_owned()),
            ..CatalogueQuery::default()
        };
        let (filters, page) = query.into_parts();

        assert_eq!(filters.search, "aviateur");
        assert_eq!(filters.marque, None);
        assert_eq!(filters.genre.as_deref(), Some("homme"));
        assert_eq!(page, 1);
    }

    #[test]
    fn test_query_parses_french_decimal_prices() {
        let query = CatalogueQuery {
            prix_min: Some("99,50".to_owned()),
            prix_max: Some("not-a-number".to_owned()),
            ..CatalogueQuery::default()
        };
        let (filters, _) = query.into_parts();

        assert_eq!(filters.prix_min, Some(Decimal::new(9950, 2)));
        assert_eq!(filters.prix_max, None);
    }

    #[test]
    fn test_query_page_floor_is_one() {
        let query = CatalogueQuery {
            page: Some(0),
            ..CatalogueQuery::default()
        };
        let (_, page) = query.into_parts();
        assert_eq!(page, 1);
    }

    #[test]
    fn test_base_query_roundtrips_filters() {
        let filters = CatalogFilters {
            search: "soleil".to_owned(),
            marque: Some("Ray-Ban".to_owned()),
            sort_by: SortKey::Prix,
            sort_order: SortOrder::Asc,
            ..CatalogFilters::default()
        };
        let qs = base_query(&filters);
        assert!(qs.contains("search=soleil"));
        assert!(qs.contains("marque=Ray-Ban"));
        assert!(qs.contains("tri=prix"));
        assert!(qs.contains("ordre=ASC"));
        assert!(!qs.contains("page="));
    }
}
