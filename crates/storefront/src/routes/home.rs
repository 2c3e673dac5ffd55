//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use crate::filters;
use crate::marketplace::ListParams;
use crate::routes::catalogue::MontureCardView;
use crate::state::AppState;

/// Montures featured on the home page.
const FEATURED_COUNT: u32 = 4;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub featured: Vec<MontureCardView>,
    pub has_stats: bool,
    pub total_montures: u64,
    pub total_opticiens: u64,
    pub prix_moyen: String,
}

/// Display the home page.
///
/// Stats and featured montures are both best-effort decoration: a backend
/// hiccup renders an emptier page, never an error page.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> HomeTemplate {
    let stats = match state.marketplace().stats().await {
        Ok(stats) => Some(stats),
        Err(e) => {
            tracing::warn!(error = %e, "failed to load marketplace stats for home page");
            None
        }
    };

    let params = ListParams {
        limit: FEATURED_COUNT,
        ..ListParams::default()
    };
    let featured = match state.marketplace().list_montures(&params).await {
        Ok(page) => page
            .montures
            .iter()
            .map(|m| MontureCardView::from_monture(m, &state.config().marketplace))
            .collect(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to load featured montures");
            Vec::new()
        }
    };

    let (has_stats, total_montures, total_opticiens, prix_moyen) = match stats {
        Some(stats) => (
            true,
            stats.total_montures,
            stats.total_opticiens,
            stats.prix_moyen.map(filters::format_eur).unwrap_or_default(),
        ),
        None => (false, 0, 0, String::new()),
    };

    HomeTemplate {
        featured,
        has_stats,
        total_montures,
        total_opticiens,
        prix_moyen,
    }
}
