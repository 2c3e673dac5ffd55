//! Monture detail route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use tower_sessions::Session;
use tracing::instrument;

use lunetier_core::MontureId;

use crate::cart::CartStore;
use crate::config::MarketplaceConfig;
use crate::error::Result;
use crate::filters;
use crate::marketplace::Monture;
use crate::routes::catalogue::MontureCardView;
use crate::routes::PLACEHOLDER_IMAGE;
use crate::state::AppState;

/// Monture detail display data for templates.
#[derive(Clone)]
pub struct MontureDetailView {
    pub id: i32,
    pub nom: String,
    pub marque: String,
    pub prix: String,
    pub description: String,
    pub cover: String,
    pub gallery: Vec<String>,
    pub stock: u32,
    pub disponible: bool,
    pub type_monture: String,
    pub genre: String,
    pub forme: String,
    pub couleur: String,
    pub matiere: String,
}

impl MontureDetailView {
    fn from_monture(monture: &Monture, marketplace: &MarketplaceConfig) -> Self {
        let gallery: Vec<String> = monture
            .images
            .iter()
            .map(|f| marketplace.image_url(f))
            .collect();

        Self {
            id: monture.id.as_i32(),
            nom: monture.nom.clone(),
            marque: monture.marque.clone(),
            prix: filters::format_eur(monture.prix),
            description: monture.description.clone().unwrap_or_default(),
            cover: gallery
                .first()
                .cloned()
                .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_owned()),
            gallery,
            stock: monture.stock,
            disponible: monture.statut.is_purchasable() && monture.stock > 0,
            type_monture: monture.type_monture.clone().unwrap_or_default(),
            genre: monture.genre.clone().unwrap_or_default(),
            forme: monture.forme.clone().unwrap_or_default(),
            couleur: monture.couleur.clone().unwrap_or_default(),
            matiere: monture.matiere.clone().unwrap_or_default(),
        }
    }
}

/// Monture detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "montures/show.html")]
pub struct MontureShowTemplate {
    pub monture: MontureDetailView,
    pub similar: Vec<MontureCardView>,
    /// Quantity of this monture already in the visitor's cart.
    pub in_cart: u32,
}

/// Display a monture detail page with gallery and similar montures.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<MontureShowTemplate> {
    let id = MontureId::new(id);
    let monture = state.marketplace().monture(id).await?;

    // Similar montures are decoration; failures only lose the strip
    let similar = match state.marketplace().similar_montures(id).await {
        Ok(montures) => montures
            .iter()
            .map(|m| MontureCardView::from_monture(m, &state.config().marketplace))
            .collect(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to load similar montures");
            Vec::new()
        }
    };

    let store = CartStore::restore(session).await;
    let in_cart = store.cart().quantity_of(id);

    Ok(MontureShowTemplate {
        monture: MontureDetailView::from_monture(&monture, &state.config().marketplace),
        similar,
        in_cart,
    })
}
