//! Opticien directory route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use tracing::instrument;

use lunetier_core::OpticienId;

use crate::config::MarketplaceConfig;
use crate::error::Result;
use crate::filters;
use crate::marketplace::Opticien;
use crate::routes::PLACEHOLDER_IMAGE;
use crate::state::AppState;

/// Opticien display data for templates.
#[derive(Clone)]
pub struct OpticienView {
    pub id: i32,
    pub nom_entreprise: String,
    pub email: String,
    pub telephone: String,
    pub adresse: String,
    pub ville: String,
    pub photo: String,
    pub description: String,
}

impl OpticienView {
    fn from_opticien(opticien: &Opticien, marketplace: &MarketplaceConfig) -> Self {
        Self {
            id: opticien.id.as_i32(),
            nom_entreprise: opticien.nom_entreprise.clone(),
            email: opticien.email.clone(),
            telephone: opticien.telephone.clone().unwrap_or_default(),
            adresse: opticien.adresse.clone().unwrap_or_default(),
            ville: opticien.ville.clone().unwrap_or_default(),
            photo: opticien
                .photo
                .as_deref()
                .map_or_else(|| PLACEHOLDER_IMAGE.to_owned(), |f| marketplace.image_url(f)),
            description: opticien.description.clone().unwrap_or_default(),
        }
    }
}

/// Opticien directory template.
#[derive(Template, WebTemplate)]
#[template(path = "opticiens/index.html")]
pub struct OpticiensIndexTemplate {
    pub opticiens: Vec<OpticienView>,
}

/// Opticien profile template.
#[derive(Template, WebTemplate)]
#[template(path = "opticiens/show.html")]
pub struct OpticienShowTemplate {
    pub opticien: OpticienView,
}

/// Display the opticien directory.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<OpticiensIndexTemplate> {
    let opticiens = state.marketplace().opticiens().await?;

    Ok(OpticiensIndexTemplate {
        opticiens: opticiens
            .iter()
            .map(|o| OpticienView::from_opticien(o, &state.config().marketplace))
            .collect(),
    })
}

/// Display an opticien profile.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<OpticienShowTemplate> {
    let opticien = state.marketplace().opticien(OpticienId::new(id)).await?;

    Ok(OpticienShowTemplate {
        opticien: OpticienView::from_opticien(&opticien, &state.config().marketplace),
    })
}
