//! Admin-style monture record views.
//!
//! Thin list/detail/form views over the backend's CRUD endpoints, gated on
//! marketplace API credentials being present in the session. The backend
//! remains the authority on what the token is actually allowed to touch.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use lunetier_core::MontureId;

use crate::error::Result;
use crate::filters;
use crate::marketplace::{ListParams, Monture, MontureInput};
use crate::middleware::RequireAuth;
use crate::routes::catalogue::PaginationView;
use crate::state::AppState;

/// Monture record row for the list view.
#[derive(Clone)]
pub struct MontureRecordView {
    pub id: i32,
    pub nom: String,
    pub marque: String,
    pub prix: String,
    pub stock: u32,
    pub statut: String,
}

impl From<&Monture> for MontureRecordView {
    fn from(monture: &Monture) -> Self {
        Self {
            id: monture.id.as_i32(),
            nom: monture.nom.clone(),
            marque: monture.marque.clone(),
            prix: filters::format_eur(monture.prix),
            stock: monture.stock,
            statut: monture.statut.to_string(),
        }
    }
}

// =============================================================================
// Forms
// =============================================================================

/// Monture record form data, kept as raw strings so invalid input can be
/// re-rendered exactly as typed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MontureForm {
    #[serde(default)]
    pub nom: String,
    #[serde(default)]
    pub marque: String,
    #[serde(default)]
    pub prix: String,
    #[serde(default)]
    pub stock: String,
    #[serde(default)]
    pub type_monture: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub forme: String,
    #[serde(default)]
    pub couleur: String,
    #[serde(default)]
    pub matiere: String,
    #[serde(default)]
    pub description: String,
}

/// Field-level validation messages; empty string means no error.
#[derive(Debug, Clone, Default)]
pub struct MontureFormErrors {
    pub nom: String,
    pub marque: String,
    pub prix: String,
    pub stock: String,
    pub global: String,
}

impl MontureFormErrors {
    fn is_clean(&self) -> bool {
        self.nom.is_empty()
            && self.marque.is_empty()
            && self.prix.is_empty()
            && self.stock.is_empty()
            && self.global.is_empty()
    }
}

impl MontureForm {
    fn from_monture(monture: &Monture) -> Self {
        Self {
            nom: monture.nom.clone(),
            marque: monture.marque.clone(),
            prix: monture.prix.to_string(),
            stock: monture.stock.to_string(),
            type_monture: monture.type_monture.clone().unwrap_or_default(),
            genre: monture.genre.clone().unwrap_or_default(),
            forme: monture.forme.clone().unwrap_or_default(),
            couleur: monture.couleur.clone().unwrap_or_default(),
            matiere: monture.matiere.clone().unwrap_or_default(),
            description: monture.description.clone().unwrap_or_default(),
        }
    }

    /// Validate and convert to an API payload.
    ///
    /// # Errors
    ///
    /// Returns field-level messages; the caller re-renders the form with them.
    fn validate(&self) -> std::result::Result<MontureInput, MontureFormErrors> {
        let mut errors = MontureFormErrors::default();

        if self.nom.trim().is_empty() {
            errors.nom = "Le nom est obligatoire.".to_owned();
        }
        if self.marque.trim().is_empty() {
            errors.marque = "La marque est obligatoire.".to_owned();
        }

        let prix = match self.prix.trim().replace(',', ".").parse::<Decimal>() {
            Ok(prix) if prix > Decimal::ZERO => Some(prix),
            Ok(_) => {
                errors.prix = "Le prix doit être strictement positif.".to_owned();
                None
            }
            Err(_) => {
                errors.prix = "Le prix doit être un nombre (ex. 249,00).".to_owned();
                None
            }
        };

        let stock = match self.stock.trim().parse::<u32>() {
            Ok(stock) => Some(stock),
            Err(_) => {
                errors.stock = "Le stock doit être un entier positif.".to_owned();
                None
            }
        };

        match (prix, stock) {
            (Some(prix), Some(stock)) if errors.is_clean() => Ok(MontureInput {
                nom: self.nom.trim().to_owned(),
                marque: self.marque.trim().to_owned(),
                prix,
                stock,
                type_monture: optional(&self.type_monture),
                genre: optional(&self.genre),
                forme: optional(&self.forme),
                couleur: optional(&self.couleur),
                matiere: optional(&self.matiere),
                description: optional(&self.description),
            }),
            _ => Err(errors),
        }
    }
}

fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Record list query parameters.
#[derive(Debug, Deserialize)]
pub struct RecordsQuery {
    pub page: Option<u32>,
}

/// Monture records list template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/montures_index.html")]
pub struct MontureRecordsTemplate {
    pub montures: Vec<MontureRecordView>,
    pub pagination: PaginationView,
}

/// Monture record detail template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/monture_show.html")]
pub struct MontureRecordShowTemplate {
    pub monture: MontureRecordView,
    pub description: String,
}

/// Monture record form template (create and edit).
#[derive(Template, WebTemplate)]
#[template(path = "admin/monture_form.html")]
pub struct MontureFormTemplate {
    pub title: String,
    pub action: String,
    pub form: MontureForm,
    pub errors: MontureFormErrors,
}

// =============================================================================
// Handlers
// =============================================================================

/// List monture records.
#[instrument(skip(state, _auth))]
pub async fn index(
    State(state): State<AppState>,
    _auth: RequireAuth,
    Query(query): Query<RecordsQuery>,
) -> Result<MontureRecordsTemplate> {
    let params = ListParams {
        page: query.page.unwrap_or(1).max(1),
        ..ListParams::default()
    };
    let page = state.marketplace().list_montures(&params).await?;

    Ok(MontureRecordsTemplate {
        montures: page.montures.iter().map(MontureRecordView::from).collect(),
        pagination: PaginationView::from(&page.pagination),
    })
}

/// Show one monture record.
#[instrument(skip(state, _auth))]
pub async fn show(
    State(state): State<AppState>,
    _auth: RequireAuth,
    Path(id): Path<i32>,
) -> Result<MontureRecordShowTemplate> {
    let monture = state.marketplace().monture(MontureId::new(id)).await?;

    Ok(MontureRecordShowTemplate {
        monture: MontureRecordView::from(&monture),
        description: monture.description.clone().unwrap_or_default(),
    })
}

/// Display the record creation form.
#[instrument(skip(_auth))]
pub async fn new_form(_auth: RequireAuth) -> MontureFormTemplate {
    MontureFormTemplate {
        title: "Nouvelle monture".to_owned(),
        action: "/admin/montures/new".to_owned(),
        form: MontureForm::default(),
        errors: MontureFormErrors::default(),
    }
}

/// Create a monture record.
#[instrument(skip(state, auth, form))]
pub async fn create(
    State(state): State<AppState>,
    auth: RequireAuth,
    Form(form): Form<MontureForm>,
) -> Response {
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            return MontureFormTemplate {
                title: "Nouvelle monture".to_owned(),
                action: "/admin/montures/new".to_owned(),
                form,
                errors,
            }
            .into_response();
        }
    };

    match state.marketplace().create_monture(&input, &auth.0.token).await {
        Ok(monture) => {
            Redirect::to(&format!("/admin/montures/{}", monture.id.as_i32())).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "monture creation failed");
            MontureFormTemplate {
                title: "Nouvelle monture".to_owned(),
                action: "/admin/montures/new".to_owned(),
                form,
                errors: MontureFormErrors {
                    global: e.user_message(),
                    ..MontureFormErrors::default()
                },
            }
            .into_response()
        }
    }
}

/// Display the record edit form, prefilled.
#[instrument(skip(state, _auth))]
pub async fn edit_form(
    State(state): State<AppState>,
    _auth: RequireAuth,
    Path(id): Path<i32>,
) -> Result<MontureFormTemplate> {
    let monture = state.marketplace().monture(MontureId::new(id)).await?;

    Ok(MontureFormTemplate {
        title: format!("Modifier « {} »", monture.nom),
        action: format!("/admin/montures/{id}/edit"),
        form: MontureForm::from_monture(&monture),
        errors: MontureFormErrors::default(),
    })
}

/// Update a monture record.
#[instrument(skip(state, auth, form))]
pub async fn update(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<i32>,
    Form(form): Form<MontureForm>,
) -> Response {
    let action = format!("/admin/montures/{id}/edit");
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            return MontureFormTemplate {
                title: "Modifier la monture".to_owned(),
                action,
                form,
                errors,
            }
            .into_response();
        }
    };

    match state
        .marketplace()
        .update_monture(MontureId::new(id), &input, &auth.0.token)
        .await
    {
        Ok(_) => Redirect::to(&format!("/admin/montures/{id}")).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "monture update failed");
            MontureFormTemplate {
                title: "Modifier la monture".to_owned(),
                action,
                form,
                errors: MontureFormErrors {
                    global: e.user_message(),
                    ..MontureFormErrors::default()
                },
            }
            .into_response()
        }
    }
}

/// Delete a monture record.
#[instrument(skip(state, auth))]
pub async fn delete(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<i32>,
) -> Result<Redirect> {
    state
        .marketplace()
        .delete_monture(MontureId::new(id), &auth.0.token)
        .await?;

    Ok(Redirect::to("/admin/montures"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> MontureForm {
        MontureForm {
            nom: "Panthos".to_owned(),
            marque: "Lafont".to_owned(),
            prix: "249,00".to_owned(),
            stock: "4".to_owned(),
            ..MontureForm::default()
        }
    }

    #[test]
    fn test_valid_form_converts() {
        let input = valid_form().validate().expect("form should validate");
        assert_eq!(input.prix, Decimal::new(24900, 2));
        assert_eq!(input.stock, 4);
        assert_eq!(input.genre, None);
    }

    #[test]
    fn test_price_field_errors() {
        let mut form = valid_form();
        form.prix = "gratuit".to_owned();
        let errors = form.validate().expect_err("price should be rejected");
        assert!(!errors.prix.is_empty());
        assert!(errors.nom.is_empty());

        form.prix = "0".to_owned();
        let errors = form.validate().expect_err("zero price should be rejected");
        assert!(!errors.prix.is_empty());
    }

    #[test]
    fn test_required_fields() {
        let mut form = valid_form();
        form.nom = "  ".to_owned();
        form.marque = String::new();
        let errors = form.validate().expect_err("blank names should be rejected");
        assert!(!errors.nom.is_empty());
        assert!(!errors.marque.is_empty());
    }

    #[test]
    fn test_stock_must_be_integer() {
        let mut form = valid_form();
        form.stock = "-2".to_owned();
        let errors = form.validate().expect_err("negative stock should be rejected");
        assert!(!errors.stock.is_empty());
    }
}
