//! Checkout route handlers.
//!
//! The checkout form posts the cart to `POST /orders/create`. Validation
//! failures re-render the form with field-level messages; the cart is only
//! cleared once the backend has confirmed the order.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use lunetier_core::Email;

use crate::cart::CartStore;
use crate::filters;
use crate::marketplace::{OrderInput, OrderLineInput};
use crate::middleware::OptionalAuth;
use crate::routes::cart::CartView;
use crate::state::AppState;

/// Checkout form data.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub nom: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub telephone: String,
    #[serde(default)]
    pub adresse: String,
    #[serde(default)]
    pub ville: String,
    #[serde(default)]
    pub code_postal: String,
}

/// Field-level validation messages; empty string means no error.
#[derive(Debug, Clone, Default)]
pub struct CheckoutErrors {
    pub nom: String,
    pub email: String,
    pub adresse: String,
    pub ville: String,
    pub code_postal: String,
    /// Backend rejection or transport failure, rendered above the form.
    pub global: String,
}

impl CheckoutErrors {
    fn validate(form: &CheckoutForm) -> Self {
        let mut errors = Self::default();
        if form.nom.trim().is_empty() {
            errors.nom = "Veuillez indiquer votre nom.".to_owned();
        }
        if let Err(e) = Email::parse(form.email.trim()) {
            tracing::debug!(error = %e, "invalid checkout email");
            errors.email = "Veuillez saisir une adresse email valide.".to_owned();
        }
        if form.adresse.trim().is_empty() {
            errors.adresse = "Veuillez indiquer votre adresse.".to_owned();
        }
        if form.ville.trim().is_empty() {
            errors.ville = "Veuillez indiquer votre ville.".to_owned();
        }
        if form.code_postal.trim().is_empty() {
            errors.code_postal = "Veuillez indiquer votre code postal.".to_owned();
        }
        errors
    }

    fn is_clean(&self) -> bool {
        self.nom.is_empty()
            && self.email.is_empty()
            && self.adresse.is_empty()
            && self.ville.is_empty()
            && self.code_postal.is_empty()
            && self.global.is_empty()
    }
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub cart: CartView,
    pub form: CheckoutForm,
    pub errors: CheckoutErrors,
}

/// Order confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/confirmation.html")]
pub struct ConfirmationTemplate {
    pub order_id: i32,
    pub total: String,
}

/// Display the checkout form. An empty cart redirects back to the cart page.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Response {
    let store = CartStore::restore(session).await;
    if store.cart().is_empty() {
        return Redirect::to("/cart").into_response();
    }

    CheckoutTemplate {
        cart: cart_view(&store, &state),
        form: CheckoutForm::default(),
        errors: CheckoutErrors::default(),
    }
    .into_response()
}

/// Place the order.
#[instrument(skip(state, session, auth, form), fields(email = %form.email))]
pub async fn place_order(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(auth): OptionalAuth,
    Form(form): Form<CheckoutForm>,
) -> Response {
    let mut store = CartStore::restore(session).await;
    if store.cart().is_empty() {
        return Redirect::to("/cart").into_response();
    }

    let errors = CheckoutErrors::validate(&form);
    if !errors.is_clean() {
        return CheckoutTemplate {
            cart: cart_view(&store, &state),
            form,
            errors,
        }
        .into_response();
    }

    let input = OrderInput {
        lignes: store
            .cart()
            .lines()
            .iter()
            .map(|line| OrderLineInput {
                monture_id: line.monture.id,
                quantite: line.quantite,
                prix_unitaire: line.monture.prix,
            })
            .collect(),
        total: store.cart().total_price().amount,
        nom: form.nom.trim().to_owned(),
        email: form.email.trim().to_lowercase(),
        telephone: {
            let telephone = form.telephone.trim();
            if telephone.is_empty() {
                None
            } else {
                Some(telephone.to_owned())
            }
        },
        adresse: form.adresse.trim().to_owned(),
        ville: form.ville.trim().to_owned(),
        code_postal: form.code_postal.trim().to_owned(),
    };

    let token = auth.as_ref().map(|credentials| credentials.token.as_str());
    match state.marketplace().create_order(&input, token).await {
        Ok(confirmation) => {
            store.clear().await;
            ConfirmationTemplate {
                order_id: confirmation.id.as_i32(),
                total: filters::format_eur(confirmation.total),
            }
            .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "order creation failed");
            CheckoutTemplate {
                cart: cart_view(&store, &state),
                form,
                errors: CheckoutErrors {
                    global: e.user_message(),
                    ..CheckoutErrors::default()
                },
            }
            .into_response()
        }
    }
}

fn cart_view(store: &CartStore, state: &AppState) -> CartView {
    CartView::from_cart(store.cart(), &state.config().marketplace)
}
