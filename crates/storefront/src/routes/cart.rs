//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! The cart itself lives in the session as a serialized snapshot; handlers
//! rehydrate a [`CartStore`], mutate it, and render fragments.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{AppendHeaders, Html, IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use lunetier_core::MontureId;

use crate::cart::{Cart, CartLine, CartStore};
use crate::config::MarketplaceConfig;
use crate::filters;
use crate::marketplace::MarketplaceClient;
use crate::routes::monture_image_url;
use crate::state::AppState;

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub id: i32,
    pub nom: String,
    pub marque: String,
    pub prix: String,
    pub quantite: u32,
    pub line_total: String,
    pub image: String,
    /// True when the wanted quantity exceeds the known stock. Purely
    /// visual; the cart is never mutated because of it.
    pub stock_warning: bool,
    pub stock: u32,
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub total_items: u32,
    pub total_price: String,
}

impl CartView {
    /// Build from the cart, using each line's snapshot stock.
    pub(crate) fn from_cart(cart: &Cart, marketplace: &MarketplaceConfig) -> Self {
        Self {
            items: cart
                .lines()
                .iter()
                .map(|line| CartItemView::from_line(line, line.monture.stock, marketplace))
                .collect(),
            total_items: cart.total_items(),
            total_price: cart.total_price().to_string(),
        }
    }

    /// Build from the cart with freshly fetched stock per line.
    ///
    /// Server truth may have drifted from the add-time snapshot; a fetch
    /// failure falls back to the snapshot value.
    async fn from_cart_with_fresh_stock(
        cart: &Cart,
        client: &MarketplaceClient,
        marketplace: &MarketplaceConfig,
    ) -> Self {
        let mut items = Vec::with_capacity(cart.lines().len());
        for line in cart.lines() {
            let stock = match client.monture(line.monture.id).await {
                Ok(fresh) => fresh.stock,
                Err(e) => {
                    tracing::warn!(error = %e, id = %line.monture.id, "failed to refresh stock");
                    line.monture.stock
                }
            };
            items.push(CartItemView::from_line(line, stock, marketplace));
        }

        Self {
            items,
            total_items: cart.total_items(),
            total_price: cart.total_price().to_string(),
        }
    }
}

impl CartItemView {
    fn from_line(line: &CartLine, stock: u32, marketplace: &MarketplaceConfig) -> Self {
        Self {
            id: line.monture.id.as_i32(),
            nom: line.monture.nom.clone(),
            marque: line.monture.marque.clone(),
            prix: filters::format_eur(line.monture.prix),
            quantite: line.quantite,
            line_total: line.total().to_string(),
            image: monture_image_url(&line.monture, marketplace),
            stock_warning: line.quantite > stock,
            stock,
        }
    }
}

// =============================================================================
// Form Data
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub monture_id: i32,
    pub quantite: Option<u32>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub monture_id: i32,
    pub quantite: i64,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub monture_id: i32,
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page with fresh per-line stock for the warning banners.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> CartShowTemplate {
    let store = CartStore::restore(session).await;
    let cart = CartView::from_cart_with_fresh_stock(
        store.cart(),
        state.marketplace(),
        &state.config().marketplace,
    )
    .await;

    CartShowTemplate { cart }
}

/// Add a monture to the cart (HTMX).
///
/// Fetches the monture to snapshot it into the cart, then returns the cart
/// count badge with an HTMX trigger so other fragments refresh themselves.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Response {
    let quantite = form.quantite.unwrap_or(1);

    let monture = match state.marketplace().monture(MontureId::new(form.monture_id)).await {
        Ok(monture) => monture,
        Err(e) => {
            tracing::error!(error = %e, "failed to fetch monture for cart add");
            return (
                StatusCode::BAD_GATEWAY,
                Html("<span class=\"text-red-500\">Impossible d'ajouter au panier</span>"),
            )
                .into_response();
        }
    };

    let mut store = CartStore::restore(session).await;
    let cart = store.add(monture, quantite).await;
    let count = cart.total_items();

    (
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartCountTemplate { count },
    )
        .into_response()
}

/// Overwrite a line's quantity (HTMX). Zero or negative removes the line.
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<UpdateCartForm>,
) -> Response {
    let mut store = CartStore::restore(session).await;
    let cart = store
        .set_quantity(MontureId::new(form.monture_id), form.quantite)
        .await;

    let cart = CartView::from_cart(cart, &state.config().marketplace);
    (
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartItemsTemplate { cart },
    )
        .into_response()
}

/// Remove a line from the cart (HTMX).
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RemoveFromCartForm>,
) -> Response {
    let mut store = CartStore::restore(session).await;
    let cart = store.remove(MontureId::new(form.monture_id)).await;

    let cart = CartView::from_cart(cart, &state.config().marketplace);
    (
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartItemsTemplate { cart },
    )
        .into_response()
}

/// Empty the cart (HTMX).
#[instrument(skip(state, session))]
pub async fn clear(State(state): State<AppState>, session: Session) -> Response {
    let mut store = CartStore::restore(session).await;
    let cart = store.clear().await;

    let cart = CartView::from_cart(cart, &state.config().marketplace);
    (
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartItemsTemplate { cart },
    )
        .into_response()
}

/// Get cart count badge (HTMX).
#[instrument(skip(session))]
pub async fn count(session: Session) -> CartCountTemplate {
    let store = CartStore::restore(session).await;
    CartCountTemplate {
        count: store.cart().total_items(),
    }
}
