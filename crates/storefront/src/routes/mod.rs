//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                        - Home page
//! GET  /health                  - Health check
//!
//! # Catalog
//! GET  /catalogue               - Catalog with filters/sort/pagination
//! GET  /catalogue/grid          - Catalog grid fragment (HTMX)
//! GET  /montures/{id}           - Monture detail
//!
//! # Cart (HTMX fragments)
//! GET  /cart                    - Cart page
//! POST /cart/add                - Add monture (returns count badge, triggers cart-updated)
//! POST /cart/update             - Overwrite quantity (returns cart_items fragment)
//! POST /cart/remove             - Remove line (returns cart_items fragment)
//! POST /cart/clear              - Empty the cart (returns cart_items fragment)
//! GET  /cart/count              - Cart count badge (fragment)
//!
//! # Checkout
//! GET  /checkout                - Checkout form
//! POST /checkout                - Place the order
//!
//! # Opticiens
//! GET  /opticiens               - Directory
//! GET  /opticiens/{id}          - Profile
//!
//! # Admin-style record views (bearer token required)
//! GET  /admin/montures          - Monture records list
//! GET  /admin/montures/new      - Creation form
//! POST /admin/montures/new      - Create record
//! GET  /admin/montures/{id}     - Record detail
//! GET  /admin/montures/{id}/edit  - Edit form
//! POST /admin/montures/{id}/edit  - Update record
//! POST /admin/montures/{id}/delete - Delete record
//!
//! # Contact
//! GET  /contact                 - Contact form
//! POST /contact                 - Submit (rate limited)
//! ```

pub mod admin;
pub mod cart;
pub mod catalogue;
pub mod checkout;
pub mod contact;
pub mod home;
pub mod montures;
pub mod opticiens;

use axum::{
    Router,
    routing::{get, post},
};

use crate::config::MarketplaceConfig;
use crate::marketplace::Monture;
use crate::middleware::{api_rate_limiter, contact_rate_limiter};
use crate::state::AppState;

/// Served when a monture or opticien has no stored image.
pub const PLACEHOLDER_IMAGE: &str = "/static/img/monture-placeholder.svg";

/// Resolve a monture's cover image against the uploads host, falling back
/// to the placeholder asset.
#[must_use]
pub fn monture_image_url(monture: &Monture, marketplace: &MarketplaceConfig) -> String {
    monture
        .cover_image()
        .map_or_else(|| PLACEHOLDER_IMAGE.to_owned(), |f| marketplace.image_url(f))
}

/// Create the catalog routes router.
pub fn catalogue_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(catalogue::index))
        .route("/grid", get(catalogue::grid))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
}

/// Create the admin record-view routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/montures", get(admin::index))
        .route("/montures/new", get(admin::new_form).post(admin::create))
        .route("/montures/{id}", get(admin::show))
        .route("/montures/{id}/edit", get(admin::edit_form).post(admin::update))
        .route("/montures/{id}/delete", post(admin::delete))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    // Cart and checkout share the relaxed API rate limit
    let commerce = Router::new()
        .nest("/cart", cart_routes())
        .route("/checkout", get(checkout::show).post(checkout::place_order))
        .layer(api_rate_limiter());

    Router::new()
        // Home page
        .route("/", get(home::home))
        // Catalog
        .nest("/catalogue", catalogue_routes())
        .route("/montures/{id}", get(montures::show))
        .merge(commerce)
        // Opticien directory
        .route("/opticiens", get(opticiens::index))
        .route("/opticiens/{id}", get(opticiens::show))
        // Admin record views
        .nest("/admin", admin_routes())
        // Contact form; only submissions get the strict limit
        .route(
            "/contact",
            post(contact::submit)
                .layer(contact_rate_limiter())
                .get(contact::show),
        )
}
