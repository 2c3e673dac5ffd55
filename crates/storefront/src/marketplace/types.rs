//! Domain types for the marketplace REST API.
//!
//! These mirror the JSON payloads served by the backend. Field names follow
//! the API's camelCase convention via serde renames; the Rust side keeps the
//! marketplace's French domain vocabulary (monture, opticien).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use lunetier_core::{MontureId, MontureStatus, OpticienId, OrderId, OrderStatus};

// =============================================================================
// Catalog Entities
// =============================================================================

/// An eyewear frame listed on the marketplace.
///
/// Server-owned; the storefront never mutates one outside the admin views.
/// The cart keeps a snapshot copy taken at add-time, which may drift from
/// server truth until the next page load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Monture {
    pub id: MontureId,
    pub nom: String,
    pub marque: String,
    pub prix: Decimal,
    pub stock: u32,
    #[serde(rename = "type")]
    pub type_monture: Option<String>,
    pub genre: Option<String>,
    pub forme: Option<String>,
    pub couleur: Option<String>,
    pub matiere: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Stored filenames, resolved against the uploads host for display.
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub opticien_id: Option<OpticienId>,
    #[serde(default)]
    pub statut: MontureStatus,
}

impl Monture {
    /// First stored image filename, if any.
    #[must_use]
    pub fn cover_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

/// A professional seller profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opticien {
    pub id: OpticienId,
    pub nom_entreprise: String,
    pub email: String,
    #[serde(default)]
    pub telephone: Option<String>,
    #[serde(default)]
    pub adresse: Option<String>,
    #[serde(default)]
    pub ville: Option<String>,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

// =============================================================================
// List Endpoint
// =============================================================================

/// Server-reported pagination metadata, mirrored wholesale after each fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            total: 0,
            page: 1,
            limit: super::params::PAGE_SIZE,
            total_pages: 0,
        }
    }
}

/// One page of catalog results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonturePage {
    pub montures: Vec<Monture>,
    pub pagination: Pagination,
}

/// Server-supplied enumerations of valid filter values, used to populate
/// the filter sidebar.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterOptions {
    #[serde(default)]
    pub marques: Vec<String>,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub formes: Vec<String>,
    #[serde(default)]
    pub couleurs: Vec<String>,
    #[serde(default)]
    pub matieres: Vec<String>,
}

/// Aggregate marketplace statistics shown on the home page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketplaceStats {
    #[serde(default)]
    pub total_montures: u64,
    #[serde(default)]
    pub total_opticiens: u64,
    #[serde(default)]
    pub total_marques: u64,
    #[serde(default)]
    pub prix_moyen: Option<Decimal>,
}

// =============================================================================
// Orders
// =============================================================================

/// One line of an order being placed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineInput {
    pub monture_id: MontureId,
    pub quantite: u32,
    pub prix_unitaire: Decimal,
}

/// Payload for `POST /orders/create`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderInput {
    pub lignes: Vec<OrderLineInput>,
    pub total: Decimal,
    pub nom: String,
    pub email: String,
    pub telephone: Option<String>,
    pub adresse: String,
    pub ville: String,
    pub code_postal: String,
}

/// Response to a successful order creation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfirmation {
    pub id: OrderId,
    #[serde(default)]
    pub statut: OrderStatus,
    pub total: Decimal,
}

// =============================================================================
// Admin CRUD & Contact
// =============================================================================

/// Payload for creating or updating a monture record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MontureInput {
    pub nom: String,
    pub marque: String,
    pub prix: Decimal,
    pub stock: u32,
    #[serde(rename = "type")]
    pub type_monture: Option<String>,
    pub genre: Option<String>,
    pub forme: Option<String>,
    pub couleur: Option<String>,
    pub matiere: Option<String>,
    pub description: Option<String>,
}

/// Payload for `POST /contact`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    pub nom: String,
    pub email: String,
    pub sujet: Option<String>,
    pub message: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_monture_deserializes_backend_payload() {
        let json = serde_json::json!({
            "id": 3,
            "nom": "Panthos Écaille",
            "marque": "Lafont",
            "prix": "249.00",
            "stock": 4,
            "type": "optique",
            "genre": "femme",
            "forme": "ronde",
            "couleur": "écaille",
            "matiere": "acétate",
            "images": ["panthos-1.jpg", "panthos-2.jpg"],
            "opticienId": 11,
            "statut": "disponible"
        });

        let monture: Monture = serde_json::from_value(json).unwrap();
        assert_eq!(monture.id, MontureId::new(3));
        assert_eq!(monture.prix, Decimal::from(249));
        assert_eq!(monture.cover_image(), Some("panthos-1.jpg"));
        assert!(monture.statut.is_purchasable());
    }

    #[test]
    fn test_monture_tolerates_sparse_payload() {
        let json = serde_json::json!({
            "id": 9,
            "nom": "Basique",
            "marque": "SansMarque",
            "prix": "59.90",
            "stock": 0,
            "type": null,
            "genre": null,
            "forme": null,
            "couleur": null,
            "matiere": null
        });

        let monture: Monture = serde_json::from_value(json).unwrap();
        assert!(monture.images.is_empty());
        assert!(monture.cover_image().is_none());
        assert_eq!(monture.statut, MontureStatus::Disponible);
    }

    #[test]
    fn test_pagination_camel_case() {
        let json = serde_json::json!({
            "total": 37,
            "page": 2,
            "limit": 12,
            "totalPages": 4
        });

        let pagination: Pagination = serde_json::from_value(json).unwrap();
        assert_eq!(pagination.total_pages, 4);
    }
}
