//! Client-side shopping cart.
//!
//! The cart is the one piece of state the storefront owns outright: a list
//! of monture snapshots with quantities, persisted as a JSON snapshot in the
//! visitor's session and rehydrated on every request. Totals are recomputed
//! from the lines by full re-reduction after every mutation rather than
//! maintained incrementally, so a snapshot can never carry drifted totals.
//!
//! Mutations are synchronous and infallible; callers validate stock before
//! calling in. Stock drift between a snapshot and server truth is handled
//! visually (warning banners on the cart page), never by mutating the cart.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use lunetier_core::{MontureId, Price};

use crate::marketplace::Monture;
use crate::models::session_keys;

/// One cart line: a monture snapshot and how many of it.
///
/// At most one line exists per monture id; adding the same monture again
/// increments the existing line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub monture: Monture,
    pub quantite: u32,
}

impl CartLine {
    /// Line total (unit price × quantity).
    #[must_use]
    pub fn total(&self) -> Price {
        Price::eur(self.monture.prix * Decimal::from(self.quantite))
    }
}

/// The shopping cart: ordered lines plus derived totals.
///
/// Only the lines are persisted; totals are rederived when a snapshot is
/// deserialized, so stored data cannot poison them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "CartSnapshot", into = "CartSnapshot")]
pub struct Cart {
    lines: Vec<CartLine>,
    total_items: u32,
    total_price: Price,
}

/// Persisted form of the cart.
#[derive(Serialize, Deserialize)]
struct CartSnapshot {
    lines: Vec<CartLine>,
}

impl From<CartSnapshot> for Cart {
    fn from(snapshot: CartSnapshot) -> Self {
        let mut cart = Self {
            lines: snapshot.lines,
            total_items: 0,
            total_price: Price::zero(),
        };
        cart.recompute();
        cart
    }
}

impl From<Cart> for CartSnapshot {
    fn from(cart: Cart) -> Self {
        Self { lines: cart.lines }
    }
}

impl Cart {
    /// Add `quantite` of a monture, merging into an existing line if present.
    ///
    /// The cart enforces no upper bound; stock clamping is the UI's job.
    /// Adding zero is a no-op.
    pub fn add(&mut self, monture: Monture, quantite: u32) {
        if quantite == 0 {
            return;
        }
        match self.lines.iter_mut().find(|l| l.monture.id == monture.id) {
            Some(line) => line.quantite += quantite,
            None => self.lines.push(CartLine { monture, quantite }),
        }
        self.recompute();
    }

    /// Remove the line for a monture. Absent ids are a silent no-op.
    pub fn remove(&mut self, id: MontureId) {
        self.lines.retain(|l| l.monture.id != id);
        self.recompute();
    }

    /// Overwrite a line's quantity exactly (not additive).
    ///
    /// A zero or negative quantity removes the line.
    pub fn set_quantity(&mut self, id: MontureId, quantite: i64) {
        if quantite <= 0 {
            self.remove(id);
            return;
        }
        let quantite = u32::try_from(quantite).unwrap_or(u32::MAX);
        if let Some(line) = self.lines.iter_mut().find(|l| l.monture.id == id) {
            line.quantite = quantite;
        }
        self.recompute();
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.recompute();
    }

    /// Whether a monture has a line in the cart.
    #[must_use]
    pub fn contains(&self, id: MontureId) -> bool {
        self.lines.iter().any(|l| l.monture.id == id)
    }

    /// Quantity carried for a monture, 0 when absent.
    #[must_use]
    pub fn quantity_of(&self, id: MontureId) -> u32 {
        self.lines
            .iter()
            .find(|l| l.monture.id == id)
            .map_or(0, |l| l.quantite)
    }

    /// Cart lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Sum of all line quantities.
    #[must_use]
    pub const fn total_items(&self) -> u32 {
        self.total_items
    }

    /// Sum of all line totals.
    #[must_use]
    pub const fn total_price(&self) -> Price {
        self.total_price
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Rederive both totals from the lines.
    ///
    /// Deliberately a full re-reduction on every mutation: incremental
    /// accumulation saves nothing at cart sizes and can drift.
    fn recompute(&mut self) {
        self.total_items = self.lines.iter().map(|l| l.quantite).sum();
        let total: Decimal = self
            .lines
            .iter()
            .map(|l| l.monture.prix * Decimal::from(l.quantite))
            .sum();
        self.total_price = Price::eur(total);
    }
}

// =============================================================================
// Session-backed store
// =============================================================================

/// Cart store bound to one visitor session.
///
/// Reads the persisted snapshot once at construction; a missing or
/// unparseable snapshot silently yields an empty cart. Every mutation
/// writes the snapshot back; write failures are logged, never surfaced.
pub struct CartStore {
    session: Session,
    cart: Cart,
}

impl CartStore {
    /// Rehydrate the cart from the session.
    #[instrument(skip(session))]
    pub async fn restore(session: Session) -> Self {
        let cart = match session.get::<Cart>(session_keys::CART).await {
            Ok(Some(cart)) => cart,
            Ok(None) => Cart::default(),
            Err(e) => {
                tracing::warn!(error = %e, "unreadable cart snapshot, starting from an empty cart");
                Cart::default()
            }
        };
        Self { session, cart }
    }

    /// Current cart.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Add to the cart and persist.
    pub async fn add(&mut self, monture: Monture, quantite: u32) -> &Cart {
        self.cart.add(monture, quantite);
        self.persist().await;
        &self.cart
    }

    /// Remove a line and persist.
    pub async fn remove(&mut self, id: MontureId) -> &Cart {
        self.cart.remove(id);
        self.persist().await;
        &self.cart
    }

    /// Overwrite a line's quantity and persist.
    pub async fn set_quantity(&mut self, id: MontureId, quantite: i64) -> &Cart {
        self.cart.set_quantity(id, quantite);
        self.persist().await;
        &self.cart
    }

    /// Empty the cart and persist.
    pub async fn clear(&mut self) -> &Cart {
        self.cart.clear();
        self.persist().await;
        &self.cart
    }

    /// Write the snapshot back to the session. Fire-and-forget: callers
    /// never see a persistence failure.
    async fn persist(&self) {
        if let Err(e) = self.session.insert(session_keys::CART, &self.cart).await {
            tracing::error!(error = %e, "failed to persist cart snapshot");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use lunetier_core::MontureStatus;

    fn monture(id: i32, prix: i64, stock: u32) -> Monture {
        Monture {
            id: MontureId::new(id),
            nom: format!("Monture {id}"),
            marque: "TestMarque".to_owned(),
            prix: Decimal::from(prix),
            stock,
            type_monture: None,
            genre: None,
            forme: None,
            couleur: None,
            matiere: None,
            description: None,
            images: Vec::new(),
            opticien_id: None,
            statut: MontureStatus::Disponible,
        }
    }

    #[test]
    fn test_repeated_adds_merge_into_one_line() {
        let mut cart = Cart::default();
        cart.add(monture(1, 100, 10), 1);
        cart.add(monture(1, 100, 10), 2);
        cart.add(monture(1, 100, 10), 3);

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.quantity_of(MontureId::new(1)), 6);
        assert_eq!(cart.total_items(), 6);
    }

    #[test]
    fn test_add_zero_is_a_noop() {
        let mut cart = Cart::default();
        cart.add(monture(1, 100, 10), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_worked_example_totals() {
        // P1 (500) ×2 and P2 (300) ×1 → (3, 1300); set P1 to 5 → (6, 2800)
        let mut cart = Cart::default();
        cart.add(monture(1, 500, 10), 2);
        cart.add(monture(2, 300, 10), 1);

        assert_eq!(cart.total_items(), 3);
        assert_eq!(cart.total_price().amount, Decimal::from(1300));

        cart.set_quantity(MontureId::new(1), 5);
        assert_eq!(cart.total_items(), 6);
        assert_eq!(cart.total_price().amount, Decimal::from(2800));
    }

    #[test]
    fn test_set_quantity_is_not_additive() {
        let mut cart = Cart::default();
        cart.add(monture(1, 100, 10), 4);
        cart.set_quantity(MontureId::new(1), 2);
        assert_eq!(cart.quantity_of(MontureId::new(1)), 2);
    }

    #[test]
    fn test_set_quantity_zero_removes_line() {
        let mut cart = Cart::default();
        cart.add(monture(1, 100, 10), 2);
        cart.set_quantity(MontureId::new(1), 0);
        assert!(!cart.contains(MontureId::new(1)));
        assert_eq!(cart.total_items(), 0);
    }

    #[test]
    fn test_set_quantity_negative_removes_line() {
        let mut cart = Cart::default();
        cart.add(monture(1, 100, 10), 2);
        cart.set_quantity(MontureId::new(1), -3);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_on_absent_id_is_a_noop() {
        let mut cart = Cart::default();
        cart.add(monture(1, 100, 10), 2);
        cart.set_quantity(MontureId::new(99), 5);
        assert_eq!(cart.total_items(), 2);
        assert!(!cart.contains(MontureId::new(99)));
    }

    #[test]
    fn test_remove_absent_id_is_a_noop() {
        let mut cart = Cart::default();
        cart.add(monture(1, 100, 10), 1);
        cart.remove(MontureId::new(42));
        assert_eq!(cart.total_items(), 1);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut cart = Cart::default();
        cart.add(monture(1, 500, 10), 2);
        cart.add(monture(2, 300, 10), 1);
        cart.clear();

        assert!(cart.is_empty());
        assert_eq!(cart.total_items(), 0);
        assert_eq!(cart.total_price().amount, Decimal::ZERO);
        assert!(!cart.contains(MontureId::new(1)));
        assert_eq!(cart.quantity_of(MontureId::new(2)), 0);
    }

    #[test]
    fn test_insertion_order_is_preserved() {
        let mut cart = Cart::default();
        cart.add(monture(3, 100, 10), 1);
        cart.add(monture(1, 100, 10), 1);
        cart.add(monture(2, 100, 10), 1);

        let ids: Vec<i32> = cart.lines().iter().map(|l| l.monture.id.as_i32()).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_snapshot_roundtrip_reproduces_cart() {
        let mut cart = Cart::default();
        cart.add(monture(1, 500, 10), 2);
        cart.add(monture(2, 300, 10), 1);

        let json = serde_json::to_string(&cart).unwrap();
        let restored: Cart = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, cart);
        assert_eq!(restored.total_items(), 3);
        assert_eq!(restored.total_price().amount, Decimal::from(1300));
    }

    #[test]
    fn test_snapshot_totals_are_rederived_not_trusted() {
        // A snapshot only carries lines; totals always come from recompute
        let json = serde_json::json!({
            "lines": [
                { "monture": serde_json::to_value(monture(1, 250, 5)).unwrap(), "quantite": 2 }
            ]
        });
        let cart: Cart = serde_json::from_value(json).unwrap();
        assert_eq!(cart.total_items(), 2);
        assert_eq!(cart.total_price().amount, Decimal::from(500));
    }

    #[test]
    fn test_line_total() {
        let line = CartLine {
            monture: monture(1, 129, 3),
            quantite: 3,
        };
        assert_eq!(line.total().amount, Decimal::from(387));
    }
}
