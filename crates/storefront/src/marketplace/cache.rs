//! Cache types for marketplace API responses.

use crate::marketplace::types::{FilterOptions, MarketplaceStats, Monture, Opticien};

/// Cached value types.
///
/// Only reads that are stable across visitors are cached; anything derived
/// from cart or session state bypasses the cache entirely.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Monture(Box<Monture>),
    Similar(Vec<Monture>),
    Opticien(Box<Opticien>),
    Opticiens(Vec<Opticien>),
    Facets(FilterOptions),
    Stats(MarketplaceStats),
}
