//! Declarative catalog filter state and the debounce policy table.

use std::time::Duration;

use rust_decimal::Decimal;

use crate::marketplace::{ListParams, PAGE_SIZE, SortKey, SortOrder};

/// The full filter/sort state of a catalog view.
///
/// Unset structured fields are `None`, which is distinguishable from a field
/// explicitly set to an empty string; the search box defaults to empty text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogFilters {
    pub search: String,
    pub marque: Option<String>,
    pub type_monture: Option<String>,
    pub genre: Option<String>,
    pub forme: Option<String>,
    pub couleur: Option<String>,
    pub matiere: Option<String>,
    pub prix_min: Option<Decimal>,
    pub prix_max: Option<Decimal>,
    pub sort_by: SortKey,
    pub sort_order: SortOrder,
}

impl Default for CatalogFilters {
    fn default() -> Self {
        Self {
            search: String::new(),
            marque: None,
            type_monture: None,
            genre: None,
            forme: None,
            couleur: None,
            matiere: None,
            prix_min: None,
            prix_max: None,
            sort_by: SortKey::default(),
            sort_order: SortOrder::default(),
        }
    }
}

impl CatalogFilters {
    /// Apply one discrete field update.
    pub fn apply(&mut self, change: FilterChange) {
        match change {
            FilterChange::Search(value) => self.search = value,
            FilterChange::Marque(value) => self.marque = value,
            FilterChange::TypeMonture(value) => self.type_monture = value,
            FilterChange::Genre(value) => self.genre = value,
            FilterChange::Forme(value) => self.forme = value,
            FilterChange::Couleur(value) => self.couleur = value,
            FilterChange::Matiere(value) => self.matiere = value,
            FilterChange::PrixMin(value) => self.prix_min = value,
            FilterChange::PrixMax(value) => self.prix_max = value,
            FilterChange::Sort(key, order) => {
                self.sort_by = key;
                self.sort_order = order;
            }
        }
    }

    /// Resolve this filter state plus a page pointer into request parameters.
    ///
    /// Empty search text means "not searching" and is dropped; structured
    /// fields pass through as-is so an explicit empty survives.
    #[must_use]
    pub fn resolve(&self, page: u32) -> ListParams {
        ListParams {
            page,
            limit: PAGE_SIZE,
            search: if self.search.is_empty() {
                None
            } else {
                Some(self.search.clone())
            },
            marque: self.marque.clone(),
            type_monture: self.type_monture.clone(),
            genre: self.genre.clone(),
            forme: self.forme.clone(),
            couleur: self.couleur.clone(),
            matiere: self.matiere.clone(),
            prix_min: self.prix_min,
            prix_max: self.prix_max,
            sort_by: self.sort_by,
            sort_order: self.sort_order,
        }
    }
}

/// One discrete filter-field update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterChange {
    Search(String),
    Marque(Option<String>),
    TypeMonture(Option<String>),
    Genre(Option<String>),
    Forme(Option<String>),
    Couleur(Option<String>),
    Matiere(Option<String>),
    PrixMin(Option<Decimal>),
    PrixMax(Option<Decimal>),
    Sort(SortKey, SortOrder),
}

/// Debounce delays keyed by which kind of field changed.
///
/// Free-text search changes on every keystroke and gets the long window;
/// structured filters change once per discrete selection and get the short
/// one. An explicit table rather than an inference from field values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebouncePolicy {
    pub search: Duration,
    pub structured: Duration,
}

impl Default for DebouncePolicy {
    fn default() -> Self {
        Self {
            search: Duration::from_millis(800),
            structured: Duration::from_millis(300),
        }
    }
}

impl DebouncePolicy {
    /// Delay to apply for a given change.
    #[must_use]
    pub const fn delay_for(&self, change: &FilterChange) -> Duration {
        match change {
            FilterChange::Search(_) => self.search,
            _ => self.structured,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_unset() {
        let filters = CatalogFilters::default();
        assert!(filters.search.is_empty());
        assert_eq!(filters.marque, None);
        assert_eq!(filters.sort_by, SortKey::Date);
        assert_eq!(filters.sort_order, SortOrder::Desc);
    }

    #[test]
    fn test_unset_and_explicit_empty_differ() {
        let unset = CatalogFilters::default();
        let mut explicit = CatalogFilters::default();
        explicit.apply(FilterChange::Marque(Some(String::new())));
        assert_ne!(unset, explicit);
    }

    #[test]
    fn test_apply_updates_single_field() {
        let mut filters = CatalogFilters::default();
        filters.apply(FilterChange::Genre(Some("homme".to_owned())));
        filters.apply(FilterChange::Sort(SortKey::Prix, SortOrder::Asc));

        assert_eq!(filters.genre.as_deref(), Some("homme"));
        assert_eq!(filters.sort_by, SortKey::Prix);
        assert!(filters.marque.is_none());
    }

    #[test]
    fn test_resolve_drops_empty_search() {
        let filters = CatalogFilters::default();
        assert_eq!(filters.resolve(1).search, None);

        let mut searching = CatalogFilters::default();
        searching.apply(FilterChange::Search("aviateur".to_owned()));
        assert_eq!(searching.resolve(1).search.as_deref(), Some("aviateur"));
    }

    #[test]
    fn test_resolve_carries_page_and_limit() {
        let params = CatalogFilters::default().resolve(3);
        assert_eq!(params.page, 3);
        assert_eq!(params.limit, PAGE_SIZE);
    }

    #[test]
    fn test_policy_table() {
        let policy = DebouncePolicy::default();
        assert_eq!(
            policy.delay_for(&FilterChange::Search("x".to_owned())),
            Duration::from_millis(800)
        );
        assert_eq!(
            policy.delay_for(&FilterChange::Marque(Some("Lafont".to_owned()))),
            Duration::from_millis(300)
        );
        assert_eq!(
            policy.delay_for(&FilterChange::Sort(SortKey::Prix, SortOrder::Asc)),
            Duration::from_millis(300)
        );
        assert_eq!(
            policy.delay_for(&FilterChange::PrixMax(Some(Decimal::from(300)))),
            Duration::from_millis(300)
        );
    }
}
