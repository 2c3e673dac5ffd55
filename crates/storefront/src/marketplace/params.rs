//! Resolved request parameters for the catalog list endpoint.
//!
//! [`ListParams`] is the fully-resolved form of a catalog query: every filter
//! field plus the page pointer. It is what actually goes on the wire, and it
//! is the equality key used by the query engine to suppress duplicate fetches.

use rust_decimal::Decimal;

/// Montures shown per catalog page.
pub const PAGE_SIZE: u32 = 12;

/// Sort key accepted by `GET /marketplace/montures`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Most recently listed first by default.
    #[default]
    Date,
    Prix,
    Nom,
}

impl SortKey {
    /// Wire value for the `sortBy` query parameter.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Prix => "prix",
            Self::Nom => "nom",
        }
    }

    /// Parse a wire value, falling back to the default on unknown input.
    #[must_use]
    pub fn from_param(s: &str) -> Self {
        match s {
            "prix" => Self::Prix,
            "nom" => Self::Nom,
            _ => Self::Date,
        }
    }
}

/// Sort direction accepted by `GET /marketplace/montures`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Wire value for the `sortOrder` query parameter.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    /// Parse a wire value, falling back to the default on unknown input.
    #[must_use]
    pub fn from_param(s: &str) -> Self {
        if s.eq_ignore_ascii_case("asc") {
            Self::Asc
        } else {
            Self::Desc
        }
    }
}

/// Fully-resolved parameters for one catalog list request.
///
/// Two requests with equal `ListParams` would return the same page, which is
/// why equality on this type is the dedupe criterion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
    pub page: u32,
    pub limit: u32,
    pub search: Option<String>,
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

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: PAGE_SIZE,
            search: None,
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

impl ListParams {
    /// Encode as query-string pairs, omitting unset filters entirely so the
    /// backend can tell "not filtered" from "filtered to empty".
    #[must_use]
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
            ("sortBy", self.sort_by.as_str().to_owned()),
            ("sortOrder", self.sort_order.as_str().to_owned()),
        ];

        let text_fields: [(&'static str, &Option<String>); 7] = [
            ("search", &self.search),
            ("marque", &self.marque),
            ("type", &self.type_monture),
            ("genre", &self.genre),
            ("forme", &self.forme),
            ("couleur", &self.couleur),
            ("matiere", &self.matiere),
        ];
        for (key, value) in text_fields {
            if let Some(value) = value {
                query.push((key, value.clone()));
            }
        }

        if let Some(min) = self.prix_min {
            query.push(("prixMin", min.to_string()));
        }
        if let Some(max) = self.prix_max {
            query.push(("prixMax", max.to_string()));
        }

        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_query_has_no_filters() {
        let query = ListParams::default().to_query();
        let keys: Vec<&str> = query.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["page", "limit", "sortBy", "sortOrder"]);
    }

    #[test]
    fn test_set_filters_are_encoded() {
        let params = ListParams {
            search: Some("aviateur".to_owned()),
            marque: Some("Ray-Ban".to_owned()),
            prix_max: Some(Decimal::from(300)),
            sort_by: SortKey::Prix,
            sort_order: SortOrder::Asc,
            ..ListParams::default()
        };

        let query = params.to_query();
        assert!(query.contains(&("search", "aviateur".to_owned())));
        assert!(query.contains(&("marque", "Ray-Ban".to_owned())));
        assert!(query.contains(&("prixMax", "300".to_owned())));
        assert!(query.contains(&("sortBy", "prix".to_owned())));
        assert!(query.contains(&("sortOrder", "ASC".to_owned())));
    }

    #[test]
    fn test_explicit_empty_search_still_encoded() {
        // An explicitly cleared search box is distinguishable from "never set"
        let params = ListParams {
            search: Some(String::new()),
            ..ListParams::default()
        };
        assert!(params.to_query().contains(&("search", String::new())));
    }

    #[test]
    fn test_equality_is_the_dedupe_key() {
        let a = ListParams {
            marque: Some("Persol".to_owned()),
            ..ListParams::default()
        };
        let b = a.clone();
        assert_eq!(a, b);

        let c = ListParams { page: 2, ..a.clone() };
        assert_ne!(a, c);
    }

    #[test]
    fn test_sort_key_from_param_fallback() {
        assert_eq!(SortKey::from_param("prix"), SortKey::Prix);
        assert_eq!(SortKey::from_param("inconnu"), SortKey::Date);
        assert_eq!(SortOrder::from_param("asc"), SortOrder::Asc);
        assert_eq!(SortOrder::from_param("n'importe"), SortOrder::Desc);
    }
}
