//! Status enums for marketplace entities.

use serde::{Deserialize, Serialize};

/// Availability status of a monture in the catalog.
///
/// The backend owns these transitions; the storefront only renders them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MontureStatus {
    /// Listed and purchasable.
    #[default]
    Disponible,
    /// Listed but awaiting validation by the marketplace.
    EnAttente,
    /// Sold out, kept for order history.
    Vendu,
    /// Withdrawn by the opticien.
    Retiree,
}

impl MontureStatus {
    /// Whether the monture can currently be added to a cart.
    #[must_use]
    pub const fn is_purchasable(self) -> bool {
        matches!(self, Self::Disponible)
    }
}

impl std::fmt::Display for MontureStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disponible => write!(f, "disponible"),
            Self::EnAttente => write!(f, "en_attente"),
            Self::Vendu => write!(f, "vendu"),
            Self::Retiree => write!(f, "retiree"),
        }
    }
}

/// Lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    EnAttente,
    Confirmee,
    Expediee,
    Livree,
    Annulee,
}

/// Role attached to an authenticated marketplace account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// End customer browsing and buying.
    Client,
    /// Professional seller managing their montures.
    Opticien,
    /// Marketplace operator.
    Admin,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Client => write!(f, "client"),
            Self::Opticien => write!(f, "opticien"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client" => Ok(Self::Client),
            "opticien" => Ok(Self::Opticien),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid user role: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_monture_status_purchasable() {
        assert!(MontureStatus::Disponible.is_purchasable());
        assert!(!MontureStatus::Vendu.is_purchasable());
        assert!(!MontureStatus::EnAttente.is_purchasable());
        assert!(!MontureStatus::Retiree.is_purchasable());
    }

    #[test]
    fn test_monture_status_serde() {
        let json = serde_json::to_string(&MontureStatus::EnAttente).unwrap();
        assert_eq!(json, "\"en_attente\"");

        let parsed: MontureStatus = serde_json::from_str("\"disponible\"").unwrap();
        assert_eq!(parsed, MontureStatus::Disponible);
    }

    #[test]
    fn test_user_role_roundtrip() {
        for role in [UserRole::Client, UserRole::Opticien, UserRole::Admin] {
            let parsed: UserRole = role.to_string().parse().unwrap();
            assert_eq!(parsed, role);
        }
    }

    #[test]
    fn test_user_role_invalid() {
        assert!("superviseur".parse::<UserRole>().is_err());
    }
}
