use crate::errors::{ErrorKind, StorefrontError, StorefrontResult};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Every collection the mock API knows about.
///
/// Each name maps to one fixture file (`<name>.json`) and one document store
/// file (`<name>.db`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionName {
    Products,
    Customers,
    Orders,
    Carts,
    Wishlists,
    Reviews,
    SupportTickets,
    AuthTokens,
    OtpSessions,
    Promotions,
    Returns,
    Notifications,
    Faq,
    Payments,
    Categories,
}

impl CollectionName {
    pub const ALL: [CollectionName; 15] = [
        CollectionName::Products,
        CollectionName::Customers,
        CollectionName::Orders,
        CollectionName::Carts,
        CollectionName::Wishlists,
        CollectionName::Reviews,
        CollectionName::SupportTickets,
        CollectionName::AuthTokens,
        CollectionName::OtpSessions,
        CollectionName::Promotions,
        CollectionName::Returns,
        CollectionName::Notifications,
        CollectionName::Faq,
        CollectionName::Payments,
        CollectionName::Categories,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionName::Products => "products",
            CollectionName::Customers => "customers",
            CollectionName::Orders => "orders",
            CollectionName::Carts => "carts",
            CollectionName::Wishlists => "wishlists",
            CollectionName::Reviews => "reviews",
            CollectionName::SupportTickets => "support_tickets",
            CollectionName::AuthTokens => "auth_tokens",
            CollectionName::OtpSessions => "otp_sessions",
            CollectionName::Promotions => "promotions",
            CollectionName::Returns => "returns",
            CollectionName::Notifications => "notifications",
            CollectionName::Faq => "faq",
            CollectionName::Payments => "payments",
            CollectionName::Categories => "categories",
        }
    }

    /// Prefix for generated entity ids: the first four characters of the name.
    pub fn id_prefix(&self) -> &'static str {
        let name = self.as_str();
        &name[..name.len().min(4)]
    }
}

impl Display for CollectionName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CollectionName {
    type Err = StorefrontError;

    fn from_str(s: &str) -> StorefrontResult<Self> {
        CollectionName::ALL
            .iter()
            .find(|name| name.as_str() == s)
            .copied()
            .ok_or_else(|| {
                StorefrontError::new(
                    &format!("Unknown collection '{}'", s),
                    ErrorKind::ValidationError,
                )
            })
    }
}
