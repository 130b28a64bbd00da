use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Enum representing the possible statuses of a storefront order.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    /// Any status this client does not know about
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    /// Orders still waiting on fulfilment.
    pub fn is_pending(self) -> bool {
        self == OrderStatus::Pending
    }

    /// Orders that reached the customer.
    pub fn is_completed(self) -> bool {
        self == OrderStatus::Delivered
    }
}

/// Order as listed by the admin orders endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    #[serde(alias = "total")]
    pub total_amount: Decimal,
    pub status: OrderStatus,
    #[serde(default)]
    pub created_at: Option<String>,
}
