//! Status enums shared with the order service.

use serde::{Deserialize, Serialize};

/// Order fulfillment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Returned,
    Refunded,
}

/// Payment status recorded against an order.
///
/// The client only ever writes `Initiated` (via the payment-init record);
/// the gateway callback path moves it to `Paid` or `Failed` server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Initiated,
    Paid,
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_match_service_spelling() {
        assert_eq!(
            serde_json::to_string(&PaymentStatus::Initiated).unwrap(),
            "\"INITIATED\""
        );
        assert_eq!(
            serde_json::to_string(&OrderStatus::Pending).unwrap(),
            "\"PENDING\""
        );
    }
}
