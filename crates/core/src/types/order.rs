//! Order types mirroring the order service's wire format.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::address::Address;
use super::id::OrderId;
use super::status::{OrderStatus, PaymentStatus};

/// Everything the order service needs to turn the current cart into an order.
///
/// Built once per checkout attempt by `CheckoutOrchestrator::build_payload`
/// and never mutated afterwards; the private fields keep it that way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutPayload {
    shipping_address: Address,
    billing_address: Address,
    payment_method: String,
}

impl CheckoutPayload {
    #[must_use]
    pub const fn new(
        shipping_address: Address,
        billing_address: Address,
        payment_method: String,
    ) -> Self {
        Self {
            shipping_address,
            billing_address,
            payment_method,
        }
    }

    #[must_use]
    pub const fn shipping_address(&self) -> &Address {
        &self.shipping_address
    }

    #[must_use]
    pub const fn billing_address(&self) -> &Address {
        &self.billing_address
    }

    #[must_use]
    pub fn payment_method(&self) -> &str {
        &self.payment_method
    }
}

/// An order as returned by the order service.
///
/// Once created the order is durable and outside client control; the client
/// can read it but never cancel or mutate it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    /// The authoritative amount for the whole checkout. Payment initiation
    /// must use this value, never a recomputed or displayed one.
    pub total_amount: Decimal,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub item_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDateTime>,
}

/// One page of the order history listing.
///
/// Matches the pageable envelope the order service wraps list responses in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPage {
    #[serde(default)]
    pub content: Vec<Order>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_elements: u64,
    /// Zero-based page index.
    #[serde(default)]
    pub number: u32,
}
