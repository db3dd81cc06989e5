//! Remote service boundaries.
//!
//! Each backend service gets a trait seam plus a thin reqwest client
//! implementing it over the shared [`crate::transport::Transport`]. The
//! engine core (`CartStore`, `CheckoutOrchestrator`) only ever sees the
//! traits, so tests can swap in in-memory fakes.

mod auth;
mod cart;
mod orders;
mod payments;

pub use auth::{AuthServiceClient, SignIn};
pub use cart::CartServiceClient;
pub use orders::OrderServiceClient;
pub use payments::PaymentServiceClient;

use async_trait::async_trait;

use marigold_core::{
    Cart, CheckoutPayload, ItemId, Order, OrderPage, PaymentInitRecord, PaymentIntent,
    PaymentRequest, ProductId,
};

use crate::error::ApiError;

/// Cart service boundary.
#[async_trait]
pub trait CartApi: Send + Sync {
    /// Fetch the full authoritative cart.
    async fn fetch(&self) -> Result<Cart, ApiError>;

    /// Add `quantity` units of a product. The response body is ignored;
    /// callers re-fetch to resynchronize.
    async fn add_item(&self, product_id: ProductId, quantity: u32) -> Result<(), ApiError>;

    /// Set a line's absolute quantity. Returns the full updated cart.
    async fn update_item(&self, item_id: ItemId, quantity: u32) -> Result<Cart, ApiError>;

    /// Remove a line entirely.
    async fn remove_item(&self, item_id: ItemId) -> Result<(), ApiError>;

    /// Clear the whole cart. 200 and 204 both count as success.
    async fn clear(&self) -> Result<(), ApiError>;
}

/// Order service boundary.
#[async_trait]
pub trait OrderApi: Send + Sync {
    /// Create an order from the server-side cart of the current session.
    async fn create_from_cart(&self, payload: &CheckoutPayload) -> Result<Order, ApiError>;

    /// Durably record that a payment attempt was started for an order.
    async fn record_payment_init(&self, record: &PaymentInitRecord) -> Result<(), ApiError>;

    /// List the session user's orders, newest first.
    async fn list(&self, page: u32, size: u32) -> Result<OrderPage, ApiError>;
}

/// Payment service boundary.
#[async_trait]
pub trait PaymentApi: Send + Sync {
    /// Create a payment transaction and the gateway fields for it.
    async fn create(&self, request: &PaymentRequest) -> Result<PaymentIntent, ApiError>;
}
