//! Order service client.

use async_trait::async_trait;
use tracing::instrument;
use url::Url;

use marigold_core::{CheckoutPayload, Order, OrderPage, PaymentInitRecord};

use crate::error::ApiError;
use crate::transport::Transport;

use super::OrderApi;

const ORDERS_PATH: &str = "/api/orders";
const FROM_CART_PATH: &str = "/api/orders/from-cart";
const PAYMENT_INIT_PATH: &str = "/api/orders/payment/init";

/// Thin client for the order service.
#[derive(Clone)]
pub struct OrderServiceClient {
    transport: Transport,
    base: Url,
}

impl OrderServiceClient {
    /// Create a client for the order service at `base`.
    #[must_use]
    pub const fn new(transport: Transport, base: Url) -> Self {
        Self { transport, base }
    }

    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        url.set_path(path);
        url
    }
}

#[async_trait]
impl OrderApi for OrderServiceClient {
    #[instrument(skip(self, payload))]
    async fn create_from_cart(&self, payload: &CheckoutPayload) -> Result<Order, ApiError> {
        self.transport
            .post_json(self.endpoint(FROM_CART_PATH), payload)
            .await
    }

    #[instrument(
        skip(self, record),
        fields(order_id = %record.order_id, payment_id = %record.payment_id)
    )]
    async fn record_payment_init(&self, record: &PaymentInitRecord) -> Result<(), ApiError> {
        self.transport
            .post_unit(self.endpoint(PAYMENT_INIT_PATH), record)
            .await
    }

    #[instrument(skip(self))]
    async fn list(&self, page: u32, size: u32) -> Result<OrderPage, ApiError> {
        let mut url = self.endpoint(ORDERS_PATH);
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("size", &size.to_string())
            .append_pair("sort", "createdAt,desc");
        self.transport.get_json(url).await
    }
}
