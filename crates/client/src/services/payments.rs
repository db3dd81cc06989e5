//! Payment service client.

use async_trait::async_trait;
use tracing::instrument;
use url::Url;

use marigold_core::{PaymentIntent, PaymentRequest};

use crate::error::ApiError;
use crate::transport::Transport;

use super::PaymentApi;

const PAYMENT_CREATE_PATH: &str = "/api/payment/create";

/// Thin client for the payment service.
#[derive(Clone)]
pub struct PaymentServiceClient {
    transport: Transport,
    base: Url,
}

impl PaymentServiceClient {
    /// Create a client for the payment service at `base`.
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
impl PaymentApi for PaymentServiceClient {
    #[instrument(skip(self, request), fields(order_id = %request.order_id))]
    async fn create(&self, request: &PaymentRequest) -> Result<PaymentIntent, ApiError> {
        self.transport
            .post_json(self.endpoint(PAYMENT_CREATE_PATH), request)
            .await
    }
}
