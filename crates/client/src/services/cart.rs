//! Cart service client.

use async_trait::async_trait;
use serde::Serialize;
use tracing::instrument;
use url::Url;

use marigold_core::{Cart, ItemId, ProductId};

use crate::error::ApiError;
use crate::transport::Transport;

use super::CartApi;

const CART_PATH: &str = "/api/cart";
const CART_ITEMS_PATH: &str = "/api/cart/items";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AddItemRequest {
    product_id: ProductId,
    quantity: u32,
}

/// Thin client for the cart service.
#[derive(Clone)]
pub struct CartServiceClient {
    transport: Transport,
    base: Url,
}

impl CartServiceClient {
    /// Create a client for the cart service at `base`.
    #[must_use]
    pub const fn new(transport: Transport, base: Url) -> Self {
        Self { transport, base }
    }

    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        url.set_path(path);
        url
    }

    fn item_endpoint(&self, item_id: ItemId) -> Url {
        self.endpoint(&format!("{CART_ITEMS_PATH}/{item_id}"))
    }
}

#[async_trait]
impl CartApi for CartServiceClient {
    #[instrument(skip(self))]
    async fn fetch(&self) -> Result<Cart, ApiError> {
        self.transport.get_json(self.endpoint(CART_PATH)).await
    }

    #[instrument(skip(self), fields(product_id = %product_id, quantity))]
    async fn add_item(&self, product_id: ProductId, quantity: u32) -> Result<(), ApiError> {
        self.transport
            .post_unit(
                self.endpoint(CART_ITEMS_PATH),
                &AddItemRequest {
                    product_id,
                    quantity,
                },
            )
            .await
    }

    #[instrument(skip(self), fields(item_id = %item_id, quantity))]
    async fn update_item(&self, item_id: ItemId, quantity: u32) -> Result<Cart, ApiError> {
        let mut url = self.item_endpoint(item_id);
        url.query_pairs_mut()
            .append_pair("quantity", &quantity.to_string());
        self.transport.put_json(url).await
    }

    #[instrument(skip(self), fields(item_id = %item_id))]
    async fn remove_item(&self, item_id: ItemId) -> Result<(), ApiError> {
        self.transport.delete(self.item_endpoint(item_id)).await
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<(), ApiError> {
        self.transport.delete(self.endpoint(CART_PATH)).await
    }
}
