//! The authoritative local cart mirror.
//!
//! The remote cart is the only source of truth for prices and availability,
//! so the store never merges: every resynchronization replaces the mirror
//! wholesale with whatever the cart service returned.
//!
//! # Concurrency contract
//!
//! The mirror has exactly one writer: this store. All mutating operations
//! (and `load`, which also writes the mirror) serialize through one fair
//! async mutex held across the network round-trip, so at most one mutation
//! is in flight at a time and waiters run in request order. Renderers are
//! read-only observers of the current snapshot via [`CartStore::subscribe`].
//!
//! Without the serialization, two rapid "increase quantity" presses would
//! each read the old displayed quantity and issue conflicting
//! absolute-quantity updates - a classic lost update. The read-modify-write
//! variant [`CartStore::adjust_item_quantity`] therefore reads the mirror
//! *inside* the serialized section.

use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tracing::instrument;

use marigold_core::{Cart, ItemId, ProductId};

use crate::error::ApiError;
use crate::services::CartApi;

/// Single-writer store for the local cart mirror.
///
/// Cheaply cloneable; all clones share the same mirror and write gate.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    api: Arc<dyn CartApi>,
    /// Serializes mirror writers. Tokio's mutex queues waiters fairly, which
    /// gives the FIFO ordering the contract requires.
    write_gate: Mutex<()>,
    mirror: watch::Sender<Cart>,
}

impl CartStore {
    /// Create a store over a cart service boundary. The mirror starts empty
    /// until the first [`load`](Self::load).
    #[must_use]
    pub fn new(api: Arc<dyn CartApi>) -> Self {
        let (mirror, _) = watch::channel(Cart::empty());
        Self {
            inner: Arc::new(CartStoreInner {
                api,
                write_gate: Mutex::new(()),
                mirror,
            }),
        }
    }

    /// The current snapshot of the mirror. Never touches the network.
    #[must_use]
    pub fn snapshot(&self) -> Cart {
        self.inner.mirror.borrow().clone()
    }

    /// Total units in the mirrored cart. Never touches the network.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.inner.mirror.borrow().count()
    }

    /// Subscribe to mirror snapshots (for renderers).
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Cart> {
        self.inner.mirror.subscribe()
    }

    /// Fetch the remote cart and replace the mirror wholesale.
    ///
    /// # Errors
    ///
    /// On failure the mirror is left untouched.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<Cart, ApiError> {
        let _gate = self.inner.write_gate.lock().await;
        self.resync().await
    }

    /// Add `quantity` units of a product, then resynchronize.
    ///
    /// # Errors
    ///
    /// On failure nothing is applied locally - the mirror only ever changes
    /// to match a server response.
    #[instrument(skip(self), fields(product_id = %product_id, quantity))]
    pub async fn add_item(&self, product_id: ProductId, quantity: u32) -> Result<Cart, ApiError> {
        let _gate = self.inner.write_gate.lock().await;
        self.inner.api.add_item(product_id, quantity).await?;
        self.resync().await
    }

    /// Set a line's absolute quantity and overwrite the mirror with the
    /// server's authoritative response.
    ///
    /// A quantity of zero is ignored: the current snapshot is returned
    /// unchanged and no request is issued. Decrementing to zero must not
    /// remove the line - removal is only ever explicit via
    /// [`remove_item`](Self::remove_item).
    ///
    /// # Errors
    ///
    /// On failure the mirror is left untouched.
    #[instrument(skip(self), fields(item_id = %item_id, quantity))]
    pub async fn update_item_quantity(
        &self,
        item_id: ItemId,
        quantity: u32,
    ) -> Result<Cart, ApiError> {
        if quantity == 0 {
            return Ok(self.snapshot());
        }

        let _gate = self.inner.write_gate.lock().await;
        let cart = self.inner.api.update_item(item_id, quantity).await?;
        self.inner.mirror.send_replace(cart.clone());
        Ok(cart)
    }

    /// Change a line's quantity by `delta`, clamped to at least 1.
    ///
    /// The target quantity is computed from the authoritative mirror inside
    /// the serialized section, so two concurrent "+1" presses on a line at
    /// quantity 2 end at 4, never 3. An unknown item or a no-op delta
    /// returns the current snapshot without a request.
    ///
    /// # Errors
    ///
    /// On failure the mirror is left untouched.
    #[instrument(skip(self), fields(item_id = %item_id, delta))]
    pub async fn adjust_item_quantity(
        &self,
        item_id: ItemId,
        delta: i64,
    ) -> Result<Cart, ApiError> {
        let _gate = self.inner.write_gate.lock().await;

        let current = self
            .inner
            .mirror
            .borrow()
            .item(item_id)
            .map(|line| line.quantity);
        let Some(current) = current else {
            return Ok(self.snapshot());
        };

        let target = u32::try_from((i64::from(current) + delta).max(1)).unwrap_or(current);
        if target == current {
            return Ok(self.snapshot());
        }

        let cart = self.inner.api.update_item(item_id, target).await?;
        self.inner.mirror.send_replace(cart.clone());
        Ok(cart)
    }

    /// Remove a line, then resynchronize.
    ///
    /// # Errors
    ///
    /// On failure the mirror is left untouched.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn remove_item(&self, item_id: ItemId) -> Result<Cart, ApiError> {
        let _gate = self.inner.write_gate.lock().await;
        self.inner.api.remove_item(item_id).await?;
        self.resync().await
    }

    /// Clear the cart, best-effort.
    ///
    /// Clearing is advisory cleanup after order creation; it is never
    /// allowed to fail a caller whose real work already completed. A failed
    /// clear is logged and the mirror is reset to empty regardless, because
    /// the order service has already consumed the cart server-side.
    #[instrument(skip(self))]
    pub async fn clear(&self) {
        let _gate = self.inner.write_gate.lock().await;
        if let Err(error) = self.inner.api.clear().await {
            tracing::warn!(error = %error, "cart clear failed; resetting local mirror anyway");
        }
        self.inner.mirror.send_replace(Cart::empty());
    }

    /// Re-fetch the authoritative cart and replace the mirror.
    ///
    /// Callers must hold the write gate.
    async fn resync(&self) -> Result<Cart, ApiError> {
        let cart = self.inner.api.fetch().await?;
        self.inner.mirror.send_replace(cart.clone());
        Ok(cart)
    }
}
