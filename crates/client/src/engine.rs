//! Engine wiring shared by every consumer of the client.
//!
//! One [`Engine`] is constructed at startup and passed by reference to
//! whatever drives it (a UI shell, tests, a REPL). There are no ambient
//! globals: the session, the cart mirror and the checkout state machine all
//! live here and nowhere else.

use std::sync::Arc;

use crate::checkout::CheckoutOrchestrator;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::services::{
    AuthServiceClient, CartServiceClient, OrderApi, OrderServiceClient, PaymentServiceClient,
};
use crate::session::Session;
use crate::store::CartStore;
use crate::transport::Transport;

use marigold_core::OrderPage;

/// Session-scoped engine state.
///
/// Cheaply cloneable via `Arc`; all clones share one session, one cart
/// mirror and one checkout state machine.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    config: ClientConfig,
    session: Session,
    auth: AuthServiceClient,
    orders: Arc<OrderServiceClient>,
    cart: CartStore,
    checkout: CheckoutOrchestrator,
}

impl Engine {
    /// Wire up the engine from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client fails to build.
    pub fn new(config: ClientConfig) -> Result<Self, reqwest::Error> {
        let session = Session::new();
        let transport = Transport::new(session.clone(), config.request_timeout)?;

        let auth = AuthServiceClient::new(config.auth_service_url.clone());
        let cart_client = Arc::new(CartServiceClient::new(
            transport.clone(),
            config.cart_service_url.clone(),
        ));
        let orders = Arc::new(OrderServiceClient::new(
            transport.clone(),
            config.order_service_url.clone(),
        ));
        let payments = Arc::new(PaymentServiceClient::new(
            transport,
            config.payment_service_url.clone(),
        ));

        let cart = CartStore::new(cart_client);
        let checkout = CheckoutOrchestrator::new(orders.clone(), payments, cart.clone());

        Ok(Self {
            inner: Arc::new(EngineInner {
                config,
                session,
                auth,
                orders,
                cart,
                checkout,
            }),
        })
    }

    /// Get a reference to the client configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Get a reference to the session (token lifecycle, auth state).
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    /// Get a reference to the cart store.
    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    /// Get a reference to the checkout orchestrator.
    #[must_use]
    pub fn checkout(&self) -> &CheckoutOrchestrator {
        &self.inner.checkout
    }

    /// Sign in against the auth service and install the session credential.
    ///
    /// # Errors
    ///
    /// `ApiError::Service` with the auth service's message on rejected
    /// credentials; the session is left untouched on failure.
    pub async fn sign_in(&self, username_or_email: &str, password: &str) -> Result<(), ApiError> {
        let signin = self.inner.auth.sign_in(username_or_email, password).await?;
        self.inner.session.sign_in(signin.token, signin.user);
        Ok(())
    }

    /// Discard the session credential.
    pub fn sign_out(&self) {
        self.inner.session.sign_out();
    }

    /// Fetch one page of the user's order history, newest first.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn order_history(&self, page: u32, size: u32) -> Result<OrderPage, ApiError> {
        self.inner.orders.list(page, size).await
    }
}
