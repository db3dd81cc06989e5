//! Marigold storefront client engine.
//!
//! This crate is the headless core of the storefront: it keeps a local
//! mirror of the server-side cart consistent under concurrent user actions,
//! and turns a cart into a paid order by calling three independent backend
//! services (cart, order, payment) in a strict, irreversible sequence that
//! ends with a hand-off to an external payment gateway.
//!
//! # Architecture
//!
//! - [`session::Session`] holds the bearer token; it is the only place
//!   session lifecycle is decided (login, logout, unauthorized response).
//! - [`transport::Transport`] is the single outbound-request policy point:
//!   it attaches the token, refuses to issue requests without one, and
//!   applies the 401 policy for every call site.
//! - [`services`] defines the trait seams to the three backends plus the
//!   reqwest clients implementing them.
//! - [`store::CartStore`] owns the authoritative local cart mirror; all
//!   mutations serialize through it and renderers observe snapshots.
//! - [`checkout::CheckoutOrchestrator`] drives the
//!   order -> payment -> record -> redirect sequence as an explicit state
//!   machine with no automatic retries.
//! - [`gateway::GatewayRedirect`] is the terminal artifact: the one-shot
//!   form the embedding shell submits to the payment gateway.
//!
//! Rendering is deliberately absent. The engine emits state snapshots over
//! watch channels; any presentation layer subscribes to those.
//!
//! # Example
//!
//! ```rust,ignore
//! use marigold_client::{config::ClientConfig, engine::Engine};
//!
//! let engine = Engine::new(ClientConfig::from_env()?)?;
//! engine.sign_in("asha", "hunter2").await?;
//!
//! engine.cart().add_item(product_id, 1).await?;
//! let redirect = engine.checkout().checkout(form).await?;
//! // hand `redirect.to_html()` to the shell; control leaves the client here
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod checkout;
pub mod config;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod services;
pub mod session;
pub mod store;
pub mod transport;

pub use checkout::{AddressFields, CheckoutForm, CheckoutOrchestrator, CheckoutState, Payer};
pub use config::ClientConfig;
pub use engine::Engine;
pub use error::{ApiError, CheckoutError, CheckoutStep};
pub use gateway::GatewayRedirect;
pub use session::{AuthState, Session, UserProfile};
pub use store::CartStore;
