//! Core types for Marigold.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod cart;
pub mod id;
pub mod order;
pub mod payment;
pub mod status;

pub use address::{Address, AddressType};
pub use cart::{Cart, CartItem};
pub use id::*;
pub use order::{CheckoutPayload, Order, OrderPage};
pub use payment::{PaymentInitRecord, PaymentIntent, PaymentRequest};
pub use status::*;
