//! The checkout sequence: order, payment, record, gateway hand-off.
//!
//! Three independent services are called in a strict order with no
//! distributed transaction and no rollback authority. Once the order
//! service has created an order, the checkout is committed from a business
//! standpoint: every later failure leaves the durable order in place (with
//! at most an INITIATED payment record) for back-office reconciliation. No
//! step is ever retried automatically - retrying payment creation blindly
//! risks a duplicate charge attempt.
//!
//! Illegal orderings are unrepresentable rather than merely checked: each
//! step consumes the typed output of the previous one, so payment cannot be
//! initiated without an [`Order`] and nothing can be recorded without a
//! [`PaymentIntent`]. The [`CheckoutState`] machine mirrors the progression
//! for observers.

use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::watch;
use tracing::instrument;

use marigold_core::{
    Address, AddressType, CheckoutPayload, Order, OrderId, PaymentId, PaymentInitRecord,
    PaymentIntent, PaymentRequest, PaymentStatus,
};

use crate::error::{ApiError, CheckoutError, CheckoutStep};
use crate::gateway::GatewayRedirect;
use crate::services::{OrderApi, PaymentApi};
use crate::store::CartStore;

/// Raw address fields as captured by a checkout form.
///
/// Everything is an unvalidated string at this point; `build_payload` is
/// the single place they are checked and promoted to an [`Address`].
#[derive(Debug, Clone, Default)]
pub struct AddressFields {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address_line1: String,
    pub address_line2: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

/// Raw checkout form input.
#[derive(Debug, Clone, Default)]
pub struct CheckoutForm {
    pub shipping: AddressFields,
    pub billing: AddressFields,
    pub payment_method: String,
}

/// The person the payment is created for; taken from the billing address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payer {
    pub firstname: String,
    pub email: String,
}

impl Payer {
    /// Derive the payer from a billing address.
    #[must_use]
    pub fn from_billing(address: &Address) -> Self {
        Self {
            firstname: address.first_name.clone(),
            email: address.email.clone(),
        }
    }
}

/// Where a checkout attempt currently stands.
///
/// `GatewayRedirect` is terminal: control leaves the client when the form
/// is submitted. `Failed` absorbs every error; a new attempt starts back at
/// `Idle`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CheckoutState {
    #[default]
    Idle,
    PayloadBuilt,
    OrderCreated {
        order_id: OrderId,
        order_number: String,
        /// The authoritative checkout amount, captured from the order.
        amount: Decimal,
    },
    PaymentInitiated {
        order_id: OrderId,
        payment_id: PaymentId,
    },
    GatewayRedirect {
        gateway_url: String,
    },
    Failed {
        step: CheckoutStep,
        message: String,
    },
}

impl CheckoutState {
    /// True once control is about to leave the client.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::GatewayRedirect { .. })
    }
}

/// Drives a cart through order creation, payment initiation and gateway
/// hand-off.
///
/// Cheaply cloneable; all clones share the same state machine.
#[derive(Clone)]
pub struct CheckoutOrchestrator {
    inner: Arc<OrchestratorInner>,
}

struct OrchestratorInner {
    orders: Arc<dyn OrderApi>,
    payments: Arc<dyn PaymentApi>,
    cart: CartStore,
    state: watch::Sender<CheckoutState>,
}

impl CheckoutOrchestrator {
    /// Create an orchestrator over the order and payment boundaries.
    #[must_use]
    pub fn new(orders: Arc<dyn OrderApi>, payments: Arc<dyn PaymentApi>, cart: CartStore) -> Self {
        let (state, _) = watch::channel(CheckoutState::Idle);
        Self {
            inner: Arc::new(OrchestratorInner {
                orders,
                payments,
                cart,
                state,
            }),
        }
    }

    /// The current state of the attempt.
    #[must_use]
    pub fn state(&self) -> CheckoutState {
        self.inner.state.borrow().clone()
    }

    /// Subscribe to state transitions (for progress observers).
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CheckoutState> {
        self.inner.state.subscribe()
    }

    /// Validate the form and build the immutable checkout payload.
    ///
    /// Purely local: no cart access, no network. Address types are stamped
    /// here (`SHIPPING`/`BILLING` per side) rather than trusted from input.
    ///
    /// # Errors
    ///
    /// `CheckoutError::Validation` listing every missing field by its
    /// dotted wire name, e.g. `billingAddress.email`.
    pub fn build_payload(&self, form: &CheckoutForm) -> Result<CheckoutPayload, CheckoutError> {
        let mut missing_fields = Vec::new();
        collect_missing("shippingAddress", &form.shipping, &mut missing_fields);
        collect_missing("billingAddress", &form.billing, &mut missing_fields);
        if form.payment_method.trim().is_empty() {
            missing_fields.push("paymentMethod".to_string());
        }

        if !missing_fields.is_empty() {
            return Err(self.fail(
                CheckoutStep::BuildPayload,
                CheckoutError::Validation { missing_fields },
            ));
        }

        let payload = CheckoutPayload::new(
            build_address(&form.shipping, AddressType::Shipping),
            build_address(&form.billing, AddressType::Billing),
            form.payment_method.trim().to_string(),
        );
        self.inner.state.send_replace(CheckoutState::PayloadBuilt);
        Ok(payload)
    }

    /// Create the order from the server-side cart. This is the commit point.
    ///
    /// On success the returned order's `totalAmount` is the authoritative
    /// amount for the rest of the sequence, and the local cart is cleared
    /// best-effort (a failed clear is logged by the store and never
    /// surfaces here).
    ///
    /// # Errors
    ///
    /// `CheckoutError::CreateOrder`; no order exists and nothing is retried.
    #[instrument(skip(self, payload))]
    pub async fn create_order(&self, payload: &CheckoutPayload) -> Result<Order, CheckoutError> {
        let order = self
            .inner
            .orders
            .create_from_cart(payload)
            .await
            .map_err(|e| {
                self.fail(
                    CheckoutStep::CreateOrder,
                    step_error(e, CheckoutError::CreateOrder),
                )
            })?;

        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            total = %order.total_amount,
            "order created from cart"
        );
        self.inner.state.send_replace(CheckoutState::OrderCreated {
            order_id: order.id,
            order_number: order.order_number.clone(),
            amount: order.total_amount,
        });

        // Advisory cleanup; the order service already consumed the cart.
        self.inner.cart.clear().await;

        Ok(order)
    }

    /// Create the payment transaction for an order.
    ///
    /// `amount` must be the order's `totalAmount` - never a value
    /// recomputed from the UI or from the (already cleared) cart.
    ///
    /// # Errors
    ///
    /// `CheckoutError::InitiatePayment`. Never retried: the order already
    /// exists and a blind retry risks a duplicate payment intent. The order
    /// is left in place - the client cannot cancel it.
    #[instrument(skip(self, order, payer), fields(order_id = %order.id, amount = %amount))]
    pub async fn initiate_payment(
        &self,
        order: &Order,
        amount: Decimal,
        payer: &Payer,
    ) -> Result<PaymentIntent, CheckoutError> {
        let request = PaymentRequest {
            order_id: order.id,
            firstname: payer.firstname.clone(),
            email: payer.email.clone(),
            amount,
        };

        let intent = self.inner.payments.create(&request).await.map_err(|e| {
            self.fail(
                CheckoutStep::InitiatePayment,
                step_error(e, CheckoutError::InitiatePayment),
            )
        })?;

        self.inner
            .state
            .send_replace(CheckoutState::PaymentInitiated {
                order_id: order.id,
                payment_id: intent.payment_id.clone(),
            });
        Ok(intent)
    }

    /// Durably record the payment attempt against the order, before any
    /// redirect.
    ///
    /// The next step navigates the browser away; if that navigation never
    /// completes there must already be a server-side INITIATED record so
    /// reconciliation can find the dangling attempt.
    ///
    /// # Errors
    ///
    /// `CheckoutError::RecordPaymentInit`; the redirect must be withheld.
    #[instrument(skip(self, order, intent), fields(order_id = %order.id, payment_id = %intent.payment_id))]
    pub async fn record_payment_initiated(
        &self,
        order: &Order,
        intent: &PaymentIntent,
    ) -> Result<(), CheckoutError> {
        let record = PaymentInitRecord {
            order_id: order.id,
            order_number: order.order_number.clone(),
            payment_id: intent.payment_id.clone(),
            status: PaymentStatus::Initiated,
            amount: intent.amount.clone(),
        };

        self.inner
            .orders
            .record_payment_init(&record)
            .await
            .map_err(|e| {
                self.fail(
                    CheckoutStep::RecordPaymentInit,
                    step_error(e, CheckoutError::RecordPaymentInit),
                )
            })
    }

    /// Build the one-shot gateway form and enter the terminal state.
    ///
    /// Nothing runs after the embedding shell submits this form.
    #[must_use]
    pub fn redirect_to_gateway(&self, order: &Order, intent: &PaymentIntent) -> GatewayRedirect {
        let redirect = GatewayRedirect::new(order, intent);
        self.inner
            .state
            .send_replace(CheckoutState::GatewayRedirect {
                gateway_url: redirect.action().to_string(),
            });
        redirect
    }

    /// Drive the whole sequence from form input to gateway form.
    ///
    /// Strictly sequential; every step is awaited to completion before the
    /// next begins, and any failure is terminal for the attempt (retry
    /// starts over from `Idle`).
    ///
    /// # Errors
    ///
    /// The first step's error, with the state machine left in `Failed`.
    #[instrument(skip(self, form))]
    pub async fn checkout(&self, form: &CheckoutForm) -> Result<GatewayRedirect, CheckoutError> {
        self.inner.state.send_replace(CheckoutState::Idle);

        let payload = self.build_payload(form)?;
        let order = self.create_order(&payload).await?;
        let payer = Payer::from_billing(payload.billing_address());
        let intent = self
            .initiate_payment(&order, order.total_amount, &payer)
            .await?;
        self.record_payment_initiated(&order, &intent).await?;

        Ok(self.redirect_to_gateway(&order, &intent))
    }

    fn fail(&self, step: CheckoutStep, error: CheckoutError) -> CheckoutError {
        self.inner.state.send_replace(CheckoutState::Failed {
            step,
            message: error.to_string(),
        });
        error
    }
}

/// Wrap a service failure in its step's error, except auth failures which
/// are uniform across steps.
fn step_error(error: ApiError, wrap: fn(ApiError) -> CheckoutError) -> CheckoutError {
    if error.is_auth_failure() {
        CheckoutError::Unauthenticated
    } else {
        wrap(error)
    }
}

fn collect_missing(prefix: &str, fields: &AddressFields, missing: &mut Vec<String>) {
    let required = [
        ("firstName", fields.first_name.as_str()),
        ("lastName", fields.last_name.as_str()),
        ("email", fields.email.as_str()),
        ("phone", fields.phone.as_str()),
        ("addressLine1", fields.address_line1.as_str()),
        ("city", fields.city.as_str()),
        ("state", fields.state.as_str()),
        ("postalCode", fields.postal_code.as_str()),
        ("country", fields.country.as_str()),
    ];

    for (name, value) in required {
        if value.trim().is_empty() {
            missing.push(format!("{prefix}.{name}"));
        }
    }
}

fn build_address(fields: &AddressFields, address_type: AddressType) -> Address {
    let line2 = fields.address_line2.trim();
    Address {
        first_name: fields.first_name.trim().to_string(),
        last_name: fields.last_name.trim().to_string(),
        email: fields.email.trim().to_string(),
        phone: fields.phone.trim().to_string(),
        address_line1: fields.address_line1.trim().to_string(),
        address_line2: (!line2.is_empty()).then(|| line2.to_string()),
        city: fields.city.trim().to_string(),
        state: fields.state.trim().to_string(),
        postal_code: fields.postal_code.trim().to_string(),
        country: fields.country.trim().to_string(),
        address_type,
        is_default: true,
    }
}
