//! Checkout sequence tests against the in-process mock services.

use std::sync::atomic::Ordering;

use rust_decimal::Decimal;
use marigold_client::{AddressFields, CheckoutError, CheckoutForm, CheckoutState, CheckoutStep};
use marigold_core::{OrderId, PaymentStatus, ProductId};
use marigold_integration_tests::MockBackend;

fn address() -> AddressFields {
    AddressFields {
        first_name: "Asha".into(),
        last_name: "Verma".into(),
        email: "asha@example.com".into(),
        phone: "+91 98765 43210".into(),
        address_line1: "14 MG Road".into(),
        address_line2: String::new(),
        city: "Bengaluru".into(),
        state: "KA".into(),
        postal_code: "560001".into(),
        country: "IN".into(),
    }
}

fn form() -> CheckoutForm {
    CheckoutForm {
        shipping: address(),
        billing: address(),
        payment_method: "PAYU".into(),
    }
}

#[tokio::test]
async fn checkout_end_to_end_reaches_the_gateway() {
    let backend = MockBackend::spawn().await;
    let engine = backend.signed_in_engine().await;
    backend.state.seed_cart(1, 2); // 2 x 499
    engine.cart().load().await.unwrap();

    let redirect = engine.checkout().checkout(&form()).await.unwrap();

    // The order was created from the cart with the stamped addresses.
    let orders = backend.state.orders.lock().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].order.id, OrderId::new(101));
    assert_eq!(orders[0].order.order_number, "ORD-100");
    assert_eq!(orders[0].order.total_amount, Decimal::from(998));
    drop(orders);

    // Payment was created for the authoritative order total.
    let creates = backend.state.payment_creates.lock().unwrap();
    assert_eq!(creates.len(), 1);
    assert_eq!(creates[0].amount, Decimal::from(998));
    assert_eq!(creates[0].order_id, OrderId::new(101));
    assert_eq!(creates[0].firstname, "Asha");
    drop(creates);

    // The INITIATED record landed before any redirect existed.
    let inits = backend.state.payment_inits.lock().unwrap();
    assert_eq!(inits.len(), 1);
    assert_eq!(inits[0].order_id, OrderId::new(101));
    assert_eq!(inits[0].order_number, "ORD-100");
    assert_eq!(inits[0].status, PaymentStatus::Initiated);
    assert_eq!(inits[0].amount, "998");
    drop(inits);

    // The redirect form echoes the service's exact strings.
    let intent = backend.state.intents.lock().unwrap()[0].clone();
    assert_eq!(redirect.action(), "https://test.payu.in/_payment");
    assert_eq!(redirect.field("amount"), Some("998"));
    assert_eq!(redirect.field("udf1"), Some("101"));
    assert_eq!(redirect.field("udf2"), Some(intent.payment_id.as_str()));
    assert_eq!(redirect.field("txnid"), Some(intent.txn_id.as_str()));
    assert_eq!(redirect.field("hash"), Some(intent.secure_hash.as_str()));

    // The cart was cleared on both sides and the state machine is terminal.
    assert!(backend.state.cart.lock().unwrap().is_empty());
    assert!(engine.cart().snapshot().is_empty());
    assert!(engine.checkout().state().is_terminal());

    // The rendered page auto-submits to the gateway.
    let html = redirect.to_html().unwrap();
    assert!(html.contains(r#"action="https://test.payu.in/_payment""#));
    assert!(html.contains(r#"name="udf1" value="101""#));
}

#[tokio::test]
async fn cart_clear_failure_never_blocks_a_paid_checkout() {
    let backend = MockBackend::spawn().await;
    let engine = backend.signed_in_engine().await;
    backend.state.seed_cart(1, 1);
    engine.cart().load().await.unwrap();
    backend
        .state
        .fail_clear_cart
        .store(true, Ordering::SeqCst);

    let redirect = engine.checkout().checkout(&form()).await;

    assert!(redirect.is_ok());
    assert_eq!(backend.state.orders.lock().unwrap().len(), 1);
    assert_eq!(backend.state.payment_creates.lock().unwrap().len(), 1);
    // The local mirror still resets; the server-side leftovers are a
    // back-office concern.
    assert!(engine.cart().snapshot().is_empty());
}

#[tokio::test]
async fn empty_cart_fails_at_order_creation_with_the_server_message() {
    let backend = MockBackend::spawn().await;
    let engine = backend.signed_in_engine().await;

    let err = engine.checkout().checkout(&form()).await.unwrap_err();

    match &err {
        CheckoutError::CreateOrder(source) => {
            assert!(source.to_string().contains("Cart is empty"));
        }
        other => panic!("expected create-order failure, got {other}"),
    }
    assert!(backend.state.payment_creates.lock().unwrap().is_empty());
    assert!(matches!(
        engine.checkout().state(),
        CheckoutState::Failed {
            step: CheckoutStep::CreateOrder,
            ..
        }
    ));
}

#[tokio::test]
async fn payment_failure_leaves_order_in_place_with_exactly_one_attempt() {
    let backend = MockBackend::spawn().await;
    let engine = backend.signed_in_engine().await;
    backend.state.seed_cart(2, 3);
    engine.cart().load().await.unwrap();
    backend
        .state
        .fail_payment_create
        .store(true, Ordering::SeqCst);

    let err = engine.checkout().checkout(&form()).await.unwrap_err();

    assert!(matches!(err, CheckoutError::InitiatePayment(_)));
    // The durable order exists; exactly one create attempt; no init record.
    assert_eq!(backend.state.orders.lock().unwrap().len(), 1);
    assert_eq!(backend.state.payment_creates.lock().unwrap().len(), 1);
    assert!(backend.state.payment_inits.lock().unwrap().is_empty());
}

#[tokio::test]
async fn record_failure_withholds_the_gateway_redirect() {
    let backend = MockBackend::spawn().await;
    let engine = backend.signed_in_engine().await;
    backend.state.seed_cart(1, 1);
    engine.cart().load().await.unwrap();
    backend
        .state
        .fail_payment_init
        .store(true, Ordering::SeqCst);

    let err = engine.checkout().checkout(&form()).await.unwrap_err();

    assert!(matches!(err, CheckoutError::RecordPaymentInit(_)));
    assert!(!engine.checkout().state().is_terminal());
    // A payment intent exists but was never handed to the gateway; the
    // dangling transaction is reconciliation's to find.
    assert_eq!(backend.state.intents.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn validation_failure_touches_no_service() {
    let backend = MockBackend::spawn().await;
    let engine = backend.signed_in_engine().await;
    let requests_before = backend.state.requests.load(Ordering::SeqCst);

    let mut bad_form = form();
    bad_form.billing.email = "  ".into();

    let err = engine.checkout().checkout(&bad_form).await.unwrap_err();

    match err {
        CheckoutError::Validation { missing_fields } => {
            assert_eq!(missing_fields, vec!["billingAddress.email".to_string()]);
        }
        other => panic!("expected validation failure, got {other}"),
    }
    assert_eq!(
        backend.state.requests.load(Ordering::SeqCst),
        requests_before
    );
}

#[tokio::test]
async fn order_history_lists_newest_first() {
    let backend = MockBackend::spawn().await;
    let engine = backend.signed_in_engine().await;

    for _ in 0..2 {
        engine.cart().add_item(ProductId::new(1), 1).await.unwrap();
        engine.checkout().checkout(&form()).await.unwrap();
    }

    let page = engine.order_history(0, 10).await.unwrap();
    assert_eq!(page.total_elements, 2);
    assert_eq!(page.content.len(), 2);
    assert_eq!(page.content[0].order_number, "ORD-101");
    assert_eq!(page.content[1].order_number, "ORD-100");
}
