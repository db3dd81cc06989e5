//! Cart flow tests: the real reqwest clients against the in-process mock
//! services.

use std::sync::atomic::Ordering;

use marigold_client::{ApiError, AuthState};
use marigold_core::{ItemId, ProductId};
use marigold_integration_tests::MockBackend;

#[tokio::test]
async fn add_load_and_count_track_the_server_cart() {
    let backend = MockBackend::spawn().await;
    let engine = backend.signed_in_engine().await;

    let cart = engine.cart().add_item(ProductId::new(1), 2).await.unwrap();
    assert_eq!(cart.count(), 2);
    assert_eq!(engine.cart().count(), 2);

    let cart = engine.cart().add_item(ProductId::new(2), 1).await.unwrap();
    assert_eq!(cart.count(), 3);

    // The mirror is exactly the server's cart, item for item.
    let server_cart = marigold_core::Cart {
        items: backend.state.cart.lock().unwrap().clone(),
    };
    assert_eq!(engine.cart().snapshot(), server_cart);
}

#[tokio::test]
async fn update_overwrites_mirror_with_authoritative_response() {
    let backend = MockBackend::spawn().await;
    let engine = backend.signed_in_engine().await;
    backend.state.seed_cart(1, 2);
    engine.cart().load().await.unwrap();

    let cart = engine
        .cart()
        .update_item_quantity(ItemId::new(1), 5)
        .await
        .unwrap();

    assert_eq!(cart.item(ItemId::new(1)).unwrap().quantity, 5);
    assert_eq!(engine.cart().snapshot(), cart);
    assert_eq!(*backend.state.cart_updates.lock().unwrap(), vec![5]);
}

#[tokio::test]
async fn update_to_zero_issues_no_request() {
    let backend = MockBackend::spawn().await;
    let engine = backend.signed_in_engine().await;
    backend.state.seed_cart(1, 2);
    engine.cart().load().await.unwrap();

    let before_requests = backend.state.requests.load(Ordering::SeqCst);
    let before = engine.cart().snapshot();

    let after = engine
        .cart()
        .update_item_quantity(ItemId::new(1), 0)
        .await
        .unwrap();

    assert_eq!(after, before);
    assert_eq!(backend.state.requests.load(Ordering::SeqCst), before_requests);
    assert!(backend.state.cart_updates.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unauthenticated_add_issues_zero_network_calls() {
    let backend = MockBackend::spawn().await;
    let engine = backend.engine(); // never signed in

    let err = engine
        .cart()
        .add_item(ProductId::new(1), 1)
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Unauthenticated));
    assert_eq!(backend.state.requests.load(Ordering::SeqCst), 0);
    assert!(engine.cart().snapshot().is_empty());
}

#[tokio::test]
async fn unauthorized_response_invalidates_session_and_aborts() {
    let backend = MockBackend::spawn().await;
    let engine = backend.engine_with_token("stale-token");
    let mut auth_events = engine.session().subscribe();
    auth_events.mark_unchanged();

    let err = engine.cart().load().await.unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized));
    assert!(!engine.session().is_authenticated());
    assert_eq!(engine.session().state(), AuthState::LoginRequired);
    assert!(auth_events.has_changed().unwrap());

    // The dead token is gone, so the next call is rejected locally.
    let err = engine.cart().load().await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthenticated));
}

#[tokio::test]
async fn concurrent_increments_never_lose_an_update() {
    let backend = MockBackend::spawn().await;
    let engine = backend.signed_in_engine().await;
    backend.state.seed_cart(1, 2);
    engine.cart().load().await.unwrap();

    let store_a = engine.cart().clone();
    let store_b = engine.cart().clone();
    let (a, b) = tokio::join!(
        tokio::spawn(async move { store_a.adjust_item_quantity(ItemId::new(1), 1).await }),
        tokio::spawn(async move { store_b.adjust_item_quantity(ItemId::new(1), 1).await }),
    );
    a.unwrap().unwrap();
    b.unwrap().unwrap();

    // 2 -> 3 -> 4, never two conflicting writes of 3.
    assert_eq!(*backend.state.cart_updates.lock().unwrap(), vec![3, 4]);
    assert_eq!(
        backend.state.cart.lock().unwrap()[0].quantity,
        4,
        "final authoritative quantity must be 4, never 3"
    );
    assert_eq!(
        engine
            .cart()
            .snapshot()
            .item(ItemId::new(1))
            .unwrap()
            .quantity,
        4
    );
}

#[tokio::test]
async fn remove_item_resynchronizes_from_server() {
    let backend = MockBackend::spawn().await;
    let engine = backend.signed_in_engine().await;
    backend.state.seed_cart(1, 2);
    backend.state.seed_cart(2, 1);
    engine.cart().load().await.unwrap();

    let cart = engine.cart().remove_item(ItemId::new(1)).await.unwrap();

    assert!(cart.item(ItemId::new(1)).is_none());
    assert_eq!(cart.count(), 1);
    assert_eq!(backend.state.cart.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn clear_accepts_no_content_and_empties_both_sides() {
    let backend = MockBackend::spawn().await;
    let engine = backend.signed_in_engine().await;
    backend.state.seed_cart(1, 2);
    engine.cart().load().await.unwrap();

    // The mock answers 204 No Content, like the real cart service.
    engine.cart().clear().await;

    assert!(engine.cart().snapshot().is_empty());
    assert!(backend.state.cart.lock().unwrap().is_empty());
}

#[tokio::test]
async fn clear_failure_is_swallowed_and_resets_the_mirror() {
    let backend = MockBackend::spawn().await;
    let engine = backend.signed_in_engine().await;
    backend.state.seed_cart(1, 2);
    engine.cart().load().await.unwrap();
    backend
        .state
        .fail_clear_cart
        .store(true, Ordering::SeqCst);

    engine.cart().clear().await; // infallible by design

    assert!(engine.cart().snapshot().is_empty());
    // The server still has the items; reconciliation is not the client's job.
    assert_eq!(backend.state.cart.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn sign_in_rejection_surfaces_the_service_message() {
    let backend = MockBackend::spawn().await;
    let engine = backend.engine();

    let err = engine.sign_in("asha", "wrong-password").await.unwrap_err();

    match err {
        ApiError::Service { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Error: Bad credentials");
        }
        other => panic!("expected service error, got {other}"),
    }
    assert!(!engine.session().is_authenticated());
}
