//! End-to-end test harness for the Marigold client engine.
//!
//! Stands up an in-process axum rendition of the cart, order, payment and
//! auth services - same routes, same wire shapes, same bearer-token checks -
//! and points the real reqwest clients at it. Each backend failure mode the
//! engine must tolerate can be injected per test.
//!
//! The mock is deliberately stateful (one cart, an order log, a payment
//! log) so tests can assert what actually reached each service, including
//! how many requests arrived and in what order quantities were applied.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use marigold_client::{ClientConfig, Engine};
use marigold_core::{
    Cart, CartItem, CheckoutPayload, ItemId, Order, OrderPage, PaymentId, PaymentInitRecord,
    PaymentIntent, PaymentRequest, ProductId,
};

/// The bearer token the mock services accept.
pub const TEST_TOKEN: &str = "integration-test-token";

/// The password the mock auth service accepts for any username.
pub const TEST_PASSWORD: &str = "hunter2";

/// An order as the mock order service stored it, with the payload that
/// created it.
pub struct StoredOrder {
    pub order: Order,
    pub payload: CheckoutPayload,
}

/// Shared state of the mock backend services.
pub struct BackendState {
    catalog: HashMap<i64, (&'static str, Decimal)>,
    pub cart: Mutex<Vec<CartItem>>,
    pub orders: Mutex<Vec<StoredOrder>>,
    pub payment_creates: Mutex<Vec<PaymentRequest>>,
    pub payment_inits: Mutex<Vec<PaymentInitRecord>>,
    pub intents: Mutex<Vec<PaymentIntent>>,
    /// Number of requests that reached any authenticated endpoint,
    /// including ones rejected with 401.
    pub requests: AtomicUsize,
    /// Absolute quantities applied by the update endpoint, in arrival order.
    pub cart_updates: Mutex<Vec<u32>>,
    pub fail_clear_cart: AtomicBool,
    pub fail_payment_create: AtomicBool,
    pub fail_payment_init: AtomicBool,
    next_order: AtomicI64,
    next_payment: AtomicI64,
}

impl Default for BackendState {
    fn default() -> Self {
        Self::new()
    }
}

impl BackendState {
    #[must_use]
    pub fn new() -> Self {
        let catalog = HashMap::from([
            (1, ("Masala Chai Sampler", Decimal::from(499))),
            (2, ("Brass Diya", Decimal::from(120))),
            (3, ("Handloom Throw", Decimal::from(1850))),
        ]);
        Self {
            catalog,
            cart: Mutex::new(Vec::new()),
            orders: Mutex::new(Vec::new()),
            payment_creates: Mutex::new(Vec::new()),
            payment_inits: Mutex::new(Vec::new()),
            intents: Mutex::new(Vec::new()),
            requests: AtomicUsize::new(0),
            cart_updates: Mutex::new(Vec::new()),
            fail_clear_cart: AtomicBool::new(false),
            fail_payment_create: AtomicBool::new(false),
            fail_payment_init: AtomicBool::new(false),
            next_order: AtomicI64::new(0),
            next_payment: AtomicI64::new(0),
        }
    }

    /// Put items straight into the server-side cart, bypassing the API.
    ///
    /// # Panics
    ///
    /// Panics on an unknown catalog product.
    pub fn seed_cart(&self, product_id: i64, quantity: u32) {
        let (name, price) = self.catalog[&product_id];
        self.cart.lock().expect("cart lock").push(CartItem {
            item_id: ItemId::new(product_id),
            product_id: ProductId::new(product_id),
            product_name: name.to_string(),
            unit_price: price,
            quantity,
            image_url: None,
            sku: None,
        });
    }

    fn cart_snapshot(&self) -> Cart {
        Cart {
            items: self.cart.lock().expect("cart lock").clone(),
        }
    }

    fn authorize(&self, headers: &HeaderMap) -> Result<(), Response> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let expected = format!("Bearer {TEST_TOKEN}");
        let ok = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value == expected);

        if ok {
            Ok(())
        } else {
            Err((
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "message": "Full authentication is required to access this resource"
                })),
            )
                .into_response())
        }
    }
}

type AppState = Arc<BackendState>;

/// A running mock backend plus the address it listens on.
pub struct MockBackend {
    pub state: AppState,
    pub base_url: Url,
}

/// Install a tracing subscriber for test runs, once.
///
/// Controlled by `RUST_LOG`; repeated calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

impl MockBackend {
    /// Bind the mock services to an ephemeral port and serve them.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound (test environment problem).
    pub async fn spawn() -> Self {
        init_tracing();
        let state = Arc::new(BackendState::new());
        let app = router(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock backend");
        let addr = listener.local_addr().expect("mock backend addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve mock backend");
        });

        Self {
            state,
            base_url: format!("http://{addr}")
                .parse()
                .expect("mock backend base url"),
        }
    }

    /// An engine pointed at the mock, signed out.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn engine(&self) -> Engine {
        Engine::new(ClientConfig::single_host(&self.base_url)).expect("build engine")
    }

    /// An engine that signed in through the mock auth service.
    ///
    /// # Panics
    ///
    /// Panics if sign-in fails.
    pub async fn signed_in_engine(&self) -> Engine {
        let engine = self.engine();
        engine
            .sign_in("asha", TEST_PASSWORD)
            .await
            .expect("sign in against mock auth service");
        engine
    }

    /// An engine with a token installed directly (no auth round-trip).
    #[must_use]
    pub fn engine_with_token(&self, token: &str) -> Engine {
        let engine = self.engine();
        engine
            .session()
            .sign_in(SecretString::from(token.to_string()), None);
        engine
    }
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/auth/signin", post(sign_in))
        .route("/api/cart", get(get_cart).delete(clear_cart))
        .route("/api/cart/items", post(add_item))
        .route(
            "/api/cart/items/{item_id}",
            put(update_item).delete(remove_item),
        )
        .route("/api/orders", get(list_orders))
        .route("/api/orders/from-cart", post(create_order_from_cart))
        .route("/api/orders/payment/init", post(record_payment_init))
        .route("/api/payment/create", post(create_payment))
        .with_state(state)
}

// ─────────────────────────────────────────────────────────────────────────────
// Auth service
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInBody {
    username_or_email: String,
    password: String,
}

async fn sign_in(Json(body): Json<SignInBody>) -> Response {
    if body.password == TEST_PASSWORD {
        Json(json!({
            "accessToken": TEST_TOKEN,
            "tokenType": "Bearer",
            "username": body.username_or_email,
        }))
        .into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Error: Bad credentials"})),
        )
            .into_response()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Cart service
// ─────────────────────────────────────────────────────────────────────────────

async fn get_cart(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(denied) = state.authorize(&headers) {
        return denied;
    }
    Json(state.cart_snapshot()).into_response()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddItemBody {
    product_id: i64,
    quantity: u32,
}

async fn add_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<AddItemBody>,
) -> Response {
    if let Err(denied) = state.authorize(&headers) {
        return denied;
    }

    let Some((name, price)) = state.catalog.get(&body.product_id).copied() else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"message": format!("Product not found: {}", body.product_id)})),
        )
            .into_response();
    };

    let mut cart = state.cart.lock().expect("cart lock");
    if let Some(line) = cart
        .iter_mut()
        .find(|line| line.product_id == ProductId::new(body.product_id))
    {
        line.quantity += body.quantity;
    } else {
        cart.push(CartItem {
            item_id: ItemId::new(body.product_id),
            product_id: ProductId::new(body.product_id),
            product_name: name.to_string(),
            unit_price: price,
            quantity: body.quantity,
            image_url: None,
            sku: None,
        });
    }
    drop(cart);

    Json(state.cart_snapshot()).into_response()
}

#[derive(Deserialize)]
struct UpdateParams {
    quantity: u32,
}

async fn update_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(item_id): Path<i64>,
    Query(params): Query<UpdateParams>,
) -> Response {
    if let Err(denied) = state.authorize(&headers) {
        return denied;
    }

    let mut cart = state.cart.lock().expect("cart lock");
    let Some(line) = cart
        .iter_mut()
        .find(|line| line.item_id == ItemId::new(item_id))
    else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"message": format!("Item not in cart: {item_id}")})),
        )
            .into_response();
    };
    line.quantity = params.quantity;
    drop(cart);

    state
        .cart_updates
        .lock()
        .expect("updates lock")
        .push(params.quantity);
    Json(state.cart_snapshot()).into_response()
}

async fn remove_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(item_id): Path<i64>,
) -> Response {
    if let Err(denied) = state.authorize(&headers) {
        return denied;
    }

    state
        .cart
        .lock()
        .expect("cart lock")
        .retain(|line| line.item_id != ItemId::new(item_id));
    Json(state.cart_snapshot()).into_response()
}

async fn clear_cart(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(denied) = state.authorize(&headers) {
        return denied;
    }

    if state.fail_clear_cart.load(Ordering::SeqCst) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"message": "redis unavailable"})),
        )
            .into_response();
    }

    state.cart.lock().expect("cart lock").clear();
    // The real cart service answers 204 No Content here.
    StatusCode::NO_CONTENT.into_response()
}

// ─────────────────────────────────────────────────────────────────────────────
// Order service
// ─────────────────────────────────────────────────────────────────────────────

async fn create_order_from_cart(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CheckoutPayload>,
) -> Response {
    if let Err(denied) = state.authorize(&headers) {
        return denied;
    }

    let cart = state.cart_snapshot();
    if cart.is_empty() {
        // The real service answers a bad request with a plain-text body.
        return (StatusCode::BAD_REQUEST, "Cart is empty").into_response();
    }

    let seq = state.next_order.fetch_add(1, Ordering::SeqCst);
    let order: Order = serde_json::from_value(json!({
        "id": 101 + seq,
        "orderNumber": format!("ORD-{}", 100 + seq),
        "totalAmount": cart.subtotal().to_string(),
        "status": "PENDING",
        "paymentStatus": "PENDING",
        "itemCount": cart.count(),
    }))
    .expect("order json");

    state.orders.lock().expect("orders lock").push(StoredOrder {
        order: order.clone(),
        payload,
    });
    Json(order).into_response()
}

#[derive(Deserialize, Default)]
struct PageParams {
    #[serde(default)]
    page: u32,
    #[serde(default = "default_page_size")]
    size: u32,
}

const fn default_page_size() -> u32 {
    10
}

async fn list_orders(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<PageParams>,
) -> Response {
    if let Err(denied) = state.authorize(&headers) {
        return denied;
    }

    let orders = state.orders.lock().expect("orders lock");
    let mut newest_first: Vec<Order> = orders.iter().map(|stored| stored.order.clone()).collect();
    drop(orders);
    newest_first.reverse();

    let size = params.size.max(1) as usize;
    let total = newest_first.len();
    let content: Vec<Order> = newest_first
        .into_iter()
        .skip(params.page as usize * size)
        .take(size)
        .collect();

    Json(OrderPage {
        content,
        total_pages: u32::try_from(total.div_ceil(size)).unwrap_or(0),
        total_elements: total as u64,
        number: params.page,
    })
    .into_response()
}

async fn record_payment_init(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(record): Json<PaymentInitRecord>,
) -> Response {
    if let Err(denied) = state.authorize(&headers) {
        return denied;
    }

    if state.fail_payment_init.load(Ordering::SeqCst) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"message": "order service unavailable"})),
        )
            .into_response();
    }

    state
        .payment_inits
        .lock()
        .expect("payment inits lock")
        .push(record);
    Json(json!({"recorded": true})).into_response()
}

// ─────────────────────────────────────────────────────────────────────────────
// Payment service
// ─────────────────────────────────────────────────────────────────────────────

async fn create_payment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<PaymentRequest>,
) -> Response {
    if let Err(denied) = state.authorize(&headers) {
        return denied;
    }

    state
        .payment_creates
        .lock()
        .expect("payment creates lock")
        .push(request.clone());

    if state.fail_payment_create.load(Ordering::SeqCst) {
        return (
            StatusCode::BAD_GATEWAY,
            Json(json!({"message": "gateway unreachable"})),
        )
            .into_response();
    }

    let seq = state.next_payment.fetch_add(1, Ordering::SeqCst);
    let txn_id = uuid::Uuid::new_v4().to_string();
    let intent = PaymentIntent {
        payment_id: PaymentId::new(format!("{}", 7 + seq)),
        txn_id: txn_id.clone(),
        amount: request.amount.to_string(),
        gateway_url: "https://test.payu.in/_payment".to_string(),
        key: "gtKFFx".to_string(),
        product_info: "Cart Order".to_string(),
        firstname: request.firstname,
        email: request.email,
        secure_hash: format!("sig-{txn_id}"),
        surl: "http://localhost:8086/api/payment/success".to_string(),
        furl: "http://localhost:8086/api/payment/failure".to_string(),
    };

    state
        .intents
        .lock()
        .expect("intents lock")
        .push(intent.clone());
    Json(intent).into_response()
}
