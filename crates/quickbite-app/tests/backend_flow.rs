use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::{Json, Router};
use dashmap::DashMap;
use quickbite_client::QuickBiteClient;
use quickbite_core::application::order_board::{OrderBoard, Refresh};
use quickbite_core::application::polling::spawn_polling;
use quickbite_core::application::progression::Outcome;
use quickbite_core::inbound::console::{Console, Reply};
use quickbite_core::outbound::notifier::TracingNotifier;
use quickbite_types::domain::order::{Order, OrderItem, OrderStatus, Rates};
use quickbite_types::domain::stepper::Density;
use quickbite_types::ports::credentials::StaticCredentials;
use serde::Deserialize;
use serde_json::{json, Value};

const RATES: Rates = Rates {
    tax_bps: 800,
    service_fee_bps: 1_000,
};

#[derive(Clone, Default)]
struct Backend {
    orders: Arc<DashMap<String, Order>>,
    patches: Arc<AtomicUsize>,
    failing: Arc<AtomicBool>,
}

#[derive(Deserialize)]
struct StatusBody {
    status: OrderStatus,
}

async fn list_orders(State(backend): State<Backend>) -> Json<Value> {
    let orders: Vec<Order> = backend.orders.iter().map(|kv| kv.value().clone()).collect();
    Json(json!({ "success": true, "count": orders.len(), "data": orders }))
}

async fn update_status(
    State(backend): State<Backend>,
    Path(id): Path<String>,
    Json(body): Json<StatusBody>,
) -> (StatusCode, Json<Value>) {
    backend.patches.fetch_add(1, Ordering::SeqCst);
    if backend.failing.load(Ordering::SeqCst) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "success": false, "message": "database unavailable" })),
        );
    }
    match backend.orders.get_mut(&id) {
        Some(mut order) => {
            order.update_status(body.status);
            (StatusCode::OK, Json(json!({ "success": true, "data": order.clone() })))
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "success": false, "message": "Order not found" })),
        ),
    }
}

async fn start(backend: Backend) -> String {
    let app = Router::new()
        .route("/api/admin/orders", get(list_orders))
        .route("/api/orders/{id}/status", patch(update_status))
        .with_state(backend);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server run");
    });
    format!("http://{addr}/api")
}

fn seeded_backend() -> Backend {
    let backend = Backend::default();
    let order = Order::new(
        "ord-1",
        "C300",
        8,
        vec![OrderItem {
            name: "Pad thai".into(),
            quantity: 1,
            unit_price_cents: 1_390,
        }],
        RATES,
    )
    .unwrap();
    backend.orders.insert(order.id.clone(), order);
    backend
}

fn text(reply: Reply) -> String {
    match reply {
        Reply::Text(t) => t,
        Reply::Quit => panic!("unexpected quit"),
    }
}

#[tokio::test]
async fn console_advances_order_over_http() {
    let backend = seeded_backend();
    let base = start(backend.clone()).await;

    let creds = Arc::new(StaticCredentials::new(None, Some("t0k3n".into())));
    let client = Arc::new(
        QuickBiteClient::builder(&base)
            .unwrap()
            .with_credentials(creds.clone())
            .build()
            .unwrap(),
    );
    let board = Arc::new(OrderBoard::new(client.clone(), Arc::new(TracingNotifier)));
    let _polling = spawn_polling(board.clone(), Duration::from_secs(3600));
    let console = Console::new(board.clone(), client, creds, Density::Compact);

    // Initial fetch happens on the first tick.
    for _ in 0..100 {
        if board.find("C300").is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let out = text(console.handle_line("advance C300").await.unwrap());
    assert_eq!(out, "#C300: now Confirmed");
    assert_eq!(backend.patches.load(Ordering::SeqCst), 1);

    // The successful update makes the poller re-fetch right away.
    let mut refreshed = false;
    for _ in 0..100 {
        if board.find("C300").map(|o| o.status) == Some(OrderStatus::Confirmed) {
            refreshed = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(refreshed, "board never picked up the new status");

    let out = text(console.handle_line("show C300").await.unwrap());
    assert!(out.contains("✓ Pending ─ ● Confirmed ─ … ─ ○ Served"));
    assert!(out.contains("[advance → Preparing] [cancel]"));
}

#[tokio::test]
async fn failed_cancel_keeps_displayed_status() {
    let backend = seeded_backend();
    backend
        .orders
        .get_mut("ord-1")
        .unwrap()
        .update_status(OrderStatus::Ready);
    let base = start(backend.clone()).await;

    let client = Arc::new(QuickBiteClient::new(&base).unwrap());
    let board = OrderBoard::new(client, Arc::new(TracingNotifier));
    board.refresh(Refresh::Requested).await.unwrap();
    backend.failing.store(true, Ordering::SeqCst);

    assert_eq!(
        board.request_cancel("C300").unwrap(),
        Outcome::AwaitingConfirmation
    );
    let outcome = board.confirm_cancel("C300").await.unwrap();
    assert!(matches!(outcome, Outcome::Failed(ref msg) if msg.contains("database unavailable")));

    assert_eq!(backend.patches.load(Ordering::SeqCst), 1);
    assert_eq!(board.control("ord-1").unwrap().status(), OrderStatus::Ready);
    board.refresh(Refresh::Requested).await.unwrap();
    assert_eq!(board.find("C300").unwrap().status, OrderStatus::Ready);
}

#[tokio::test]
async fn unknown_status_from_backend_fails_the_refresh() {
    let app = Router::new().route(
        "/api/admin/orders",
        get(|| async {
            Json(json!({
                "success": true,
                "data": [{
                    "id": "x", "orderNumber": "X1", "tableNumber": 1,
                    "status": "lost", "items": [],
                    "subtotalCents": 0, "taxCents": 0, "serviceFeeCents": 0, "totalCents": 0,
                    "createdAt": "2024-05-01T12:00:00Z"
                }]
            }))
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server run");
    });

    let client = Arc::new(QuickBiteClient::new(&format!("http://{addr}/api")).unwrap());
    let board = OrderBoard::new(client, Arc::new(TracingNotifier));
    let err = board.refresh(Refresh::Scheduled).await.unwrap_err();
    assert!(err.to_string().contains("invalid order status"));
    assert!(board.orders().is_empty());
}
