//! 端到端对账流程测试 (Mem 引擎 + mock 网关)

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use pay_server::core::{Config, ConsumableBasis, ServerState};
use pay_server::db::DbService;
use pay_server::db::models::{
    ConsumptionDirection, IngredientRequirement, InventoryItemCreate, MenuItem, PaymentStatus, User,
};
use pay_server::db::repository::{
    ConsumptionLogRepository, InventoryRepository, MenuItemRepository, OrderRepository,
    UserRepository,
};
use pay_server::gateway::{PaymentGateway, SnapSession, SnapTransactionRequest};
use pay_server::payments::reconcile::{ReconcileEngine, StatusEvent};
use pay_server::payments::session::{SessionService, SnapTokenRequest};
use pay_server::utils::time;
use pay_server::{AppResult, ErrorCode, api};
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use tower::ServiceExt;

fn d(value: &str) -> Decimal {
    value.parse().unwrap()
}

/// 固定返回成功会话的 mock 网关，记录调用次数和最后一次请求体
struct MockGateway {
    calls: AtomicUsize,
    last_request: Mutex<Option<SnapTransactionRequest>>,
}

impl MockGateway {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_request(&self) -> SnapTransactionRequest {
        self.last_request
            .lock()
            .unwrap()
            .clone()
            .expect("gateway was never called")
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_transaction(&self, request: &SnapTransactionRequest) -> AppResult<SnapSession> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        Ok(SnapSession {
            token: format!("token-{}", request.transaction_details.order_id),
            redirect_url: format!(
                "https://pay.example/redirect/{}",
                request.transaction_details.order_id
            ),
        })
    }
}

fn test_config(auto_settle: bool, basis: ConsumableBasis) -> Config {
    Config {
        http_port: 0,
        db_path: String::new(),
        environment: "development".to_string(),
        midtrans_api_url: "https://gateway.invalid".to_string(),
        midtrans_server_key: "test-key".to_string(),
        gateway_timeout_ms: 1000,
        gateway_retries: 0,
        request_timeout_ms: 5000,
        business_timezone: "Asia/Jakarta".to_string(),
        sandbox_auto_settle: auto_settle,
        takeaway_consumables: vec!["Sendok & Garpu".to_string(), "Kertas Bungkus".to_string()],
        consumable_basis: basis,
        log_dir: None,
    }
}

async fn state_from_config(config: Config) -> (ServerState, Arc<MockGateway>) {
    let db = DbService::memory().await.unwrap();
    let gateway = Arc::new(MockGateway::new());
    (ServerState::new(config, db.db, gateway.clone()), gateway)
}

async fn test_state(auto_settle: bool, basis: ConsumableBasis) -> ServerState {
    state_from_config(test_config(auto_settle, basis)).await.0
}

/// 造一套基础数据：两种食材、两种耗材、一个菜品、一个收银员
async fn seed(state: &ServerState) {
    let inventory = InventoryRepository::new(state.get_db());
    inventory
        .create(
            "rice",
            InventoryItemCreate {
                name: "Beras".to_string(),
                category: "Bahan Pokok".to_string(),
                unit: "kg".to_string(),
                stock_quantity: d("100"),
            },
        )
        .await
        .unwrap();
    inventory
        .create(
            "egg",
            InventoryItemCreate {
                name: "Telur".to_string(),
                category: "Bahan Pokok".to_string(),
                unit: "pcs".to_string(),
                stock_quantity: d("50"),
            },
        )
        .await
        .unwrap();
    inventory
        .create(
            "cutlery",
            InventoryItemCreate {
                name: "Sendok & Garpu".to_string(),
                category: "Perlengkapan".to_string(),
                unit: "set".to_string(),
                stock_quantity: d("200"),
            },
        )
        .await
        .unwrap();
    inventory
        .create(
            "wrap",
            InventoryItemCreate {
                name: "Kertas Bungkus".to_string(),
                category: "Perlengkapan".to_string(),
                unit: "pcs".to_string(),
                stock_quantity: d("300"),
            },
        )
        .await
        .unwrap();

    let menus = MenuItemRepository::new(state.get_db());
    menus
        .create(
            "nasi_goreng",
            MenuItem {
                id: None,
                name: "Nasi Goreng".to_string(),
                required_ingredients: vec![
                    IngredientRequirement {
                        ingredient_id: "rice".to_string(),
                        quantity_per_unit: d("0.25"),
                    },
                    IngredientRequirement {
                        ingredient_id: "egg".to_string(),
                        quantity_per_unit: d("1"),
                    },
                ],
            },
        )
        .await
        .unwrap();

    let users = UserRepository::new(state.get_db());
    users
        .create(
            "cashier-1",
            User {
                id: None,
                name: "Dewi".to_string(),
                email: None,
                phone: None,
            },
        )
        .await
        .unwrap();
}

fn session_request(base_id: &str, fulfillment: &str, quantity: i64) -> SnapTokenRequest {
    serde_json::from_value(serde_json::json!({
        "orderId": base_id,
        "customerId": "cashier-1",
        "items": [
            {"id": "nasi_goreng", "name": "Nasi Goreng", "price": 10000, "quantity": quantity}
        ],
        "dineOption": fulfillment,
    }))
    .unwrap()
}

fn settlement_event(order_id: &str) -> StatusEvent {
    serde_json::from_value(serde_json::json!({
        "order_id": order_id,
        "transaction_status": "settlement",
        "transaction_id": "tx-1",
        "payment_type": "gopay",
        "gross_amount": "20000.00",
    }))
    .unwrap()
}

async fn stock_of(state: &ServerState, id: &str) -> Decimal {
    InventoryRepository::new(state.get_db())
        .find_by_id(id)
        .await
        .unwrap()
        .unwrap()
        .stock_quantity
}

#[tokio::test]
async fn session_creates_pending_record_with_decimal_gross() {
    let (state, gateway) =
        state_from_config(test_config(false, ConsumableBasis::PerItemTotal)).await;
    seed(&state).await;

    let service = SessionService::new(&state);
    let response = service.create(session_request("A1", "Dine In", 2)).await.unwrap();

    assert!(response.order_id.starts_with("A1-"));
    assert_eq!(response.token, format!("token-{}", response.order_id));

    // 网关收到的就是计算出的总额和目录解析结果 (缺失联系方式用占位值)
    assert_eq!(gateway.call_count(), 1);
    let sent = gateway.last_request();
    assert_eq!(sent.transaction_details.gross_amount, d("20000"));
    assert_eq!(sent.transaction_details.order_id, response.order_id);
    assert_eq!(sent.customer_details.first_name, "Dewi");
    assert_eq!(sent.customer_details.email, "unknown@gmail.com");
    assert_eq!(sent.customer_details.phone, "0000000000");
    assert_eq!(sent.item_details.len(), 1);
    assert_eq!(sent.item_details[0].quantity, 2);

    let record = OrderRepository::new(state.get_db())
        .find_by_order_id(&response.order_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status, PaymentStatus::Pending);
    assert_eq!(record.gross_amount, d("20000"));
    assert_eq!(record.cashier_name, "Dewi");
    assert!(!record.settlement_applied);
    assert!(!record.redirect_to_receipt);
}

#[tokio::test]
async fn session_rejects_empty_items_and_unknown_customer() {
    let state = test_state(false, ConsumableBasis::PerItemTotal).await;
    seed(&state).await;
    let service = SessionService::new(&state);

    let mut request = session_request("A2", "Dine In", 1);
    request.items.clear();
    let err = service.create(request).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::OrderEmpty);

    let mut request = session_request("A2", "Dine In", 1);
    request.customer_id = Some("ghost".to_string());
    let err = service.create(request).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::CustomerNotFound);
}

#[tokio::test]
async fn settlement_decrements_stock_and_accumulates_log() {
    let state = test_state(false, ConsumableBasis::PerItemTotal).await;
    seed(&state).await;

    let order_id = SessionService::new(&state)
        .create(session_request("B1", "Dine In", 2))
        .await
        .unwrap()
        .order_id;

    let engine = ReconcileEngine::new(&state);
    let outcome = engine.process(settlement_event(&order_id)).await.unwrap();
    assert_eq!(outcome.status, PaymentStatus::Settlement);
    assert!(outcome.decrement.is_some());

    // 2 份 × 0.25 kg 米、2 份 × 1 个蛋
    assert_eq!(stock_of(&state, "rice").await, d("99.5"));
    assert_eq!(stock_of(&state, "egg").await, d("48"));
    // 堂食不扣耗材
    assert_eq!(stock_of(&state, "cutlery").await, d("200"));

    let record = OrderRepository::new(state.get_db())
        .find_by_order_id(&order_id)
        .await
        .unwrap()
        .unwrap();
    assert!(record.settlement_applied);
    assert!(record.redirect_to_receipt);
    assert_eq!(record.payment_method.as_deref(), Some("gopay"));

    let log = ConsumptionLogRepository::new(state.get_db())
        .find(
            &time::today(state.config.timezone()),
            ConsumptionDirection::Outflow,
            "rice",
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(log.total_consumed, d("0.5"));
    assert_eq!(log.display_name, "Beras");
}

#[tokio::test]
async fn duplicate_settlement_does_not_double_decrement() {
    let state = test_state(false, ConsumableBasis::PerItemTotal).await;
    seed(&state).await;

    let order_id = SessionService::new(&state)
        .create(session_request("C1", "Dine In", 1))
        .await
        .unwrap()
        .order_id;

    let engine = ReconcileEngine::new(&state);
    let first = engine.process(settlement_event(&order_id)).await.unwrap();
    assert!(first.decrement.is_some());

    let second = engine.process(settlement_event(&order_id)).await.unwrap();
    assert!(second.decrement.is_none());

    assert_eq!(stock_of(&state, "rice").await, d("99.75"));
    assert_eq!(stock_of(&state, "egg").await, d("49"));
}

#[tokio::test]
async fn concurrent_settlements_apply_side_effect_once() {
    let state = test_state(false, ConsumableBasis::PerItemTotal).await;
    seed(&state).await;

    let order_id = SessionService::new(&state)
        .create(session_request("C2", "Dine In", 1))
        .await
        .unwrap()
        .order_id;

    let runs = futures::future::join_all((0..8).map(|_| {
        let state = state.clone();
        let order_id = order_id.clone();
        async move {
            ReconcileEngine::new(&state)
                .process(settlement_event(&order_id))
                .await
        }
    }))
    .await;

    let winners = runs
        .into_iter()
        .map(|r| r.unwrap())
        .filter(|o| o.decrement.is_some())
        .count();
    assert_eq!(winners, 1);
    assert_eq!(stock_of(&state, "egg").await, d("49"));
}

#[tokio::test]
async fn concurrent_distinct_orders_lose_no_updates() {
    let state = test_state(false, ConsumableBasis::PerItemTotal).await;
    seed(&state).await;

    let mut order_ids = Vec::new();
    for i in 0..6 {
        let id = SessionService::new(&state)
            .create(session_request(&format!("F{i}"), "Dine In", 1))
            .await
            .unwrap()
            .order_id;
        order_ids.push(id);
    }

    futures::future::join_all(order_ids.iter().map(|order_id| {
        let state = state.clone();
        let order_id = order_id.clone();
        async move {
            ReconcileEngine::new(&state)
                .process(settlement_event(&order_id))
                .await
                .unwrap()
        }
    }))
    .await;

    // 6 单 × 1 份: 米 -1.5 kg, 蛋 -6 个
    assert_eq!(stock_of(&state, "rice").await, d("98.5"));
    assert_eq!(stock_of(&state, "egg").await, d("44"));
}

#[tokio::test]
async fn takeaway_decrements_consumables_per_item_total() {
    let state = test_state(false, ConsumableBasis::PerItemTotal).await;
    seed(&state).await;

    let order_id = SessionService::new(&state)
        .create(session_request("D1", "Take Away", 3))
        .await
        .unwrap()
        .order_id;

    ReconcileEngine::new(&state)
        .process(settlement_event(&order_id))
        .await
        .unwrap();

    assert_eq!(stock_of(&state, "cutlery").await, d("197"));
    assert_eq!(stock_of(&state, "wrap").await, d("297"));
}

#[tokio::test]
async fn takeaway_decrements_consumables_per_order() {
    let state = test_state(false, ConsumableBasis::PerOrder).await;
    seed(&state).await;

    let order_id = SessionService::new(&state)
        .create(session_request("D2", "Take Away", 3))
        .await
        .unwrap()
        .order_id;

    ReconcileEngine::new(&state)
        .process(settlement_event(&order_id))
        .await
        .unwrap();

    assert_eq!(stock_of(&state, "cutlery").await, d("199"));
    assert_eq!(stock_of(&state, "wrap").await, d("299"));
}

#[tokio::test]
async fn missing_ingredient_reference_commits_surviving_deltas() {
    let state = test_state(false, ConsumableBasis::PerItemTotal).await;
    seed(&state).await;

    // 菜单引用了一个台账里不存在的食材
    MenuItemRepository::new(state.get_db())
        .create(
            "soto",
            MenuItem {
                id: None,
                name: "Soto Ayam".to_string(),
                required_ingredients: vec![
                    IngredientRequirement {
                        ingredient_id: "rice".to_string(),
                        quantity_per_unit: d("0.25"),
                    },
                    IngredientRequirement {
                        ingredient_id: "ghost_ingredient".to_string(),
                        quantity_per_unit: d("1"),
                    },
                ],
            },
        )
        .await
        .unwrap();

    let request: SnapTokenRequest = serde_json::from_value(serde_json::json!({
        "orderId": "G1",
        "customerId": "cashier-1",
        "items": [{"id": "soto", "name": "Soto Ayam", "price": 15000, "quantity": 1}],
    }))
    .unwrap();
    let order_id = SessionService::new(&state)
        .create(request)
        .await
        .unwrap()
        .order_id;

    let outcome = ReconcileEngine::new(&state)
        .process(settlement_event(&order_id))
        .await
        .unwrap();

    // 缺失引用跳过并带出告警，其余增量照常提交
    let decrement = outcome.decrement.unwrap();
    assert_eq!(decrement.applied.len(), 1);
    assert_eq!(decrement.applied[0].item_id, "rice");
    assert_eq!(decrement.warnings.len(), 1);
    assert!(decrement.warnings[0].contains("ghost_ingredient"));

    assert_eq!(stock_of(&state, "rice").await, d("99.75"));
    let logs = ConsumptionLogRepository::new(state.get_db());
    let date = time::today(state.config.timezone());
    assert!(logs
        .find(&date, ConsumptionDirection::Outflow, "rice")
        .await
        .unwrap()
        .is_some());
    assert!(logs
        .find(&date, ConsumptionDirection::Outflow, "ghost_ingredient")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn missing_consumable_warns_but_decrements_rest() {
    let mut config = test_config(false, ConsumableBasis::PerItemTotal);
    config.takeaway_consumables =
        vec!["Sendok & Garpu".to_string(), "Box Misterius".to_string()];
    let (state, _) = state_from_config(config).await;
    seed(&state).await;

    let order_id = SessionService::new(&state)
        .create(session_request("G2", "Take Away", 2))
        .await
        .unwrap()
        .order_id;

    let outcome = ReconcileEngine::new(&state)
        .process(settlement_event(&order_id))
        .await
        .unwrap();

    let decrement = outcome.decrement.unwrap();
    assert!(decrement.warnings.iter().any(|w| w.contains("Box Misterius")));
    assert_eq!(stock_of(&state, "cutlery").await, d("198"));
    // 不在配置列表里的耗材不动
    assert_eq!(stock_of(&state, "wrap").await, d("300"));
}

#[tokio::test]
async fn settlement_claim_can_be_released_and_retaken() {
    let state = test_state(false, ConsumableBasis::PerItemTotal).await;
    seed(&state).await;

    let order_id = SessionService::new(&state)
        .create(session_request("G3", "Dine In", 1))
        .await
        .unwrap()
        .order_id;

    let orders = OrderRepository::new(state.get_db());
    assert!(orders.claim_settlement(&order_id).await.unwrap());
    assert!(!orders.claim_settlement(&order_id).await.unwrap());

    // 扣减失败后释放门闩，下一次重试能重新抢到
    orders.release_settlement(&order_id).await.unwrap();
    assert!(orders.claim_settlement(&order_id).await.unwrap());
}

#[tokio::test]
async fn unknown_order_is_rejected_without_mutation() {
    let state = test_state(false, ConsumableBasis::PerItemTotal).await;
    seed(&state).await;

    let err = ReconcileEngine::new(&state)
        .process(settlement_event("nope-1"))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::OrderNotFound);
    assert_eq!(stock_of(&state, "rice").await, d("100"));
}

#[tokio::test]
async fn sandbox_policy_promotes_bank_transfer_pending() {
    let state = test_state(true, ConsumableBasis::PerItemTotal).await;
    seed(&state).await;

    let order_id = SessionService::new(&state)
        .create(session_request("E1", "Dine In", 1))
        .await
        .unwrap()
        .order_id;

    let event: StatusEvent = serde_json::from_value(serde_json::json!({
        "order_id": order_id,
        "transaction_status": "pending",
        "transaction_id": "tx-va",
        "payment_type": "bank_transfer",
        "va_numbers": [{"bank": "bca", "va_number": "12345"}],
    }))
    .unwrap();

    let outcome = ReconcileEngine::new(&state).process(event).await.unwrap();
    assert_eq!(outcome.status, PaymentStatus::Settlement);
    assert_eq!(stock_of(&state, "egg").await, d("49"));

    let record = OrderRepository::new(state.get_db())
        .find_by_order_id(&order_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.va_numbers.len(), 1);
    assert_eq!(record.va_numbers[0].bank, "bca");
}

#[tokio::test]
async fn disabled_policy_keeps_bank_transfer_pending() {
    let state = test_state(false, ConsumableBasis::PerItemTotal).await;
    seed(&state).await;

    let order_id = SessionService::new(&state)
        .create(session_request("E2", "Dine In", 1))
        .await
        .unwrap()
        .order_id;

    let event: StatusEvent = serde_json::from_value(serde_json::json!({
        "order_id": order_id,
        "transaction_status": "pending",
        "transaction_id": "tx-va",
        "payment_type": "bank_transfer",
    }))
    .unwrap();

    let outcome = ReconcileEngine::new(&state).process(event).await.unwrap();
    assert_eq!(outcome.status, PaymentStatus::Pending);
    assert_eq!(stock_of(&state, "egg").await, d("50"));
}

#[tokio::test]
async fn http_session_endpoint_returns_camel_case_payload() {
    let state = test_state(false, ConsumableBasis::PerItemTotal).await;
    seed(&state).await;
    let app = api::router(state);

    let body = serde_json::json!({
        "orderId": "H1",
        "customerId": "cashier-1",
        "items": [{"id": "nasi_goreng", "name": "Nasi Goreng", "price": 10000, "quantity": 1}],
    });
    let response = app
        .oneshot(
            Request::post("/getSnapToken")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert!(json["token"].as_str().unwrap().starts_with("token-H1-"));
    assert!(json["redirectUrl"].is_string());
    assert!(json["orderId"].as_str().unwrap().starts_with("H1-"));
}

#[tokio::test]
async fn http_notification_missing_field_yields_error_envelope() {
    let state = test_state(false, ConsumableBasis::PerItemTotal).await;
    let app = api::router(state);

    let response = app
        .oneshot(
            Request::post("/midtrans-notification")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"transaction_status": "settlement"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["error"], "required_field");
    assert_eq!(json["details"]["field"], "order_id");
}
