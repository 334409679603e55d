//! `ApiClient` and `AuthSession` against an in-process stub backend.

use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use poap_api::error::GENERIC_ERROR;
use poap_api::{ApiClient, ApiError, AuthError, AuthSession};
use poap_common::backend::{ClaimBackend, EventBackend};
use poap_common::claim::{ClaimFlow, ClaimStep};
use poap_common::error::ProviderError;
use poap_common::event::{EventDraft, EventStatus};
use poap_common::event_setup::{EventSetupFlow, EventSetupStep};
use poap_common::mock::MockProvider;
use poap_common::network::NetworkId;
use poap_common::session::SessionStore;
use poap_common::transaction::Transaction;
use poap_common::wallet::WalletType;
use serde_json::{json, Value};

const ACCOUNT: &str = "rA1b2C3d4E5f6G7h8J9k";

// ─── Stub backend ────────────────────────────────────────────────────────────

#[derive(Default)]
struct Stub {
    slow: bool,
    /// Bearer tokens seen, in request order.
    tokens: Mutex<Vec<Option<String>>>,
    logins: Mutex<Vec<Value>>,
}

type Shared = Arc<Stub>;

fn ok(result: Value) -> Response {
    Json(json!({ "result": result })).into_response()
}

fn fail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn bearer(stub: &Stub, headers: &HeaderMap) -> Option<String> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(String::from);
    stub.tokens.lock().unwrap().push(token.clone());
    token
}

fn event_json(id: u32) -> Value {
    json!({
        "id": id,
        "status": "active",
        "networkId": "testnet",
        "owner": "rOrganizer",
        "title": "RustConf",
        "description": "Talks",
        "location": "Online",
        "imageUrl": null,
        "tokenCount": 50,
        "dateStart": "2026-09-01T09:00:00Z",
        "dateEnd": "2026-09-02T18:00:00Z",
        "isManaged": false,
        "attendees": 3
    })
}

async fn heartbeat(State(stub): State<Shared>) -> Response {
    if stub.slow {
        tokio::time::sleep(Duration::from_secs(2)).await;
    }
    ok(json!("ok"))
}

async fn prelogin(Json(body): Json<Value>) -> Response {
    let address = body["walletAddress"].as_str().unwrap_or_default();
    ok(json!(format!("challenge-for-{address}")))
}

async fn login(State(stub): State<Shared>, Json(body): Json<Value>) -> Response {
    stub.logins.lock().unwrap().push(body.clone());
    if body["data"]["type"] == "xumm" && body["data"]["jwt"] == "mock-jwt" {
        let address = body["walletAddress"].as_str().unwrap_or_default();
        ok(json!(format!("token-{address}")))
    } else {
        fail(StatusCode::BAD_REQUEST, "Invalid signature")
    }
}

async fn refresh(State(stub): State<Shared>, headers: HeaderMap) -> Response {
    match bearer(&stub, &headers) {
        Some(_) => ok(json!("token-refreshed")),
        None => fail(StatusCode::UNAUTHORIZED, "Unauthorized"),
    }
}

async fn logout(State(stub): State<Shared>, headers: HeaderMap) -> Response {
    bearer(&stub, &headers);
    ok(json!(true))
}

async fn event_info(Path(id): Path<u32>) -> Response {
    if id == 1 {
        ok(event_json(1))
    } else {
        fail(StatusCode::NOT_FOUND, "Event not found")
    }
}

async fn public_events(Query(query): Query<std::collections::HashMap<String, String>>) -> Response {
    let limit: usize = query
        .get("limit")
        .and_then(|l| l.parse().ok())
        .unwrap_or(10);
    let events: Vec<Value> = (1..=3).map(event_json).take(limit).collect();
    ok(json!(events))
}

async fn owned_events() -> Response {
    ok(json!("not a list"))
}

async fn create_event(Json(body): Json<Value>) -> Response {
    let tokens = body["tokenCount"].as_u64().unwrap_or_default();
    ok(json!({
        "eventId": 9,
        "status": "pending",
        "deposit": {
            "destination": "rVault",
            "amountDrops": tokens * 500_000,
            "memo": "9"
        }
    }))
}

async fn cancel_event() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response()
}

async fn join_event(
    State(stub): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if bearer(&stub, &headers).is_none() {
        return fail(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    match body["eventId"].as_u64() {
        Some(1) => ok(json!({
            "eventId": 1,
            "owner": ACCOUNT,
            "offerIndex": "OFFER-1",
            "claimed": false
        })),
        _ => fail(StatusCode::BAD_REQUEST, "No NFT left for this event"),
    }
}

async fn offers(Path(event_id): Path<u32>) -> Response {
    if event_id == 1 {
        ok(json!({
            "eventId": 1,
            "owner": ACCOUNT,
            "offerIndex": "OFFER-1",
            "claimed": true
        }))
    } else {
        ok(Value::Null)
    }
}

async fn platform_info() -> Response {
    ok(json!({ "minter": "rMinter", "vault": "rVault" }))
}

async fn user_minter() -> Response {
    ok(json!(false))
}

async fn payment_check(Json(body): Json<Value>) -> Response {
    if body["txHash"] == "PAYHASH" {
        ok(json!({ "status": "paid" }))
    } else {
        ok(json!({ "status": "pending" }))
    }
}

async fn admin_stats() -> Response {
    ok(json!({
        "users": 12,
        "organizers": 2,
        "events": { "pending": 1, "active": 2, "closed": 3, "canceled": 0 },
        "claimedNfts": 40
    }))
}

async fn spawn(stub: Stub) -> (String, Shared) {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .try_init();

    let stub = Arc::new(stub);
    let app = Router::new()
        .route("/heartbeat", get(heartbeat))
        .route("/auth/prelogin", post(prelogin))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
        .route("/events/info/{id}", get(event_info))
        .route("/events/public", get(public_events))
        .route("/events/owned", get(owned_events))
        .route("/events/create", post(create_event))
        .route("/events/cancel/{id}", post(cancel_event))
        .route("/events/join", post(join_event))
        .route("/offers/{event_id}", get(offers))
        .route("/platform/info", get(platform_info))
        .route("/user/minter", get(user_minter))
        .route("/payment/check", post(payment_check))
        .route("/admin/stats", get(admin_stats))
        .with_state(Arc::clone(&stub));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), stub)
}

fn client(url: &str) -> ApiClient {
    ApiClient::new(url, Duration::from_secs(5)).unwrap()
}

// ─── Envelope handling ───────────────────────────────────────────────────────

#[tokio::test]
async fn heartbeat_ok() {
    let (url, _) = spawn(Stub::default()).await;
    client(&url).heartbeat().await.unwrap();
}

#[tokio::test]
async fn slow_backend_times_out() {
    let (url, _) = spawn(Stub {
        slow: true,
        ..Stub::default()
    })
    .await;
    let api = ApiClient::new(&url, Duration::from_millis(200)).unwrap();
    assert_eq!(api.heartbeat().await, Err(ApiError::Timeout));
}

#[tokio::test]
async fn unreachable_backend_is_http_error() {
    let api = client("http://127.0.0.1:1");
    assert!(matches!(api.heartbeat().await, Err(ApiError::Http(_))));
}

#[tokio::test]
async fn server_message_is_surfaced() {
    let (url, _) = spawn(Stub::default()).await;
    assert_eq!(
        client(&url).event_info(2).await,
        Err(ApiError::Server {
            status: 404,
            message: "Event not found".into()
        })
    );
}

#[tokio::test]
async fn missing_message_falls_back_to_generic() {
    let (url, _) = spawn(Stub::default()).await;
    assert_eq!(
        client(&url).cancel_event(1).await,
        Err(ApiError::Server {
            status: 500,
            message: GENERIC_ERROR.into()
        })
    );
}

#[tokio::test]
async fn wrong_shape_is_decode_error() {
    let (url, _) = spawn(Stub::default()).await;
    assert!(matches!(
        client(&url).owned_events().await,
        Err(ApiError::Decode(_))
    ));
}

// ─── Endpoints ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn event_queries() {
    let (url, _) = spawn(Stub::default()).await;
    let api = client(&url);

    let event = api.event_info(1).await.unwrap();
    assert_eq!(event.title, "RustConf");
    assert_eq!(event.network_id, NetworkId::Testnet);
    assert_eq!(event.status, EventStatus::Active);

    assert_eq!(api.public_events(Some(2)).await.unwrap().len(), 2);
    assert_eq!(api.public_events(None).await.unwrap().len(), 3);

    let stats = api.admin_stats().await.unwrap();
    assert_eq!(stats.events.total(), 6);
    assert_eq!(stats.claimed_nfts, 40);
}

#[tokio::test]
async fn claim_status_of_unjoined_event_is_none() {
    let (url, _) = spawn(Stub::default()).await;
    let api = client(&url);
    assert_eq!(api.claim_status(2, ACCOUNT).await.unwrap(), None);
    assert!(api.claim_status(1, ACCOUNT).await.unwrap().unwrap().claimed);
}

// ─── Auth ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn login_stores_token_per_account() {
    let (url, stub) = spawn(Stub::default()).await;
    let store = SessionStore::in_memory();
    let auth = AuthSession::new(Rc::new(client(&url)), store.clone());
    let provider = MockProvider::resolving(None);

    auth.login(ACCOUNT, WalletType::Xumm, &provider).await.unwrap();

    let expected = format!("token-{ACCOUNT}");
    assert_eq!(auth.client().token().as_deref(), Some(expected.as_str()));
    assert_eq!(store.auth_token(ACCOUNT).as_deref(), Some(expected.as_str()));

    let logins = stub.logins.lock().unwrap();
    assert_eq!(logins[0]["walletType"], "XUMM");
    assert_eq!(logins[0]["walletAddress"], ACCOUNT);
}

#[tokio::test]
async fn ensure_reuses_cached_token() {
    let (url, stub) = spawn(Stub::default()).await;
    let store = SessionStore::in_memory();
    store.set_auth_token(ACCOUNT, "cached");
    let auth = AuthSession::new(Rc::new(client(&url)), store);
    let provider = MockProvider::resolving(None);

    auth.ensure(ACCOUNT, WalletType::Gem, &provider).await.unwrap();
    assert_eq!(auth.client().token().as_deref(), Some("cached"));
    assert!(stub.logins.lock().unwrap().is_empty());
}

#[tokio::test]
async fn wallet_refusal_aborts_login() {
    let (url, stub) = spawn(Stub::default()).await;
    let auth = AuthSession::new(Rc::new(client(&url)), SessionStore::in_memory());
    let provider = MockProvider::resolving(None);
    provider.fail_with(ProviderError::Rejected);

    assert_eq!(
        auth.login(ACCOUNT, WalletType::Xumm, &provider).await,
        Err(AuthError::Wallet(ProviderError::Rejected))
    );
    assert!(!auth.client().is_authenticated());
    assert!(stub.logins.lock().unwrap().is_empty());
}

#[tokio::test]
async fn refresh_without_token_is_unauthorized() {
    let (url, _) = spawn(Stub::default()).await;
    let store = SessionStore::in_memory();
    store.set_auth_token(ACCOUNT, "stale");
    let auth = AuthSession::new(Rc::new(client(&url)), store.clone());

    assert_eq!(auth.refresh(ACCOUNT).await, Err(ApiError::Unauthorized));
    assert_eq!(store.auth_token(ACCOUNT), None);
}

#[tokio::test]
async fn logout_clears_local_state() {
    let (url, stub) = spawn(Stub::default()).await;
    let store = SessionStore::in_memory();
    store.set_auth_token(ACCOUNT, "token");
    let auth = AuthSession::new(Rc::new(client(&url)), store.clone());
    assert!(auth.resume(ACCOUNT));

    auth.refresh(ACCOUNT).await.unwrap();
    assert_eq!(store.auth_token(ACCOUNT).as_deref(), Some("token-refreshed"));

    auth.logout(ACCOUNT).await;
    assert!(!auth.client().is_authenticated());
    assert_eq!(store.auth_token(ACCOUNT), None);

    let tokens = stub.tokens.lock().unwrap();
    assert_eq!(tokens.last().unwrap().as_deref(), Some("token-refreshed"));
}

// ─── Workflows over HTTP ─────────────────────────────────────────────────────

#[tokio::test]
async fn claim_flow_over_http() {
    let (url, _) = spawn(Stub::default()).await;
    let api = client(&url);
    api.set_token(Some("token".into()));
    let provider = MockProvider::resolving(Some("ABC123"));

    let mut flow = ClaimFlow::new(1);
    flow.set_connected(true);
    flow.claim(&api, &provider, ACCOUNT).await;

    assert!(flow.workflow().status(ClaimStep::Claim).complete);
    assert_eq!(provider.accepted_offers(), vec!["OFFER-1".to_string()]);
}

#[tokio::test]
async fn claim_without_login_reports_error() {
    let (url, _) = spawn(Stub::default()).await;
    let api = client(&url);
    let provider = MockProvider::resolving(Some("ABC123"));

    let mut flow = ClaimFlow::new(1);
    flow.set_connected(true);
    flow.claim(&api, &provider, ACCOUNT).await;

    let status = flow.workflow().status(ClaimStep::Claim);
    assert!(!status.complete);
    assert_eq!(
        status.error.as_deref(),
        Some(ApiError::Unauthorized.to_string().as_str())
    );
    assert!(provider.signed().is_empty());
}

#[tokio::test]
async fn event_setup_over_http() {
    let (url, _) = spawn(Stub::default()).await;
    let api = client(&url);
    api.set_token(Some("token".into()));
    let provider = MockProvider::resolving(Some("AUTHHASH"));

    let mut flow = EventSetupFlow::new();
    flow.set_connected(true);
    flow.load(&api, ACCOUNT).await;
    assert_eq!(flow.workflow().active_step(), Some(EventSetupStep::Authorize));

    flow.authorize(&provider).await;
    assert_eq!(flow.workflow().active_step(), Some(EventSetupStep::Register));

    let start = Utc::now();
    let draft = EventDraft {
        network_id: NetworkId::Testnet,
        title: "RustConf".into(),
        description: "Talks".into(),
        location: "Online".into(),
        image_url: None,
        token_count: 4,
        date_start: start,
        date_end: start + chrono::Duration::hours(8),
        is_managed: false,
    };
    flow.register(&api, &draft).await;
    assert_eq!(flow.event().map(|e| e.event_id), Some(9));
    assert_eq!(flow.workflow().active_step(), Some(EventSetupStep::Pay));

    provider.push_resolution(Some("PAYHASH"));
    flow.pay(&api, &provider).await;
    assert_eq!(flow.workflow().active_step(), Some(EventSetupStep::Summary));

    let signed = provider.signed();
    assert!(matches!(signed[0], Transaction::AccountSet { .. }));
    assert!(matches!(signed[1], Transaction::Payment { .. }));
}

#[tokio::test]
async fn unverified_payment_keeps_pay_step_open() {
    let (url, _) = spawn(Stub::default()).await;
    let api = client(&url);
    api.set_token(Some("token".into()));

    let status = EventBackend::verify_payment(&api, 9, "OTHER").await.unwrap();
    assert_eq!(status, EventStatus::Pending);
    assert!(!EventBackend::minter_authorized(&api, ACCOUNT).await.unwrap());
}
