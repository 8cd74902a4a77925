// tests/routes.rs
//
// Drives the router with tower's oneshot against an in-memory records API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use chrono::{Duration, TimeZone, Utc};
use fintrack_config::{Config, UserConfig};
use fintrack_core::{
    ConfiguredIdentityProvider, CoreError, CoreResult, FinancialRecord, Identity, RecordsApi,
    SessionRegistry,
};
use fintrack_web::{create_router, AppState, RecordsContext};
use serde_json::{json, Value};
use tower::ServiceExt;

#[derive(Default)]
struct MemoryApi {
    records: Mutex<Vec<FinancialRecord>>,
    next_id: AtomicUsize,
    fetch_calls: AtomicUsize,
}

impl MemoryApi {
    fn with_records(records: Vec<FinancialRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Default::default()
        }
    }
}

#[async_trait]
impl RecordsApi for MemoryApi {
    async fn fetch_all(&self, user_id: &str) -> CoreResult<Vec<FinancialRecord>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let records = self.records.lock().unwrap();
        Ok(records.iter().filter(|r| r.user_id == user_id).cloned().collect())
    }

    async fn create(&self, record: &FinancialRecord) -> CoreResult<FinancialRecord> {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let mut created = record.clone();
        created.id = Some(format!("r{}", n));
        self.records.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: &str, record: &FinancialRecord) -> CoreResult<FinancialRecord> {
        let mut records = self.records.lock().unwrap();
        let slot = records
            .iter_mut()
            .find(|r| r.has_id(id))
            .ok_or_else(|| CoreError::NotFound {
                resource: id.to_string(),
            })?;
        *slot = record.clone();
        slot.id = Some(id.to_string());
        Ok(slot.clone())
    }

    async fn delete(&self, id: &str) -> CoreResult<()> {
        self.records.lock().unwrap().retain(|r| !r.has_id(id));
        Ok(())
    }
}

fn rent(id: &str, user_id: &str) -> FinancialRecord {
    let mut record = FinancialRecord::new(
        user_id,
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
        "rent",
        -900.0,
        "home",
        "transfer",
    );
    record.id = Some(id.to_string());
    record
}

fn config() -> Config {
    let mut config = Config::default();
    config.auth.users = vec![UserConfig {
        username: "ana".to_string(),
        password: "secret".to_string(),
        user_id: Some("u1".to_string()),
        display_name: Some("Ana".to_string()),
    }];
    config
}

fn state_with(registry: SessionRegistry) -> AppState {
    let config = config();
    AppState {
        registry: Arc::new(registry),
        identity: Arc::new(ConfiguredIdentityProvider::new(config.auth.users.clone())),
        config,
    }
}

fn app(api: Arc<MemoryApi>) -> (Router, AppState) {
    let registry = SessionRegistry::new(api, Duration::minutes(720));
    let state = state_with(registry);
    (create_router(state.clone()), state)
}

fn get_with_cookie(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn json_request(method: &str, uri: &str, cookie: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::COOKIE, cookie)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn form_request(uri: &str, cookie: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

/// Sign in as ana and return the `Cookie` header value
async fn sign_in(app: &Router) -> String {
    let response = app
        .clone()
        .oneshot(form_request("/auth", None, "username=ana&password=secret"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(set_cookie.contains("HttpOnly"));
    set_cookie.split(';').next().unwrap().to_string()
}

#[tokio::test]
async fn test_health_is_public() {
    let (app, _) = app(Arc::new(MemoryApi::default()));
    let response = app.oneshot(get_with_cookie("/api/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "OK");
}

#[tokio::test]
async fn test_signed_out_pages_redirect_to_auth() {
    let (app, _) = app(Arc::new(MemoryApi::default()));

    for uri in ["/", "/dashboard"] {
        let response = app.clone().oneshot(get_with_cookie(uri, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/auth");
    }

    for cookie in ["signed=", "signed=not-a-token", "signed=true", "signed= true"] {
        let response = app.clone().oneshot(get_with_cookie("/", Some(cookie))).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "cookie {:?}", cookie);
        assert_eq!(location(&response), "/auth");
    }
}

#[tokio::test]
async fn test_signed_out_form_post_redirects_without_writing() {
    let api = Arc::new(MemoryApi::default());
    let (app, _) = app(api.clone());

    let body = "date=&description=tea&amount=-3&category=food&payment_method=cash";
    let response = app.oneshot(form_request("/records", None, body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth");
    assert!(api.records.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_signed_out_api_is_unauthorized() {
    let (app, _) = app(Arc::new(MemoryApi::default()));
    let response = app.oneshot(get_with_cookie("/api/records", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wrong_password_sets_no_cookie() {
    let (app, state) = app(Arc::new(MemoryApi::default()));
    let response = app
        .oneshot(form_request("/auth", None, "username=ana&password=nope"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth?error=1");
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(state.registry.active_count(), 0);
}

#[tokio::test]
async fn test_sign_in_page_shows_error() {
    let (app, _) = app(Arc::new(MemoryApi::default()));
    let response = app.oneshot(get_with_cookie("/auth?error=1", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Wrong username or password"));
}

#[tokio::test]
async fn test_signed_in_user_skips_sign_in_page() {
    let (app, _) = app(Arc::new(MemoryApi::default()));
    let cookie = sign_in(&app).await;
    let response = app.oneshot(get_with_cookie("/auth", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_dashboard_shows_only_own_records() {
    let api = Arc::new(MemoryApi::with_records(vec![rent("a", "u1"), {
        let mut other = rent("b", "u2");
        other.description = "someone else".to_string();
        other
    }]));
    let (app, _) = app(api.clone());
    let cookie = sign_in(&app).await;

    let response = app.clone().oneshot(get_with_cookie("/", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Welcome, Ana"));
    assert!(html.contains("rent"));
    assert!(html.contains("-900.00"));
    assert!(!html.contains("someone else"));

    // the store fetched once and serves later pages from memory
    app.oneshot(get_with_cookie("/dashboard", Some(&cookie))).await.unwrap();
    assert_eq!(api.fetch_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_json_crud() {
    let api = Arc::new(MemoryApi::default());
    let (app, _) = app(api.clone());
    let cookie = sign_in(&app).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/records",
            &cookie,
            json!({"description": "salary", "amount": 2000, "category": "work",
                   "paymentMethod": "transfer", "date": "2024-06-01T00:00:00Z"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let records = body_json(response).await;
    assert_eq!(records.as_array().unwrap().len(), 1);
    assert_eq!(records[0]["_id"], "r1");
    assert_eq!(records[0]["userId"], "u1");

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/records/r1",
            &cookie,
            json!({"description": "salary", "amount": 2100, "category": "work",
                   "paymentMethod": "transfer"}),
        ))
        .await
        .unwrap();
    let records = body_json(response).await;
    assert_eq!(records[0]["amount"], 2100.0);

    let response = app
        .clone()
        .oneshot(get_with_cookie("/api/summary", Some(&cookie)))
        .await
        .unwrap();
    let summary = body_json(response).await;
    assert_eq!(summary["count"], 1);
    assert_eq!(summary["total_income"], "2100.00");

    let response = app
        .clone()
        .oneshot(json_request("DELETE", "/api/records/r1", &cookie, json!(null)))
        .await
        .unwrap();
    assert_eq!(body_json(response).await, json!([]));
    assert!(api.records.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_update_leaves_records_unchanged() {
    let api = Arc::new(MemoryApi::with_records(vec![rent("a", "u1")]));
    let (app, _) = app(api);
    let cookie = sign_in(&app).await;

    let response = app
        .oneshot(json_request(
            "PUT",
            "/api/records/missing",
            &cookie,
            json!({"description": "x", "amount": 1, "category": "c", "paymentMethod": "cash"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let records = body_json(response).await;
    assert_eq!(records.as_array().unwrap().len(), 1);
    assert_eq!(records[0]["description"], "rent");
}

#[tokio::test]
async fn test_blank_description_is_bad_request() {
    let (app, _) = app(Arc::new(MemoryApi::default()));
    let cookie = sign_in(&app).await;
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/records",
            &cookie,
            json!({"description": " ", "amount": 1, "category": "c", "paymentMethod": "cash"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_form_add_update_delete() {
    let api = Arc::new(MemoryApi::default());
    let (app, _) = app(api.clone());
    let cookie = sign_in(&app).await;

    let body = "date=2024-06-02&description=tea&amount=-3.5&category=food&payment_method=cash";
    let response = app
        .clone()
        .oneshot(form_request("/records", Some(&cookie), body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    assert_eq!(api.records.lock().unwrap()[0].amount, -3.5);

    let body = "date=2024-06-02&description=green+tea&amount=-4&category=food&payment_method=cash";
    app.clone()
        .oneshot(form_request("/records/r1/update", Some(&cookie), body))
        .await
        .unwrap();
    assert_eq!(api.records.lock().unwrap()[0].description, "green tea");

    app.clone()
        .oneshot(form_request("/records/r1/delete", Some(&cookie), ""))
        .await
        .unwrap();
    assert!(api.records.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_reload_refetches() {
    let api = Arc::new(MemoryApi::default());
    let (app, _) = app(api.clone());
    let cookie = sign_in(&app).await;

    app.clone()
        .oneshot(get_with_cookie("/api/records", Some(&cookie)))
        .await
        .unwrap();
    api.records.lock().unwrap().push(rent("x", "u1"));

    let response = app
        .oneshot(json_request("POST", "/api/records/reload", &cookie, json!(null)))
        .await
        .unwrap();
    let records = body_json(response).await;
    assert_eq!(records[0]["_id"], "x");
    assert_eq!(api.fetch_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_sign_out_revokes_session() {
    let (app, state) = app(Arc::new(MemoryApi::default()));
    let cookie = sign_in(&app).await;
    assert_eq!(state.registry.active_count(), 1);

    let response = app
        .clone()
        .oneshot(form_request("/auth/logout", Some(&cookie), ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth");
    let cleared = response.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cleared.contains("Max-Age=0"));
    assert_eq!(state.registry.active_count(), 0);

    let response = app.oneshot(get_with_cookie("/", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth");
}

#[tokio::test]
async fn test_trusted_flag_cookie() {
    let api = Arc::new(MemoryApi::with_records(vec![rent("a", "u1")]));
    let registry = SessionRegistry::new(api, Duration::minutes(720))
        .with_trusted_flag(Identity::new("u1", "Ana"));
    let app = create_router(state_with(registry));

    let response = app
        .clone()
        .oneshot(get_with_cookie("/", Some("signed=true")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("rent"));

    let response = app
        .oneshot(get_with_cookie("/", Some("signed=TRUE")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_records_outside_session_is_internal_error() {
    async fn unguarded(ctx: RecordsContext) -> String {
        ctx.session.user_id
    }

    let app = Router::new().route("/unguarded", get(unguarded));
    let response = app.oneshot(get_with_cookie("/unguarded", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_dashboard_survives_huge_amounts() {
    let mut first = rent("a", "u1");
    first.amount = 5e28;
    let mut second = rent("b", "u1");
    second.amount = 5e28;
    let (app, _) = app(Arc::new(MemoryApi::with_records(vec![first, second])));
    let cookie = sign_in(&app).await;

    let response = app.clone().oneshot(get_with_cookie("/", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(get_with_cookie("/api/summary", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let summary = body_json(response).await;
    assert_eq!(summary["count"], 2);
    assert!(summary["total_income"].as_str().unwrap().starts_with("79228162514264337593543950335"));
}
