//! Router tests: drive the admin routes with `oneshot` while a loopback
//! server plays the managed backend.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use sable_api::auth::{AppStateInner, parse_wallet_list};
use sable_api::middleware::WALLET_HEADER;
use sable_client::BackendClient;
use sable_types::backend::FunctionRequest;

fn ok(value: Value) -> Response {
    Json(json!({ "status": "success", "value": value })).into_response()
}

fn fail(message: &str) -> Response {
    Json(json!({ "status": "error", "errorMessage": message })).into_response()
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

async fn fake_query(headers: HeaderMap, Json(req): Json<FunctionRequest>) -> Response {
    match req.path.as_str() {
        "admin:isAdmin" => match bearer(&headers) {
            Some("admin-token") => ok(json!(true)),
            Some("user-token") => ok(json!(false)),
            _ => fail("Not authenticated"),
        },
        "admin:listFlags" => ok(json!([
            { "_id": "f1", "targetId": "p1", "reason": "spam", "reporter": "0xaaa" }
        ])),
        "admin:auditLog" => {
            let limit = req.args["limit"].clone();
            ok(json!([
                { "_id": "a1", "actor": "0xadmin", "action": "deletePost",
                  "details": { "limit": limit }, "_creationTime": 1700000000000.0 }
            ]))
        }
        other => fail(&format!("unknown query {other}")),
    }
}

async fn fake_mutation(headers: HeaderMap, Json(req): Json<FunctionRequest>) -> Response {
    if bearer(&headers) != Some("admin-token") {
        return fail("Unauthorized");
    }
    match (req.path.as_str(), req.args["postId"].as_str()) {
        ("admin:deletePost", Some("missing")) => fail("Post not found"),
        ("admin:deletePost", Some("boom")) => fail("Transaction aborted: index corrupt"),
        ("admin:deletePost", _) | ("admin:resolveFlag", _) | ("admin:setRole", _) => ok(Value::Null),
        (other, _) => fail(&format!("unknown mutation {other}")),
    }
}

async fn app(admin_wallets: Option<&str>) -> Router {
    let backend = Router::new()
        .route("/api/query", post(fake_query))
        .route("/api/mutation", post(fake_mutation));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, backend).await.unwrap();
    });

    let client = BackendClient::new(&format!("http://{}", addr)).unwrap();
    let wallets = admin_wallets.and_then(parse_wallet_list);
    sable_api::router(Arc::new(AppStateInner::new(client, wallets)))
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str, token: Option<&str>, wallet: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(t) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    if let Some(w) = wallet {
        builder = builder.header(WALLET_HEADER, w);
    }
    builder.body(Body::empty()).unwrap()
}

fn with_json(method: &str, uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let app = app(None).await;
    let resp = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn missing_token_is_401() {
    let app = app(None).await;
    let (status, body) = send(&app, get("/api/admin/verify", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Missing or invalid authorization header");
}

#[tokio::test]
async fn rejected_token_is_401_and_non_admin_is_403() {
    let app = app(None).await;

    let (status, body) = send(&app, get("/api/admin/verify", Some("stale-token"), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Not authenticated");

    let (status, body) = send(&app, get("/api/admin/verify", Some("user-token"), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Admin access required");
}

#[tokio::test]
async fn verify_echoes_wallet() {
    let app = app(None).await;
    let (status, body) = send(&app, get("/api/admin/verify", Some("admin-token"), Some("0xABC"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "isAdmin": true, "walletAddress": "0xabc" }));
}

#[tokio::test]
async fn allow_list_enforced() {
    let app = app(Some("0xAAA,0xBBB")).await;

    let (status, _) = send(&app, get("/api/admin/verify", Some("admin-token"), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, get("/api/admin/verify", Some("admin-token"), Some("0xccc"))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Wallet is not allowed");

    let (status, _) = send(&app, get("/api/admin/verify", Some("admin-token"), Some("0xbbb"))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn list_flags_and_audit_log() {
    let app = app(None).await;

    let (status, body) = send(&app, get("/api/admin/flags", Some("admin-token"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["reason"], "spam");

    let (status, body) = send(&app, get("/api/admin/audit-log?limit=5000", Some("admin-token"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["details"]["limit"], 200);

    let (status, body) = send(&app, get("/api/admin/audit-log", Some("admin-token"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["details"]["limit"], 50);

    let (status, _) = send(&app, get("/api/admin/audit-log?limit=lots", Some("admin-token"), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_post_maps_backend_errors() {
    let app = app(None).await;
    let delete = |id: &str| {
        Request::builder()
            .method("DELETE")
            .uri(format!("/api/admin/posts/{id}"))
            .header(header::AUTHORIZATION, "Bearer admin-token")
            .body(Body::empty())
            .unwrap()
    };

    let (status, body) = send(&app, delete("p1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, body) = send(&app, delete("missing")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Post not found");

    let (status, body) = send(&app, delete("boom")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error");
}

#[tokio::test]
async fn body_validation_is_400() {
    let app = app(None).await;

    let (status, _) = send(
        &app,
        with_json("POST", "/api/admin/flags/f1/resolve", "admin-token", json!({ "action": "dismiss" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        with_json("POST", "/api/admin/flags/f1/resolve", "admin-token", json!({ "action": "nuke" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = send(
        &app,
        with_json("PUT", "/api/admin/users/0xdef/role", "admin-token", json!({ "role": "moderator" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        with_json("PUT", "/api/admin/users/0xdef/role", "admin-token", json!({ "role": "overlord" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
