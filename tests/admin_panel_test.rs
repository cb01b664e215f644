use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use axum_extra::extract::cookie::Cookie;
use jsonwebtoken::{encode, EncodingKey, Header};
use message_responder::{
    config::{Config, LogFormat, StorageBackend},
    database::memory::{MemoryMessageStore, MemoryResponderStore},
    middleware::auth::Claims,
    routes,
    utils::flash::{Flash, FlashLevel},
    AppState,
};
use serde_json::Value as JsonValue;
use tower::ServiceExt;

const JWT_SECRET: &str = "test_secret_key";

fn test_config() -> Config {
    Config {
        server_address: "127.0.0.1:0".to_string(),
        storage_backend: StorageBackend::Memory,
        database_url: None,
        jwt_secret: JWT_SECRET.to_string(),
        csrf_secret: "test_csrf_secret".to_string(),
        restricted_role: "2".to_string(),
        bot_id: None,
        max_record_count: 20,
        order_type: "ASC".to_string(),
        uploads_dir: None,
        log_format: LogFormat::Pretty,
    }
}

fn setup_app() -> (Router, Arc<MemoryResponderStore>) {
    let responders = Arc::new(MemoryResponderStore::new());
    let state = AppState::new(
        test_config(),
        Arc::new(MemoryMessageStore::new()),
        responders.clone(),
    )
    .expect("state");
    (routes::app(state), responders)
}

fn bearer(sub: &str, role: &str) -> String {
    let claims = Claims {
        sub: sub.to_string(),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        role: Some(role.to_string()),
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap();
    format!("Bearer {}", token)
}

fn admin() -> String {
    bearer("1", "1")
}

async fn call(app: &Router, req: Request<Body>) -> Response {
    app.clone().oneshot(req).await.unwrap()
}

async fn json_body(resp: Response) -> JsonValue {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str, auth: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, auth)
        .body(Body::empty())
        .unwrap()
}

fn post_form(uri: &str, auth: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, auth)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Flash cookie set by a response, as (`name=value` pair, decoded message).
fn flash_cookie(resp: &Response) -> (String, Option<Flash>) {
    let raw = resp
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let cookie = Cookie::parse_encoded(raw).unwrap();
    let flash = Flash::from_cookie(&cookie);
    (cookie.encoded().stripped().to_string(), flash)
}

fn flash_level(resp: &Response) -> Option<FlashLevel> {
    flash_cookie(resp).1.map(|flash| flash.level)
}

async fn add(app: &Router, text: &str, response: &str, botid: &str) -> Response {
    let body = format!(
        "text_recieved={}&response_by_bot={}&botid={}",
        text, response, botid
    );
    call(app, post_form("/admin/message_responder/add", &admin(), &body)).await
}

#[tokio::test]
async fn admin_routes_require_a_session() {
    let (app, _) = setup_app();
    let resp = call(
        &app,
        Request::builder()
            .uri("/admin/message_responder")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = call(&app, get("/admin/message_responder", "Bearer not-a-jwt")).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn add_redirects_with_flash_and_lists_the_record() {
    let (app, _) = setup_app();

    let resp = add(&app, "hi", "hello", "4").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        resp.headers().get(header::LOCATION).unwrap(),
        "/admin/message_responder"
    );
    let (cookie, flash) = flash_cookie(&resp);
    assert!(cookie.starts_with("flash="));
    assert_eq!(flash.map(|f| f.level), Some(FlashLevel::Success));

    let resp = call(
        &app,
        Request::builder()
            .uri("/admin/message_responder")
            .header(header::AUTHORIZATION, admin())
            .header(header::COOKIE, cookie)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get(header::SET_COOKIE).is_some());
    let page = json_body(resp).await;
    assert_eq!(page["page_title"], "Message Responder");
    assert_eq!(page["flash"]["level"], "success");
    assert_eq!(page["flash"]["message"], "Record added successfully");
    assert_eq!(page["total_records"], 1);
    assert_eq!(page["records"][0]["text_recieved"], "hi");
    assert_eq!(page["records"][0]["botid"], 4);
}

#[tokio::test]
async fn add_with_invalid_form_rerenders_with_errors() {
    let (app, _) = setup_app();

    let resp = add(&app, "hi", "", "abc").await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let page = json_body(resp).await;
    assert_eq!(page["page_title"], "Add New Message Responder");
    assert!(page["errors"]["response_by_bot"].is_array());
    assert!(page["errors"]["botid"].is_array());
    assert_eq!(page["values"]["text_recieved"], "hi");

    let list = json_body(call(&app, get("/admin/message_responder", &admin())).await).await;
    assert_eq!(list["total_records"], 0);
}

#[tokio::test]
async fn search_matches_any_column_case_insensitively() {
    let (app, _) = setup_app();
    add(&app, "alpha", "one", "1").await;
    add(&app, "beta", "two", "1").await;

    let page = json_body(
        call(&app, get("/admin/message_responder?search=ALP", &admin())).await,
    )
    .await;
    assert_eq!(page["total_records"], 1);
    assert_eq!(page["records"][0]["text_recieved"], "alpha");
    assert_eq!(page["search"], "ALP");
}

#[tokio::test]
async fn list_orders_and_pages() {
    let (app, _) = setup_app();
    for text in ["c", "a", "b"] {
        add(&app, text, "r", "1").await;
    }

    let page = json_body(
        call(
            &app,
            get(
                "/admin/message_responder?orderby=text_recieved&ordertype=desc&limit=2&page=1",
                &admin(),
            ),
        )
        .await,
    )
    .await;
    assert_eq!(page["total_records"], 3);
    assert_eq!(page["total_page"], 2);
    assert_eq!(page["record_count"], 2);
    assert_eq!(page["records"][0]["text_recieved"], "c");
    assert_eq!(page["records"][1]["text_recieved"], "b");

    let resp = call(&app, get("/admin/message_responder?orderby=password", &admin())).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn out_of_range_paging_is_a_client_error() {
    let (app, _) = setup_app();
    add(&app, "alpha", "one", "1").await;

    let resp = call(
        &app,
        get("/admin/message_responder?page=9223372036854775807", &admin()),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(resp).await["error"].is_string());

    let resp = call(&app, get("/admin/message_responder?page=abc", &admin())).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(resp).await["error"].is_string());
}

#[tokio::test]
async fn bare_angle_brackets_survive_sanitizing() {
    let (app, _) = setup_app();
    let resp = add(&app, "if+a+%3C+b", "%3Cb%3Eyes%3C%2Fb%3E", "1").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let view = json_body(call(&app, get("/admin/message_responder/view/1", &admin())).await).await;
    assert_eq!(view["record"]["text_recieved"], "if a < b");
    assert_eq!(view["record"]["response_by_bot"], "yes");
}

#[tokio::test]
async fn restricted_role_only_sees_permitted_texts() {
    let (app, responders) = setup_app();
    for text in ["5", "H7", "H5,M5,E5", "X9"] {
        add(&app, text, "r", "1").await;
    }
    responders.set_permission(9, "5,7").unwrap();

    let restricted = bearer("9", "2");
    let page = json_body(call(&app, get("/admin/message_responder", &restricted)).await).await;
    assert_eq!(page["total_records"], 3);
    let texts: Vec<&str> = page["records"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["text_recieved"].as_str().unwrap())
        .collect();
    assert!(!texts.contains(&"X9"));

    let unrestricted = json_body(call(&app, get("/admin/message_responder", &admin())).await).await;
    assert_eq!(unrestricted["total_records"], 4);
}

#[tokio::test]
async fn index_and_view_filter_by_field() {
    let (app, _) = setup_app();
    add(&app, "alpha", "one", "7").await;
    add(&app, "beta", "two", "8").await;

    let page = json_body(
        call(&app, get("/admin/message_responder/index/botid/8", &admin())).await,
    )
    .await;
    assert_eq!(page["total_records"], 1);
    assert_eq!(page["records"][0]["text_recieved"], "beta");

    let view = json_body(call(&app, get("/admin/message_responder/view/1", &admin())).await).await;
    assert_eq!(view["page_title"], "View  Message Responder");
    assert_eq!(view["record"]["text_recieved"], "alpha");

    let view = json_body(
        call(&app, get("/admin/message_responder/view/text_recieved/beta", &admin())).await,
    )
    .await;
    assert_eq!(view["record"]["id"], 2);

    let resp = call(&app, get("/admin/message_responder/view/42", &admin())).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(resp).await["error"], "No record found");
}

#[tokio::test]
async fn edit_updates_or_warns_when_nothing_changed() {
    let (app, _) = setup_app();
    add(&app, "alpha", "one", "7").await;

    let form = json_body(call(&app, get("/admin/message_responder/edit/1", &admin())).await).await;
    assert_eq!(form["values"]["text_recieved"], "alpha");

    let resp = call(
        &app,
        post_form(
            "/admin/message_responder/edit/1",
            &admin(),
            "text_recieved=alpha&response_by_bot=uno",
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(flash_level(&resp), Some(FlashLevel::Success));

    let resp = call(
        &app,
        post_form(
            "/admin/message_responder/edit/99",
            &admin(),
            "text_recieved=x&response_by_bot=y",
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(flash_level(&resp), Some(FlashLevel::Warning));

    let view = json_body(call(&app, get("/admin/message_responder/view/1", &admin())).await).await;
    assert_eq!(view["record"]["response_by_bot"], "uno");
}

#[tokio::test]
async fn editfield_accepts_json_and_rejects_other_columns() {
    let (app, _) = setup_app();
    add(&app, "alpha", "one", "7").await;

    let resp = call(
        &app,
        Request::builder()
            .method("POST")
            .uri("/admin/message_responder/editfield/1")
            .header(header::AUTHORIZATION, admin())
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"name":"response_by_bot","value":"inline"}"#))
            .unwrap(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["num_rows"], 1);
    assert_eq!(body["rec_id"], "1");

    let resp = call(
        &app,
        post_form("/admin/message_responder/editfield/1", &admin(), "name=botid&value=3"),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_requires_csrf_and_accepts_id_lists() {
    let (app, _) = setup_app();
    for text in ["a", "b", "c"] {
        add(&app, text, "r", "1").await;
    }

    let resp = call(&app, get("/admin/message_responder/delete/1", &admin())).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let list = json_body(call(&app, get("/admin/message_responder", &admin())).await).await;
    assert_eq!(list["total_records"], 3);
    let token = list["csrf_token"].as_str().unwrap().to_string();

    let resp = call(
        &app,
        get(
            &format!("/admin/message_responder/delete/1,%203,%2099?csrf_token={}", token),
            &admin(),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(flash_level(&resp), Some(FlashLevel::Success));

    let list = json_body(call(&app, get("/admin/message_responder", &admin())).await).await;
    assert_eq!(list["total_records"], 1);
    assert_eq!(list["records"][0]["text_recieved"], "b");

    // A token minted for another admin does not carry over.
    let other = json_body(call(&app, get("/admin/message_responder", &bearer("5", "1"))).await).await;
    let resp = call(
        &app,
        Request::builder()
            .method("POST")
            .uri("/admin/message_responder/delete/2")
            .header(header::AUTHORIZATION, admin())
            .header("x-csrf-token", other["csrf_token"].as_str().unwrap())
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn export_returns_a_workbook() {
    let (app, _) = setup_app();
    add(&app, "alpha", "one", "7").await;

    let resp = call(&app, get("/admin/message_responder/export", &admin())).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let disposition = resp
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("Message Responder.xlsx"));
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.starts_with(b"PK"));
}
