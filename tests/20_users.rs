mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{assert_failure, TestApp};

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let app = TestApp::new();

    let (status, body) = app
        .post("/api/v1/users", json!({ "name": "安安", "password": "1234" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["name"], "安安");
    assert_eq!(body["data"]["is_admin"], false);

    let (status, body) = app
        .post("/api/v1/users", json!({ "name": "安安", "password": "5678" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_failure(&body, "用户名已存在");
}

#[tokio::test]
async fn password_fields_never_leave_the_api() {
    let app = TestApp::new();
    let created = app.register("lele", "1234").await;
    assert!(created.get("password").is_none());
    assert!(created.get("password_plain").is_none());

    let id = created["id"].as_str().unwrap();
    let (status, body) = app.get(&format!("/api/v1/users/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].get("password").is_none());

    let (_, body) = app.get("/api/v1/users/by-name/lele").await;
    assert_eq!(body["data"]["id"], id);
    assert!(body["data"].get("password").is_none());
}

#[tokio::test]
async fn by_name_lookup_returns_null_for_free_names() {
    let app = TestApp::new();
    let (status, body) = app.get("/api/v1/users/by-name/nobody").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn unknown_user_is_not_found() {
    let app = TestApp::new();
    let (status, body) = app
        .get("/api/v1/users/00000000-0000-0000-0000-000000000000")
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_failure(&body, "用户不存在");
}

#[tokio::test]
async fn malformed_id_is_a_bad_request() {
    let app = TestApp::new();
    let (status, body) = app.get("/api/v1/users/not-a-uuid").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn validation_reports_a_single_message() {
    let app = TestApp::new();

    let (status, body) = app
        .post("/api/v1/users", json!({ "name": "", "password": "1234" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_failure(&body, "用户名长度必须在1到50个字符之间");

    let (status, body) = app
        .post("/api/v1/users", json!({ "name": "kid", "password": "1234", "age": 200 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_failure(&body, "年龄必须在0到150之间");

    let (status, body) = app
        .post("/api/v1/users", json!({ "name": "kid", "password": "" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_failure(&body, "密码不能为空");
}

#[tokio::test]
async fn earliest_declared_field_wins_when_several_fail() {
    let app = TestApp::new();

    let (status, body) = app
        .post("/api/v1/users", json!({ "name": "", "password": "", "age": 200 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_failure(&body, "用户名长度必须在1到50个字符之间");

    let (status, body) = app
        .post(
            "/api/v1/users",
            json!({ "name": "kid", "password": "", "nickname": "安".repeat(51), "age": 200 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_failure(&body, "密码不能为空");

    let (status, body) = app
        .post("/api/v1/categories", json!({ "name": "", "color": "x".repeat(21), "type": "expense" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_failure(&body, "分类名称长度必须在1到50个字符之间");
}

#[tokio::test]
async fn profile_update_keeps_the_name_fixed() {
    let app = TestApp::new();
    let id = app.register_id("mimi").await;
    let uri = format!("/api/v1/users/{}", id);

    let (status, body) = app
        .put(&uri, json!({ "name": "mimi", "nickname": "小咪", "age": 9, "gender": "female" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["nickname"], "小咪");
    assert_eq!(body["data"]["age"], 9);
    assert_eq!(body["data"]["gender"], "female");

    let (status, body) = app.put(&uri, json!({ "name": "momo" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_failure(&body, "用户名不可修改");

    let (_, body) = app.get(&uri).await;
    assert_eq!(body["data"]["name"], "mimi");
    assert_eq!(body["data"]["nickname"], "小咪");
}

#[tokio::test]
async fn granting_admin_needs_an_admin() {
    let app = TestApp::new();
    let id = app.register_id("dada").await;
    let uri = format!("/api/v1/users/{}", id);

    let (status, _) = app.put(&uri, json!({ "is_admin": true })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = app.token_for("dada", "1234").await;
    let (status, body) = app
        .request(Method::PUT, &uri, Some(json!({ "is_admin": true })), Some(&token))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_failure(&body, "需要管理员权限");

    let admin = app.admin_token().await;
    let (status, body) = app
        .request(Method::PUT, &uri, Some(json!({ "is_admin": true })), Some(&admin))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_admin"], true);
}

#[tokio::test]
async fn registering_an_admin_needs_an_admin() {
    let app = TestApp::new();
    let payload = json!({ "name": "boss", "password": "1234", "is_admin": true });

    let (status, _) = app.post("/api/v1/users", payload.clone()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let admin = app.admin_token().await;
    let (status, body) = app
        .request(Method::POST, "/api/v1/users", Some(payload), Some(&admin))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["is_admin"], true);
}

#[tokio::test]
async fn user_listing_is_admin_only() {
    let app = TestApp::new();
    app.register("first", "1234").await;
    app.register("second", "1234").await;

    let (status, body) = app.get("/api/v1/users").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_failure(&body, "请先登录");

    let admin = app.admin_token().await;
    let (status, body) = app
        .request(Method::GET, "/api/v1/users", None, Some(&admin))
        .await;
    assert_eq!(status, StatusCode::OK);

    let users = body["data"].as_array().unwrap();
    assert_eq!(users.len(), 3);
    // newest first, and no plaintext mirror while retention is off
    assert_eq!(users[0]["name"], "admin");
    assert_eq!(users[2]["name"], "first");
    assert!(users.iter().all(|u| u.get("password_plain").is_none()));
}

#[tokio::test]
async fn listing_shows_the_mirror_when_retention_is_on() {
    let mut config = money_bag_api::config::AppConfig::test_default();
    config.security.retain_plaintext_passwords = true;
    let app = TestApp::with_config(config);
    app.register("kept", "secret").await;

    let admin = app.admin_token().await;
    let (_, body) = app
        .request(Method::GET, "/api/v1/users", None, Some(&admin))
        .await;
    let kept = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["name"] == "kept")
        .cloned()
        .unwrap();
    assert_eq!(kept["password_plain"], "secret");
    assert!(kept.get("password").is_none());
}

#[tokio::test]
async fn password_change_and_verification() {
    let app = TestApp::new();
    let id = app.register_id("pp").await;

    let (status, body) = app
        .post(
            &format!("/api/v1/users/{}/verify-password", id),
            json!({ "currentPassword": "1234" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["valid"], true);

    let (_, body) = app
        .post(
            &format!("/api/v1/users/{}/verify-password", id),
            json!({ "currentPassword": "nope" }),
        )
        .await;
    assert_eq!(body["data"]["valid"], false);

    let (status, body) = app
        .put(&format!("/api/v1/users/{}/password", id), json!({ "newPassword": "  " }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_failure(&body, "新密码不能为空");

    let (status, body) = app
        .put(&format!("/api/v1/users/{}/password", id), json!({ "newPassword": "5678" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["message"], "密码更新成功");

    let (status, _) = app.login("pp", "1234").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.login("pp", "5678").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn admin_can_reset_a_password() {
    let app = TestApp::new();
    let id = app.register_id("forgot").await;
    let uri = format!("/api/v1/users/{}/reset-password", id);
    let payload = json!({ "newPassword": "fresh" });

    let (status, _) = app.put(&uri, payload.clone()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let admin = app.admin_token().await;
    let (status, body) = app
        .request(Method::PUT, &uri, Some(payload), Some(&admin))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["message"], "密码重置成功");

    let (status, _) = app.login("forgot", "fresh").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn deleting_a_user_cascades() {
    let app = TestApp::new();
    let id = app.register_id("gone").await;

    app.add_transaction(&id, json!({ "type": "income", "amount": "10.00", "transaction_date": "2025-01-03T10:00:00Z" }))
        .await;
    app.add_transaction(&id, json!({ "type": "expense", "amount": "3.00", "transaction_date": "2025-01-04T10:00:00Z" }))
        .await;
    let (status, _) = app
        .post("/api/v1/feedbacks", json!({ "user_id": id, "content": "hello", "contact": "wx:gone" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let uri = format!("/api/v1/users/{}", id);
    let (status, body) = app.delete(&uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["deleted_transactions"], 2);
    assert_eq!(body["data"]["deleted_feedbacks"], 1);

    let (status, body) = app.delete(&uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_failure(&body, "用户不存在");

    let (_, body) = app
        .get(&format!("/api/v1/transactions?user_id={}", id))
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}
