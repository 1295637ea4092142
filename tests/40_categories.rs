mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{assert_failure, TestApp};

#[tokio::test]
async fn category_crud() {
    let app = TestApp::new();

    let (status, body) = app
        .post(
            "/api/v1/categories",
            json!({ "name": "工资", "icon": "wallet", "color": "#4caf50", "type": "income" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["type"], "income");
    let id = body["data"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/v1/categories/{}", id);

    let (status, body) = app.get(&uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "工资");

    let (status, body) = app.put(&uri, json!({ "color": "#000000" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["color"], "#000000");
    assert_eq!(body["data"]["name"], "工资");
    assert_eq!(body["data"]["icon"], "wallet");

    let (status, body) = app.delete(&uri).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (status, body) = app.delete(&uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_failure(&body, "Category not found");

    let (status, _) = app.get(&uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listing_filters_by_type_in_creation_order() {
    let app = TestApp::new();
    for (name, kind) in [("餐饮", "expense"), ("工资", "income"), ("交通", "expense")] {
        let (status, _) = app
            .post("/api/v1/categories", json!({ "name": name, "type": kind }))
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, body) = app.get("/api/v1/categories").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 3);

    let (_, body) = app.get("/api/v1/categories?type=expense").await;
    let names: Vec<_> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["餐饮", "交通"]);

    let (_, body) = app.get("/api/v1/categories?type=all").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn category_validation() {
    let app = TestApp::new();

    let (status, body) = app
        .post("/api/v1/categories", json!({ "name": "", "type": "expense" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_failure(&body, "分类名称长度必须在1到50个字符之间");

    let (status, body) = app
        .post("/api/v1/categories", json!({ "name": "x", "type": "transfer" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = app
        .put(
            "/api/v1/categories/00000000-0000-0000-0000-000000000000",
            json!({ "name": "x" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
