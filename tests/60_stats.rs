mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn balance_is_income_minus_expense() {
    let app = TestApp::new();
    let user = app.register_id("anan").await;

    let (status, body) = app
        .get(&format!("/api/v1/transactions/stats?user_id={}", user))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"],
        json!({ "totalIncome": "0.00", "totalExpense": "0.00", "balance": "0.00" })
    );

    app.add_transaction(&user, json!({ "type": "income", "amount": "100.00" }))
        .await;
    app.add_transaction(&user, json!({ "type": "expense", "amount": "30.25" }))
        .await;
    app.add_transaction(&user, json!({ "type": "expense", "amount": "80" }))
        .await;

    let (_, body) = app
        .get(&format!("/api/v1/transactions/stats?user_id={}", user))
        .await;
    assert_eq!(
        body["data"],
        json!({ "totalIncome": "100.00", "totalExpense": "110.25", "balance": "-10.25" })
    );
}

#[tokio::test]
async fn stats_ignore_other_users() {
    let app = TestApp::new();
    let anan = app.register_id("anan").await;
    let lele = app.register_id("lele").await;
    app.add_transaction(&lele, json!({ "type": "income", "amount": "999.99" }))
        .await;

    let (_, body) = app
        .get(&format!("/api/v1/transactions/stats?user_id={}", anan))
        .await;
    assert_eq!(body["data"]["totalIncome"], "0.00");
}

#[tokio::test]
async fn monthly_rollup_for_one_category() {
    let app = TestApp::new();
    let user = app.register_id("anan").await;
    let (_, body) = app
        .post("/api/v1/categories", json!({ "name": "玩具", "type": "expense" }))
        .await;
    let toys = body["data"]["id"].as_str().unwrap().to_string();

    for (amount, date) in [
        ("10", "2025-01-10T09:00:00Z"),
        ("20", "2025-01-20T09:00:00Z"),
        ("5", "2025-02-02T09:00:00Z"),
    ] {
        app.add_transaction(
            &user,
            json!({ "type": "expense", "amount": amount, "category_id": toys, "transaction_date": date }),
        )
        .await;
    }
    app.add_transaction(
        &user,
        json!({ "type": "expense", "amount": "7", "transaction_date": "2025-01-15T09:00:00Z" }),
    )
    .await;

    let (status, body) = app
        .get(&format!(
            "/api/v1/transactions/stats/monthly?user_id={}&category_id={}",
            user, toys
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], "35.00");
    assert_eq!(body["data"]["count"], 3);
    assert_eq!(
        body["data"]["months"],
        json!([
            { "month": "2025-02", "total": "5.00", "count": 1 },
            { "month": "2025-01", "total": "30.00", "count": 2 }
        ])
    );
}

#[tokio::test]
async fn period_summary_counts_only_this_month_and_year() {
    let app = TestApp::new();
    let user = app.register_id("anan").await;
    let now = Utc::now();
    let last_year = now - Duration::days(366);

    app.add_transaction(&user, json!({ "type": "income", "amount": "50", "transaction_date": now }))
        .await;
    app.add_transaction(&user, json!({ "type": "expense", "amount": "12.25", "transaction_date": now }))
        .await;
    app.add_transaction(
        &user,
        json!({ "type": "income", "amount": "1000", "transaction_date": last_year }),
    )
    .await;

    let (status, body) = app
        .get(&format!("/api/v1/transactions/stats/summary?user_id={}", user))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["month"], now.format("%Y-%m").to_string());
    assert_eq!(body["data"]["monthIncome"], "50.00");
    assert_eq!(body["data"]["monthExpense"], "12.25");
    assert_eq!(body["data"]["monthBalance"], "37.75");
    assert_eq!(body["data"]["yearIncome"], "50.00");
    assert_eq!(body["data"]["yearExpense"], "12.25");

    let (status, body) = app.get("/api/v1/transactions/stats/summary").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "user_id is required");
}
