#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use money_bag_api::auth::hash_password;
use money_bag_api::config::AppConfig;
use money_bag_api::database::models::NewUser;
use money_bag_api::database::Store;
use money_bag_api::{app, AppState};

pub const ADMIN_NAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "admin-pass";

/// Router over a fresh in-memory store. Nothing touches the network.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(AppConfig::test_default())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let state = AppState::in_memory(config);
        Self {
            router: app(state.clone()),
            state,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, body)
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body), None).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(body), None).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, None, None).await
    }

    /// Register through the API and return the created user object.
    pub async fn register(&self, name: &str, password: &str) -> Value {
        let (status, body) = self
            .post("/api/v1/users", json!({ "name": name, "password": password }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
        body["data"].clone()
    }

    pub async fn register_id(&self, name: &str) -> String {
        self.register(name, "1234").await["id"].as_str().unwrap().to_string()
    }

    pub async fn login(&self, name: &str, password: &str) -> (StatusCode, Value) {
        self.post("/api/v1/users/login", json!({ "name": name, "password": password }))
            .await
    }

    /// Seed an admin straight into the store and log in as them.
    pub async fn admin_token(&self) -> String {
        if self.state.store.find_user_by_name(ADMIN_NAME).await.unwrap().is_none() {
            let hash = hash_password(ADMIN_PASSWORD, 4).await.unwrap();
            self.state
                .store
                .insert_user(NewUser {
                    name: ADMIN_NAME.to_string(),
                    password_hash: hash,
                    password_plain: None,
                    nickname: Some("管理员".to_string()),
                    avatar: None,
                    avatar_type: None,
                    avatar_url: None,
                    bio: None,
                    age: None,
                    gender: None,
                    is_admin: true,
                })
                .await
                .unwrap();
        }
        self.token_for(ADMIN_NAME, ADMIN_PASSWORD).await
    }

    pub async fn token_for(&self, name: &str, password: &str) -> String {
        let (status, body) = self.login(name, password).await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["data"]["token"].as_str().unwrap().to_string()
    }

    pub async fn add_transaction(&self, user_id: &str, body: Value) -> Value {
        let mut payload = body;
        payload["user_id"] = json!(user_id);
        let (status, body) = self.post("/api/v1/transactions", payload).await;
        assert_eq!(status, StatusCode::CREATED, "add transaction failed: {}", body);
        body["data"].clone()
    }
}

pub fn assert_failure(body: &Value, message: &str) {
    assert_eq!(body["success"], false, "expected failure envelope: {}", body);
    assert_eq!(body["error"], message, "unexpected error: {}", body);
}
