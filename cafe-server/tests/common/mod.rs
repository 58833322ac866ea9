//! Shared harness: the full router over an in-memory store, driven with
//! `oneshot` requests

#![allow(dead_code)]

use std::time::Duration;

use axum::Router;
use axum::body::Body;
use cafe_server::api::build_app;
use cafe_server::state::AppState;
use cafe_server::store::MemoryStore;
use http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

pub struct TestApp {
    pub store: MemoryStore,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let router = build_app(AppState::new(store.clone(), Duration::from_secs(5)));
        Self { store, router }
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, None).await
    }

    /// `x-request-id` of the response, optionally sending one
    pub async fn request_id(&self, uri: &str, sent: Option<&str>) -> Option<String> {
        let mut builder = Request::builder().method(Method::GET).uri(uri);
        if let Some(id) = sent {
            builder = builder.header("x-request-id", id);
        }
        let response = self
            .router
            .clone()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    /// Stock an ingredient, asserting success
    pub async fn stock(&self, name: &str, level: f64) {
        let (status, body) = self
            .post(
                "/inventory",
                json!({"name": name, "stock_level": level, "price": 1.0, "unit_type": "g"}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
    }

    /// Add a menu item, asserting success
    pub async fn menu_item(&self, id: &str, price: f64, recipe: &[(&str, f64)]) {
        let ingredients: Vec<Value> = recipe
            .iter()
            .map(|(ingredient, quantity)| json!({"ingredient_id": ingredient, "quantity": quantity}))
            .collect();
        let (status, body) = self
            .post(
                "/menu",
                json!({
                    "product_id": id,
                    "name": id,
                    "description": format!("{id} made to order"),
                    "price": price,
                    "size": "M",
                    "ingredients": ingredients,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
    }

    /// Espresso bar: beans and milk, a latte and an espresso
    pub async fn with_espresso_bar() -> Self {
        let app = Self::new();
        app.stock("espresso_beans", 1000.0).await;
        app.stock("milk", 5000.0).await;
        app.menu_item("latte", 3.5, &[("espresso_beans", 18.0), ("milk", 200.0)])
            .await;
        app.menu_item("espresso", 2.0, &[("espresso_beans", 18.0)]).await;
        app
    }

    pub async fn order(&self, customer: &str, items: &[(&str, i64)]) -> Value {
        let (status, body) = self.post("/orders", order_body(customer, items)).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }

    pub async fn stock_level(&self, id: &str) -> f64 {
        let (status, body) = self.get(&format!("/inventory/{id}")).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["stock_level"].as_f64().unwrap()
    }
}

pub fn order_body(customer: &str, items: &[(&str, i64)]) -> Value {
    let items: Vec<Value> = items
        .iter()
        .map(|(id, quantity)| json!({"product_id": id, "quantity": quantity}))
        .collect();
    json!({"customer_name": customer, "payment_method": "card", "items": items})
}
