mod common;

use chrono::{TimeZone, Utc};
use common::TestApp;
use http::StatusCode;
use serde_json::json;

async fn close(app: &TestApp, id: i64) {
    let (status, body) = app.post(&format!("/orders/{id}/close"), json!({})).await;
    assert_eq!(status, StatusCode::OK, "{body}");
}

#[tokio::test]
async fn test_total_sales_counts_every_order() {
    let app = TestApp::with_espresso_bar().await;
    let (_, body) = app.get("/reports/total-sales").await;
    assert_eq!(body["total_sales"].as_f64(), Some(0.0));

    let paid = app.order("Aida", &[("latte", 2)]).await["id"].as_i64().unwrap();
    app.order("Bolat", &[("espresso", 1)]).await;
    let (_, body) = app.get("/reports/total-sales").await;
    assert_eq!(body["total_sales"].as_f64(), Some(9.0));

    // closing does not change the sum
    close(&app, paid).await;
    let (status, body) = app.get("/reports/total-sales").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_sales"].as_f64(), Some(9.0));
}

#[tokio::test]
async fn test_popular_items_top_three() {
    let app = TestApp::with_espresso_bar().await;
    app.menu_item("cortado", 3.0, &[("espresso_beans", 18.0), ("milk", 60.0)])
        .await;
    app.menu_item("americano", 2.5, &[("espresso_beans", 18.0)]).await;
    app.order("Aida", &[("latte", 1), ("espresso", 3)]).await;
    app.order("Bolat", &[("espresso", 2)]).await;
    app.order("Chen", &[("cortado", 2), ("americano", 1)]).await;

    let (status, body) = app.get("/reports/popular-items").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            {"menu_item_id": "espresso", "quantity_sold": 5},
            {"menu_item_id": "cortado", "quantity_sold": 2},
            {"menu_item_id": "americano", "quantity_sold": 1},
        ])
    );
}

#[tokio::test]
async fn test_search_by_filter() {
    let app = TestApp::with_espresso_bar().await;
    app.order("Latte Lover", &[("espresso", 1)]).await;

    let (status, body) = app.get("/reports/search?q=latte").await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["menu_items"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["orders"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["total_matches"], 2);

    let (_, body) = app.get("/reports/search?q=latte&filter=menu").await;
    assert_eq!(body["menu_items"][0]["id"], "latte");
    assert!(body.get("orders").is_none());
    assert_eq!(body["total_matches"], 1);

    let (_, body) = app
        .get("/reports/search?q=latte&filter=menu&maxPrice=3")
        .await;
    assert_eq!(body["total_matches"], 0);
}

#[tokio::test]
async fn test_search_rejects_bad_params() {
    let app = TestApp::with_espresso_bar().await;

    for uri in [
        "/reports/search",
        "/reports/search?q=latte&filter=customers",
        "/reports/search?q=latte&minPrice=-1",
        "/reports/search?q=latte&minPrice=5&maxPrice=1",
    ] {
        let (status, body) = app.get(uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["code"], 2, "{uri}");
    }
}

#[tokio::test]
async fn test_ordered_items_by_period() {
    let app = TestApp::with_espresso_bar().await;
    let march = app.order("Aida", &[("latte", 1)]).await["id"].as_i64().unwrap();
    let april = app.order("Bolat", &[("latte", 1)]).await["id"].as_i64().unwrap();
    let also_april = app.order("Dana", &[("espresso", 1)]).await["id"].as_i64().unwrap();
    for (id, month, day) in [(march, 3, 15), (april, 4, 2), (also_april, 4, 2)] {
        let at = Utc.with_ymd_and_hms(2024, month, day, 9, 0, 0).unwrap();
        assert!(app.store.backdate_order(id, at).await);
    }

    let (status, body) = app
        .get("/reports/orderedItemsByPeriod?period=month&year=2024")
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["period"], "month");
    assert_eq!(body["year"], 2024);
    assert_eq!(body["orderedItems"], json!([{"march": 1}, {"april": 2}]));

    let (status, body) = app
        .get("/reports/orderedItemsByPeriod?period=day&month=april")
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["month"], "april");
    assert_eq!(body["orderedItems"], json!([{"2": 2}]));

    let (status, _) = app
        .get("/reports/orderedItemsByPeriod?period=week")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.get("/reports/orderedItemsByPeriod?period=day").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_reports_store_status() {
    let app = TestApp::new();

    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"]["status"], "ok");
    assert_eq!(body["environment"], "development");

    app.store.fail_after("begin", 0);
    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["database"]["status"], "error");
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let app = TestApp::new();
    let generated = app.request_id("/inventory", None).await;
    assert!(generated.is_some_and(|id| !id.is_empty()));

    let echoed = app.request_id("/inventory", Some("req-42")).await;
    assert_eq!(echoed.as_deref(), Some("req-42"));
}
