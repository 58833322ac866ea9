mod common;

use common::TestApp;
use http::StatusCode;
use serde_json::{Value, json};

fn latte_body(price: f64, ingredients: Value) -> Value {
    json!({
        "product_id": "latte",
        "name": "Latte",
        "description": "",
        "price": price,
        "size": "M",
        "ingredients": ingredients,
    })
}

#[tokio::test]
async fn test_create_derives_allergens_and_default_description() {
    let app = TestApp::new();
    app.stock("espresso", 100.0).await;
    app.stock("espresso_beans", 100.0).await;
    app.stock("milk", 100.0).await;

    let (status, body) = app
        .post(
            "/menu",
            latte_body(
                3.5,
                json!([
                    {"ingredient_id": "espresso", "quantity": 18},
                    {"ingredient_id": "espresso_beans", "quantity": 2},
                    {"ingredient_id": "milk", "quantity": 200},
                ]),
            ),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["id"], "latte");
    assert_eq!(body["description"], "No description");
    // espresso_beans only contains a keyword, it is not one
    assert_eq!(body["allergens"], json!(["caffeine", "lactose"]));

    let (status, body) = app.get("/menu/latte").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ingredients"].as_array().map(Vec::len), Some(3));
}

#[tokio::test]
async fn test_create_rejects_unknown_ingredient() {
    let app = TestApp::new();
    app.stock("milk", 100.0).await;

    let (status, body) = app
        .post(
            "/menu",
            latte_body(
                3.5,
                json!([
                    {"ingredient_id": "milk", "quantity": 200},
                    {"ingredient_id": "unicorn_dust", "quantity": 1},
                ]),
            ),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 7001);

    let (status, _) = app.get("/menu/latte").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_validation() {
    let app = TestApp::new();
    app.stock("milk", 100.0).await;
    let milk = json!([{"ingredient_id": "milk", "quantity": 200}]);

    let (status, body) = app.post("/menu", latte_body(0.0, milk.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 2);

    let (status, _) = app.post("/menu", latte_body(3.5, json!([]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    app.menu_item("latte", 3.5, &[("milk", 200.0)]).await;
    let (status, body) = app.post("/menu", latte_body(3.5, milk)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 4);
}

#[tokio::test]
async fn test_update_records_price_history() {
    let app = TestApp::with_espresso_bar().await;

    let (status, body) = app
        .put(
            "/menu/latte",
            latte_body(4.0, json!([{"ingredient_id": "milk", "quantity": 250}])),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["price"].as_f64(), Some(4.0));
    assert_eq!(body["allergens"], json!(["lactose"]));
    assert_eq!(body["ingredients"].as_array().map(Vec::len), Some(1));

    // Same price again: no new snapshot
    let (status, _) = app
        .put(
            "/menu/latte",
            latte_body(4.0, json!([{"ingredient_id": "milk", "quantity": 250}])),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.get("/menu/latte/price-history").await;
    assert_eq!(status, StatusCode::OK);
    let history = body.as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["old_price"].as_f64(), Some(3.5));
    assert_eq!(history[0]["new_price"].as_f64(), Some(4.0));
}

#[tokio::test]
async fn test_missing_menu_item() {
    let app = TestApp::with_espresso_bar().await;

    let (status, body) = app.get("/menu/mocha").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 6001);

    let (status, _) = app
        .put(
            "/menu/mocha",
            latte_body(4.0, json!([{"ingredient_id": "milk", "quantity": 250}])),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.delete("/menu/mocha").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_and_list() {
    let app = TestApp::with_espresso_bar().await;

    let (_, body) = app.get("/menu").await;
    assert_eq!(body.as_array().map(Vec::len), Some(2));

    let (status, _) = app.delete("/menu/espresso").await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = app.get("/menu").await;
    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["latte"]);
}
