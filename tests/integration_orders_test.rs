mod common;

use axum::http::{Method, StatusCode};
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde_json::json;
use uuid::Uuid;

use common::{as_decimal, json_body, TestApp};
use reseller_api::entities::{order_item, product};

#[tokio::test]
async fn placing_an_order_snapshots_totals_and_decrements_stock() {
    let app = TestApp::new().await;

    let customer_id = app.seed_customer("Maria Silva", "912345678").await;
    let product_id = app.seed_product("PRF-001", "4.50", "12.00", 10).await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "customer_id": customer_id,
                "items": [{ "product_id": product_id, "quantity": 2 }]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = json_body(response).await;
    assert_eq!(body["status"], "pending");
    assert_eq!(as_decimal(&body["total_amount"]), dec!(24.00));
    assert_eq!(as_decimal(&body["total_profit"]), dec!(15.00));
    assert_eq!(body["customer_name"], "Maria Silva");

    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(as_decimal(&items[0]["unit_price"]), dec!(12.00));
    assert_eq!(as_decimal(&items[0]["subtotal"]), dec!(24.00));

    // Stock went down by the ordered quantity.
    let stored = product::Entity::find_by_id(product_id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.stock_quantity, 8);

    // The item row persisted with the snapshot price.
    let order_id = Uuid::parse_str(body["id"].as_str().unwrap()).unwrap();
    let lines = order_item::Entity::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .all(&*app.state.db)
        .await
        .unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].unit_price, dec!(12.00));
}

#[tokio::test]
async fn repeated_product_lines_decrement_stock_by_their_sum() {
    let app = TestApp::new().await;

    let customer_id = app.seed_customer("Maria Silva", "912345678").await;
    let product_id = app.seed_product("PRF-001", "4.50", "12.00", 10).await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "customer_id": customer_id,
                "items": [
                    { "product_id": product_id, "quantity": 3 },
                    { "product_id": product_id, "quantity": 4 }
                ]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = json_body(response).await;
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
    assert_eq!(as_decimal(&body["total_amount"]), dec!(84.00));

    let stored = product::Entity::find_by_id(product_id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.stock_quantity, 3);

    // The stock check sees the summed quantity, not each line alone.
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "customer_id": customer_id,
                "items": [
                    { "product_id": product_id, "quantity": 2 },
                    { "product_id": product_id, "quantity": 2 }
                ]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let stored = product::Entity::find_by_id(product_id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.stock_quantity, 3);
}

#[tokio::test]
async fn line_unit_price_overrides_the_catalog_price() {
    let app = TestApp::new().await;

    let customer_id = app.seed_customer("Maria Silva", "912345678").await;
    let product_id = app.seed_product("PRF-001", "4.50", "12.00", 10).await;

    // Discounted line: charged at 10.00 instead of the catalog 12.00.
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "customer_id": customer_id,
                "items": [
                    { "product_id": product_id, "quantity": 2, "unit_price": "10.00" }
                ]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = json_body(response).await;
    assert_eq!(as_decimal(&body["total_amount"]), dec!(20.00));
    // Profit still uses the catalog cost: 20.00 - 2 * 4.50.
    assert_eq!(as_decimal(&body["total_profit"]), dec!(11.00));
    assert_eq!(as_decimal(&body["items"][0]["unit_price"]), dec!(10.00));
    assert_eq!(as_decimal(&body["items"][0]["subtotal"]), dec!(20.00));

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "customer_id": customer_id,
                "items": [
                    { "product_id": product_id, "quantity": 1, "unit_price": "-1.00" }
                ]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn insufficient_stock_rejects_the_whole_order() {
    let app = TestApp::new().await;

    let customer_id = app.seed_customer("Maria Silva", "912345678").await;
    let ok_product = app.seed_product("PRF-001", "4.50", "12.00", 10).await;
    let scarce_product = app.seed_product("PRF-002", "3.00", "9.00", 2).await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "customer_id": customer_id,
                "items": [
                    { "product_id": ok_product, "quantity": 1 },
                    { "product_id": scarce_product, "quantity": 5 }
                ]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = json_body(response).await;
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("Available: 2"), "got: {}", message);

    // Atomicity: the passing line must not have touched stock either.
    let stored = product::Entity::find_by_id(ok_product)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.stock_quantity, 10);
}

#[tokio::test]
async fn negative_stock_is_allowed_when_the_product_opts_in() {
    let app = TestApp::new().await;

    let customer_id = app.seed_customer("Maria Silva", "912345678").await;
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/products",
            Some(json!({
                "code": "PRF-BACKORDER",
                "name": "Backorderable Perfume",
                "cost_price": "4.00",
                "sell_price": "10.00",
                "stock_quantity": 1,
                "allow_negative_stock": true
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let product_id =
        Uuid::parse_str(json_body(response).await["id"].as_str().unwrap()).unwrap();

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "customer_id": customer_id,
                "items": [{ "product_id": product_id, "quantity": 3 }]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let stored = product::Entity::find_by_id(product_id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.stock_quantity, -2);
}

#[tokio::test]
async fn order_for_another_users_customer_is_not_found() {
    let app = TestApp::new().await;

    let customer_id = app.seed_customer("Maria Silva", "912345678").await;
    app.seed_product("PRF-001", "4.50", "12.00", 10).await;
    let (_other_id, other_token) = app.register_user("other@example.com").await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "customer_id": customer_id,
                "items": [{ "product_id": Uuid::new_v4(), "quantity": 1 }]
            })),
            Some(&other_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn get_order_includes_customer_and_item_details() {
    let app = TestApp::new().await;

    let customer_id = app.seed_customer("Maria Silva", "912345678").await;
    let product_id = app.seed_product("PRF-001", "4.50", "12.00", 10).await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "customer_id": customer_id,
                "items": [{ "product_id": product_id, "quantity": 1 }]
            })),
        )
        .await;
    let order_id = json_body(response).await["id"].as_str().unwrap().to_string();

    let response = app
        .request_authenticated(Method::GET, &format!("/api/v1/orders/{}", order_id), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["customer_name"], "Maria Silva");
    assert_eq!(body["items"][0]["product_name"], "Product PRF-001");
}

#[tokio::test]
async fn order_status_updates_single_and_bulk() {
    let app = TestApp::new().await;

    let customer_id = app.seed_customer("Maria Silva", "912345678").await;
    let product_id = app.seed_product("PRF-001", "4.50", "12.00", 100).await;

    let mut order_ids = Vec::new();
    for _ in 0..2 {
        let response = app
            .request_authenticated(
                Method::POST,
                "/api/v1/orders",
                Some(json!({
                    "customer_id": customer_id,
                    "items": [{ "product_id": product_id, "quantity": 1 }]
                })),
            )
            .await;
        order_ids.push(json_body(response).await["id"].as_str().unwrap().to_string());
    }

    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/v1/orders/{}/status", order_ids[0]),
            Some(json!({ "status": "completed" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "completed");

    // Bulk update counts only rows that belong to the caller; unknown ids
    // are ignored.
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/orders/bulk-status",
            Some(json!({
                "ids": [order_ids[0], order_ids[1], Uuid::new_v4()],
                "status": "cancelled"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["updated_count"], 2);

    // An empty selection is a client error.
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/orders/bulk-status",
            Some(json!({ "ids": [], "status": "completed" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn orders_list_newest_first() {
    let app = TestApp::new().await;

    let customer_id = app.seed_customer("Maria Silva", "912345678").await;
    let product_id = app.seed_product("PRF-001", "4.50", "12.00", 100).await;

    for date in ["2024-01-10T10:00:00Z", "2024-03-05T10:00:00Z"] {
        let response = app
            .request_authenticated(
                Method::POST,
                "/api/v1/orders",
                Some(json!({
                    "customer_id": customer_id,
                    "order_date": date,
                    "items": [{ "product_id": product_id, "quantity": 1 }]
                })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .request_authenticated(Method::GET, "/api/v1/orders", None)
        .await;
    let body = json_body(response).await;
    assert_eq!(body["total"], 2);
    let items = body["items"].as_array().unwrap();
    let first = items[0]["order_date"].as_str().unwrap();
    let second = items[1]["order_date"].as_str().unwrap();
    assert!(first > second, "expected newest first: {} vs {}", first, second);
}
