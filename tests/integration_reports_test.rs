mod common;

use axum::http::{Method, StatusCode};
use rust_decimal_macros::dec;
use serde_json::json;

use common::{as_decimal, json_body, TestApp};

#[tokio::test]
async fn summary_totals_orders_and_breaks_down_by_month() {
    let app = TestApp::new().await;

    let customer_id = app.seed_customer("Maria Silva", "912345678").await;
    let product_id = app.seed_product("PRF-001", "4.50", "12.00", 100).await;

    // Two orders in March, one in April. 1 unit: revenue 12.00, profit 7.50.
    for date in [
        "2024-03-05T10:00:00Z",
        "2024-03-20T10:00:00Z",
        "2024-04-02T10:00:00Z",
    ] {
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
        .request_authenticated(Method::GET, "/api/v1/reports/summary", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["order_count"], 3);
    assert_eq!(as_decimal(&body["total_revenue"]), dec!(36.00));
    assert_eq!(as_decimal(&body["total_profit"]), dec!(22.50));

    let march = &body["monthly"]["2024-03"];
    assert_eq!(march["order_count"], 2);
    assert_eq!(as_decimal(&march["revenue"]), dec!(24.00));

    let april = &body["monthly"]["2024-04"];
    assert_eq!(april["order_count"], 1);
    assert_eq!(as_decimal(&april["profit"]), dec!(7.50));
}

#[tokio::test]
async fn cancelled_orders_still_count_toward_the_summary() {
    let app = TestApp::new().await;

    let customer_id = app.seed_customer("Maria Silva", "912345678").await;
    let product_id = app.seed_product("PRF-001", "4.50", "12.00", 100).await;

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
        .request_authenticated(
            Method::PUT,
            &format!("/api/v1/orders/{}/status", order_id),
            Some(json!({ "status": "cancelled" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // The dashboard aggregates every order regardless of status.
    let response = app
        .request_authenticated(Method::GET, "/api/v1/reports/summary", None)
        .await;
    let body = json_body(response).await;
    assert_eq!(body["order_count"], 1);
    assert_eq!(as_decimal(&body["total_revenue"]), dec!(12.00));
}

#[tokio::test]
async fn summary_is_empty_for_a_fresh_user() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(Method::GET, "/api/v1/reports/summary", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["order_count"], 0);
    assert!(body["monthly"].as_object().unwrap().is_empty());
}
