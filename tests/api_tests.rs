//! API tests against a running server

use reqwest::{multipart, Client};
use serde_json::Value;

const BASE_URL: &str = "http://localhost:8080";

/// Post a listing and return its id
async fn post_listing(client: &Client, name: &str, price: &str) -> i64 {
    let form = multipart::Form::new()
        .text("item_name", name.to_string())
        .text("item_type", "notes")
        .text("course", "HIST 120")
        .text("price", price.to_string())
        .text("condition", "fair")
        .text("description", "Lecture notes, typed")
        .text("seller_name", "Ida")
        .text("contact_info", "+1 555 0100");

    let response = client
        .post(format!("{}/post/", BASE_URL))
        .multipart(form)
        .send()
        .await
        .expect("Failed to send post request");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse post response");
    body["item"]["id"].as_i64().expect("No id in response")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_post_view_and_sell() {
    let client = Client::new();
    let id = post_listing(&client, "World History notes", "12.50").await;

    let detail: Value = client
        .get(format!("{}/item/{}/", BASE_URL, id))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(detail["contact_type"], "phone");
    assert!(detail["view_count"].as_i64().unwrap_or_default() >= 1);

    let response = client
        .post(format!("{}/item/{}/", BASE_URL, id))
        .form(&[("mark_sold", "1")])
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["item"]["is_sold"], true);
}

#[tokio::test]
#[ignore]
async fn test_catalog_search() {
    let client = Client::new();
    post_listing(&client, "Renaissance reader", "8.00").await;

    let response = client
        .get(format!("{}/items/", BASE_URL))
        .query(&[("search", "renaissance"), ("type", "notes")])
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["total_results"].as_i64().unwrap_or_default() >= 1);
}

#[tokio::test]
#[ignore]
async fn test_invalid_listing() {
    let client = Client::new();
    let form = multipart::Form::new()
        .text("item_name", "Nothing")
        .text("price", "abc");

    let response = client
        .post(format!("{}/post/", BASE_URL))
        .multipart(form)
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["fields"]["price"].is_array());
    assert!(body["fields"]["seller_name"].is_array());
}
