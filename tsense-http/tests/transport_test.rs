//! Integration tests for the tsense HTTP transport.

use std::time::Duration;
use tsense_http::{HttpClient, HttpClientConfig, RetryConfig, StatusCode};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_default_headers_and_json_body_are_sent() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/collections"))
        .and(header("X-TYPESENSE-API-KEY", "secret"))
        .and(body_json(serde_json::json!({ "name": "orders" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({ "name": "orders" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(
        HttpClientConfig::builder()
            .base_url(server.uri())
            .default_header("X-TYPESENSE-API-KEY", "secret")
            .build(),
    )
    .unwrap();

    let response = client
        .post("/collections")
        .json(&serde_json::json!({ "name": "orders" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: serde_json::Value = response.json().unwrap();
    assert_eq!(body["name"], "orders");
}

#[tokio::test]
async fn test_query_parameters_are_encoded() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/collections/orders/documents/export"))
        .and(query_param("filter_by", "paid:true"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"id\":\"1\"}"))
        .mount(&server)
        .await;

    let client = HttpClient::new(HttpClientConfig::builder().base_url(server.uri()).build()).unwrap();

    let response = client
        .get("/collections/orders/documents/export")
        .query("filter_by", "paid:true")
        .send()
        .await
        .unwrap();

    assert!(response.is_success());
    assert_eq!(response.text(), "{\"id\":\"1\"}");
}

#[tokio::test]
async fn test_retries_retriable_status_until_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(
        HttpClientConfig::builder()
            .base_url(server.uri())
            .retry(RetryConfig::exponential(2, Duration::from_millis(5)))
            .build(),
    )
    .unwrap();

    let response = client.get("/health").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_non_retriable_status_is_returned_immediately() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/aliases/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(
        HttpClientConfig::builder()
            .base_url(server.uri())
            .retry(RetryConfig::immediate(3))
            .build(),
    )
    .unwrap();

    let response = client.get("/aliases/missing").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
