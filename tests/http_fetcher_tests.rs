use std::time::Duration;

use tread::app::TreadError;
use tread::fetcher::{Fetcher, HttpFetcher};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn fetch_returns_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/feed"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<rss/>"))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(0).unwrap();
    let body = fetcher
        .fetch(&format!("{}/feed", server.uri()), Duration::from_secs(2))
        .await
        .unwrap();

    assert_eq!(body, b"<rss/>");
}

#[tokio::test]
async fn error_status_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(3).unwrap();
    let result = fetcher
        .fetch(&format!("{}/missing", server.uri()), Duration::from_secs(2))
        .await;

    match result {
        Err(TreadError::Status { status, .. }) => assert_eq!(status.as_u16(), 404),
        other => panic!("expected a status error, got {other:?}"),
    }
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn timeouts_are_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(2).unwrap();
    let result = fetcher
        .fetch(&format!("{}/slow", server.uri()), Duration::from_millis(100))
        .await;

    assert!(matches!(result, Err(TreadError::Network(ref e)) if e.is_timeout()));
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}
