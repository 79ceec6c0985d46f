//! Error scenario integration tests
//!
//! Tests how failures surface to callers:
//! 1. Missing notices (404, 410)
//! 2. Exhausted retries
//! 3. Unrecognizable pages
//! 4. Invalid input that must not reach the network

use doffin::error::{Error, ErrorCategory, FetchError, ParseError};
use doffin::models::{NoticeRef, SearchFilter};
use doffin::NoticeClient;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{load_fixture, test_config};

// ============================================================================
// HTTP Error Tests
// ============================================================================

#[tokio::test]
async fn test_404_maps_to_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/notices/2024-000000"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = NoticeClient::new(&test_config(&mock_server.uri())).unwrap();
    let err = client
        .get_notice(&NoticeRef::Id("2024-000000".into()))
        .await
        .unwrap_err();

    match &err {
        Error::NotFound { url, status } => {
            assert_eq!(*status, 404);
            assert!(url.ends_with("/notices/2024-000000"));
        }
        other => panic!("Expected NotFound, got {other:?}"),
    }
    assert!(!err.is_recoverable());
}

#[tokio::test]
async fn test_410_maps_to_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(410))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = NoticeClient::new(&test_config(&mock_server.uri())).unwrap();
    let err = client
        .get_notice(&NoticeRef::Id("2023-111111".into()))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::NotFound { status: 410, .. }));
}

#[tokio::test]
async fn test_search_404_is_fetch_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = NoticeClient::new(&test_config(&mock_server.uri())).unwrap();
    let err = client
        .search_notices(&SearchFilter::new().query("API"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::FetchFailed {
            attempts: 1,
            cause: FetchError::Status(404),
            ..
        }
    ));
}

#[tokio::test]
async fn test_retries_exhausted() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&mock_server)
        .await;

    let client = NoticeClient::new(&test_config(&mock_server.uri())).unwrap();
    let err = client
        .get_notice(&NoticeRef::Id("2024-123456".into()))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "FetchFailed");
    assert_eq!(err.status(), Some(503));
    assert_eq!(err.category(), ErrorCategory::Network);
    assert!(err.is_recoverable());
}

// ============================================================================
// Parse Error Tests
// ============================================================================

#[tokio::test]
async fn test_unrecognized_notice_page() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(load_fixture("notice_no_title.html")))
        .mount(&mock_server)
        .await;

    let client = NoticeClient::new(&test_config(&mock_server.uri())).unwrap();
    let err = client
        .get_notice(&NoticeRef::Id("2024-123456".into()))
        .await
        .unwrap_err();

    match err {
        Error::ParseFailed { url, cause } => {
            assert_eq!(cause, ParseError::TitleNotFound);
            assert!(url.ends_with("/notices/2024-123456"));
        }
        other => panic!("Expected ParseFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_listing_yields_empty_results() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<div><<p>unclosed"))
        .mount(&mock_server)
        .await;

    let client = NoticeClient::new(&test_config(&mock_server.uri())).unwrap();
    let response = client
        .search_notices(&SearchFilter::new())
        .await
        .unwrap();

    assert!(response.results.is_empty());
}

// ============================================================================
// Input Validation Tests
// ============================================================================

#[tokio::test]
async fn test_invalid_input_sends_nothing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = NoticeClient::new(&test_config(&mock_server.uri())).unwrap();

    let result = client.search_notices(&SearchFilter::new().page(0)).await;
    assert!(matches!(result, Err(Error::InvalidInput(_))));

    let result = client.get_notice(&NoticeRef::Id("   ".into())).await;
    assert!(matches!(result, Err(Error::InvalidInput(_))));

    let result = client
        .get_notice(&NoticeRef::Url("ftp://doffin.no/notices/1".into()))
        .await;
    assert!(matches!(result, Err(Error::InvalidInput(_))));
}

#[tokio::test]
async fn test_off_site_notice_url_sends_nothing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = NoticeClient::new(&test_config(&mock_server.uri())).unwrap();

    for url in [
        "https://internal.example/notices/1",
        "http://169.254.169.254/latest/meta-data",
    ] {
        let result = client.get_notice(&NoticeRef::Url(url.into())).await;
        assert!(
            matches!(result, Err(Error::InvalidInput(_))),
            "{url} was not rejected"
        );
    }

    // Same host as the site root, different port
    let other_port = mock_server.address().port().wrapping_add(1);
    let result = client
        .get_notice(&NoticeRef::Url(format!(
            "http://127.0.0.1:{other_port}/notices/1"
        )))
        .await;
    assert!(matches!(result, Err(Error::InvalidInput(_))));
}
