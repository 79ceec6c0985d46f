//! Search and retrieval through NoticeClient

use chrono::NaiveDate;
use doffin::models::{NoticeRef, SearchFilter};
use doffin::NoticeClient;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{load_fixture, test_config};

fn html(name: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html; charset=utf-8")
        .set_body_string(load_fixture(name))
}

#[tokio::test]
async fn test_search_notices() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "API"))
        .and(query_param("county", "Oslo"))
        .and(query_param("page", "2"))
        .respond_with(html("search_single.html"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = NoticeClient::new(&test_config(&mock_server.uri())).unwrap();
    let filter = SearchFilter::new().query("API").county("Oslo").page(2);

    let response = client.search_notices(&filter).await.unwrap();

    assert_eq!(
        response.source_url,
        format!("{}/search?q=API&county=Oslo&page=2", mock_server.uri())
    );
    assert_eq!(response.results.len(), 1);

    let notice = &response.results[0];
    assert_eq!(notice.id, "2024-123456");
    assert_eq!(notice.title.as_deref(), Some("IT Consulting Services"));
    assert_eq!(notice.buyer.as_deref(), Some("Oslo Kommune"));
    assert_eq!(notice.published, NaiveDate::from_ymd_opt(2024, 1, 15));
    assert_eq!(notice.deadline, None);
    assert_eq!(
        notice.url,
        format!("{}/notices/2024-123456", mock_server.uri())
    );
}

#[tokio::test]
async fn test_first_page_sends_no_page_param() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "renhold"))
        .and(query_param_is_missing("page"))
        .respond_with(html("search_results.html"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = NoticeClient::new(&test_config(&mock_server.uri())).unwrap();
    let response = client
        .search_notices(&SearchFilter::new().query("renhold"))
        .await
        .unwrap();

    assert_eq!(response.results.len(), 3);
}

#[tokio::test]
async fn test_search_no_results() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(html("search_empty.html"))
        .mount(&mock_server)
        .await;

    let client = NoticeClient::new(&test_config(&mock_server.uri())).unwrap();
    let response = client
        .search_notices(&SearchFilter::new().query("finnes ikke"))
        .await
        .unwrap();

    assert!(response.results.is_empty());
}

#[tokio::test]
async fn test_get_notice_by_id() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/notices/2024-123456"))
        .respond_with(html("notice_detail.html"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = NoticeClient::new(&test_config(&mock_server.uri())).unwrap();
    let detail = client
        .get_notice(&NoticeRef::Id("2024-123456".into()))
        .await
        .unwrap();

    assert_eq!(detail.id, "2024-123456");
    assert_eq!(detail.title, "IT Consulting Services");
    assert_eq!(detail.buyer.as_deref(), Some("Oslo Kommune"));
    assert_eq!(detail.deadline, NaiveDate::from_ymd_opt(2024, 2, 15));
    // The page's canonical link wins over the address it was fetched from
    assert_eq!(detail.url, "https://doffin.no/notices/2024-123456");
    // Relative document links resolve against the fetched page
    assert_eq!(detail.documents.len(), 3);
    assert_eq!(
        detail.documents[0].url,
        format!("{}/Document/Download/5501", mock_server.uri())
    );
}

#[tokio::test]
async fn test_get_notice_by_url() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/notices/2024-300300"))
        .respond_with(html("notice_minimal.html"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = NoticeClient::new(&test_config(&mock_server.uri())).unwrap();
    let url = format!("{}/notices/2024-300300", mock_server.uri());
    let detail = client.get_notice(&NoticeRef::Url(url.clone())).await.unwrap();

    assert_eq!(detail.id, "2024-300300");
    assert_eq!(detail.url, url);
    assert_eq!(detail.title, "Kjøp av møbler til barnehage");
    assert!(detail.documents.is_empty());
}

#[tokio::test]
async fn test_transient_failure_recovered() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/notices/2024-123456"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/notices/2024-123456"))
        .respond_with(html("notice_detail.html"))
        .mount(&mock_server)
        .await;

    let client = NoticeClient::new(&test_config(&mock_server.uri())).unwrap();
    let detail = client
        .get_notice(&NoticeRef::Id("2024-123456".into()))
        .await
        .unwrap();

    assert_eq!(detail.title, "IT Consulting Services");
}
