//! Tool dispatch over JSON arguments

use std::sync::Arc;

use doffin::error::Error;
use doffin::tools::{error_payload, NoticeTools, GET_NOTICE, SEARCH_NOTICES};
use doffin::NoticeClient;
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{load_fixture, test_config};

fn tools_for(mock_server: &MockServer) -> NoticeTools {
    let client = NoticeClient::new(&test_config(&mock_server.uri())).unwrap();
    NoticeTools::new(Arc::new(client))
}

#[tokio::test]
async fn test_search_tool() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "API"))
        .and(query_param("cpvCodesLabel", "72000000"))
        .and(query_param_is_missing("page"))
        .respond_with(ResponseTemplate::new(200).set_body_string(load_fixture("search_single.html")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let output = tools_for(&mock_server)
        .call(SEARCH_NOTICES, json!({"q": "API", "cpv": ["72000000"]}))
        .await
        .unwrap();

    let results = output["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["id"], "2024-123456");
    assert_eq!(results[0]["published"], "2024-01-15");
    assert_eq!(results[0]["deadline"], Value::Null);
    assert!(output["source_url"].as_str().unwrap().contains("q=API"));
}

#[tokio::test]
async fn test_search_tool_null_args() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param_is_missing("q"))
        .respond_with(ResponseTemplate::new(200).set_body_string(load_fixture("search_empty.html")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let output = tools_for(&mock_server)
        .call(SEARCH_NOTICES, Value::Null)
        .await
        .unwrap();

    assert_eq!(output["results"], json!([]));
}

#[tokio::test]
async fn test_get_notice_tool() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/notices/2024-123456"))
        .respond_with(ResponseTemplate::new(200).set_body_string(load_fixture("notice_detail.html")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let output = tools_for(&mock_server)
        .call(GET_NOTICE, json!({"notice_id": "2024-123456"}))
        .await
        .unwrap();

    assert_eq!(output["id"], "2024-123456");
    assert_eq!(output["title"], "IT Consulting Services");
    assert_eq!(output["deadline"], "2024-02-15");
    assert_eq!(output["documents"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_get_notice_tool_not_found_payload() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let err = tools_for(&mock_server)
        .call(GET_NOTICE, json!({"notice_id": "2024-000000"}))
        .await
        .unwrap_err();

    let payload = error_payload(&err);
    assert_eq!(payload["error"]["kind"], "NotFound");
    assert_eq!(payload["error"]["status"], 404);
    assert!(payload["error"]["url"]
        .as_str()
        .unwrap()
        .ends_with("/notices/2024-000000"));
}

#[tokio::test]
async fn test_tool_input_errors_send_nothing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let tools = tools_for(&mock_server);

    let unknown = tools.call("delete_notice", json!({})).await;
    assert!(matches!(unknown, Err(Error::InvalidInput(_))));

    let missing = tools.call(GET_NOTICE, json!({})).await;
    assert!(matches!(missing, Err(Error::InvalidInput(_))));

    let bad_page = tools.call(SEARCH_NOTICES, json!({"page": 0})).await;
    assert!(matches!(bad_page, Err(Error::InvalidInput(_))));

    let bad_date = tools
        .call(SEARCH_NOTICES, json!({"published_from": "15.01.2024"}))
        .await;
    assert!(matches!(bad_date, Err(Error::InvalidInput(_))));

    let unknown_field = tools.call(SEARCH_NOTICES, json!({"query": "API"})).await;
    assert!(matches!(unknown_field, Err(Error::InvalidInput(_))));

    let payload = error_payload(&missing.unwrap_err());
    assert_eq!(payload["error"]["kind"], "InvalidInput");
    assert_eq!(payload["error"]["status"], Value::Null);
}
