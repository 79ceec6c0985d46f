//! Request pacing shared between concurrent callers

use std::sync::Arc;
use std::time::{Duration, Instant};

use doffin::crawler::RateGate;
use doffin::models::NoticeRef;
use doffin::NoticeClient;
use futures::future::join_all;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{load_fixture, paced_config};

const INTERVAL_MS: u64 = 200;

async fn notice_server() -> MockServer {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(load_fixture("notice_detail.html")))
        .mount(&mock_server)
        .await;

    mock_server
}

#[tokio::test]
async fn test_concurrent_calls_are_serialized() {
    let mock_server = notice_server().await;
    let client = Arc::new(
        NoticeClient::new(&paced_config(&mock_server.uri(), INTERVAL_MS)).unwrap(),
    );

    let start = Instant::now();
    let calls = (0..3).map(|i| {
        let client = Arc::clone(&client);
        async move {
            client
                .get_notice(&NoticeRef::Id(format!("2024-00000{i}")))
                .await
        }
    });
    let results = join_all(calls).await;

    assert!(results.iter().all(Result::is_ok));
    // Three requests need at least two full gaps
    assert!(start.elapsed() >= Duration::from_millis(2 * INTERVAL_MS));
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_spawned_tasks_share_gate() {
    let mock_server = notice_server().await;
    let client = Arc::new(
        NoticeClient::new(&paced_config(&mock_server.uri(), INTERVAL_MS)).unwrap(),
    );

    let start = Instant::now();
    let handles: Vec<_> = (0..2)
        .map(|i| {
            let client = Arc::clone(&client);
            tokio::spawn(async move {
                client
                    .get_notice(&NoticeRef::Id(format!("2024-10000{i}")))
                    .await
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }
    assert!(start.elapsed() >= Duration::from_millis(INTERVAL_MS));
}

#[tokio::test]
async fn test_clients_with_shared_gate_are_paced_together() {
    let mock_server = notice_server().await;
    let config = paced_config(&mock_server.uri(), INTERVAL_MS);
    let gate = Arc::new(RateGate::new(config.min_interval()));

    let first = NoticeClient::with_gate(&config, Arc::clone(&gate)).unwrap();
    let second = NoticeClient::with_gate(&config, Arc::clone(&gate)).unwrap();

    let ref_a = NoticeRef::Id("2024-123456".into());
    let ref_b = NoticeRef::Id("2024-654321".into());
    let start = Instant::now();
    let (a, b) = tokio::join!(first.get_notice(&ref_a), second.get_notice(&ref_b));

    assert!(a.is_ok() && b.is_ok());
    assert!(start.elapsed() >= Duration::from_millis(INTERVAL_MS));
}

#[tokio::test]
async fn test_cloned_client_keeps_gate() {
    let mock_server = notice_server().await;
    let client = NoticeClient::new(&paced_config(&mock_server.uri(), INTERVAL_MS)).unwrap();
    let clone = client.clone();

    assert!(Arc::ptr_eq(client.fetcher().gate(), clone.fetcher().gate()));

    let start = Instant::now();
    client
        .get_notice(&NoticeRef::Id("2024-123456".into()))
        .await
        .unwrap();
    clone
        .get_notice(&NoticeRef::Id("2024-123456".into()))
        .await
        .unwrap();

    assert!(start.elapsed() >= Duration::from_millis(INTERVAL_MS));
}
