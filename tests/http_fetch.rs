use std::sync::Arc;
use std::time::Duration;

use jd_comment_spider_rs::*;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CALLBACK: &str = "fetchJSON_comment98vv21549";
const COMMENTS_PATH: &str = "/comment/productPageComments.action";

fn fetch_config(server: &MockServer) -> FetchConfig {
    FetchConfig {
        endpoint: format!("{}{}", server.uri(), COMMENTS_PATH),
        request_timeout: Duration::from_secs(2),
        retry: RetryConfig {
            max_retries: 2,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(20),
            backoff_multiplier: 2.0,
            jitter: false,
        },
        ..Default::default()
    }
}

fn jsonp_page(page: u32, max_page: Option<u32>, comments: usize) -> String {
    let comments: Vec<serde_json::Value> = (0..comments)
        .map(|i| {
            serde_json::json!({
                "id": page * 100 + i as u32,
                "creationTime": format!("2019-05-{:02} 12:00:00", page + 1),
                "content": format!("comment {} on page {}", i, page),
                "score": 1
            })
        })
        .collect();
    let mut payload = serde_json::json!({ "comments": comments });
    if let Some(max_page) = max_page {
        payload["maxPage"] = serde_json::json!(max_page);
    }
    format!("{}({});", CALLBACK, payload)
}

fn request(page: u32) -> FetchRequest {
    FetchRequest::new(2384789, Score::try_from(1).unwrap(), SortType::Default, page)
}

#[tokio::test]
async fn test_fetch_sends_expected_query_and_unwraps_envelope() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(COMMENTS_PATH))
        .and(query_param("callback", CALLBACK))
        .and(query_param("productId", "2384789"))
        .and(query_param("score", "1"))
        .and(query_param("sortType", "6"))
        .and(query_param("page", "0"))
        .and(query_param("pageSize", "10"))
        .and(query_param("isShadowSku", "0"))
        .and(query_param("fold", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(jsonp_page(0, Some(5), 2)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = HttpPageFetcher::new(fetch_config(&mock_server)).unwrap();
    let page_result = fetcher.fetch(&request(0)).await.unwrap();

    assert_eq!(page_result.max_page, Some(5));
    assert_eq!(page_result.comments.len(), 2);
    assert_eq!(page_result.comments[1].content, "comment 1 on page 0");
    assert_eq!(page_result.comments[0].creation_time, "2019-05-01 12:00:00");
}

#[tokio::test]
async fn test_client_error_status_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = HttpPageFetcher::new(fetch_config(&mock_server)).unwrap();
    let result = fetcher.fetch(&request(3)).await;

    assert!(matches!(result, Err(FetchError::HttpStatus(404))));
}

#[tokio::test]
async fn test_server_error_is_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(jsonp_page(4, None, 3)))
        .mount(&mock_server)
        .await;

    let fetcher = HttpPageFetcher::new(fetch_config(&mock_server)).unwrap();
    let page_result = fetcher.fetch(&request(4)).await.unwrap();

    assert_eq!(page_result.comments.len(), 3);
    assert_eq!(page_result.max_page, None);
}

#[tokio::test]
async fn test_malformed_envelope_is_reported() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(format!("{}({{\"maxPage\":5,\"comments\":[]}}", CALLBACK)),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>busy</html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = HttpPageFetcher::new(fetch_config(&mock_server)).unwrap();

    assert!(matches!(
        fetcher.fetch(&request(1)).await,
        Err(FetchError::MalformedPayload { .. })
    ));
    assert!(matches!(
        fetcher.fetch(&request(2)).await,
        Err(FetchError::MalformedPayload { .. })
    ));
}

#[tokio::test]
async fn test_request_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(jsonp_page(0, Some(1), 1))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let config = FetchConfig {
        request_timeout: Duration::from_millis(200),
        retry: RetryConfig::disabled(),
        ..fetch_config(&mock_server)
    };
    let fetcher = HttpPageFetcher::new(config).unwrap();

    match fetcher.fetch(&request(0)).await {
        Err(FetchError::Network(e)) => assert!(e.is_timeout()),
        other => panic!("expected a timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn test_discovery_failure_aborts_run() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("page", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!("{}({{}});", CALLBACK)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = HttpPageFetcher::new(fetch_config(&mock_server)).unwrap();
    let coordinator = Coordinator::new(Arc::new(fetcher), CoordinatorConfig::default());
    let result = coordinator
        .run(2384789, Score::try_from(1).unwrap(), SortType::Default)
        .await;

    assert!(matches!(result, Err(FetchError::Discovery(_))));
}

#[tokio::test]
async fn test_end_to_end_single_worker_to_csv() {
    let mock_server = MockServer::start().await;

    for page in 0..=2 {
        let max_page = if page == 0 { Some(2) } else { None };
        Mock::given(method("GET"))
            .and(path(COMMENTS_PATH))
            .and(query_param("productId", "2384789"))
            .and(query_param("score", "1"))
            .and(query_param("sortType", "6"))
            .and(query_param("page", page.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_string(jsonp_page(page, max_page, 3)))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let fetcher = HttpPageFetcher::new(fetch_config(&mock_server)).unwrap();
    let coordinator = Coordinator::new(
        Arc::new(fetcher),
        CoordinatorConfig {
            workers: 1,
            ..Default::default()
        },
    );
    let report = coordinator
        .run(2384789, Score::try_from(1).unwrap(), SortType::Default)
        .await
        .unwrap();

    assert!(report.is_complete());
    assert_eq!(report.max_page, 2);
    assert_eq!(report.comments.len(), 9);
    assert_eq!(report.comments[0].content, "comment 0 on page 0");
    assert_eq!(report.comments[8].content, "comment 2 on page 2");

    let dir = tempfile::tempdir().unwrap();
    let output_path = dir.path().join("comments.csv");
    write_to_csv(&report.comments, &output_path).unwrap();

    let mut reader = csv::Reader::from_path(&output_path).unwrap();
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 9);
    assert_eq!(&rows[3][0], "2019-05-02 12:00:00");
    assert_eq!(&rows[3][1], "comment 0 on page 1");
}

#[tokio::test]
async fn test_failed_page_leaves_partial_report() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(403))
        .with_priority(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(query_param("page", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(jsonp_page(0, Some(5), 2)))
        .with_priority(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(jsonp_page(1, None, 2)))
        .mount(&mock_server)
        .await;

    let fetcher = HttpPageFetcher::new(fetch_config(&mock_server)).unwrap();
    let coordinator = Coordinator::new(
        Arc::new(fetcher),
        CoordinatorConfig {
            workers: 3,
            strategy: PartitionStrategy::Balanced,
            deadline: None,
        },
    );
    let report = coordinator
        .run(2384789, Score::try_from(1).unwrap(), SortType::ByDate)
        .await
        .unwrap();

    assert_eq!(report.failed_pages(), vec![3]);
    assert!(matches!(report.failures[0].error, FetchError::HttpStatus(403)));
    assert_eq!(report.comments.len(), 5 * 2);
}

#[tokio::test]
async fn test_body_decoded_with_declared_charset() {
    let mock_server = MockServer::start().await;

    // "好" in GBK
    let mut body = format!("{}({{\"comments\":[{{\"creationTime\":\"t\",\"content\":\"", CALLBACK).into_bytes();
    body.extend_from_slice(&[0xBA, 0xC3]);
    body.extend_from_slice(b"\"}]});");

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html;charset=GBK"))
        .mount(&mock_server)
        .await;

    let fetcher = HttpPageFetcher::new(fetch_config(&mock_server)).unwrap();
    let page_result = fetcher.fetch(&request(1)).await.unwrap();

    assert_eq!(page_result.comments[0].content, "好");
}
