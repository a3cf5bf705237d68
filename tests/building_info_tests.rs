use chrono::NaiveDate;
use planning_tracker::{
    config::Config,
    error::AppError,
    models::{period::UpdatePeriod, project::UpdateType},
    services::{building_info::ProjectSearch, BuildingInfoClient, UpdateFeed},
};
use serde_json::json;
use std::time::Duration;
use tokio_test::assert_ok;
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

const FEED_PATH: &str = "/api/v2/bi/projects/t-projects";

fn client_for(server: &MockServer, timeout_ms: u64) -> BuildingInfoClient {
    let config = Config {
        building_info_api_url: format!("{}{}", server.uri(), FEED_PATH),
        building_info_api_key: Some("key".into()),
        building_info_user_key: Some("ukey".into()),
        request_timeout_ms: timeout_ms,
        retry_initial_delay_ms: 5,
        ..Config::default()
    };
    BuildingInfoClient::new(&config).unwrap()
}

fn ok_rows() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "data": { "rows": [{ "planning_id": 11, "planning_title": "Quay wall" }], "total": 1 }
    }))
}

#[tokio::test]
async fn test_retries_transient_status_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(FEED_PATH))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(FEED_PATH))
        .respond_with(ok_rows())
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, 2_000);
    let page = client.search_projects(&ProjectSearch { page: 1, limit: 10, ..Default::default() }).await.unwrap();

    assert_eq!(page.total, Some(1));
    assert_eq!(page.rows[0].title(), "Quay wall");
}

#[tokio::test]
async fn test_gives_up_after_max_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(FEED_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(3)
        .mount(&server)
        .await;

    let client = client_for(&server, 2_000);
    let err = client
        .fetch_updates(UpdateType::Major, UpdatePeriod::Today)
        .await
        .unwrap_err();

    match err {
        AppError::UpstreamStatus { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "boom");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(FEED_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, 2_000);
    let err = client.get_project("11").await.unwrap_err();
    assert!(matches!(err, AppError::UpstreamStatus { status: 401, .. }));
}

#[tokio::test]
async fn test_slow_responses_time_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(FEED_PATH))
        .respond_with(ok_rows().set_delay(Duration::from_millis(800)))
        .mount(&server)
        .await;

    let client = client_for(&server, 50);
    let err = client
        .fetch_updates(UpdateType::Minor, UpdatePeriod::LastMonth)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Timeout(50)));
}

#[tokio::test]
async fn test_update_queries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(FEED_PATH))
        .and(query_param("_apion", "-30.1"))
        .and(query_param("more", "limit 0,500"))
        .respond_with(ok_rows())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(FEED_PATH))
        .and(query_param("_apion", "8"))
        .and(query_param("min_apion", "2024-03-01"))
        .and(query_param("max_apion", "2024-03-15"))
        .respond_with(ok_rows())
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, 2_000);
    assert!(client.has_credentials());

    let minor = assert_ok!(client.fetch_updates(UpdateType::Minor, UpdatePeriod::LastMonth).await);
    assert_eq!(minor.len(), 1);

    let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
    let ranged = assert_ok!(client.fetch_updates_between(start, end).await);
    assert_eq!(ranged[0].planning_id, "11");
}

#[tokio::test]
async fn test_get_project_matches_requested_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(FEED_PATH))
        .and(query_param("planning_id", "12"))
        .respond_with(ok_rows())
        .mount(&server)
        .await;

    let client = client_for(&server, 2_000);
    // Upstream returned a different project.
    assert!(client.get_project("12").await.unwrap().is_none());
}
