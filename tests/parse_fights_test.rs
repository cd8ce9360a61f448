use axum::{http::StatusCode, response::Html, routing::get, Router};
use fight_scraper::parser::{FightParser, ProcessorSettings};
use fight_scraper::server::{create_server, serve, AppState};
use fight_scraper::{FightRecord, ScraperError};
use serde_json::Value;
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::time::Duration;

const TWO_TABLE_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Results</title></head>
<body>
  <div class="month">March 2025</div>
  <table>
    <tr><td class="place" colspan="4">Las Vegas, NV <!-- arena --></td></tr>
    <tr>
      <td class="date">15</td>
      <td class="boxer_1"><a href="/boxer/john-doe">John Doe</a><br>(10-0, 8 KO)</td>
      <td class="vs">KO</td>
      <td class="boxer_2">Jane Smith (7-0, 6 KO)</td>
    </tr>
  </table>
  <table>
    <tr>
      <td class="date">20</td>
      <td class="boxer_1">Mike Johnson</td>
      <td class="vs">Decision</td>
      <td class="boxer_2"><a href="/boxer/sarah-connor">Sarah Connor</a></td>
    </tr>
    <tr>
      <td class="date">21</td>
      <td class="boxer_1"></td>
      <td class="vs">TKO</td>
      <td class="boxer_2">Nobody Special</td>
    </tr>
  </table>
</body>
</html>"#;

const EMPTY_PAGE: &str = "<html><body><p>No results this month</p></body></html>";

async fn spawn_fixture_site() -> SocketAddr {
    let app = Router::new()
        .route("/results/", get(|| async { Html(TWO_TABLE_PAGE) }))
        .route("/empty/", get(|| async { Html(EMPTY_PAGE) }))
        .route("/not-modified/", get(|| async { StatusCode::NOT_MODIFIED }))
        .route(
            "/broken/",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
    spawn(app)
}

fn spawn(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    listener.set_nonblocking(true).unwrap();
    tokio::spawn(async move {
        axum::Server::from_tcp(listener)
            .unwrap()
            .serve(app.into_make_service())
            .await
            .unwrap();
    });
    addr
}

fn parser_for(addr: SocketAddr, path: &str) -> FightParser {
    FightParser::new(
        format!("http://{}{}", addr, path),
        Duration::from_secs(5),
        ProcessorSettings::default(),
    )
    .unwrap()
}

fn sorted_by_date(mut fights: Vec<FightRecord>) -> Vec<FightRecord> {
    fights.sort_by(|a, b| a.date.cmp(&b.date));
    fights
}

#[tokio::test]
async fn test_two_table_page_end_to_end() {
    let site = spawn_fixture_site().await;
    let parser = parser_for(site, "/results/");

    let fights = sorted_by_date(parser.parse_fights().await.unwrap());
    assert_eq!(fights.len(), 2);

    assert_eq!(fights[0].date, "2025-03-15");
    assert_eq!(fights[0].fighter1, "John Doe");
    assert_eq!(fights[0].fighter2, "Jane Smith");
    assert_eq!(fights[0].result, "KO");
    assert_eq!(fights[0].location, "Las Vegas, NV");

    assert_eq!(fights[1].date, "2025-03-20");
    assert_eq!(fights[1].fighter1, "Mike Johnson");
    assert_eq!(fights[1].fighter2, "Sarah Connor");
    assert_eq!(fights[1].result, "Decision");
    assert_eq!(fights[1].location, "Unknown Location");

    assert_ne!(fights[0].id, fights[1].id);
    for fight in &fights {
        assert!(fight.id.starts_with("fight_"));
        assert!(chrono::DateTime::parse_from_rfc3339(&fight.parsed_at).is_ok());
    }
}

#[tokio::test]
async fn test_ids_keep_counting_across_scrapes() {
    let site = spawn_fixture_site().await;
    let parser = parser_for(site, "/results/");

    let counter = |id: &str| -> u64 { id.rsplit('_').next().unwrap().parse().unwrap() };

    let first: Vec<u64> = parser.parse_fights().await.unwrap().iter().map(|f| counter(&f.id)).collect();
    let second: Vec<u64> = parser.parse_fights().await.unwrap().iter().map(|f| counter(&f.id)).collect();

    let first_max = first.iter().max().unwrap();
    assert!(second.iter().all(|n| n > first_max));
}

#[tokio::test]
async fn test_page_without_tables_is_empty_not_error() {
    let site = spawn_fixture_site().await;
    let fights = parser_for(site, "/empty/").parse_fights().await.unwrap();
    assert!(fights.is_empty());
}

#[tokio::test]
async fn test_not_modified_is_error() {
    let site = spawn_fixture_site().await;
    let err = parser_for(site, "/not-modified/").parse_fights().await.unwrap_err();
    assert!(matches!(err, ScraperError::NotModified));
    assert!(err.to_string().contains("not modified"));
}

#[tokio::test]
async fn test_server_error_is_status_error() {
    let site = spawn_fixture_site().await;
    let err = parser_for(site, "/broken/").parse_fights().await.unwrap_err();
    match err {
        ScraperError::UnexpectedStatus { status } => assert_eq!(status.as_u16(), 500),
        other => panic!("expected status error, got {other:?}"),
    }
}

async fn spawn_api(site: SocketAddr, path: &str) -> SocketAddr {
    let static_dir = tempfile::tempdir().unwrap();
    std::fs::write(static_dir.path().join("index.html"), "<h1>Fights</h1>").unwrap();

    let state = AppState {
        parser: Arc::new(parser_for(site, path)),
        metrics: None,
    };
    let app = create_server(state, static_dir.into_path());

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(listener, app));
    addr
}

async fn get_json(url: String) -> (StatusCode, Value) {
    let response = reqwest::get(url).await.unwrap();
    let status = StatusCode::from_u16(response.status().as_u16()).unwrap();
    (status, response.json().await.unwrap())
}

#[tokio::test]
async fn test_api_fights_success() {
    let site = spawn_fixture_site().await;
    let api = spawn_api(site, "/results/").await;

    let (status, body) = get_json(format!("http://{}/api/fights", api)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["source"], format!("http://{}/results/", site));

    let record = &body["data"][0];
    for field in ["id", "date", "fighter1", "fighter2", "result", "location", "parsed_at"] {
        assert!(record[field].is_string(), "missing field {field}");
    }
}

#[tokio::test]
async fn test_api_fights_empty() {
    let site = spawn_fixture_site().await;
    let api = spawn_api(site, "/empty/").await;

    let (status, body) = get_json(format!("http://{}/api/fights", api)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);
    assert_eq!(body["data"], serde_json::json!([]));
    assert_eq!(body["message"], "No fight data available");
}

#[tokio::test]
async fn test_api_fights_failure() {
    let site = spawn_fixture_site().await;
    let api = spawn_api(site, "/not-modified/").await;

    let (status, body) = get_json(format!("http://{}/api/fights", api)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to parse fight data");
    assert!(body["details"].as_str().unwrap().contains("not modified"));
}

#[tokio::test]
async fn test_api_health_and_static_index() {
    let site = spawn_fixture_site().await;
    let api = spawn_api(site, "/results/").await;

    let (status, body) = get_json(format!("http://{}/api/health", api)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let index = reqwest::get(format!("http://{}/", api)).await.unwrap();
    assert_eq!(index.status().as_u16(), 200);
    assert_eq!(index.text().await.unwrap(), "<h1>Fights</h1>");

    let metrics = reqwest::get(format!("http://{}/metrics", api)).await.unwrap();
    assert_eq!(metrics.status().as_u16(), 404);
}

#[tokio::test]
async fn test_api_cors_headers() {
    let site = spawn_fixture_site().await;
    let api = spawn_api(site, "/results/").await;

    let response = reqwest::Client::new()
        .get(format!("http://{}/api/health", api))
        .header("origin", "http://example.com")
        .send()
        .await
        .unwrap();
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "*"
    );
}
