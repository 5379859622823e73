use std::sync::Arc;

use clusterscope::ingestion::{FeedEntry, FeedSource};
use clusterscope::server::{build_rocket, AppState};
use common::Config;
use rocket::http::{ContentType, Status};
use rocket::local::asynchronous::Client;

struct StaticFeed(Vec<FeedEntry>);

#[async_trait::async_trait]
impl FeedSource for StaticFeed {
    async fn fetch_entries(&self, _url: &str) -> anyhow::Result<Vec<FeedEntry>> {
        Ok(self.0.clone())
    }
}

fn entry(title: &str, summary: &str) -> FeedEntry {
    FeedEntry {
        title: Some(title.to_string()),
        link: Some(format!("https://example.com/{}", title)),
        summary: Some(summary.to_string()),
        ..Default::default()
    }
}

async fn client_with(entries: Vec<FeedEntry>) -> Client {
    let config: Config = toml::from_str(
        r#"
        [clustering]
        num_clusters = 2

        [server]
        default_url = "https://news.example/rss"
        "#,
    )
    .expect("parse config");

    let state = AppState::new(Arc::new(config), Arc::new(StaticFeed(entries)));
    Client::tracked(build_rocket(state)).await.expect("valid rocket instance")
}

fn two_topics() -> Vec<FeedEntry> {
    vec![
        entry("r1", "rust compiler release"),
        entry("f1", "football league match"),
        entry("r2", "rust compiler borrow checker"),
        entry("f2", "football league transfer"),
    ]
}

#[rocket::async_test]
async fn health_is_ok() {
    let client = client_with(Vec::new()).await;
    let response = client.get("/health").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(response.into_string().await.as_deref(), Some("OK"));
}

#[rocket::async_test]
async fn index_prefills_form_from_config() {
    let client = client_with(Vec::new()).await;
    let response = client.get("/").dispatch().await;
    assert_eq!(response.status(), Status::Ok);

    let body = response.into_string().await.expect("body");
    assert!(body.contains("value=\"https://news.example/rss\""));
    assert!(body.contains("name=\"clusters\" min=\"1\" value=\"2\""));
}

#[rocket::async_test]
async fn results_page_lists_clusters() {
    let client = client_with(two_topics()).await;
    let response = client
        .get("/clusters?url=https%3A%2F%2Fnews.example%2Frss&clusters=2")
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    let body = response.into_string().await.expect("body");
    assert!(body.contains("<h1>Clustered News Articles</h1>"));
    assert!(body.contains("<h3>Cluster 0</h3>"));
    assert!(body.contains("<h3>Cluster 1</h3>"));
    assert!(body.contains("https://example.com/r2"));
}

#[rocket::async_test]
async fn results_page_reports_empty_feed() {
    let client = client_with(Vec::new()).await;
    let response = client.get("/clusters?url=https%3A%2F%2Fempty.example").dispatch().await;
    assert_eq!(response.status(), Status::Ok);

    let body = response.into_string().await.expect("body");
    assert!(body.contains("No articles found at the URL."));
}

#[rocket::async_test]
async fn api_returns_groups() {
    let client = client_with(two_topics()).await;
    let response = client
        .post("/api/v1/cluster")
        .header(ContentType::JSON)
        .body(r#"{"url": "https://news.example/rss", "num_clusters": 2}"#)
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    let value: serde_json::Value =
        serde_json::from_str(&response.into_string().await.expect("body")).expect("json");
    assert_eq!(value["status"], "clustered");
    let total: usize = value["clusters"]
        .as_object()
        .expect("clusters object")
        .values()
        .map(|g| g.as_array().map(Vec::len).unwrap_or(0))
        .sum();
    assert_eq!(total, 4);
}

#[rocket::async_test]
async fn api_rejects_too_many_clusters() {
    let client = client_with(two_topics()).await;
    let response = client
        .post("/api/v1/cluster")
        .header(ContentType::JSON)
        .body(r#"{"url": "https://news.example/rss", "num_clusters": 9}"#)
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);

    let value: serde_json::Value =
        serde_json::from_str(&response.into_string().await.expect("body")).expect("json");
    assert!(value["error"].as_str().unwrap_or_default().contains("invalid number of clusters"));
}

#[rocket::async_test]
async fn api_reports_no_articles() {
    let client = client_with(Vec::new()).await;
    let response = client
        .post("/api/v1/cluster")
        .header(ContentType::JSON)
        .body(r#"{"url": "https://empty.example"}"#)
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    let value: serde_json::Value =
        serde_json::from_str(&response.into_string().await.expect("body")).expect("json");
    assert_eq!(value["status"], "no_articles");
}
