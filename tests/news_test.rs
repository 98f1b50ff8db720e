use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use newsum::config::NewsConfig;
use newsum::news::{NewsApiClient, NewsSource};

type Seen = Arc<Mutex<Vec<HashMap<String, String>>>>;

/// Serve `app` on an ephemeral port and return its base URL.
async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn client(base_url: String) -> NewsApiClient {
    let mut config = NewsConfig::new("test-key");
    config.base_url = base_url;
    config.request_timeout = Duration::from_millis(500);
    NewsApiClient::new(config).unwrap()
}

fn three_articles() -> serde_json::Value {
    json!({
        "status": "ok",
        "totalResults": 3,
        "articles": [
            {
                "source": {"id": null, "name": "CoinDesk"},
                "author": "Jane Doe",
                "title": "Bitcoin tops $100k",
                "description": "A new all-time high.",
                "url": "https://example.com/1"
            },
            {
                "source": {"id": "reuters", "name": "Reuters"},
                "author": null,
                "title": "ETF inflows surge",
                "description": null,
                "url": "https://example.com/2"
            },
            {
                "source": {"name": "The Block"},
                "title": "Miners brace for halving"
            }
        ]
    })
}

#[tokio::test]
async fn formats_each_article_in_order() {
    let seen: Seen = Arc::default();
    let app = Router::new()
        .route(
            "/v2/everything",
            get(
                |State(seen): State<Seen>, Query(params): Query<HashMap<String, String>>| async move {
                    seen.lock().unwrap().push(params);
                    Json(three_articles())
                },
            ),
        )
        .with_state(Arc::clone(&seen));
    let news = client(spawn(app).await);

    let blocks = news.fetch("bitcoin").await;

    assert_eq!(blocks.len(), 3);
    assert_eq!(
        blocks[0],
        "Title: Bitcoin tops $100k,\nAuthor: Jane Doe,\nSource: CoinDesk,\nDescription: A new all-time high.,\nURL: https://example.com/1"
    );
    assert!(blocks[1].contains("Author: Unknown Author,"));
    assert!(blocks[1].contains("Description: No Description,"));
    assert!(blocks[2].ends_with("URL: No URL"));

    for block in &blocks {
        let labels: Vec<&str> = block
            .lines()
            .map(|l| l.split(':').next().unwrap())
            .collect();
        assert_eq!(labels, vec!["Title", "Author", "Source", "Description", "URL"]);
    }

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0]["q"], "bitcoin");
    assert_eq!(seen[0]["apiKey"], "test-key");
    assert_eq!(seen[0]["pageSize"], "5");
}

#[tokio::test]
async fn caps_results_at_page_size() {
    let articles: Vec<_> = (0..9).map(|i| json!({"title": format!("Story {i}")})).collect();
    let body = json!({"articles": articles});
    let app = Router::new().route(
        "/v2/everything",
        get(move || {
            let body = body.clone();
            async move { Json(body) }
        }),
    );
    let news = client(spawn(app).await);

    assert_eq!(news.fetch("anything").await.len(), 5);
}

#[tokio::test]
async fn missing_articles_key_yields_empty() {
    let app = Router::new().route(
        "/v2/everything",
        get(|| async { Json(json!({"status": "ok", "totalResults": 0})) }),
    );
    let news = client(spawn(app).await);

    assert!(news.fetch("nothing").await.is_empty());
}

#[tokio::test]
async fn non_200_statuses_yield_empty() {
    for status in [
        StatusCode::UNAUTHORIZED,
        StatusCode::TOO_MANY_REQUESTS,
        StatusCode::INTERNAL_SERVER_ERROR,
        StatusCode::NO_CONTENT,
    ] {
        let app = Router::new().route(
            "/v2/everything",
            get(move || async move {
                (status, Json(json!({"status": "error", "articles": [{"title": "x"}]})))
            }),
        );
        let news = client(spawn(app).await);

        assert!(
            news.fetch("bitcoin").await.is_empty(),
            "expected no articles for {status}"
        );
    }
}

#[tokio::test]
async fn undecodable_body_yields_empty() {
    let app = Router::new().route("/v2/everything", get(|| async { "<html>maintenance</html>" }));
    let news = client(spawn(app).await);

    assert!(news.fetch("bitcoin").await.is_empty());
}

#[tokio::test]
async fn connection_refused_yields_empty() {
    // Grab a free port, then close it so nothing is listening.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let news = client(format!("http://{addr}"));
    assert!(news.fetch("bitcoin").await.is_empty());
}

#[tokio::test]
async fn slow_server_times_out_to_empty() {
    let app = Router::new().route(
        "/v2/everything",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(three_articles())
        }),
    );
    let news = client(spawn(app).await);

    assert!(news.fetch("bitcoin").await.is_empty());
}
