mod common;

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::time::{sleep, Duration};

use autogg::error::{FetchError, RefreshError};
use autogg::triggers::{FetcherConfig, HttpRuleFetcher, RuleSource, RuleStore};

use common::hypixel_document;

/// Serve one canned HTTP response and hand back the raw request
async fn serve_once(status: &'static str, body: String, delay: Duration) -> (SocketAddr, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();

        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }
        let _ = tx.send(String::from_utf8_lossy(&request).to_string());

        sleep(delay).await;
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
    });

    (addr, rx)
}

fn config_for(addr: SocketAddr, read_timeout_ms: u64) -> FetcherConfig {
    FetcherConfig {
        url: format!("http://{}/autogg/regex_triggers_new.json", addr),
        user_agent: "autogg-test/1.0".to_string(),
        connect_timeout_ms: 1_000,
        read_timeout_ms,
        use_system_proxy: false,
    }
}

#[tokio::test]
async fn test_fetches_servers_with_user_agent() {
    let body = serde_json::json!({ "servers": hypixel_document() }).to_string();
    let (addr, request) = serve_once("200 OK", body, Duration::ZERO).await;

    let fetcher = HttpRuleFetcher::new(config_for(addr, 2_000)).unwrap();
    let servers = fetcher.fetch_document().await.unwrap();

    assert_eq!(servers.keys().collect::<Vec<_>>(), vec!["^mc\\\\.hypixel\\\\.net$"]);

    let request = request.await.unwrap().to_lowercase();
    assert!(request.starts_with("get /autogg/regex_triggers_new.json"));
    assert!(request.contains("user-agent: autogg-test/1.0"));
}

#[tokio::test]
async fn test_error_status_is_fetch_error() {
    let (addr, _request) = serve_once("500 Internal Server Error", "oops".to_string(), Duration::ZERO).await;

    let fetcher = HttpRuleFetcher::new(config_for(addr, 2_000)).unwrap();
    assert!(matches!(fetcher.fetch_document().await, Err(FetchError::Status(500))));
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let body = serde_json::json!({ "servers": {} }).to_string();
    let (addr, _request) = serve_once("200 OK", body, Duration::from_secs(5)).await;

    let fetcher = HttpRuleFetcher::new(config_for(addr, 100)).unwrap();
    let started = std::time::Instant::now();
    let result = fetcher.fetch_document().await;

    // Waiting for headers shares the connect + read budget
    assert!(matches!(result, Err(FetchError::Timeout(1_100))));
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    // Grab a free port, then close it so nothing is listening
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };

    let fetcher = HttpRuleFetcher::new(config_for(addr, 500)).unwrap();
    assert!(matches!(fetcher.fetch_document().await, Err(FetchError::Transport(_))));
}

#[tokio::test]
async fn test_store_survives_non_json_body() {
    let (addr, _request) = serve_once("200 OK", "<html>maintenance</html>".to_string(), Duration::ZERO).await;

    let fetcher = Arc::new(HttpRuleFetcher::new(config_for(addr, 2_000)).unwrap());
    let store = RuleStore::new(fetcher);
    let before = store.current();

    let result = store.refresh().await;
    assert!(matches!(result, Err(RefreshError::Fetch(FetchError::InvalidJson(_)))));
    assert!(Arc::ptr_eq(&before, &store.current()));
}
