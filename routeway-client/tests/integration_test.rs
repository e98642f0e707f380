//! Integration tests for routeway-client against a mock HTTP server.

use routeway_client::*;
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =============================================================================
// Helpers
// =============================================================================

fn routes() -> RouteTable {
    RouteTable::builder()
        .route(
            Verb::Get,
            "/financial/summary",
            ["/financial/summary", "/finance", "/revenue"],
        )
        .route(
            Verb::Get,
            "/agents/:id/performance",
            ["/api/agents/:id/performance"],
        )
        .route(Verb::Get, "/agents", ["/api/agents"])
        .route(Verb::Post, "/auth/login", ["/auth/login"])
        .build()
        .unwrap()
}

fn config(server: &MockServer) -> ClientConfig {
    ClientConfig::builder()
        .base_url(server.uri())
        .timeout(Duration::from_secs(5))
        .probe_delay(Duration::from_millis(50))
        .build()
}

async fn client(server: &MockServer) -> RouteClient {
    RouteClient::new(config(server), routes(), Arc::new(MemoryStorage::new()))
        .await
        .unwrap()
}

async fn executor(config: ClientConfig, storage: Arc<MemoryStorage>) -> RequestExecutor {
    let session = SessionStore::open(storage, DEFAULT_SESSION_KEY)
        .await
        .unwrap();
    RequestExecutor::new(Arc::new(config), Arc::new(session)).unwrap()
}

/// Serve one response whose headers promise more body than is ever written,
/// then drop the connection. Returns the server's base URL.
async fn truncated_body_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                return;
            }
            request.extend_from_slice(&buf[..n]);
        }
        socket
            .write_all(
                b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 100\r\n\r\n{\"to",
            )
            .await
            .unwrap();
        socket.shutdown().await.unwrap();
    });

    format!("http://{addr}")
}

// =============================================================================
// Fallback Tests
// =============================================================================

#[tokio::test]
async fn test_fallback_stops_at_first_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/financial/summary"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/finance"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"total": 100})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/revenue"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"total": 999})))
        .expect(0)
        .mount(&server)
        .await;

    let client = client(&server).await;
    let env = client.get("/financial/summary", &Params::new()).await;

    assert!(env.success);
    assert_eq!(env.status, Some(200));
    assert_eq!(env.data, Some(json!({"total": 100})));
    assert!(env.error.is_none());

    server.verify().await;
}

#[tokio::test]
async fn test_all_candidates_not_found() {
    let server = MockServer::start().await;

    for p in ["/financial/summary", "/finance", "/revenue"] {
        Mock::given(method("GET"))
            .and(path(p))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;
    }

    let client = client(&server).await;
    let env = client.get("/financial/summary", &Params::new()).await;

    assert!(!env.success);
    assert_eq!(env.kind, Some(ErrorKind::Exhausted));
    assert_eq!(env.status, Some(404));
    assert_eq!(env.error.as_deref(), Some(EXHAUSTED_MESSAGE));
    assert_eq!(env.detail.as_deref(), Some("HTTP 404"));

    server.verify().await;
}

#[tokio::test]
async fn test_server_error_returned_without_fallback() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/financial/summary"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database unavailable"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/finance"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client(&server).await;
    let env = client.get("/financial/summary", &Params::new()).await;

    assert!(!env.success);
    assert!(env.connected);
    assert_eq!(env.status, Some(500));
    assert_eq!(env.kind, Some(ErrorKind::Http(500)));
    assert_eq!(env.error.as_deref(), Some("database unavailable"));

    server.verify().await;
}

#[tokio::test]
async fn test_markup_page_falls_through() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/financial/summary"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<!DOCTYPE html><html><body>Page not found</body></html>", "text/html"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/finance"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"total": 5})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server).await;
    let env = client.get("/financial/summary", &Params::new()).await;

    assert!(env.success);
    assert_eq!(env.data, Some(json!({"total": 5})));
}

#[tokio::test]
async fn test_unreachable_candidate_falls_through() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let table = RouteTable::builder()
        .route(
            Verb::Get,
            "/health",
            [
                "http://127.0.0.1:1/health".to_string(),
                format!("{}/health", server.uri()),
            ],
        )
        .build()
        .unwrap();
    let client = RouteClient::new(ClientConfig::default(), table, Arc::new(MemoryStorage::new()))
        .await
        .unwrap();

    let env = client.get("/health", &Params::new()).await;
    assert!(env.success);
    assert_eq!(env.data, Some(json!({"status": "ok"})));
}

#[tokio::test]
async fn test_path_parameters_reach_server() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/agents/42/performance"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"score": 9})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server).await;
    let params = Params::from([("id".to_string(), "42".to_string())]);
    let env = client.get("/agents/:id/performance", &params).await;

    assert!(env.success);
    assert_eq!(env.data, Some(json!({"score": 9})));
}

#[tokio::test]
async fn test_query_sent_to_every_candidate() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/financial/summary"))
        .and(query_param("period", "30d"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/finance"))
        .and(query_param("period", "30d"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"total": 30})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server).await;
    let query = Params::from([("period".to_string(), "30d".to_string())]);
    let env = client
        .dispatch_with_query(
            &LogicalRoute::get("/financial/summary"),
            &Params::new(),
            &query,
            None,
        )
        .await;

    assert!(env.success);
    assert_eq!(env.data, Some(json!({"total": 30})));
    server.verify().await;
}

#[tokio::test]
async fn test_missing_parameter_sends_nothing() {
    let server = MockServer::start().await;
    let client = client(&server).await;

    let env = client.get("/agents/:id/performance", &Params::new()).await;

    assert!(!env.success);
    assert_eq!(env.kind, Some(ErrorKind::MissingParameter));
    assert!(env.error.as_deref().unwrap().contains("`id`"));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_dot_segment_parameter_sends_nothing() {
    let server = MockServer::start().await;
    let client = client(&server).await;

    let params = Params::from([("id".to_string(), "..".to_string())]);
    let env = client.get("/agents/:id/performance", &params).await;

    assert!(!env.success);
    assert!(!env.connected);
    assert_eq!(env.kind, Some(ErrorKind::InvalidUrl));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unregistered_route() {
    let server = MockServer::start().await;
    let client = client(&server).await;

    let env = client.delete("/agents", &Params::new()).await;
    assert_eq!(env.kind, Some(ErrorKind::NoRoute));
    assert!(server.received_requests().await.unwrap().is_empty());
}

// =============================================================================
// Executor Tests
// =============================================================================

#[tokio::test]
async fn test_executor_flags_markup_without_parsing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/financial"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("<!DOCTYPE html>\n<html></html>", "text/html"),
        )
        .mount(&server)
        .await;

    let executor = executor(config(&server), Arc::new(MemoryStorage::new())).await;
    let env = executor
        .execute(&ResolvedRequest::new(Verb::Get, "/financial"))
        .await;

    assert!(!env.success);
    assert!(env.connected);
    assert_eq!(env.kind, Some(ErrorKind::UnexpectedContent));
    assert_eq!(env.status, Some(200));
    assert!(env.data.is_none());
}

#[tokio::test]
async fn test_executor_plain_text_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/working"))
        .respond_with(ResponseTemplate::new(200).set_body_string("it works"))
        .mount(&server)
        .await;

    let executor = executor(config(&server), Arc::new(MemoryStorage::new())).await;
    let env = executor
        .execute(&ResolvedRequest::new(Verb::Get, "/working"))
        .await;

    assert!(env.success);
    assert!(env.raw);
    assert_eq!(env.data, Some(json!("it works")));
}

#[tokio::test]
async fn test_executor_transport_failure() {
    let executor = executor(ClientConfig::default(), Arc::new(MemoryStorage::new())).await;
    let env = executor
        .execute(&ResolvedRequest::new(Verb::Get, "http://127.0.0.1:1/health"))
        .await;

    assert!(!env.success);
    assert!(!env.connected);
    assert_eq!(env.status, None);
    assert_eq!(env.kind, Some(ErrorKind::Transport));
    assert!(!env.error.unwrap().is_empty());
}

#[tokio::test]
async fn test_executor_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let config = ClientConfig::builder()
        .base_url(server.uri())
        .timeout(Duration::from_millis(200))
        .build();
    let executor = executor(config, Arc::new(MemoryStorage::new())).await;
    let env = executor
        .execute(&ResolvedRequest::new(Verb::Get, "/slow"))
        .await;

    assert!(!env.connected);
    assert_eq!(env.kind, Some(ErrorKind::Timeout));
}

#[tokio::test]
async fn test_executor_truncated_body_is_transport_failure() {
    let base_url = truncated_body_server().await;
    let executor = executor(ClientConfig::default(), Arc::new(MemoryStorage::new())).await;

    let env = executor
        .execute(&ResolvedRequest::new(Verb::Get, format!("{base_url}/summary")))
        .await;

    assert!(!env.success);
    assert!(!env.connected);
    assert_eq!(env.kind, Some(ErrorKind::Transport));
    assert_eq!(env.status, Some(200));
    assert!(env.data.is_none());
    assert!(!env.error.unwrap().is_empty());
}

#[tokio::test]
async fn test_executor_sends_json_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/withdrawals"))
        .and(header("Content-Type", "application/json"))
        .and(body_json(json!({"amount": 250, "agentId": "a1"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "w1"})))
        .expect(1)
        .mount(&server)
        .await;

    let executor = executor(config(&server), Arc::new(MemoryStorage::new())).await;
    let env = executor
        .execute(
            &ResolvedRequest::new(Verb::Post, "/withdrawals")
                .with_body(Some(json!({"amount": 250, "agentId": "a1"}))),
        )
        .await;

    assert!(env.success);
    assert_eq!(env.status, Some(201));
    server.verify().await;
}

// =============================================================================
// Session Tests
// =============================================================================

#[tokio::test]
async fn test_login_stores_token_and_authorizes_requests() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({"email": "agent@example.com", "password": "secret"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "token": "abc"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/agents"))
        .and(header("Authorization", "Bearer abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let storage = Arc::new(MemoryStorage::new());
    let client = RouteClient::new(config(&server), routes(), storage.clone())
        .await
        .unwrap();
    assert!(!client.is_authenticated());

    let env = client
        .login(json!({"email": "agent@example.com", "password": "secret"}))
        .await;
    assert!(env.success);
    assert!(client.is_authenticated());
    assert_eq!(storage.peek(DEFAULT_SESSION_KEY).as_deref(), Some("abc"));

    let env = client.get("/agents", &Params::new()).await;
    assert!(env.success);

    server.verify().await;
}

#[tokio::test]
async fn test_no_authorization_header_without_session() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/agents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let client = client(&server).await;
    let env = client.get("/agents", &Params::new()).await;
    assert!(env.success);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_login_rejected_keeps_session_empty() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"success": false, "error": "Invalid credentials"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server).await;
    let env = client
        .login(json!({"email": "agent@example.com", "password": "wrong"}))
        .await;

    assert!(!env.success);
    assert_eq!(env.kind, Some(ErrorKind::Http(401)));
    assert_eq!(env.error.as_deref(), Some("Invalid credentials"));
    assert!(!client.is_authenticated());
}

#[tokio::test]
async fn test_login_without_token_is_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .mount(&server)
        .await;

    let client = client(&server).await;
    let env = client.login(json!({"email": "a", "password": "b"})).await;

    assert!(!env.success);
    assert_eq!(env.kind, Some(ErrorKind::Rejected));
    assert_eq!(env.status, Some(200));
    assert!(!client.is_authenticated());
}

#[tokio::test]
async fn test_session_survives_restart_with_file_storage() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let session_file = dir.path().join("session.json");

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "token": "persisted"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/agents"))
        .and(header("Authorization", "Bearer persisted"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let first = RouteClient::new(
        config(&server),
        routes(),
        Arc::new(FileStorage::new(&session_file)),
    )
    .await
    .unwrap();
    assert!(first.login(json!({"email": "a", "password": "b"})).await.success);
    drop(first);

    let second = RouteClient::new(
        config(&server),
        routes(),
        Arc::new(FileStorage::new(&session_file)),
    )
    .await
    .unwrap();
    assert!(second.is_authenticated());
    assert!(second.get("/agents", &Params::new()).await.success);

    assert!(second.logout().await.success);
    let third = RouteClient::new(
        config(&server),
        routes(),
        Arc::new(FileStorage::new(&session_file)),
    )
    .await
    .unwrap();
    assert!(!third.is_authenticated());

    server.verify().await;
}

// =============================================================================
// Probe Tests
// =============================================================================

#[tokio::test]
async fn test_probe_is_sequential_and_records_every_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let storage = Arc::new(MemoryStorage::with_token(DEFAULT_SESSION_KEY, "abc"));
    let client = RouteClient::new(config(&server), routes(), storage.clone())
        .await
        .unwrap();

    let endpoints = vec![
        NamedEndpoint::new("health", "/health"),
        NamedEndpoint::new("api", "/api"),
        NamedEndpoint::new("offline", "http://127.0.0.1:1/"),
    ];

    let start = Instant::now();
    let report = client.probe_endpoints(&endpoints).await;
    assert!(start.elapsed() >= Duration::from_millis(100));

    let names: Vec<&str> = report.results.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["health", "api", "offline"]);

    assert!(report.results[0].connected);
    assert_eq!(report.results[0].status, Some(200));

    assert!(!report.results[1].connected);
    assert_eq!(report.results[1].status, Some(404));
    assert_eq!(report.results[1].error.as_deref(), Some("HTTP 404"));

    assert!(!report.results[2].connected);
    assert_eq!(report.results[2].status, None);
    assert!(report.results[2].error.is_some());

    assert_eq!(report.connected_count, 1);
    assert!(!report.all_connected);

    // Probes are unauthenticated and leave the session alone.
    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| r.headers.get("authorization").is_none()));
    assert_eq!(storage.peek(DEFAULT_SESSION_KEY).as_deref(), Some("abc"));
}

#[tokio::test]
async fn test_probe_route_table_endpoints() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = client(&server).await;
    let report = client.probe().await;

    // Placeholder templates are skipped.
    let urls: Vec<&str> = report.results.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(
        urls,
        vec!["/financial/summary", "/finance", "/revenue", "/api/agents", "/auth/login"]
    );
    assert!(report.all_connected);
}

#[tokio::test]
async fn test_probe_cancellation_between_steps() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = RouteClient::new(
        ClientConfig::builder()
            .base_url(server.uri())
            .probe_delay(Duration::from_secs(5))
            .build(),
        routes(),
        Arc::new(MemoryStorage::new()),
    )
    .await
    .unwrap();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let endpoints = vec![
        NamedEndpoint::new("health", "/health"),
        NamedEndpoint::new("api", "/api"),
    ];
    let start = Instant::now();
    let report = client.probe_until_cancelled(&endpoints, &cancel).await;

    assert!(start.elapsed() < Duration::from_secs(5));
    assert!(report.cancelled);
    assert_eq!(report.results.len(), 1);
    assert!(report.results[0].connected);
}

#[tokio::test]
async fn test_preflight_login_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("OPTIONS"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server).await;
    let result = client
        .preflight(&LogicalRoute::post("/auth/login"), &Params::new())
        .await
        .unwrap();

    assert!(result.connected);
    assert_eq!(result.status, Some(204));
    server.verify().await;
}

#[tokio::test]
async fn test_truncated_body_is_not_connected() {
    let base_url = truncated_body_server().await;
    let server = MockServer::start().await;
    let client = client(&server).await;

    let endpoints = vec![NamedEndpoint::new("summary", format!("{base_url}/summary"))];
    let report = client.probe_endpoints(&endpoints).await;

    assert_eq!(report.results.len(), 1);
    assert!(!report.results[0].connected);
    assert_eq!(report.results[0].status, Some(200));
    assert!(report.results[0].error.is_some());
    assert!(!report.all_connected);
}
