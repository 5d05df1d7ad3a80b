//! Feed pipeline integration tests
//!
//! Runs the real websocket transport and HTTP metadata client against a
//! local axum server that scripts each stream connection and serves
//! metadata documents.

use axum::{
    Json, Router,
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use cosmo_feed::{ConnectionStatus, EnrichmentState, FeedConfig, FeedPipeline, PipelineHandle};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::net::TcpListener;

// ============================================================================
// Test Server
// ============================================================================

#[derive(Clone)]
enum Step {
    Send(String),
    Pause(Duration),
    Close,
}

struct ServerState {
    scripts: Vec<Vec<Step>>,
    connections: AtomicUsize,
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<ServerState>>) -> Response {
    ws.on_upgrade(move |socket| serve_stream(socket, state))
}

/// Play this connection's script, then hold the socket open until the client leaves
async fn serve_stream(mut socket: WebSocket, state: Arc<ServerState>) {
    let index = state.connections.fetch_add(1, Ordering::SeqCst);
    let script = state.scripts.get(index).cloned().unwrap_or_default();

    for step in script {
        match step {
            Step::Send(text) => {
                if socket.send(Message::Text(text.into())).await.is_err() {
                    return;
                }
            }
            Step::Pause(delay) => tokio::time::sleep(delay).await,
            Step::Close => {
                let _ = socket.send(Message::Close(None)).await;
                return;
            }
        }
    }

    while let Some(Ok(_)) = socket.recv().await {}
}

async fn metadata(Path(id): Path<String>) -> Response {
    match id.as_str() {
        "slow" => {
            tokio::time::sleep(Duration::from_millis(300)).await;
            Json(json!({"name": "Slow Coin", "symbol": "SLOW"})).into_response()
        }
        "null" => Json(Value::Null).into_response(),
        "missing" => StatusCode::NOT_FOUND.into_response(),
        "garbled" => "<html>not json</html>".into_response(),
        other => Json(json!({
            "name": format!("{} Coin", other),
            "symbol": other.to_uppercase(),
            "image": format!("https://img.test/{}.png", other),
            "twitter": "https://x.com/test",
        }))
        .into_response(),
    }
}

/// Start a test server; `script` receives the bound address so messages can
/// point at its metadata routes
async fn start_test_server<S>(script: S) -> (SocketAddr, Arc<ServerState>)
where
    S: FnOnce(SocketAddr) -> Vec<Vec<Step>>,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let state = Arc::new(ServerState {
        scripts: script(addr),
        connections: AtomicUsize::new(0),
    });

    let app = Router::new()
        .route("/connect", get(ws_handler))
        .route("/meta/{id}", get(metadata))
        .with_state(Arc::clone(&state));

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, state)
}

// ============================================================================
// Helpers
// ============================================================================

fn created(addr: SocketAddr, mint: &str, name: &str, meta: &str) -> Step {
    Step::Send(
        json!({
            "name": name,
            "symbol": mint.to_uppercase(),
            "uri": format!("http://{}/meta/{}", addr, meta),
            "mint": mint,
        })
        .to_string(),
    )
}

fn start_pipeline(addr: SocketAddr) -> PipelineHandle {
    let config = FeedConfig::new(format!("ws://{}/connect", addr))
        .with_reconnect_delay(Duration::from_millis(200))
        .with_enrichment_timeout(Duration::from_secs(2));
    FeedPipeline::websocket(config).unwrap().start()
}

async fn wait_until<F>(what: &str, check: F)
where
    F: Fn() -> bool,
{
    let deadline = Instant::now() + Duration::from_secs(5);
    while !check() {
        assert!(Instant::now() < deadline, "timed out waiting for {}", what);
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

fn identities(handle: &PipelineHandle) -> Vec<String> {
    handle.snapshot().into_iter().map(|r| r.identity).collect()
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_record_appears_pending_then_loads() {
    let (addr, _state) =
        start_test_server(|addr| vec![vec![created(addr, "mint1", "Stream Name", "slow")]]).await;
    let handle = start_pipeline(addr);

    wait_until("first record", || handle.store().len() == 1).await;
    let record = handle.store().get("mint1").unwrap();
    assert_eq!(record.state(), EnrichmentState::Pending);
    assert_eq!(record.title(), "Stream Name");

    wait_until("metadata", || {
        handle
            .store()
            .get("mint1")
            .is_some_and(|r| r.state() == EnrichmentState::Loaded)
    })
    .await;
    let record = handle.store().get("mint1").unwrap();
    assert_eq!(record.title(), "Slow Coin");
    assert_eq!(record.ticker(), "SLOW");
    assert_eq!(handle.state().status, ConnectionStatus::Connected);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_newest_first_with_enriched_links() {
    let (addr, _state) = start_test_server(|addr| {
        vec![vec![
            created(addr, "a", "A", "alpha"),
            created(addr, "b", "B", "beta"),
            created(addr, "c", "C", "gamma"),
        ]]
    })
    .await;
    let handle = start_pipeline(addr);

    wait_until("three loaded records", || {
        let snapshot = handle.snapshot();
        snapshot.len() == 3 && snapshot.iter().all(|r| r.state() == EnrichmentState::Loaded)
    })
    .await;

    assert_eq!(identities(&handle), vec!["c", "b", "a"]);
    let head = handle.store().get("c").unwrap();
    assert_eq!(head.title(), "gamma Coin");
    assert_eq!(head.image(), Some("https://img.test/gamma.png"));
    assert_eq!(head.links().len(), 1);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_duplicate_mint_keeps_one_record() {
    let (addr, _state) = start_test_server(|addr| {
        vec![vec![
            created(addr, "dup", "First", "missing"),
            created(addr, "other", "Other", "other"),
            created(addr, "dup", "Second", "second"),
        ]]
    })
    .await;
    let handle = start_pipeline(addr);

    wait_until("duplicate merged", || {
        handle
            .store()
            .get("dup")
            .is_some_and(|r| r.state() == EnrichmentState::Loaded)
    })
    .await;

    assert_eq!(identities(&handle), vec!["dup", "other"]);
    let record = handle.store().get("dup").unwrap();
    assert_eq!(record.display_name, "Second");
    assert_eq!(record.title(), "second Coin");

    handle.shutdown().await;
}

#[tokio::test]
async fn test_malformed_message_is_skipped() {
    let (addr, _state) = start_test_server(|addr| {
        vec![vec![
            Step::Send("{not json".to_string()),
            Step::Send("[1, 2, 3]".to_string()),
            Step::Send(json!({"name": "No Mint"}).to_string()),
            created(addr, "good", "Good", "good"),
        ]]
    })
    .await;
    let handle = start_pipeline(addr);

    wait_until("good record", || handle.store().get("good").is_some()).await;

    assert_eq!(identities(&handle), vec!["good"]);
    let stats = handle.stats();
    assert_eq!(stats.messages_received, 4);
    assert_eq!(stats.decode_failures, 3);
    assert_eq!(handle.state().status, ConnectionStatus::Connected);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_failed_lookups_stay_local() {
    let (addr, _state) = start_test_server(|addr| {
        vec![vec![
            created(addr, "n", "Null Doc", "null"),
            created(addr, "m", "Missing Doc", "missing"),
            created(addr, "g", "Garbled Doc", "garbled"),
            created(addr, "ok", "Fine", "fine"),
            Step::Send(json!({"name": "No Uri", "symbol": "NU", "mint": "nouri"}).to_string()),
        ]]
    })
    .await;
    let handle = start_pipeline(addr);

    wait_until("all settled", || {
        let snapshot = handle.snapshot();
        snapshot.len() == 5 && snapshot.iter().all(|r| r.state() != EnrichmentState::Pending)
    })
    .await;

    for mint in ["n", "m", "g", "nouri"] {
        let record = handle.store().get(mint).unwrap();
        assert_eq!(record.state(), EnrichmentState::Failed, "{}", mint);
        assert!(record.enrichment().is_none());
        assert!(record.image().is_none());
    }
    assert_eq!(
        handle.store().get("m").unwrap().failure_reason(),
        Some("HTTP status 404")
    );
    assert_eq!(handle.store().get("nouri").unwrap().title(), "No Uri");
    assert_eq!(
        handle.store().get("ok").unwrap().state(),
        EnrichmentState::Loaded
    );
    let stats = handle.stats();
    assert_eq!(stats.enrichments_failed, 4);
    assert_eq!(stats.records_without_uri, 1);
    assert_eq!(stats.lookups_outstanding(), 0);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_server_close_reconnects_once() {
    let (addr, state) = start_test_server(|addr| {
        vec![
            vec![created(addr, "before", "Before", "before"), Step::Close],
            vec![
                Step::Pause(Duration::from_millis(50)),
                created(addr, "after", "After", "after"),
            ],
        ]
    })
    .await;
    let handle = start_pipeline(addr);

    wait_until("record from second connection", || {
        handle.store().get("after").is_some()
    })
    .await;
    assert_eq!(state.connections.load(Ordering::SeqCst), 2);
    assert_eq!(identities(&handle), vec!["after", "before"]);
    assert_eq!(handle.state().status, ConnectionStatus::Connected);
    assert_eq!(handle.state().reconnect_attempts, 1);

    // The second connection stays up, so no further attempts are made
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(state.connections.load(Ordering::SeqCst), 2);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_unreachable_endpoint_keeps_retrying() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = FeedConfig::new(format!("ws://{}/connect", addr))
        .with_reconnect_delay(Duration::from_millis(50));
    let handle = FeedPipeline::websocket(config).unwrap().start();

    wait_until("repeated attempts", || handle.state().reconnect_attempts >= 3).await;
    let state = handle.state();
    assert_ne!(state.status, ConnectionStatus::Connected);
    assert!(state.last_error.is_some());
    assert!(handle.snapshot().is_empty());

    handle.shutdown().await;
}

#[tokio::test]
async fn test_silent_handshake_fails_and_retries() {
    // Accepts TCP connections and never answers the websocket upgrade
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&accepted);
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            held.push(socket);
        }
    });

    let config = FeedConfig::new(format!("ws://{}/connect", addr))
        .with_connect_timeout(Duration::from_millis(100))
        .with_reconnect_delay(Duration::from_millis(50));
    let handle = FeedPipeline::websocket(config).unwrap().start();

    wait_until("retries after handshake timeouts", || {
        handle.state().reconnect_attempts >= 2
    })
    .await;
    let state = handle.state();
    assert!(
        state
            .last_error
            .as_deref()
            .is_some_and(|e| e.contains("timed out"))
    );
    assert!(accepted.load(Ordering::SeqCst) >= 2);

    handle.shutdown().await;
}
