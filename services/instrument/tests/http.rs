//! HTTP tests for the instrument server
//!
//! Each test binds the real router on 127.0.0.1:0 with a temporary data
//! directory and talks to it with reqwest.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use instrument::Config;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

struct TestServer {
    addr: SocketAddr,
    client: reqwest::Client,
    _shutdown: oneshot::Sender<()>,
    _data_dir: tempfile::TempDir,
}

impl TestServer {
    async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    async fn start_with(tweak: impl FnOnce(&mut Config)) -> Self {
        let data_dir = tempfile::tempdir().expect("Failed to create data dir");
        let mut config = Config::default();
        config.runner.data_dir = data_dir.path().to_path_buf();
        config.runner.drain_grace_secs = 2;
        tweak(&mut config);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("No local addr");

        let (tx, rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            let shutdown = async {
                let _ = rx.await;
            };
            instrument::server::serve_with_listener(listener, config, shutdown)
                .await
                .expect("Server failed");
        });

        Self {
            addr,
            client: reqwest::Client::new(),
            _shutdown: tx,
            _data_dir: data_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn run(&self, body: Value) -> (u16, Value) {
        let resp = self
            .client
            .post(self.url("/run"))
            .json(&body)
            .send()
            .await
            .expect("Request failed");
        let status = resp.status().as_u16();
        let body = resp.json::<Value>().await.expect("Body is not JSON");
        (status, body)
    }

    async fn health(&self) -> Value {
        self.client
            .get(self.url("/health"))
            .send()
            .await
            .expect("Request failed")
            .json()
            .await
            .expect("Body is not JSON")
    }
}

#[tokio::test]
async fn health_is_ok() {
    let server = TestServer::start().await;
    assert_eq!(server.health().await, json!({"status": "ok"}));
}

#[tokio::test]
async fn health_unchanged_after_runs() {
    let server = TestServer::start().await;
    let before = server.health().await;

    server.run(json!({"command": "echo hi", "timeout": 5})).await;
    server.run(json!({"command": "false", "timeout": 5})).await;

    assert_eq!(server.health().await, before);
}

#[tokio::test]
async fn run_echo_hello() {
    let server = TestServer::start().await;
    let (status, body) = server
        .run(json!({"command": "echo hello", "timeout": 5}))
        .await;

    assert_eq!(status, 200);
    assert!(body["stdout"].as_str().unwrap().contains("hello"));
    assert_eq!(body["stderr"], "");
    assert_eq!(body["exit_code"], 0);
    assert_eq!(body["timed_out"], false);
    assert_eq!(body["truncated"], false);
}

#[tokio::test]
async fn run_uses_default_timeout() {
    let server = TestServer::start().await;
    let (status, body) = server.run(json!({"command": "echo ok"})).await;

    assert_eq!(status, 200);
    assert_eq!(body["exit_code"], 0);
}

#[tokio::test]
async fn timeout_out_of_bounds_rejected() {
    let server = TestServer::start().await;

    for timeout in [0, -1, 3601] {
        let (status, body) = server
            .run(json!({"command": "touch spawned", "timeout": timeout}))
            .await;
        assert_eq!(status, 422, "timeout={}", timeout);
        assert!(body["error"].as_str().unwrap().contains("timeout"));
    }

    assert!(!server._data_dir.path().join("spawned").exists());
}

#[tokio::test]
async fn missing_command_rejected() {
    let server = TestServer::start().await;
    let (status, body) = server.run(json!({"timeout": 5})).await;

    assert_eq!(status, 422);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn malformed_json_rejected() {
    let server = TestServer::start().await;
    let resp = server
        .client
        .post(server.url("/run"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 400);
}

#[tokio::test]
async fn sleep_past_timeout_reports_timed_out() {
    let server = TestServer::start().await;
    let start = Instant::now();
    let (status, body) = server
        .run(json!({"command": "sleep 10", "timeout": 1}))
        .await;

    assert_eq!(status, 200);
    assert_eq!(body["timed_out"], true);
    assert_eq!(body["exit_code"], -1);
    assert!(start.elapsed() < Duration::from_secs(4), "took {:?}", start.elapsed());
}

#[tokio::test]
async fn output_over_10_mib_truncated() {
    let server = TestServer::start().await;
    let limit = 10 * 1024 * 1024;
    let marker = "\n... [truncated]";

    let (status, body) = server
        .run(json!({"command": "head -c 11000000 /dev/zero | tr '\\0' 'a'", "timeout": 30}))
        .await;

    assert_eq!(status, 200);
    assert_eq!(body["truncated"], true);
    let stdout = body["stdout"].as_str().unwrap();
    assert!(stdout.len() <= limit + marker.len());
    assert!(stdout.ends_with(marker));
}

#[tokio::test]
async fn truncated_and_timed_out_together() {
    let server = TestServer::start().await;
    let (status, body) = server
        .run(json!({
            "command": "head -c 11000000 /dev/zero | tr '\\0' 'a'; sleep 10",
            "timeout": 2
        }))
        .await;

    assert_eq!(status, 200);
    assert_eq!(body["truncated"], true);
    assert_eq!(body["timed_out"], true);
}

#[tokio::test]
async fn nonexistent_executable_still_answers() {
    let server = TestServer::start().await;
    let (status, body) = server
        .run(json!({"command": "no-such-binary-here --flag", "timeout": 5}))
        .await;

    assert_eq!(status, 200);
    assert_ne!(body["exit_code"], 0);
    assert!(!body["stderr"].as_str().unwrap().is_empty());
    assert_eq!(body["timed_out"], false);
}

#[tokio::test]
async fn spawn_failure_is_200_with_sentinel() {
    let server = TestServer::start_with(|config| {
        config.runner.data_dir = config.runner.data_dir.join("missing");
    })
    .await;

    let (status, body) = server
        .run(json!({"command": "echo hi", "timeout": 5}))
        .await;

    assert_eq!(status, 200);
    assert_eq!(body["stdout"], "");
    assert_eq!(body["exit_code"], -1);
    assert_eq!(body["timed_out"], false);
    assert_eq!(body["truncated"], false);
    assert!(!body["stderr"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn concurrent_runs_resolve_independently() {
    let server = TestServer::start().await;
    let start = Instant::now();

    let short = async {
        let result = server.run(json!({"command": "sleep 10", "timeout": 1})).await;
        (result, start.elapsed())
    };
    let long = server.run(json!({"command": "sleep 2; echo finished", "timeout": 10}));

    let (((_, short_body), short_elapsed), (_, long_body)) = tokio::join!(short, long);

    assert_eq!(short_body["timed_out"], true);
    assert!(short_elapsed < Duration::from_secs(4));
    assert_eq!(long_body["timed_out"], false);
    assert_eq!(long_body["exit_code"], 0);
    assert_eq!(long_body["stdout"], "finished\n");
}
