// Shared cell server for the HTTP tests in one test binary, plus a small client
// wrapper for the requests those tests repeat.
use reqwest::{Response, StatusCode};
use serde_json::{Value, json};
use std::sync::{OnceLock, mpsc};
use std::time::Duration;

static BASE_URL: OnceLock<String> = OnceLock::new();

// The listener is bound before its address is sent back, so connections made
// after this returns queue in the backlog until the server starts accepting.
fn base_url() -> &'static str {
    BASE_URL.get_or_init(|| {
        let (addr_tx, addr_rx) = mpsc::channel();
        // Outlives every per-test runtime, so the server survives between tests.
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("server runtime");
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind ephemeral port");
                let addr = listener.local_addr().expect("listener address");
                addr_tx.send(addr).expect("report server address");
                cell_server::run(listener).await.expect("cell server stopped");
            });
        });
        let addr = addr_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("server should bind within five seconds");
        format!("http://{addr}")
    })
}

pub struct CellClient {
    http: reqwest::Client,
    base_url: &'static str,
}

impl CellClient {
    pub fn connect() -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub async fn spawn_entity(&self, yaw: f32) -> u64 {
        let res = self
            .http
            .post(self.url("/entities"))
            .json(&json!({ "direction": { "yaw": yaw } }))
            .send()
            .await
            .expect("spawn request should succeed");
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = res.json().await.expect("spawn response should be json");
        body["entity_id"].as_u64().expect("entity_id should be a number")
    }

    pub async fn start_turn(&self, entity_id: u64, body: Value) -> Response {
        self.http
            .post(self.url(&format!("/entities/{entity_id}/turns")))
            .json(&body)
            .send()
            .await
            .expect("turn request should succeed")
    }

    // Starts a turn that is expected to be accepted and returns its controller id.
    pub async fn start_turn_ok(&self, entity_id: u64, body: Value) -> u64 {
        let res = self.start_turn(entity_id, body).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = res.json().await.expect("turn response should be json");
        body["controller_id"]
            .as_u64()
            .expect("controller_id should be a number")
    }

    pub async fn cancel(&self, controller_id: u64) -> StatusCode {
        self.http
            .delete(self.url(&format!("/controllers/{controller_id}")))
            .send()
            .await
            .expect("cancel request should succeed")
            .status()
    }

    pub async fn yaw(&self, entity_id: u64) -> f64 {
        let body: Value = self
            .http
            .get(self.url(&format!("/entities/{entity_id}")))
            .send()
            .await
            .expect("entity request should succeed")
            .json()
            .await
            .expect("entity response should be json");
        body["direction"]["yaw"]
            .as_f64()
            .expect("yaw should be a number")
    }

    /// Polls the entity's yaw until `done` accepts it or about three seconds pass.
    /// Returns the last yaw seen.
    pub async fn wait_for_yaw(&self, entity_id: u64, done: impl Fn(f64) -> bool) -> f64 {
        let mut yaw = self.yaw(entity_id).await;
        for _ in 0..60 {
            if done(yaw) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
            yaw = self.yaw(entity_id).await;
        }
        yaw
    }
}
