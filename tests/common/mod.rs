//! Common Test Utilities
//!
//! A `TestApp` wrapping the real router, wired to a scripted fake Discord
//! IPC server on a per-test Unix socket.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum::{body::Body, http::Request, Router};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tower::ServiceExt;

use presence_bridge::config::{
    CorsSettings, DiscordSettings, PresenceSettings, ServerSettings, Settings,
};
use presence_bridge::infrastructure::discord::wire::{encode_frame, Opcode, FRAME_HEADER_LEN};
use presence_bridge::presentation::http::routes;
use presence_bridge::startup::build_state;

/// Image key configured for every test app.
pub const TEST_IMAGE_KEY: &str = "anime_cover";

/// A scripted stand-in for the Discord client's IPC endpoint.
///
/// Answers handshakes with READY and `SET_ACTIVITY` commands with a success
/// reply, recording every command's args. `drop_next_update` makes it drop
/// the connection instead of replying once, to exercise the reconnect path.
pub struct FakeDiscord {
    pub socket_path: PathBuf,
    activities: Arc<Mutex<Vec<Value>>>,
    drop_next_update: Arc<AtomicBool>,
}

impl FakeDiscord {
    pub async fn spawn() -> Self {
        let dir = std::env::temp_dir().join(format!(
            "presence-bridge-test-{}",
            uuid::Uuid::new_v4()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let socket_path = dir.join("discord-ipc-0");

        let listener = UnixListener::bind(&socket_path).unwrap();
        let activities = Arc::new(Mutex::new(Vec::new()));
        let drop_next_update = Arc::new(AtomicBool::new(false));

        let recorded = activities.clone();
        let drop_flag = drop_next_update.clone();
        tokio::spawn(async move {
            // One live connection at a time; a new accept after a drop is
            // the bridge reconnecting.
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                serve_connection(stream, recorded.clone(), drop_flag.clone()).await;
            }
        });

        Self {
            socket_path,
            activities,
            drop_next_update,
        }
    }

    /// Recorded `SET_ACTIVITY` args, in arrival order.
    pub fn activities(&self) -> Vec<Value> {
        self.activities.lock().unwrap().clone()
    }

    /// Drop the connection instead of answering the next update.
    pub fn drop_next_update(&self) {
        self.drop_next_update.store(true, Ordering::SeqCst);
    }
}

async fn serve_connection(
    mut stream: UnixStream,
    recorded: Arc<Mutex<Vec<Value>>>,
    drop_flag: Arc<AtomicBool>,
) {
    loop {
        let mut header = [0u8; FRAME_HEADER_LEN];
        if stream.read_exact(&mut header).await.is_err() {
            return;
        }
        let opcode = u32::from_le_bytes(header[..4].try_into().unwrap());
        let len = u32::from_le_bytes(header[4..].try_into().unwrap());
        let mut body = vec![0u8; len as usize];
        if stream.read_exact(&mut body).await.is_err() {
            return;
        }
        let Ok(message) = serde_json::from_slice::<Value>(&body) else {
            return;
        };

        match opcode {
            // Handshake
            0 => {
                let reply = json!({"cmd": "DISPATCH", "evt": "READY", "data": {"v": 1}});
                if write_frame(&mut stream, Opcode::Frame, &reply).await.is_err() {
                    return;
                }
            }
            // Command frame
            1 => {
                if drop_flag.swap(false, Ordering::SeqCst) {
                    // Simulate the client restarting mid-call.
                    return;
                }
                recorded.lock().unwrap().push(message["args"].clone());
                let reply = json!({
                    "cmd": "SET_ACTIVITY",
                    "evt": null,
                    "data": null,
                    "nonce": message["nonce"],
                });
                if write_frame(&mut stream, Opcode::Frame, &reply).await.is_err() {
                    return;
                }
            }
            // Close
            2 => return,
            _ => {}
        }
    }
}

async fn write_frame(
    stream: &mut UnixStream,
    opcode: Opcode,
    body: &Value,
) -> std::io::Result<()> {
    let frame = encode_frame(opcode, body).expect("frame should encode");
    stream.write_all(&frame).await
}

/// Test application builder
pub struct TestApp {
    pub router: Router,
    pub fake: FakeDiscord,
}

impl TestApp {
    /// App with rate limiting effectively disabled.
    pub async fn new() -> Self {
        Self::with_min_interval(0).await
    }

    /// App with the given minimum update interval in seconds.
    pub async fn with_min_interval(secs: u64) -> Self {
        let fake = FakeDiscord::spawn().await;
        let settings = Settings {
            server: ServerSettings {
                host: "127.0.0.1".into(),
                port: 0,
            },
            discord: DiscordSettings {
                client_id: "123456789012345678".into(),
                ipc_path: Some(fake.socket_path.to_string_lossy().into_owned()),
                call_timeout_secs: 5,
            },
            presence: PresenceSettings {
                large_image_key: TEST_IMAGE_KEY.into(),
                min_update_interval_secs: secs,
            },
            cors: CorsSettings {
                allowed_origins: vec![],
            },
            environment: "test".into(),
        };

        let state = build_state(settings);
        let router = routes::create_router(state);

        Self { router, fake }
    }

    /// Make a GET request to the application
    pub async fn get(&self, uri: &str) -> axum::response::Response {
        self.router
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    /// Make a POST request with JSON body
    pub async fn post_json(&self, uri: &str, body: &str) -> axum::response::Response {
        self.router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("Content-Type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    /// Make a POST request with no body (the clear endpoint takes none)
    pub async fn post_empty(&self, uri: &str) -> axum::response::Response {
        self.router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }
}

/// Decode a response body as JSON.
pub async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
