#![allow(dead_code)]

use catalogpost::asset_host::HttpAssetUploader;
use catalogpost::catalog::HttpCatalogWriter;
use catalogpost::config::Config;
use catalogpost::draft::{DraftItem, DraftStore, Photo};
use catalogpost::env::Env;
use catalogpost::event::EventPublisherMemory;
use catalogpost::notification::NotificationController;
use catalogpost::orchestrator::Orchestrator;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{Notify, RwLock};
use warp::Filter;
use warp::http::StatusCode;
use warp::hyper::body::Bytes;

pub const API_KEY: &str = "test-key";
pub const PHOTO_BYTES: &[u8] = b"PNGDATA-mesa";

/// Shared state of the fake asset host, catalog store and build hook
pub struct MockState {
    pub uploads: AtomicUsize,
    pub upload_status: AtomicU16,
    pub omit_url: AtomicBool,
    pub hold_uploads: AtomicBool,
    pub release_uploads: Notify,
    pub records: Mutex<Vec<Value>>,
    pub write_status: AtomicU16,
    pub hooks: AtomicUsize,
    pub hook_status: AtomicU16,
    pub hold_hooks: AtomicBool,
    pub release_hooks: Notify,
}

impl Default for MockState {
    fn default() -> Self {
        MockState {
            uploads: AtomicUsize::new(0),
            upload_status: AtomicU16::new(200),
            omit_url: AtomicBool::new(false),
            hold_uploads: AtomicBool::new(false),
            release_uploads: Notify::new(),
            records: Mutex::new(vec![]),
            write_status: AtomicU16::new(200),
            hooks: AtomicUsize::new(0),
            hook_status: AtomicU16::new(200),
            hold_hooks: AtomicBool::new(false),
            release_hooks: Notify::new(),
        }
    }
}

impl MockState {
    pub fn records(&self) -> Vec<Value> {
        self.records.lock().unwrap().clone()
    }

    pub fn uploads(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn hooks(&self) -> usize {
        self.hooks.load(Ordering::SeqCst)
    }
}

pub struct MockServer {
    pub addr: SocketAddr,
    pub state: Arc<MockState>,
    handle: tokio::task::JoinHandle<()>,
}

impl MockServer {
    pub fn upload_url(&self) -> String {
        format!("http://{}/1/upload", self.addr)
    }

    pub fn db_url(&self) -> String {
        format!("http://{}/items", self.addr)
    }

    pub fn hook_url(&self) -> String {
        format!("http://{}/build_hooks/site", self.addr)
    }

    pub fn config(&self) -> Config {
        Config {
            api_key: Some(API_KEY.to_string()),
            upload_url: self.upload_url(),
            db_url: Some(self.db_url()),
            build_hook_url: Some(self.hook_url()),
            event_log: None,
        }
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn with_state(
    state: Arc<MockState>,
) -> impl Filter<Extract = (Arc<MockState>,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || state.clone())
}

fn status(code: &AtomicU16) -> StatusCode {
    StatusCode::from_u16(code.load(Ordering::SeqCst)).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

async fn handle_upload(
    params: HashMap<String, String>,
    content_type: String,
    body: Bytes,
    state: Arc<MockState>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let n = state.uploads.fetch_add(1, Ordering::SeqCst) + 1;

    if state.hold_uploads.load(Ordering::SeqCst) {
        state.release_uploads.notified().await;
    }

    if params.get("key").map(String::as_str) != Some(API_KEY) {
        return Ok(warp::reply::with_status(
            warp::reply::json(&json!({"error": "invalid key"})),
            StatusCode::BAD_REQUEST,
        ));
    }

    let is_multipart_image = content_type.starts_with("multipart/form-data")
        && contains(&body, b"name=\"image\"")
        && contains(&body, PHOTO_BYTES);
    if !is_multipart_image {
        return Ok(warp::reply::with_status(
            warp::reply::json(&json!({"error": "no image"})),
            StatusCode::BAD_REQUEST,
        ));
    }

    let response = if state.omit_url.load(Ordering::SeqCst) {
        json!({"data": {"id": n}, "success": true})
    } else {
        json!({"data": {"image": {"url": format!("https://host/photo-{}.png", n)}}, "success": true})
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&response),
        status(&state.upload_status),
    ))
}

async fn handle_write(
    record: Value,
    state: Arc<MockState>,
) -> Result<impl warp::Reply, warp::Rejection> {
    state.records.lock().unwrap().push(record);
    Ok(warp::reply::with_status(
        warp::reply::json(&json!({"name": "-generated"})),
        status(&state.write_status),
    ))
}

async fn handle_hook(state: Arc<MockState>) -> Result<impl warp::Reply, warp::Rejection> {
    state.hooks.fetch_add(1, Ordering::SeqCst);
    if state.hold_hooks.load(Ordering::SeqCst) {
        state.release_hooks.notified().await;
    }
    Ok(warp::reply::with_status(
        warp::reply::json(&json!({})),
        status(&state.hook_status),
    ))
}

pub async fn start_mock_server() -> MockServer {
    let state = Arc::new(MockState::default());

    let upload = warp::path!("1" / "upload")
        .and(warp::post())
        .and(warp::query::<HashMap<String, String>>())
        .and(warp::header::<String>("content-type"))
        .and(warp::body::bytes())
        .and(with_state(state.clone()))
        .and_then(handle_upload);

    let write = warp::path!("items")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .and_then(handle_write);

    let hook = warp::path!("build_hooks" / "site")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and_then(handle_hook);

    let (addr, server) =
        warp::serve(upload.or(write).or(hook)).bind_ephemeral(([127, 0, 0, 1], 0));
    let handle = tokio::spawn(server);

    MockServer {
        addr,
        state,
        handle,
    }
}

pub fn mesa() -> DraftItem {
    DraftItem {
        name: "Mesa".to_string(),
        notes: String::new(),
        price_thousands: "15".to_string(),
        photo: Some(Photo::new("mesa.png", PHOTO_BYTES.to_vec())),
    }
}

/// Orchestrator wired to the mock server over real HTTP
pub fn http_orchestrator(
    server: &MockServer,
    draft: DraftItem,
) -> (Arc<Orchestrator>, Arc<EventPublisherMemory>) {
    let client = reqwest::Client::new();
    let events = Arc::new(EventPublisherMemory::new());
    let env = Env::new(
        Box::new(HttpAssetUploader::new(
            client.clone(),
            server.upload_url(),
            API_KEY.to_string(),
        )),
        Box::new(HttpCatalogWriter::new(client, server.db_url())),
        Box::new(events.clone()),
    );

    let orchestrator = Orchestrator::new(
        Arc::new(env),
        Arc::new(RwLock::new(DraftStore::with_draft(draft))),
        Arc::new(NotificationController::default()),
    );
    (Arc::new(orchestrator), events)
}
