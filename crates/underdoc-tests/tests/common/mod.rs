#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;

use underdoc_client::UnderDocClient;
use underdoc_core::config::ClientConfig;
use underdoc_sources::{SourceResolver, StaticBucketProvider};

pub const API_KEY: &str = "test-key";

/// Image payloads understood by the mock service.
pub const FAIL_IMAGE: &[u8] = b"FAIL";
pub const GARBAGE_IMAGE: &[u8] = b"GARBAGE";
pub const SLOW_IMAGE: &[u8] = b"SLOW";
pub const INVOICE_IMAGE: &[u8] = b"INVOICE";

#[derive(Clone, Default)]
pub struct MockState {
    pub extract_calls: Arc<AtomicUsize>,
    pub images: Arc<HashMap<String, Vec<u8>>>,
}

impl MockState {
    pub fn calls(&self) -> usize {
        self.extract_calls.load(Ordering::SeqCst)
    }
}

#[derive(Deserialize)]
struct ExtractBody {
    image_format: String,
    image_data: String,
}

/// Answers like the real service: 401 on a bad key, 500 for "FAIL" payloads,
/// a schema-violating 200 for "GARBAGE", otherwise a receipt echoing the bytes.
async fn extract(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<ExtractBody>,
) -> (StatusCode, String) {
    state.extract_calls.fetch_add(1, Ordering::SeqCst);

    let key = headers
        .get("underdoc_api_key")
        .and_then(|v| v.to_str().ok());
    if key != Some(API_KEY) {
        return (StatusCode::UNAUTHORIZED, "Invalid API key".to_string());
    }

    let image = match STANDARD.decode(body.image_data.as_bytes()) {
        Ok(image) => image,
        Err(_) => return (StatusCode::BAD_REQUEST, "image_data is not base64".to_string()),
    };

    if image.starts_with(FAIL_IMAGE) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "extraction model unavailable".to_string(),
        );
    }
    if image.starts_with(GARBAGE_IMAGE) {
        return (StatusCode::OK, json!({"unexpected": true}).to_string());
    }
    if image.starts_with(SLOW_IMAGE) {
        tokio::time::sleep(Duration::from_secs(3)).await;
    }

    let image_type = if image.starts_with(INVOICE_IMAGE) {
        "Invoice"
    } else {
        "Receipt"
    };
    let response = json!({
        "receipt_data": {
            "image_type": image_type,
            "expense": {
                "shop_name": String::from_utf8_lossy(&image),
                "shop_address": null,
                "date": "2024-11-02",
                "expense_category": "Meals",
                "currency": body.image_format.to_uppercase(),
                "total_amount": image.len() as f64,
                "items": [
                    {"name": "Coffee", "quantity": 1, "unit_price": 3.5, "subtotal": 3.5}
                ]
            }
        }
    });
    (StatusCode::OK, response.to_string())
}

/// Names starting with `slow-` are served after a 3 second delay.
async fn image(State(state): State<MockState>, Path(name): Path<String>) -> (StatusCode, Bytes) {
    if name.starts_with("slow-") {
        tokio::time::sleep(Duration::from_secs(3)).await;
    }
    match state.images.get(&name) {
        Some(bytes) => (StatusCode::OK, Bytes::from(bytes.clone())),
        None => (StatusCode::NOT_FOUND, Bytes::new()),
    }
}

pub struct MockServer {
    pub base_url: String,
    pub state: MockState,
}

pub async fn spawn_mock(images: HashMap<String, Vec<u8>>) -> MockServer {
    let state = MockState {
        extract_calls: Arc::new(AtomicUsize::new(0)),
        images: Arc::new(images),
    };

    let app = Router::new()
        .route("/expenses/extract", post(extract))
        .route("/images/{name}", get(image))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind mock server");
    let addr = listener.local_addr().expect("mock server has no address");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock server failed");
    });

    MockServer {
        base_url: format!("http://{addr}"),
        state,
    }
}

pub fn config(server: &MockServer) -> ClientConfig {
    ClientConfig::new(API_KEY).with_endpoint(&server.base_url)
}

pub fn client(server: &MockServer) -> UnderDocClient {
    client_with_buckets(server, StaticBucketProvider::new())
}

pub fn client_with_buckets(server: &MockServer, buckets: StaticBucketProvider) -> UnderDocClient {
    let resolver = SourceResolver::new()
        .expect("failed to build resolver")
        .with_bucket_provider(Arc::new(buckets));
    UnderDocClient::with_resolver(config(server), Arc::new(resolver)).expect("failed to build client")
}

pub fn write_images(dir: &std::path::Path, files: &[(&str, &[u8])]) {
    for (name, bytes) in files {
        std::fs::write(dir.join(name), bytes).expect("failed to write image");
    }
}
