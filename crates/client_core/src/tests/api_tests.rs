use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use shared::{
    domain::{CipherMode, Operation},
    protocol::ProcessedImageRecord,
};
use std::sync::Arc;
use tokio::{
    net::TcpListener,
    sync::{oneshot, Mutex},
};

use crate::{
    api::{HttpProcessingApi, ImageProcessingApi, ProcessingRequest},
    error::ServiceError,
};

#[derive(Debug, Default)]
struct CapturedSubmission {
    file_name: Option<String>,
    content_type: Option<String>,
    content: Vec<u8>,
    key: Option<String>,
    mode: Option<String>,
}

#[derive(Clone)]
struct CaptureState {
    tx: Arc<Mutex<Option<oneshot::Sender<CapturedSubmission>>>>,
}

async fn handle_capture(
    State(state): State<CaptureState>,
    mut multipart: Multipart,
) -> Json<serde_json::Value> {
    let mut captured = CapturedSubmission::default();
    while let Some(field) = multipart.next_field().await.expect("multipart field") {
        match field.name() {
            Some("file") => {
                captured.file_name = field.file_name().map(str::to_owned);
                captured.content_type = field.content_type().map(str::to_owned);
                captured.content = field.bytes().await.expect("file bytes").to_vec();
            }
            Some("key") => captured.key = Some(field.text().await.expect("key text")),
            Some("mode") => captured.mode = Some(field.text().await.expect("mode text")),
            _ => {}
        }
    }
    if let Some(tx) = state.tx.lock().await.take() {
        let _ = tx.send(captured);
    }
    Json(json!({ "id": "6f9619ff-8b86-d011-b42d-00c04fc964ff" }))
}

async fn spawn_server(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

async fn spawn_capture_server(
    path: &str,
) -> (String, oneshot::Receiver<CapturedSubmission>) {
    let (tx, rx) = oneshot::channel();
    let state = CaptureState {
        tx: Arc::new(Mutex::new(Some(tx))),
    };
    let app = Router::new()
        .route(path, post(handle_capture))
        .with_state(state);
    (spawn_server(app).await, rx)
}

fn request(mode: CipherMode) -> ProcessingRequest {
    ProcessingRequest {
        file_name: "photo.bmp".to_string(),
        content: b"BM fake bitmap bytes".to_vec(),
        key: "0123456789abcdef".to_string(),
        mode,
    }
}

#[tokio::test]
async fn submit_posts_expected_multipart_fields() {
    let (server_url, captured_rx) = spawn_capture_server("/images/encrypt").await;
    // Trailing slash must be tolerated when configuring the origin.
    let api = HttpProcessingApi::new(format!("{server_url}/"));

    let receipt = api
        .submit_image(Operation::Encrypt, request(CipherMode::Cbc))
        .await
        .expect("submission should succeed");

    let captured = captured_rx.await.expect("server saw the submission");
    assert_eq!(captured.file_name.as_deref(), Some("photo.bmp"));
    assert_eq!(captured.content_type.as_deref(), Some("image/bmp"));
    assert_eq!(captured.content, b"BM fake bitmap bytes");
    assert_eq!(captured.key.as_deref(), Some("0123456789abcdef"));
    assert_eq!(captured.mode.as_deref(), Some("CBC"));
    assert!(receipt.id.is_some());
}

#[tokio::test]
async fn decrypt_hits_the_decrypt_endpoint() {
    let (server_url, captured_rx) = spawn_capture_server("/images/decrypt").await;
    let api = HttpProcessingApi::new(server_url);

    api.submit_image(Operation::Decrypt, request(CipherMode::Ecb))
        .await
        .expect("submission should succeed");

    let captured = captured_rx.await.expect("server saw the submission");
    assert_eq!(captured.mode.as_deref(), Some("ECB"));
}

#[tokio::test]
async fn rejection_surfaces_error_body_key() {
    let app = Router::new().route(
        "/images/encrypt",
        post(|| async {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "key: Encryption key must be between 16 and 32 characters" })),
            )
        }),
    );
    let api = HttpProcessingApi::new(spawn_server(app).await);

    let err = api
        .submit_image(Operation::Encrypt, request(CipherMode::Ecb))
        .await
        .expect_err("400 must be an error");

    match err {
        ServiceError::Rejected { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(
                message,
                "key: Encryption key must be between 16 and 32 characters"
            );
        }
        other => panic!("expected Rejected, got {other:?}"),
    }
}

#[tokio::test]
async fn rejection_surfaces_message_body_key() {
    let app = Router::new().route(
        "/images/decrypt",
        post(|| async {
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "message": "mode: Mode must be either ECB or CBC" })),
            )
        }),
    );
    let api = HttpProcessingApi::new(spawn_server(app).await);

    let err = api
        .submit_image(Operation::Decrypt, request(CipherMode::Ecb))
        .await
        .expect_err("422 must be an error");

    match err {
        ServiceError::Rejected { message, .. } => {
            assert_eq!(message, "mode: Mode must be either ECB or CBC");
        }
        other => panic!("expected Rejected, got {other:?}"),
    }
}

#[tokio::test]
async fn rejection_without_known_keys_falls_back_to_unknown_error() {
    let app = Router::new().route(
        "/images/encrypt",
        post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
    );
    let api = HttpProcessingApi::new(spawn_server(app).await);

    let err = api
        .submit_image(Operation::Encrypt, request(CipherMode::Ecb))
        .await
        .expect_err("500 must be an error");

    match err {
        ServiceError::Rejected { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "Unknown error");
        }
        other => panic!("expected Rejected, got {other:?}"),
    }
}

#[tokio::test]
async fn success_with_unparseable_body_still_completes() {
    let app = Router::new().route("/images/encrypt", post(|| async { StatusCode::OK }));
    let api = HttpProcessingApi::new(spawn_server(app).await);

    let receipt = api
        .submit_image(Operation::Encrypt, request(CipherMode::Ecb))
        .await
        .expect("2xx without a body is still a success");

    assert_eq!(receipt.id, None);
}

#[tokio::test]
async fn list_processed_deserializes_the_wire_listing() {
    let app = Router::new().route(
        "/images/processed",
        get(|| async {
            Json(json!([
                {
                    "id": "6f9619ff-8b86-d011-b42d-00c04fc964ff",
                    "imageName": "cat.bmp",
                    "imageData": "Qk0=",
                    "encryptionMode": "AES_ECB",
                    "operation": "ENCRYPT",
                    "processedAt": "2025-03-14T09:26:53"
                },
                {
                    "id": "00000000-0000-0000-0000-000000000001",
                    "imageName": "dog.bmp",
                    "imageData": "",
                    "encryptionMode": "AES_CBC",
                    "operation": "DECRYPT"
                }
            ]))
        }),
    );
    let api = HttpProcessingApi::new(spawn_server(app).await);

    let records: Vec<ProcessedImageRecord> =
        api.list_processed().await.expect("listing should parse");

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].image_name, "cat.bmp");
    assert_eq!(records[0].mode_label(), "ECB");
    assert!(records[0].processed_at.is_some());
    assert_eq!(records[1].operation, Operation::Decrypt);
    assert_eq!(records[1].processed_at, None);
}

#[tokio::test]
async fn list_processed_failure_is_a_rejection() {
    let app = Router::new().route(
        "/images/processed",
        get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
    );
    let api = HttpProcessingApi::new(spawn_server(app).await);

    let err = api.list_processed().await.expect_err("503 must fail");
    assert!(matches!(err, ServiceError::Rejected { status: 503, .. }));
}
