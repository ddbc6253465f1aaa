use async_trait::async_trait;
use reqwest::multipart;
use shared::{
    domain::{CipherMode, Operation},
    protocol::{ProcessedImageRecord, ServiceErrorBody, SubmissionReceipt},
};

use crate::{error::ServiceError, selection::BMP_MIME};

/// One validated submission, ready for the wire.
#[derive(Debug, Clone)]
pub struct ProcessingRequest {
    pub file_name: String,
    pub content: Vec<u8>,
    /// Already trimmed and length-checked by the workflow.
    pub key: String,
    pub mode: CipherMode,
}

/// Surface of the processing service as the client consumes it. Implemented
/// over HTTP in production and by in-process doubles in tests.
#[async_trait]
pub trait ImageProcessingApi: Send + Sync {
    async fn submit_image(
        &self,
        operation: Operation,
        request: ProcessingRequest,
    ) -> Result<SubmissionReceipt, ServiceError>;

    async fn list_processed(&self) -> Result<Vec<ProcessedImageRecord>, ServiceError>;
}

/// reqwest-backed implementation against a fixed service origin.
pub struct HttpProcessingApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpProcessingApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn transport(err: reqwest::Error) -> ServiceError {
    ServiceError::Transport(err.to_string())
}

async fn rejection(response: reqwest::Response) -> ServiceError {
    let status = response.status().as_u16();
    let message = response
        .json::<ServiceErrorBody>()
        .await
        .map(ServiceErrorBody::into_message)
        .unwrap_or_else(|_| ServiceErrorBody::UNKNOWN.to_string());
    ServiceError::Rejected { status, message }
}

#[async_trait]
impl ImageProcessingApi for HttpProcessingApi {
    async fn submit_image(
        &self,
        operation: Operation,
        request: ProcessingRequest,
    ) -> Result<SubmissionReceipt, ServiceError> {
        let file = multipart::Part::bytes(request.content)
            .file_name(request.file_name)
            .mime_str(BMP_MIME)
            .map_err(transport)?;
        let form = multipart::Form::new()
            .part("file", file)
            .text("key", request.key)
            .text("mode", request.mode.as_str());

        let response = self
            .http
            .post(format!(
                "{}/images/{}",
                self.base_url,
                operation.endpoint()
            ))
            .multipart(form)
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        // The service answers `{"id": <uuid>}`, but only the status matters;
        // an unparseable success body degrades to an empty receipt.
        Ok(response
            .json::<SubmissionReceipt>()
            .await
            .unwrap_or_default())
    }

    async fn list_processed(&self) -> Result<Vec<ProcessedImageRecord>, ServiceError> {
        let response = self
            .http
            .get(format!("{}/images/processed", self.base_url))
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        response.json().await.map_err(transport)
    }
}
