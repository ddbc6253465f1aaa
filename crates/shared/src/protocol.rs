use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Operation;

/// One item from `GET /images/processed`. Immutable once received; the
/// service owns the record set and the client only caches the latest poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedImageRecord {
    pub id: Uuid,
    pub image_name: String,
    /// Base64-encoded image bytes, exactly as the service stores them.
    pub image_data: String,
    /// Namespaced mode string such as `AES_ECB`.
    pub encryption_mode: String,
    pub operation: Operation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<NaiveDateTime>,
}

impl ProcessedImageRecord {
    /// Display label for the mode: the segment after the namespace prefix
    /// (`AES_ECB` -> `ECB`). Unrecognized shapes fall back to the raw string.
    pub fn mode_label(&self) -> &str {
        self.encryption_mode
            .split_once('_')
            .map(|(_, label)| label)
            .unwrap_or(&self.encryption_mode)
    }
}

/// Body of a successful submission response. The service answers with the
/// queued job id, but nothing beyond the status code is required of it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    #[serde(default)]
    pub id: Option<Uuid>,
}

/// Error body shape for non-2xx responses. Depending on the endpoint the
/// service reports the human-readable string under `error` or `message`;
/// both are tolerated here and `error` wins when both are present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ServiceErrorBody {
    pub const UNKNOWN: &'static str = "Unknown error";

    pub fn into_message(self) -> String {
        self.error
            .or(self.message)
            .unwrap_or_else(|| Self::UNKNOWN.to_string())
    }
}
