use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use shared::protocol::ProcessedImageRecord;
use tokio::{sync::watch, task::JoinHandle, time::MissedTickBehavior};
use tracing::{debug, warn};

use crate::{
    api::ImageProcessingApi,
    error::{DecodeError, SaveError},
};

pub const POLL_INTERVAL: Duration = Duration::from_millis(1000);
pub const FEED_FAILURE_MESSAGE: &str = "Failed to load processed images";
pub const FEED_EMPTY_MESSAGE: &str = "No processed images found";

/// The three mutually exclusive presentations of the feed. An empty listing
/// is `Ready`, never `Unavailable` — the distinction is part of the
/// contract.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedView {
    /// No poll has completed yet.
    Loading,
    /// The last poll failed and there is no earlier data to fall back on.
    Unavailable { message: String },
    /// Latest successful listing, newest service truth the client has seen.
    Ready { records: Vec<ProcessedImageRecord> },
}

/// Polls `GET /images/processed` on a fixed cadence and publishes the latest
/// view through a watch channel.
///
/// Polls are issued strictly sequentially inside one task, so a response can
/// never land after a newer one; last-completed-wins is sound without a
/// generation counter. The cadence does not back off on failure; known
/// limitation, a run of failures keeps hitting the service once a second.
pub struct ProcessedFeed {
    view: watch::Receiver<FeedView>,
    poll_task: JoinHandle<()>,
}

impl ProcessedFeed {
    pub fn spawn(api: Arc<dyn ImageProcessingApi>) -> Self {
        Self::spawn_with_interval(api, POLL_INTERVAL)
    }

    pub fn spawn_with_interval(api: Arc<dyn ImageProcessingApi>, interval: Duration) -> Self {
        let (tx, view) = watch::channel(FeedView::Loading);
        let poll_task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match api.list_processed().await {
                    Ok(records) => {
                        debug!(count = records.len(), "processed feed poll succeeded");
                        let _ = tx.send(FeedView::Ready { records });
                    }
                    Err(err) => {
                        warn!("processed feed poll failed, retrying next tick: {err}");
                        let _ = tx.send_if_modified(|view| match view {
                            // Keep the last good listing on display.
                            FeedView::Ready { .. } | FeedView::Unavailable { .. } => false,
                            FeedView::Loading => {
                                *view = FeedView::Unavailable {
                                    message: FEED_FAILURE_MESSAGE.to_string(),
                                };
                                true
                            }
                        });
                    }
                }
            }
        });
        Self { view, poll_task }
    }

    /// Snapshot of the current view.
    pub fn view(&self) -> FeedView {
        self.view.borrow().clone()
    }

    /// Watch handle for observers that want change notifications.
    pub fn subscribe(&self) -> watch::Receiver<FeedView> {
        self.view.clone()
    }

    /// Stops polling; an in-flight request is dropped with the task, so a
    /// torn-down view is never updated.
    pub fn shutdown(&self) {
        self.poll_task.abort();
    }
}

impl Drop for ProcessedFeed {
    fn drop(&mut self) {
        self.poll_task.abort();
    }
}

/// Decodes a record's base64 payload back to the raw image bytes. Pure.
pub fn decode_image_data(record: &ProcessedImageRecord) -> Result<Vec<u8>, DecodeError> {
    STANDARD
        .decode(&record.image_data)
        .map_err(|source| DecodeError {
            id: record.id,
            source,
        })
}

/// Decodes the record's payload and writes it under `dir` using the record's
/// original name. Synchronous, local-only; the record itself is untouched.
pub fn save_decoded(record: &ProcessedImageRecord, dir: &Path) -> Result<PathBuf, SaveError> {
    let bytes = decode_image_data(record)?;
    let path = dir.join(&record.image_name);
    fs::write(&path, bytes).map_err(|source| SaveError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}
