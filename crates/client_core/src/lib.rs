//! Client-side core for the Cryptoflow image encryption service: the file
//! selection gate, the submission workflow state machine, and the
//! processed-images polling feed. The service itself does all cryptographic
//! work; nothing here touches key material beyond passing it along.

pub mod api;
pub mod error;
pub mod feed;
pub mod selection;
pub mod workflow;

pub use api::{HttpProcessingApi, ImageProcessingApi, ProcessingRequest};
pub use error::{DecodeError, SaveError, SelectionError, ServiceError, SubmitError};
pub use feed::{
    decode_image_data, save_decoded, FeedView, ProcessedFeed, FEED_EMPTY_MESSAGE,
    FEED_FAILURE_MESSAGE, POLL_INTERVAL,
};
pub use selection::{FileCandidate, SelectedFile, BMP_MIME};
pub use workflow::{SubmissionController, WorkflowEvent, WorkflowState};

#[cfg(test)]
#[path = "tests/selection_tests.rs"]
mod selection_tests;

#[cfg(test)]
#[path = "tests/workflow_tests.rs"]
mod workflow_tests;

#[cfg(test)]
#[path = "tests/feed_tests.rs"]
mod feed_tests;

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod api_tests;
