use std::sync::Arc;

use shared::{
    domain::{CipherMode, Operation},
    protocol::SubmissionReceipt,
};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::{
    api::{ImageProcessingApi, ProcessingRequest},
    error::{SelectionError, SubmitError},
    selection::{screen_candidates, FileCandidate, SelectedFile},
};

pub const KEY_MIN_CHARS: usize = 16;
pub const KEY_MAX_CHARS: usize = 32;

/// Lifecycle of one workflow cycle. Exactly one state is active at a time;
/// `Processing` doubles as the mutual-exclusion guard against re-entrant
/// submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkflowState {
    #[default]
    Unsubmitted,
    Processing,
    Completed,
}

/// Notifications for observers (a UI layer) tracking the machine without
/// polling it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowEvent {
    StateChanged(WorkflowState),
    SelectionReplaced { name: String },
    ErrorReported(String),
    ErrorCleared,
}

/// Owns the mutable submission tuple (file, key, mode, state, error) and all
/// transitions over it. Resets triggered by other state changes (new file
/// wipes the key, input edits wipe the error) happen inline here as
/// deterministic side effects, never as independently scheduled watchers.
pub struct SubmissionController {
    api: Arc<dyn ImageProcessingApi>,
    selected: Option<SelectedFile>,
    key: String,
    mode: CipherMode,
    state: WorkflowState,
    error: Option<String>,
    events: broadcast::Sender<WorkflowEvent>,
}

impl SubmissionController {
    pub fn new(api: Arc<dyn ImageProcessingApi>) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            api,
            selected: None,
            key: String::new(),
            mode: CipherMode::default(),
            state: WorkflowState::default(),
            error: None,
            events,
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn selected_file(&self) -> Option<&SelectedFile> {
        self.selected.as_ref()
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn mode(&self) -> CipherMode {
        self.mode
    }

    pub fn last_error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.events.subscribe()
    }

    /// Runs an offered set of files through the selection gate.
    ///
    /// Acceptance replaces the current selection, invalidates the previous
    /// key, clears any error, and rearms the workflow. Rejection retains no
    /// selection at all and surfaces the aggregate reason. Refused outright
    /// while a submission is in flight.
    pub fn select_files(
        &mut self,
        candidates: Vec<FileCandidate>,
    ) -> Result<(), SelectionError> {
        if self.state == WorkflowState::Processing {
            return Err(SelectionError::new(
                "cannot change the file while a submission is in progress",
            ));
        }

        match screen_candidates(candidates) {
            Ok(file) => {
                info!(name = %file.name, size = file.content.len(), "selection accepted");
                let name = file.name.clone();
                self.selected = Some(file);
                // A new file always invalidates the previous key.
                self.key.clear();
                self.clear_error();
                self.set_state(WorkflowState::Unsubmitted);
                let _ = self.events.send(WorkflowEvent::SelectionReplaced { name });
                Ok(())
            }
            Err(err) => {
                warn!("selection rejected: {err}");
                self.selected = None;
                self.key.clear();
                self.set_state(WorkflowState::Unsubmitted);
                self.report_error(err.message.clone());
                Err(err)
            }
        }
    }

    /// Stores the key as typed. Trimming and length checks happen at submit
    /// time; editing the key wipes any surfaced error.
    pub fn set_key(&mut self, key: impl Into<String>) {
        self.key = key.into();
        self.clear_error();
    }

    pub fn set_mode(&mut self, mode: CipherMode) {
        self.mode = mode;
    }

    /// Explicit return to the initial state: clears file, key, and error and
    /// restores the default mode. Refused while a submission is in flight —
    /// an in-flight request always resolves and settles the state first.
    pub fn reset(&mut self) -> Result<(), SubmitError> {
        if self.state == WorkflowState::Processing {
            return Err(SubmitError::AlreadyProcessing);
        }
        self.selected = None;
        self.key.clear();
        self.mode = CipherMode::default();
        self.clear_error();
        self.set_state(WorkflowState::Unsubmitted);
        Ok(())
    }

    /// Validates preconditions, dispatches to the service, and interprets
    /// the result. Any failure reverts to `Unsubmitted` with the reason
    /// surfaced, leaving file and key in place for a retry.
    pub async fn submit(
        &mut self,
        operation: Operation,
    ) -> Result<SubmissionReceipt, SubmitError> {
        match self.state {
            WorkflowState::Processing => return Err(SubmitError::AlreadyProcessing),
            WorkflowState::Completed => return Err(SubmitError::AlreadyCompleted),
            WorkflowState::Unsubmitted => {}
        }
        self.set_state(WorkflowState::Processing);

        let request = match self.build_request() {
            Ok(request) => request,
            Err(err) => return Err(self.fail(err)),
        };

        info!(
            operation = operation.as_str(),
            file = %request.file_name,
            mode = request.mode.as_str(),
            "submitting image"
        );

        match self.api.submit_image(operation, request).await {
            Ok(receipt) => {
                self.clear_error();
                self.set_state(WorkflowState::Completed);
                Ok(receipt)
            }
            Err(err) => Err(self.fail(SubmitError::Service(err))),
        }
    }

    /// Preconditions in order, short-circuiting on the first violation. A
    /// request is only constructible from here, which keeps `Processing`
    /// impossible without a file.
    fn build_request(&self) -> Result<ProcessingRequest, SubmitError> {
        let Some(file) = &self.selected else {
            return Err(SubmitError::NoFileSelected);
        };

        let key = self.key.trim();
        if key.is_empty() {
            return Err(SubmitError::BlankKey);
        }
        let key_chars = key.chars().count();
        if !(KEY_MIN_CHARS..=KEY_MAX_CHARS).contains(&key_chars) {
            return Err(SubmitError::KeyLengthOutOfRange);
        }

        Ok(ProcessingRequest {
            file_name: file.name.clone(),
            content: file.content.clone(),
            key: key.to_string(),
            mode: self.mode,
        })
    }

    fn fail(&mut self, err: SubmitError) -> SubmitError {
        warn!("submission failed: {err}");
        self.report_error(err.to_string());
        self.set_state(WorkflowState::Unsubmitted);
        err
    }

    fn set_state(&mut self, state: WorkflowState) {
        if self.state != state {
            self.state = state;
            let _ = self.events.send(WorkflowEvent::StateChanged(state));
        }
    }

    fn report_error(&mut self, message: String) {
        let _ = self
            .events
            .send(WorkflowEvent::ErrorReported(message.clone()));
        self.error = Some(message);
    }

    fn clear_error(&mut self) {
        if self.error.take().is_some() {
            let _ = self.events.send(WorkflowEvent::ErrorCleared);
        }
    }
}
