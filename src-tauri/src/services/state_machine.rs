//! Upload screen state machine.
//!
//! All state changes go through [`update`], which applies one [`Message`] to
//! the [`UploadState`] and returns the side effect, if any, that the runtime
//! should perform. It does no I/O of its own.

use crate::error::UploadError;
use crate::models::analysis_types::AnalysisResult;
use crate::models::upload_types::{
    AttemptId, NavigationIntent, SelectedFile, UploadProgress, ViewSnapshot, ViewState,
};
use crate::services::validator;
use tracing::{debug, info, warn};

/// Mutated only by [`update`] and [`UploadState::reset`]; everything else
/// reads it through the accessors.
#[derive(Debug, Clone, Default)]
pub struct UploadState {
    pub(crate) view: ViewState,
    pub(crate) selected_file: Option<SelectedFile>,
    pub(crate) progress: UploadProgress,
    pub(crate) error_message: Option<String>,
    pub(crate) result: Option<AnalysisResult>,
    /// Attempt currently in flight, set only while `Uploading`.
    pub(crate) in_flight: Option<AttemptId>,
    last_attempt: AttemptId,
}

impl UploadState {
    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn selected_file(&self) -> Option<&SelectedFile> {
        self.selected_file.as_ref()
    }

    pub fn progress(&self) -> UploadProgress {
        self.progress
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn in_flight(&self) -> Option<AttemptId> {
        self.in_flight
    }

    pub fn is_uploading(&self) -> bool {
        self.view == ViewState::Uploading
    }

    /// Back to the initial screen. Refused while an upload is in flight,
    /// since the transfer cannot be stopped and a second one must not start
    /// alongside it. Returns whether the state was reset.
    pub fn reset(&mut self) -> bool {
        if let Some(attempt) = self.in_flight {
            debug!(%attempt, "Reset ignored while upload is in flight");
            return false;
        }
        *self = UploadState {
            last_attempt: self.last_attempt,
            ..UploadState::default()
        };
        true
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot {
            view: self.view,
            file_name: self.selected_file.as_ref().map(|f| f.name.clone()),
            upload_progress: self.progress,
            error_message: self.error_message.clone(),
            result: self.result.clone(),
        }
    }
}

#[derive(Debug)]
pub enum Message {
    /// The picker closed; `None` when the user cancelled it.
    FileSelected(Option<SelectedFile>),

    UploadProgressed {
        attempt: AttemptId,
        bytes_sent: u64,
        bytes_total: u64,
    },

    UploadFinished {
        attempt: AttemptId,
        outcome: Result<AnalysisResult, UploadError>,
    },

    /// "Images / Videos" placeholder feature.
    UnderConstructionRequested,

    ProceedRequested,
    HomeRequested,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UpdateAction {
    StartUpload {
        attempt: AttemptId,
        file: SelectedFile,
    },
    Navigate(NavigationIntent),
}

#[derive(Debug, Default)]
pub struct UpdateResult {
    pub action: Option<UpdateAction>,
}

impl UpdateResult {
    pub fn none() -> Self {
        Self { action: None }
    }

    pub fn action(action: UpdateAction) -> Self {
        Self {
            action: Some(action),
        }
    }
}

pub fn update(state: &mut UploadState, message: Message) -> UpdateResult {
    match message {
        Message::FileSelected(None) => {
            debug!("File picker dismissed without a selection");
            UpdateResult::none()
        }
        Message::FileSelected(Some(file)) => handle_file_selected(state, file),

        Message::UploadProgressed {
            attempt,
            bytes_sent,
            bytes_total,
        } => {
            if !is_current(state, attempt) {
                debug!(%attempt, "Ignoring progress for stale upload attempt");
                return UpdateResult::none();
            }
            state.progress = UploadProgress::from_bytes(bytes_sent, bytes_total);
            UpdateResult::none()
        }

        Message::UploadFinished { attempt, outcome } => {
            if !is_current(state, attempt) {
                debug!(%attempt, "Ignoring completion for stale upload attempt");
                return UpdateResult::none();
            }
            handle_upload_finished(state, attempt, outcome)
        }

        Message::UnderConstructionRequested => {
            if state.view != ViewState::Idle {
                debug!(view = ?state.view, "Under-construction view only reachable from Idle");
                return UpdateResult::none();
            }
            state.error_message = None;
            state.view = ViewState::UnderConstruction;
            UpdateResult::none()
        }

        Message::ProceedRequested => {
            if state.view != ViewState::Uploaded {
                debug!(view = ?state.view, "Proceed ignored before a successful upload");
                return UpdateResult::none();
            }
            UpdateResult::action(UpdateAction::Navigate(NavigationIntent::Proceed))
        }

        Message::HomeRequested => UpdateResult::action(UpdateAction::Navigate(NavigationIntent::Home)),
    }
}

fn is_current(state: &UploadState, attempt: AttemptId) -> bool {
    state.is_uploading() && state.in_flight == Some(attempt)
}

fn handle_file_selected(state: &mut UploadState, file: SelectedFile) -> UpdateResult {
    match state.view {
        ViewState::Uploading => {
            // One upload per controller at a time; later selections are dropped.
            debug!(file = %file.name, "Upload already in flight, ignoring selection");
            return UpdateResult::none();
        }
        ViewState::UnderConstruction => {
            debug!(file = %file.name, "File selection not offered in this view");
            return UpdateResult::none();
        }
        ViewState::Idle | ViewState::Uploaded => {}
    }

    if let Err(e) = validator::validate(&file.name) {
        if state.view == ViewState::Uploaded {
            warn!(file = %file.name, "Rejected selection after upload: {}", e);
        } else {
            info!(file = %file.name, "Rejected selection: {}", e);
            state.error_message = Some(e.user_message().to_string());
        }
        return UpdateResult::none();
    }

    let attempt = state.last_attempt.next();
    state.last_attempt = attempt;
    state.in_flight = Some(attempt);
    state.selected_file = Some(file.clone());
    state.error_message = None;
    state.result = None;
    state.progress = UploadProgress::ZERO;
    state.view = ViewState::Uploading;

    info!(%attempt, file = %file.name, bytes = file.len(), "Starting upload");
    UpdateResult::action(UpdateAction::StartUpload { attempt, file })
}

fn handle_upload_finished(
    state: &mut UploadState,
    attempt: AttemptId,
    outcome: Result<AnalysisResult, UploadError>,
) -> UpdateResult {
    state.in_flight = None;

    match outcome {
        Ok(result) => {
            info!(%attempt, "Upload succeeded");
            state.result = Some(result);
            state.error_message = None;
            state.view = ViewState::Uploaded;
        }
        Err(e) => {
            warn!(%attempt, "Error uploading file: {}", e);
            state.error_message = Some(e.user_message().to_string());
            state.view = ViewState::Idle;
        }
    }

    UpdateResult::none()
}
