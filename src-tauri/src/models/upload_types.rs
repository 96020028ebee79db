use crate::models::analysis_types::AnalysisResult;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ViewState {
    #[default]
    Idle,
    Uploading,
    Uploaded,
    UnderConstruction,
}

/// A file handed over by the picker: its name plus the raw bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub contents: Arc<[u8]>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, contents: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }

    pub fn len(&self) -> u64 {
        self.contents.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }
}

impl fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedFile")
            .field("name", &self.name)
            .field("len", &self.contents.len())
            .finish()
    }
}

/// Upload percentage in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
#[serde(transparent)]
pub struct UploadProgress(u8);

impl UploadProgress {
    pub const ZERO: UploadProgress = UploadProgress(0);
    pub const COMPLETE: UploadProgress = UploadProgress(100);

    /// `round(sent / total * 100)`. An empty body counts as fully sent.
    pub fn from_bytes(bytes_sent: u64, bytes_total: u64) -> Self {
        if bytes_total == 0 {
            return Self::COMPLETE;
        }
        let percent = (bytes_sent as f64 * 100.0 / bytes_total as f64).round();
        UploadProgress(percent.clamp(0.0, 100.0) as u8)
    }

    pub fn percent(self) -> u8 {
        self.0
    }
}

/// Identifies one upload attempt; strictly increasing per controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct AttemptId(pub u64);

impl AttemptId {
    pub fn next(self) -> Self {
        AttemptId(self.0 + 1)
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NavigationIntent {
    /// Continue to the algorithm screen.
    Proceed,
    Home,
}

impl NavigationIntent {
    pub fn route(self) -> &'static str {
        match self {
            NavigationIntent::Proceed => "/algorithm",
            NavigationIntent::Home => "/",
        }
    }
}

/// Everything the renderer reads.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ViewSnapshot {
    pub view: ViewState,
    pub file_name: Option<String>,
    pub upload_progress: UploadProgress,
    pub error_message: Option<String>,
    pub result: Option<AnalysisResult>,
}
