use crate::config::UploadSettings;
use crate::error::UploadError;
use crate::models::analysis_types::AnalysisResult;
use crate::models::upload_types::SelectedFile;
use crate::services::{projection, validator};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

/// Byte counts reported while the request body is being sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    pub bytes_sent: u64,
    pub bytes_total: u64,
}

#[async_trait]
pub trait UploadTransport: Send + Sync {
    /// Send `file` to the analysis service. Progress is pushed on `progress`
    /// in the order the body is consumed; the returned future resolves after
    /// the last progress event has been sent.
    async fn upload(
        &self,
        file: SelectedFile,
        progress: UnboundedSender<ProgressEvent>,
    ) -> Result<AnalysisResult, UploadError>;
}

pub struct HttpUploader {
    client: reqwest::Client,
    settings: UploadSettings,
}

impl HttpUploader {
    pub fn new(settings: UploadSettings) -> Result<Self, UploadError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = settings.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self {
            client: builder.build()?,
            settings,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.settings.endpoint
    }
}

#[async_trait]
impl UploadTransport for HttpUploader {
    async fn upload(
        &self,
        file: SelectedFile,
        progress: UnboundedSender<ProgressEvent>,
    ) -> Result<AnalysisResult, UploadError> {
        let total = file.len();
        let _ = progress.send(ProgressEvent {
            bytes_sent: 0,
            bytes_total: total,
        });

        let body = progress_body(&file, self.settings.chunk_size, progress);
        let part = Part::stream_with_length(body, total)
            .file_name(file.name.clone())
            .mime_str(validator::content_type(&file.name))?;
        let form = Form::new().part(self.settings.field_name.clone(), part);

        let response = self
            .client
            .post(&self.settings.endpoint)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(UploadError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        projection::project_bytes(&body)
    }
}

/// Streams the file in `chunk_size` pieces, reporting the running total as
/// each piece is handed to the connection.
fn progress_body(
    file: &SelectedFile,
    chunk_size: usize,
    progress: UnboundedSender<ProgressEvent>,
) -> reqwest::Body {
    let contents = file.contents.clone();
    let total = file.len();
    let chunk_size = chunk_size.max(1);
    let mut sent: u64 = 0;

    let stream = futures::stream::iter((0..contents.len()).step_by(chunk_size)).map(move |start| {
        let end = (start + chunk_size).min(contents.len());
        let chunk = contents[start..end].to_vec();
        sent += chunk.len() as u64;
        let _ = progress.send(ProgressEvent {
            bytes_sent: sent,
            bytes_total: total,
        });
        Ok::<_, std::io::Error>(chunk)
    });

    reqwest::Body::wrap_stream(stream)
}
