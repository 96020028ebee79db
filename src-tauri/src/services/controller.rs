use crate::models::upload_types::{AttemptId, NavigationIntent, SelectedFile, ViewSnapshot};
use crate::services::state_machine::{update, Message, UpdateAction, UploadState};
use crate::services::uploader::{ProgressEvent, UploadTransport};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, info};

/// Owns the upload screen state and runs its side effects.
///
/// Renderers subscribe to [`ViewSnapshot`]s and navigation intents; they never
/// write to the state directly.
#[derive(Clone)]
pub struct UploadController {
    inner: Arc<Inner>,
}

struct Inner {
    state: Mutex<UploadState>,
    transport: Arc<dyn UploadTransport>,
    snapshots: watch::Sender<ViewSnapshot>,
    navigation: broadcast::Sender<NavigationIntent>,
}

impl UploadController {
    pub fn new(transport: Arc<dyn UploadTransport>) -> Self {
        let state = UploadState::default();
        let (snapshots, _) = watch::channel(state.snapshot());
        let (navigation, _) = broadcast::channel(16);
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(state),
                transport,
                snapshots,
                navigation,
            }),
        }
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        self.inner.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewSnapshot> {
        self.inner.snapshots.subscribe()
    }

    pub fn subscribe_navigation(&self) -> broadcast::Receiver<NavigationIntent> {
        self.inner.navigation.subscribe()
    }

    /// Must be called from within a tokio runtime; an accepted file starts
    /// the upload on a spawned task.
    pub fn select_file(&self, file: Option<SelectedFile>) {
        self.dispatch(Message::FileSelected(file));
    }

    pub fn open_under_construction(&self) {
        self.dispatch(Message::UnderConstructionRequested);
    }

    pub fn proceed(&self) {
        self.dispatch(Message::ProceedRequested);
    }

    pub fn go_home(&self) {
        self.dispatch(Message::HomeRequested);
    }

    /// Start over as if the screen had just been mounted. Does nothing while
    /// an upload is in flight; returns whether the state was reset.
    pub fn reset(&self) -> bool {
        let mut state = self.lock_state();
        let reset = state.reset();
        self.publish(&state);
        reset
    }

    pub fn dispatch(&self, message: Message) {
        let result = {
            let mut state = self.lock_state();
            let result = update(&mut state, message);
            self.publish(&state);
            result
        };

        if let Some(action) = result.action {
            self.perform(action);
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, UploadState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self, state: &UploadState) {
        let next = state.snapshot();
        self.inner.snapshots.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }

    fn perform(&self, action: UpdateAction) {
        match action {
            UpdateAction::StartUpload { attempt, file } => {
                let controller = self.clone();
                tokio::spawn(async move {
                    controller.run_upload(attempt, file).await;
                });
            }
            UpdateAction::Navigate(intent) => {
                info!(route = intent.route(), "Navigation requested");
                if self.inner.navigation.send(intent).is_err() {
                    debug!("No navigation listener attached");
                }
            }
        }
    }

    /// Applies the transport's progress events in order, then the outcome.
    async fn run_upload(&self, attempt: AttemptId, file: SelectedFile) {
        let (progress_tx, mut progress_rx) = mpsc::unbounded_channel::<ProgressEvent>();
        let transport = self.inner.transport.clone();
        let upload = transport.upload(file, progress_tx);
        tokio::pin!(upload);

        let outcome = loop {
            tokio::select! {
                biased;
                Some(event) = progress_rx.recv() => self.apply_progress(attempt, event),
                outcome = &mut upload => break outcome,
            }
        };

        while let Ok(event) = progress_rx.try_recv() {
            self.apply_progress(attempt, event);
        }

        self.dispatch(Message::UploadFinished { attempt, outcome });
    }

    fn apply_progress(&self, attempt: AttemptId, event: ProgressEvent) {
        self.dispatch(Message::UploadProgressed {
            attempt,
            bytes_sent: event.bytes_sent,
            bytes_total: event.bytes_total,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{UploadError, INVALID_FILE_TYPE_MESSAGE, UPLOAD_FAILED_MESSAGE};
    use crate::models::analysis_types::AnalysisResult;
    use crate::models::upload_types::{UploadProgress, ViewState};
    use crate::services::projection;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    /// Reports progress in quarters, optionally waits for a release, then
    /// answers with a canned response.
    struct ScriptedTransport {
        response: Result<Value, u16>,
        gate: Option<Arc<Notify>>,
        calls: AtomicUsize,
        active: AtomicUsize,
        max_active: AtomicUsize,
    }

    impl ScriptedTransport {
        fn ok(body: Value) -> Arc<Self> {
            Arc::new(Self {
                response: Ok(body),
                gate: None,
                calls: AtomicUsize::new(0),
                active: AtomicUsize::new(0),
                max_active: AtomicUsize::new(0),
            })
        }

        fn status(code: u16) -> Arc<Self> {
            Arc::new(Self {
                response: Err(code),
                gate: None,
                calls: AtomicUsize::new(0),
                active: AtomicUsize::new(0),
                max_active: AtomicUsize::new(0),
            })
        }

        fn gated(body: Value, gate: Arc<Notify>) -> Arc<Self> {
            Arc::new(Self {
                response: Ok(body),
                gate: Some(gate),
                calls: AtomicUsize::new(0),
                active: AtomicUsize::new(0),
                max_active: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn max_concurrent(&self) -> usize {
            self.max_active.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl UploadTransport for ScriptedTransport {
        async fn upload(
            &self,
            file: SelectedFile,
            progress: mpsc::UnboundedSender<ProgressEvent>,
        ) -> Result<AnalysisResult, UploadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(active, Ordering::SeqCst);
            let total = file.len();
            for quarter in 0..=4 {
                let _ = progress.send(ProgressEvent {
                    bytes_sent: total * quarter / 4,
                    bytes_total: total,
                });
            }
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.active.fetch_sub(1, Ordering::SeqCst);
            match &self.response {
                Ok(body) => projection::project(body.clone()),
                Err(code) => Err(UploadError::Status(*code)),
            }
        }
    }

    fn data_csv() -> SelectedFile {
        SelectedFile::new("data.csv", b"id,city\n1,Oslo\n2,Lima\n".to_vec())
    }

    async fn wait_for_view(controller: &UploadController, view: ViewState) -> ViewSnapshot {
        let mut rx = controller.subscribe();
        let snapshot = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| s.view == view))
            .await
            .expect("timed out waiting for view")
            .expect("controller dropped");
        snapshot.clone()
    }

    #[tokio::test]
    async fn valid_file_uploads_and_publishes_result() {
        let transport = ScriptedTransport::ok(json!({ "summary": { "rows": 10 } }));
        let controller = UploadController::new(transport.clone());

        controller.select_file(Some(data_csv()));
        assert_eq!(controller.snapshot().view, ViewState::Uploading);
        assert_eq!(controller.snapshot().upload_progress, UploadProgress::ZERO);

        let snapshot = wait_for_view(&controller, ViewState::Uploaded).await;

        assert_eq!(snapshot.upload_progress, UploadProgress::COMPLETE);
        assert_eq!(snapshot.file_name.as_deref(), Some("data.csv"));
        assert!(snapshot.error_message.is_none());
        let result = snapshot.result.unwrap();
        assert_eq!(result.summary.unwrap().as_mapping().unwrap()["rows"], json!(10));
        assert!(result.descriptive_stats.is_none());
        assert!(result.numerical_plot.is_none());
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn server_error_returns_to_idle() {
        let controller = UploadController::new(ScriptedTransport::status(500));

        controller.select_file(Some(data_csv()));
        let snapshot = wait_for_view(&controller, ViewState::Idle).await;

        assert_eq!(snapshot.error_message.as_deref(), Some(UPLOAD_FAILED_MESSAGE));
        assert!(snapshot.result.is_none());
    }

    #[tokio::test]
    async fn rejected_file_never_reaches_the_transport() {
        let transport = ScriptedTransport::ok(json!({}));
        let controller = UploadController::new(transport.clone());

        controller.select_file(Some(SelectedFile::new("notes.txt", b"hello".to_vec())));
        controller.select_file(None);

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.view, ViewState::Idle);
        assert_eq!(snapshot.error_message.as_deref(), Some(INVALID_FILE_TYPE_MESSAGE));
        tokio::task::yield_now().await;
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn second_selection_during_upload_is_ignored() {
        let gate = Arc::new(Notify::new());
        let transport = ScriptedTransport::gated(json!({ "summary": {} }), gate.clone());
        let controller = UploadController::new(transport.clone());

        controller.select_file(Some(data_csv()));
        tokio::task::yield_now().await;
        controller.select_file(Some(SelectedFile::new("other.json", b"{}".to_vec())));

        gate.notify_one();
        let snapshot = wait_for_view(&controller, ViewState::Uploaded).await;

        assert_eq!(snapshot.file_name.as_deref(), Some("data.csv"));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn repeat_upload_yields_the_same_result_shape() {
        let body = json!({
            "summary": { "rows": 3 },
            "categorical_distributions": { "city": "Y2l0eQ==" }
        });
        let transport = ScriptedTransport::ok(body);
        let controller = UploadController::new(transport.clone());

        controller.select_file(Some(data_csv()));
        let first = wait_for_view(&controller, ViewState::Uploaded).await;

        controller.select_file(Some(data_csv()));
        assert!(controller.snapshot().result.is_none());
        let second = wait_for_view(&controller, ViewState::Uploaded).await;

        assert_eq!(first.result, second.result);
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn navigation_is_broadcast() {
        let controller = UploadController::new(ScriptedTransport::ok(json!({})));
        let mut nav = controller.subscribe_navigation();

        controller.proceed();
        controller.go_home();

        assert_eq!(nav.recv().await.unwrap(), NavigationIntent::Home);
        assert!(nav.try_recv().is_err());
    }

    #[tokio::test]
    async fn reset_discards_the_previous_result() {
        let controller = UploadController::new(ScriptedTransport::ok(json!({ "summary": {} })));
        controller.select_file(Some(data_csv()));
        wait_for_view(&controller, ViewState::Uploaded).await;

        assert!(controller.reset());

        assert_eq!(controller.snapshot(), ViewSnapshot::default());
    }

    #[tokio::test]
    async fn reset_during_upload_never_overlaps_transfers() {
        let gate = Arc::new(Notify::new());
        let transport = ScriptedTransport::gated(json!({ "summary": {} }), gate.clone());
        let controller = UploadController::new(transport.clone());

        controller.select_file(Some(SelectedFile::new("a.csv", b"x,y\n1,2\n".to_vec())));
        tokio::task::yield_now().await;

        assert!(!controller.reset());
        assert_eq!(controller.snapshot().view, ViewState::Uploading);

        controller.select_file(Some(SelectedFile::new("b.csv", b"x,y\n3,4\n".to_vec())));
        tokio::task::yield_now().await;

        gate.notify_one();
        let snapshot = wait_for_view(&controller, ViewState::Uploaded).await;

        assert_eq!(snapshot.file_name.as_deref(), Some("a.csv"));
        assert_eq!(transport.calls(), 1);
        assert_eq!(transport.max_concurrent(), 1);
        assert!(controller.reset());
    }

    #[tokio::test]
    async fn under_construction_view_is_published() {
        let controller = UploadController::new(ScriptedTransport::ok(json!({})));
        let rx = controller.subscribe();

        controller.open_under_construction();

        assert_eq!(rx.borrow().view, ViewState::UnderConstruction);
    }
}
