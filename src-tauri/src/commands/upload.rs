use crate::error::AppError;
use crate::models::upload_types::{NavigationIntent, SelectedFile, ViewSnapshot, ViewState};
use crate::services::controller::UploadController;
use crate::services::validator;
use std::path::Path;
use tauri::{AppHandle, Emitter, State};
use tauri_plugin_dialog::DialogExt;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

pub const VIEW_STATE_EVENT: &str = "view-state-changed";
pub const NAVIGATE_EVENT: &str = "navigate";

#[tauri::command]
pub fn get_view_state(controller: State<'_, UploadController>) -> ViewSnapshot {
    controller.snapshot()
}

/// Open the native picker and hand the chosen file to the controller.
#[tauri::command]
pub async fn pick_file(
    app: AppHandle,
    controller: State<'_, UploadController>,
) -> Result<(), AppError> {
    if controller.snapshot().view == ViewState::Uploading {
        debug!("Upload in flight, not opening the file picker");
        return Ok(());
    }

    let (tx, rx) = tokio::sync::oneshot::channel();
    app.dialog()
        .file()
        .add_filter("Data files", &validator::ALLOWED_EXTENSIONS)
        .pick_file(move |picked| {
            let _ = tx.send(picked);
        });

    let picked = rx.await.map_err(|_| AppError {
        message: "File dialog closed unexpectedly".to_string(),
    })?;

    let file = match picked {
        Some(picked) => {
            let path = picked.into_path().map_err(|e| AppError {
                message: format!("Unsupported file location: {}", e),
            })?;
            Some(read_selected_file(&path).await?)
        }
        None => None,
    };

    controller.select_file(file);
    Ok(())
}

/// Accept a file the webview already read (e.g. from an `<input type="file">`).
#[tauri::command]
pub async fn submit_file(
    controller: State<'_, UploadController>,
    name: String,
    contents: Vec<u8>,
) -> Result<(), AppError> {
    controller.select_file(Some(SelectedFile::new(name, contents)));
    Ok(())
}

#[tauri::command]
pub async fn open_under_construction(controller: State<'_, UploadController>) -> Result<(), AppError> {
    controller.open_under_construction();
    Ok(())
}

#[tauri::command]
pub async fn proceed(controller: State<'_, UploadController>) -> Result<(), AppError> {
    controller.proceed();
    Ok(())
}

#[tauri::command]
pub async fn go_home(controller: State<'_, UploadController>) -> Result<(), AppError> {
    controller.go_home();
    Ok(())
}

#[tauri::command]
pub async fn reset_view(controller: State<'_, UploadController>) -> Result<ViewSnapshot, AppError> {
    if !controller.reset() {
        debug!("Upload in flight, keeping the current view");
    }
    Ok(controller.snapshot())
}

async fn read_selected_file(path: &Path) -> Result<SelectedFile, AppError> {
    let name = path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();
    let contents = tokio::fs::read(path).await.map_err(|e| AppError {
        message: format!("Failed to read {}: {}", path.display(), e),
    })?;
    Ok(SelectedFile::new(name, contents))
}

/// Relay controller snapshots and navigation intents to the webview.
pub fn forward_events(app: AppHandle, controller: &UploadController) {
    let mut snapshots = controller.subscribe();
    let snapshot_app = app.clone();
    tauri::async_runtime::spawn(async move {
        while snapshots.changed().await.is_ok() {
            let snapshot = snapshots.borrow_and_update().clone();
            if let Err(e) = snapshot_app.emit(VIEW_STATE_EVENT, snapshot) {
                warn!("Failed to emit {}: {}", VIEW_STATE_EVENT, e);
            }
        }
    });

    let mut navigation = controller.subscribe_navigation();
    tauri::async_runtime::spawn(async move {
        loop {
            match navigation.recv().await {
                Ok(intent) => emit_navigation(&app, intent),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Dropped {} navigation intents", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

fn emit_navigation(app: &AppHandle, intent: NavigationIntent) {
    let payload = serde_json::json!({
        "intent": intent,
        "route": intent.route(),
    });
    if let Err(e) = app.emit(NAVIGATE_EVENT, payload) {
        warn!("Failed to emit {}: {}", NAVIGATE_EVENT, e);
    }
}
