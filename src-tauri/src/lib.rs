#[cfg(feature = "desktop")]
mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;

#[cfg(feature = "desktop")]
pub use desktop::run;

#[cfg(feature = "desktop")]
mod desktop {
    use crate::services::controller::UploadController;
    use crate::services::uploader::HttpUploader;
    use crate::{commands, config, logging};
    use std::sync::Arc;
    use tauri::Manager;

    #[cfg_attr(mobile, tauri::mobile_entry_point)]
    pub fn run() {
        tauri::Builder::default()
            .plugin(tauri_plugin_dialog::init())
            .plugin(tauri_plugin_window_state::Builder::default().build())
            .setup(|app| {
                let log_dir = app.path().app_log_dir().ok();
                if let Err(e) = logging::init(log_dir.as_deref()) {
                    eprintln!("{}", e);
                }

                let config_dir = app.path().app_config_dir()?;
                let config = config::load_config(&config_dir);
                let uploader = HttpUploader::new(config.upload)?;
                tracing::info!(endpoint = uploader.endpoint(), "Using analysis service");

                let controller = UploadController::new(Arc::new(uploader));
                commands::upload::forward_events(app.handle().clone(), &controller);
                app.manage(controller);

                Ok(())
            })
            .invoke_handler(tauri::generate_handler![
                commands::upload::get_view_state,
                commands::upload::pick_file,
                commands::upload::submit_file,
                commands::upload::open_under_construction,
                commands::upload::proceed,
                commands::upload::go_home,
                commands::upload::reset_view,
            ])
            .run(tauri::generate_context!())
            .expect("error while running tauri application");
    }
}
