mod location;
mod permissions;
mod state;

use std::sync::Arc;

use log::LevelFilter;
use tauri::{Manager, State};
use tauri_specta::{ErrorHandlingMode, collect_commands, collect_events};
use tracker_logic::{TrackerSettings, TrackerUiState};

use std::result::Result as StdResult;

use crate::{
    location::{TauriLocation, TauriSettings},
    permissions::TauriPermissions,
    state::{TauriUi, Tracker, TrackerHandle, TrackerStateUpdate, TransientMessage},
};

type Result<T = (), E = String> = StdResult<T, E>;

#[tauri::command]
#[specta::specta]
/// Get everything needed to draw the screen, call after receiving a [TrackerStateUpdate]
async fn get_ui_state(tracker: State<'_, TrackerHandle>) -> Result<TrackerUiState> {
    Ok(tracker.ui_state().await)
}

#[tauri::command]
#[specta::specta]
/// Get the settings the tracker is running with
fn get_settings(tracker: State<'_, TrackerHandle>) -> TrackerSettings {
    tracker.settings().clone()
}

#[tauri::command]
#[specta::specta]
/// Start location updates, this may show a settings dialog or permission prompt first
async fn start_updates(tracker: State<'_, TrackerHandle>) -> Result {
    tracker.start().await;
    Ok(())
}

#[tauri::command]
#[specta::specta]
/// Stop location updates
async fn stop_updates(tracker: State<'_, TrackerHandle>) -> Result {
    tracker.stop().await;
    Ok(())
}

#[tauri::command]
#[specta::specta]
/// The screen was hidden, call when the page's visibility changes to hidden
async fn on_pause(tracker: State<'_, TrackerHandle>) -> Result {
    tracker.on_pause().await;
    Ok(())
}

#[tauri::command]
#[specta::specta]
/// The screen is showing again, call on load and when the page's visibility changes to visible
async fn on_resume(tracker: State<'_, TrackerHandle>) -> Result {
    tracker.on_resume().await;
    Ok(())
}

pub fn mk_specta() -> tauri_specta::Builder {
    tauri_specta::Builder::<tauri::Wry>::new()
        .error_handling(ErrorHandlingMode::Throw)
        .commands(collect_commands![
            get_ui_state,
            get_settings,
            start_updates,
            stop_updates,
            on_pause,
            on_resume,
        ])
        .events(collect_events![TrackerStateUpdate, TransientMessage])
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    let builder = mk_specta();

    tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .plugin(
            tauri_plugin_log::Builder::new()
                .level(LevelFilter::Debug)
                .build(),
        )
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_geolocation::init())
        .invoke_handler(builder.invoke_handler())
        .setup(move |app| {
            builder.mount_events(app);

            let handle = app.handle().clone();
            let tracker = Arc::new(Tracker::new(
                TrackerSettings::default(),
                TauriLocation::new(handle.clone()),
                TauriSettings::new(handle.clone()),
                TauriPermissions::new(handle.clone()),
                TauriUi::new(handle),
            ));
            app.manage::<TrackerHandle>(tracker.clone());

            tauri::async_runtime::spawn(async move {
                tracker.main_loop().await;
            });
            Ok(())
        })
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
