use std::sync::Arc;

use log::{error, warn};
use serde::{Deserialize, Serialize};
use tauri::{AppHandle, Manager};
use tauri_plugin_dialog::{DialogExt, MessageDialogButtons, MessageDialogKind};
use tauri_specta::Event;
use tracker_logic::{LocationTracker, Prompt, TrackerUi};

use crate::{
    location::{TauriLocation, TauriSettings},
    permissions::TauriPermissions,
};

/// The state of the tracker has changed, call `get_ui_state`
#[derive(Serialize, Deserialize, Clone, Default, Debug, specta::Type, tauri_specta::Event)]
pub struct TrackerStateUpdate;

/// A short message to show the user briefly (toast)
#[derive(Serialize, Deserialize, Clone, Debug, specta::Type, tauri_specta::Event)]
pub struct TransientMessage(String);

pub struct TauriUi(AppHandle);

impl TauriUi {
    pub fn new(app: AppHandle) -> Self {
        Self(app)
    }
}

impl TrackerUi for TauriUi {
    fn send_update(&self) {
        if let Err(why) = TrackerStateUpdate.emit(&self.0) {
            error!("Error sending tracker state update to UI: {why:?}");
        }
    }

    fn show_transient(&self, msg: &str) {
        if let Err(why) = TransientMessage(msg.to_string()).emit(&self.0) {
            warn!("Error emitting transient message: {why:?}");
        }
    }

    fn show_prompt(&self, prompt: Prompt) {
        let app = self.0.clone();
        self.0
            .dialog()
            .message(prompt.message())
            .kind(MessageDialogKind::Info)
            .buttons(MessageDialogButtons::OkCancelCustom(
                prompt.action_label().to_string(),
                "Dismiss".to_string(),
            ))
            .show(move |pressed| {
                if pressed {
                    tauri::async_runtime::spawn(async move {
                        let tracker = app.state::<TrackerHandle>();
                        tracker.on_prompt_action(prompt).await;
                    });
                }
            });
    }
}

pub type Tracker = LocationTracker<TauriLocation, TauriSettings, TauriPermissions, TauriUi>;

pub type TrackerHandle = Arc<Tracker>;
