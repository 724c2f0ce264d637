use anyhow::anyhow;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use tauri::{AppHandle, Manager};
use tauri_plugin_dialog::{DialogExt, MessageDialogButtons, MessageDialogKind};
use tauri_plugin_geolocation::{GeolocationExt, Position, PositionOptions, WatchEvent};
use tracker_logic::{
    ActivityResult, LocationProvider, LocationRequest, LocationSample, Priority, RequestCode,
    SampleSender, SettingsCheck, SettingsValidator, prelude::*,
};

use crate::state::TrackerHandle;

/// How long a settings probe may wait for a fix
const PROBE_TIMEOUT_MS: u32 = 10000;

const RESOLUTION_MSG: &str =
    "Location is turned off on this device. Turn it on, then press Continue to start tracking.";

fn position_options(request: &LocationRequest) -> PositionOptions {
    PositionOptions {
        enable_high_accuracy: request.priority == Priority::HighAccuracy,
        timeout: PROBE_TIMEOUT_MS,
        maximum_age: request.min_interval_ms,
    }
}

fn to_sample(pos: Position) -> LocationSample {
    let observed_at = i64::try_from(pos.timestamp)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .unwrap_or_else(Utc::now);
    LocationSample {
        latitude: pos.coords.latitude,
        longitude: pos.coords.longitude,
        observed_at,
    }
}

/// Location updates through the geolocation plugin's position watches
pub struct TauriLocation(AppHandle);

impl TauriLocation {
    pub fn new(app: AppHandle) -> Self {
        Self(app)
    }
}

impl LocationProvider for TauriLocation {
    /// Channel ID of the position watch
    type Subscription = u32;

    async fn request_updates(&self, request: LocationRequest, sink: SampleSender) -> Result<u32> {
        self.0
            .geolocation()
            .watch_position(position_options(&request), move |event| match event {
                WatchEvent::Position(pos) => {
                    if !sink.deliver(to_sample(pos)) {
                        debug!("Tracker is gone, ignoring fix");
                    }
                }
                WatchEvent::Error(why) => {
                    warn!("Position watch error: {why}");
                }
            })
            .map_err(|why| anyhow!("Failed to watch position: {why}"))
    }

    async fn cancel_updates(&self, subscription: u32) -> Result {
        self.0
            .geolocation()
            .clear_watch(subscription)
            .map_err(|why| anyhow!("Failed to clear position watch {subscription}: {why}"))
    }
}

/// Checks device location settings by probing for a single fix, the resolution
/// flow is a dialog asking the user to turn location on.
pub struct TauriSettings(AppHandle);

impl TauriSettings {
    pub fn new(app: AppHandle) -> Self {
        Self(app)
    }
}

fn classify_probe_error(msg: &str) -> SettingsCheck {
    let msg = msg.to_ascii_lowercase();
    if msg.contains("permission") {
        // Not a settings problem, let the permission flow deal with it
        SettingsCheck::Satisfied
    } else if msg.contains("disabled") || msg.contains("turned off") || msg.contains("not enabled")
    {
        SettingsCheck::ResolutionRequired
    } else {
        SettingsCheck::ChangeUnavailable
    }
}

impl SettingsValidator for TauriSettings {
    async fn check_settings(&self, request: &LocationRequest) -> Result<SettingsCheck> {
        let res = self
            .0
            .geolocation()
            .get_current_position(Some(position_options(request)));

        Ok(match res {
            Ok(_) => SettingsCheck::Satisfied,
            Err(why) => {
                let why = why.to_string();
                debug!("Settings probe failed: {why}");
                classify_probe_error(&why)
            }
        })
    }

    async fn launch_resolution(&self, code: RequestCode) -> Result {
        let app = self.0.clone();
        self.0
            .dialog()
            .message(RESOLUTION_MSG)
            .title("Location Settings")
            .kind(MessageDialogKind::Warning)
            .buttons(MessageDialogButtons::OkCancelCustom(
                "Continue".to_string(),
                "Cancel".to_string(),
            ))
            .show(move |ok| {
                let result = if ok {
                    ActivityResult::Ok
                } else {
                    ActivityResult::Canceled
                };
                tauri::async_runtime::spawn(async move {
                    let tracker = app.state::<TrackerHandle>();
                    tracker.on_activity_result(code, result).await;
                });
            });
        Ok(())
    }
}
