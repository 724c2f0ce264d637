use chrono::{
    DateTime, Local,
    format::{Item, StrftimeItems},
};
use serde::{Deserialize, Serialize};

use crate::{error::TrackingError, location::LocationSample, tracker::TrackingState};

const FALLBACK_TIME_FORMAT: &str = "%X";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, specta::Type)]
/// A prompt that stays on screen until the user acts on it or dismisses it
pub enum Prompt {
    /// Explain why we need location, the action re-issues the permission request
    PermissionRationale,
    /// Permissions were denied, the action opens the app's system settings page
    OpenAppSettings,
}

impl Prompt {
    pub fn message(&self) -> &'static str {
        match self {
            Self::PermissionRationale => "Location permissions are needed for app functionality",
            Self::OpenAppSettings => "Turn on location in settings",
        }
    }

    pub fn action_label(&self) -> &'static str {
        match self {
            Self::PermissionRationale => "Ok",
            Self::OpenAppSettings => "Settings",
        }
    }
}

/// The screen the tracker drives. The UI is expected to call
/// [crate::LocationTracker::ui_state] after each [TrackerUi::send_update].
pub trait TrackerUi: Send + Sync {
    fn send_update(&self);

    /// Short lived message (toast)
    fn show_transient(&self, msg: &str);

    /// Persistent message with an action button, the UI should call
    /// [crate::LocationTracker::on_prompt_action] when the button is pressed.
    fn show_prompt(&self, prompt: Prompt);
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, specta::Type)]
/// Everything the screen needs to render itself
pub struct TrackerUiState {
    pub tracking: TrackingState,
    pub start_enabled: bool,
    pub stop_enabled: bool,
    /// Coordinates of the last fix, `None` until we get one
    pub coordinates: Option<String>,
    /// Local time the last fix was received at
    pub last_update: Option<String>,
    pub last_error: Option<TrackingError>,
}

impl TrackerUiState {
    pub(crate) fn new(tracking: TrackingState, last_error: Option<TrackingError>) -> Self {
        let active = tracking == TrackingState::Active;
        Self {
            tracking,
            start_enabled: !active,
            stop_enabled: active,
            coordinates: None,
            last_update: None,
            last_error,
        }
    }

    pub(crate) fn with_sample(
        mut self,
        sample: &LocationSample,
        received_at: &DateTime<Local>,
        precision: u32,
        time_format: &str,
    ) -> Self {
        self.coordinates = Some(format_coordinates(sample, precision));
        self.last_update = Some(format_time(received_at, time_format));
        self
    }
}

pub fn format_coordinates(sample: &LocationSample, precision: u32) -> String {
    let precision = precision as usize;
    format!(
        "{:.precision$}, {:.precision$}",
        sample.latitude, sample.longitude
    )
}

/// Format a time with a strftime string, bad formats fall back to the locale time
pub fn format_time(time: &DateTime<Local>, fmt: &str) -> String {
    let valid = !StrftimeItems::new(fmt).any(|item| matches!(item, Item::Error));
    let fmt = if valid { fmt } else { FALLBACK_TIME_FORMAT };
    time.format(fmt).to_string()
}
