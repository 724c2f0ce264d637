use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, specta::Type)]
/// Reasons a tracking attempt didn't make it to [crate::TrackingState::Active]
pub enum TrackingError {
    /// Device settings can't satisfy the request, the attempt is over
    SettingsUnresolvable,
    /// Device settings are off but the user can turn them on from the resolution dialog
    SettingsResolvable,
    /// The user didn't grant location permissions, they need to go to system settings
    PermissionDenied,
    /// The resolution dialog couldn't be shown
    ResolutionLaunchFailed,
}

impl fmt::Display for TrackingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::SettingsUnresolvable => "Location settings can't be changed on this device",
            Self::SettingsResolvable => "Location settings need to be turned on",
            Self::PermissionDenied => "Location permissions were denied",
            Self::ResolutionLaunchFailed => "Couldn't show the location settings dialog",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for TrackingError {}
