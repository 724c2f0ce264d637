use serde::{Deserialize, Serialize};

use crate::{location::LocationRequest, prelude::*};

#[derive(Debug, Clone, Serialize, Deserialize, specta::Type)]
/// Settings for the tracker
pub struct TrackerSettings {
    /// What we ask the location provider for
    pub request: LocationRequest,
    /// Decimal places shown for each coordinate
    pub coordinate_precision: u32,
    /// strftime style format used for the last update time
    pub time_format: String,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            request: LocationRequest::default(),
            coordinate_precision: 4,
            time_format: "%X".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
/// Correlates an asynchronous platform result with the request that caused it
pub struct RequestCode(pub i32);

impl RequestCode {
    pub const CHECK_SETTINGS: Self = Self(111);
    pub const REQUEST_LOCATION_PERMISSION: Self = Self(222);
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
/// Outcome of asking the device whether its location settings can serve a [LocationRequest]
pub enum SettingsCheck {
    Satisfied,
    /// Settings are off but the user can fix them from a system dialog
    ResolutionRequired,
    /// Settings can't be changed to satisfy the request (airplane mode, no hardware, etc.)
    ChangeUnavailable,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
/// The user's answer to the resolution dialog
pub enum ActivityResult {
    Ok,
    Canceled,
}

pub trait SettingsValidator: Send + Sync {
    /// Check whether current device settings satisfy `request`
    fn check_settings(
        &self,
        request: &LocationRequest,
    ) -> impl Future<Output = Result<SettingsCheck>> + Send;

    /// Show the system dialog that lets the user turn on the needed settings. The
    /// answer is delivered later through [crate::LocationTracker::on_activity_result]
    /// with the same `code`.
    fn launch_resolution(&self, code: RequestCode) -> impl Future<Output = Result> + Send;
}
