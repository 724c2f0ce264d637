mod error;
mod location;
mod permissions;
mod settings;
#[cfg(test)]
mod tests;
mod tracker;
mod ui;

pub use error::TrackingError;
pub use location::{
    LocationProvider, LocationRequest, LocationSample, Priority, SampleReceiver, SampleSender,
    sample_channel,
};
pub use permissions::{Permission, PermissionGateway, PermissionGrants, PermissionStatus};
pub use settings::{ActivityResult, RequestCode, SettingsCheck, SettingsValidator, TrackerSettings};
pub use tracker::{LocationTracker, TrackingState, UtcDT};
pub use ui::{Prompt, TrackerUi, TrackerUiState};

pub mod prelude {
    use anyhow::Error as AnyhowError;
    use std::result::Result as StdResult;
    pub type Result<T = (), E = AnyhowError> = StdResult<T, E>;
    pub use anyhow::Context;
}
