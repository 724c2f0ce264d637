use chrono::{DateTime, Local, Utc};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::{
    error::TrackingError,
    location::{LocationProvider, LocationSample, SampleReceiver, SampleSender, sample_channel},
    permissions::{Permission, PermissionGateway, PermissionGrants},
    settings::{ActivityResult, RequestCode, SettingsCheck, SettingsValidator, TrackerSettings},
    ui::{Prompt, TrackerUi, TrackerUiState},
};

/// Convenience alias for UTC DT
pub type UtcDT = DateTime<Utc>;

const SETTINGS_UNAVAILABLE_MSG: &str = "Adjust location settings on your device";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, specta::Type)]
pub enum TrackingState {
    #[default]
    Idle,
    Active,
}

struct TrackerState<S> {
    tracking: TrackingState,
    /// The user wants updates, survives pauses and permission round trips
    desired: bool,
    subscription: Option<S>,
    /// Last fix and the local time we got it at
    sample: Option<(LocationSample, DateTime<Local>)>,
    last_error: Option<TrackingError>,
}

impl<S> TrackerState<S> {
    /// A start attempt is still wanted, a stop or pause since it began flips this
    fn attempt_live(&self) -> bool {
        self.desired && self.tracking == TrackingState::Active
    }
}

impl<S> Default for TrackerState<S> {
    fn default() -> Self {
        Self {
            tracking: TrackingState::Idle,
            desired: false,
            subscription: None,
            sample: None,
            last_error: None,
        }
    }
}

/// Drives location updates for the screen. Gates registering with the
/// [LocationProvider] on device settings ([SettingsValidator]) and permissions
/// ([PermissionGateway]), and mirrors fixes to the [TrackerUi].
///
/// Platform results (resolution dialog, permission prompts, prompt buttons) are fed
/// back in through the `on_*` methods, fixes arrive through [LocationTracker::main_loop].
pub struct LocationTracker<P: LocationProvider, V: SettingsValidator, G: PermissionGateway, U: TrackerUi>
{
    state: Mutex<TrackerState<P::Subscription>>,
    provider: P,
    settings_validator: V,
    permissions: G,
    ui: U,
    settings: TrackerSettings,
    sample_tx: SampleSender,
    sample_rx: Mutex<SampleReceiver>,
    cancel: CancellationToken,
}

impl<P: LocationProvider, V: SettingsValidator, G: PermissionGateway, U: TrackerUi>
    LocationTracker<P, V, G, U>
{
    pub fn new(
        settings: TrackerSettings,
        provider: P,
        settings_validator: V,
        permissions: G,
        ui: U,
    ) -> Self {
        let (sample_tx, sample_rx) = sample_channel();
        Self {
            state: Mutex::new(TrackerState::default()),
            provider,
            settings_validator,
            permissions,
            ui,
            settings,
            sample_tx,
            sample_rx: Mutex::new(sample_rx),
            cancel: CancellationToken::new(),
        }
    }

    pub fn settings(&self) -> &TrackerSettings {
        &self.settings
    }

    pub async fn ui_state(&self) -> TrackerUiState {
        let state = self.state.lock().await;
        let ui = TrackerUiState::new(state.tracking, state.last_error);
        match &state.sample {
            Some((sample, received_at)) => ui.with_sample(
                sample,
                received_at,
                self.settings.coordinate_precision,
                &self.settings.time_format,
            ),
            None => ui,
        }
    }

    async fn current_grants(&self) -> PermissionGrants {
        match self.permissions.check_permissions().await {
            Ok(grants) => grants,
            Err(why) => {
                warn!("Failed to check location permissions: {why:?}");
                PermissionGrants::default()
            }
        }
    }

    /// Start location updates. Flips the controls to active right away, then checks
    /// device settings and permissions before registering with the provider.
    pub async fn start(&self) {
        let mut state = self.state.lock().await;
        state.desired = true;
        state.tracking = TrackingState::Active;
        drop(state);
        self.ui.send_update();

        let check = self
            .settings_validator
            .check_settings(&self.settings.request)
            .await;

        if !self.state.lock().await.attempt_live() {
            debug!("Start was withdrawn while checking settings, dropping result {check:?}");
            return;
        }

        match check {
            Ok(SettingsCheck::Satisfied) => self.settings_satisfied().await,
            Ok(SettingsCheck::ResolutionRequired) => self.resolve_settings().await,
            Ok(SettingsCheck::ChangeUnavailable) => self.settings_unavailable().await,
            Err(why) => {
                error!("Failed to check location settings: {why:?}");
                self.settings_unavailable().await;
            }
        }
    }

    async fn settings_satisfied(&self) {
        let grants = self.current_grants().await;

        if !grants.all_granted() {
            info!("Location permissions missing, asking before starting updates");
            let mut state = self.state.lock().await;
            state.tracking = TrackingState::Idle;
            drop(state);
            self.ui.send_update();
            self.request_permissions_for(grants).await;
            return;
        }

        let mut state = self.state.lock().await;

        if !state.attempt_live() {
            // Stopped or paused while we were waiting on the platform
            debug!("Updates no longer wanted, not registering");
            return;
        }

        if state.subscription.is_none() {
            match self
                .provider
                .request_updates(self.settings.request, self.sample_tx.clone())
                .await
            {
                Ok(subscription) => {
                    info!("Location updates started");
                    state.subscription = Some(subscription);
                }
                Err(why) => {
                    error!("Failed to request location updates: {why:?}");
                    state.desired = false;
                    state.tracking = TrackingState::Idle;
                    drop(state);
                    self.ui.send_update();
                    return;
                }
            }
        } else {
            debug!("Already receiving location updates");
        }

        state.tracking = TrackingState::Active;
        state.last_error = None;
        drop(state);
        self.ui.send_update();
    }

    async fn resolve_settings(&self) {
        self.state.lock().await.last_error = Some(TrackingError::SettingsResolvable);

        if let Err(why) = self
            .settings_validator
            .launch_resolution(RequestCode::CHECK_SETTINGS)
            .await
        {
            error!("Failed to launch location settings resolution: {why:?}");
            self.revert_to_idle(Some(TrackingError::ResolutionLaunchFailed))
                .await;
        }
    }

    async fn settings_unavailable(&self) {
        warn!("Location settings can't satisfy the request");
        self.ui.show_transient(SETTINGS_UNAVAILABLE_MSG);
        self.revert_to_idle(Some(TrackingError::SettingsUnresolvable))
            .await;
    }

    /// Give up on the current attempt, drops any subscription we still hold
    async fn revert_to_idle(&self, error: Option<TrackingError>) {
        let mut state = self.state.lock().await;
        state.desired = false;
        state.tracking = TrackingState::Idle;
        if error.is_some() {
            state.last_error = error;
        }

        if let Some(subscription) = state.subscription.take() {
            if let Err(why) = self.provider.cancel_updates(subscription).await {
                warn!("Failed to cancel location updates: {why:?}");
            }
        }

        drop(state);
        self.ui.send_update();
    }

    /// Stop location updates, this is a no-op if we aren't tracking.
    pub async fn stop(&self) {
        self.state.lock().await.desired = false;
        self.release_updates().await;
    }

    async fn release_updates(&self) {
        let mut state = self.state.lock().await;

        if state.tracking != TrackingState::Active && state.subscription.is_none() {
            debug!("Not tracking, nothing to stop");
            return;
        }

        if let Some(subscription) = state.subscription.take() {
            if let Err(why) = self.provider.cancel_updates(subscription).await {
                warn!("Failed to cancel location updates: {why:?}");
            }
        }

        state.tracking = TrackingState::Idle;
        drop(state);
        info!("Location updates stopped");
        self.ui.send_update();
    }

    /// A new fix came in from the provider, replaces the old one
    pub async fn on_location_sample(&self, sample: LocationSample) {
        let mut state = self.state.lock().await;
        state.sample = Some((sample, Local::now()));
        drop(state);
        self.ui.send_update();
    }

    /// The resolution dialog was answered
    pub async fn on_activity_result(&self, code: RequestCode, result: ActivityResult) {
        if code != RequestCode::CHECK_SETTINGS {
            debug!("Ignoring activity result for request {code:?}");
            return;
        }

        match result {
            ActivityResult::Ok => {
                info!("User agreed to change location settings");
                self.start().await;
            }
            ActivityResult::Canceled => {
                info!("User did not agree to change location settings");
                self.revert_to_idle(None).await;
            }
        }
    }

    /// Ask for both location permissions, explaining why first if the user denied before
    pub async fn request_location_permissions(&self) {
        let grants = self.current_grants().await;
        self.request_permissions_for(grants).await;
    }

    async fn request_permissions_for(&self, grants: PermissionGrants) {
        if grants.should_show_rationale() {
            self.ui.show_prompt(Prompt::PermissionRationale);
        } else {
            self.issue_permission_request().await;
        }
    }

    async fn issue_permission_request(&self) {
        if let Err(why) = self
            .permissions
            .request_permissions(RequestCode::REQUEST_LOCATION_PERMISSION, &Permission::LOCATION)
            .await
        {
            error!("Failed to request location permissions: {why:?}");
        }
    }

    /// The permission request was answered, `None` means the request was cancelled
    /// before the user answered.
    pub async fn on_permissions_result(&self, code: RequestCode, grants: Option<PermissionGrants>) {
        if code != RequestCode::REQUEST_LOCATION_PERMISSION {
            debug!("Ignoring permission result for request {code:?}");
            return;
        }

        let Some(grants) = grants else {
            debug!("Permission request was cancelled");
            return;
        };

        if grants.all_granted() {
            let desired = self.state.lock().await.desired;
            if desired {
                self.start().await;
            }
        } else {
            info!("Location permissions denied");
            self.state.lock().await.last_error = Some(TrackingError::PermissionDenied);
            self.ui.send_update();
            self.ui.show_prompt(Prompt::OpenAppSettings);
        }
    }

    /// The action button on a [Prompt] was pressed
    pub async fn on_prompt_action(&self, prompt: Prompt) {
        match prompt {
            Prompt::PermissionRationale => self.issue_permission_request().await,
            Prompt::OpenAppSettings => {
                if let Err(why) = self.permissions.open_app_settings().await {
                    error!("Failed to open app settings: {why:?}");
                }
            }
        }
    }

    /// The screen went to the background, stop updates but remember if the user wanted them
    pub async fn on_pause(&self) {
        self.release_updates().await;
    }

    /// The screen came back, restart updates if they were wanted
    pub async fn on_resume(&self) {
        let grants = self.current_grants().await;

        if grants.all_granted() {
            let desired = self.state.lock().await.desired;
            if desired {
                self.start().await;
            }
        } else {
            self.request_permissions_for(grants).await;
        }
    }

    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Main loop of the tracker, hands fixes from the provider to
    /// [LocationTracker::on_location_sample] until [LocationTracker::shutdown] is called.
    pub async fn main_loop(&self) {
        let mut samples = self.sample_rx.lock().await;

        loop {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => {
                    break;
                }

                sample = samples.recv() => {
                    match sample {
                        Some(sample) => self.on_location_sample(sample).await,
                        None => break,
                    }
                }
            }
        }

        drop(samples);
        self.release_updates().await;
    }
}
