use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicU32, Ordering},
    },
    time::Duration,
};

use log::{debug, info};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracker_logic::{
    ActivityResult, LocationProvider, LocationRequest, LocationSample, Permission,
    PermissionGateway, PermissionGrants, PermissionStatus, Prompt, RequestCode, SampleSender,
    SettingsCheck, SettingsValidator, TrackerUi, prelude::*,
};

/// Degrees moved between simulated fixes
const STEP: f64 = 0.0001;

/// Things the simulated platform tells the driver, these are handed to the tracker one
/// at a time like callbacks on a UI thread.
#[derive(Debug)]
pub enum SimEvent {
    Update,
    Prompt(Prompt),
    ActivityResult(RequestCode, ActivityResult),
    PermissionResult(RequestCode, Option<PermissionGrants>),
}

pub type EventTx = mpsc::UnboundedSender<SimEvent>;
pub type EventRx = mpsc::UnboundedReceiver<SimEvent>;

/// Walks north east from an origin, one step per fix
pub struct SimProvider {
    tick: Duration,
    origin: (f64, f64),
    steps: Arc<AtomicU32>,
}

impl SimProvider {
    pub fn new(tick: Duration, origin: (f64, f64)) -> Self {
        Self {
            tick,
            origin,
            steps: Arc::default(),
        }
    }
}

impl LocationProvider for SimProvider {
    type Subscription = CancellationToken;

    async fn request_updates(
        &self,
        request: LocationRequest,
        sink: SampleSender,
    ) -> Result<CancellationToken> {
        info!(
            "Provider: fixes requested every {}ms (min {}ms), simulating every {:?}",
            request.interval_ms, request.min_interval_ms, self.tick
        );

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let steps = self.steps.clone();
        let tick = self.tick;
        let (lat, lon) = self.origin;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            // First tick is instant, skip it so fixes come at the cadence
            interval.tick().await;
            loop {
                tokio::select! {
                    biased;

                    _ = token.cancelled() => break,

                    _ = interval.tick() => {
                        let n = steps.fetch_add(1, Ordering::SeqCst) + 1;
                        let offset = n as f64 * STEP;
                        if !sink.deliver(LocationSample::new(lat + offset, lon + offset)) {
                            break;
                        }
                    }
                }
            }
            debug!("Provider: fix generator stopped");
        });

        Ok(cancel)
    }

    async fn cancel_updates(&self, subscription: CancellationToken) -> Result {
        info!("Provider: updates cancelled");
        subscription.cancel();
        Ok(())
    }
}

pub struct SimSettings {
    check: Mutex<SettingsCheck>,
    accept_resolution: bool,
    events: EventTx,
}

impl SimSettings {
    pub fn new(check: SettingsCheck, accept_resolution: bool, events: EventTx) -> Self {
        Self {
            check: Mutex::new(check),
            accept_resolution,
            events,
        }
    }
}

impl SettingsValidator for SimSettings {
    async fn check_settings(&self, _request: &LocationRequest) -> Result<SettingsCheck> {
        let check = *self.check.lock().unwrap();
        info!("Settings: check returned {check:?}");
        Ok(check)
    }

    async fn launch_resolution(&self, code: RequestCode) -> Result {
        let result = if self.accept_resolution {
            *self.check.lock().unwrap() = SettingsCheck::Satisfied;
            ActivityResult::Ok
        } else {
            ActivityResult::Canceled
        };
        info!("Settings: resolution dialog shown, user answers {result:?}");
        self.events
            .send(SimEvent::ActivityResult(code, result))
            .context("Driver is gone")
    }
}

pub struct SimPermissions {
    grants: Mutex<PermissionGrants>,
    /// What the user picks when asked
    answer: PermissionGrants,
    events: EventTx,
}

impl SimPermissions {
    pub fn new(initial: PermissionGrants, answer: PermissionGrants, events: EventTx) -> Self {
        Self {
            grants: Mutex::new(initial),
            answer,
            events,
        }
    }
}

impl PermissionGateway for SimPermissions {
    async fn check_permissions(&self) -> Result<PermissionGrants> {
        Ok(*self.grants.lock().unwrap())
    }

    async fn request_permissions(&self, code: RequestCode, permissions: &[Permission]) -> Result {
        info!(
            "Permissions: asking for {permissions:?}, user answers {:?}",
            self.answer
        );
        *self.grants.lock().unwrap() = self.answer;
        self.events
            .send(SimEvent::PermissionResult(code, Some(self.answer)))
            .context("Driver is gone")
    }

    async fn open_app_settings(&self) -> Result {
        info!("Permissions: opening app settings");
        Ok(())
    }
}

pub struct SimUi(pub EventTx);

impl TrackerUi for SimUi {
    fn send_update(&self) {
        self.0.send(SimEvent::Update).ok();
    }

    fn show_transient(&self, msg: &str) {
        info!("[toast] {msg}");
    }

    fn show_prompt(&self, prompt: Prompt) {
        self.0.send(SimEvent::Prompt(prompt)).ok();
    }
}

pub fn grants(status: PermissionStatus) -> PermissionGrants {
    PermissionGrants {
        coarse: status,
        fine: status,
    }
}
