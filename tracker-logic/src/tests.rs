use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering},
    },
};

use anyhow::bail;
use tokio::sync::Notify;

use crate::{
    LocationProvider, LocationRequest, LocationSample, Permission, PermissionGateway,
    PermissionGrants, Prompt, RequestCode, SampleSender, SettingsCheck, SettingsValidator,
    TrackerUi, prelude::*,
};

#[derive(Default)]
pub struct MockProvider {
    next_id: AtomicU32,
    active: Mutex<HashMap<u32, SampleSender>>,
    requests: AtomicUsize,
    cancels: AtomicUsize,
    fail: AtomicBool,
}

impl MockProvider {
    /// Push a fix to every active subscription
    pub fn deliver(&self, sample: LocationSample) {
        for sink in self.active.lock().unwrap().values() {
            sink.deliver(sample);
        }
    }

    pub fn fail_requests(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn active_count(&self) -> usize {
        self.active.lock().unwrap().len()
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn cancel_count(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }
}

impl LocationProvider for MockProvider {
    type Subscription = u32;

    async fn request_updates(&self, _request: LocationRequest, sink: SampleSender) -> Result<u32> {
        if self.fail.load(Ordering::SeqCst) {
            bail!("Provider unavailable");
        }
        self.requests.fetch_add(1, Ordering::SeqCst);
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.active.lock().unwrap().insert(id, sink);
        Ok(id)
    }

    async fn cancel_updates(&self, subscription: u32) -> Result {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        if self.active.lock().unwrap().remove(&subscription).is_none() {
            bail!("Unknown subscription {subscription}");
        }
        Ok(())
    }
}

pub struct MockSettings {
    check: Mutex<SettingsCheck>,
    /// Holds settings checks until notified
    gate: Mutex<Option<Arc<Notify>>>,
    fail_check: AtomicBool,
    launches: Mutex<Vec<RequestCode>>,
    fail_launch: AtomicBool,
}

impl MockSettings {
    pub fn new(check: SettingsCheck) -> Self {
        Self {
            check: Mutex::new(check),
            gate: Mutex::default(),
            fail_check: AtomicBool::new(false),
            launches: Mutex::default(),
            fail_launch: AtomicBool::new(false),
        }
    }

    pub fn set_check(&self, check: SettingsCheck) {
        *self.check.lock().unwrap() = check;
    }

    /// Make checks wait until [MockSettings::release_checks]
    pub fn hold_checks(&self) {
        *self.gate.lock().unwrap() = Some(Arc::new(Notify::new()));
    }

    pub fn release_checks(&self) {
        if let Some(gate) = self.gate.lock().unwrap().take() {
            gate.notify_waiters();
        }
    }

    pub fn fail_checks(&self) {
        self.fail_check.store(true, Ordering::SeqCst);
    }

    pub fn fail_launches(&self) {
        self.fail_launch.store(true, Ordering::SeqCst);
    }

    pub fn launches(&self) -> Vec<RequestCode> {
        self.launches.lock().unwrap().clone()
    }
}

impl SettingsValidator for MockSettings {
    async fn check_settings(&self, _request: &LocationRequest) -> Result<SettingsCheck> {
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.fail_check.load(Ordering::SeqCst) {
            bail!("Location settings client is not available");
        }
        Ok(*self.check.lock().unwrap())
    }

    async fn launch_resolution(&self, code: RequestCode) -> Result {
        if self.fail_launch.load(Ordering::SeqCst) {
            bail!("No activity to handle resolution");
        }
        self.launches.lock().unwrap().push(code);
        Ok(())
    }
}

pub struct MockPermissions {
    grants: Mutex<PermissionGrants>,
    requests: AtomicUsize,
    settings_opened: AtomicUsize,
}

impl MockPermissions {
    pub fn new(grants: PermissionGrants) -> Self {
        Self {
            grants: Mutex::new(grants),
            requests: AtomicUsize::new(0),
            settings_opened: AtomicUsize::new(0),
        }
    }

    pub fn set_grants(&self, grants: PermissionGrants) {
        *self.grants.lock().unwrap() = grants;
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn settings_opened(&self) -> usize {
        self.settings_opened.load(Ordering::SeqCst)
    }
}

impl PermissionGateway for MockPermissions {
    async fn check_permissions(&self) -> Result<PermissionGrants> {
        Ok(*self.grants.lock().unwrap())
    }

    async fn request_permissions(&self, code: RequestCode, permissions: &[Permission]) -> Result {
        assert_eq!(code, RequestCode::REQUEST_LOCATION_PERMISSION);
        assert_eq!(permissions, Permission::LOCATION.as_slice());
        self.requests.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn open_app_settings(&self) -> Result {
        self.settings_opened.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
pub struct MockUi {
    updates: AtomicUsize,
    transients: Mutex<Vec<String>>,
    prompts: Mutex<Vec<Prompt>>,
}

impl MockUi {
    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn transients(&self) -> Vec<String> {
        self.transients.lock().unwrap().clone()
    }

    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().unwrap().clone()
    }
}

impl TrackerUi for MockUi {
    fn send_update(&self) {
        self.updates.fetch_add(1, Ordering::SeqCst);
    }

    fn show_transient(&self, msg: &str) {
        self.transients.lock().unwrap().push(msg.to_string());
    }

    fn show_prompt(&self, prompt: Prompt) {
        self.prompts.lock().unwrap().push(prompt);
    }
}
