use chrono::Utc;
use log::debug;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::{prelude::*, tracker::UtcDT};

/// How many fixes may queue up before the provider starts dropping them
const SAMPLE_BUFFER: usize = 16;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
/// One fix as reported by the platform location provider
pub struct LocationSample {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// When the provider observed this fix
    pub observed_at: UtcDT,
}

impl LocationSample {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            observed_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, specta::Type)]
/// Accuracy the provider should aim for
pub enum Priority {
    /// Use GPS when available
    HighAccuracy,
    /// Roughly city block level, prefers wifi/cell
    BalancedPowerAccuracy,
    /// Coarse, city level
    LowPower,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, specta::Type)]
/// Cadence and accuracy of the periodic updates we ask the provider for
pub struct LocationRequest {
    pub priority: Priority,
    /// Desired time between fixes
    pub interval_ms: u32,
    /// Fastest rate we're willing to accept fixes at
    pub min_interval_ms: u32,
}

impl Default for LocationRequest {
    fn default() -> Self {
        Self {
            priority: Priority::HighAccuracy,
            interval_ms: 3000,
            min_interval_ms: 1000,
        }
    }
}

/// Receiving half of the sample channel, owned by the tracker
pub type SampleReceiver = mpsc::Receiver<LocationSample>;

#[derive(Debug, Clone)]
/// Handed to a [LocationProvider] when updates are requested, the provider's
/// callback pushes every fix it gets through this.
pub struct SampleSender(mpsc::Sender<LocationSample>);

impl SampleSender {
    /// Deliver a fix without blocking, safe to call from a synchronous platform callback.
    /// Returns `false` if the tracker is gone.
    pub fn deliver(&self, sample: LocationSample) -> bool {
        match self.0.try_send(sample) {
            Ok(_) => true,
            Err(TrySendError::Full(_)) => {
                debug!("Sample queue full, dropping fix");
                true
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }
}

pub fn sample_channel() -> (SampleSender, SampleReceiver) {
    let (tx, rx) = mpsc::channel(SAMPLE_BUFFER);
    (SampleSender(tx), rx)
}

pub trait LocationProvider: Send + Sync {
    /// Handle for an active registration, released with [LocationProvider::cancel_updates]
    type Subscription: Send + Sync;

    /// Register for recurring fixes at the cadence described by `request`, fixes
    /// should be pushed into `sink` until the subscription is cancelled.
    fn request_updates(
        &self,
        request: LocationRequest,
        sink: SampleSender,
    ) -> impl Future<Output = Result<Self::Subscription>> + Send;

    /// Stop delivering fixes for the given subscription
    fn cancel_updates(
        &self,
        subscription: Self::Subscription,
    ) -> impl Future<Output = Result> + Send;
}
