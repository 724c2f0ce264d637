mod sim;

use std::{sync::Arc, time::Duration};

use clap::{Parser, ValueEnum};
use log::info;
use tokio::{sync::mpsc, time::timeout};
use tracker_logic::{
    LocationTracker, PermissionStatus, Prompt, SettingsCheck, TrackerSettings, TrackerUiState,
    prelude::*,
};

use sim::{EventRx, SimEvent, SimPermissions, SimProvider, SimSettings, SimUi, grants};

type SimTracker = LocationTracker<SimProvider, SimSettings, SimPermissions, SimUi>;

/// Give up waiting once nothing has happened for this long
const IDLE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PermissionAnswer {
    /// Already granted before the app starts
    Granted,
    /// Never asked, the user grants when prompted
    Grant,
    /// Denied before, the user reads the rationale and then grants
    Rationale,
    /// The user denies when prompted
    Deny,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SettingsValue {
    Ok,
    Resolvable,
    Unavailable,
}

impl From<SettingsValue> for SettingsCheck {
    fn from(value: SettingsValue) -> Self {
        match value {
            SettingsValue::Ok => SettingsCheck::Satisfied,
            SettingsValue::Resolvable => SettingsCheck::ResolutionRequired,
            SettingsValue::Unavailable => SettingsCheck::ChangeUnavailable,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DialogAnswer {
    Accept,
    Cancel,
}

#[derive(Parser)]
/// Run the location tracker against a simulated device
struct Cli {
    /// Permission state and how the user answers permission requests
    #[arg(long, value_enum, default_value_t = PermissionAnswer::Grant)]
    permissions: PermissionAnswer,

    /// What the device settings check reports
    #[arg(long, value_enum, default_value_t = SettingsValue::Ok)]
    settings: SettingsValue,

    /// How the user answers the location settings dialog
    #[arg(long, value_enum, default_value_t = DialogAnswer::Accept)]
    resolution: DialogAnswer,

    /// Stop tracking after this many fixes
    #[arg(long, default_value_t = 5)]
    fixes: u32,

    /// Milliseconds between simulated fixes
    #[arg(long, default_value_t = 300)]
    tick_ms: u64,

    /// Latitude to start walking from
    #[arg(long, default_value_t = 37.4220, allow_negative_numbers = true)]
    lat: f64,

    /// Longitude to start walking from
    #[arg(long, default_value_t = -122.0841, allow_negative_numbers = true)]
    lon: f64,

    /// Send the screen to the background and back halfway through
    #[arg(long)]
    pause: bool,
}

fn print_state(ui: &TrackerUiState) {
    info!(
        "Screen: [{}] start | [{}] stop | {} | {}{}",
        if ui.start_enabled { "x" } else { " " },
        if ui.stop_enabled { "x" } else { " " },
        ui.coordinates.as_deref().unwrap_or("-"),
        ui.last_update.as_deref().unwrap_or("-"),
        ui.last_error
            .map(|e| format!(" ({e})"))
            .unwrap_or_default(),
    );
}

fn mk_tracker(cli: &Cli, events: mpsc::UnboundedSender<SimEvent>) -> SimTracker {
    let (initial, answer) = match cli.permissions {
        PermissionAnswer::Granted => (
            grants(PermissionStatus::Granted),
            grants(PermissionStatus::Granted),
        ),
        PermissionAnswer::Grant => (
            grants(PermissionStatus::Prompt),
            grants(PermissionStatus::Granted),
        ),
        PermissionAnswer::Rationale => (
            grants(PermissionStatus::PromptWithRationale),
            grants(PermissionStatus::Granted),
        ),
        PermissionAnswer::Deny => (
            grants(PermissionStatus::Prompt),
            grants(PermissionStatus::Denied),
        ),
    };

    SimTracker::new(
        TrackerSettings::default(),
        SimProvider::new(Duration::from_millis(cli.tick_ms), (cli.lat, cli.lon)),
        SimSettings::new(
            cli.settings.into(),
            cli.resolution == DialogAnswer::Accept,
            events.clone(),
        ),
        SimPermissions::new(initial, answer, events.clone()),
        SimUi(events),
    )
}

async fn drive(cli: &Cli, tracker: &SimTracker, mut events: EventRx) {
    let mut last = tracker.ui_state().await;
    print_state(&last);

    info!("Screen resumed");
    tracker.on_resume().await;
    info!("Start pressed");
    tracker.start().await;

    let mut fixes = 0;
    let mut paused = false;

    loop {
        let event = match timeout(IDLE_TIMEOUT, events.recv()).await {
            Ok(Some(event)) => event,
            Ok(None) => break,
            Err(_) => {
                info!("Nothing happened for {IDLE_TIMEOUT:?}, finishing");
                break;
            }
        };

        match event {
            SimEvent::Update => {
                let ui = tracker.ui_state().await;
                if ui == last {
                    continue;
                }
                if ui.coordinates != last.coordinates {
                    fixes += 1;
                }
                print_state(&ui);
                last = ui;

                if fixes >= cli.fixes {
                    break;
                }

                if cli.pause && !paused && fixes >= cli.fixes / 2 {
                    paused = true;
                    info!("Screen paused");
                    tracker.on_pause().await;
                    info!("Screen resumed");
                    tracker.on_resume().await;
                }
            }
            SimEvent::Prompt(prompt) => {
                info!("[prompt] {} [{}]", prompt.message(), prompt.action_label());
                tracker.on_prompt_action(prompt).await;
                if prompt == Prompt::OpenAppSettings {
                    info!("User left for settings, finishing");
                    break;
                }
            }
            SimEvent::ActivityResult(code, result) => {
                tracker.on_activity_result(code, result).await;
            }
            SimEvent::PermissionResult(code, answer) => {
                tracker.on_permissions_result(code, answer).await;
            }
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result {
    colog::init();

    let cli = Cli::parse();

    let (tx, rx) = mpsc::unbounded_channel();
    let tracker = Arc::new(mk_tracker(&cli, tx));

    let main_loop = tokio::spawn({
        let tracker = tracker.clone();
        async move { tracker.main_loop().await }
    });

    drive(&cli, &tracker, rx).await;

    info!("Stop pressed");
    tracker.stop().await;
    tracker.shutdown();
    main_loop.await.context("Tracker loop panicked")?;

    print_state(&tracker.ui_state().await);
    Ok(())
}
