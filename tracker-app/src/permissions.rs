use anyhow::anyhow;
#[cfg(any(target_os = "android", target_os = "ios"))]
use log::info;
use log::warn;
use tauri::{AppHandle, Manager, plugin::PermissionState};
use tauri_plugin_geolocation::{GeolocationExt, PermissionStatus as PluginStatus, PermissionType};
#[cfg(target_os = "ios")]
use tauri_plugin_opener::OpenerExt;
use tracker_logic::{
    Permission, PermissionGateway, PermissionGrants, PermissionStatus, RequestCode, prelude::*,
};

use crate::state::TrackerHandle;

/// Deep link to this app's page in the system settings
#[cfg(target_os = "ios")]
const APP_SETTINGS_URL: &str = "app-settings:";

/// `Settings.ACTION_APPLICATION_DETAILS_SETTINGS`
#[cfg(any(target_os = "android", test))]
const APP_DETAILS_ACTION: &str = "android.settings.APPLICATION_DETAILS_SETTINGS";

/// `Intent.FLAG_ACTIVITY_NEW_TASK`
#[cfg(target_os = "android")]
const FLAG_ACTIVITY_NEW_TASK: i32 = 0x1000_0000;

/// Data URI the app details settings page is opened with
#[cfg(any(target_os = "android", test))]
fn app_details_uri(package: &str) -> String {
    format!("package:{package}")
}

/// Start the app details settings activity for `package` from the current activity
#[cfg(target_os = "android")]
fn open_app_details(package: &str) -> Result {
    use jni::{JavaVM, objects::JObject, objects::JValue};

    let ctx = ndk_context::android_context();
    // SAFETY: both pointers are owned by the running activity and outlive this call
    let vm = unsafe { JavaVM::from_raw(ctx.vm().cast()) }.context("No Java VM")?;
    let activity = unsafe { JObject::from_raw(ctx.context().cast()) };
    let mut env = vm
        .attach_current_thread()
        .context("Failed to attach to the Java VM")?;

    let action = env.new_string(APP_DETAILS_ACTION)?;
    let uri = env.new_string(app_details_uri(package))?;
    let uri = env
        .call_static_method(
            "android/net/Uri",
            "parse",
            "(Ljava/lang/String;)Landroid/net/Uri;",
            &[(&uri).into()],
        )?
        .l()?;
    let intent = env.new_object(
        "android/content/Intent",
        "(Ljava/lang/String;Landroid/net/Uri;)V",
        &[(&action).into(), (&uri).into()],
    )?;
    env.call_method(
        &intent,
        "addFlags",
        "(I)Landroid/content/Intent;",
        &[JValue::Int(FLAG_ACTIVITY_NEW_TASK)],
    )?;
    env.call_method(
        &activity,
        "startActivity",
        "(Landroid/content/Intent;)V",
        &[(&intent).into()],
    )?;
    Ok(())
}

fn to_status(state: PermissionState) -> PermissionStatus {
    match state {
        PermissionState::Granted => PermissionStatus::Granted,
        PermissionState::Denied => PermissionStatus::Denied,
        PermissionState::Prompt => PermissionStatus::Prompt,
        PermissionState::PromptWithRationale => PermissionStatus::PromptWithRationale,
    }
}

fn to_grants(status: PluginStatus) -> PermissionGrants {
    PermissionGrants {
        coarse: to_status(status.coarse_location),
        fine: to_status(status.location),
    }
}

fn to_permission_type(permission: &Permission) -> PermissionType {
    match permission {
        Permission::CoarseLocation => PermissionType::CoarseLocation,
        Permission::FineLocation => PermissionType::Location,
    }
}

/// Location permissions through the geolocation plugin
pub struct TauriPermissions(AppHandle);

impl TauriPermissions {
    pub fn new(app: AppHandle) -> Self {
        Self(app)
    }
}

impl PermissionGateway for TauriPermissions {
    async fn check_permissions(&self) -> Result<PermissionGrants> {
        self.0
            .geolocation()
            .check_permissions()
            .map(to_grants)
            .map_err(|why| anyhow!("Failed to check permissions: {why}"))
    }

    async fn request_permissions(&self, code: RequestCode, permissions: &[Permission]) -> Result {
        let types = permissions.iter().map(to_permission_type).collect::<Vec<_>>();
        let app = self.0.clone();

        // The plugin blocks until the user answers, answer the tracker from another task
        tauri::async_runtime::spawn_blocking(move || {
            let grants = match app.geolocation().request_permissions(Some(types)) {
                Ok(status) => Some(to_grants(status)),
                Err(why) => {
                    warn!("Permission request failed: {why}");
                    None
                }
            };
            tauri::async_runtime::spawn(async move {
                let tracker = app.state::<TrackerHandle>();
                tracker.on_permissions_result(code, grants).await;
            });
        });

        Ok(())
    }

    async fn open_app_settings(&self) -> Result {
        open_settings_page(&self.0)
    }
}

#[cfg(target_os = "android")]
fn open_settings_page(app: &AppHandle) -> Result {
    let package = &app.config().identifier;
    info!("Opening app details settings for {package}");
    open_app_details(package).context("Failed to open app settings")
}

#[cfg(target_os = "ios")]
fn open_settings_page(app: &AppHandle) -> Result {
    info!("Opening app settings");
    app.opener()
        .open_url(APP_SETTINGS_URL, None::<&str>)
        .map_err(|why| anyhow!("Failed to open app settings: {why}"))
}

#[cfg(not(any(target_os = "android", target_os = "ios")))]
fn open_settings_page(_app: &AppHandle) -> Result {
    Err(anyhow!("App settings are only available on mobile"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_details_uri() {
        assert_eq!(
            app_details_uri("com.locationtracker.app"),
            "package:com.locationtracker.app"
        );
        assert!(APP_DETAILS_ACTION.ends_with("APPLICATION_DETAILS_SETTINGS"));
    }

    #[test]
    fn test_grants_from_plugin() {
        let grants = to_grants(PluginStatus {
            location: PermissionState::Granted,
            coarse_location: PermissionState::PromptWithRationale,
        });
        assert_eq!(grants.fine, PermissionStatus::Granted);
        assert_eq!(grants.coarse, PermissionStatus::PromptWithRationale);
    }
}
