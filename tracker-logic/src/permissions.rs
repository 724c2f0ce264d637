use serde::{Deserialize, Serialize};

use crate::{prelude::*, settings::RequestCode};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Permission {
    CoarseLocation,
    FineLocation,
}

impl Permission {
    /// Both capabilities are always requested together
    pub const LOCATION: [Self; 2] = [Self::CoarseLocation, Self::FineLocation];
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum PermissionStatus {
    Granted,
    Denied,
    /// Never asked, the platform will prompt
    #[default]
    Prompt,
    /// The user denied before, the platform suggests explaining why before asking again
    PromptWithRationale,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
/// Current grant state of both location permissions, this is never stored by the
/// tracker, always queried fresh from the [PermissionGateway]
pub struct PermissionGrants {
    pub coarse: PermissionStatus,
    pub fine: PermissionStatus,
}

impl PermissionGrants {
    pub const GRANTED: Self = Self {
        coarse: PermissionStatus::Granted,
        fine: PermissionStatus::Granted,
    };

    pub const DENIED: Self = Self {
        coarse: PermissionStatus::Denied,
        fine: PermissionStatus::Denied,
    };

    pub fn get(&self, permission: Permission) -> PermissionStatus {
        match permission {
            Permission::CoarseLocation => self.coarse,
            Permission::FineLocation => self.fine,
        }
    }

    /// Both coarse and fine location are granted
    pub fn all_granted(&self) -> bool {
        Permission::LOCATION
            .iter()
            .all(|p| self.get(*p) == PermissionStatus::Granted)
    }

    /// Both permissions were denied before and should be explained before asking again
    pub fn should_show_rationale(&self) -> bool {
        Permission::LOCATION
            .iter()
            .all(|p| self.get(*p) == PermissionStatus::PromptWithRationale)
    }
}

pub trait PermissionGateway: Send + Sync {
    /// Query the platform for the current grant state
    fn check_permissions(&self) -> impl Future<Output = Result<PermissionGrants>> + Send;

    /// Issue a batched permission request, the answer comes back later through
    /// [crate::LocationTracker::on_permissions_result] with the same `code`.
    fn request_permissions(
        &self,
        code: RequestCode,
        permissions: &[Permission],
    ) -> impl Future<Output = Result> + Send;

    /// Deep link to this app's page in the system settings
    fn open_app_settings(&self) -> impl Future<Output = Result> + Send;
}
