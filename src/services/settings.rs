//! System and personal settings, administered by the `admin` role.

use serde_json::Value;

use crate::api::{ApiError, SettingsGateway};
use crate::domain::user::User;
use crate::dto::settings::SettingsPageData;
use crate::forms::resource::ResourceForm;
use crate::services::{ServiceError, ServiceResult, ensure_role};
use crate::session::permissions::ADMIN_ROLE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsScope {
    System,
    User,
}

impl SettingsScope {
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "system" => Some(SettingsScope::System),
            "user" => Some(SettingsScope::User),
            _ => None,
        }
    }
}

fn or_empty(result: Result<Value, ApiError>, what: &str) -> ServiceResult<Value> {
    match result {
        Ok(value) => Ok(value),
        Err(err) if err.is_unauthorized() => Err(ServiceError::SessionExpired),
        Err(err) if err.status() == Some(404) => {
            log::warn!("No {what} settings stored yet");
            Ok(Value::Object(Default::default()))
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn load_settings<R>(repo: &R, user: &User) -> ServiceResult<SettingsPageData>
where
    R: SettingsGateway + ?Sized,
{
    ensure_role(user, ADMIN_ROLE)?;

    let system = or_empty(repo.system_settings().await, "system")?;
    let user = or_empty(repo.user_settings().await, "user")?;

    Ok(SettingsPageData { system, user })
}

pub async fn save_settings<R>(
    repo: &R,
    user: &User,
    scope: SettingsScope,
    form: ResourceForm,
) -> ServiceResult<()>
where
    R: SettingsGateway + ?Sized,
{
    ensure_role(user, ADMIN_ROLE)?;

    let payload = form.into_payload()?;
    match scope {
        SettingsScope::System => repo.update_system_settings(&payload).await?,
        SettingsScope::User => repo.update_user_settings(&payload).await?,
    };
    log::info!("Settings ({scope:?}) updated by {}", user.username);

    Ok(())
}
