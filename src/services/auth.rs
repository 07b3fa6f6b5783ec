//! Sign-in, registration and profile workflows.

use crate::api::AuthGateway;
use crate::domain::user::User;
use crate::forms::auth::{ChangePasswordForm, LoginForm, ProfileForm, RegisterForm};
use crate::services::{ServiceError, ServiceResult};
use crate::session::{SessionError, SessionManager};

/// Validates the credentials locally, then signs in. Rejected credentials
/// are reported as a form error with the backend's message.
pub async fn login<G>(session: &SessionManager<'_, G>, form: LoginForm) -> ServiceResult<User>
where
    G: AuthGateway + ?Sized,
{
    session.login(&form).await.map_err(|err| match err {
        SessionError::Api(err) if err.is_unauthorized() => ServiceError::Form(err.message()),
        other => other.into(),
    })
}

pub async fn register<G>(session: &SessionManager<'_, G>, form: RegisterForm) -> ServiceResult<()>
where
    G: AuthGateway + ?Sized,
{
    session.register(form).await?;
    Ok(())
}

/// Never fails: backend errors are logged and local state is cleared anyway.
pub async fn logout<G>(session: &SessionManager<'_, G>)
where
    G: AuthGateway + ?Sized,
{
    session.logout().await;
}

/// Reloads the profile so the page shows what the backend holds.
pub async fn load_profile<G>(session: &SessionManager<'_, G>) -> ServiceResult<User>
where
    G: AuthGateway + ?Sized,
{
    Ok(session.refresh_user_info().await?)
}

pub async fn update_profile<G>(
    session: &SessionManager<'_, G>,
    form: ProfileForm,
) -> ServiceResult<User>
where
    G: AuthGateway + ?Sized,
{
    Ok(session.update_profile(form).await?)
}

/// Ends the session on success; the user signs in with the new password.
pub async fn change_password<G>(
    session: &SessionManager<'_, G>,
    form: ChangePasswordForm,
) -> ServiceResult<()>
where
    G: AuthGateway + ?Sized,
{
    session.change_password(form).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::api::mock::MockGateway;
    use crate::cache::PersistentCache;
    use crate::models::config::SessionConfig;

    #[tokio::test]
    async fn invalid_registration_is_a_form_error() {
        let mut gateway = MockGateway::new();
        gateway.expect_register().never();
        let cache = PersistentCache::in_memory("crm_");
        let config = SessionConfig::default();
        let session = SessionManager::new(&gateway, &cache, &config);

        let result = register(
            &session,
            RegisterForm {
                username: "al".to_string(),
                email: "alice@example.com".to_string(),
                real_name: "Alice".to_string(),
                phone: String::new(),
                password: "Secret1".to_string(),
                confirm_password: "Secret1".to_string(),
            },
        )
        .await;

        assert!(matches!(result, Err(ServiceError::Form(message)) if message == "用户名长度不能少于3位"));
    }

    #[tokio::test]
    async fn rejected_credentials_are_a_form_error() {
        let mut gateway = MockGateway::new();
        gateway
            .expect_login()
            .times(1)
            .returning(|_| Err(ApiError::from_status(401, Some("用户名或密码错误".to_string()))));
        let cache = PersistentCache::in_memory("crm_");
        let config = SessionConfig::default();
        let session = SessionManager::new(&gateway, &cache, &config);

        let result = login(
            &session,
            LoginForm {
                username: "alice".to_string(),
                password: "wrong".to_string(),
            },
        )
        .await;

        assert!(matches!(result, Err(ServiceError::Form(message)) if message == "用户名或密码错误"));
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn expired_session_while_loading_profile() {
        let mut gateway = MockGateway::new();
        gateway
            .expect_me()
            .times(1)
            .returning(|| Err(ApiError::SessionExpired));
        let cache = PersistentCache::in_memory("crm_");
        let config = SessionConfig::default();
        let session = SessionManager::new(&gateway, &cache, &config);

        let result = load_profile(&session).await;

        assert!(matches!(result, Err(ServiceError::SessionExpired)));
    }
}
