use std::cell::RefCell;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::api::AuthGateway;
use crate::cache::{PersistentCache, keys};
use crate::domain::user::User;
use crate::forms::auth::{
    ChangePasswordForm, ChangePasswordPayload, LoginForm, ProfileForm, RegisterForm,
    RegisterPayload,
};
use crate::models::config::SessionConfig;
use crate::session::token::{expires_within, is_valid_token};
use crate::session::{AuthState, RefreshOutcome, SessionError, restore_user};

/// Owns the authentication state of one browser session.
///
/// The in-memory [`AuthState`] and the cached credentials are updated
/// together by every operation.
pub struct SessionManager<'a, G>
where
    G: AuthGateway + ?Sized,
{
    gateway: &'a G,
    cache: &'a PersistentCache,
    config: &'a SessionConfig,
    state: RefCell<AuthState>,
}

impl<'a, G> SessionManager<'a, G>
where
    G: AuthGateway + ?Sized,
{
    pub fn new(gateway: &'a G, cache: &'a PersistentCache, config: &'a SessionConfig) -> Self {
        Self {
            gateway,
            cache,
            config,
            state: RefCell::new(AuthState::Anonymous),
        }
    }

    /// Trusts the cached session only when its token is still valid.
    pub fn restore(&self, now: DateTime<Utc>) -> Option<User> {
        let user = restore_user(self.cache, now);
        *self.state.borrow_mut() = match &user {
            Some(user) => AuthState::Authenticated(user.clone()),
            None => AuthState::Anonymous,
        };
        user
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn current_user(&self) -> Option<User> {
        match &*self.state.borrow() {
            AuthState::Authenticated(user) => Some(user.clone()),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(*self.state.borrow(), AuthState::Authenticated(_))
    }

    pub async fn login(&self, form: &LoginForm) -> Result<User, SessionError> {
        form.validate_fields()?;

        self.cache.clear();
        *self.state.borrow_mut() = AuthState::Authenticating;

        let response = match self.gateway.login(form).await {
            Ok(response) => response,
            Err(err) => {
                *self.state.borrow_mut() = AuthState::Anonymous;
                log::info!("Login failed for {}: {err}", form.username.trim());
                return Err(err.into());
            }
        };

        let stored = self.store_credentials(
            &response.access_token,
            &response.refresh_token,
            &response.user,
        );
        if let Err(err) = stored {
            self.clear();
            return Err(err.into());
        }

        log::info!("User {} signed in", response.user.username);
        *self.state.borrow_mut() = AuthState::Authenticated(response.user.clone());
        Ok(response.user)
    }

    fn store_credentials(
        &self,
        access_token: &str,
        refresh_token: &str,
        user: &User,
    ) -> Result<(), crate::cache::CacheError> {
        self.cache.set(keys::ACCESS_TOKEN, access_token)?;
        self.cache.set(keys::REFRESH_TOKEN, refresh_token)?;
        self.cache.set(keys::USER_INFO, user)?;
        self.cache
            .set(keys::TOKEN_REFRESHED_AT, &Utc::now().timestamp())?;
        self.cache.remove(keys::REFRESH_FAILURES);
        Ok(())
    }

    /// Registration does not sign the user in.
    pub async fn register(&self, form: RegisterForm) -> Result<Value, SessionError> {
        let payload = RegisterPayload::try_from(form)?;
        let created = self.gateway.register(&payload).await?;
        log::info!("Registered user {}", payload.username);
        Ok(created)
    }

    /// Tells the backend when there is a session to end, then always clears
    /// local state. Backend failures are only logged.
    pub async fn logout(&self) {
        let has_token = self
            .cache
            .get::<String>(keys::ACCESS_TOKEN)
            .ok()
            .flatten()
            .is_some();

        if has_token {
            if let Err(err) = self.gateway.logout().await {
                log::warn!("Logout request failed: {err}");
            }
        }

        if let Some(user) = self.current_user() {
            log::info!("User {} signed out", user.username);
        }
        self.clear();
    }

    /// Reloads the profile from the backend and caches it.
    pub async fn refresh_user_info(&self) -> Result<User, SessionError> {
        let user = self.gateway.me().await?;
        self.remember_user(&user)?;
        Ok(user)
    }

    pub async fn update_profile(&self, form: ProfileForm) -> Result<User, SessionError> {
        let payload = form.into_payload()?;
        let user = self.gateway.update_profile(&payload).await?;
        self.remember_user(&user)?;
        Ok(user)
    }

    /// The backend revokes existing tokens, so the session ends afterwards.
    pub async fn change_password(&self, form: ChangePasswordForm) -> Result<(), SessionError> {
        let payload = ChangePasswordPayload::try_from(form)?;
        self.gateway.change_password(&payload).await?;
        self.logout().await;
        Ok(())
    }

    fn remember_user(&self, user: &User) -> Result<(), SessionError> {
        self.cache.set(keys::USER_INFO, user)?;
        *self.state.borrow_mut() = AuthState::Authenticated(user.clone());
        Ok(())
    }

    pub fn clear(&self) {
        self.cache.clear();
        *self.state.borrow_mut() = AuthState::Anonymous;
    }

    fn refresh_due(&self, now: DateTime<Utc>) -> bool {
        let last = self
            .cache
            .get::<i64>(keys::TOKEN_REFRESHED_AT)
            .ok()
            .flatten()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .or_else(|| self.cache.entry_timestamp(keys::ACCESS_TOKEN).ok().flatten());

        let interval_elapsed = match last {
            Some(last) => (now - last).to_std().unwrap_or_default() >= self.config.refresh_interval(),
            None => true,
        };
        if interval_elapsed {
            return true;
        }

        self.cache
            .get::<String>(keys::ACCESS_TOKEN)
            .ok()
            .flatten()
            .is_some_and(|token| expires_within(&token, self.config.expiry_buffer(), now))
    }

    /// One step of the periodic background refresh.
    ///
    /// Refreshes when the interval elapsed or the token is about to expire.
    /// Failures are counted; a rejected refresh token or reaching
    /// `max_refresh_failures` ends the session.
    pub async fn silent_refresh_tick(&self, now: DateTime<Utc>) -> RefreshOutcome {
        if !self.is_authenticated() || !self.refresh_due(now) {
            return RefreshOutcome::Idle;
        }

        let err = match self.gateway.refresh().await {
            Ok(_) => {
                self.cache.remove(keys::REFRESH_FAILURES);
                log::debug!("Silent token refresh succeeded");
                return RefreshOutcome::Refreshed;
            }
            Err(err) => err,
        };

        if err.is_unauthorized() {
            log::warn!("Refresh token rejected, signing out: {err}");
            self.clear();
            return RefreshOutcome::LoggedOut;
        }

        let failures = self
            .cache
            .get::<u32>(keys::REFRESH_FAILURES)
            .ok()
            .flatten()
            .unwrap_or(0)
            + 1;

        if failures >= self.config.max_refresh_failures {
            log::warn!("Silent token refresh failed {failures} times, signing out: {err}");
            self.clear();
            return RefreshOutcome::LoggedOut;
        }

        log::warn!("Silent token refresh failed ({failures}): {err}");
        if let Err(store_err) = self.cache.set(keys::REFRESH_FAILURES, &failures) {
            log::warn!("Failed to record refresh failure: {store_err}");
        }
        RefreshOutcome::Failed(failures)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::api::mock::MockGateway;
    use crate::api::{ApiError, LoginResponse};
    use crate::forms::FormError;
    use crate::session::permissions::user_with_role;
    use crate::session::token::jwt_with_exp;

    fn login_form(password: &str) -> LoginForm {
        LoginForm {
            username: "alice".to_string(),
            password: password.to_string(),
        }
    }

    fn signed_in(cache: &PersistentCache, token: &str) {
        cache.set(keys::ACCESS_TOKEN, token).expect("set token");
        cache.set(keys::REFRESH_TOKEN, "refresh-token").expect("set refresh");
        cache
            .set(keys::USER_INFO, &user_with_role("sales"))
            .expect("set user");
    }

    /// Local validation failures never reach the gateway.
    #[tokio::test]
    async fn login_without_password_makes_no_call() {
        let mut gateway = MockGateway::new();
        gateway.expect_login().never();
        let cache = PersistentCache::in_memory("crm_");
        let config = SessionConfig::default();
        let manager = SessionManager::new(&gateway, &cache, &config);

        let err = manager.login(&login_form("")).await.expect_err("invalid form");

        match err {
            SessionError::Form(FormError::Invalid(messages)) => {
                assert_eq!(messages, vec!["请输入密码".to_string()]);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(manager.state(), AuthState::Anonymous);
    }

    #[tokio::test]
    async fn login_persists_credentials() {
        let mut gateway = MockGateway::new();
        gateway
            .expect_login()
            .withf(|form| form.username == "alice" && form.password == "Secret1")
            .times(1)
            .returning(|_| {
                Ok(LoginResponse {
                    access_token: "mock_token_access".to_string(),
                    refresh_token: "mock_token_refresh".to_string(),
                    user: user_with_role("sales"),
                })
            });
        let cache = PersistentCache::in_memory("crm_");
        cache.set(keys::REFRESH_FAILURES, &2u32).expect("set");
        let config = SessionConfig::default();
        let manager = SessionManager::new(&gateway, &cache, &config);

        let user = manager.login(&login_form("Secret1")).await.expect("login");

        assert_eq!(user.role, "sales");
        assert!(manager.is_authenticated());
        assert_eq!(
            cache.get::<String>(keys::ACCESS_TOKEN).expect("get"),
            Some("mock_token_access".to_string())
        );
        assert_eq!(
            cache.get::<String>(keys::REFRESH_TOKEN).expect("get"),
            Some("mock_token_refresh".to_string())
        );
        assert_eq!(cache.get::<User>(keys::USER_INFO).expect("get"), Some(user));
        assert_eq!(cache.get::<u32>(keys::REFRESH_FAILURES).expect("get"), None);
    }

    #[tokio::test]
    async fn login_failure_surfaces_server_message() {
        let mut gateway = MockGateway::new();
        gateway
            .expect_login()
            .times(1)
            .returning(|_| Err(ApiError::from_status(401, Some("用户名或密码错误".to_string()))));
        let cache = PersistentCache::in_memory("crm_");
        let config = SessionConfig::default();
        let manager = SessionManager::new(&gateway, &cache, &config);

        let err = manager.login(&login_form("Wrong1")).await.expect_err("rejected");

        assert_eq!(err.to_string(), "用户名或密码错误");
        assert_eq!(manager.state(), AuthState::Anonymous);
        assert_eq!(cache.get::<String>(keys::ACCESS_TOKEN).expect("get"), None);
    }

    #[test]
    fn restore_trusts_valid_token() {
        let gateway = MockGateway::new();
        let cache = PersistentCache::in_memory("crm_");
        signed_in(&cache, "mock_token_access");
        let config = SessionConfig::default();
        let manager = SessionManager::new(&gateway, &cache, &config);

        let user = manager.restore(Utc::now()).expect("restored");

        assert_eq!(user.role, "sales");
        assert!(manager.is_authenticated());
    }

    #[test]
    fn restore_clears_expired_session() {
        let gateway = MockGateway::new();
        let cache = PersistentCache::in_memory("crm_");
        let now = Utc::now();
        signed_in(&cache, &jwt_with_exp(now.timestamp() - 60));
        let config = SessionConfig::default();
        let manager = SessionManager::new(&gateway, &cache, &config);

        assert!(manager.restore(now).is_none());
        assert!(!manager.is_authenticated());
        assert_eq!(cache.get::<String>(keys::REFRESH_TOKEN).expect("get"), None);
    }

    #[tokio::test]
    async fn logout_clears_even_when_backend_fails() {
        let mut gateway = MockGateway::new();
        gateway
            .expect_logout()
            .times(1)
            .returning(|| Err(ApiError::NetworkUnavailable));
        let cache = PersistentCache::in_memory("crm_");
        signed_in(&cache, "mock_token_access");
        let config = SessionConfig::default();
        let manager = SessionManager::new(&gateway, &cache, &config);
        manager.restore(Utc::now());

        manager.logout().await;

        assert_eq!(manager.state(), AuthState::Anonymous);
        assert_eq!(cache.get::<User>(keys::USER_INFO).expect("get"), None);
    }

    #[tokio::test]
    async fn change_password_ends_session() {
        let mut gateway = MockGateway::new();
        gateway
            .expect_change_password()
            .withf(|payload| payload.old_password == "Old1pass")
            .times(1)
            .returning(|_| Ok(()));
        gateway.expect_logout().times(1).returning(|| Ok(()));
        let cache = PersistentCache::in_memory("crm_");
        signed_in(&cache, "mock_token_access");
        let config = SessionConfig::default();
        let manager = SessionManager::new(&gateway, &cache, &config);
        manager.restore(Utc::now());

        manager
            .change_password(ChangePasswordForm {
                old_password: "Old1pass".to_string(),
                new_password: "New1pass".to_string(),
                confirm_password: "New1pass".to_string(),
            })
            .await
            .expect("password changed");

        assert!(!manager.is_authenticated());
    }

    #[tokio::test]
    async fn silent_refresh_waits_for_interval() {
        let mut gateway = MockGateway::new();
        gateway.expect_refresh().never();
        let cache = PersistentCache::in_memory("crm_");
        signed_in(&cache, "mock_token_access");
        let now = Utc::now();
        cache.set(keys::TOKEN_REFRESHED_AT, &now.timestamp()).expect("set");
        let config = SessionConfig::default();
        let manager = SessionManager::new(&gateway, &cache, &config);
        manager.restore(now);

        let outcome = manager.silent_refresh_tick(now + Duration::minutes(10)).await;

        assert_eq!(outcome, RefreshOutcome::Idle);
    }

    #[tokio::test]
    async fn silent_refresh_runs_before_token_expiry() {
        let mut gateway = MockGateway::new();
        gateway
            .expect_refresh()
            .times(1)
            .returning(|| Ok("mock_token_new".to_string()));
        let cache = PersistentCache::in_memory("crm_");
        let now = Utc::now();
        signed_in(&cache, &jwt_with_exp(now.timestamp() + 60));
        cache.set(keys::TOKEN_REFRESHED_AT, &now.timestamp()).expect("set");
        let config = SessionConfig::default();
        let manager = SessionManager::new(&gateway, &cache, &config);
        manager.restore(now);

        assert_eq!(manager.silent_refresh_tick(now).await, RefreshOutcome::Refreshed);
    }

    #[tokio::test]
    async fn repeated_refresh_failures_force_logout() {
        let mut gateway = MockGateway::new();
        gateway
            .expect_refresh()
            .times(3)
            .returning(|| Err(ApiError::Timeout));
        let cache = PersistentCache::in_memory("crm_");
        signed_in(&cache, "mock_token_access");
        let config = SessionConfig::default();
        let manager = SessionManager::new(&gateway, &cache, &config);
        let now = Utc::now();
        manager.restore(now);
        let due = now + Duration::hours(1);

        assert_eq!(manager.silent_refresh_tick(due).await, RefreshOutcome::Failed(1));
        assert_eq!(manager.silent_refresh_tick(due).await, RefreshOutcome::Failed(2));
        assert_eq!(manager.silent_refresh_tick(due).await, RefreshOutcome::LoggedOut);
        assert!(!manager.is_authenticated());
        assert_eq!(cache.get::<String>(keys::ACCESS_TOKEN).expect("get"), None);
    }

    #[tokio::test]
    async fn rejected_refresh_token_logs_out_immediately() {
        let mut gateway = MockGateway::new();
        gateway
            .expect_refresh()
            .times(1)
            .returning(|| Err(ApiError::from_status(401, None)));
        let cache = PersistentCache::in_memory("crm_");
        signed_in(&cache, "mock_token_access");
        let config = SessionConfig::default();
        let manager = SessionManager::new(&gateway, &cache, &config);
        let now = Utc::now();
        manager.restore(now);

        let outcome = manager.silent_refresh_tick(now + Duration::hours(1)).await;

        assert_eq!(outcome, RefreshOutcome::LoggedOut);
    }
}
