use std::time::Duration;

use serde_json::{Value, json};

use crate::api::{ApiError, DashboardReader};
use crate::cache::{PersistentCache, keys};
use crate::domain::user::User;
use crate::dto::dashboard::{DashboardPageData, ReportPageData};
use crate::services::{ServiceError, ServiceResult, ensure_permission};
use crate::session::Permission;

pub const RECENT_ACTIVITY_LIMIT: usize = 10;

/// Analytics reports offered on the reports page. The first one is the default.
pub const REPORTS: &[&str] = &["sales", "customers", "products"];

/// An expired session aborts the page; any other failure only empties the
/// affected part.
fn degrade<T>(result: Result<T, ApiError>, fallback: T, errors: &mut Vec<String>) -> ServiceResult<T> {
    match result {
        Ok(value) => Ok(value),
        Err(err) if err.is_unauthorized() => Err(ServiceError::SessionExpired),
        Err(err) => {
            log::error!("Failed to load dashboard data: {err}");
            errors.push(err.message());
            Ok(fallback)
        }
    }
}

/// Stats are reused from `cache` for `ttl`; recent activities are always
/// fetched.
pub async fn load_dashboard<R>(
    repo: &R,
    user: &User,
    cache: &PersistentCache,
    ttl: Duration,
) -> ServiceResult<DashboardPageData>
where
    R: DashboardReader + ?Sized,
{
    ensure_permission(user, Permission::Read)?;

    let mut errors = Vec::new();
    let cached = cache
        .get::<Value>(keys::DASHBOARD_STATS)
        .unwrap_or_else(|err| {
            log::warn!("Failed to read cached dashboard stats: {err}");
            None
        });
    let stats = match cached {
        Some(stats) => stats,
        None => match repo.dashboard().await {
            Ok(stats) => {
                if let Err(err) = cache.set_with_expiry(keys::DASHBOARD_STATS, &stats, ttl) {
                    log::warn!("Failed to cache dashboard stats: {err}");
                }
                stats
            }
            Err(err) => degrade(Err(err), json!({}), &mut errors)?,
        },
    };
    let activities = degrade(
        repo.recent_activities(RECENT_ACTIVITY_LIMIT).await,
        Vec::new(),
        &mut errors,
    )?;

    Ok(DashboardPageData {
        stats,
        activities,
        errors,
    })
}

/// Unknown report names fall back to the first report.
pub async fn load_reports<R>(repo: &R, user: &User, report: Option<&str>) -> ServiceResult<ReportPageData>
where
    R: DashboardReader + ?Sized,
{
    ensure_permission(user, Permission::Read)?;

    let report = report
        .and_then(|name| REPORTS.iter().copied().find(|known| *known == name))
        .unwrap_or(REPORTS[0]);

    let data: Value = repo.analytics(report).await?;

    Ok(ReportPageData {
        report,
        reports: REPORTS,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockGateway;
    use crate::session::permissions::user_with_role;

    const TTL: Duration = Duration::from_secs(300);

    #[tokio::test]
    async fn failed_parts_degrade_to_empty() {
        let cache = PersistentCache::in_memory("crm_");
        let mut repo = MockGateway::new();
        repo.expect_dashboard()
            .times(1)
            .returning(|| Err(ApiError::from_status(500, None)));
        repo.expect_recent_activities()
            .withf(|limit| *limit == RECENT_ACTIVITY_LIMIT)
            .times(1)
            .returning(|_| Ok(vec![json!({"id": 1, "type": "customer"})]));

        let data = load_dashboard(&repo, &user_with_role("support"), &cache, TTL)
            .await
            .expect("dashboard renders");

        assert_eq!(data.stats, json!({}));
        assert_eq!(data.activities.len(), 1);
        assert_eq!(data.errors.len(), 1);
    }

    #[tokio::test]
    async fn expired_session_is_not_swallowed() {
        let cache = PersistentCache::in_memory("crm_");
        let mut repo = MockGateway::new();
        repo.expect_dashboard()
            .times(1)
            .returning(|| Err(ApiError::SessionExpired));
        repo.expect_recent_activities().never();

        let result = load_dashboard(&repo, &user_with_role("sales"), &cache, TTL).await;

        assert!(matches!(result, Err(ServiceError::SessionExpired)));
    }

    #[tokio::test]
    async fn roles_without_permissions_are_rejected() {
        let cache = PersistentCache::in_memory("crm_");
        let mut repo = MockGateway::new();
        repo.expect_dashboard().never();

        let result = load_dashboard(&repo, &user_with_role("user"), &cache, TTL).await;

        assert!(matches!(result, Err(ServiceError::Unauthorized)));
    }

    #[tokio::test]
    async fn stats_are_reused_within_ttl() {
        let cache = PersistentCache::in_memory("crm_");
        let mut repo = MockGateway::new();
        repo.expect_dashboard()
            .times(1)
            .returning(|| Ok(json!({"customers": 12})));
        repo.expect_recent_activities()
            .times(2)
            .returning(|_| Ok(Vec::new()));
        let user = user_with_role("sales");

        let first = load_dashboard(&repo, &user, &cache, TTL).await.expect("first load");
        let second = load_dashboard(&repo, &user, &cache, TTL).await.expect("second load");

        assert_eq!(first.stats, json!({"customers": 12}));
        assert_eq!(second.stats, json!({"customers": 12}));
    }

    #[tokio::test]
    async fn failed_stats_are_not_cached() {
        let cache = PersistentCache::in_memory("crm_");
        let mut repo = MockGateway::new();
        repo.expect_dashboard()
            .times(1)
            .returning(|| Err(ApiError::from_status(500, None)));
        repo.expect_recent_activities().returning(|_| Ok(Vec::new()));

        load_dashboard(&repo, &user_with_role("sales"), &cache, TTL)
            .await
            .expect("dashboard renders");

        assert!(!cache.contains(keys::DASHBOARD_STATS).unwrap());
    }

    #[tokio::test]
    async fn unknown_report_falls_back_to_sales() {
        let mut repo = MockGateway::new();
        repo.expect_analytics()
            .withf(|report| report == "sales")
            .times(1)
            .returning(|_| Ok(json!({"total": 3})));

        let data = load_reports(&repo, &user_with_role("manager"), Some("secrets"))
            .await
            .expect("report loads");

        assert_eq!(data.report, "sales");
    }
}
