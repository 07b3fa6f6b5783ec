//! DTOs for the dashboard and report pages.

use serde_json::Value;

/// Data required to render the dashboard. Each part degrades to empty on
/// its own when the backend fails to provide it.
pub struct DashboardPageData {
    pub stats: Value,
    pub activities: Vec<Value>,
    /// Messages of the parts that failed to load.
    pub errors: Vec<String>,
}

pub struct ReportPageData {
    pub report: &'static str,
    pub reports: &'static [&'static str],
    pub data: Value,
}
