use serde_json::Value;

pub struct SettingsPageData {
    pub system: Value,
    pub user: Value,
}
