//! Presentation helpers: notifications and value formatting for templates.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;

use crate::models::config::NotificationConfig;

pub const CURRENCY_SYMBOL: &str = "¥";
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const DATE_ONLY_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Error,
    Warning,
    Info,
}

impl NotificationLevel {
    pub fn title(self) -> &'static str {
        match self {
            NotificationLevel::Success => "成功",
            NotificationLevel::Error => "错误",
            NotificationLevel::Warning => "警告",
            NotificationLevel::Info => "提示",
        }
    }

    pub fn duration_ms(self, config: &NotificationConfig) -> u64 {
        match self {
            NotificationLevel::Success => config.success_ms,
            NotificationLevel::Error => config.error_ms,
            NotificationLevel::Warning => config.warning_ms,
            NotificationLevel::Info => config.info_ms,
        }
    }
}

/// A toast shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: &'static str,
    pub message: String,
    pub duration_ms: u64,
}

impl Notification {
    pub fn new(level: NotificationLevel, message: impl Into<String>, config: &NotificationConfig) -> Self {
        Self {
            level,
            title: level.title(),
            message: message.into(),
            duration_ms: level.duration_ms(config),
        }
    }
}

/// Placeholder shown instead of an empty or failed list.
#[derive(Debug, Clone, Serialize)]
pub struct Placeholder {
    pub message: String,
    pub icon: &'static str,
}

impl Placeholder {
    pub fn empty(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            icon: "fas fa-inbox",
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            icon: "fas fa-exclamation-triangle",
        }
    }
}

/// `¥1,234.50`. Anything that is not a number renders as an empty string.
pub fn format_currency(amount: &serde_json::Value) -> String {
    let number = match amount {
        serde_json::Value::Number(number) => number.as_f64(),
        serde_json::Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    let Some(number) = number.filter(|n| n.is_finite()) else {
        return String::new();
    };

    let fixed = format!("{:.2}", number.abs());
    let (integer, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (index, digit) in integer.chars().enumerate() {
        if index > 0 && (integer.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if number < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{CURRENCY_SYMBOL}{grouped}.{fraction}")
}

/// Accepts RFC 3339 and the naive ISO timestamps the backend emits. Naive
/// values are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, DATE_ONLY_FORMAT)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}

pub fn format_datetime(raw: &str, format: &str) -> String {
    parse_timestamp(raw)
        .map(|timestamp| timestamp.format(format).to_string())
        .unwrap_or_default()
}

/// 刚刚, N分钟前, N小时前 and N天前 within a week, the date after that.
pub fn relative_time(raw: &str, now: DateTime<Utc>) -> String {
    let Some(timestamp) = parse_timestamp(raw) else {
        return String::new();
    };

    let seconds = (now - timestamp).num_seconds();
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    if seconds < 60 {
        "刚刚".to_string()
    } else if minutes < 60 {
        format!("{minutes}分钟前")
    } else if hours < 24 {
        format!("{hours}小时前")
    } else if days < 7 {
        format!("{days}天前")
    } else {
        timestamp.format(DATE_ONLY_FORMAT).to_string()
    }
}

#[cfg(feature = "server")]
pub use filters::{alert_level_to_str, notification_level, register_filters};

#[cfg(feature = "server")]
mod filters {
    use std::collections::HashMap;

    use actix_web_flash_messages::Level;
    use chrono::Utc;
    use tera::{Tera, Value};

    use super::{DISPLAY_FORMAT, NotificationLevel, format_currency, format_datetime, relative_time};
    use crate::models::catalog::{ChoiceKind, badge};

    pub fn alert_level_to_str(level: &Level) -> &'static str {
        match level {
            Level::Error => "danger",
            Level::Warning => "warning",
            Level::Success => "success",
            _ => "info",
        }
    }

    pub fn notification_level(level: &Level) -> NotificationLevel {
        match level {
            Level::Error => NotificationLevel::Error,
            Level::Warning => NotificationLevel::Warning,
            Level::Success => NotificationLevel::Success,
            _ => NotificationLevel::Info,
        }
    }

    fn text(value: &Value) -> String {
        match value {
            Value::String(text) => text.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }

    /// `{{ order.status | status_badge(kind="order") | safe }}`
    fn status_badge(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
        let kind_name = args
            .get("kind")
            .and_then(Value::as_str)
            .unwrap_or("customer_status");
        let kind = ChoiceKind::from_name(kind_name)
            .ok_or_else(|| tera::Error::msg(format!("unknown badge kind `{kind_name}`")))?;

        let raw = text(value);
        let badge = badge(kind, &raw);
        Ok(Value::String(format!(
            r#"<span class="badge bg-{}">{}</span>"#,
            badge.color,
            tera::escape_html(&badge.label)
        )))
    }

    fn currency(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
        Ok(Value::String(format_currency(value)))
    }

    fn datetime(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
        let format = args
            .get("format")
            .and_then(Value::as_str)
            .unwrap_or(DISPLAY_FORMAT);
        Ok(Value::String(format_datetime(&text(value), format)))
    }

    fn relative(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
        Ok(Value::String(relative_time(&text(value), Utc::now())))
    }

    pub fn register_filters(tera: &mut Tera) {
        tera.register_filter("status_badge", status_badge);
        tera.register_filter("currency", currency);
        tera.register_filter("datetime", datetime);
        tera.register_filter("relative_time", relative);
    }

    #[cfg(test)]
    mod tests {
        use serde_json::json;
        use tera::Context;

        use super::*;

        #[test]
        fn badge_filter_escapes_unknown_values() {
            let mut tera = Tera::default();
            register_filters(&mut tera);
            let mut context = Context::new();
            context.insert("status", "<b>lost</b>");

            let rendered = tera
                .render_str(
                    r#"{{ status | status_badge(kind="order") | safe }}"#,
                    &context,
                )
                .expect("renders");

            assert_eq!(
                rendered,
                r#"<span class="badge bg-secondary">&lt;b&gt;lost&lt;&#x2F;b&gt;</span>"#
            );
        }

        #[test]
        fn currency_filter_renders_in_template() {
            let mut tera = Tera::default();
            register_filters(&mut tera);
            let mut context = Context::new();
            context.insert("amount", &json!(1234567.5));

            let rendered = tera
                .render_str("{{ amount | currency }}", &context)
                .expect("renders");

            assert_eq!(rendered, "¥1,234,567.50");
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn currency_formatting() {
        assert_eq!(format_currency(&json!(0)), "¥0.00");
        assert_eq!(format_currency(&json!(999.999)), "¥1,000.00");
        assert_eq!(format_currency(&json!("2500")), "¥2,500.00");
        assert_eq!(format_currency(&json!(-1234.5)), "-¥1,234.50");
        assert_eq!(format_currency(&json!(null)), "");
        assert_eq!(format_currency(&json!("abc")), "");
    }

    #[test]
    fn relative_time_buckets() {
        let now = parse_timestamp("2024-05-20T12:00:00").expect("parses");

        assert_eq!(relative_time("2024-05-20T11:59:30", now), "刚刚");
        assert_eq!(relative_time("2024-05-20T11:15:00", now), "45分钟前");
        assert_eq!(relative_time("2024-05-20T09:00:00.123456", now), "3小时前");
        assert_eq!(relative_time("2024-05-18T12:00:00", now), "2天前");
        assert_eq!(relative_time("2024-05-01T12:00:00", now), "2024-05-01");
        assert_eq!(relative_time("", now), "");
    }

    #[test]
    fn datetime_accepts_backend_formats() {
        assert_eq!(
            format_datetime("2024-05-20T08:30:05.000123", DISPLAY_FORMAT),
            "2024-05-20 08:30:05"
        );
        assert_eq!(
            format_datetime("2024-05-20T08:30:05+00:00", DATE_ONLY_FORMAT),
            "2024-05-20"
        );
        assert_eq!(format_datetime("not a date", DISPLAY_FORMAT), "");
    }

    #[test]
    fn notification_durations_follow_level() {
        let config = NotificationConfig::default();

        let error = Notification::new(NotificationLevel::Error, "保存失败", &config);
        let success = Notification::new(NotificationLevel::Success, "保存成功", &config);

        assert_eq!(error.duration_ms, 8_000);
        assert_eq!(error.title, "错误");
        assert_eq!(success.duration_ms, 3_000);
    }
}
