//! Frozen lookup tables shared by forms, templates and the API client.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// One selectable value of an enumerated field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub value: &'static str,
    pub label: &'static str,
    pub color: &'static str,
}

const fn choice(value: &'static str, label: &'static str, color: &'static str) -> Choice {
    Choice {
        value,
        label,
        color,
    }
}

/// Enumerated field families known to the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceKind {
    CustomerStatus,
    QuoteStatus,
    ContractStatus,
    OrderStatus,
    Priority,
    CustomerType,
    CustomerLevel,
    CustomerSource,
    Industry,
    UserRole,
}

pub const CUSTOMER_STATUS: &[Choice] = &[
    choice("active", "活跃", "success"),
    choice("inactive", "非活跃", "danger"),
    choice("potential", "潜在客户", "warning"),
];

pub const QUOTE_STATUS: &[Choice] = &[
    choice("draft", "草稿", "secondary"),
    choice("sent", "已发送", "info"),
    choice("accepted", "已接受", "success"),
    choice("rejected", "已拒绝", "danger"),
    choice("expired", "已过期", "warning"),
];

pub const CONTRACT_STATUS: &[Choice] = &[
    choice("draft", "草稿", "secondary"),
    choice("pending", "待签署", "warning"),
    choice("signed", "已签署", "info"),
    choice("executing", "执行中", "primary"),
    choice("completed", "已完成", "success"),
    choice("terminated", "已终止", "danger"),
];

pub const ORDER_STATUS: &[Choice] = &[
    choice("pending", "待确认", "warning"),
    choice("confirmed", "已确认", "info"),
    choice("processing", "处理中", "primary"),
    choice("shipped", "已发货", "info"),
    choice("delivered", "已交付", "success"),
    choice("completed", "已完成", "success"),
    choice("cancelled", "已取消", "danger"),
];

pub const PRIORITY: &[Choice] = &[
    choice("low", "低", "secondary"),
    choice("medium", "中", "warning"),
    choice("high", "高", "danger"),
    choice("urgent", "紧急", "danger"),
];

pub const CUSTOMER_TYPE: &[Choice] = &[
    choice("individual", "个人", "secondary"),
    choice("company", "企业", "secondary"),
];

pub const CUSTOMER_LEVEL: &[Choice] = &[
    choice("bronze", "铜牌客户", "warning"),
    choice("silver", "银牌客户", "secondary"),
    choice("gold", "金牌客户", "warning"),
    choice("platinum", "白金客户", "info"),
    choice("diamond", "钻石客户", "primary"),
];

pub const CUSTOMER_SOURCE: &[Choice] = &[
    choice("website", "官网", "secondary"),
    choice("referral", "推荐", "secondary"),
    choice("advertising", "广告", "secondary"),
    choice("exhibition", "展会", "secondary"),
    choice("cold_call", "电话营销", "secondary"),
    choice("social_media", "社交媒体", "secondary"),
    choice("other", "其他", "secondary"),
];

pub const INDUSTRY: &[Choice] = &[
    choice("technology", "科技", "secondary"),
    choice("finance", "金融", "secondary"),
    choice("healthcare", "医疗", "secondary"),
    choice("education", "教育", "secondary"),
    choice("manufacturing", "制造业", "secondary"),
    choice("retail", "零售", "secondary"),
    choice("real_estate", "房地产", "secondary"),
    choice("consulting", "咨询", "secondary"),
    choice("media", "媒体", "secondary"),
    choice("government", "政府", "secondary"),
    choice("other", "其他", "secondary"),
];

pub const USER_ROLE: &[Choice] = &[
    choice("admin", "管理员", "danger"),
    choice("manager", "经理", "primary"),
    choice("sales", "销售", "info"),
    choice("support", "客服", "secondary"),
];

impl ChoiceKind {
    pub fn choices(self) -> &'static [Choice] {
        match self {
            ChoiceKind::CustomerStatus => CUSTOMER_STATUS,
            ChoiceKind::QuoteStatus => QUOTE_STATUS,
            ChoiceKind::ContractStatus => CONTRACT_STATUS,
            ChoiceKind::OrderStatus => ORDER_STATUS,
            ChoiceKind::Priority => PRIORITY,
            ChoiceKind::CustomerType => CUSTOMER_TYPE,
            ChoiceKind::CustomerLevel => CUSTOMER_LEVEL,
            ChoiceKind::CustomerSource => CUSTOMER_SOURCE,
            ChoiceKind::Industry => INDUSTRY,
            ChoiceKind::UserRole => USER_ROLE,
        }
    }

    /// Parses the name used by templates, e.g. `customer_status`.
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name {
            "customer_status" | "customer" => ChoiceKind::CustomerStatus,
            "quote_status" | "quote" => ChoiceKind::QuoteStatus,
            "contract_status" | "contract" => ChoiceKind::ContractStatus,
            "order_status" | "order" => ChoiceKind::OrderStatus,
            "priority" => ChoiceKind::Priority,
            "customer_type" => ChoiceKind::CustomerType,
            "customer_level" => ChoiceKind::CustomerLevel,
            "customer_source" => ChoiceKind::CustomerSource,
            "industry" => ChoiceKind::Industry,
            "user_role" | "role" => ChoiceKind::UserRole,
            _ => return None,
        };
        Some(kind)
    }
}

pub fn lookup(kind: ChoiceKind, value: &str) -> Option<&'static Choice> {
    kind.choices().iter().find(|choice| choice.value == value)
}

/// Display data of a status badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub label: String,
    pub color: &'static str,
}

/// Unknown values render as a gray badge showing the raw value.
pub fn badge(kind: ChoiceKind, value: &str) -> Badge {
    match lookup(kind, value) {
        Some(choice) => Badge {
            label: choice.label.to_string(),
            color: choice.color,
        },
        None => Badge {
            label: value.to_string(),
            color: "secondary",
        },
    }
}

pub mod messages {
    pub const NETWORK_ERROR: &str = "网络连接失败，请检查网络设置";
    pub const SERVER_ERROR: &str = "服务器错误，请稍后重试";
    pub const UNAUTHORIZED: &str = "登录已过期，请重新登录";
    pub const FORBIDDEN: &str = "权限不足，无法执行此操作";
    pub const NOT_FOUND: &str = "请求的资源不存在";
    pub const VALIDATION_ERROR: &str = "数据验证失败";
    pub const UNKNOWN_ERROR: &str = "未知错误，请联系管理员";
    pub const TIMEOUT: &str = "请求超时";
    pub const NO_REFRESH_TOKEN: &str = "没有刷新令牌";

    pub const LOGIN: &str = "登录成功";
    pub const LOGOUT: &str = "退出成功";
    pub const REGISTER: &str = "注册成功";
    pub const CREATE: &str = "创建成功";
    pub const UPDATE: &str = "更新成功";
    pub const DELETE: &str = "删除成功";
    pub const SAVE: &str = "保存成功";
    pub const SEND: &str = "发送成功";

    pub const CONFIRM_DELETE: &str = "确定要删除这条记录吗？此操作不可恢复。";
    pub const CONFIRM_LOGOUT: &str = "确定要退出登录吗？";
}

pub const PASSWORD_MIN_LENGTH: usize = 6;
pub const USERNAME_MIN_LENGTH: usize = 3;
pub const USERNAME_MAX_LENGTH: usize = 20;

pub static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"));

pub static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^1[3-9]\d{9}$").expect("valid phone pattern"));

pub static USERNAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_]+$").expect("valid username pattern"));

static PASSWORD_CHARSET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z\d@$!%*?&]+$").expect("valid password pattern"));

/// Passwords need a lowercase letter, an uppercase letter and a digit drawn
/// from the allowed character set.
pub fn is_strong_password(password: &str) -> bool {
    password.chars().count() >= PASSWORD_MIN_LENGTH
        && PASSWORD_CHARSET.is_match(password)
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
}

/// Pages of the application and what they require.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAccess {
    Permission(&'static str),
    Role(&'static str),
}

pub fn page_access(page: &str) -> Option<PageAccess> {
    match page {
        "dashboard" | "customers" | "quotes" | "contracts" | "orders" | "reports" => {
            Some(PageAccess::Permission("read"))
        }
        "settings" => Some(PageAccess::Role("admin")),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_status_renders_gray_raw_value() {
        let known = badge(ChoiceKind::OrderStatus, "shipped");
        assert_eq!(known.label, "已发货");
        assert_eq!(known.color, "info");

        let unknown = badge(ChoiceKind::OrderStatus, "lost");
        assert_eq!(unknown.label, "lost");
        assert_eq!(unknown.color, "secondary");
    }

    #[test]
    fn password_strength_requires_mixed_case_and_digit() {
        assert!(is_strong_password("Secret1"));
        assert!(!is_strong_password("secret1"));
        assert!(!is_strong_password("SECRET1"));
        assert!(!is_strong_password("Secret"));
        assert!(!is_strong_password("Se1"));
        assert!(!is_strong_password("Secret 1"));
    }

    #[test]
    fn validation_patterns() {
        assert!(EMAIL_PATTERN.is_match("alice@example.com"));
        assert!(!EMAIL_PATTERN.is_match("alice@example"));
        assert!(PHONE_PATTERN.is_match("13800138000"));
        assert!(!PHONE_PATTERN.is_match("12800138000"));
        assert!(USERNAME_PATTERN.is_match("alice_01"));
        assert!(!USERNAME_PATTERN.is_match("alice-01"));
    }

    #[test]
    fn settings_page_needs_admin_role() {
        assert_eq!(page_access("settings"), Some(PageAccess::Role("admin")));
        assert_eq!(page_access("orders"), Some(PageAccess::Permission("read")));
        assert_eq!(page_access("unknown"), None);
    }
}
