//! Quotes, contracts and orders share one CRUD surface and differ only in
//! their lifecycle actions.

use serde::Serialize;

use crate::models::catalog::ChoiceKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Quotes,
    Contracts,
    Orders,
}

/// A lifecycle transition offered on a resource detail page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResourceAction {
    pub name: &'static str,
    pub label: &'static str,
    /// The backend expects `{"reason": ...}` with this action.
    pub needs_reason: bool,
}

const fn action(name: &'static str, label: &'static str) -> ResourceAction {
    ResourceAction {
        name,
        label,
        needs_reason: false,
    }
}

const fn action_with_reason(name: &'static str, label: &'static str) -> ResourceAction {
    ResourceAction {
        name,
        label,
        needs_reason: true,
    }
}

const QUOTE_ACTIONS: &[ResourceAction] = &[
    action("send", "发送"),
    action("accept", "接受"),
    action_with_reason("reject", "拒绝"),
    action("copy", "复制"),
];

const CONTRACT_ACTIONS: &[ResourceAction] = &[
    action("sign", "签署"),
    action("start", "开始执行"),
    action("complete", "完成"),
    action_with_reason("terminate", "终止"),
];

const ORDER_ACTIONS: &[ResourceAction] = &[
    action("confirm", "确认"),
    action("process", "处理"),
    action("ship", "发货"),
    action("deliver", "交付"),
    action("complete", "完成"),
    action_with_reason("cancel", "取消"),
];

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [
        ResourceKind::Quotes,
        ResourceKind::Contracts,
        ResourceKind::Orders,
    ];

    /// Parses the URL segment, e.g. `quotes`.
    pub fn from_segment(segment: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.segment() == segment)
    }

    /// URL segment shared by the front end and the backend.
    pub fn segment(self) -> &'static str {
        match self {
            ResourceKind::Quotes => "quotes",
            ResourceKind::Contracts => "contracts",
            ResourceKind::Orders => "orders",
        }
    }

    /// Key of a single entity in detail responses.
    pub fn singular(self) -> &'static str {
        match self {
            ResourceKind::Quotes => "quote",
            ResourceKind::Contracts => "contract",
            ResourceKind::Orders => "order",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ResourceKind::Quotes => "报价管理",
            ResourceKind::Contracts => "合同管理",
            ResourceKind::Orders => "订单管理",
        }
    }

    pub fn status_kind(self) -> ChoiceKind {
        match self {
            ResourceKind::Quotes => ChoiceKind::QuoteStatus,
            ResourceKind::Contracts => ChoiceKind::ContractStatus,
            ResourceKind::Orders => ChoiceKind::OrderStatus,
        }
    }

    pub fn actions(self) -> &'static [ResourceAction] {
        match self {
            ResourceKind::Quotes => QUOTE_ACTIONS,
            ResourceKind::Contracts => CONTRACT_ACTIONS,
            ResourceKind::Orders => ORDER_ACTIONS,
        }
    }

    pub fn action(self, name: &str) -> Option<ResourceAction> {
        self.actions().iter().copied().find(|a| a.name == name)
    }

    /// Read-only related collection shown on the detail page.
    pub fn sub_resource(self) -> Option<&'static str> {
        match self {
            ResourceKind::Quotes => None,
            ResourceKind::Contracts => Some("payments"),
            ResourceKind::Orders => Some("tracking"),
        }
    }

    /// Filters accepted by the list page.
    pub fn filters(self) -> &'static [&'static str] {
        match self {
            ResourceKind::Quotes => &["search", "status", "customer_id", "priority"],
            ResourceKind::Contracts => &["search", "status", "customer_id"],
            ResourceKind::Orders => &["search", "status", "customer_id", "priority"],
        }
    }
}
