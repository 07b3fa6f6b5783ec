//! DTOs for the quote, contract and order pages.

use serde_json::Value;

use crate::domain::resource::{ResourceAction, ResourceKind};
use crate::pagination::{ListState, Paginated};

pub struct ResourceListData {
    pub kind: ResourceKind,
    pub items: Paginated<Value>,
    pub state: ListState,
}

pub struct ResourcePageData {
    pub kind: ResourceKind,
    pub resource: Value,
    /// Contract payments or order tracking entries.
    pub related: Option<Value>,
    /// Actions the current user may perform.
    pub actions: Vec<ResourceAction>,
}

/// Outcome of a create, update or action call, for redirecting.
pub struct ResourceOutcome {
    pub kind: ResourceKind,
    pub id: Option<i64>,
}
