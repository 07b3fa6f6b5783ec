//! DTOs shaped for the customer pages.

use serde::Serialize;
use serde_json::Value;

use crate::forms::customer::CustomerForm;
use crate::pagination::{ListState, Paginated};

/// Data required to render the customer list.
pub struct CustomerListData {
    pub customers: Paginated<Value>,
    pub state: ListState,
    /// Aggregate counters, absent when the backend could not provide them.
    pub stats: Option<Value>,
}

/// Data required to render the customer details page.
pub struct CustomerPageData {
    pub customer: Value,
}

/// Pre-filled customer editor; `customer_id` is `None` for a new customer.
pub struct CustomerFormData {
    pub form: CustomerForm,
    pub customer_id: Option<i64>,
}

/// Live search result entry returned by `/api/v1/customers/search`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CustomerSuggestion {
    pub id: Value,
    pub name: String,
    pub company: Option<String>,
}

impl CustomerSuggestion {
    pub fn from_customer(customer: &Value) -> Self {
        let text = |key: &str| {
            customer
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
                .filter(|text| !text.is_empty())
        };
        Self {
            id: customer.get("id").cloned().unwrap_or(Value::Null),
            name: text("name").unwrap_or_default(),
            company: text("company"),
        }
    }
}

/// Outcome of a debounced live search.
#[derive(Debug, Serialize, PartialEq)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<CustomerSuggestion>,
    /// A newer search from the same session replaced this one.
    pub superseded: bool,
}
