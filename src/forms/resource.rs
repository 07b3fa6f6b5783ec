use serde::Deserialize;
use serde_json::{Map, Value};

use crate::domain::types::Reason;
use crate::forms::{FormError, strip_empty};

#[derive(Debug, Clone, Default, Deserialize)]
/// Generic editor for quotes, contracts and orders: parallel lists of field
/// names and values.
pub struct ResourceForm {
    #[serde(default)]
    pub field: Vec<String>,
    #[serde(default)]
    pub value: Vec<String>,
}

impl ResourceForm {
    /// Builds the JSON body. Numbers and booleans are sent as such, blank
    /// values are dropped.
    pub fn into_payload(self) -> Result<Value, FormError> {
        let mut document = Map::new();
        for (field, value) in self.field.into_iter().zip(self.value) {
            let field = field.trim();
            if field.is_empty() {
                continue;
            }
            if document.contains_key(field) {
                return Err(FormError::InvalidDocument(format!("字段重复: {field}")));
            }
            document.insert(field.to_string(), typed_value(value.trim()));
        }

        let document = strip_empty(Value::Object(document));
        if document.as_object().is_some_and(Map::is_empty) {
            return Err(FormError::Invalid(vec![
                crate::models::catalog::messages::VALIDATION_ERROR.to_string(),
            ]));
        }
        Ok(document)
    }

    /// Pre-fills the editor from a backend document, skipping nested values.
    pub fn from_document(document: &Value) -> Self {
        let mut form = Self::default();
        if let Some(map) = document.as_object() {
            for (key, value) in map {
                let text = match value {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    _ => continue,
                };
                form.field.push(key.clone());
                form.value.push(text);
            }
        }
        form
    }
}

fn typed_value(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ (Value::Number(_) | Value::Bool(_))) => value,
        _ => Value::String(raw.to_string()),
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
/// Reason attached to reject, cancel and terminate actions.
pub struct ReasonForm {
    #[serde(default)]
    pub reason: String,
}

impl ReasonForm {
    pub fn reason(&self) -> Result<Reason, FormError> {
        Reason::new(self.reason.as_str())
            .map_err(|_| FormError::Invalid(vec!["请输入原因".to_string()]))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
/// Submitted by the delete confirmation page.
pub struct DeleteForm {
    #[serde(default)]
    pub confirm: Option<String>,
}

impl DeleteForm {
    pub fn confirmed() -> Self {
        Self {
            confirm: Some("yes".to_string()),
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(
            self.confirm.as_deref().map(str::trim),
            Some("yes" | "true" | "on" | "1")
        )
    }
}
