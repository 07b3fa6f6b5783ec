use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use validator::{Validate, ValidationError};

use crate::domain::types::CleanText;
use crate::forms::{FormError, invalid, not_blank, strip_empty, validate_in_order};
use crate::models::catalog::EMAIL_PATTERN;

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
/// Customer editor fields. Create and update submit the same shape.
pub struct CustomerForm {
    #[validate(custom(function = "not_blank", message = "请输入客户名称"))]
    pub name: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub industry: String,
    #[serde(default, rename = "type")]
    pub customer_type: String,
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    #[validate(custom(function = "validate_optional_email"))]
    pub email: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub credit_limit: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub notes: String,
    /// Comma separated.
    #[serde(default)]
    pub tags: String,
}

impl CustomerForm {
    /// Pre-fills the editor from a backend customer document.
    pub fn from_customer(customer: &Value) -> Self {
        let text = |key: &str| match customer.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(", "),
            Some(other) => other.to_string(),
        };

        Self {
            name: text("name"),
            company: text("company"),
            industry: text("industry"),
            customer_type: text("type"),
            contact: text("contact"),
            phone: text("phone"),
            email: text("email"),
            address: text("address"),
            source: text("source"),
            level: text("level"),
            status: text("status"),
            credit_limit: text("credit_limit"),
            description: text("description"),
            notes: text("notes"),
            tags: text("tags"),
        }
    }

    /// Validates the form and builds the request body with blank fields removed.
    pub fn into_payload(self) -> Result<Value, FormError> {
        validate_in_order(&self, &["name", "email"])?;

        let credit_limit = match self.credit_limit.trim() {
            "" => Value::Null,
            raw => raw
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .map(Value::from)
                .ok_or(FormError::InvalidNumber("信用额度"))?,
        };

        let tags: Vec<String> = self
            .tags
            .split([',', '，'])
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect();
        let tags = if tags.is_empty() {
            Value::Null
        } else {
            json!(tags)
        };

        Ok(strip_empty(json!({
            "name": self.name.trim(),
            "company": self.company.trim(),
            "industry": self.industry.trim(),
            "type": self.customer_type.trim(),
            "contact": self.contact.trim(),
            "phone": self.phone.trim(),
            "email": self.email.trim(),
            "address": self.address.trim(),
            "source": self.source.trim(),
            "level": self.level.trim(),
            "status": self.status.trim(),
            "credit_limit": credit_limit,
            "description": CleanText::new(self.description).into_inner(),
            "notes": CleanText::new(self.notes).into_inner(),
            "tags": tags,
        })))
    }
}

fn validate_optional_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    if email.is_empty() || EMAIL_PATTERN.is_match(email) {
        Ok(())
    } else {
        Err(invalid("邮箱格式不正确"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_strips_blank_fields_and_parses_numbers() {
        let form = CustomerForm {
            name: " Acme ".to_string(),
            customer_type: "company".to_string(),
            credit_limit: "1500.5".to_string(),
            tags: "vip， north ,".to_string(),
            notes: "<b>call back</b>".to_string(),
            ..CustomerForm::default()
        };

        let payload = form.into_payload().expect("valid form");

        assert_eq!(
            payload,
            json!({
                "name": "Acme",
                "type": "company",
                "credit_limit": 1500.5,
                "tags": ["vip", "north"],
                "notes": "<b>call back</b>",
            })
        );
    }

    #[test]
    fn name_is_required() {
        let err = CustomerForm::default().into_payload().expect_err("name missing");
        assert_eq!(err.first_message(), "请输入客户名称");
    }

    #[test]
    fn credit_limit_must_be_numeric() {
        let form = CustomerForm {
            name: "Acme".to_string(),
            credit_limit: "lots".to_string(),
            ..CustomerForm::default()
        };

        assert_eq!(form.into_payload(), Err(FormError::InvalidNumber("信用额度")));
    }

    #[test]
    fn editor_prefills_from_document() {
        let form = CustomerForm::from_customer(&json!({
            "id": 3,
            "name": "Acme",
            "type": "company",
            "credit_limit": 2000.0,
            "tags": ["a", "b"],
            "email": null
        }));

        assert_eq!(form.name, "Acme");
        assert_eq!(form.customer_type, "company");
        assert_eq!(form.credit_limit, "2000.0");
        assert_eq!(form.tags, "a, b");
        assert_eq!(form.email, "");
    }
}
