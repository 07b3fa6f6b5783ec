use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::forms::{FormError, invalid, not_blank, validate_in_order};
use crate::models::catalog::{
    EMAIL_PATTERN, PASSWORD_MIN_LENGTH, PHONE_PATTERN, USERNAME_MAX_LENGTH, USERNAME_MIN_LENGTH,
    USERNAME_PATTERN, is_strong_password,
};

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
/// Credentials submitted on the login page.
pub struct LoginForm {
    #[validate(custom(function = "not_blank", message = "请输入用户名"))]
    pub username: String,
    #[validate(custom(function = "not_blank", message = "请输入密码"))]
    pub password: String,
}

impl LoginForm {
    pub fn validate_fields(&self) -> Result<(), FormError> {
        validate_in_order(self, &["username", "password"])
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
/// Data submitted on the registration page.
pub struct RegisterForm {
    #[validate(custom(function = "validate_username"))]
    pub username: String,
    #[validate(custom(function = "validate_email"))]
    pub email: String,
    #[validate(custom(function = "not_blank", message = "请输入真实姓名"))]
    pub real_name: String,
    #[serde(default)]
    #[validate(custom(function = "validate_optional_phone"))]
    pub phone: String,
    #[validate(custom(function = "validate_password"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "两次输入的密码不一致"))]
    pub confirm_password: String,
}

/// Registration data as sent to the backend. The confirmation never leaves
/// the front end.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegisterPayload {
    pub username: String,
    pub email: String,
    pub real_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub password: String,
}

impl TryFrom<RegisterForm> for RegisterPayload {
    type Error = FormError;

    fn try_from(form: RegisterForm) -> Result<Self, Self::Error> {
        validate_in_order(
            &form,
            &[
                "username",
                "email",
                "real_name",
                "phone",
                "password",
                "confirm_password",
            ],
        )?;

        let phone = Some(form.phone.trim().to_string()).filter(|phone| !phone.is_empty());

        Ok(Self {
            username: form.username.trim().to_string(),
            email: form.email.trim().to_string(),
            real_name: form.real_name.trim().to_string(),
            phone,
            password: form.password,
        })
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
/// Profile fields the user may edit themselves.
pub struct ProfileForm {
    #[validate(custom(function = "validate_email"))]
    pub email: String,
    #[serde(default)]
    pub real_name: String,
    #[serde(default)]
    #[validate(custom(function = "validate_optional_phone"))]
    pub phone: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub position: String,
}

impl ProfileForm {
    /// Validates and converts into the JSON body with blank fields removed.
    pub fn into_payload(self) -> Result<serde_json::Value, FormError> {
        validate_in_order(&self, &["email", "real_name", "phone"])?;
        Ok(super::strip_empty(serde_json::json!({
            "email": self.email.trim(),
            "real_name": self.real_name.trim(),
            "phone": self.phone.trim(),
            "department": self.department.trim(),
            "position": self.position.trim(),
        })))
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ChangePasswordForm {
    #[validate(custom(function = "not_blank", message = "请输入当前密码"))]
    pub old_password: String,
    #[validate(custom(function = "validate_password"))]
    pub new_password: String,
    #[validate(must_match(other = "new_password", message = "两次输入的密码不一致"))]
    pub confirm_password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangePasswordPayload {
    pub old_password: String,
    pub new_password: String,
}

impl TryFrom<ChangePasswordForm> for ChangePasswordPayload {
    type Error = FormError;

    fn try_from(form: ChangePasswordForm) -> Result<Self, Self::Error> {
        validate_in_order(&form, &["old_password", "new_password", "confirm_password"])?;
        Ok(Self {
            old_password: form.old_password,
            new_password: form.new_password,
        })
    }
}

fn validate_username(username: &str) -> Result<(), ValidationError> {
    let length = username.chars().count();
    if username.is_empty() {
        Err(invalid("用户名不能为空"))
    } else if length < USERNAME_MIN_LENGTH {
        Err(invalid("用户名长度不能少于3位"))
    } else if length > USERNAME_MAX_LENGTH {
        Err(invalid("用户名长度不能超过20位"))
    } else if !USERNAME_PATTERN.is_match(username) {
        Err(invalid("用户名只能包含字母、数字和下划线"))
    } else {
        Ok(())
    }
}

fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    if email.is_empty() {
        Err(invalid("请输入邮箱"))
    } else if !EMAIL_PATTERN.is_match(email) {
        Err(invalid("邮箱格式不正确"))
    } else {
        Ok(())
    }
}

fn validate_optional_phone(phone: &str) -> Result<(), ValidationError> {
    let phone = phone.trim();
    if phone.is_empty() || PHONE_PATTERN.is_match(phone) {
        Ok(())
    } else {
        Err(invalid("手机号格式不正确"))
    }
}

fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        Err(invalid("密码不能为空"))
    } else if password.chars().count() < PASSWORD_MIN_LENGTH {
        Err(invalid("密码长度不能少于6位"))
    } else if !is_strong_password(password) {
        Err(invalid("密码必须包含大小写字母和数字"))
    } else {
        Ok(())
    }
}
