//! Role to permission table.

use serde::Serialize;

use crate::domain::user::User;
use crate::models::catalog::{PageAccess, page_access};

pub const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Read,
    Write,
    Delete,
}

impl Permission {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "read" => Some(Permission::Read),
            "write" => Some(Permission::Write),
            "delete" => Some(Permission::Delete),
            _ => None,
        }
    }
}

/// Permissions of a non-admin role. Unknown roles get none.
pub fn role_permissions(role: &str) -> &'static [Permission] {
    match role {
        "manager" => &[Permission::Read, Permission::Write, Permission::Delete],
        "sales" => &[Permission::Read, Permission::Write],
        "support" => &[Permission::Read],
        _ => &[],
    }
}

/// `admin` implies every permission.
pub fn has_permission(user: &User, permission: Permission) -> bool {
    user.role == ADMIN_ROLE || role_permissions(&user.role).contains(&permission)
}

/// Exact role comparison; `admin` does not imply other roles.
pub fn has_role(user: &User, role: &str) -> bool {
    user.role == role
}

pub fn can_access_page(user: &User, page: &str) -> bool {
    match page_access(page) {
        Some(PageAccess::Permission(name)) => {
            Permission::from_name(name).is_some_and(|permission| has_permission(user, permission))
        }
        Some(PageAccess::Role(role)) => has_role(user, role),
        None => false,
    }
}

/// Navigation flags for templates.
#[derive(Debug, Clone, Serialize)]
pub struct Capabilities {
    pub read: bool,
    pub write: bool,
    pub delete: bool,
    pub admin: bool,
}

impl Capabilities {
    pub fn of(user: &User) -> Self {
        Self {
            read: has_permission(user, Permission::Read),
            write: has_permission(user, Permission::Write),
            delete: has_permission(user, Permission::Delete),
            admin: has_role(user, ADMIN_ROLE),
        }
    }
}

#[cfg(test)]
pub(crate) fn user_with_role(role: &str) -> User {
    User {
        id: 1,
        username: format!("{role}_user"),
        role: role.to_string(),
        real_name: None,
        email: None,
        phone: None,
        department: None,
        position: None,
        avatar: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_has_everything() {
        let admin = user_with_role("admin");
        assert!(has_permission(&admin, Permission::Delete));
        assert!(can_access_page(&admin, "settings"));
    }

    #[test]
    fn table_per_role() {
        let manager = user_with_role("manager");
        let sales = user_with_role("sales");
        let support = user_with_role("support");

        assert!(has_permission(&manager, Permission::Delete));
        assert!(has_permission(&sales, Permission::Write));
        assert!(!has_permission(&sales, Permission::Delete));
        assert!(has_permission(&support, Permission::Read));
        assert!(!has_permission(&support, Permission::Write));
    }

    #[test]
    fn unknown_roles_have_no_permissions() {
        let user = user_with_role("user");
        assert!(!has_permission(&user, Permission::Read));
        assert!(!can_access_page(&user, "customers"));
    }

    #[test]
    fn role_check_is_exact() {
        let admin = user_with_role("admin");
        assert!(!has_role(&admin, "manager"));
        assert!(!can_access_page(&user_with_role("manager"), "settings"));
    }
}
