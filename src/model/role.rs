use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Teacher,
    Member,
}

impl Role {
    pub fn parse(value: &str) -> Option<Self> {
        Self::from_str(value).ok()
    }

    /// Roles allowed to mark and review attendance of other users
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Admin | Role::Manager | Role::Teacher)
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Member
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stored_role_names() {
        assert_eq!(Role::parse("teacher"), Some(Role::Teacher));
        assert_eq!(Role::parse("member"), Some(Role::Member));
        assert_eq!(Role::parse("hr"), None);
        assert_eq!(Role::Manager.as_ref(), "manager");
    }

    #[test]
    fn only_admin_manager_and_teacher_are_staff() {
        assert!(Role::Admin.is_staff());
        assert!(Role::Manager.is_staff());
        assert!(Role::Teacher.is_staff());
        assert!(!Role::Member.is_staff());
    }
}
