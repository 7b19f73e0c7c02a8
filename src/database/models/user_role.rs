use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::donor::normalize_email;
use super::enums::AppRole;
use super::InputError;
use crate::filter::{FieldValue, Listable};

/// One role held by a user. A user may hold several, each suspendable on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct UserRole {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_email: String,
    /// Absent only for `super_admin`
    pub organization_id: Option<Uuid>,
    pub role: AppRole,
    pub suspended: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRole {
    pub fn is_active(&self) -> bool {
        !self.suspended
    }

    pub fn validate(&self) -> Result<(), InputError> {
        match (self.role, self.organization_id) {
            (AppRole::SuperAdmin, _) | (_, Some(_)) => Ok(()),
            (_, None) => Err(InputError::MissingField("organization_id")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserRoleInput {
    pub user_id: Uuid,
    pub user_email: String,
    #[serde(default)]
    pub organization_id: Option<Uuid>,
    pub role: AppRole,
}

impl UserRoleInput {
    pub fn into_role(self) -> Result<UserRole, InputError> {
        let email = normalize_email(&self.user_email).ok_or_else(|| InputError::invalid("user_email", "not an email address"))?;
        let now = Utc::now();
        let role = UserRole {
            id: Uuid::new_v4(),
            user_id: self.user_id,
            user_email: email,
            organization_id: if self.role == AppRole::SuperAdmin { None } else { self.organization_id },
            role: self.role,
            suspended: false,
            created_at: now,
            updated_at: now,
        };
        role.validate()?;
        Ok(role)
    }
}

impl Listable for UserRole {
    fn field(&self, name: &str) -> FieldValue {
        match name {
            "id" => self.id.into(),
            "user_id" => self.user_id.into(),
            "user_email" | "email" => self.user_email.as_str().into(),
            "organization_id" => self.organization_id.into(),
            "role" => self.role.to_string().into(),
            "suspended" => self.suspended.into(),
            "created_at" => self.created_at.into(),
            "updated_at" => self.updated_at.into(),
            _ => FieldValue::Null,
        }
    }

    fn search_fields(&self) -> Vec<String> {
        vec![self.user_email.clone(), self.role.to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn organization_required_except_for_super_admin() {
        let input = UserRoleInput {
            user_id: Uuid::new_v4(),
            user_email: "Gabbai@Example.org".into(),
            organization_id: None,
            role: AppRole::Manager,
        };
        assert!(matches!(input.clone().into_role(), Err(InputError::MissingField("organization_id"))));

        let super_admin = UserRoleInput { role: AppRole::SuperAdmin, organization_id: Some(Uuid::new_v4()), ..input };
        let role = super_admin.into_role().unwrap();
        assert_eq!(role.organization_id, None);
        assert_eq!(role.user_email, "gabbai@example.org");
        assert!(role.is_active());
    }
}
