use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::ServiceError;
use crate::database::models::{AppRole, UserRole, UserRoleInput};
use crate::database::Store;
use crate::types::OrgScope;

pub struct RoleService {
    store: Arc<dyn Store>,
}

impl RoleService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Members currently holding at least one active role in the organization
    pub async fn seats_used(&self, organization_id: Uuid) -> Result<usize, ServiceError> {
        let roles = self.store.list_roles(&OrgScope::Organization(organization_id)).await?;
        let users: HashSet<Uuid> = roles.iter().filter(|r| r.is_active()).map(|r| r.user_id).collect();
        Ok(users.len())
    }

    pub async fn assign(&self, input: UserRoleInput) -> Result<UserRole, ServiceError> {
        let role = input.into_role()?;

        let held = self.store.list_roles_for_user(role.user_id).await?;
        if held.iter().any(|r| r.role == role.role && r.organization_id == role.organization_id) {
            return Err(ServiceError::DuplicateRole { user_id: role.user_id, role: role.role.to_string() });
        }
        if let Some(organization_id) = role.organization_id {
            self.check_capacity(organization_id, role.user_id, &held).await?;
        }

        self.store.insert_role(&role).await?;
        info!("Assigned {} to {} in {}", role.role, role.user_email, scope_label(role.organization_id));
        Ok(role)
    }

    /// Unsuspending takes a seat again, so capacity is rechecked
    pub async fn set_suspended(&self, role_id: Uuid, suspended: bool) -> Result<UserRole, ServiceError> {
        let mut role = self.store.get_role(role_id).await?;
        if role.suspended == suspended {
            return Ok(role);
        }
        if !suspended {
            if let Some(organization_id) = role.organization_id {
                let held = self.store.list_roles_for_user(role.user_id).await?;
                self.check_capacity(organization_id, role.user_id, &held).await?;
            }
        }
        role.suspended = suspended;
        role.updated_at = Utc::now();
        self.store.update_role(&role).await?;
        info!("{} {} role of {}", if suspended { "Suspended" } else { "Restored" }, role.role, role.user_email);
        Ok(role)
    }

    pub async fn active_roles(&self, user_id: Uuid) -> Result<Vec<UserRole>, ServiceError> {
        let roles = self.store.list_roles_for_user(user_id).await?;
        Ok(roles.into_iter().filter(UserRole::is_active).collect())
    }

    pub async fn is_super_admin(&self, user_id: Uuid) -> Result<bool, ServiceError> {
        Ok(self.active_roles(user_id).await?.iter().any(|r| r.role == AppRole::SuperAdmin))
    }

    /// A user already seated in the organization does not take another seat
    async fn check_capacity(&self, organization_id: Uuid, user_id: Uuid, held: &[UserRole]) -> Result<(), ServiceError> {
        let organization = self.store.get_organization(organization_id).await?;
        let Some(capacity) = organization.effective_capacity() else {
            return Ok(());
        };
        let seated = held.iter().any(|r| r.is_active() && r.organization_id == Some(organization_id));
        if seated {
            return Ok(());
        }
        let used = self.seats_used(organization_id).await?;
        debug!("Organization {} uses {} of {} seats", organization_id, used, capacity);
        if used >= capacity {
            return Err(ServiceError::CapacityReached { organization_id, capacity });
        }
        Ok(())
    }
}

fn scope_label(organization_id: Option<Uuid>) -> String {
    organization_id.map_or_else(|| "all organizations".to_string(), |id| id.to_string())
}
