use async_trait::async_trait;
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::{Donation, Donor, Organization, Pledge, Setting, UserRole, Yahrzeit};
use crate::types::OrgScope;

/// Backend seen by services, handlers and the import pipeline.
///
/// Reads take an `OrgScope`; a record outside the scope is reported as
/// `NotFound`. Writes carry their organization on the record itself.
#[async_trait]
pub trait Store: Send + Sync {
    async fn health_check(&self) -> Result<(), DatabaseError>;

    // Donors
    async fn list_donors(&self, scope: &OrgScope) -> Result<Vec<Donor>, DatabaseError>;
    async fn get_donor(&self, scope: &OrgScope, id: Uuid) -> Result<Donor, DatabaseError>;
    async fn find_donor_by_phone(&self, organization_id: Uuid, phone: &str) -> Result<Option<Donor>, DatabaseError>;
    async fn find_donor_by_email(&self, organization_id: Uuid, email: &str) -> Result<Option<Donor>, DatabaseError>;
    async fn insert_donor(&self, donor: &Donor) -> Result<(), DatabaseError>;
    async fn update_donor(&self, donor: &Donor) -> Result<(), DatabaseError>;
    async fn delete_donor(&self, scope: &OrgScope, id: Uuid) -> Result<(), DatabaseError>;

    // Donations (payments are donations with a pledge)
    async fn list_donations(&self, scope: &OrgScope) -> Result<Vec<Donation>, DatabaseError>;
    async fn get_donation(&self, scope: &OrgScope, id: Uuid) -> Result<Donation, DatabaseError>;
    async fn insert_donation(&self, donation: &Donation) -> Result<(), DatabaseError>;
    async fn update_donation(&self, donation: &Donation) -> Result<(), DatabaseError>;
    async fn delete_donation(&self, scope: &OrgScope, id: Uuid) -> Result<(), DatabaseError>;

    // Pledges
    async fn list_pledges(&self, scope: &OrgScope) -> Result<Vec<Pledge>, DatabaseError>;
    async fn get_pledge(&self, scope: &OrgScope, id: Uuid) -> Result<Pledge, DatabaseError>;
    async fn insert_pledge(&self, pledge: &Pledge) -> Result<(), DatabaseError>;
    async fn update_pledge(&self, pledge: &Pledge) -> Result<(), DatabaseError>;
    async fn delete_pledge(&self, scope: &OrgScope, id: Uuid) -> Result<(), DatabaseError>;

    // Yahrzeits
    async fn list_yahrzeits(&self, scope: &OrgScope) -> Result<Vec<Yahrzeit>, DatabaseError>;
    async fn get_yahrzeit(&self, scope: &OrgScope, id: Uuid) -> Result<Yahrzeit, DatabaseError>;
    async fn insert_yahrzeit(&self, yahrzeit: &Yahrzeit) -> Result<(), DatabaseError>;
    async fn update_yahrzeit(&self, yahrzeit: &Yahrzeit) -> Result<(), DatabaseError>;
    async fn delete_yahrzeit(&self, scope: &OrgScope, id: Uuid) -> Result<(), DatabaseError>;

    // Organizations
    async fn list_organizations(&self, scope: &OrgScope) -> Result<Vec<Organization>, DatabaseError>;
    async fn get_organization(&self, id: Uuid) -> Result<Organization, DatabaseError>;
    async fn insert_organization(&self, organization: &Organization) -> Result<(), DatabaseError>;
    async fn update_organization(&self, organization: &Organization) -> Result<(), DatabaseError>;

    // Roles
    /// Roles attached to organizations in scope; `All` also returns global super-admin roles
    async fn list_roles(&self, scope: &OrgScope) -> Result<Vec<UserRole>, DatabaseError>;
    async fn list_roles_for_user(&self, user_id: Uuid) -> Result<Vec<UserRole>, DatabaseError>;
    async fn get_role(&self, id: Uuid) -> Result<UserRole, DatabaseError>;
    async fn insert_role(&self, role: &UserRole) -> Result<(), DatabaseError>;
    async fn update_role(&self, role: &UserRole) -> Result<(), DatabaseError>;

    // Settings; `None` is the global scope
    async fn get_setting(&self, organization_id: Option<Uuid>, key: &str) -> Result<Option<Setting>, DatabaseError>;
    async fn put_setting(&self, setting: &Setting) -> Result<(), DatabaseError>;
    /// Returns whether a setting was removed
    async fn delete_setting(&self, organization_id: Option<Uuid>, key: &str) -> Result<bool, DatabaseError>;
}
