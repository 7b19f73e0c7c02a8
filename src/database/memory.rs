use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::{Donation, Donor, Organization, Pledge, Setting, UserRole, Yahrzeit};
use super::store::Store;
use crate::types::OrgScope;

/// In-process store with the same referential rules as the Postgres schema.
/// Used by tests and the CLI dry runs.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    organizations: Vec<Organization>,
    donors: Vec<Donor>,
    donations: Vec<Donation>,
    pledges: Vec<Pledge>,
    yahrzeits: Vec<Yahrzeit>,
    roles: Vec<UserRole>,
    settings: Vec<Setting>,
}

trait Keyed: Clone {
    const NAME: &'static str;
    fn key(&self) -> Uuid;
    fn org(&self) -> Option<Uuid>;
}

macro_rules! keyed {
    ($ty:ty, $name:literal, |$r:ident| $org:expr) => {
        impl Keyed for $ty {
            const NAME: &'static str = $name;
            fn key(&self) -> Uuid {
                self.id
            }
            fn org(&self) -> Option<Uuid> {
                let $r = self;
                $org
            }
        }
    };
}

keyed!(Organization, "organization", |r| Some(r.id));
keyed!(Donor, "donor", |r| Some(r.organization_id));
keyed!(Donation, "donation", |r| Some(r.organization_id));
keyed!(Pledge, "pledge", |r| Some(r.organization_id));
keyed!(Yahrzeit, "yahrzeit", |r| Some(r.organization_id));
keyed!(UserRole, "role", |r| r.organization_id);

fn in_scope<T: Keyed>(row: &T, scope: &OrgScope) -> bool {
    match row.org() {
        Some(org) => scope.includes(org),
        None => matches!(scope, OrgScope::All),
    }
}

fn scoped<T: Keyed>(rows: &[T], scope: &OrgScope) -> Vec<T> {
    rows.iter().filter(|r| in_scope(*r, scope)).cloned().collect()
}

fn find<T: Keyed>(rows: &[T], scope: &OrgScope, id: Uuid) -> Result<T, DatabaseError> {
    rows.iter()
        .find(|r| r.key() == id && in_scope(*r, scope))
        .cloned()
        .ok_or_else(|| DatabaseError::NotFound(format!("{} {}", T::NAME, id)))
}

fn insert<T: Keyed>(rows: &mut Vec<T>, row: &T) -> Result<(), DatabaseError> {
    if rows.iter().any(|r| r.key() == row.key()) {
        return Err(DatabaseError::Conflict(format!("{} {} already exists", T::NAME, row.key())));
    }
    rows.push(row.clone());
    Ok(())
}

fn replace<T: Keyed>(rows: &mut [T], row: &T) -> Result<(), DatabaseError> {
    let slot = rows
        .iter_mut()
        .find(|r| r.key() == row.key())
        .ok_or_else(|| DatabaseError::NotFound(format!("{} {}", T::NAME, row.key())))?;
    *slot = row.clone();
    Ok(())
}

fn remove<T: Keyed>(rows: &mut Vec<T>, scope: &OrgScope, id: Uuid) -> Result<T, DatabaseError> {
    let index = rows
        .iter()
        .position(|r| r.key() == id && in_scope(r, scope))
        .ok_or_else(|| DatabaseError::NotFound(format!("{} {}", T::NAME, id)))?;
    Ok(rows.remove(index))
}

fn referenced(what: &str, id: Uuid, by: &str) -> DatabaseError {
    DatabaseError::Conflict(format!("{} {} is referenced by {}", what, id, by))
}

impl Tables {
    fn require_organization(&self, id: Uuid) -> Result<(), DatabaseError> {
        if self.organizations.iter().any(|o| o.id == id) {
            Ok(())
        } else {
            Err(DatabaseError::Conflict(format!("organization {} does not exist", id)))
        }
    }

    fn require_donor(&self, org: Uuid, id: Option<Uuid>) -> Result<(), DatabaseError> {
        match id {
            Some(id) if !self.donors.iter().any(|d| d.id == id && d.organization_id == org) => {
                Err(DatabaseError::Conflict(format!("donor {} does not exist in organization {}", id, org)))
            }
            _ => Ok(()),
        }
    }

    fn require_pledge(&self, org: Uuid, id: Option<Uuid>) -> Result<(), DatabaseError> {
        match id {
            Some(id) if !self.pledges.iter().any(|p| p.id == id && p.organization_id == org) => {
                Err(DatabaseError::Conflict(format!("pledge {} does not exist in organization {}", id, org)))
            }
            _ => Ok(()),
        }
    }

    fn check_donation(&self, d: &Donation) -> Result<(), DatabaseError> {
        self.require_organization(d.organization_id)?;
        self.require_donor(d.organization_id, d.donor_id)?;
        self.require_pledge(d.organization_id, d.pledge_id)
    }

    fn check_pledge(&self, p: &Pledge) -> Result<(), DatabaseError> {
        self.require_organization(p.organization_id)?;
        self.require_donor(p.organization_id, Some(p.donor_id))
    }

    fn check_yahrzeit(&self, y: &Yahrzeit) -> Result<(), DatabaseError> {
        self.require_organization(y.organization_id)?;
        self.require_donor(y.organization_id, y.donor_id)
    }

    fn check_role(&self, role: &UserRole) -> Result<(), DatabaseError> {
        if let Some(org) = role.organization_id {
            self.require_organization(org)?;
        }
        let duplicate = self.roles.iter().any(|r| {
            r.id != role.id && r.user_id == role.user_id && r.role == role.role && r.organization_id == role.organization_id
        });
        if duplicate {
            return Err(DatabaseError::Conflict("record already exists".to_string()));
        }
        Ok(())
    }

    fn check_slug(&self, org: &Organization) -> Result<(), DatabaseError> {
        if self.organizations.iter().any(|o| o.id != org.id && o.slug == org.slug) {
            return Err(DatabaseError::Conflict("record already exists".to_string()));
        }
        Ok(())
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn list_donors(&self, scope: &OrgScope) -> Result<Vec<Donor>, DatabaseError> {
        Ok(scoped(&self.tables.read().await.donors, scope))
    }

    async fn get_donor(&self, scope: &OrgScope, id: Uuid) -> Result<Donor, DatabaseError> {
        find(&self.tables.read().await.donors, scope, id)
    }

    async fn find_donor_by_phone(&self, organization_id: Uuid, phone: &str) -> Result<Option<Donor>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .donors
            .iter()
            .find(|d| d.organization_id == organization_id && d.phone.as_deref() == Some(phone))
            .cloned())
    }

    async fn find_donor_by_email(&self, organization_id: Uuid, email: &str) -> Result<Option<Donor>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .donors
            .iter()
            .find(|d| d.organization_id == organization_id && d.email.as_deref() == Some(email))
            .cloned())
    }

    async fn insert_donor(&self, donor: &Donor) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.require_organization(donor.organization_id)?;
        insert(&mut tables.donors, donor)
    }

    async fn update_donor(&self, donor: &Donor) -> Result<(), DatabaseError> {
        replace(&mut self.tables.write().await.donors, donor)
    }

    async fn delete_donor(&self, scope: &OrgScope, id: Uuid) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        find(&tables.donors, scope, id)?;
        if tables.donations.iter().any(|d| d.donor_id == Some(id)) {
            return Err(referenced("donor", id, "donations"));
        }
        if tables.pledges.iter().any(|p| p.donor_id == id) {
            return Err(referenced("donor", id, "pledges"));
        }
        remove(&mut tables.donors, scope, id)?;
        for y in tables.yahrzeits.iter_mut().filter(|y| y.donor_id == Some(id)) {
            y.donor_id = None;
        }
        Ok(())
    }

    async fn list_donations(&self, scope: &OrgScope) -> Result<Vec<Donation>, DatabaseError> {
        Ok(scoped(&self.tables.read().await.donations, scope))
    }

    async fn get_donation(&self, scope: &OrgScope, id: Uuid) -> Result<Donation, DatabaseError> {
        find(&self.tables.read().await.donations, scope, id)
    }

    async fn insert_donation(&self, donation: &Donation) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.check_donation(donation)?;
        insert(&mut tables.donations, donation)
    }

    async fn update_donation(&self, donation: &Donation) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.check_donation(donation)?;
        replace(&mut tables.donations, donation)
    }

    async fn delete_donation(&self, scope: &OrgScope, id: Uuid) -> Result<(), DatabaseError> {
        remove(&mut self.tables.write().await.donations, scope, id).map(|_| ())
    }

    async fn list_pledges(&self, scope: &OrgScope) -> Result<Vec<Pledge>, DatabaseError> {
        Ok(scoped(&self.tables.read().await.pledges, scope))
    }

    async fn get_pledge(&self, scope: &OrgScope, id: Uuid) -> Result<Pledge, DatabaseError> {
        find(&self.tables.read().await.pledges, scope, id)
    }

    async fn insert_pledge(&self, pledge: &Pledge) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.check_pledge(pledge)?;
        insert(&mut tables.pledges, pledge)
    }

    async fn update_pledge(&self, pledge: &Pledge) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.check_pledge(pledge)?;
        replace(&mut tables.pledges, pledge)
    }

    async fn delete_pledge(&self, scope: &OrgScope, id: Uuid) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        find(&tables.pledges, scope, id)?;
        if tables.donations.iter().any(|d| d.pledge_id == Some(id)) {
            return Err(referenced("pledge", id, "payments"));
        }
        remove(&mut tables.pledges, scope, id).map(|_| ())
    }

    async fn list_yahrzeits(&self, scope: &OrgScope) -> Result<Vec<Yahrzeit>, DatabaseError> {
        Ok(scoped(&self.tables.read().await.yahrzeits, scope))
    }

    async fn get_yahrzeit(&self, scope: &OrgScope, id: Uuid) -> Result<Yahrzeit, DatabaseError> {
        find(&self.tables.read().await.yahrzeits, scope, id)
    }

    async fn insert_yahrzeit(&self, yahrzeit: &Yahrzeit) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.check_yahrzeit(yahrzeit)?;
        insert(&mut tables.yahrzeits, yahrzeit)
    }

    async fn update_yahrzeit(&self, yahrzeit: &Yahrzeit) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.check_yahrzeit(yahrzeit)?;
        replace(&mut tables.yahrzeits, yahrzeit)
    }

    async fn delete_yahrzeit(&self, scope: &OrgScope, id: Uuid) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        remove(&mut tables.yahrzeits, scope, id)?;
        for d in tables.donations.iter_mut().filter(|d| d.yahrzeit_id == Some(id)) {
            d.yahrzeit_id = None;
        }
        Ok(())
    }

    async fn list_organizations(&self, scope: &OrgScope) -> Result<Vec<Organization>, DatabaseError> {
        Ok(scoped(&self.tables.read().await.organizations, scope))
    }

    async fn get_organization(&self, id: Uuid) -> Result<Organization, DatabaseError> {
        find(&self.tables.read().await.organizations, &OrgScope::All, id)
    }

    async fn insert_organization(&self, organization: &Organization) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.check_slug(organization)?;
        insert(&mut tables.organizations, organization)
    }

    async fn update_organization(&self, organization: &Organization) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.check_slug(organization)?;
        replace(&mut tables.organizations, organization)
    }

    async fn list_roles(&self, scope: &OrgScope) -> Result<Vec<UserRole>, DatabaseError> {
        Ok(scoped(&self.tables.read().await.roles, scope))
    }

    async fn list_roles_for_user(&self, user_id: Uuid) -> Result<Vec<UserRole>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.roles.iter().filter(|r| r.user_id == user_id).cloned().collect())
    }

    async fn get_role(&self, id: Uuid) -> Result<UserRole, DatabaseError> {
        find(&self.tables.read().await.roles, &OrgScope::All, id)
    }

    async fn insert_role(&self, role: &UserRole) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.check_role(role)?;
        insert(&mut tables.roles, role)
    }

    async fn update_role(&self, role: &UserRole) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.check_role(role)?;
        replace(&mut tables.roles, role)
    }

    async fn get_setting(&self, organization_id: Option<Uuid>, key: &str) -> Result<Option<Setting>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .settings
            .iter()
            .find(|s| s.organization_id == organization_id && s.key == key)
            .cloned())
    }

    async fn put_setting(&self, setting: &Setting) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        if let Some(org) = setting.organization_id {
            tables.require_organization(org)?;
        }
        let existing = tables
            .settings
            .iter()
            .position(|s| s.organization_id == setting.organization_id && s.key == setting.key);
        match existing {
            Some(index) => {
                let slot = &mut tables.settings[index];
                slot.value = setting.value.clone();
                slot.updated_at = setting.updated_at;
            }
            None => tables.settings.push(setting.clone()),
        }
        Ok(())
    }

    async fn delete_setting(&self, organization_id: Option<Uuid>, key: &str) -> Result<bool, DatabaseError> {
        let mut tables = self.tables.write().await;
        let before = tables.settings.len();
        tables.settings.retain(|s| !(s.organization_id == organization_id && s.key == key));
        Ok(tables.settings.len() != before)
    }
}
