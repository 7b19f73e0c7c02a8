use async_trait::async_trait;
use sqlx::{postgres::PgRow, FromRow, PgPool};
use uuid::Uuid;

use super::manager::{DatabaseError, DatabaseManager};
use super::models::{Donation, Donor, Organization, Pledge, Setting, UserRole, Yahrzeit};
use super::store::Store;
use crate::types::OrgScope;

/// `Store` over the Postgres schema in `migrations/`
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect() -> Result<Self, DatabaseError> {
        Ok(Self::new(DatabaseManager::main_pool().await?))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn select_scoped<T>(&self, table: &'static str, scope: &OrgScope) -> Result<Vec<T>, DatabaseError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let sql = format!(
            "SELECT * FROM {} WHERE ($1::uuid IS NULL OR organization_id = $1) ORDER BY created_at, id",
            table
        );
        Ok(sqlx::query_as::<_, T>(&sql)
            .bind(scope.organization_id())
            .fetch_all(&self.pool)
            .await?)
    }

    async fn select_404<T>(&self, table: &'static str, scope: &OrgScope, id: Uuid) -> Result<T, DatabaseError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let sql = format!(
            "SELECT * FROM {} WHERE id = $1 AND ($2::uuid IS NULL OR organization_id = $2)",
            table
        );
        sqlx::query_as::<_, T>(&sql)
            .bind(id)
            .bind(scope.organization_id())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("{} {}", table, id)))
    }

    async fn delete_scoped(&self, table: &'static str, scope: &OrgScope, id: Uuid) -> Result<(), DatabaseError> {
        let sql = format!(
            "DELETE FROM {} WHERE id = $1 AND ($2::uuid IS NULL OR organization_id = $2)",
            table
        );
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(scope.organization_id())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("{} {}", table, id)));
        }
        Ok(())
    }

    fn expect_one(affected: u64, what: &str, id: Uuid) -> Result<(), DatabaseError> {
        if affected == 0 {
            return Err(DatabaseError::NotFound(format!("{} {}", what, id)));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn list_donors(&self, scope: &OrgScope) -> Result<Vec<Donor>, DatabaseError> {
        self.select_scoped("donors", scope).await
    }

    async fn get_donor(&self, scope: &OrgScope, id: Uuid) -> Result<Donor, DatabaseError> {
        self.select_404("donors", scope, id).await
    }

    async fn find_donor_by_phone(&self, organization_id: Uuid, phone: &str) -> Result<Option<Donor>, DatabaseError> {
        Ok(sqlx::query_as::<_, Donor>(
            "SELECT * FROM donors WHERE organization_id = $1 AND phone = $2 ORDER BY created_at LIMIT 1",
        )
        .bind(organization_id)
        .bind(phone)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn find_donor_by_email(&self, organization_id: Uuid, email: &str) -> Result<Option<Donor>, DatabaseError> {
        Ok(sqlx::query_as::<_, Donor>(
            "SELECT * FROM donors WHERE organization_id = $1 AND email = $2 ORDER BY created_at LIMIT 1",
        )
        .bind(organization_id)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn insert_donor(&self, d: &Donor) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO donors (id, organization_id, first_name, last_name, hebrew_name, phone, email, address, city, notes, merge_group_id, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(d.id)
        .bind(d.organization_id)
        .bind(&d.first_name)
        .bind(&d.last_name)
        .bind(&d.hebrew_name)
        .bind(&d.phone)
        .bind(&d.email)
        .bind(&d.address)
        .bind(&d.city)
        .bind(&d.notes)
        .bind(d.merge_group_id)
        .bind(d.created_at)
        .bind(d.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_donor(&self, d: &Donor) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            "UPDATE donors SET first_name = $2, last_name = $3, hebrew_name = $4, phone = $5, email = $6, address = $7,
                    city = $8, notes = $9, merge_group_id = $10, updated_at = $11
             WHERE id = $1",
        )
        .bind(d.id)
        .bind(&d.first_name)
        .bind(&d.last_name)
        .bind(&d.hebrew_name)
        .bind(&d.phone)
        .bind(&d.email)
        .bind(&d.address)
        .bind(&d.city)
        .bind(&d.notes)
        .bind(d.merge_group_id)
        .bind(d.updated_at)
        .execute(&self.pool)
        .await?;
        Self::expect_one(result.rows_affected(), "donor", d.id)
    }

    async fn delete_donor(&self, scope: &OrgScope, id: Uuid) -> Result<(), DatabaseError> {
        self.delete_scoped("donors", scope, id).await
    }

    async fn list_donations(&self, scope: &OrgScope) -> Result<Vec<Donation>, DatabaseError> {
        self.select_scoped("donations", scope).await
    }

    async fn get_donation(&self, scope: &OrgScope, id: Uuid) -> Result<Donation, DatabaseError> {
        self.select_404("donations", scope, id).await
    }

    async fn insert_donation(&self, d: &Donation) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO donations (id, organization_id, donor_id, pledge_id, yahrzeit_id, amount, currency, donation_type,
                    payment_method, status, fee, net_amount, donated_on, notes, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
        )
        .bind(d.id)
        .bind(d.organization_id)
        .bind(d.donor_id)
        .bind(d.pledge_id)
        .bind(d.yahrzeit_id)
        .bind(d.amount)
        .bind(&d.currency)
        .bind(d.donation_type)
        .bind(d.payment_method)
        .bind(d.status)
        .bind(d.fee)
        .bind(d.net_amount)
        .bind(d.donated_on)
        .bind(&d.notes)
        .bind(d.created_at)
        .bind(d.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_donation(&self, d: &Donation) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            "UPDATE donations SET donor_id = $2, pledge_id = $3, yahrzeit_id = $4, amount = $5, currency = $6,
                    donation_type = $7, payment_method = $8, status = $9, fee = $10, net_amount = $11, donated_on = $12,
                    notes = $13, updated_at = $14
             WHERE id = $1",
        )
        .bind(d.id)
        .bind(d.donor_id)
        .bind(d.pledge_id)
        .bind(d.yahrzeit_id)
        .bind(d.amount)
        .bind(&d.currency)
        .bind(d.donation_type)
        .bind(d.payment_method)
        .bind(d.status)
        .bind(d.fee)
        .bind(d.net_amount)
        .bind(d.donated_on)
        .bind(&d.notes)
        .bind(d.updated_at)
        .execute(&self.pool)
        .await?;
        Self::expect_one(result.rows_affected(), "donation", d.id)
    }

    async fn delete_donation(&self, scope: &OrgScope, id: Uuid) -> Result<(), DatabaseError> {
        self.delete_scoped("donations", scope, id).await
    }

    async fn list_pledges(&self, scope: &OrgScope) -> Result<Vec<Pledge>, DatabaseError> {
        self.select_scoped("pledges", scope).await
    }

    async fn get_pledge(&self, scope: &OrgScope, id: Uuid) -> Result<Pledge, DatabaseError> {
        self.select_404("pledges", scope, id).await
    }

    async fn insert_pledge(&self, p: &Pledge) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO pledges (id, organization_id, donor_id, total_amount, amount_paid, currency, frequency, status,
                    reminder_enabled, pledged_on, due_on, notes, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
        )
        .bind(p.id)
        .bind(p.organization_id)
        .bind(p.donor_id)
        .bind(p.total_amount)
        .bind(p.amount_paid)
        .bind(&p.currency)
        .bind(p.frequency)
        .bind(p.status)
        .bind(p.reminder_enabled)
        .bind(p.pledged_on)
        .bind(p.due_on)
        .bind(&p.notes)
        .bind(p.created_at)
        .bind(p.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_pledge(&self, p: &Pledge) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            "UPDATE pledges SET donor_id = $2, total_amount = $3, amount_paid = $4, currency = $5, frequency = $6,
                    status = $7, reminder_enabled = $8, pledged_on = $9, due_on = $10, notes = $11, updated_at = $12
             WHERE id = $1",
        )
        .bind(p.id)
        .bind(p.donor_id)
        .bind(p.total_amount)
        .bind(p.amount_paid)
        .bind(&p.currency)
        .bind(p.frequency)
        .bind(p.status)
        .bind(p.reminder_enabled)
        .bind(p.pledged_on)
        .bind(p.due_on)
        .bind(&p.notes)
        .bind(p.updated_at)
        .execute(&self.pool)
        .await?;
        Self::expect_one(result.rows_affected(), "pledge", p.id)
    }

    async fn delete_pledge(&self, scope: &OrgScope, id: Uuid) -> Result<(), DatabaseError> {
        self.delete_scoped("pledges", scope, id).await
    }

    async fn list_yahrzeits(&self, scope: &OrgScope) -> Result<Vec<Yahrzeit>, DatabaseError> {
        self.select_scoped("yahrzeits", scope).await
    }

    async fn get_yahrzeit(&self, scope: &OrgScope, id: Uuid) -> Result<Yahrzeit, DatabaseError> {
        self.select_404("yahrzeits", scope, id).await
    }

    async fn insert_yahrzeit(&self, y: &Yahrzeit) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO yahrzeits (id, organization_id, donor_id, deceased_name, hebrew_name, relationship, date_of_death,
                    after_sunset, hebrew_month, hebrew_day, observance, contact_name, contact_phone, contact_email,
                    reminder_enabled, donation_id, notes, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)",
        )
        .bind(y.id)
        .bind(y.organization_id)
        .bind(y.donor_id)
        .bind(&y.deceased_name)
        .bind(&y.hebrew_name)
        .bind(&y.relationship)
        .bind(y.date_of_death)
        .bind(y.after_sunset)
        .bind(y.hebrew_month)
        .bind(y.hebrew_day)
        .bind(y.observance)
        .bind(&y.contact_name)
        .bind(&y.contact_phone)
        .bind(&y.contact_email)
        .bind(y.reminder_enabled)
        .bind(y.donation_id)
        .bind(&y.notes)
        .bind(y.created_at)
        .bind(y.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_yahrzeit(&self, y: &Yahrzeit) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            "UPDATE yahrzeits SET donor_id = $2, deceased_name = $3, hebrew_name = $4, relationship = $5,
                    date_of_death = $6, after_sunset = $7, hebrew_month = $8, hebrew_day = $9, observance = $10,
                    contact_name = $11, contact_phone = $12, contact_email = $13, reminder_enabled = $14,
                    donation_id = $15, notes = $16, updated_at = $17
             WHERE id = $1",
        )
        .bind(y.id)
        .bind(y.donor_id)
        .bind(&y.deceased_name)
        .bind(&y.hebrew_name)
        .bind(&y.relationship)
        .bind(y.date_of_death)
        .bind(y.after_sunset)
        .bind(y.hebrew_month)
        .bind(y.hebrew_day)
        .bind(y.observance)
        .bind(&y.contact_name)
        .bind(&y.contact_phone)
        .bind(&y.contact_email)
        .bind(y.reminder_enabled)
        .bind(y.donation_id)
        .bind(&y.notes)
        .bind(y.updated_at)
        .execute(&self.pool)
        .await?;
        Self::expect_one(result.rows_affected(), "yahrzeit", y.id)
    }

    async fn delete_yahrzeit(&self, scope: &OrgScope, id: Uuid) -> Result<(), DatabaseError> {
        self.delete_scoped("yahrzeits", scope, id).await
    }

    async fn list_organizations(&self, scope: &OrgScope) -> Result<Vec<Organization>, DatabaseError> {
        Ok(sqlx::query_as::<_, Organization>(
            "SELECT * FROM organizations WHERE ($1::uuid IS NULL OR id = $1) ORDER BY created_at, id",
        )
        .bind(scope.organization_id())
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_organization(&self, id: Uuid) -> Result<Organization, DatabaseError> {
        sqlx::query_as::<_, Organization>("SELECT * FROM organizations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("organization {}", id)))
    }

    async fn insert_organization(&self, o: &Organization) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO organizations (id, name, slug, contact_email, contact_phone, address, logo_url, primary_color,
                    subscription_tier, subscription_status, member_capacity, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(o.id)
        .bind(&o.name)
        .bind(&o.slug)
        .bind(&o.contact_email)
        .bind(&o.contact_phone)
        .bind(&o.address)
        .bind(&o.logo_url)
        .bind(&o.primary_color)
        .bind(o.subscription_tier)
        .bind(o.subscription_status)
        .bind(o.member_capacity)
        .bind(o.created_at)
        .bind(o.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_organization(&self, o: &Organization) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            "UPDATE organizations SET name = $2, slug = $3, contact_email = $4, contact_phone = $5, address = $6,
                    logo_url = $7, primary_color = $8, subscription_tier = $9, subscription_status = $10,
                    member_capacity = $11, updated_at = $12
             WHERE id = $1",
        )
        .bind(o.id)
        .bind(&o.name)
        .bind(&o.slug)
        .bind(&o.contact_email)
        .bind(&o.contact_phone)
        .bind(&o.address)
        .bind(&o.logo_url)
        .bind(&o.primary_color)
        .bind(o.subscription_tier)
        .bind(o.subscription_status)
        .bind(o.member_capacity)
        .bind(o.updated_at)
        .execute(&self.pool)
        .await?;
        Self::expect_one(result.rows_affected(), "organization", o.id)
    }

    async fn list_roles(&self, scope: &OrgScope) -> Result<Vec<UserRole>, DatabaseError> {
        let sql = match scope {
            OrgScope::All => "SELECT * FROM user_roles ORDER BY created_at, id",
            OrgScope::Organization(_) => "SELECT * FROM user_roles WHERE organization_id = $1 ORDER BY created_at, id",
        };
        let mut query = sqlx::query_as::<_, UserRole>(sql);
        if let Some(org) = scope.organization_id() {
            query = query.bind(org);
        }
        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn list_roles_for_user(&self, user_id: Uuid) -> Result<Vec<UserRole>, DatabaseError> {
        Ok(sqlx::query_as::<_, UserRole>("SELECT * FROM user_roles WHERE user_id = $1 ORDER BY created_at, id")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get_role(&self, id: Uuid) -> Result<UserRole, DatabaseError> {
        sqlx::query_as::<_, UserRole>("SELECT * FROM user_roles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("role {}", id)))
    }

    async fn insert_role(&self, r: &UserRole) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO user_roles (id, user_id, user_email, organization_id, role, suspended, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(r.id)
        .bind(r.user_id)
        .bind(&r.user_email)
        .bind(r.organization_id)
        .bind(r.role)
        .bind(r.suspended)
        .bind(r.created_at)
        .bind(r.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_role(&self, r: &UserRole) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            "UPDATE user_roles SET user_email = $2, organization_id = $3, role = $4, suspended = $5, updated_at = $6
             WHERE id = $1",
        )
        .bind(r.id)
        .bind(&r.user_email)
        .bind(r.organization_id)
        .bind(r.role)
        .bind(r.suspended)
        .bind(r.updated_at)
        .execute(&self.pool)
        .await?;
        Self::expect_one(result.rows_affected(), "role", r.id)
    }

    async fn get_setting(&self, organization_id: Option<Uuid>, key: &str) -> Result<Option<Setting>, DatabaseError> {
        Ok(sqlx::query_as::<_, Setting>(
            "SELECT * FROM settings WHERE organization_id IS NOT DISTINCT FROM $1 AND key = $2",
        )
        .bind(organization_id)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn put_setting(&self, s: &Setting) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;
        let updated = sqlx::query(
            "UPDATE settings SET value = $3, updated_at = $4 WHERE organization_id IS NOT DISTINCT FROM $1 AND key = $2",
        )
        .bind(s.organization_id)
        .bind(&s.key)
        .bind(&s.value)
        .bind(s.updated_at)
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            sqlx::query("INSERT INTO settings (id, organization_id, key, value, updated_at) VALUES ($1, $2, $3, $4, $5)")
                .bind(s.id)
                .bind(s.organization_id)
                .bind(&s.key)
                .bind(&s.value)
                .bind(s.updated_at)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn delete_setting(&self, organization_id: Option<Uuid>, key: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM settings WHERE organization_id IS NOT DISTINCT FROM $1 AND key = $2")
            .bind(organization_id)
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
