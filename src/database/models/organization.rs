use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::donor::{non_empty, normalize_email, normalize_phone};
use super::enums::{SubscriptionStatus, SubscriptionTier};
use super::InputError;
use crate::filter::{FieldValue, Listable};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub logo_url: Option<String>,
    pub primary_color: Option<String>,
    pub subscription_tier: SubscriptionTier,
    pub subscription_status: SubscriptionStatus,
    /// Explicit seat limit; falls back to the tier default when unset
    pub member_capacity: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Organization {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let now = Utc::now();
        let id = Uuid::new_v4();
        let mut slug = slugify(&name);
        if slug.is_empty() {
            slug = format!("org-{}", &id.simple().to_string()[..8]);
        }
        Self {
            id,
            slug,
            name,
            contact_email: None,
            contact_phone: None,
            address: None,
            logo_url: None,
            primary_color: None,
            subscription_tier: SubscriptionTier::default(),
            subscription_status: SubscriptionStatus::default(),
            member_capacity: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Seat limit in effect; `None` means unlimited.
    pub fn effective_capacity(&self) -> Option<usize> {
        match self.member_capacity {
            Some(n) => Some(n.max(0) as usize),
            None => self.subscription_tier.default_capacity(),
        }
    }

    pub fn validate(&self) -> Result<(), InputError> {
        if self.name.trim().is_empty() {
            return Err(InputError::MissingField("name"));
        }
        if self.slug.is_empty() || !self.slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
            return Err(InputError::invalid("slug", "only lower-case letters, digits and dashes"));
        }
        if let Some(color) = &self.primary_color {
            let hex = color.strip_prefix('#').unwrap_or("");
            if !(hex.len() == 6 || hex.len() == 3) || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(InputError::invalid("primary_color", "must be a #rgb or #rrggbb colour"));
            }
        }
        if let Some(url) = &self.logo_url {
            if url::Url::parse(url).map(|u| u.scheme() != "http" && u.scheme() != "https").unwrap_or(true) {
                return Err(InputError::invalid("logo_url", "must be an http(s) URL"));
            }
        }
        if matches!(self.member_capacity, Some(n) if n < 0) {
            return Err(InputError::invalid("member_capacity", "must not be negative"));
        }
        Ok(())
    }
}

pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrganizationInput {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub logo_url: Option<String>,
    pub primary_color: Option<String>,
    pub subscription_tier: Option<SubscriptionTier>,
    pub subscription_status: Option<SubscriptionStatus>,
    pub member_capacity: Option<i32>,
}

impl OrganizationInput {
    pub fn into_organization(self) -> Result<Organization, InputError> {
        let name = self.name.clone().and_then(non_empty).ok_or(InputError::MissingField("name"))?;
        let mut org = Organization::new(name);
        self.apply(&mut org)?;
        Ok(org)
    }

    pub fn apply(self, org: &mut Organization) -> Result<(), InputError> {
        if let Some(v) = self.name { org.name = v.trim().to_string(); }
        if let Some(v) = self.slug { org.slug = slugify(&v); }
        if let Some(v) = self.contact_email {
            org.contact_email = match non_empty(v) {
                Some(raw) => Some(normalize_email(&raw).ok_or_else(|| InputError::invalid("contact_email", "not an email address"))?),
                None => None,
            };
        }
        if let Some(v) = self.contact_phone {
            org.contact_phone = match non_empty(v) {
                Some(raw) => Some(normalize_phone(&raw).ok_or_else(|| InputError::invalid("contact_phone", "not a phone number"))?),
                None => None,
            };
        }
        if let Some(v) = self.address { org.address = non_empty(v); }
        if let Some(v) = self.logo_url { org.logo_url = non_empty(v); }
        if let Some(v) = self.primary_color { org.primary_color = non_empty(v); }
        if let Some(v) = self.subscription_tier { org.subscription_tier = v; }
        if let Some(v) = self.subscription_status { org.subscription_status = v; }
        if let Some(v) = self.member_capacity { org.member_capacity = Some(v); }
        org.validate()?;
        org.updated_at = Utc::now();
        Ok(())
    }
}

impl Listable for Organization {
    fn field(&self, name: &str) -> FieldValue {
        match name {
            "id" => self.id.into(),
            "name" => self.name.as_str().into(),
            "slug" => self.slug.as_str().into(),
            "contact_email" | "email" => self.contact_email.clone().into(),
            "contact_phone" | "phone" => self.contact_phone.clone().into(),
            "address" => self.address.clone().into(),
            "subscription_tier" | "tier" => self.subscription_tier.to_string().into(),
            "subscription_status" | "status" => self.subscription_status.to_string().into(),
            "member_capacity" => self.member_capacity.into(),
            "created_at" => self.created_at.into(),
            "updated_at" => self.updated_at.into(),
            _ => FieldValue::Null,
        }
    }

    fn search_fields(&self) -> Vec<String> {
        [Some(self.name.clone()), Some(self.slug.clone()), self.contact_email.clone()]
            .into_iter()
            .flatten()
            .collect()
    }
}
