use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::InputError;
use crate::filter::{FieldValue, Listable};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Donor {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub hebrew_name: Option<String>,
    /// Digits only, a leading `+` is kept
    pub phone: Option<String>,
    /// Trimmed and lower-cased
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub notes: Option<String>,
    /// Donors sharing a merge group are the same person entered twice
    pub merge_group_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Donor {
    pub fn new(organization_id: Uuid, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            organization_id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            hebrew_name: None,
            phone: None,
            email: None,
            address: None,
            city: None,
            notes: None,
            merge_group_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    pub fn with_phone(mut self, raw: &str) -> Self {
        self.phone = normalize_phone(raw);
        self
    }

    pub fn with_email(mut self, raw: &str) -> Self {
        self.email = normalize_email(raw);
        self
    }

    /// Appends a note paragraph instead of replacing what is there
    pub fn append_note(&mut self, note: &str) {
        let note = note.trim();
        if note.is_empty() {
            return;
        }
        self.notes = Some(match self.notes.take().filter(|n| !n.trim().is_empty()) {
            Some(existing) if existing.contains(note) => existing,
            Some(existing) => format!("{}\n{}", existing, note),
            None => note.to_string(),
        });
    }
}

/// Keeps digits and a leading `+`; anything shorter than 5 digits is not a phone.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < 5 {
        return None;
    }
    if trimmed.starts_with('+') {
        Some(format!("+{}", digits))
    } else {
        Some(digits)
    }
}

pub fn normalize_email(raw: &str) -> Option<String> {
    let email = raw.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') && !email.contains(' ') => Some(email),
        _ => None,
    }
}

/// Create/update payload. Absent fields are left untouched on update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DonorInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub hebrew_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub notes: Option<String>,
    pub merge_group_id: Option<Uuid>,
}

impl DonorInput {
    pub fn into_donor(self, organization_id: Uuid) -> Result<Donor, InputError> {
        let first = self.first_name.clone().unwrap_or_default();
        let last = self.last_name.clone().unwrap_or_default();
        if first.trim().is_empty() && last.trim().is_empty() {
            return Err(InputError::MissingField("last_name"));
        }
        let mut donor = Donor::new(organization_id, first.trim(), last.trim());
        self.apply(&mut donor)?;
        Ok(donor)
    }

    pub fn apply(self, donor: &mut Donor) -> Result<(), InputError> {
        if let Some(v) = self.first_name { donor.first_name = v.trim().to_string(); }
        if let Some(v) = self.last_name { donor.last_name = v.trim().to_string(); }
        if let Some(v) = self.hebrew_name { donor.hebrew_name = non_empty(v); }
        if let Some(v) = self.phone {
            donor.phone = match non_empty(v) {
                Some(raw) => Some(normalize_phone(&raw).ok_or_else(|| InputError::invalid("phone", "not a phone number"))?),
                None => None,
            };
        }
        if let Some(v) = self.email {
            donor.email = match non_empty(v) {
                Some(raw) => Some(normalize_email(&raw).ok_or_else(|| InputError::invalid("email", "not an email address"))?),
                None => None,
            };
        }
        if let Some(v) = self.address { donor.address = non_empty(v); }
        if let Some(v) = self.city { donor.city = non_empty(v); }
        if let Some(v) = self.notes { donor.notes = non_empty(v); }
        if let Some(v) = self.merge_group_id { donor.merge_group_id = Some(v); }
        donor.updated_at = Utc::now();
        Ok(())
    }
}

pub(crate) fn non_empty(v: String) -> Option<String> {
    let trimmed = v.trim();
    if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
}

impl Listable for Donor {
    fn field(&self, name: &str) -> FieldValue {
        match name {
            "id" => self.id.into(),
            "organization_id" => self.organization_id.into(),
            "first_name" => self.first_name.as_str().into(),
            "last_name" => self.last_name.as_str().into(),
            "full_name" | "name" => self.full_name().into(),
            "hebrew_name" => self.hebrew_name.clone().into(),
            "phone" => self.phone.clone().into(),
            "email" => self.email.clone().into(),
            "address" => self.address.clone().into(),
            "city" => self.city.clone().into(),
            "notes" => self.notes.clone().into(),
            "merge_group_id" => self.merge_group_id.into(),
            "created_at" => self.created_at.into(),
            "updated_at" => self.updated_at.into(),
            _ => FieldValue::Null,
        }
    }

    fn search_fields(&self) -> Vec<String> {
        [
            Some(self.full_name()),
            self.hebrew_name.clone(),
            self.phone.clone(),
            self.email.clone(),
            self.city.clone(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_normalization() {
        assert_eq!(normalize_phone("(718) 555-0101").as_deref(), Some("7185550101"));
        assert_eq!(normalize_phone(" +972 52-555-0101 ").as_deref(), Some("+972525550101"));
        assert_eq!(normalize_phone("n/a"), None);
        assert_eq!(normalize_phone("123"), None);
    }

    #[test]
    fn email_normalization() {
        assert_eq!(normalize_email("  Rivka@Example.ORG ").as_deref(), Some("rivka@example.org"));
        assert_eq!(normalize_email("not-an-email"), None);
        assert_eq!(normalize_email("@example.org"), None);
    }

    #[test]
    fn input_requires_a_name_and_validates_contacts() {
        let org = Uuid::new_v4();
        assert!(matches!(DonorInput::default().into_donor(org), Err(InputError::MissingField("last_name"))));

        let bad = DonorInput { last_name: Some("Cohen".into()), email: Some("nope".into()), ..Default::default() };
        assert!(matches!(bad.into_donor(org), Err(InputError::Invalid { .. })));

        let ok = DonorInput { last_name: Some("Cohen".into()), phone: Some("718-555-0101".into()), ..Default::default() }
            .into_donor(org)
            .unwrap();
        assert_eq!(ok.phone.as_deref(), Some("7185550101"));
        assert_eq!(ok.full_name(), "Cohen");
    }

    #[test]
    fn append_note_does_not_duplicate() {
        let mut donor = Donor::new(Uuid::new_v4(), "Sarah", "Levi");
        donor.append_note("Prefers email");
        donor.append_note("Prefers email");
        donor.append_note("Board member");
        assert_eq!(donor.notes.as_deref(), Some("Prefers email\nBoard member"));
    }
}
