use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::donor::{non_empty, normalize_email, normalize_phone};
use super::enums::Observance;
use super::InputError;
use crate::filter::{FieldValue, Listable};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Yahrzeit {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub donor_id: Option<Uuid>,
    pub deceased_name: String,
    pub hebrew_name: Option<String>,
    pub relationship: Option<String>,
    pub date_of_death: Option<NaiveDate>,
    /// Death after sunset belongs to the following Hebrew day
    pub after_sunset: bool,
    /// Explicit Hebrew date (month numbered from Nisan = 1) when the civil date is unknown
    pub hebrew_month: Option<i16>,
    pub hebrew_day: Option<i16>,
    pub observance: Observance,
    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub reminder_enabled: bool,
    pub donation_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Yahrzeit {
    pub fn new(organization_id: Uuid, deceased_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            organization_id,
            donor_id: None,
            deceased_name: deceased_name.into(),
            hebrew_name: None,
            relationship: None,
            date_of_death: None,
            after_sunset: false,
            hebrew_month: None,
            hebrew_day: None,
            observance: Observance::default(),
            contact_name: None,
            contact_phone: None,
            contact_email: None,
            reminder_enabled: true,
            donation_id: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn validate(&self) -> Result<(), InputError> {
        if self.deceased_name.trim().is_empty() {
            return Err(InputError::MissingField("deceased_name"));
        }
        match (self.date_of_death, self.hebrew_month, self.hebrew_day) {
            (Some(_), _, _) => {}
            (None, Some(_), Some(_)) => {}
            _ => return Err(InputError::invalid("date_of_death", "a civil date or a Hebrew month and day is required")),
        }
        if let Some(month) = self.hebrew_month {
            if !(1..=13).contains(&month) {
                return Err(InputError::invalid("hebrew_month", "must be between 1 (Nisan) and 13 (Adar II)"));
            }
        }
        if let Some(day) = self.hebrew_day {
            if !(1..=30).contains(&day) {
                return Err(InputError::invalid("hebrew_day", "must be between 1 and 30"));
            }
        }
        if self.observance == Observance::Secular && self.date_of_death.is_none() {
            return Err(InputError::invalid("observance", "secular observance needs a civil date of death"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct YahrzeitInput {
    pub donor_id: Option<Uuid>,
    pub deceased_name: Option<String>,
    pub hebrew_name: Option<String>,
    pub relationship: Option<String>,
    pub date_of_death: Option<NaiveDate>,
    pub after_sunset: Option<bool>,
    pub hebrew_month: Option<i16>,
    pub hebrew_day: Option<i16>,
    pub observance: Option<Observance>,
    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub reminder_enabled: Option<bool>,
    pub donation_id: Option<Uuid>,
    pub notes: Option<String>,
}

impl YahrzeitInput {
    pub fn into_yahrzeit(self, organization_id: Uuid) -> Result<Yahrzeit, InputError> {
        let name = self.deceased_name.clone().unwrap_or_default();
        let mut yahrzeit = Yahrzeit::new(organization_id, name.trim());
        self.apply(&mut yahrzeit)?;
        Ok(yahrzeit)
    }

    pub fn apply(self, y: &mut Yahrzeit) -> Result<(), InputError> {
        if let Some(v) = self.donor_id { y.donor_id = Some(v); }
        if let Some(v) = self.deceased_name { y.deceased_name = v.trim().to_string(); }
        if let Some(v) = self.hebrew_name { y.hebrew_name = non_empty(v); }
        if let Some(v) = self.relationship { y.relationship = non_empty(v); }
        if let Some(v) = self.date_of_death { y.date_of_death = Some(v); }
        if let Some(v) = self.after_sunset { y.after_sunset = v; }
        if let Some(v) = self.hebrew_month { y.hebrew_month = Some(v); }
        if let Some(v) = self.hebrew_day { y.hebrew_day = Some(v); }
        if let Some(v) = self.observance { y.observance = v; }
        if let Some(v) = self.contact_name { y.contact_name = non_empty(v); }
        if let Some(v) = self.contact_phone {
            y.contact_phone = match non_empty(v) {
                Some(raw) => Some(normalize_phone(&raw).ok_or_else(|| InputError::invalid("contact_phone", "not a phone number"))?),
                None => None,
            };
        }
        if let Some(v) = self.contact_email {
            y.contact_email = match non_empty(v) {
                Some(raw) => Some(normalize_email(&raw).ok_or_else(|| InputError::invalid("contact_email", "not an email address"))?),
                None => None,
            };
        }
        if let Some(v) = self.reminder_enabled { y.reminder_enabled = v; }
        if let Some(v) = self.donation_id { y.donation_id = Some(v); }
        if let Some(v) = self.notes { y.notes = non_empty(v); }
        y.validate()?;
        y.updated_at = Utc::now();
        Ok(())
    }
}

impl Listable for Yahrzeit {
    fn field(&self, name: &str) -> FieldValue {
        match name {
            "id" => self.id.into(),
            "organization_id" => self.organization_id.into(),
            "donor_id" => self.donor_id.into(),
            "deceased_name" | "name" => self.deceased_name.as_str().into(),
            "hebrew_name" => self.hebrew_name.clone().into(),
            "relationship" => self.relationship.clone().into(),
            "date_of_death" | "date" => self.date_of_death.into(),
            "after_sunset" => self.after_sunset.into(),
            "hebrew_month" => self.hebrew_month.map(i32::from).into(),
            "hebrew_day" => self.hebrew_day.map(i32::from).into(),
            "observance" => self.observance.to_string().into(),
            "contact_name" => self.contact_name.clone().into(),
            "contact_phone" => self.contact_phone.clone().into(),
            "contact_email" => self.contact_email.clone().into(),
            "reminder_enabled" => self.reminder_enabled.into(),
            "donation_id" => self.donation_id.into(),
            "notes" => self.notes.clone().into(),
            "created_at" => self.created_at.into(),
            "updated_at" => self.updated_at.into(),
            _ => FieldValue::Null,
        }
    }

    fn search_fields(&self) -> Vec<String> {
        [
            Some(self.deceased_name.clone()),
            self.hebrew_name.clone(),
            self.relationship.clone(),
            self.contact_name.clone(),
            self.contact_phone.clone(),
            self.contact_email.clone(),
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
    fn needs_some_date() {
        let org = Uuid::new_v4();
        let no_date = YahrzeitInput { deceased_name: Some("Moshe ben Avraham".into()), ..Default::default() };
        assert!(no_date.into_yahrzeit(org).is_err());

        let hebrew_only = YahrzeitInput {
            deceased_name: Some("Moshe ben Avraham".into()),
            hebrew_month: Some(7),
            hebrew_day: Some(3),
            ..Default::default()
        };
        let y = hebrew_only.into_yahrzeit(org).unwrap();
        assert!(y.reminder_enabled);

        let secular_without_date = YahrzeitInput {
            deceased_name: Some("Chana bat Yosef".into()),
            hebrew_month: Some(7),
            hebrew_day: Some(3),
            observance: Some(Observance::Secular),
            ..Default::default()
        };
        assert!(secular_without_date.into_yahrzeit(org).is_err());
    }

    #[test]
    fn rejects_out_of_range_hebrew_dates() {
        let input = YahrzeitInput {
            deceased_name: Some("Rachel".into()),
            hebrew_month: Some(14),
            hebrew_day: Some(1),
            ..Default::default()
        };
        assert!(input.into_yahrzeit(Uuid::new_v4()).is_err());
    }
}
