use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::donation::{validate_amount, validate_currency};
use super::donor::non_empty;
use super::enums::{PledgeFrequency, PledgeStatus};
use super::InputError;
use crate::filter::{FieldValue, Listable};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Pledge {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub donor_id: Uuid,
    pub total_amount: Decimal,
    pub amount_paid: Decimal,
    pub currency: String,
    pub frequency: PledgeFrequency,
    pub status: PledgeStatus,
    pub reminder_enabled: bool,
    pub pledged_on: NaiveDate,
    pub due_on: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Pledge {
    pub fn new(organization_id: Uuid, donor_id: Uuid, total_amount: Decimal, currency: &str, pledged_on: NaiveDate) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            organization_id,
            donor_id,
            total_amount,
            amount_paid: Decimal::ZERO,
            currency: currency.trim().to_ascii_uppercase(),
            frequency: PledgeFrequency::default(),
            status: PledgeStatus::default(),
            reminder_enabled: false,
            pledged_on,
            due_on: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn balance_owed(&self) -> Decimal {
        (self.total_amount - self.amount_paid).max(Decimal::ZERO)
    }

    /// Adds a payment; a pledge paid in full becomes completed.
    pub fn apply_payment(&mut self, amount: Decimal) {
        self.amount_paid += amount;
        self.settle_status();
        self.updated_at = Utc::now();
    }

    /// Reverses a payment that was removed; reopens a completed pledge with a balance.
    pub fn revert_payment(&mut self, amount: Decimal) {
        self.amount_paid = (self.amount_paid - amount).max(Decimal::ZERO);
        self.settle_status();
        self.updated_at = Utc::now();
    }

    /// Moves between active and completed to match the balance. Cancelled stays cancelled.
    pub fn settle_status(&mut self) {
        let settled = self.balance_owed().is_zero();
        match self.status {
            PledgeStatus::Active if settled => self.status = PledgeStatus::Completed,
            PledgeStatus::Completed if !settled => self.status = PledgeStatus::Active,
            _ => {}
        }
    }

    pub fn validate(&self) -> Result<(), InputError> {
        validate_amount("total_amount", self.total_amount)?;
        validate_currency(&self.currency)?;
        if self.amount_paid < Decimal::ZERO {
            return Err(InputError::invalid("amount_paid", "must not be negative"));
        }
        if let Some(due) = self.due_on {
            if due < self.pledged_on {
                return Err(InputError::invalid("due_on", "must not be before the pledge date"));
            }
        }
        Ok(())
    }
}

/// Writable pledge fields. `amount_paid` and `status` only move through
/// payments and cancellation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PledgeInput {
    pub donor_id: Option<Uuid>,
    pub total_amount: Option<Decimal>,
    pub currency: Option<String>,
    pub frequency: Option<PledgeFrequency>,
    pub reminder_enabled: Option<bool>,
    pub pledged_on: Option<NaiveDate>,
    pub due_on: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl PledgeInput {
    pub fn into_pledge(self, organization_id: Uuid, default_currency: &str) -> Result<Pledge, InputError> {
        let donor_id = self.donor_id.ok_or(InputError::MissingField("donor_id"))?;
        let total = self.total_amount.ok_or(InputError::MissingField("total_amount"))?;
        let pledged_on = self.pledged_on.unwrap_or_else(|| Utc::now().date_naive());
        let currency = self.currency.clone().unwrap_or_else(|| default_currency.to_string());
        let mut pledge = Pledge::new(organization_id, donor_id, total, &currency, pledged_on);
        self.apply(&mut pledge)?;
        Ok(pledge)
    }

    pub fn apply(self, pledge: &mut Pledge) -> Result<(), InputError> {
        if let Some(v) = self.donor_id { pledge.donor_id = v; }
        if let Some(v) = self.total_amount { pledge.total_amount = v; }
        if let Some(v) = self.currency { pledge.currency = v.trim().to_ascii_uppercase(); }
        if let Some(v) = self.frequency { pledge.frequency = v; }
        if let Some(v) = self.reminder_enabled { pledge.reminder_enabled = v; }
        if let Some(v) = self.pledged_on { pledge.pledged_on = v; }
        if let Some(v) = self.due_on { pledge.due_on = Some(v); }
        if let Some(v) = self.notes { pledge.notes = non_empty(v); }
        pledge.validate()?;
        pledge.updated_at = Utc::now();
        Ok(())
    }
}

impl Listable for Pledge {
    fn field(&self, name: &str) -> FieldValue {
        match name {
            "id" => self.id.into(),
            "organization_id" => self.organization_id.into(),
            "donor_id" => self.donor_id.into(),
            "total_amount" | "amount" => self.total_amount.into(),
            "amount_paid" => self.amount_paid.into(),
            "balance_owed" | "balance" => self.balance_owed().into(),
            "currency" => self.currency.as_str().into(),
            "frequency" => self.frequency.to_string().into(),
            "status" => self.status.to_string().into(),
            "reminder_enabled" => self.reminder_enabled.into(),
            "pledged_on" | "date" => self.pledged_on.into(),
            "due_on" => self.due_on.into(),
            "notes" => self.notes.clone().into(),
            "created_at" => self.created_at.into(),
            "updated_at" => self.updated_at.into(),
            _ => FieldValue::Null,
        }
    }

    fn search_fields(&self) -> Vec<String> {
        let mut out = vec![
            self.total_amount.normalize().to_string(),
            self.currency.clone(),
            self.frequency.to_string(),
            self.status.to_string(),
        ];
        out.extend(self.notes.clone());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pledge(total: i64) -> Pledge {
        Pledge::new(Uuid::new_v4(), Uuid::new_v4(), Decimal::from(total), "usd", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
    }

    #[test]
    fn balance_and_completion() {
        let mut p = pledge(1800);
        assert_eq!(p.balance_owed(), Decimal::from(1800));
        p.apply_payment(Decimal::from(1000));
        assert_eq!(p.status, PledgeStatus::Active);
        p.apply_payment(Decimal::from(900));
        assert_eq!(p.balance_owed(), Decimal::ZERO);
        assert_eq!(p.status, PledgeStatus::Completed);

        p.revert_payment(Decimal::from(900));
        assert_eq!(p.balance_owed(), Decimal::from(800));
        assert_eq!(p.status, PledgeStatus::Active);
    }

    #[test]
    fn input_requires_donor_and_total() {
        let org = Uuid::new_v4();
        assert!(matches!(PledgeInput::default().into_pledge(org, "USD"), Err(InputError::MissingField("donor_id"))));
        let due_before = PledgeInput {
            donor_id: Some(Uuid::new_v4()),
            total_amount: Some(Decimal::from(100)),
            pledged_on: NaiveDate::from_ymd_opt(2024, 5, 1),
            due_on: NaiveDate::from_ymd_opt(2024, 4, 1),
            ..Default::default()
        };
        assert!(due_before.into_pledge(org, "USD").is_err());
    }

    #[test]
    fn settle_status_follows_the_balance() {
        let mut p = pledge(500);
        p.amount_paid = Decimal::from(500);
        p.settle_status();
        assert_eq!(p.status, PledgeStatus::Completed);

        p.total_amount = Decimal::from(700);
        p.settle_status();
        assert_eq!(p.status, PledgeStatus::Active);

        p.status = PledgeStatus::Cancelled;
        p.total_amount = Decimal::from(500);
        p.settle_status();
        assert_eq!(p.status, PledgeStatus::Cancelled);
    }
}
