use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::donor::non_empty;
use super::enums::{DonationStatus, DonationType, PaymentMethod};
use super::InputError;
use crate::filter::{FieldValue, Listable};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Donation {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub donor_id: Option<Uuid>,
    /// Set when the donation is a payment toward a pledge
    pub pledge_id: Option<Uuid>,
    pub yahrzeit_id: Option<Uuid>,
    pub amount: Decimal,
    pub currency: String,
    pub donation_type: DonationType,
    pub payment_method: PaymentMethod,
    pub status: DonationStatus,
    pub fee: Option<Decimal>,
    /// amount - fee, maintained by `recompute_net`
    pub net_amount: Decimal,
    pub donated_on: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Donation {
    pub fn new(organization_id: Uuid, amount: Decimal, currency: &str, donated_on: NaiveDate) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            organization_id,
            donor_id: None,
            pledge_id: None,
            yahrzeit_id: None,
            amount,
            currency: currency.trim().to_ascii_uppercase(),
            donation_type: DonationType::default(),
            payment_method: PaymentMethod::default(),
            status: DonationStatus::default(),
            fee: None,
            net_amount: amount,
            donated_on,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn recompute_net(&mut self) {
        self.net_amount = self.amount - self.fee.unwrap_or(Decimal::ZERO);
    }

    pub fn is_payment(&self) -> bool {
        self.pledge_id.is_some()
    }

    /// Failed and refunded donations are listed but never summed
    pub fn counts_toward_totals(&self) -> bool {
        !matches!(self.status, DonationStatus::Failed | DonationStatus::Refunded)
    }

    pub fn validate(&self) -> Result<(), InputError> {
        validate_amount("amount", self.amount)?;
        validate_currency(&self.currency)?;
        if let Some(fee) = self.fee {
            if fee < Decimal::ZERO {
                return Err(InputError::invalid("fee", "must not be negative"));
            }
            if fee > self.amount {
                return Err(InputError::invalid("fee", "must not exceed the amount"));
            }
        }
        Ok(())
    }
}

pub(crate) fn validate_amount(field: &'static str, amount: Decimal) -> Result<(), InputError> {
    if amount <= Decimal::ZERO {
        return Err(InputError::invalid(field, "must be greater than zero"));
    }
    Ok(())
}

pub(crate) fn validate_currency(currency: &str) -> Result<(), InputError> {
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(InputError::invalid("currency", "must be a three-letter ISO code"));
    }
    Ok(())
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DonationInput {
    pub donor_id: Option<Uuid>,
    pub pledge_id: Option<Uuid>,
    pub yahrzeit_id: Option<Uuid>,
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub donation_type: Option<DonationType>,
    pub payment_method: Option<PaymentMethod>,
    pub status: Option<DonationStatus>,
    pub fee: Option<Decimal>,
    pub donated_on: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl DonationInput {
    pub fn into_donation(self, organization_id: Uuid, default_currency: &str) -> Result<Donation, InputError> {
        let amount = self.amount.ok_or(InputError::MissingField("amount"))?;
        let donated_on = self.donated_on.unwrap_or_else(|| Utc::now().date_naive());
        let currency = self.currency.clone().unwrap_or_else(|| default_currency.to_string());
        let mut donation = Donation::new(organization_id, amount, &currency, donated_on);
        self.apply(&mut donation)?;
        Ok(donation)
    }

    pub fn apply(self, donation: &mut Donation) -> Result<(), InputError> {
        if let Some(v) = self.donor_id { donation.donor_id = Some(v); }
        if let Some(v) = self.pledge_id {
            donation.pledge_id = Some(v);
            donation.donation_type = DonationType::PledgePayment;
        }
        if let Some(v) = self.yahrzeit_id { donation.yahrzeit_id = Some(v); }
        if let Some(v) = self.amount { donation.amount = v; }
        if let Some(v) = self.currency { donation.currency = v.trim().to_ascii_uppercase(); }
        if let Some(v) = self.donation_type { donation.donation_type = v; }
        if let Some(v) = self.payment_method { donation.payment_method = v; }
        if let Some(v) = self.status { donation.status = v; }
        if let Some(v) = self.fee { donation.fee = Some(v); }
        if let Some(v) = self.donated_on { donation.donated_on = v; }
        if let Some(v) = self.notes { donation.notes = non_empty(v); }
        donation.recompute_net();
        donation.validate()?;
        donation.updated_at = Utc::now();
        Ok(())
    }
}

impl Listable for Donation {
    fn field(&self, name: &str) -> FieldValue {
        match name {
            "id" => self.id.into(),
            "organization_id" => self.organization_id.into(),
            "donor_id" => self.donor_id.into(),
            "pledge_id" => self.pledge_id.into(),
            "yahrzeit_id" => self.yahrzeit_id.into(),
            "amount" => self.amount.into(),
            "currency" => self.currency.as_str().into(),
            "donation_type" | "type" => self.donation_type.to_string().into(),
            "payment_method" | "method" => self.payment_method.to_string().into(),
            "status" => self.status.to_string().into(),
            "fee" => self.fee.into(),
            "net_amount" => self.net_amount.into(),
            "donated_on" | "date" => self.donated_on.into(),
            "notes" => self.notes.clone().into(),
            "created_at" => self.created_at.into(),
            "updated_at" => self.updated_at.into(),
            _ => FieldValue::Null,
        }
    }

    fn search_fields(&self) -> Vec<String> {
        let mut out = vec![
            self.amount.normalize().to_string(),
            self.currency.clone(),
            self.donation_type.to_string(),
            self.payment_method.to_string(),
            self.status.to_string(),
        ];
        out.extend(self.notes.clone());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, 1).unwrap()
    }

    #[test]
    fn net_amount_subtracts_fee() {
        let input = DonationInput {
            amount: Some(Decimal::from_str("100.00").unwrap()),
            fee: Some(Decimal::from_str("3.20").unwrap()),
            donated_on: Some(date()),
            ..Default::default()
        };
        let d = input.into_donation(Uuid::new_v4(), "usd").unwrap();
        assert_eq!(d.net_amount, Decimal::from_str("96.80").unwrap());
        assert_eq!(d.currency, "USD");
    }

    #[test]
    fn rejects_bad_amounts_fees_and_currency() {
        let org = Uuid::new_v4();
        let zero = DonationInput { amount: Some(Decimal::ZERO), ..Default::default() };
        assert!(zero.into_donation(org, "USD").is_err());

        let fee = DonationInput { amount: Some(Decimal::from(10)), fee: Some(Decimal::from(11)), ..Default::default() };
        assert!(fee.into_donation(org, "USD").is_err());

        let cur = DonationInput { amount: Some(Decimal::from(10)), currency: Some("dollars".into()), ..Default::default() };
        assert!(cur.into_donation(org, "USD").is_err());

        assert!(matches!(DonationInput::default().into_donation(org, "USD"), Err(InputError::MissingField("amount"))));
    }

    #[test]
    fn pledge_link_marks_payment() {
        let input = DonationInput { amount: Some(Decimal::from(18)), pledge_id: Some(Uuid::new_v4()), ..Default::default() };
        let d = input.into_donation(Uuid::new_v4(), "ILS").unwrap();
        assert!(d.is_payment());
        assert_eq!(d.donation_type, DonationType::PledgePayment);
        assert_eq!(d.currency, "ILS");
    }
}
