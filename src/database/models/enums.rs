use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum_macros::{Display, EnumString};

#[derive(Debug, Clone, Copy, sqlx::Type, Serialize, Deserialize, PartialEq, Eq, Hash, EnumString, Display, Default)]
#[sqlx(type_name = "donation_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum DonationStatus {
    Pending,
    #[default]
    #[strum(to_string = "completed", serialize = "paid", serialize = "complete", serialize = "received")]
    Completed,
    Failed,
    Refunded,
}

#[derive(Debug, Clone, Copy, sqlx::Type, Serialize, Deserialize, PartialEq, Eq, Hash, EnumString, Display, Default)]
#[sqlx(type_name = "donation_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum DonationType {
    #[default]
    #[strum(to_string = "general", serialize = "donation", serialize = "tzedakah")]
    General,
    #[strum(to_string = "pledge_payment", serialize = "payment", serialize = "pledge")]
    PledgePayment,
    #[strum(to_string = "yahrzeit", serialize = "memorial")]
    Yahrzeit,
    #[strum(to_string = "membership", serialize = "dues")]
    Membership,
    Other,
}

#[derive(Debug, Clone, Copy, sqlx::Type, Serialize, Deserialize, PartialEq, Eq, Hash, EnumString, Display, Default)]
#[sqlx(type_name = "payment_method", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum PaymentMethod {
    #[default]
    Cash,
    #[strum(to_string = "check", serialize = "cheque")]
    Check,
    #[strum(to_string = "credit_card", serialize = "card", serialize = "credit", serialize = "cc")]
    CreditCard,
    #[strum(to_string = "bank_transfer", serialize = "wire", serialize = "ach", serialize = "transfer")]
    BankTransfer,
    Other,
}

#[derive(Debug, Clone, Copy, sqlx::Type, Serialize, Deserialize, PartialEq, Eq, Hash, EnumString, Display, Default)]
#[sqlx(type_name = "pledge_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum PledgeStatus {
    #[default]
    #[strum(to_string = "active", serialize = "open")]
    Active,
    #[strum(to_string = "completed", serialize = "paid", serialize = "complete")]
    Completed,
    #[strum(to_string = "cancelled", serialize = "canceled")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, sqlx::Type, Serialize, Deserialize, PartialEq, Eq, Hash, EnumString, Display, Default)]
#[sqlx(type_name = "pledge_frequency", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum PledgeFrequency {
    #[default]
    #[strum(to_string = "one_time", serialize = "once", serialize = "onetime", serialize = "single")]
    OneTime,
    Weekly,
    Monthly,
    #[strum(to_string = "quarterly", serialize = "quarter")]
    Quarterly,
    #[strum(to_string = "annually", serialize = "yearly", serialize = "annual")]
    Annually,
}

#[derive(Debug, Clone, Copy, sqlx::Type, Serialize, Deserialize, PartialEq, Eq, Hash, EnumString, Display, Default)]
#[sqlx(type_name = "subscription_tier", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SubscriptionTier {
    #[default]
    Free,
    Basic,
    Premium,
    Enterprise,
}

impl SubscriptionTier {
    /// Member seats included with the tier; `None` is unlimited
    pub fn default_capacity(&self) -> Option<usize> {
        match self {
            SubscriptionTier::Free => Some(50),
            SubscriptionTier::Basic => Some(250),
            SubscriptionTier::Premium => Some(1000),
            SubscriptionTier::Enterprise => None,
        }
    }
}

#[derive(Debug, Clone, Copy, sqlx::Type, Serialize, Deserialize, PartialEq, Eq, Hash, EnumString, Display, Default)]
#[sqlx(type_name = "subscription_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SubscriptionStatus {
    #[default]
    Active,
    Trialing,
    PastDue,
    Cancelled,
}

#[derive(Debug, Clone, Copy, sqlx::Type, Serialize, Deserialize, PartialEq, Eq, Hash, EnumString, Display)]
#[sqlx(type_name = "app_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum AppRole {
    SuperAdmin,
    Admin,
    Manager,
    Member,
}

#[derive(Debug, Clone, Copy, sqlx::Type, Serialize, Deserialize, PartialEq, Eq, Hash, EnumString, Display, Default)]
#[sqlx(type_name = "yahrzeit_observance", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Observance {
    #[default]
    Hebrew,
    #[strum(to_string = "secular", serialize = "gregorian", serialize = "civil")]
    Secular,
}

/// Lenient parse of spreadsheet / form values: "Credit Card", "credit-card"
/// and "CREDIT_CARD" all resolve to the same variant.
pub fn parse_lenient<T: FromStr>(raw: &str) -> Option<T> {
    let token: String = raw
        .trim()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect();
    if token.is_empty() {
        return None;
    }
    T::from_str(&token).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lenient_parsing_accepts_aliases() {
        assert_eq!(parse_lenient::<PaymentMethod>("Credit Card"), Some(PaymentMethod::CreditCard));
        assert_eq!(parse_lenient::<PaymentMethod>("cheque"), Some(PaymentMethod::Check));
        assert_eq!(parse_lenient::<PledgeFrequency>("One-Time"), Some(PledgeFrequency::OneTime));
        assert_eq!(parse_lenient::<DonationStatus>("PAID"), Some(DonationStatus::Completed));
        assert_eq!(parse_lenient::<PledgeStatus>("canceled"), Some(PledgeStatus::Cancelled));
        assert_eq!(parse_lenient::<PaymentMethod>("bitcoin"), None);
        assert_eq!(parse_lenient::<PaymentMethod>("  "), None);
    }

    #[test]
    fn display_uses_snake_case() {
        assert_eq!(PaymentMethod::CreditCard.to_string(), "credit_card");
        assert_eq!(DonationType::PledgePayment.to_string(), "pledge_payment");
        assert_eq!(AppRole::SuperAdmin.to_string(), "super_admin");
        assert_eq!(SubscriptionStatus::PastDue.to_string(), "past_due");
    }

    #[test]
    fn tier_capacity() {
        assert_eq!(SubscriptionTier::Free.default_capacity(), Some(50));
        assert_eq!(SubscriptionTier::Enterprise.default_capacity(), None);
    }
}
