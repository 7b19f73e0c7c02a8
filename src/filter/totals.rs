use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::database::models::{Donation, Pledge, PledgeStatus};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DonationSums {
    pub count: usize,
    pub amount: Decimal,
    pub fee: Decimal,
    pub net: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PledgeSums {
    pub count: usize,
    pub total: Decimal,
    pub paid: Decimal,
    pub balance: Decimal,
}

/// Sums keyed by currency code; `BTreeMap` keeps currencies sorted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CurrencyTotals<S>(pub BTreeMap<String, S>);

impl<S> CurrencyTotals<S> {
    pub fn get(&self, currency: &str) -> Option<&S> {
        self.0.get(currency)
    }

    pub fn currencies(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Failed and refunded donations are skipped.
pub fn donation_totals<'a>(donations: impl IntoIterator<Item = &'a Donation>) -> CurrencyTotals<DonationSums> {
    let mut totals: BTreeMap<String, DonationSums> = BTreeMap::new();
    for d in donations.into_iter().filter(|d| d.counts_toward_totals()) {
        let entry = totals.entry(d.currency.clone()).or_default();
        entry.count += 1;
        entry.amount += d.amount;
        entry.fee += d.fee.unwrap_or(Decimal::ZERO);
        entry.net += d.net_amount;
    }
    CurrencyTotals(totals)
}

/// A cancelled pledge owes nothing more; its total and payments still count.
pub fn pledge_totals<'a>(pledges: impl IntoIterator<Item = &'a Pledge>) -> CurrencyTotals<PledgeSums> {
    let mut totals: BTreeMap<String, PledgeSums> = BTreeMap::new();
    for p in pledges {
        let entry = totals.entry(p.currency.clone()).or_default();
        entry.count += 1;
        entry.total += p.total_amount;
        entry.paid += p.amount_paid;
        if p.status != PledgeStatus::Cancelled {
            entry.balance += p.balance_owed();
        }
    }
    CurrencyTotals(totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::DonationStatus;
    use chrono::NaiveDate;
    use std::str::FromStr;
    use uuid::Uuid;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn donation(amount: &str, currency: &str, fee: Option<&str>, status: DonationStatus) -> Donation {
        let mut d = Donation::new(Uuid::nil(), dec(amount), currency, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        d.fee = fee.map(dec);
        d.status = status;
        d.recompute_net();
        d
    }

    #[test]
    fn donation_totals_match_hand_sums() {
        let rows = vec![
            donation("100.00", "USD", Some("3.20"), DonationStatus::Completed),
            donation("36.00", "USD", None, DonationStatus::Pending),
            donation("500.00", "USD", None, DonationStatus::Refunded),
            donation("180.00", "ILS", Some("5.00"), DonationStatus::Completed),
            donation("18.00", "ILS", None, DonationStatus::Failed),
        ];
        let totals = donation_totals(&rows);
        assert_eq!(totals.currencies().collect::<Vec<_>>(), vec!["ILS", "USD"]);

        let usd = totals.get("USD").unwrap();
        assert_eq!(usd.count, 2);
        assert_eq!(usd.amount, dec("136.00"));
        assert_eq!(usd.fee, dec("3.20"));
        assert_eq!(usd.net, dec("132.80"));

        let ils = totals.get("ILS").unwrap();
        assert_eq!(ils.count, 1);
        assert_eq!(ils.net, dec("175.00"));
    }

    #[test]
    fn pledge_totals_track_balance() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut a = Pledge::new(Uuid::nil(), Uuid::nil(), dec("1800"), "USD", date);
        a.apply_payment(dec("600"));
        let b = Pledge::new(Uuid::nil(), Uuid::nil(), dec("360"), "USD", date);
        let mut c = Pledge::new(Uuid::nil(), Uuid::nil(), dec("100"), "EUR", date);
        c.apply_payment(dec("150"));

        let totals = pledge_totals(&[a, b, c]);
        let usd = totals.get("USD").unwrap();
        assert_eq!((usd.count, usd.total, usd.paid, usd.balance), (2, dec("2160"), dec("600"), dec("1560")));
        let eur = totals.get("EUR").unwrap();
        assert_eq!(eur.balance, Decimal::ZERO);
    }

    #[test]
    fn cancelled_pledges_owe_nothing() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let open = Pledge::new(Uuid::nil(), Uuid::nil(), dec("500"), "USD", date);
        let mut dropped = Pledge::new(Uuid::nil(), Uuid::nil(), dec("1000"), "USD", date);
        dropped.apply_payment(dec("250"));
        dropped.status = PledgeStatus::Cancelled;

        let totals = pledge_totals(&[open, dropped]);
        let usd = totals.get("USD").unwrap();
        assert_eq!((usd.count, usd.total, usd.paid, usd.balance), (2, dec("1500"), dec("250"), dec("500")));
    }
}
