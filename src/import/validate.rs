use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

use super::parse::ImportRow;
use super::values::{parse_amount, parse_date};
use super::{ImportError, ImportKind, ImportOptions};
use crate::database::models::{
    normalize_email, normalize_phone, parse_lenient, Donation, DonationStatus, DonationType, Donor, PaymentMethod,
    Pledge, PledgeFrequency, PledgeStatus,
};
use crate::database::Store;
use crate::types::OrgScope;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowIssue {
    pub row: usize,
    pub message: String,
}

impl RowIssue {
    fn new(row: usize, message: impl Into<String>) -> Self {
        Self { row, message: message.into() }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlannedRecord {
    Donor(Donor),
    /// Fill blank fields of `target` from `patch`; `target_row` is set when
    /// the target is created earlier in the same file
    Merge { target: Uuid, target_row: Option<usize>, patch: Donor },
    Donation(Donation),
    Pledge(Pledge),
}

#[derive(Debug, Clone, Serialize)]
pub struct PlannedRow {
    pub row: usize,
    pub record: PlannedRecord,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub kind: ImportKind,
    pub organization_id: Uuid,
    pub total_rows: usize,
    pub valid: Vec<PlannedRow>,
    pub to_merge: Vec<PlannedRow>,
    pub errors: Vec<RowIssue>,
    pub link_failed: Vec<RowIssue>,
    pub warnings: Vec<RowIssue>,
}

impl ValidationReport {
    fn new(kind: ImportKind, organization_id: Uuid, total_rows: usize) -> Self {
        Self {
            kind,
            organization_id,
            total_rows,
            valid: Vec::new(),
            to_merge: Vec::new(),
            errors: Vec::new(),
            link_failed: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn skipped(&self) -> usize {
        self.errors.len() + self.link_failed.len()
    }
}

/// Existing donors of the organization, keyed for matching; the oldest record wins.
struct DonorIndex {
    by_phone: HashMap<String, (Uuid, Option<usize>)>,
    by_email: HashMap<String, (Uuid, Option<usize>)>,
}

impl DonorIndex {
    async fn load(store: &dyn Store, organization_id: Uuid) -> Result<Self, ImportError> {
        let donors = store.list_donors(&OrgScope::Organization(organization_id)).await?;
        let mut index = DonorIndex { by_phone: HashMap::new(), by_email: HashMap::new() };
        for d in donors {
            if let Some(phone) = d.phone.clone() {
                index.by_phone.entry(phone).or_insert((d.id, None));
            }
            if let Some(email) = d.email.clone() {
                index.by_email.entry(email).or_insert((d.id, None));
            }
        }
        Ok(index)
    }

    /// Phone takes precedence over email
    fn lookup(&self, phone: Option<&str>, email: Option<&str>) -> Option<(Uuid, Option<usize>)> {
        phone
            .and_then(|p| self.by_phone.get(p))
            .or_else(|| email.and_then(|e| self.by_email.get(e)))
            .copied()
    }

    fn remember(&mut self, phone: Option<&str>, email: Option<&str>, target: (Uuid, Option<usize>)) {
        if let Some(p) = phone {
            self.by_phone.entry(p.to_string()).or_insert(target);
        }
        if let Some(e) = email {
            self.by_email.entry(e.to_string()).or_insert(target);
        }
    }
}

/// Classifies every row into valid / to_merge / errors / link_failed.
/// Reads from the store, never writes.
pub async fn validate(
    store: &dyn Store,
    kind: ImportKind,
    rows: &[ImportRow],
    options: &ImportOptions,
) -> Result<ValidationReport, ImportError> {
    if rows.len() > options.max_rows {
        return Err(ImportError::TooManyRows { rows: rows.len(), max: options.max_rows });
    }
    let mut index = DonorIndex::load(store, options.organization_id).await?;
    let mut report = ValidationReport::new(kind, options.organization_id, rows.len());

    for row in rows {
        match kind {
            ImportKind::Donors => classify_donor(row, options, &mut index, &mut report),
            ImportKind::Donations => classify_donation(row, options, &index, &mut report),
            ImportKind::Pledges => classify_pledge(row, options, &index, &mut report),
        }
    }

    info!(
        "Validated {} {} rows: {} valid, {} to merge, {} errors, {} link failures",
        rows.len(),
        kind,
        report.valid.len(),
        report.to_merge.len(),
        report.errors.len(),
        report.link_failed.len()
    );
    Ok(report)
}

fn classify_donor(row: &ImportRow, options: &ImportOptions, index: &mut DonorIndex, report: &mut ValidationReport) {
    let Some(raw_phone) = row.get("phone") else {
        report.errors.push(RowIssue::new(row.row, "phone is required"));
        return;
    };
    let Some(phone) = normalize_phone(raw_phone) else {
        report.errors.push(RowIssue::new(row.row, format!("invalid phone: {}", raw_phone)));
        return;
    };
    let email = match row.get("email") {
        Some(raw) => match normalize_email(raw) {
            Some(e) => Some(e),
            None => {
                report.warnings.push(RowIssue::new(row.row, format!("invalid email ignored: {}", raw)));
                None
            }
        },
        None => None,
    };

    let (first, last) = names(row);
    let mut donor = Donor::new(options.organization_id, first, last);
    donor.phone = Some(phone.clone());
    donor.email = email.clone();
    donor.hebrew_name = row.get("hebrew_name").map(str::to_string);
    donor.address = row.get("address").map(str::to_string);
    donor.city = row.get("city").map(str::to_string);
    donor.notes = row.get("notes").map(str::to_string);

    match index.lookup(Some(phone.as_str()), email.as_deref()) {
        Some((target, target_row)) => {
            debug!("Row {} merges into donor {}", row.row, target);
            index.remember(Some(phone.as_str()), email.as_deref(), (target, target_row));
            report.to_merge.push(PlannedRow { row: row.row, record: PlannedRecord::Merge { target, target_row, patch: donor } });
        }
        None => {
            index.remember(Some(phone.as_str()), email.as_deref(), (donor.id, Some(row.row)));
            report.valid.push(PlannedRow { row: row.row, record: PlannedRecord::Donor(donor) });
        }
    }
}

/// Explicit first/last columns win; a lone full name is split at the last space
fn names(row: &ImportRow) -> (String, String) {
    let first = row.get("first_name").map(str::to_string);
    let last = row.get("last_name").map(str::to_string);
    match (first, last, row.get("full_name")) {
        (None, None, Some(full)) => match full.rsplit_once(' ') {
            Some((f, l)) => (f.trim().to_string(), l.trim().to_string()),
            None => (String::new(), full.to_string()),
        },
        (f, l, _) => (f.unwrap_or_default(), l.unwrap_or_default()),
    }
}

/// Shared by donations and pledges: required fields, then donor, amount and date
struct Linked {
    donor_id: Uuid,
    amount: Decimal,
    currency: String,
    date: chrono::NaiveDate,
}

fn link(row: &ImportRow, options: &ImportOptions, index: &DonorIndex, report: &mut ValidationReport) -> Option<Linked> {
    let missing: Vec<&str> = ["phone", "amount", "date"].into_iter().filter(|c| row.get(c).is_none()).collect();
    if !missing.is_empty() {
        report.errors.push(RowIssue::new(row.row, format!("missing required: {}", missing.join(", "))));
        return None;
    }
    let raw_phone = row.get("phone").unwrap_or_default();
    let phone = normalize_phone(raw_phone);
    let email = row.get("email").and_then(normalize_email);

    let Some((donor_id, _)) = index.lookup(phone.as_deref(), email.as_deref()) else {
        report.link_failed.push(RowIssue::new(row.row, format!("no donor found for phone {}", raw_phone)));
        return None;
    };

    let raw_amount = row.get("amount").unwrap_or_default();
    let (amount, symbol_currency) = match parse_amount(raw_amount) {
        Some((amount, currency)) if amount > Decimal::ZERO => (amount, currency),
        _ => {
            report.link_failed.push(RowIssue::new(row.row, format!("invalid amount: {}", raw_amount)));
            return None;
        }
    };

    let raw_date = row.get("date").unwrap_or_default();
    let Some(date) = parse_date(raw_date) else {
        report.link_failed.push(RowIssue::new(row.row, format!("invalid date: {}", raw_date)));
        return None;
    };

    let currency = row
        .get("currency")
        .map(|c| c.to_ascii_uppercase())
        .filter(|c| c.len() == 3 && c.chars().all(|ch| ch.is_ascii_alphabetic()))
        .or_else(|| symbol_currency.map(str::to_string))
        .unwrap_or_else(|| options.default_currency.clone());

    Some(Linked { donor_id, amount, currency, date })
}

/// Lenient enum column; unknown values fall back to the default with a warning
fn enum_column<T: FromStr + Default>(row: &ImportRow, column: &str, report: &mut ValidationReport) -> T {
    match row.get(column) {
        None => T::default(),
        Some(raw) => parse_lenient(raw).unwrap_or_else(|| {
            report.warnings.push(RowIssue::new(row.row, format!("unknown {} '{}', using default", column, raw)));
            T::default()
        }),
    }
}

fn classify_donation(row: &ImportRow, options: &ImportOptions, index: &DonorIndex, report: &mut ValidationReport) {
    let Some(linked) = link(row, options, index, report) else { return };

    let mut donation = Donation::new(options.organization_id, linked.amount, &linked.currency, linked.date);
    donation.donor_id = Some(linked.donor_id);
    donation.donation_type = enum_column::<DonationType>(row, "type", report);
    donation.payment_method = enum_column::<PaymentMethod>(row, "method", report);
    donation.status = enum_column::<DonationStatus>(row, "status", report);
    donation.notes = row.get("notes").map(str::to_string);
    if let Some(raw_fee) = row.get("fee") {
        match parse_amount(raw_fee) {
            Some((fee, _)) if fee >= Decimal::ZERO && fee <= linked.amount => donation.fee = Some(fee),
            _ => report.warnings.push(RowIssue::new(row.row, format!("invalid fee ignored: {}", raw_fee))),
        }
    }
    donation.recompute_net();

    match donation.validate() {
        Ok(()) => report.valid.push(PlannedRow { row: row.row, record: PlannedRecord::Donation(donation) }),
        Err(e) => report.link_failed.push(RowIssue::new(row.row, e.to_string())),
    }
}

fn classify_pledge(row: &ImportRow, options: &ImportOptions, index: &DonorIndex, report: &mut ValidationReport) {
    let Some(linked) = link(row, options, index, report) else { return };

    let mut pledge = Pledge::new(options.organization_id, linked.donor_id, linked.amount, &linked.currency, linked.date);
    pledge.frequency = enum_column::<PledgeFrequency>(row, "frequency", report);
    pledge.status = enum_column::<PledgeStatus>(row, "status", report);
    pledge.notes = row.get("notes").map(str::to_string);
    if let Some(raw_paid) = row.get("paid") {
        match parse_amount(raw_paid) {
            Some((paid, _)) if paid >= Decimal::ZERO => pledge.amount_paid = paid,
            _ => report.warnings.push(RowIssue::new(row.row, format!("invalid paid amount ignored: {}", raw_paid))),
        }
    }
    if let Some(raw_due) = row.get("due_date") {
        match parse_date(raw_due) {
            Some(due) => pledge.due_on = Some(due),
            None => report.warnings.push(RowIssue::new(row.row, format!("invalid due date ignored: {}", raw_due))),
        }
    }
    if pledge.status == PledgeStatus::Active && pledge.balance_owed().is_zero() {
        pledge.status = PledgeStatus::Completed;
    }

    match pledge.validate() {
        Ok(()) => report.valid.push(PlannedRow { row: row.row, record: PlannedRecord::Pledge(pledge) }),
        Err(e) => report.link_failed.push(RowIssue::new(row.row, e.to_string())),
    }
}
