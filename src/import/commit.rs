use chrono::Utc;
use serde::Serialize;
use std::fmt;
use tracing::{debug, info, warn};

use super::validate::{PlannedRecord, PlannedRow, ValidationReport};
use super::ImportError;
use crate::database::models::Donor;
use crate::database::{DatabaseError, Store};
use crate::types::OrgScope;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RowStatus {
    Added,
    Merged,
    Skipped,
    Failed,
}

impl fmt::Display for RowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RowStatus::Added => "ADDED",
            RowStatus::Merged => "MERGED",
            RowStatus::Skipped => "SKIPPED",
            RowStatus::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultLine {
    pub row: usize,
    pub action: &'static str,
    pub status: RowStatus,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportOutcome {
    pub added: usize,
    pub merged: usize,
    pub skipped: usize,
    pub failed: usize,
    pub lines: Vec<ResultLine>,
    /// `row,action,status,message`
    pub result_csv: String,
}

/// Writes planned rows one at a time in sheet order. A failed write is
/// logged as FAILED and the loop moves on; nothing is retried or rolled back.
/// `progress` receives `(done, total)` after every written record.
pub async fn commit<F>(store: &dyn Store, report: ValidationReport, mut progress: F) -> Result<ImportOutcome, ImportError>
where
    F: FnMut(usize, usize) + Send,
{
    let mut planned: Vec<PlannedRow> = report.valid.into_iter().chain(report.to_merge).collect();
    planned.sort_by_key(|p| p.row);
    let total = planned.len();

    let mut lines: Vec<ResultLine> = report
        .errors
        .iter()
        .chain(report.link_failed.iter())
        .map(|issue| ResultLine { row: issue.row, action: "skip", status: RowStatus::Skipped, message: issue.message.clone() })
        .collect();

    let (mut added, mut merged, mut failed) = (0, 0, 0);
    for (done, row) in planned.into_iter().enumerate() {
        let action = match &row.record {
            PlannedRecord::Merge { .. } => "merge",
            _ => "add",
        };
        match write(store, &row.record).await {
            Ok(message) => {
                let status = if action == "merge" { merged += 1; RowStatus::Merged } else { added += 1; RowStatus::Added };
                debug!("Import row {} {}", row.row, status);
                lines.push(ResultLine { row: row.row, action, status, message });
            }
            Err(e) => {
                failed += 1;
                warn!("Import row {} failed: {}", row.row, e);
                lines.push(ResultLine { row: row.row, action, status: RowStatus::Failed, message: e.to_string() });
            }
        }
        progress(done + 1, total);
    }

    lines.sort_by_key(|l| l.row);
    let skipped = lines.iter().filter(|l| l.status == RowStatus::Skipped).count();
    info!("Import committed: {} added, {} merged, {} skipped, {} failed", added, merged, skipped, failed);

    let result_csv = result_csv(&lines)?;
    Ok(ImportOutcome { added, merged, skipped, failed, lines, result_csv })
}

async fn write(store: &dyn Store, record: &PlannedRecord) -> Result<String, DatabaseError> {
    match record {
        PlannedRecord::Donor(donor) => {
            store.insert_donor(donor).await?;
            Ok(format!("donor {}", donor.id))
        }
        PlannedRecord::Merge { target, patch, .. } => {
            let mut existing = store.get_donor(&OrgScope::Organization(patch.organization_id), *target).await?;
            fill_blanks(&mut existing, patch);
            store.update_donor(&existing).await?;
            Ok(format!("donor {}", existing.id))
        }
        PlannedRecord::Donation(donation) => {
            store.insert_donation(donation).await?;
            Ok(format!("donation {}", donation.id))
        }
        PlannedRecord::Pledge(pledge) => {
            store.insert_pledge(pledge).await?;
            Ok(format!("pledge {}", pledge.id))
        }
    }
}

/// Only blank fields of the existing donor are filled; notes are appended.
pub fn fill_blanks(existing: &mut Donor, patch: &Donor) {
    if existing.first_name.trim().is_empty() {
        existing.first_name = patch.first_name.clone();
    }
    if existing.last_name.trim().is_empty() {
        existing.last_name = patch.last_name.clone();
    }
    fn fill(slot: &mut Option<String>, value: &Option<String>) {
        if slot.as_deref().map_or(true, |s| s.trim().is_empty()) {
            if let Some(v) = value {
                *slot = Some(v.clone());
            }
        }
    }
    fill(&mut existing.hebrew_name, &patch.hebrew_name);
    fill(&mut existing.phone, &patch.phone);
    fill(&mut existing.email, &patch.email);
    fill(&mut existing.address, &patch.address);
    fill(&mut existing.city, &patch.city);
    if let Some(note) = &patch.notes {
        existing.append_note(note);
    }
    existing.merge_group_id = Some(existing.merge_group_id.unwrap_or(existing.id));
    existing.updated_at = Utc::now();
}

fn result_csv(lines: &[ResultLine]) -> Result<String, ImportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["row", "action", "status", "message"])?;
    for line in lines {
        writer.write_record([line.row.to_string(), line.action.to_string(), line.status.to_string(), line.message.clone()])?;
    }
    let bytes = writer.into_inner().map_err(|e| ImportError::Csv(csv::Error::from(e.into_error())))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn merge_fills_only_blank_fields() {
        let org = Uuid::new_v4();
        let mut existing = Donor::new(org, "Sarah", "").with_phone("7185550101");
        existing.notes = Some("Founding member".into());
        let mut patch = Donor::new(org, "Sara", "Levi").with_phone("7185550101").with_email("sarah@example.org");
        patch.notes = Some("Moved to Brooklyn".into());

        fill_blanks(&mut existing, &patch);
        assert_eq!(existing.first_name, "Sarah");
        assert_eq!(existing.last_name, "Levi");
        assert_eq!(existing.email.as_deref(), Some("sarah@example.org"));
        assert_eq!(existing.notes.as_deref(), Some("Founding member\nMoved to Brooklyn"));
        assert_eq!(existing.merge_group_id, Some(existing.id));
    }
}
